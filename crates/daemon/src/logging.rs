// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `tracing-subscriber` setup, consuming `RUST_LOG`/`LOG_FORMAT` the way the
//! teacher wires logging: an `EnvFilter` layer plus a format layer chosen by
//! `LOG_FORMAT` (`pretty` by default, `json` for structured log shipping).
//! When `LOG_DIR` is set, logs are written there via a non-blocking daily
//! rolling appender instead of stdout; the returned guard must be held for
//! the process lifetime or buffered lines are dropped on exit.

use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

#[must_use = "dropping this guard stops the non-blocking log writer from flushing"]
pub enum LoggingGuard {
    Stdout,
    File(tracing_appender::non_blocking::WorkerGuard),
}

pub fn init() -> LoggingGuard {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT").map(|v| v.eq_ignore_ascii_case("json")).unwrap_or(false);

    match std::env::var("LOG_DIR").ok().filter(|s| !s.is_empty()) {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "conductor-daemon.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer().with_writer(writer).with_ansi(false);
            if json {
                tracing_subscriber::registry().with(filter).with(layer.json()).init();
            } else {
                tracing_subscriber::registry().with(filter).with(layer).init();
            }
            LoggingGuard::File(guard)
        }
        None => {
            if json {
                tracing_subscriber::registry().with(filter).with(tracing_subscriber::fmt::layer().json()).init();
            } else {
                tracing_subscriber::registry().with(filter).with(tracing_subscriber::fmt::layer()).init();
            }
            LoggingGuard::Stdout
        }
    }
}
