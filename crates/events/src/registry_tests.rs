use super::*;
use async_trait::async_trait;
use conductor_core::{EventEnvelope, HandlerOutput};

struct NoopHandler;

#[async_trait]
impl EventHandler for NoopHandler {
    async fn handle(&self, _event: &EventEnvelope) -> HandlerOutput {
        HandlerOutput::HandlerResult { details: serde_json::json!({}) }
    }
}

#[test]
fn on_assigns_monotonic_indices_and_defaults() {
    let mut counter = 0u64;
    let mut registry = EventRegistry::new("mod-a", &mut counter);
    registry.on("turn.completed", Arc::new(NoopHandler));
    registry.on("turn.completed", Arc::new(NoopHandler)).priority(10).timeout_ms(5_000);
    let staged = registry.into_staged();
    assert_eq!(staged[0].registered.registration_index, 0);
    assert_eq!(staged[0].registered.priority, DEFAULT_HANDLER_PRIORITY);
    assert_eq!(staged[1].registered.registration_index, 1);
    assert_eq!(staged[1].registered.priority, 10);
    assert_eq!(staged[1].registered.timeout_ms, 5_000);
}

#[test]
fn factory_registry_round_trips() {
    struct Factory;
    impl ModuleFactory for Factory {
        fn register(&self, registry: &mut EventRegistry<'_>) {
            registry.on("turn.completed", Arc::new(NoopHandler));
        }
    }
    let mut factories = FactoryRegistry::new();
    factories.register("mod-a", Arc::new(Factory));
    assert!(factories.get("mod-a").is_some());
    assert!(factories.get("mod-b").is_none());
}
