use super::*;

crate::define_id! {
    pub struct SampleId("smp-");
}

#[test]
fn round_trips_through_display_and_from_string() {
    let id = SampleId::new();
    let parsed = SampleId::from_string(id.to_string());
    assert_eq!(id, parsed);
    assert!(id.as_str().starts_with("smp-"));
}

#[test]
fn suffix_strips_prefix() {
    let id = SampleId::from_string("smp-abcdefghijklmnopqrs");
    assert_eq!(id.suffix(), "abcdefghijklmnopqrs");
}

#[test]
fn short_truncates_suffix() {
    let id = SampleId::from_string("smp-abcdefghijklmnopqrs");
    assert_eq!(id.short(3), "abc");
}

#[test]
fn idbuf_rejects_oversized_input_in_debug() {
    // IdBuf::new debug-asserts on oversized input; released builds truncate.
    let s = "x".repeat(ID_MAX_LEN);
    let buf = IdBuf::new(&s);
    assert_eq!(buf.as_str().len(), ID_MAX_LEN);
}
