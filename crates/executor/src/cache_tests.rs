use super::*;
use conductor_core::ActionStatus;
use serde_json::json;

fn result(status: ActionStatus) -> ActionResult {
    ActionResult::new("transcript.upsert", status)
}

#[test]
fn miss_on_empty_cache() {
    let cache = IdempotencyCache::new(8);
    assert!(cache.get("k1", 1).is_none());
}

#[test]
fn hit_returns_cached_result_for_matching_signature() {
    let cache = IdempotencyCache::new(8);
    cache.insert("k1".to_string(), 42, result(ActionStatus::Performed));
    match cache.get("k1", 42) {
        Some(ReplayOutcome::Hit(r)) => assert_eq!(r.status, ActionStatus::Performed),
        _ => panic!("expected hit"),
    }
}

#[test]
fn different_signature_is_a_conflict_not_a_miss() {
    let cache = IdempotencyCache::new(8);
    cache.insert("k1".to_string(), 42, result(ActionStatus::Performed));
    assert!(matches!(cache.get("k1", 99), Some(ReplayOutcome::SignatureConflict)));
}

#[test]
fn lru_evicts_least_recently_used_entry_past_capacity() {
    let cache = IdempotencyCache::new(2);
    cache.insert("a".to_string(), 1, result(ActionStatus::Performed));
    cache.insert("b".to_string(), 1, result(ActionStatus::Performed));
    cache.insert("c".to_string(), 1, result(ActionStatus::Performed));
    assert!(cache.get("a", 1).is_none());
    assert!(cache.get("b", 1).is_some());
    assert!(cache.get("c", 1).is_some());
}

#[test]
fn signature_is_stable_for_equivalent_json_regardless_of_key_order() {
    let scope = ActionScope::new().project_id("proj-a");
    let a = signature_of("queue.enqueue", &json!({"a": 1, "b": 2}), &scope);
    let b = signature_of("queue.enqueue", &json!({"b": 2, "a": 1}), &scope);
    assert_eq!(a, b);
}

#[test]
fn signature_differs_for_different_scope() {
    let payload = json!({"a": 1});
    let s1 = ActionScope::new().project_id("proj-a");
    let s2 = ActionScope::new().project_id("proj-b");
    assert_ne!(signature_of("queue.enqueue", &payload, &s1), signature_of("queue.enqueue", &payload, &s2));
}
