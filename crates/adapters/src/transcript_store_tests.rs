use super::*;

#[tokio::test]
async fn entries_accumulate_in_append_order() {
    let store = InMemoryTranscriptStore::new();
    store.upsert_entry("s1", "t1", serde_json::json!({"seq": 1})).await;
    store.upsert_entry("s1", "t1", serde_json::json!({"seq": 2})).await;

    let entries = store.entries("s1", "t1").await;
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["seq"], 1);
    assert_eq!(entries[1]["seq"], 2);
}
