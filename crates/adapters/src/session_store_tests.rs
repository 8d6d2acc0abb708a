use super::*;

#[tokio::test]
async fn upsert_then_get_round_trips() {
    let store = InMemorySessionStore::new();
    store
        .upsert(SessionRecord {
            session_id: "sess-1".into(),
            project_id: "proj-1".into(),
            title: Some("demo".into()),
            approval_policy: None,
        })
        .await;

    let fetched = store.get("sess-1").await.unwrap();
    assert_eq!(fetched.project_id, "proj-1");
}

#[tokio::test]
async fn get_unknown_session_returns_none() {
    let store = InMemorySessionStore::new();
    assert!(store.get("missing").await.is_none());
}
