use super::*;
use crate::db::init_memory_pool;

fn msg(id: &str, message: &str, timestamp: &str) -> ChatMessage {
    ChatMessage { id: id.into(), author: "viewer".into(), message: message.into(), timestamp: timestamp.into() }
}

#[tokio::test]
async fn upsert_inserts_new_row() {
    let pool = init_memory_pool().await;
    let inserted = upsert(&pool, &msg("m1", "hello", "2025-03-01T10:00:00Z"))
        .await
        .unwrap();
    assert!(inserted);
    assert_eq!(count(&pool).await.unwrap(), 1);
}

#[tokio::test]
async fn upsert_duplicate_id_is_noop_first_write_wins() {
    let pool = init_memory_pool().await;
    upsert(&pool, &msg("m1", "original", "2025-03-01T10:00:00Z"))
        .await
        .unwrap();
    let inserted = upsert(&pool, &msg("m1", "edited", "2025-03-01T11:00:00Z"))
        .await
        .unwrap();

    assert!(!inserted);
    let rows = list_all(&pool).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].message, "original");
    assert_eq!(rows[0].timestamp, "2025-03-01T10:00:00Z");
}

#[tokio::test]
async fn list_all_orders_newest_first() {
    let pool = init_memory_pool().await;
    upsert(&pool, &msg("t2", "second", "2025-03-01T10:00:02Z"))
        .await
        .unwrap();
    upsert(&pool, &msg("t1", "first", "2025-03-01T10:00:01Z"))
        .await
        .unwrap();
    upsert(&pool, &msg("t3", "third", "2025-03-01T10:00:03Z"))
        .await
        .unwrap();

    let ids: Vec<String> = list_all(&pool)
        .await
        .unwrap()
        .into_iter()
        .map(|m| m.id)
        .collect();
    assert_eq!(ids, vec!["t3", "t2", "t1"]);
}

#[tokio::test]
async fn list_all_empty_archive() {
    let pool = init_memory_pool().await;
    assert!(list_all(&pool).await.unwrap().is_empty());
}

#[test]
fn chat_message_serializes_without_id() {
    let json = serde_json::to_value(msg("secret-id", "hej", "2025-03-01T10:00:00Z")).unwrap();
    assert_eq!(json, serde_json::json!({"author": "viewer", "message": "hej", "timestamp": "2025-03-01T10:00:00Z"}));
}
