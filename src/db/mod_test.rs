use super::*;
use sqlx::Row;

#[tokio::test]
async fn init_is_idempotent() {
    let pool = init_memory_pool().await;
    init(&pool).await.unwrap();
    init(&pool).await.unwrap();

    let row = sqlx::query("SELECT COUNT(*) AS n FROM sqlite_master WHERE type = 'table' AND name = 'live_chat'")
        .fetch_one(&pool)
        .await
        .unwrap();
    let n: i64 = row.get("n");
    assert_eq!(n, 1);
}

#[tokio::test]
async fn live_chat_table_has_expected_columns() {
    let pool = init_memory_pool().await;
    let rows = sqlx::query("PRAGMA table_info(live_chat)")
        .fetch_all(&pool)
        .await
        .unwrap();
    let names: Vec<String> = rows.iter().map(|r| r.get("name")).collect();
    assert_eq!(names, vec!["id", "author", "message", "timestamp"]);
}

#[test]
fn db_max_connections_defaults_when_unset() {
    // DB_MAX_CONNECTIONS is not set by any test.
    assert_eq!(db_max_connections(), DEFAULT_DB_MAX_CONNECTIONS);
}
