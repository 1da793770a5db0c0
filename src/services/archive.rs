//! Chat archive: the `live_chat` table.
//!
//! DESIGN
//! ======
//! Rows are write-once. `upsert` is `INSERT OR IGNORE` keyed by the
//! platform-assigned message id, so overlapping fetch pages never duplicate a
//! row and the first stored copy of a message wins. There is no update or
//! delete path.

use serde::Serialize;
use sqlx::{Row, SqlitePool};

/// One archived chat message. The id is storage-only and not serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    #[serde(skip_serializing)]
    pub id: String,
    pub author: String,
    pub message: String,
    /// RFC 3339 publish time as reported by the platform.
    pub timestamp: String,
}

/// Insert a message unless its id is already archived.
///
/// Returns `true` when a new row was written.
pub async fn upsert(pool: &SqlitePool, message: &ChatMessage) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r"INSERT OR IGNORE INTO live_chat (id, author, message, timestamp)
          VALUES (?, ?, ?, ?)",
    )
    .bind(&message.id)
    .bind(&message.author)
    .bind(&message.message)
    .bind(&message.timestamp)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// All archived messages, newest first.
pub async fn list_all(pool: &SqlitePool) -> Result<Vec<ChatMessage>, sqlx::Error> {
    let rows = sqlx::query(
        r"SELECT id, author, message, timestamp
          FROM live_chat
          ORDER BY timestamp DESC",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|r| ChatMessage {
            id: r.get("id"),
            author: r.get::<Option<String>, _>("author").unwrap_or_default(),
            message: r.get::<Option<String>, _>("message").unwrap_or_default(),
            timestamp: r.get::<Option<String>, _>("timestamp").unwrap_or_default(),
        })
        .collect())
}

/// Number of archived messages.
#[cfg(test)]
pub async fn count(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
    let row = sqlx::query("SELECT COUNT(*) AS n FROM live_chat")
        .fetch_one(pool)
        .await?;
    Ok(row.get("n"))
}

#[cfg(test)]
#[path = "archive_test.rs"]
mod tests;
