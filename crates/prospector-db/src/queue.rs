//! pgmq queue primitives.
//!
//! Reads use a visibility timeout: a message stays hidden for `vt` seconds
//! and reappears unless it is deleted, which gives at-least-once delivery.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

/// One message read from a pgmq queue.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct QueueMessage {
    pub msg_id: i64,
    pub read_ct: i32,
    pub enqueued_at: DateTime<Utc>,
    pub message: serde_json::Value,
}

/// Creates `queue_name` if it does not exist yet.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if pgmq is unavailable or the call fails.
pub async fn create_queue(pool: &PgPool, queue_name: &str) -> Result<(), DbError> {
    sqlx::query("SELECT pgmq.create($1)")
        .bind(queue_name)
        .execute(pool)
        .await?;
    Ok(())
}

/// Reads at most one message, hiding it for `visibility_timeout_secs`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the read fails.
pub async fn read_message(
    pool: &PgPool,
    queue_name: &str,
    visibility_timeout_secs: i32,
) -> Result<Option<QueueMessage>, DbError> {
    let message = sqlx::query_as::<_, QueueMessage>(
        "SELECT msg_id, read_ct, enqueued_at, message FROM pgmq.read($1, $2, 1)",
    )
    .bind(queue_name)
    .bind(visibility_timeout_secs)
    .fetch_optional(pool)
    .await?;

    Ok(message)
}

/// Deletes a message. Returns `false` if it was already gone.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn delete_message(pool: &PgPool, queue_name: &str, msg_id: i64) -> Result<bool, DbError> {
    let deleted = sqlx::query_scalar::<_, bool>("SELECT pgmq.delete($1, $2::bigint)")
        .bind(queue_name)
        .bind(msg_id)
        .fetch_one(pool)
        .await?;
    Ok(deleted)
}

/// Sends `message` and returns its id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the send fails.
pub async fn send_message(
    pool: &PgPool,
    queue_name: &str,
    message: &serde_json::Value,
) -> Result<i64, DbError> {
    let msg_id = sqlx::query_scalar::<_, i64>("SELECT pgmq.send($1, $2::jsonb)")
        .bind(queue_name)
        .bind(message)
        .fetch_one(pool)
        .await?;
    Ok(msg_id)
}
