//! Database operations for `workflow_runs`.
//!
//! A run moves `pending → running → {completed, failed}`; a pending run may
//! also fail directly. Transition queries guard on the current status so a
//! terminal run is never rewritten.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::Pending => "pending",
            RunStatus::Running => "running",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A row from the `workflow_runs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct WorkflowRunRow {
    pub id: i64,
    pub public_id: Uuid,
    pub workflow_name: String,
    pub audience_name: String,
    pub location: String,
    pub max_prospects: Option<i32>,
    pub status: String,
    pub error_message: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

const RUN_COLUMNS: &str = "id, public_id, workflow_name, audience_name, location, max_prospects, \
                           status, error_message, started_at, finished_at, created_at";

/// Creates a new run in `pending` status with a fresh `public_id`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_workflow_run(
    pool: &PgPool,
    audience_name: &str,
    location: &str,
    max_prospects: Option<i32>,
) -> Result<WorkflowRunRow, DbError> {
    let row = sqlx::query_as::<_, WorkflowRunRow>(&format!(
        "INSERT INTO workflow_runs (public_id, audience_name, location, max_prospects, status) \
         VALUES ($1, $2, $3, $4, 'pending') \
         RETURNING {RUN_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(audience_name)
    .bind(location)
    .bind(max_prospects)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Marks a pending run as `running` and sets `started_at = NOW()`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] for an unknown run,
/// [`DbError::InvalidRunTransition`] if the run is not pending, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn start_workflow_run(pool: &PgPool, public_id: Uuid) -> Result<WorkflowRunRow, DbError> {
    let row = sqlx::query_as::<_, WorkflowRunRow>(&format!(
        "UPDATE workflow_runs \
         SET status = 'running', started_at = NOW() \
         WHERE public_id = $1 AND status = 'pending' \
         RETURNING {RUN_COLUMNS}"
    ))
    .bind(public_id)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => Ok(row),
        None => Err(transition_error(pool, public_id, RunStatus::Running, "pending").await),
    }
}

/// Marks a running run as `completed` and sets `finished_at = NOW()`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`], [`DbError::InvalidRunTransition`] if the
/// run is not running, or [`DbError::Sqlx`].
pub async fn complete_workflow_run(pool: &PgPool, public_id: Uuid) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE workflow_runs \
         SET status = 'completed', finished_at = NOW() \
         WHERE public_id = $1 AND status = 'running'",
    )
    .bind(public_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(transition_error(pool, public_id, RunStatus::Completed, "running").await);
    }
    Ok(())
}

/// Marks a pending or running run as `failed` with `error_message`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`], [`DbError::InvalidRunTransition`] if the
/// run already finished, or [`DbError::Sqlx`].
pub async fn fail_workflow_run(
    pool: &PgPool,
    public_id: Uuid,
    error_message: &str,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE workflow_runs \
         SET status = 'failed', finished_at = NOW(), error_message = $1 \
         WHERE public_id = $2 AND status IN ('pending', 'running')",
    )
    .bind(error_message)
    .bind(public_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(
            transition_error(pool, public_id, RunStatus::Failed, "pending or running").await,
        );
    }
    Ok(())
}

/// Fetches a single run by its `public_id`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no such run exists, or [`DbError::Sqlx`].
pub async fn get_workflow_run_by_public_id(
    pool: &PgPool,
    public_id: Uuid,
) -> Result<WorkflowRunRow, DbError> {
    sqlx::query_as::<_, WorkflowRunRow>(&format!(
        "SELECT {RUN_COLUMNS} FROM workflow_runs WHERE public_id = $1"
    ))
    .bind(public_id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

/// Returns the most recent `limit` runs, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_workflow_runs(pool: &PgPool, limit: i64) -> Result<Vec<WorkflowRunRow>, DbError> {
    let rows = sqlx::query_as::<_, WorkflowRunRow>(&format!(
        "SELECT {RUN_COLUMNS} FROM workflow_runs \
         ORDER BY created_at DESC, id DESC \
         LIMIT $1"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

async fn transition_error(
    pool: &PgPool,
    public_id: Uuid,
    target: RunStatus,
    expected: &'static str,
) -> DbError {
    match get_workflow_run_by_public_id(pool, public_id).await {
        Ok(_) => DbError::InvalidRunTransition {
            public_id,
            target: target.as_str(),
            expected,
        },
        Err(e) => e,
    }
}
