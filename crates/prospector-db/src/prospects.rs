//! Database operations for `prospects`.

use chrono::{DateTime, Utc};
use prospector_core::{Prospect, ProspectStatus};
use sqlx::PgPool;

use crate::DbError;

/// A row from the `prospects` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProspectRow {
    pub id: i64,
    pub workflow_run_id: i64,
    pub url: String,
    pub business_name: String,
    pub industry: Option<String>,
    pub location: Option<String>,
    pub status: String,
    pub discovered_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

const PROSPECT_COLUMNS: &str =
    "id, workflow_run_id, url, business_name, industry, location, status, discovered_at, created_at";

/// Inserts `prospects` under a run. A URL already recorded for the run is
/// left untouched.
///
/// Returns the number of rows actually inserted.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if an insert fails.
pub async fn insert_prospects(
    pool: &PgPool,
    workflow_run_id: i64,
    prospects: &[Prospect],
) -> Result<u64, DbError> {
    let mut inserted = 0;
    for prospect in prospects {
        let result = sqlx::query(
            "INSERT INTO prospects \
                 (workflow_run_id, url, business_name, industry, location, status, discovered_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (workflow_run_id, url) DO NOTHING",
        )
        .bind(workflow_run_id)
        .bind(&prospect.url)
        .bind(&prospect.business_name)
        .bind(prospect.industry.as_deref())
        .bind(prospect.location.as_deref())
        .bind(prospect.status.as_str())
        .bind(prospect.discovered_at)
        .execute(pool)
        .await?;
        inserted += result.rows_affected();
    }
    Ok(inserted)
}

/// Looks up the prospect recorded for `url` within a run.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_prospect_by_url(
    pool: &PgPool,
    workflow_run_id: i64,
    url: &str,
) -> Result<Option<ProspectRow>, DbError> {
    let row = sqlx::query_as::<_, ProspectRow>(&format!(
        "SELECT {PROSPECT_COLUMNS} FROM prospects WHERE workflow_run_id = $1 AND url = $2"
    ))
    .bind(workflow_run_id)
    .bind(url)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// All prospects for a run in insertion order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_prospects_for_run(
    pool: &PgPool,
    workflow_run_id: i64,
) -> Result<Vec<ProspectRow>, DbError> {
    let rows = sqlx::query_as::<_, ProspectRow>(&format!(
        "SELECT {PROSPECT_COLUMNS} FROM prospects WHERE workflow_run_id = $1 ORDER BY id"
    ))
    .bind(workflow_run_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Sets a prospect's status to `analyzed`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the prospect does not exist, or [`DbError::Sqlx`].
pub async fn mark_prospect_analyzed(pool: &PgPool, prospect_id: i64) -> Result<(), DbError> {
    let result = sqlx::query("UPDATE prospects SET status = $1 WHERE id = $2")
        .bind(ProspectStatus::Analyzed.as_str())
        .bind(prospect_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}
