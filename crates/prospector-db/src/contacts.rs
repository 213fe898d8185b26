//! Database operations for `contacts`: one row per extracted value.

use chrono::{DateTime, Utc};
use prospector_core::ContactInfo;
use sqlx::PgPool;

use crate::prospects::get_prospect_by_url;
use crate::DbError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactType {
    Email,
    Phone,
    Social,
    ContactPage,
}

impl ContactType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ContactType::Email => "email",
            ContactType::Phone => "phone",
            ContactType::Social => "social",
            ContactType::ContactPage => "contact_page",
        }
    }
}

/// A row from the `contacts` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ContactRow {
    pub id: i64,
    pub prospect_id: i64,
    pub contact_type: String,
    pub value: String,
    pub created_at: DateTime<Utc>,
}

/// Flatten `info` into typed `(kind, value)` pairs in storage order.
#[must_use]
pub fn contact_rows(info: &ContactInfo) -> Vec<(ContactType, &str)> {
    let emails = info.emails.iter().map(|v| (ContactType::Email, v.as_str()));
    let phones = info.phones.iter().map(|v| (ContactType::Phone, v.as_str()));
    let social = info
        .social_links
        .iter()
        .map(|v| (ContactType::Social, v.as_str()));
    let page = info
        .contact_page_url
        .as_deref()
        .map(|v| (ContactType::ContactPage, v));
    emails.chain(phones).chain(social).chain(page).collect()
}

/// Stores `info` for the prospect with URL `url` in the run.
///
/// Returns the number of rows inserted; `0` when the run has no such
/// prospect.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if a query fails.
pub async fn insert_contacts(
    pool: &PgPool,
    workflow_run_id: i64,
    url: &str,
    info: &ContactInfo,
) -> Result<u64, DbError> {
    let rows = contact_rows(info);
    if rows.is_empty() {
        return Ok(0);
    }
    let Some(prospect) = get_prospect_by_url(pool, workflow_run_id, url).await? else {
        tracing::warn!(
            workflow_run_id,
            url,
            "no prospect recorded for contact URL, skipping contacts"
        );
        return Ok(0);
    };

    let mut inserted = 0;
    for (kind, value) in rows {
        let result = sqlx::query(
            "INSERT INTO contacts (prospect_id, contact_type, value) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (prospect_id, contact_type, value) DO NOTHING",
        )
        .bind(prospect.id)
        .bind(kind.as_str())
        .bind(value)
        .execute(pool)
        .await?;
        inserted += result.rows_affected();
    }
    Ok(inserted)
}

/// Contact rows for a prospect in insertion order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_contacts_for_prospect(
    pool: &PgPool,
    prospect_id: i64,
) -> Result<Vec<ContactRow>, DbError> {
    let rows = sqlx::query_as::<_, ContactRow>(
        "SELECT id, prospect_id, contact_type, value, created_at \
         FROM contacts WHERE prospect_id = $1 ORDER BY id",
    )
    .bind(prospect_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
