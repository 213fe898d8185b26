//! Database operations for `site_analyses`.

use chrono::{DateTime, Utc};
use prospector_core::ProspectStatus;
use prospector_scoring::SiteAnalysis;
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::prospects::get_prospect_by_url;
use crate::DbError;

/// A row from the `site_analyses` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SiteAnalysisRow {
    pub id: i64,
    pub prospect_id: i64,
    pub mobile_score: Decimal,
    pub performance_score: Decimal,
    pub seo_score: Decimal,
    pub security_score: Decimal,
    pub outdated_score: Decimal,
    pub overall_score: Decimal,
    pub improvement_areas: serde_json::Value,
    pub technical_issues: serde_json::Value,
    pub scores_json: serde_json::Value,
    pub analyzed_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Score in `[0, 1]` as a `NUMERIC(4,3)` value.
#[must_use]
pub fn score_to_decimal(score: f64) -> Decimal {
    let clamped = if score.is_finite() { score.clamp(0.0, 1.0) } else { 0.0 };
    let mut value = Decimal::from_f64_retain(clamped)
        .unwrap_or_default()
        .round_dp(3);
    value.rescale(3);
    value
}

/// Records `analysis` for the prospect with the same URL in the run and marks
/// that prospect `analyzed`.
///
/// Returns `false` without writing when the run has no such prospect or the
/// prospect already has an analysis.
///
/// # Errors
///
/// Returns [`DbError::Encode`] if the analysis cannot be serialized, or
/// [`DbError::Sqlx`] if a query fails.
pub async fn insert_site_analysis(
    pool: &PgPool,
    workflow_run_id: i64,
    analysis: &SiteAnalysis,
) -> Result<bool, DbError> {
    let Some(prospect) = get_prospect_by_url(pool, workflow_run_id, &analysis.url).await? else {
        tracing::warn!(
            workflow_run_id,
            url = %analysis.url,
            "no prospect recorded for analysed URL, skipping analysis"
        );
        return Ok(false);
    };

    let encode = |context, value: Result<serde_json::Value, serde_json::Error>| {
        value.map_err(|source| DbError::Encode { context, source })
    };
    let improvement_areas = encode(
        "improvement areas",
        serde_json::to_value(&analysis.improvement_areas),
    )?;
    let technical_issues = encode(
        "technical issues",
        serde_json::to_value(&analysis.technical_issues),
    )?;
    let scores_json = encode("site analysis", serde_json::to_value(analysis))?;

    let s = &analysis.scores;
    let mut tx = pool.begin().await?;
    let result = sqlx::query(
        "INSERT INTO site_analyses \
             (prospect_id, mobile_score, performance_score, seo_score, security_score, \
              outdated_score, overall_score, improvement_areas, technical_issues, scores_json, \
              analyzed_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
         ON CONFLICT (prospect_id) DO NOTHING",
    )
    .bind(prospect.id)
    .bind(score_to_decimal(s.mobile_responsiveness))
    .bind(score_to_decimal(s.performance))
    .bind(score_to_decimal(s.seo))
    .bind(score_to_decimal(s.security))
    .bind(score_to_decimal(s.outdated))
    .bind(score_to_decimal(analysis.overall_score))
    .bind(improvement_areas)
    .bind(technical_issues)
    .bind(scores_json)
    .bind(analysis.analyzed_at)
    .execute(&mut *tx)
    .await?;

    if result.rows_affected() == 0 {
        tx.rollback().await?;
        return Ok(false);
    }

    sqlx::query("UPDATE prospects SET status = $1 WHERE id = $2")
        .bind(ProspectStatus::Analyzed.as_str())
        .bind(prospect.id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    Ok(true)
}

/// The analysis stored for a prospect, if any.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_site_analysis_for_prospect(
    pool: &PgPool,
    prospect_id: i64,
) -> Result<Option<SiteAnalysisRow>, DbError> {
    let row = sqlx::query_as::<_, SiteAnalysisRow>(
        "SELECT id, prospect_id, mobile_score, performance_score, seo_score, security_score, \
                outdated_score, overall_score, improvement_areas, technical_issues, scores_json, \
                analyzed_at, created_at \
         FROM site_analyses WHERE prospect_id = $1",
    )
    .bind(prospect_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scores_round_to_three_places() {
        assert_eq!(score_to_decimal(0.3).to_string(), "0.300");
        assert_eq!(score_to_decimal(0.1234).to_string(), "0.123");
        assert_eq!(score_to_decimal(1.0).to_string(), "1.000");
    }

    #[test]
    fn out_of_range_scores_are_clamped() {
        assert_eq!(score_to_decimal(1.7), score_to_decimal(1.0));
        assert_eq!(score_to_decimal(-0.2), Decimal::ZERO);
        assert_eq!(score_to_decimal(f64::NAN), Decimal::ZERO);
    }
}
