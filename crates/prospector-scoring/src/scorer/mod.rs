//! Telemetry → [`SiteAnalysis`].
//!
//! Everything here is pure; the only clock read is in [`score`].

mod findings;
mod markup;
mod signals;

#[cfg(test)]
#[path = "scorer_test.rs"]
mod tests;

use chrono::{DateTime, Utc};

use crate::analysis::SiteAnalysis;
use crate::metrics::{Metric, ScoringWeights, SubScores};
use crate::telemetry::TelemetryBundle;

/// Composite used when every weight is zero.
pub const NEUTRAL_COMPOSITE: f64 = 0.5;

/// Score one rendered page against `weights`, stamped with the current time.
#[must_use]
pub fn score(bundle: &TelemetryBundle, weights: &ScoringWeights) -> SiteAnalysis {
    score_at(bundle, weights, Utc::now())
}

/// Same as [`score`] with an explicit clock.
///
/// `now` drives both the `analyzed_at` stamp and the stale-copyright check.
#[must_use]
pub fn score_at(
    bundle: &TelemetryBundle,
    weights: &ScoringWeights,
    now: DateTime<Utc>,
) -> SiteAnalysis {
    let scores = sub_scores(bundle, now);
    let overall_score = composite_score(&scores, weights);

    tracing::debug!(
        url = %bundle.url,
        mobile = scores.mobile_responsiveness,
        performance = scores.performance,
        seo = scores.seo,
        security = scores.security,
        outdated = scores.outdated,
        overall = overall_score,
        "site scored"
    );

    SiteAnalysis {
        url: bundle.url.clone(),
        improvement_areas: findings::improvement_areas(&scores),
        technical_issues: findings::technical_issues(bundle),
        scores,
        overall_score,
        analyzed_at: now,
    }
}

/// The five sub-scores for `bundle`, each in `[0, 1]`.
#[must_use]
pub fn sub_scores(bundle: &TelemetryBundle, now: DateTime<Utc>) -> SubScores {
    SubScores {
        mobile_responsiveness: signals::mobile_responsiveness(bundle.mobile.as_ref()),
        performance: signals::performance(bundle.performance.as_ref()),
        seo: signals::seo(&bundle.page),
        security: signals::security(bundle.security.as_ref()),
        outdated: signals::outdated(&bundle.raw_html_lowercase, now),
    }
}

/// Weighted mean of the canonical metrics, or [`NEUTRAL_COMPOSITE`] when the
/// total weight is zero.
#[must_use]
pub fn composite_score(scores: &SubScores, weights: &ScoringWeights) -> f64 {
    let total = weights.total();
    if total <= 0.0 {
        return NEUTRAL_COMPOSITE;
    }
    let weighted: f64 = Metric::ALL
        .into_iter()
        .map(|m| scores.get(m) * weights.weight(m))
        .sum();
    (weighted / total).clamp(0.0, 1.0)
}
