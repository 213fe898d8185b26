use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::metrics::{Metric, SubScores};

/// Tag naming an area where a site would benefit from work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImprovementArea {
    MobileResponsiveness,
    PageSpeedOptimization,
    SearchEngineOptimization,
    SecurityEnhancements,
    ModernDesignUpdate,
}

impl ImprovementArea {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ImprovementArea::MobileResponsiveness => "mobile_responsiveness",
            ImprovementArea::PageSpeedOptimization => "page_speed_optimization",
            ImprovementArea::SearchEngineOptimization => "search_engine_optimization",
            ImprovementArea::SecurityEnhancements => "security_enhancements",
            ImprovementArea::ModernDesignUpdate => "modern_design_update",
        }
    }
}

impl std::fmt::Display for ImprovementArea {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scored result for one website.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteAnalysis {
    pub url: String,
    pub scores: SubScores,
    pub overall_score: f64,
    /// Ordered, without duplicates.
    pub improvement_areas: Vec<ImprovementArea>,
    pub technical_issues: Vec<String>,
    pub analyzed_at: DateTime<Utc>,
}

const SUGGESTION_THRESHOLD: f64 = 0.7;
const OUTDATED_SUGGESTION_THRESHOLD: f64 = 0.3;

impl SiteAnalysis {
    #[must_use]
    pub fn score(&self, metric: Metric) -> f64 {
        self.scores.get(metric)
    }

    #[must_use]
    pub fn needs(&self, area: ImprovementArea) -> bool {
        self.improvement_areas.contains(&area)
    }

    /// Pitch-ready suggestions, one per weak dimension.
    ///
    /// Uses a looser 0.7 bar than the improvement-area tags; the inverted
    /// `outdated` metric is flagged above 0.3.
    #[must_use]
    pub fn improvement_suggestions(&self) -> Vec<&'static str> {
        let s = &self.scores;
        let mut suggestions = Vec::new();
        if s.mobile_responsiveness < SUGGESTION_THRESHOLD {
            suggestions.push("Implement responsive design for mobile devices");
        }
        if s.performance < SUGGESTION_THRESHOLD {
            suggestions.push("Optimize page load speeds and reduce resource sizes");
        }
        if s.seo < SUGGESTION_THRESHOLD {
            suggestions.push("Improve SEO with better meta tags and content structure");
        }
        if s.security < SUGGESTION_THRESHOLD {
            suggestions.push("Upgrade to HTTPS and implement security headers");
        }
        if s.outdated > OUTDATED_SUGGESTION_THRESHOLD {
            suggestions.push("Modernize design and update content");
        }
        suggestions
    }
}
