//! The five canonical scoring metrics, their scores and their weights.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    MobileResponsiveness,
    Performance,
    Seo,
    Security,
    /// Inverted: higher means more outdated.
    Outdated,
}

impl Metric {
    pub const ALL: [Metric; 5] = [
        Metric::MobileResponsiveness,
        Metric::Performance,
        Metric::Seo,
        Metric::Security,
        Metric::Outdated,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Metric::MobileResponsiveness => "mobile_responsiveness",
            Metric::Performance => "performance",
            Metric::Seo => "seo",
            Metric::Security => "security",
            Metric::Outdated => "outdated",
        }
    }

    /// Parse a canonical metric key. Audience-facing names such as
    /// `page_speed` are not canonical and return `None`.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Metric::ALL.into_iter().find(|m| m.as_str() == key)
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One score per metric, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SubScores {
    pub mobile_responsiveness: f64,
    pub performance: f64,
    pub seo: f64,
    pub security: f64,
    pub outdated: f64,
}

impl SubScores {
    #[must_use]
    pub fn get(&self, metric: Metric) -> f64 {
        match metric {
            Metric::MobileResponsiveness => self.mobile_responsiveness,
            Metric::Performance => self.performance,
            Metric::Seo => self.seo,
            Metric::Security => self.security,
            Metric::Outdated => self.outdated,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Metric, f64)> + '_ {
        Metric::ALL.into_iter().map(|m| (m, self.get(m)))
    }
}

/// Non-negative weight per metric. Metrics without an entry weigh zero.
///
/// Weights need not sum to one; the composite divides by their total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    weights: BTreeMap<Metric, f64>,
}

impl ScoringWeights {
    #[must_use]
    pub fn empty() -> Self {
        Self {
            weights: BTreeMap::new(),
        }
    }

    /// The same weight for every metric.
    #[must_use]
    pub fn uniform(weight: f64) -> Self {
        Metric::ALL
            .into_iter()
            .fold(Self::empty(), |w, m| w.with(m, weight))
    }

    /// Set one metric's weight. Negative and non-finite values are stored as 0.
    #[must_use]
    pub fn with(mut self, metric: Metric, weight: f64) -> Self {
        let weight = if weight.is_finite() { weight.max(0.0) } else { 0.0 };
        self.weights.insert(metric, weight);
        self
    }

    /// Build from string keys, ignoring keys that are not canonical metrics.
    #[must_use]
    pub fn from_keyed<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        pairs.into_iter().fold(Self::empty(), |w, (key, weight)| {
            match Metric::from_key(key) {
                Some(metric) => w.with(metric, weight),
                None => {
                    tracing::debug!(key, "ignoring non-canonical scoring weight");
                    w
                }
            }
        })
    }

    #[must_use]
    pub fn weight(&self, metric: Metric) -> f64 {
        self.weights.get(&metric).copied().unwrap_or(0.0)
    }

    #[must_use]
    pub fn total(&self) -> f64 {
        Metric::ALL.into_iter().map(|m| self.weight(m)).sum()
    }
}

impl Default for ScoringWeights {
    /// 0.25 mobile, 0.25 performance, 0.20 SEO, 0.15 security, 0.15 outdated.
    fn default() -> Self {
        Self::empty()
            .with(Metric::MobileResponsiveness, 0.25)
            .with(Metric::Performance, 0.25)
            .with(Metric::Seo, 0.20)
            .with(Metric::Security, 0.15)
            .with(Metric::Outdated, 0.15)
    }
}
