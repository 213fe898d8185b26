//! Deterministic website scoring.
//!
//! A [`TelemetryBundle`] captured by a browser probe goes in, a
//! [`SiteAnalysis`] with five sub-scores, a weighted composite and derived
//! issue lists comes out. Nothing in this crate performs I/O.

pub mod analysis;
pub mod metrics;
pub mod scorer;
pub mod telemetry;

pub use analysis::{ImprovementArea, SiteAnalysis};
pub use metrics::{Metric, ScoringWeights, SubScores};
pub use scorer::{composite_score, score, score_at, sub_scores, NEUTRAL_COMPOSITE};
pub use telemetry::{
    FormAction, MobileSignals, PageStructure, PerformanceSignals, SecuritySignals,
    TelemetryBundle,
};
