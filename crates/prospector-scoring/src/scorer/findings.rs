use super::markup;
use crate::analysis::ImprovementArea;
use crate::metrics::SubScores;
use crate::telemetry::TelemetryBundle;

const IMPROVEMENT_THRESHOLD: f64 = 0.6;
const OUTDATED_THRESHOLD: f64 = 0.4;
const INLINE_STYLE_ISSUE_THRESHOLD: usize = 5;

pub(crate) const UNANALYZABLE_ISSUES: &str = "Could not analyze technical issues";

pub(crate) fn improvement_areas(scores: &SubScores) -> Vec<ImprovementArea> {
    let mut areas = Vec::new();
    if scores.mobile_responsiveness < IMPROVEMENT_THRESHOLD {
        areas.push(ImprovementArea::MobileResponsiveness);
    }
    if scores.performance < IMPROVEMENT_THRESHOLD {
        areas.push(ImprovementArea::PageSpeedOptimization);
    }
    if scores.seo < IMPROVEMENT_THRESHOLD {
        areas.push(ImprovementArea::SearchEngineOptimization);
    }
    if scores.security < IMPROVEMENT_THRESHOLD {
        areas.push(ImprovementArea::SecurityEnhancements);
    }
    if scores.outdated > OUTDATED_THRESHOLD {
        areas.push(ImprovementArea::ModernDesignUpdate);
    }
    areas
}

pub(crate) fn technical_issues(bundle: &TelemetryBundle) -> Vec<String> {
    let Some(broken) = bundle.broken_image_count else {
        return vec![UNANALYZABLE_ISSUES.to_string()];
    };

    let html = bundle.raw_html_lowercase.as_str();
    let mut issues = Vec::new();

    if broken > 0 {
        issues.push(format!("{broken} broken images detected"));
    }
    let missing_alt = bundle.page.images_missing_alt();
    if missing_alt > 0 {
        issues.push(format!("{missing_alt} images missing alt text"));
    }
    let inline_styles = markup::inline_style_count(html);
    if inline_styles > INLINE_STYLE_ISSUE_THRESHOLD {
        issues.push(format!("Excessive inline styles ({inline_styles} elements)"));
    }
    if !bundle.page.has_title() {
        issues.push("Missing page title".to_string());
    }
    if !bundle.page.has_meta_description() {
        issues.push("Missing meta description".to_string());
    }
    let http_resources = markup::http_resource_count(html);
    if http_resources > 0 {
        issues.push(format!("{http_resources} resources loaded over HTTP"));
    }
    issues
}
