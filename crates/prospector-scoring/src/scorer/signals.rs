//! The five sub-scorers.
//!
//! Each accumulates integer points out of 100 and converts once at the end,
//! so boundary values such as 0.3 and 0.6 come out exact.

use chrono::{DateTime, Datelike, Utc};

use super::markup;
use crate::telemetry::{MobileSignals, PageStructure, PerformanceSignals, SecuritySignals};

/// Score used when the browser probe for a metric failed.
pub(crate) const PROBE_FALLBACK: f64 = 0.5;

const MAX_POINTS: u32 = 100;

fn from_points(points: u32) -> f64 {
    f64::from(points.min(MAX_POINTS)) / 100.0
}

pub(crate) fn mobile_responsiveness(signals: Option<&MobileSignals>) -> f64 {
    let Some(m) = signals else {
        return PROBE_FALLBACK;
    };

    let mut points = 0;
    if m.has_viewport_meta {
        points += 40;
    }
    if m.has_media_queries {
        points += 40;
    }
    if f64::from(m.body_width_px) <= f64::from(m.viewport_width_px) * 1.1 {
        points += 20;
    }
    from_points(points)
}

pub(crate) fn performance(signals: Option<&PerformanceSignals>) -> f64 {
    let Some(p) = signals else {
        return PROBE_FALLBACK;
    };

    let mut penalty = 0;
    if p.load_time_ms > 3000.0 {
        penalty += 30;
    } else if p.load_time_ms > 1500.0 {
        penalty += 10;
    }
    if p.first_paint_ms > 2000.0 {
        penalty += 20;
    }
    if p.image_count > 50 {
        penalty += 10;
    }
    if p.script_count > 20 {
        penalty += 10;
    }
    from_points(MAX_POINTS.saturating_sub(penalty))
}

pub(crate) fn seo(page: &PageStructure) -> f64 {
    let mut points: u32 = 0;
    if page.has_title() {
        points += 20;
    }
    if page.has_meta_description() {
        points += 20;
    }
    match page.h1_count {
        0 => {}
        1 => points += 15,
        _ => points += 10,
    }
    if page.has_subheadings {
        points += 10;
    }
    if page.internal_link_count > 5 {
        points += 10;
    }
    if page.has_schema_markup {
        points += 10;
    }

    let alt_points = if page.total_image_count == 0 {
        15.0
    } else {
        let with_alt = page.images_with_alt_count.min(page.total_image_count);
        15.0 * f64::from(with_alt) / f64::from(page.total_image_count)
    };

    ((f64::from(points) + alt_points) / 100.0).clamp(0.0, 1.0)
}

pub(crate) fn security(signals: Option<&SecuritySignals>) -> f64 {
    let Some(s) = signals else {
        return PROBE_FALLBACK;
    };

    let mut points = 0;
    if s.is_https {
        points += 50;
    }
    if s.has_csp_meta {
        points += 20;
    }
    if s.form_actions.iter().all(|f| f.secure) {
        // Also covers a page with no forms at all.
        points += 30;
    } else {
        points += 10;
    }
    from_points(points)
}

pub(crate) fn outdated(html: &str, now: DateTime<Utc>) -> f64 {
    let indicators = markup::legacy_indicator_count(html);
    let mut points = u32::try_from(indicators).unwrap_or(u32::MAX).saturating_mul(10);

    if markup::inline_style_count(html) > 10 {
        points = points.saturating_add(20);
    }
    if markup::has_plugin_content(html) {
        points = points.saturating_add(30);
    }
    if markup::has_frontpage_generator(html) {
        points = points.saturating_add(20);
    }
    let current_year = now.year();
    if markup::copyright_years(html).any(|year| current_year - year > 3) {
        points = points.saturating_add(20);
    }
    from_points(points)
}
