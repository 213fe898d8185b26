//! Page telemetry consumed by the scorer.
//!
//! A bundle is produced once per rendered URL by a telemetry source and is
//! read-only from then on. Signal groups gathered by separate browser probes
//! are `Option`s: `None` records that the probe itself failed, which the
//! scorer answers with a neutral fallback instead of failing the analysis.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TelemetryBundle {
    /// Final URL after navigation.
    pub url: String,
    pub mobile: Option<MobileSignals>,
    pub performance: Option<PerformanceSignals>,
    pub security: Option<SecuritySignals>,
    /// Images that failed to load. `None` if the probe failed.
    pub broken_image_count: Option<u32>,
    pub page: PageStructure,
    /// Serialized document, lowercased.
    pub raw_html_lowercase: String,
}

/// Measured on a 375px-wide viewport.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MobileSignals {
    pub has_viewport_meta: bool,
    pub has_media_queries: bool,
    pub body_width_px: u32,
    pub viewport_width_px: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSignals {
    pub load_time_ms: f64,
    pub dom_content_loaded_ms: f64,
    pub first_paint_ms: f64,
    pub image_count: u32,
    pub script_count: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SecuritySignals {
    pub is_https: bool,
    pub has_csp_meta: bool,
    pub form_actions: Vec<FormAction>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormAction {
    pub secure: bool,
}

impl FormAction {
    /// Classify a form's `action` attribute.
    ///
    /// Missing, empty, relative and `https://` actions are secure. Only an
    /// explicit plain-`http://` target is not.
    #[must_use]
    pub fn from_attribute(action: Option<&str>) -> Self {
        let secure = action
            .map(|a| a.trim().to_ascii_lowercase())
            .is_none_or(|a| !a.starts_with("http://"));
        Self { secure }
    }
}

/// Document structure used by the SEO checks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageStructure {
    /// Text of the `<title>` element if one exists (may be empty).
    pub title_text: Option<String>,
    /// `content` of `<meta name="description">` if the tag exists.
    pub meta_description: Option<String>,
    pub h1_count: u32,
    pub has_subheadings: bool,
    /// Images whose `alt` is non-empty.
    pub images_with_alt_count: u32,
    /// Images with no `alt` attribute at all; `alt=""` counts as present.
    #[serde(default)]
    pub images_without_alt_attr_count: u32,
    pub total_image_count: u32,
    pub internal_link_count: u32,
    pub has_schema_markup: bool,
}

impl PageStructure {
    #[must_use]
    pub fn has_title(&self) -> bool {
        self.title_text.as_deref().is_some_and(|t| !t.trim().is_empty())
    }

    #[must_use]
    pub fn has_meta_description(&self) -> bool {
        self.meta_description
            .as_deref()
            .is_some_and(|d| !d.trim().is_empty())
    }

    #[must_use]
    pub fn images_missing_alt(&self) -> u32 {
        self.images_without_alt_attr_count
            .min(self.total_image_count)
    }
}
