//! Page telemetry capture through the Browserless `/function` endpoint.
//!
//! [`PROBE_SCRIPT`] navigates to the page and collects each signal group in
//! its own guarded `evaluate`, so one failing probe leaves the others intact.
//! A failed group comes back as `null` and maps to `None` in the bundle.

use prospector_scoring::{
    FormAction, MobileSignals, PageStructure, PerformanceSignals, SecuritySignals,
    TelemetryBundle,
};
use serde::{Deserialize, Serialize};

use crate::browserless::BrowserlessClient;
use crate::error::ScraperError;

pub const PROBE_SCRIPT: &str = r#"
export default async function ({ page, context }) {
  const json = (data) => ({ data, type: "application/json" });
  try {
    await page.goto(context.url, { waitUntil: "networkidle2", timeout: context.timeoutMs });
  } catch (e) {
    return json({ navigationError: String((e && e.message) || e) });
  }
  const guarded = async (fn) => {
    try { return await page.evaluate(fn); } catch (e) { return null; }
  };

  const mobile = await guarded(() => {
    const mediaQueries = Array.from(document.styleSheets).some((sheet) => {
      try {
        return Array.from(sheet.cssRules).some(
          (rule) => rule.media && rule.media.mediaText.includes("max-width"));
      } catch (e) { return false; }
    });
    return {
      hasViewportMeta: !!document.querySelector('meta[name="viewport"]'),
      hasMediaQueries: mediaQueries,
      bodyWidth: document.body ? document.body.scrollWidth : 0,
      viewportWidth: window.innerWidth,
    };
  });

  const performance = await guarded(() => {
    const nav = window.performance.getEntriesByType("navigation")[0];
    const paint = window.performance.getEntriesByType("paint")
      .find((entry) => entry.name === "first-paint");
    return {
      loadTime: nav ? nav.loadEventEnd - nav.loadEventStart : 0,
      domContentLoaded: nav ? nav.domContentLoadedEventEnd - nav.domContentLoadedEventStart : 0,
      firstPaint: paint ? paint.startTime : 0,
      imageCount: document.images.length,
      scriptCount: document.scripts.length,
    };
  });

  const security = await guarded(() => ({
    isHttps: window.location.protocol === "https:",
    hasCspMeta: !!document.querySelector('meta[http-equiv="Content-Security-Policy"]'),
    formActions: Array.from(document.forms).map((form) => form.getAttribute("action")),
  }));

  const brokenImageCount = await guarded(() =>
    Array.from(document.images).filter((img) => !img.complete || img.naturalWidth === 0).length);

  const structure = await guarded(() => {
    const title = document.querySelector("title");
    const description = document.querySelector('meta[name="description"]');
    const images = Array.from(document.images);
    return {
      title: title ? title.textContent : null,
      metaDescription: description ? description.getAttribute("content") : null,
      h1Count: document.querySelectorAll("h1").length,
      hasSubheadings: document.querySelectorAll("h2, h3").length > 0,
      imagesWithAlt: images.filter((img) => img.getAttribute("alt")).length,
      imagesWithoutAltAttr: images.filter((img) => !img.hasAttribute("alt")).length,
      totalImages: images.length,
      internalLinkCount: document.querySelectorAll("a[href]").length,
      hasSchemaMarkup: !!document.querySelector('[itemtype], script[type="application/ld+json"]'),
    };
  });

  return json({ mobile, performance, security, brokenImageCount, structure, html: await page.content() });
}
"#;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProbeContext<'a> {
    url: &'a str,
    timeout_ms: u64,
}

/// Decoded result of [`PROBE_SCRIPT`].
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawProbe {
    #[serde(default)]
    pub navigation_error: Option<String>,
    #[serde(default)]
    pub mobile: Option<RawMobile>,
    #[serde(default)]
    pub performance: Option<RawPerformance>,
    #[serde(default)]
    pub security: Option<RawSecurity>,
    #[serde(default)]
    pub broken_image_count: Option<u32>,
    #[serde(default)]
    pub structure: Option<RawStructure>,
    #[serde(default)]
    pub html: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMobile {
    pub has_viewport_meta: bool,
    pub has_media_queries: bool,
    pub body_width: u32,
    pub viewport_width: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPerformance {
    pub load_time: f64,
    pub dom_content_loaded: f64,
    pub first_paint: f64,
    pub image_count: u32,
    pub script_count: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSecurity {
    pub is_https: bool,
    pub has_csp_meta: bool,
    #[serde(default)]
    pub form_actions: Vec<Option<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawStructure {
    pub title: Option<String>,
    pub meta_description: Option<String>,
    pub h1_count: u32,
    pub has_subheadings: bool,
    pub images_with_alt: u32,
    #[serde(default)]
    pub images_without_alt_attr: u32,
    pub total_images: u32,
    pub internal_link_count: u32,
    pub has_schema_markup: bool,
}

impl RawProbe {
    /// Convert into a [`TelemetryBundle`] for `url`.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::RenderFailure`] if navigation failed or the
    /// document itself could not be captured.
    pub fn into_bundle(self, url: &str) -> Result<TelemetryBundle, ScraperError> {
        if let Some(reason) = self.navigation_error {
            return Err(ScraperError::render_failure(url, reason));
        }
        let Some(html) = self.html else {
            return Err(ScraperError::render_failure(url, "probe returned no document"));
        };
        let Some(structure) = self.structure else {
            return Err(ScraperError::render_failure(url, "page structure probe failed"));
        };

        Ok(TelemetryBundle {
            url: url.to_owned(),
            mobile: self.mobile.map(|m| MobileSignals {
                has_viewport_meta: m.has_viewport_meta,
                has_media_queries: m.has_media_queries,
                body_width_px: m.body_width,
                viewport_width_px: m.viewport_width,
            }),
            performance: self.performance.map(|p| PerformanceSignals {
                load_time_ms: p.load_time,
                dom_content_loaded_ms: p.dom_content_loaded,
                first_paint_ms: p.first_paint,
                image_count: p.image_count,
                script_count: p.script_count,
            }),
            security: self.security.map(|s| SecuritySignals {
                is_https: s.is_https,
                has_csp_meta: s.has_csp_meta,
                form_actions: s
                    .form_actions
                    .iter()
                    .map(|a| FormAction::from_attribute(a.as_deref()))
                    .collect(),
            }),
            broken_image_count: self.broken_image_count,
            page: PageStructure {
                title_text: structure.title,
                meta_description: structure.meta_description,
                h1_count: structure.h1_count,
                has_subheadings: structure.has_subheadings,
                images_with_alt_count: structure.images_with_alt,
                images_without_alt_attr_count: structure.images_without_alt_attr,
                total_image_count: structure.total_images,
                internal_link_count: structure.internal_link_count,
                has_schema_markup: structure.has_schema_markup,
            },
            raw_html_lowercase: html.to_lowercase(),
        })
    }
}

impl BrowserlessClient {
    /// Render `url` and capture its [`TelemetryBundle`].
    ///
    /// Transport failures and timeouts are reported as
    /// [`ScraperError::RenderFailure`] so callers can drop just this URL.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::RenderFailure`] for any failure to obtain a
    /// rendered page.
    pub async fn render_telemetry(&self, url: &str) -> Result<TelemetryBundle, ScraperError> {
        let context = ProbeContext {
            url,
            timeout_ms: u64::try_from(self.render_timeout.as_millis()).unwrap_or(u64::MAX),
        };
        let raw: RawProbe = self
            .function(PROBE_SCRIPT, &context)
            .await
            .map_err(|e| match e {
                ScraperError::RenderFailure { .. } => e,
                other => ScraperError::render_failure(url, other.to_string()),
            })?;
        raw.into_bundle(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_probe() -> RawProbe {
        serde_json::from_value(serde_json::json!({
            "mobile": { "hasViewportMeta": true, "hasMediaQueries": false, "bodyWidth": 400, "viewportWidth": 390 },
            "performance": { "loadTime": 1200.5, "domContentLoaded": 300.0, "firstPaint": 850.0, "imageCount": 12, "scriptCount": 4 },
            "security": { "isHttps": true, "hasCspMeta": false, "formActions": [null, "/search", "http://old.example/post"] },
            "brokenImageCount": 1,
            "structure": {
                "title": "Joe's Plumbing", "metaDescription": null, "h1Count": 1, "hasSubheadings": true,
                "imagesWithAlt": 10, "imagesWithoutAltAttr": 1, "totalImages": 12, "internalLinkCount": 20, "hasSchemaMarkup": false
            },
            "html": "<HTML><Body><CENTER>Hi</CENTER></Body></HTML>"
        }))
        .unwrap()
    }

    #[test]
    fn maps_every_signal_group() {
        let bundle = full_probe().into_bundle("https://joes.example").unwrap();
        assert_eq!(bundle.url, "https://joes.example");
        let mobile = bundle.mobile.unwrap();
        assert!(mobile.has_viewport_meta);
        assert_eq!(mobile.body_width_px, 400);
        assert_eq!(bundle.performance.unwrap().image_count, 12);
        let security = bundle.security.unwrap();
        assert_eq!(
            security.form_actions.iter().map(|f| f.secure).collect::<Vec<_>>(),
            vec![true, true, false]
        );
        assert_eq!(bundle.broken_image_count, Some(1));
        assert_eq!(bundle.page.title_text.as_deref(), Some("Joe's Plumbing"));
        assert_eq!(bundle.page.meta_description, None);
        // one of the two images without text has alt=""
        assert_eq!(bundle.page.images_with_alt_count, 10);
        assert_eq!(bundle.page.images_missing_alt(), 1);
        assert_eq!(
            bundle.raw_html_lowercase,
            "<html><body><center>hi</center></body></html>"
        );
    }

    #[test]
    fn null_probe_groups_become_none() {
        let raw: RawProbe = serde_json::from_value(serde_json::json!({
            "mobile": null,
            "performance": null,
            "security": null,
            "brokenImageCount": null,
            "structure": {
                "title": null, "metaDescription": null, "h1Count": 0, "hasSubheadings": false,
                "imagesWithAlt": 0, "totalImages": 0, "internalLinkCount": 0, "hasSchemaMarkup": false
            },
            "html": "<html></html>"
        }))
        .unwrap();
        let bundle = raw.into_bundle("https://a.example").unwrap();
        assert!(bundle.mobile.is_none());
        assert!(bundle.performance.is_none());
        assert!(bundle.security.is_none());
        assert!(bundle.broken_image_count.is_none());
    }

    #[test]
    fn navigation_error_is_render_failure() {
        let raw = RawProbe {
            navigation_error: Some("net::ERR_NAME_NOT_RESOLVED".to_owned()),
            ..RawProbe::default()
        };
        let err = raw.into_bundle("https://gone.example").unwrap_err();
        match err {
            ScraperError::RenderFailure { url, reason } => {
                assert_eq!(url, "https://gone.example");
                assert!(reason.contains("ERR_NAME_NOT_RESOLVED"));
            }
            other => panic!("expected RenderFailure, got {other:?}"),
        }
    }

    #[test]
    fn missing_document_is_render_failure() {
        let err = RawProbe::default().into_bundle("https://a.example").unwrap_err();
        assert!(matches!(err, ScraperError::RenderFailure { .. }));
    }
}
