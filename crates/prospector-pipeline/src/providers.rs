//! Collaborator seams of the workflow and their live and offline variants.
//!
//! The live variants wrap the Browserless and OpenAI clients. The `Stub*`
//! variants return deterministic data without touching the network and are
//! picked at construction time by `--offline`.

use async_trait::async_trait;
use prospector_core::{business_name_from_url, ContactInfo};
use prospector_scoring::{
    FormAction, MobileSignals, PageStructure, PerformanceSignals, SecuritySignals,
    TelemetryBundle,
};
use prospector_scraper::{BrowserlessClient, OpenAiSearchClient, ScraperError};

/// Renders a page and captures the signals the scorer needs.
#[async_trait]
pub trait TelemetrySource: Send + Sync {
    /// # Errors
    ///
    /// Returns [`ScraperError::RenderFailure`] when the page cannot be loaded.
    async fn render(&self, url: &str) -> Result<TelemetryBundle, ScraperError>;
}

/// Turns search queries into candidate website URLs.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Best-effort: failed queries contribute nothing. Returns at most
    /// `limit` URLs.
    async fn discover(&self, queries: &[String], limit: usize) -> anyhow::Result<Vec<String>>;
}

/// Pulls contact details from a website.
#[async_trait]
pub trait ContactProvider: Send + Sync {
    async fn extract(&self, url: &str) -> anyhow::Result<ContactInfo>;
}

#[async_trait]
impl TelemetrySource for BrowserlessClient {
    async fn render(&self, url: &str) -> Result<TelemetryBundle, ScraperError> {
        self.render_telemetry(url).await
    }
}

#[async_trait]
impl ContactProvider for BrowserlessClient {
    async fn extract(&self, url: &str) -> anyhow::Result<ContactInfo> {
        Ok(self.fetch_contacts(url).await?)
    }
}

#[async_trait]
impl SearchProvider for OpenAiSearchClient {
    async fn discover(&self, queries: &[String], limit: usize) -> anyhow::Result<Vec<String>> {
        // Per-query failures are logged inside and never abort discovery.
        Ok(OpenAiSearchClient::discover(self, queries, limit).await)
    }
}

/// Fixed prospect list used offline.
pub const STUB_URLS: [&str; 5] = [
    "https://example.com",
    "https://acme.com",
    "https://foobar.com",
    "https://loremipsum.com",
    "https://mocksite.com",
];

pub const STUB_PHONE: &str = "+123456789";

/// Returns the first `limit` of [`STUB_URLS`] regardless of the queries.
#[derive(Debug, Default, Clone, Copy)]
pub struct StubSearch;

#[async_trait]
impl SearchProvider for StubSearch {
    async fn discover(&self, _queries: &[String], limit: usize) -> anyhow::Result<Vec<String>> {
        Ok(STUB_URLS
            .iter()
            .take(limit)
            .map(|url| (*url).to_owned())
            .collect())
    }
}

/// `info@<host>` and [`STUB_PHONE`] for every site.
#[derive(Debug, Default, Clone, Copy)]
pub struct StubContacts;

#[async_trait]
impl ContactProvider for StubContacts {
    async fn extract(&self, url: &str) -> anyhow::Result<ContactInfo> {
        Ok(ContactInfo {
            emails: vec![format!("info@{}", business_name_from_url(url))],
            phones: vec![STUB_PHONE.to_owned()],
            ..ContactInfo::default()
        })
    }
}

/// Synthetic but stable telemetry derived from the URL text, so offline
/// runs exercise every scoring branch without a browser.
#[derive(Debug, Default, Clone, Copy)]
pub struct StubTelemetry;

impl StubTelemetry {
    #[must_use]
    pub fn bundle_for(url: &str) -> TelemetryBundle {
        let seed = url
            .bytes()
            .fold(17u32, |acc, b| acc.wrapping_mul(31).wrapping_add(u32::from(b)));
        let host = business_name_from_url(url);
        let image_count = seed % 60;
        let dated = seed % 3 == 0;

        let html = if dated {
            format!(
                "<html><head><title>{host}</title></head><body><center><font>{host}</font></center>\
                 <p>copyright 2015 {host}</p></body></html>"
            )
        } else {
            format!(
                "<html><head><title>{host}</title><meta name=\"viewport\" content=\"width=device-width\">\
                 </head><body><h1>{host}</h1><p>copyright 2025 {host}</p></body></html>"
            )
        };

        TelemetryBundle {
            url: url.to_owned(),
            mobile: Some(MobileSignals {
                has_viewport_meta: !dated,
                has_media_queries: seed % 2 == 0,
                body_width_px: if dated { 1280 } else { 390 },
                viewport_width_px: 390,
            }),
            performance: Some(PerformanceSignals {
                load_time_ms: f64::from(500 + seed % 4000),
                dom_content_loaded_ms: f64::from(100 + seed % 900),
                first_paint_ms: f64::from(200 + seed % 2500),
                image_count,
                script_count: seed % 25,
            }),
            security: Some(SecuritySignals {
                is_https: url.starts_with("https://"),
                has_csp_meta: seed % 5 == 0,
                form_actions: vec![FormAction::from_attribute(Some("/contact"))],
            }),
            broken_image_count: Some(seed % 3),
            page: PageStructure {
                title_text: Some(host.clone()),
                meta_description: (!dated).then(|| format!("{host} home page")),
                h1_count: u32::from(!dated),
                has_subheadings: seed % 2 == 1,
                images_with_alt_count: image_count / 2,
                images_without_alt_attr_count: image_count - image_count / 2,
                total_image_count: image_count,
                internal_link_count: 3 + seed % 10,
                has_schema_markup: seed % 4 == 0,
            },
            raw_html_lowercase: html.to_lowercase(),
        }
    }
}

#[async_trait]
impl TelemetrySource for StubTelemetry {
    async fn render(&self, url: &str) -> Result<TelemetryBundle, ScraperError> {
        Ok(Self::bundle_for(url))
    }
}
