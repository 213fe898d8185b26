//! Contact details pulled from rendered page HTML.

use std::sync::LazyLock;

use prospector_core::ContactInfo;
use regex::Regex;

use crate::browserless::BrowserlessClient;
use crate::error::ScraperError;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Z|a-z]{2,}\b").expect("valid regex")
});
static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:\+?1[-.\s]?)?\(?([0-9]{3})\)?[-.\s]?([0-9]{3})[-.\s]?([0-9]{4})\b")
        .expect("valid regex")
});
static ANCHOR_HREF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<a\b[^>]*?\bhref\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>]+))"#)
        .expect("valid regex")
});

/// Social networks recognised in link targets, in reporting order.
pub const SOCIAL_DOMAINS: [&str; 4] = [
    "facebook.com",
    "twitter.com",
    "linkedin.com",
    "instagram.com",
];

/// Extract emails, phones, the contact page and social links from `html`.
///
/// `page_url` resolves a relative contact link. The result is de-duplicated
/// and capped.
#[must_use]
pub fn extract_contacts(html: &str, page_url: &str) -> ContactInfo {
    let emails = EMAIL_RE
        .find_iter(html)
        .map(|m| m.as_str().to_owned())
        .collect();

    let phones = PHONE_RE
        .captures_iter(html)
        .map(|c| format!("({}) {}-{}", &c[1], &c[2], &c[3]))
        .collect();

    let hrefs = anchor_hrefs(html);

    let contact_page_url = hrefs
        .iter()
        .find(|href| href.contains("contact"))
        .map(|href| resolve(page_url, href));

    let social_links = SOCIAL_DOMAINS
        .iter()
        .flat_map(|domain| hrefs.iter().filter(move |href| href.contains(domain)))
        .map(|href| (*href).to_owned())
        .collect();

    ContactInfo {
        emails,
        phones,
        contact_page_url,
        social_links,
    }
    .capped()
}

fn anchor_hrefs(html: &str) -> Vec<&str> {
    ANCHOR_HREF_RE
        .captures_iter(html)
        .filter_map(|c| c.get(1).or_else(|| c.get(2)).or_else(|| c.get(3)))
        .map(|m| m.as_str().trim())
        .filter(|href| !href.is_empty())
        .collect()
}

fn resolve(base: &str, href: &str) -> String {
    reqwest::Url::parse(base)
        .and_then(|b| b.join(href))
        .map_or_else(|_| href.to_owned(), |u| u.to_string())
}

impl BrowserlessClient {
    /// Render `url` and extract its contact details.
    ///
    /// # Errors
    ///
    /// Propagates any error from [`BrowserlessClient::content`].
    pub async fn fetch_contacts(&self, url: &str) -> Result<ContactInfo, ScraperError> {
        let html = self.content(url).await?;
        Ok(extract_contacts(&html, url))
    }
}
