//! Prospect and contact records passed between pipeline stages.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::CoreError;

pub const MAX_EMAILS: usize = 5;
pub const MAX_PHONES: usize = 3;
pub const MAX_SOCIAL_LINKS: usize = 5;

/// Pipeline label for a prospect. Progression is advisory and not enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProspectStatus {
    Discovered,
    Analyzed,
    Pitched,
    Responded,
    Closed,
}

impl ProspectStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ProspectStatus::Discovered => "discovered",
            ProspectStatus::Analyzed => "analyzed",
            ProspectStatus::Pitched => "pitched",
            ProspectStatus::Responded => "responded",
            ProspectStatus::Closed => "closed",
        }
    }
}

impl std::fmt::Display for ProspectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProspectStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "discovered" => Ok(ProspectStatus::Discovered),
            "analyzed" => Ok(ProspectStatus::Analyzed),
            "pitched" => Ok(ProspectStatus::Pitched),
            "responded" => Ok(ProspectStatus::Responded),
            "closed" => Ok(ProspectStatus::Closed),
            other => Err(CoreError::InvalidProspectStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prospect {
    pub url: String,
    pub business_name: String,
    pub industry: Option<String>,
    pub location: Option<String>,
    pub discovered_at: DateTime<Utc>,
    pub status: ProspectStatus,
}

impl Prospect {
    /// A freshly discovered prospect; the business name is the URL host.
    #[must_use]
    pub fn discovered(url: &str, industry: Option<&str>, location: Option<&str>) -> Self {
        Self {
            url: url.to_string(),
            business_name: business_name_from_url(url),
            industry: industry.map(str::to_owned),
            location: location.map(str::to_owned),
            discovered_at: Utc::now(),
            status: ProspectStatus::Discovered,
        }
    }
}

/// Host portion of a URL: `https://acme.com/about` becomes `acme.com`.
///
/// Works on unparseable input too; it just takes whatever sits between the
/// scheme separator and the first path slash.
#[must_use]
pub fn business_name_from_url(url: &str) -> String {
    let without_scheme = url.split_once("//").map_or(url, |(_, rest)| rest);
    without_scheme
        .split('/')
        .next()
        .unwrap_or(without_scheme)
        .to_string()
}

/// Contact details found on a prospect's website.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    #[serde(default)]
    pub emails: Vec<String>,
    #[serde(default)]
    pub phones: Vec<String>,
    pub contact_page_url: Option<String>,
    #[serde(default)]
    pub social_links: Vec<String>,
}

impl ContactInfo {
    /// De-duplicates each list (first occurrence wins) and applies the
    /// per-kind caps: 5 emails, 3 phones, 5 social links.
    #[must_use]
    pub fn capped(self) -> Self {
        Self {
            emails: dedup_take(self.emails, MAX_EMAILS),
            phones: dedup_take(self.phones, MAX_PHONES),
            contact_page_url: self.contact_page_url,
            social_links: dedup_take(self.social_links, MAX_SOCIAL_LINKS),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.emails.is_empty()
            && self.phones.is_empty()
            && self.contact_page_url.is_none()
            && self.social_links.is_empty()
    }
}

fn dedup_take(values: Vec<String>, cap: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .into_iter()
        .filter(|v| seen.insert(v.clone()))
        .take(cap)
        .collect()
}
