//! Network collaborators of the prospector: a Browserless client for page
//! telemetry and contact extraction, and an OpenAI web-search client for
//! prospect discovery.

pub mod browserless;
pub mod contacts;
pub mod error;
pub mod probe;
mod rate_limit;
pub mod search;

pub use browserless::BrowserlessClient;
pub use contacts::extract_contacts;
pub use error::ScraperError;
pub use probe::PROBE_SCRIPT;
pub use search::OpenAiSearchClient;

/// Transport settings shared by the HTTP clients.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// Page render timeout; HTTP timeouts are derived from it.
    pub timeout_secs: u64,
    pub user_agent: String,
    /// Additional attempts after the first failure for transient errors.
    pub max_retries: u32,
    pub backoff_base_ms: u64,
}

impl ClientSettings {
    #[must_use]
    pub fn from_app_config(config: &prospector_core::AppConfig) -> Self {
        Self {
            timeout_secs: config.render_timeout_secs,
            user_agent: config.user_agent.clone(),
            max_retries: config.max_retries,
            backoff_base_ms: config.retry_backoff_base_ms,
        }
    }
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: "prospector/0.1 (site-analysis)".to_owned(),
            max_retries: 2,
            backoff_base_ms: 500,
        }
    }
}
