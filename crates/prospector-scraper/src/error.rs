use thiserror::Error;

/// Errors returned by the Browserless and web-search clients.
#[derive(Debug, Error)]
pub enum ScraperError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A collaborator answered with a non-2xx status.
    #[error("{service} API error (status {status}): {message}")]
    Api {
        service: &'static str,
        status: u16,
        message: String,
    },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// The page could not be loaded or the probe produced no document.
    #[error("failed to render {url}: {reason}")]
    RenderFailure { url: String, reason: String },

    #[error("invalid client configuration: {0}")]
    InvalidConfig(String),
}

impl ScraperError {
    pub(crate) fn render_failure(url: &str, reason: impl Into<String>) -> Self {
        Self::RenderFailure {
            url: url.to_owned(),
            reason: reason.into(),
        }
    }
}
