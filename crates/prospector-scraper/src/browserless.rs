//! HTTP client for a Browserless instance.
//!
//! Two endpoints are used: `/content` returns the rendered HTML of a page and
//! `/function` runs a script against a live page and returns its JSON result.

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ScraperError;
use crate::rate_limit::retry_with_backoff;
use crate::ClientSettings;

const SERVICE: &str = "Browserless";

/// Extra time given to the HTTP call on top of the in-browser navigation timeout.
const TRANSPORT_GRACE_SECS: u64 = 10;

pub struct BrowserlessClient {
    client: Client,
    base_url: String,
    token: Option<String>,
    pub(crate) render_timeout: Duration,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl BrowserlessClient {
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidConfig`] for a blank base URL and
    /// [`ScraperError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(
        base_url: &str,
        token: Option<&str>,
        settings: &ClientSettings,
    ) -> Result<Self, ScraperError> {
        let base_url = base_url.trim().trim_end_matches('/');
        if base_url.is_empty() {
            return Err(ScraperError::InvalidConfig(
                "Browserless base URL must be non-empty".to_owned(),
            ));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(
                settings.timeout_secs.saturating_add(TRANSPORT_GRACE_SECS),
            ))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(&settings.user_agent)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.to_owned(),
            token: token.map(str::to_owned).filter(|t| !t.is_empty()),
            render_timeout: Duration::from_secs(settings.timeout_secs),
            max_retries: settings.max_retries,
            backoff_base_ms: settings.backoff_base_ms,
        })
    }

    /// Fully-rendered HTML for `url`.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::Api`] for a non-2xx answer (5xx retried).
    /// - [`ScraperError::Http`] on network failure after retries.
    pub async fn content(&self, url: &str) -> Result<String, ScraperError> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct ContentRequest<'a> {
            url: &'a str,
            goto_options: GotoOptions,
        }

        let body = ContentRequest {
            url,
            goto_options: GotoOptions::network_idle(self.render_timeout),
        };
        let response = self.post("content", &body).await?;
        Ok(response.text().await?)
    }

    /// Runs `code` in the browser with `context` and decodes its JSON result.
    ///
    /// # Errors
    ///
    /// As [`Self::content`], plus [`ScraperError::Deserialize`] if the result
    /// does not match `T`.
    pub async fn function<C, T>(&self, code: &str, context: &C) -> Result<T, ScraperError>
    where
        C: Serialize + Sync,
        T: DeserializeOwned,
    {
        #[derive(Serialize)]
        struct FunctionRequest<'a, C> {
            code: &'a str,
            context: &'a C,
        }

        let response = self.post("function", &FunctionRequest { code, context }).await?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|source| ScraperError::Deserialize {
            context: "Browserless function result".to_owned(),
            source,
        })
    }

    async fn post<B>(&self, path: &str, body: &B) -> Result<reqwest::Response, ScraperError>
    where
        B: Serialize + Sync,
    {
        let endpoint = format!("{}/{path}", self.base_url);
        retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            let endpoint = endpoint.clone();
            async move {
                let mut request = self.client.post(&endpoint).json(body);
                if let Some(token) = &self.token {
                    request = request.query(&[("token", token)]);
                }
                let response = request.send().await?;
                let status = response.status();
                if !status.is_success() {
                    let message = response.text().await.unwrap_or_default();
                    return Err(ScraperError::Api {
                        service: SERVICE,
                        status: status.as_u16(),
                        message,
                    });
                }
                Ok(response)
            }
        })
        .await
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GotoOptions {
    wait_until: &'static str,
    timeout: u64,
}

impl GotoOptions {
    fn network_idle(timeout: Duration) -> Self {
        Self {
            wait_until: "networkidle2",
            timeout: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        }
    }
}
