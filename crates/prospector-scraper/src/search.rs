//! Prospect discovery through the OpenAI Responses API with the hosted
//! web-search tool.

use std::collections::HashSet;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::ScraperError;
use crate::rate_limit::retry_with_backoff;
use crate::ClientSettings;

const SERVICE: &str = "OpenAI";
pub const OPENAI_API_URL: &str = "https://api.openai.com/v1";

/// URLs requested from the model for each query.
pub const RESULTS_PER_QUERY: usize = 5;

const SEARCH_INSTRUCTIONS: &str = "You are a prospect discovery assistant.\n\
For each search query provided, use web search to retrieve results.\n\
Return ONLY a newline-separated list of full website URLs (no additional text).";

pub struct OpenAiSearchClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    max_retries: u32,
    backoff_base_ms: u64,
}

#[derive(Debug, Serialize)]
struct ResponsesRequest<'a> {
    model: &'a str,
    instructions: &'a str,
    input: String,
    tools: [Tool; 1],
}

#[derive(Debug, Serialize)]
struct Tool {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ResponsesReply {
    #[serde(default)]
    output: Vec<OutputItem>,
}

#[derive(Debug, Deserialize)]
struct OutputItem {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    content: Vec<ContentPart>,
}

#[derive(Debug, Deserialize)]
struct ContentPart {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

impl OpenAiSearchClient {
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidConfig`] for a blank API key and
    /// [`ScraperError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(api_key: &str, model: &str, settings: &ClientSettings) -> Result<Self, ScraperError> {
        Self::with_base_url(api_key, model, settings, OPENAI_API_URL)
    }

    /// Like [`Self::new`] against a custom API root, for tests and proxies.
    ///
    /// # Errors
    ///
    /// As [`Self::new`].
    pub fn with_base_url(
        api_key: &str,
        model: &str,
        settings: &ClientSettings,
        base_url: &str,
    ) -> Result<Self, ScraperError> {
        if api_key.trim().is_empty() {
            return Err(ScraperError::InvalidConfig(
                "OpenAI API key must be non-empty for live search".to_owned(),
            ));
        }
        // Hosted search runs inside the request, so allow well beyond a render.
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs.saturating_mul(4)))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(&settings.user_agent)
            .build()?;
        Ok(Self {
            client,
            api_key: api_key.trim().to_owned(),
            model: model.to_owned(),
            base_url: base_url.trim_end_matches('/').to_owned(),
            max_retries: settings.max_retries,
            backoff_base_ms: settings.backoff_base_ms,
        })
    }

    /// Up to [`RESULTS_PER_QUERY`] website URLs for one search query.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::Api`] for a non-2xx answer (429 and 5xx retried).
    /// - [`ScraperError::Http`] on network failure after retries.
    /// - [`ScraperError::Deserialize`] if the body is not a Responses payload.
    pub async fn search(&self, query: &str) -> Result<Vec<String>, ScraperError> {
        let request = ResponsesRequest {
            model: &self.model,
            instructions: SEARCH_INSTRUCTIONS,
            input: format!(
                "Search query: {query}\nPlease provide up to {RESULTS_PER_QUERY} distinct business website URLs only."
            ),
            tools: [Tool {
                kind: "web_search_preview",
            }],
        };
        let endpoint = format!("{}/responses", self.base_url);

        let body = retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            let endpoint = endpoint.clone();
            let request = &request;
            async move {
                let response = self
                    .client
                    .post(&endpoint)
                    .bearer_auth(&self.api_key)
                    .json(request)
                    .send()
                    .await?;
                let status = response.status();
                if !status.is_success() {
                    let message = response.text().await.unwrap_or_default();
                    return Err(ScraperError::Api {
                        service: SERVICE,
                        status: status.as_u16(),
                        message,
                    });
                }
                Ok(response.text().await?)
            }
        })
        .await?;

        let reply: ResponsesReply =
            serde_json::from_str(&body).map_err(|source| ScraperError::Deserialize {
                context: format!("web search reply for {query:?}"),
                source,
            })?;

        let mut urls = url_lines(&reply.output_text());
        urls.truncate(RESULTS_PER_QUERY);
        Ok(urls)
    }

    /// Run `queries` in order and collect up to `limit` distinct URLs.
    ///
    /// Failed queries are logged and contribute nothing. No further queries
    /// are issued once `limit` URLs are collected.
    pub async fn discover(&self, queries: &[String], limit: usize) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut urls = Vec::new();
        for query in queries {
            if urls.len() >= limit {
                break;
            }
            match self.search(query).await {
                Ok(found) => {
                    for url in found {
                        if urls.len() >= limit {
                            break;
                        }
                        if seen.insert(url.clone()) {
                            urls.push(url);
                        }
                    }
                }
                Err(e) => {
                    // Swallowed: a backend outage shows up only as missing results.
                    tracing::warn!(query = %query, error = %e, "web search query failed, skipping");
                }
            }
        }
        tracing::info!(queries = queries.len(), found = urls.len(), limit, "discovery finished");
        urls
    }
}

impl ResponsesReply {
    fn output_text(&self) -> String {
        self.output
            .iter()
            .filter(|item| item.kind == "message")
            .flat_map(|item| item.content.iter())
            .filter(|part| part.kind == "output_text")
            .filter_map(|part| part.text.as_deref())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Trimmed lines of `text` that begin with `http`.
#[must_use]
pub fn url_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| line.starts_with("http"))
        .map(str::to_owned)
        .collect()
}
