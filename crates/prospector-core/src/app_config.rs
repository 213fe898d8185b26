#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Output format for the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub log_level: String,
    pub log_format: LogFormat,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub browserless_url: String,
    pub browserless_token: Option<String>,
    pub openai_api_key: Option<String>,
    pub search_model: String,
    pub render_timeout_secs: u64,
    pub user_agent: String,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
    pub max_concurrent_urls: usize,
    pub queue_name: String,
    pub queue_visibility_timeout_secs: i32,
    pub queue_poll_interval_ms: u64,
    pub default_audience: String,
    pub default_location: String,
    pub default_max_prospects: usize,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("log_format", &self.log_format)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("browserless_url", &self.browserless_url)
            .field(
                "browserless_token",
                &self.browserless_token.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "openai_api_key",
                &self.openai_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("search_model", &self.search_model)
            .field("render_timeout_secs", &self.render_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_base_ms", &self.retry_backoff_base_ms)
            .field("max_concurrent_urls", &self.max_concurrent_urls)
            .field("queue_name", &self.queue_name)
            .field(
                "queue_visibility_timeout_secs",
                &self.queue_visibility_timeout_secs,
            )
            .field("queue_poll_interval_ms", &self.queue_poll_interval_ms)
            .field("default_audience", &self.default_audience)
            .field("default_location", &self.default_location)
            .field("default_max_prospects", &self.default_max_prospects)
            .finish()
    }
}
