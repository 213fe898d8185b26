use crate::app_config::{AppConfig, Environment, LogFormat};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
///
/// # Errors
///
/// Returns `ConfigError` if required vars are missing or values are invalid.
pub fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var).ok().filter(|v| !v.trim().is_empty())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_i32 = |var: &str, default: &str| -> Result<i32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<i32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let database_url = require("DATABASE_URL")?;

    let env = parse_environment(&or_default("PROSPECTOR_ENV", "development"));
    let log_level = or_default("PROSPECTOR_LOG_LEVEL", "info");
    let log_format = parse_log_format(&or_default("PROSPECTOR_LOG_FORMAT", "pretty"))?;

    let db_max_connections = parse_u32("PROSPECTOR_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("PROSPECTOR_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("PROSPECTOR_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let browserless_url = or_default("BROWSERLESS_URL", "http://localhost:3000");
    let browserless_token = optional("BROWSERLESS_TOKEN");
    let openai_api_key = optional("OPENAI_API_KEY");
    let search_model = or_default("PROSPECTOR_SEARCH_MODEL", "gpt-4o-mini");

    let render_timeout_secs = parse_u64("PROSPECTOR_RENDER_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("PROSPECTOR_USER_AGENT", "prospector/0.1 (site-analysis)");
    let max_retries = parse_u32("PROSPECTOR_MAX_RETRIES", "2")?;
    let retry_backoff_base_ms = parse_u64("PROSPECTOR_RETRY_BACKOFF_BASE_MS", "500")?;
    let max_concurrent_urls = parse_usize("PROSPECTOR_MAX_CONCURRENT_URLS", "1")?;

    let queue_name = or_default("PROSPECTOR_QUEUE_NAME", "worker_jobs");
    let queue_visibility_timeout_secs =
        parse_i32("PROSPECTOR_QUEUE_VISIBILITY_TIMEOUT_SECS", "300")?;
    let queue_poll_interval_ms = parse_u64("PROSPECTOR_QUEUE_POLL_INTERVAL_MS", "2000")?;

    let default_audience = or_default("DEFAULT_AUDIENCE", "local_business");
    let default_location = or_default("DEFAULT_LOCATION", "San Francisco");
    let default_max_prospects = parse_usize("MAX_PROSPECTS", "5")?;

    Ok(AppConfig {
        database_url,
        env,
        log_level,
        log_format,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        browserless_url,
        browserless_token,
        openai_api_key,
        search_model,
        render_timeout_secs,
        user_agent,
        max_retries,
        retry_backoff_base_ms,
        max_concurrent_urls,
        queue_name,
        queue_visibility_timeout_secs,
        queue_poll_interval_ms,
        default_audience,
        default_location,
        default_max_prospects,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

fn parse_log_format(s: &str) -> Result<LogFormat, ConfigError> {
    match s.trim().to_ascii_lowercase().as_str() {
        "pretty" | "" => Ok(LogFormat::Pretty),
        "json" => Ok(LogFormat::Json),
        other => Err(ConfigError::InvalidEnvVar {
            var: "PROSPECTOR_LOG_FORMAT".to_string(),
            reason: format!("expected 'pretty' or 'json', got '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
