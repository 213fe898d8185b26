//! Shared configuration and domain records for the website prospector.

pub mod app_config;
pub mod audiences;
pub mod config;
pub mod prospects;

use thiserror::Error;

pub use app_config::{AppConfig, Environment, LogFormat};
pub use audiences::{AudienceConfig, AudienceRegistry, AudienceType};
pub use config::{build_app_config, load_app_config, load_app_config_from_env};
pub use prospects::{business_name_from_url, ContactInfo, Prospect, ProspectStatus};

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unknown audience: {0}")]
    UnknownAudience(String),
    #[error("invalid prospect status: {0}")]
    InvalidProspectStatus(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to parse audience registry: {0}")]
    AudienceParse(#[from] serde_yaml::Error),

    #[error("audience registry validation failed: {0}")]
    Validation(String),
}
