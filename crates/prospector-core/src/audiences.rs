//! Compiled-in registry of audience targeting profiles.
//!
//! The table lives in `config/audiences.yaml` and is embedded at build time.
//! It is parsed and validated once at startup and never mutated.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::{ConfigError, CoreError};

const BUILTIN_AUDIENCES: &str = include_str!("../../../config/audiences.yaml");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudienceType {
    LocalBusiness,
    Ecommerce,
    Saas,
}

impl std::fmt::Display for AudienceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AudienceType::LocalBusiness => write!(f, "local_business"),
            AudienceType::Ecommerce => write!(f, "ecommerce"),
            AudienceType::Saas => write!(f, "saas"),
        }
    }
}

/// One named targeting profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudienceConfig {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub audience_type: AudienceType,
    /// Query templates with `{keyword}` and optional `{location}` placeholders.
    pub search_patterns: Vec<String>,
    pub keywords: Vec<String>,
    /// Audience-facing weight names. These are not the scorer's metric keys.
    pub scoring_weights: BTreeMap<String, f64>,
    #[serde(default)]
    pub improvement_focuses: Vec<String>,
    pub budget_range: (u32, u32),
    pub pitch_tone: String,
    #[serde(default = "default_max_prospects_per_run")]
    pub max_prospects_per_run: usize,
}

fn default_max_prospects_per_run() -> usize {
    50
}

impl AudienceConfig {
    /// Expand every search pattern against every keyword for `location`.
    ///
    /// Ordering is pattern-major: all keywords for the first pattern, then
    /// all keywords for the second, and so on.
    #[must_use]
    pub fn search_queries(&self, location: &str) -> Vec<String> {
        self.search_patterns
            .iter()
            .flat_map(|pattern| {
                self.keywords.iter().map(move |keyword| {
                    pattern
                        .replace("{keyword}", keyword)
                        .replace("{location}", location)
                })
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct AudiencesFile {
    audiences: Vec<AudienceConfig>,
}

/// Read-only lookup table of audiences, in file order.
#[derive(Debug, Clone)]
pub struct AudienceRegistry {
    audiences: Vec<AudienceConfig>,
}

impl AudienceRegistry {
    /// Parse and validate the registry compiled into the binary.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the embedded table fails to parse or validate.
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_yaml(BUILTIN_AUDIENCES)
    }

    /// Parse and validate a registry from YAML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::AudienceParse`] on malformed YAML and
    /// [`ConfigError::Validation`] when a profile is inconsistent.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let file: AudiencesFile = serde_yaml::from_str(content)?;
        validate_audiences(&file.audiences)?;
        Ok(Self {
            audiences: file.audiences,
        })
    }

    /// Look up an audience by exact name.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownAudience`] if no profile has that name.
    pub fn get(&self, name: &str) -> Result<&AudienceConfig, CoreError> {
        self.audiences
            .iter()
            .find(|a| a.name == name)
            .ok_or_else(|| CoreError::UnknownAudience(name.to_string()))
    }

    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.audiences.iter().map(|a| a.name.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AudienceConfig> {
        self.audiences.iter()
    }
}

fn validate_audiences(audiences: &[AudienceConfig]) -> Result<(), ConfigError> {
    if audiences.is_empty() {
        return Err(ConfigError::Validation(
            "audience registry must define at least one audience".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for audience in audiences {
        let name = audience.name.trim();
        if name.is_empty() {
            return Err(ConfigError::Validation(
                "audience name must be non-empty".to_string(),
            ));
        }
        if !seen.insert(name.to_string()) {
            return Err(ConfigError::Validation(format!(
                "duplicate audience name: '{name}'"
            )));
        }
        if audience.search_patterns.is_empty() || audience.keywords.is_empty() {
            return Err(ConfigError::Validation(format!(
                "audience '{name}' needs at least one search pattern and one keyword"
            )));
        }
        if let Some(pattern) = audience
            .search_patterns
            .iter()
            .find(|p| !p.contains("{keyword}"))
        {
            return Err(ConfigError::Validation(format!(
                "audience '{name}' has pattern without {{keyword}}: '{pattern}'"
            )));
        }
        if let Some((metric, weight)) = audience
            .scoring_weights
            .iter()
            .find(|(_, w)| !w.is_finite() || **w < 0.0)
        {
            return Err(ConfigError::Validation(format!(
                "audience '{name}' has invalid weight {weight} for '{metric}'"
            )));
        }
        if audience.max_prospects_per_run == 0 {
            return Err(ConfigError::Validation(format!(
                "audience '{name}' must allow at least one prospect per run"
            )));
        }
        let (min, max) = audience.budget_range;
        if min > max {
            return Err(ConfigError::Validation(format!(
                "audience '{name}' has inverted budget range ({min}, {max})"
            )));
        }
    }

    Ok(())
}
