//! Engine configuration: scoring weights, validation limits, defaults, data paths.
//!
//! Layered with Figment: built-in defaults, then an optional TOML file, then
//! `NYAYA_`-prefixed environment variables (`__` separates nesting, e.g.
//! `NYAYA_SCORING__MAX_RESULTS=3`). The merged result is validated before use.

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::model::GENERAL;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Jurisdiction codes to load; empty loads every jurisdiction in the lexicon.
    pub jurisdictions: Vec<String>,
    pub scoring: ScoringConfig,
    pub validation: ValidationConfig,
    pub defaults: DefaultsConfig,
    pub data: DataPaths,
}

/// Weights and thresholds used by detection, classification, and ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Weight of a single matching token.
    pub token_weight: f32,
    /// Per-token weight of a full multi-word phrase hit.
    pub phrase_weight: f32,
    /// Multiplier on jurisdiction marker hits ("dubai", "england").
    pub marker_weight: f32,
    /// Shortest token allowed to match by prefix.
    pub min_prefix: usize,
    /// Provisions scoring below this are dropped unless nothing else survives.
    pub min_relevance: f32,
    /// Floor for overlap ratio and domain confidence in relevance scoring.
    pub epsilon: f32,
    pub max_results: usize,
    /// Tie-break order for domains; unlisted domains sort after, by name.
    pub domain_priority: Vec<String>,
    pub conflicts: Vec<TopicConflict>,
}

/// A query topic that makes records about another topic irrelevant.
///
/// When the query mentions any of `query_terms`, a record mentioning any of
/// `record_terms` and none of `query_terms` is discarded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicConflict {
    pub name: String,
    pub query_terms: Vec<String>,
    pub record_terms: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    pub min_chars: usize,
    pub max_chars: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    pub jurisdiction: String,
    pub domain: String,
}

/// External dataset files. `None` selects the bundled dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataPaths {
    pub lexicon: Option<PathBuf>,
    pub provisions: Option<PathBuf>,
    pub routes: Option<PathBuf>,
    pub glossary: Option<PathBuf>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            token_weight: 1.0,
            phrase_weight: 2.0,
            marker_weight: 3.0,
            min_prefix: 4,
            min_relevance: 0.05,
            epsilon: 0.01,
            max_results: 5,
            domain_priority: ["criminal", "civil", "family", "consumer", "property", "employment"]
                .map(String::from)
                .to_vec(),
            conflicts: vec![TopicConflict {
                name: "technology_vs_personal_status".into(),
                query_terms: [
                    "phone", "mobile", "device", "computer", "cyber", "hacking", "hacked",
                    "unauthorized access", "unauthorised access", "digital", "electronic",
                    "online", "internet", "data",
                ]
                .map(String::from)
                .to_vec(),
                record_terms: [
                    "divorce", "marriage", "custody", "spouse", "inheritance", "child support",
                    "personal status", "alimony",
                ]
                .map(String::from)
                .to_vec(),
            }],
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            min_chars: 3,
            max_chars: 1000,
        }
    }
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            jurisdiction: "IN".into(),
            domain: GENERAL.into(),
        }
    }
}

impl ScoringConfig {
    /// Position of `domain` in the priority list; unlisted domains rank last.
    pub fn priority_of(&self, domain: &str) -> usize {
        self.domain_priority
            .iter()
            .position(|d| d.eq_ignore_ascii_case(domain))
            .unwrap_or(self.domain_priority.len())
    }
}

impl EngineConfig {
    /// Merge defaults, the optional TOML file at `path`, and `NYAYA_*` env vars.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(EngineConfig::default()));
        if let Some(path) = path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            figment = figment.merge(Toml::file(path));
        }
        figment = figment.merge(Env::prefixed("NYAYA_").split("__"));
        Self::extract(figment)
    }

    /// Parse a TOML string over the defaults (no environment layer).
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        let figment =
            Figment::from(Serialized::defaults(EngineConfig::default())).merge(Toml::string(toml));
        Self::extract(figment)
    }

    fn extract(figment: Figment) -> Result<Self, ConfigError> {
        let config: EngineConfig = figment.extract().map_err(Box::new)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.scoring;
        for (name, weight) in [
            ("token_weight", s.token_weight),
            ("phrase_weight", s.phrase_weight),
            ("marker_weight", s.marker_weight),
        ] {
            if !weight.is_finite() || weight <= 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be a positive finite number, got {weight}"
                )));
            }
        }
        if s.phrase_weight <= s.token_weight {
            return Err(ConfigError::Invalid(format!(
                "phrase_weight ({}) must exceed token_weight ({})",
                s.phrase_weight, s.token_weight
            )));
        }
        if !(0.0..=1.0).contains(&s.min_relevance) {
            return Err(ConfigError::Invalid("min_relevance must be in [0, 1]".into()));
        }
        if !(s.epsilon > 0.0 && s.epsilon < 1.0) {
            return Err(ConfigError::Invalid("epsilon must be in (0, 1)".into()));
        }
        if s.max_results == 0 {
            return Err(ConfigError::Invalid("max_results must be at least 1".into()));
        }
        if s.min_prefix == 0 {
            return Err(ConfigError::Invalid("min_prefix must be at least 1".into()));
        }
        let v = &self.validation;
        if v.min_chars > v.max_chars {
            return Err(ConfigError::Invalid(format!(
                "min_chars ({}) exceeds max_chars ({})",
                v.min_chars, v.max_chars
            )));
        }
        if self.defaults.jurisdiction.trim().is_empty() || self.defaults.domain.trim().is_empty() {
            return Err(ConfigError::Invalid("defaults must not be blank".into()));
        }
        if !self.jurisdictions.is_empty()
            && !self
                .jurisdictions
                .iter()
                .any(|j| j.trim().eq_ignore_ascii_case(self.defaults.jurisdiction.trim()))
        {
            return Err(ConfigError::Invalid(format!(
                "default jurisdiction {} is not among the loaded jurisdictions",
                self.defaults.jurisdiction
            )));
        }
        Ok(())
    }
}
