use std::path::PathBuf;

use thiserror::Error;

/// Caller input rejected before any classification runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("query is empty")]
    EmptyQuery,

    #[error("query too short: {len} characters (minimum {min})")]
    QueryTooShort { len: usize, min: usize },

    #[error("query too long: {len} characters (maximum {max})")]
    QueryTooLong { len: usize, max: usize },
}

impl ValidationError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::EmptyQuery => "empty_query",
            Self::QueryTooShort { .. } => "query_too_short",
            Self::QueryTooLong { .. } => "query_too_long",
        }
    }
}

/// Startup-only failure while loading configuration or datasets.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("data file not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed {what}: {source}")]
    Json {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("config error: {0}")]
    Figment(#[from] Box<figment::Error>),

    #[error("unknown jurisdiction: {0}")]
    UnknownJurisdiction(String),

    #[error("duplicate provision id: {0}")]
    DuplicateProvision(String),

    #[error("jurisdiction {0} has no general consultation provision")]
    MissingConsultation(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
