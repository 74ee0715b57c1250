//! Core types, text normalisation, and shared configuration for Nyaya.

pub mod config;
pub mod error;
pub mod model;
pub mod text;

pub use config::{DataPaths, DefaultsConfig, EngineConfig, ScoringConfig, TopicConflict, ValidationConfig};
pub use error::{ConfigError, ValidationError};
pub use model::{
    ClassificationResult, GENERAL, Keyword, LexiconEntry, ProvisionRecord, QueryResult,
    RankedProvision, ResultStatus, RouteStep, Source,
};
pub use text::QueryText;
