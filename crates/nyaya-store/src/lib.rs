//! Load-time tables: Lexicon Store, Provision Index, legal route table, and
//! glossary.
//!
//! Everything here is built once at startup and read-only afterwards. Any
//! failure is a [`ConfigError`] and aborts initialisation.

use std::path::Path;

use nyaya_core::ConfigError;

mod glossary;
mod lexicon;
mod provisions;
mod routes;

pub use glossary::Glossary;
pub use lexicon::{JurisdictionProfile, LexiconStore, MARKER_DOMAIN};
pub use provisions::{IndexSummary, MIN_TITLE_TOKENS, ProvisionIndex};
pub use routes::{RouteTable, evidence_requirements, timeline_estimate};

/// Datasets compiled into the binary.
pub mod builtin {
    pub const LEXICON: &str = include_str!("../data/lexicon.json");
    pub const PROVISIONS: &str = include_str!("../data/provisions.json");
    pub const ROUTES: &str = include_str!("../data/routes.json");
    pub const GLOSSARY: &str = include_str!("../data/glossary.json");
}

pub(crate) fn read_source(path: &Path) -> Result<String, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }
    std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}
