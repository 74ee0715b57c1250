//! Legal glossary: plain-language definitions for terms a query mentions.

use std::collections::BTreeMap;
use std::path::Path;

use nyaya_core::ConfigError;
use nyaya_core::text::{QueryText, normalize_text, tokenize};
use serde::Deserialize;
use tracing::info;

use crate::read_source;

#[derive(Deserialize)]
struct GlossarySource {
    #[serde(default)]
    common: BTreeMap<String, String>,
    #[serde(default)]
    jurisdictions: BTreeMap<String, BTreeMap<String, String>>,
}

#[derive(Debug)]
struct Term {
    term: String,
    /// Normalised form; a jurisdiction entry replaces a common one with the same key.
    key: String,
    tokens: Vec<String>,
    definition: String,
}

/// Common terms plus per-jurisdiction terms.
#[derive(Debug, Default)]
pub struct Glossary {
    common: Vec<Term>,
    jurisdictions: BTreeMap<String, Vec<Term>>,
}

impl Glossary {
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_json(crate::builtin::GLOSSARY)
    }

    pub fn load_path(path: &Path) -> Result<Self, ConfigError> {
        let json = read_source(path)?;
        Self::from_json(&json)
    }

    /// Parse a glossary document. Fails on a term without content words or
    /// with a blank definition.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let source: GlossarySource =
            serde_json::from_str(json).map_err(|source| ConfigError::Json {
                what: "glossary",
                source,
            })?;

        let common = terms(source.common)?;
        let jurisdictions = source
            .jurisdictions
            .into_iter()
            .map(|(code, table)| Ok((code.to_ascii_uppercase(), terms(table)?)))
            .collect::<Result<BTreeMap<_, _>, ConfigError>>()?;

        info!(
            common = common.len(),
            jurisdictions = jurisdictions.len(),
            "loaded glossary"
        );
        Ok(Self {
            common,
            jurisdictions,
        })
    }

    /// Terms mentioned in `query`, keyed by the term as written in the
    /// dataset. Terms of `jurisdiction` replace common terms of the same name.
    pub fn lookup(
        &self,
        jurisdiction: &str,
        query: &QueryText,
        min_prefix: usize,
    ) -> BTreeMap<String, String> {
        let local = self
            .jurisdictions
            .get(jurisdiction)
            .map(Vec::as_slice)
            .unwrap_or(&[]);

        let mut found: BTreeMap<&str, &Term> = BTreeMap::new();
        for term in self.common.iter().chain(local) {
            if query.find_phrase(&term.tokens, min_prefix).is_some() {
                found.insert(term.key.as_str(), term);
            }
        }
        found
            .into_values()
            .map(|t| (t.term.clone(), t.definition.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.common.len() + self.jurisdictions.values().map(Vec::len).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn terms(table: BTreeMap<String, String>) -> Result<Vec<Term>, ConfigError> {
    table
        .into_iter()
        .map(|(term, definition)| {
            let tokens = tokenize(&term);
            if tokens.is_empty() || definition.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "glossary term {term:?} is empty or has no definition"
                )));
            }
            Ok(Term {
                key: normalize_text(&term),
                tokens,
                definition: definition.trim().to_string(),
                term: term.trim().to_string(),
            })
        })
        .collect()
}
