//! Lexicon Store: per-jurisdiction keyword tables, loaded once.
//!
//! Source document:
//!
//! ```json
//! { "jurisdictions": [
//!     { "code": "UK", "name": "United Kingdom", "aliases": ["BRITAIN"],
//!       "markers": ["england", "london"],
//!       "domains": { "criminal": { "theft": ["theft", "stolen"] } } } ] }
//! ```
//!
//! Every entry lives in a single arena; a jurisdiction owns a contiguous range
//! of it, so `lookup` is a slice borrow.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::Range;
use std::path::Path;

use nyaya_core::text::normalize_text;
use nyaya_core::{ConfigError, LexiconEntry, ScoringConfig};
use serde::Deserialize;
use tracing::info;

use crate::read_source;

/// Domain name under which jurisdiction markers are stored.
pub const MARKER_DOMAIN: &str = "jurisdiction";

#[derive(Deserialize)]
struct LexiconSource {
    jurisdictions: Vec<JurisdictionSource>,
}

#[derive(Deserialize)]
struct JurisdictionSource {
    code: String,
    name: String,
    #[serde(default)]
    aliases: Vec<String>,
    #[serde(default)]
    markers: Vec<String>,
    domains: BTreeMap<String, BTreeMap<String, Vec<String>>>,
}

/// Display name, hint aliases, and indicator keywords for a jurisdiction.
#[derive(Debug, Clone)]
pub struct JurisdictionProfile {
    pub code: String,
    pub name: String,
    /// Uppercased, whitespace-collapsed; includes the code itself.
    pub aliases: Vec<String>,
    /// Place names and other indicators; domain is [`MARKER_DOMAIN`].
    pub markers: LexiconEntry,
    entries: Range<usize>,
}

/// Immutable keyword tables for the loaded jurisdictions.
#[derive(Debug)]
pub struct LexiconStore {
    entries: Vec<LexiconEntry>,
    profiles: Vec<JurisdictionProfile>,
}

impl LexiconStore {
    /// Load the bundled lexicon for `jurisdictions`.
    pub fn builtin(
        jurisdictions: &BTreeSet<String>,
        scoring: &ScoringConfig,
    ) -> Result<Self, ConfigError> {
        Self::from_json(crate::builtin::LEXICON, jurisdictions, scoring)
    }

    /// Load a lexicon file for `jurisdictions`.
    pub fn load_path(
        path: &Path,
        jurisdictions: &BTreeSet<String>,
        scoring: &ScoringConfig,
    ) -> Result<Self, ConfigError> {
        let json = read_source(path)?;
        Self::from_json(&json, jurisdictions, scoring)
    }

    /// Parse a lexicon document, keeping only `jurisdictions` (all when empty).
    ///
    /// Fails if a requested jurisdiction is absent, a kept jurisdiction has no
    /// domains, or any keyword is empty after normalisation.
    pub fn from_json(
        json: &str,
        jurisdictions: &BTreeSet<String>,
        scoring: &ScoringConfig,
    ) -> Result<Self, ConfigError> {
        if scoring.phrase_weight <= scoring.token_weight {
            return Err(ConfigError::Invalid(
                "phrase_weight must exceed token_weight".into(),
            ));
        }
        let source: LexiconSource = serde_json::from_str(json).map_err(|source| {
            ConfigError::Json {
                what: "lexicon",
                source,
            }
        })?;

        let wanted: BTreeSet<String> = jurisdictions
            .iter()
            .map(|c| c.trim().to_ascii_uppercase())
            .collect();
        let available: BTreeSet<String> = source
            .jurisdictions
            .iter()
            .map(|j| j.code.to_ascii_uppercase())
            .collect();
        if let Some(missing) = wanted.difference(&available).next() {
            return Err(ConfigError::UnknownJurisdiction(missing.clone()));
        }

        let mut entries = Vec::new();
        let mut profiles: Vec<JurisdictionProfile> = Vec::new();

        for j in source.jurisdictions {
            let code = j.code.to_ascii_uppercase();
            if !wanted.is_empty() && !wanted.contains(&code) {
                continue;
            }
            if profiles.iter().any(|p| p.code == code) {
                return Err(ConfigError::Invalid(format!("duplicate jurisdiction {code}")));
            }
            if j.domains.is_empty() {
                return Err(ConfigError::Invalid(format!("jurisdiction {code} has no domains")));
            }

            let start = entries.len();
            for (domain, subdomains) in &j.domains {
                let domain = normalize_key(domain);
                for (subdomain, keywords) in subdomains {
                    let entry = LexiconEntry::new(
                        &code,
                        &domain,
                        &normalize_key(subdomain),
                        keywords.iter().map(String::as_str),
                        scoring.phrase_weight,
                    )?;
                    entries.push(entry);
                }
            }

            let markers = LexiconEntry::new(
                &code,
                MARKER_DOMAIN,
                MARKER_DOMAIN,
                j.markers.iter().map(String::as_str),
                scoring.phrase_weight,
            )?;

            let mut aliases: Vec<String> = std::iter::once(code.clone())
                .chain(j.aliases.iter().map(|a| normalize_alias(a)))
                .collect();
            aliases.sort();
            aliases.dedup();

            profiles.push(JurisdictionProfile {
                code,
                name: j.name,
                aliases,
                markers,
                entries: start..entries.len(),
            });
        }

        if profiles.is_empty() {
            return Err(ConfigError::Invalid("lexicon has no jurisdictions".into()));
        }

        info!(
            jurisdictions = profiles.len(),
            entries = entries.len(),
            "loaded lexicon"
        );
        Ok(Self { entries, profiles })
    }

    /// Domain lexicon entries for `code`; empty for an unknown code.
    pub fn lookup(&self, code: &str) -> &[LexiconEntry] {
        self.profile(code)
            .map(|p| &self.entries[p.entries.clone()])
            .unwrap_or(&[])
    }

    pub fn profile(&self, code: &str) -> Option<&JurisdictionProfile> {
        self.profiles
            .iter()
            .find(|p| p.code.eq_ignore_ascii_case(code.trim()))
    }

    /// Profiles in source order.
    pub fn profiles(&self) -> &[JurisdictionProfile] {
        &self.profiles
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.profiles.iter().map(|p| p.code.as_str())
    }

    pub fn contains(&self, code: &str) -> bool {
        self.profile(code).is_some()
    }

    /// Resolve a caller hint ("india", "Dubai", "UK") to a jurisdiction code.
    pub fn resolve_alias(&self, hint: &str) -> Option<&str> {
        let wanted = normalize_alias(hint);
        if wanted.is_empty() {
            return None;
        }
        self.profiles
            .iter()
            .find(|p| p.aliases.iter().any(|a| *a == wanted))
            .map(|p| p.code.as_str())
    }

    /// Distinct domain names for `code`, sorted.
    pub fn domains(&self, code: &str) -> Vec<&str> {
        let set: BTreeSet<&str> = self.lookup(code).iter().map(|e| e.domain.as_str()).collect();
        set.into_iter().collect()
    }

    /// Whether `code` has lexicon entries for `domain`/`subdomain`.
    pub fn has_subdomain(&self, code: &str, domain: &str, subdomain: &str) -> bool {
        self.lookup(code)
            .iter()
            .any(|e| e.domain == domain && e.subdomain == subdomain)
    }

    /// Total number of domain entries across jurisdictions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Domain/subdomain keys: lowercase, spaces to underscores.
fn normalize_key(s: &str) -> String {
    normalize_text(s).replace(' ', "_")
}

fn normalize_alias(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_uppercase()
}
