//! Provision Index: statutory records by (jurisdiction, domain, subdomain).
//!
//! Records are held in one arena; the triple index maps to arena positions.
//! Fallback records sit in the same index as primary ones and are returned
//! alongside them on every lookup.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use nyaya_core::text::{QueryText, tokenize};
use nyaya_core::{ConfigError, GENERAL, ProvisionRecord};
use serde::Deserialize;
use tracing::{info, warn};

use crate::lexicon::LexiconStore;
use crate::read_source;

#[derive(Deserialize)]
struct ProvisionSource {
    provisions: Vec<ProvisionRecord>,
}

type TripleKey = (String, String, String);

/// Shortest title, in content tokens, that [`ProvisionIndex::title_match`] considers.
pub const MIN_TITLE_TOKENS: usize = 2;

/// Immutable provision records for the loaded jurisdictions.
#[derive(Debug)]
pub struct ProvisionIndex {
    records: Vec<ProvisionRecord>,
    by_triple: BTreeMap<TripleKey, Vec<usize>>,
    by_id: HashMap<String, usize>,
}

/// Record counts for diagnostics.
pub struct IndexSummary {
    pub total: usize,
    pub fallback: usize,
    pub jurisdictions: usize,
    pub triples: usize,
}

impl ProvisionIndex {
    /// Load the bundled provisions for the jurisdictions in `lexicon`.
    pub fn builtin(lexicon: &LexiconStore) -> Result<Self, ConfigError> {
        Self::from_json(crate::builtin::PROVISIONS, lexicon)
    }

    pub fn load_path(path: &Path, lexicon: &LexiconStore) -> Result<Self, ConfigError> {
        let json = read_source(path)?;
        Self::from_json(&json, lexicon)
    }

    /// Parse provisions, keeping records of jurisdictions loaded in `lexicon`.
    ///
    /// Records for other jurisdictions in the source are skipped (the source
    /// may cover more jurisdictions than this process serves). Fails on a
    /// duplicate id, a blank title, a `base_confidence` outside [0, 1], or a
    /// loaded jurisdiction without a `general/general` fallback record.
    pub fn from_json(json: &str, lexicon: &LexiconStore) -> Result<Self, ConfigError> {
        let source: ProvisionSource =
            serde_json::from_str(json).map_err(|source| ConfigError::Json {
                what: "provisions",
                source,
            })?;

        let mut records = Vec::with_capacity(source.provisions.len());
        let mut by_triple: BTreeMap<TripleKey, Vec<usize>> = BTreeMap::new();
        let mut by_id = HashMap::new();
        let mut skipped = 0usize;

        for mut record in source.provisions {
            let Some(profile) = lexicon.profile(&record.jurisdiction) else {
                skipped += 1;
                continue;
            };
            record.jurisdiction = profile.code.clone();
            record.domain = record.domain.trim().to_lowercase();
            record.subdomain = record.subdomain.trim().to_lowercase();

            if record.id.trim().is_empty() || record.title.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "provision {:?} has a blank id or title",
                    record.id
                )));
            }
            if !(0.0..=1.0).contains(&record.base_confidence) {
                return Err(ConfigError::Invalid(format!(
                    "provision {} base_confidence {} outside [0, 1]",
                    record.id, record.base_confidence
                )));
            }
            if by_id.contains_key(&record.id) {
                return Err(ConfigError::DuplicateProvision(record.id));
            }
            if record.domain != GENERAL
                && !lexicon.has_subdomain(&record.jurisdiction, &record.domain, &record.subdomain)
            {
                warn!(
                    id = %record.id,
                    domain = %record.domain,
                    subdomain = %record.subdomain,
                    "provision filed under a subdomain the lexicon cannot classify into"
                );
            }

            record.index_terms();
            let idx = records.len();
            by_id.insert(record.id.clone(), idx);
            by_triple
                .entry((
                    record.jurisdiction.clone(),
                    record.domain.clone(),
                    record.subdomain.clone(),
                ))
                .or_default()
                .push(idx);
            records.push(record);
        }

        let index = Self {
            records,
            by_triple,
            by_id,
        };

        for code in lexicon.codes() {
            if index.consultation(code).is_none() {
                return Err(ConfigError::MissingConsultation(code.to_string()));
            }
        }

        let summary = index.summary();
        info!(
            total = summary.total,
            fallback = summary.fallback,
            triples = summary.triples,
            skipped,
            "loaded provisions"
        );
        Ok(index)
    }

    /// Primary and fallback records filed under exactly this triple.
    pub fn query(&self, jurisdiction: &str, domain: &str, subdomain: &str) -> Vec<&ProvisionRecord> {
        let key = (
            jurisdiction.to_string(),
            domain.to_string(),
            subdomain.to_string(),
        );
        self.by_triple
            .get(&key)
            .map(|idxs| idxs.iter().map(|&i| &self.records[i]).collect())
            .unwrap_or_default()
    }

    /// Every record of `domain` in `jurisdiction`, across subdomains.
    pub fn query_domain(&self, jurisdiction: &str, domain: &str) -> Vec<&ProvisionRecord> {
        self.by_triple
            .iter()
            .filter(|((j, d, _), _)| j == jurisdiction && d == domain)
            .flat_map(|(_, idxs)| idxs.iter().map(|&i| &self.records[i]))
            .collect()
    }

    /// The jurisdiction's generic consultation record (first `general/general` fallback).
    pub fn consultation(&self, jurisdiction: &str) -> Option<&ProvisionRecord> {
        self.query(jurisdiction, GENERAL, GENERAL)
            .into_iter()
            .find(|r| r.is_fallback)
    }

    /// The primary record of `jurisdiction` whose whole title occurs in
    /// `query`, preferring the longest title, then file order. Titles of
    /// fewer than [`MIN_TITLE_TOKENS`] content tokens never match. Returns the
    /// record and the number of distinct query tokens the title covers.
    pub fn title_match(
        &self,
        jurisdiction: &str,
        query: &QueryText,
        min_prefix: usize,
    ) -> Option<(&ProvisionRecord, usize)> {
        let mut best: Option<(&ProvisionRecord, usize, usize)> = None;
        for record in &self.records {
            if record.is_fallback || record.jurisdiction != jurisdiction {
                continue;
            }
            let title = tokenize(&record.title);
            if title.len() < MIN_TITLE_TOKENS {
                continue;
            }
            let Some(ids) = query.find_phrase(&title, min_prefix) else {
                continue;
            };
            if best.is_none_or(|(_, len, _)| title.len() > len) {
                let covered = ids.iter().collect::<HashSet<_>>().len();
                best = Some((record, title.len(), covered));
            }
        }
        best.map(|(record, _, covered)| (record, covered))
    }

    pub fn get(&self, id: &str) -> Option<&ProvisionRecord> {
        self.by_id.get(id).map(|&i| &self.records[i])
    }

    pub fn records(&self) -> &[ProvisionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn summary(&self) -> IndexSummary {
        let mut jurisdictions: Vec<&str> =
            self.records.iter().map(|r| r.jurisdiction.as_str()).collect();
        jurisdictions.sort_unstable();
        jurisdictions.dedup();
        IndexSummary {
            total: self.records.len(),
            fallback: self.records.iter().filter(|r| r.is_fallback).count(),
            jurisdictions: jurisdictions.len(),
            triples: self.by_triple.len(),
        }
    }
}
