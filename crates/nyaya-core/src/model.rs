//! Load-time records and per-request results shared by the store and engine.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ConfigError;
use crate::text::{normalize_text, tokenize};

/// Domain and subdomain name used for the default classification and for
/// each jurisdiction's consultation provision.
pub const GENERAL: &str = "general";

// ── Lexicon ──

/// A normalised keyword or multi-word phrase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Keyword {
    pub phrase: String,
    /// Content tokens (stop words removed). More than one makes it a phrase.
    pub tokens: Vec<String>,
}

impl Keyword {
    /// Returns `None` when `raw` has no content tokens.
    pub fn new(raw: &str) -> Option<Self> {
        let tokens = tokenize(raw);
        if tokens.is_empty() {
            return None;
        }
        Some(Self {
            phrase: normalize_text(raw),
            tokens,
        })
    }

    pub fn is_phrase(&self) -> bool {
        self.tokens.len() > 1
    }
}

/// Keyword set for one (jurisdiction, domain, subdomain) triple.
#[derive(Debug, Clone, Serialize)]
pub struct LexiconEntry {
    pub jurisdiction: String,
    pub domain: String,
    pub subdomain: String,
    /// Unique by normalised phrase, sorted.
    pub keywords: Vec<Keyword>,
    /// Per-token weight of a full multi-word phrase hit.
    pub phrase_weight: f32,
}

impl LexiconEntry {
    /// Normalise and deduplicate `raw_keywords` into an entry.
    ///
    /// Duplicates (after normalisation) are collapsed with a warning; a
    /// keyword with no content tokens is rejected.
    pub fn new<'a>(
        jurisdiction: &str,
        domain: &str,
        subdomain: &str,
        raw_keywords: impl IntoIterator<Item = &'a str>,
        phrase_weight: f32,
    ) -> Result<Self, ConfigError> {
        let mut seen = BTreeSet::new();
        let mut keywords = Vec::new();
        for raw in raw_keywords {
            let keyword = Keyword::new(raw).ok_or_else(|| {
                ConfigError::Invalid(format!(
                    "empty keyword {raw:?} in {jurisdiction}/{domain}/{subdomain}"
                ))
            })?;
            if !seen.insert(keyword.phrase.clone()) {
                warn!(
                    jurisdiction,
                    domain,
                    subdomain,
                    keyword = %keyword.phrase,
                    "duplicate keyword collapsed"
                );
                continue;
            }
            keywords.push(keyword);
        }
        keywords.sort_by(|a, b| a.phrase.cmp(&b.phrase));

        Ok(Self {
            jurisdiction: jurisdiction.to_string(),
            domain: domain.to_string(),
            subdomain: subdomain.to_string(),
            keywords,
            phrase_weight,
        })
    }
}

// ── Provisions ──

/// A statutory provision, article, or curated guidance record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvisionRecord {
    pub id: String,
    pub jurisdiction: String,
    pub domain: String,
    pub subdomain: String,
    pub title: String,
    #[serde(default)]
    pub definition: String,
    #[serde(default)]
    pub elements: Vec<String>,
    #[serde(default)]
    pub penalties: BTreeMap<String, String>,
    #[serde(default)]
    pub process: Vec<String>,
    #[serde(default)]
    pub citations: Vec<String>,
    #[serde(default)]
    pub is_fallback: bool,
    pub base_confidence: f32,
    /// Distinct tokens of title, definition, and citations, sorted.
    #[serde(skip)]
    pub terms: Vec<String>,
}

impl ProvisionRecord {
    /// Populate [`terms`](Self::terms) from title, definition, and citations.
    pub fn index_terms(&mut self) {
        let mut terms = BTreeSet::new();
        terms.extend(tokenize(&self.title));
        terms.extend(tokenize(&self.definition));
        for citation in &self.citations {
            terms.extend(tokenize(citation));
        }
        self.terms = terms.into_iter().collect();
    }

    /// Carries substantive content beyond a title (elements or penalties).
    pub fn is_key_provision(&self) -> bool {
        !self.elements.is_empty() || !self.penalties.is_empty()
    }

    /// Searchable text used by topic-conflict checks.
    pub fn search_text(&self) -> String {
        let mut text = format!("{} {}", self.title, self.definition);
        for element in &self.elements {
            text.push(' ');
            text.push_str(element);
        }
        text
    }
}

/// Procedural step in the legal route for a domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteStep {
    pub step: String,
    pub description: String,
    #[serde(default)]
    pub timeline: Option<String>,
    /// Documents or proof the step typically calls for.
    #[serde(default)]
    pub evidence_required: Vec<String>,
}

// ── Per-request results ──

/// Where a classification value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// Caller-supplied hint, taken with confidence 1.0.
    Hint,
    /// Scored from the query text.
    Detected,
    /// Nothing matched; configured default applied.
    Default,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hint => "hint",
            Self::Detected => "detected",
            Self::Default => "default",
        }
    }
}

/// Output of jurisdiction detection plus domain classification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationResult {
    pub jurisdiction: String,
    pub jurisdiction_source: Source,
    /// Jurisdiction confidence in [0, 1].
    pub confidence: f32,
    pub domain: String,
    pub subdomain: String,
    pub domain_source: Source,
    /// Domain confidence in [0, 1].
    pub domain_confidence: f32,
}

impl ClassificationResult {
    /// Mean of jurisdiction and domain confidence.
    pub fn combined_confidence(&self) -> f32 {
        ((self.confidence + self.domain_confidence) / 2.0).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedProvision {
    pub provision: ProvisionRecord,
    pub relevance_score: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultStatus {
    /// At least one primary provision was retrieved.
    Retrieved,
    /// Only fallback or consultation provisions survived ranking.
    FallbackOnly,
}

impl ResultStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Retrieved => "retrieved",
            Self::FallbackOnly => "fallback_only",
        }
    }
}

/// The structured answer returned for every valid query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    pub jurisdiction: String,
    pub jurisdiction_name: String,
    pub jurisdiction_confidence: f32,
    pub domain: String,
    pub subdomain: String,
    pub domain_confidence: f32,
    /// Classification confidence × best provision relevance, in [0, 1].
    pub confidence: f32,
    pub status: ResultStatus,
    /// Never empty.
    pub provisions: Vec<RankedProvision>,
    /// Deduplicated, in provision order.
    pub citations: Vec<String>,
    pub summary: String,
    pub legal_route: Vec<RouteStep>,
    /// Evidence named by the route steps, deduplicated in route order.
    pub evidence_requirements: Vec<String>,
    pub timeline_estimate: String,
    /// Glossary terms the query mentions, with definitions.
    pub glossary_terms: BTreeMap<String, String>,
    pub key_provisions_count: usize,
    pub disclaimer: String,
}
