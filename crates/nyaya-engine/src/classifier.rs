//! Domain Classifier: (domain, subdomain) within a chosen jurisdiction.

use std::cmp::Ordering;

use nyaya_core::text::{QueryText, normalize_text};
use nyaya_core::{GENERAL, LexiconEntry, ScoringConfig, Source};
use nyaya_store::LexiconStore;
use tracing::debug;

use crate::scoring::{EntryScore, score_entry};

/// Chosen domain and subdomain with their provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct DomainClassification {
    pub domain: String,
    pub subdomain: String,
    pub source: Source,
    pub confidence: f32,
}

/// A scored lexicon entry.
#[derive(Debug, Clone)]
pub struct ScoredEntry<'e> {
    pub entry: &'e LexiconEntry,
    pub score: EntryScore,
}

pub struct DomainClassifier<'a> {
    lexicon: &'a LexiconStore,
    scoring: &'a ScoringConfig,
    default_domain: &'a str,
}

impl<'a> DomainClassifier<'a> {
    pub fn new(
        lexicon: &'a LexiconStore,
        scoring: &'a ScoringConfig,
        default_domain: &'a str,
    ) -> Self {
        Self {
            lexicon,
            scoring,
            default_domain,
        }
    }

    /// Classify `query` within `jurisdiction`.
    ///
    /// A `hint` naming a domain of the jurisdiction fixes the domain at
    /// confidence 1.0 and only the subdomain is scored.
    pub fn classify(
        &self,
        jurisdiction: &str,
        query: &QueryText,
        hint: Option<&str>,
    ) -> DomainClassification {
        let ranked = self.rank(jurisdiction, query);

        if let Some(domain) = hint.and_then(|h| self.resolve_hint(jurisdiction, h)) {
            let subdomain = ranked
                .iter()
                .find(|s| s.entry.domain == domain)
                .map(|s| s.entry.subdomain.clone())
                .unwrap_or_else(|| GENERAL.to_string());
            return DomainClassification {
                domain,
                subdomain,
                source: Source::Hint,
                confidence: 1.0,
            };
        }
        if let Some(hint) = hint.filter(|h| !h.trim().is_empty()) {
            debug!(hint, jurisdiction, "unrecognised domain hint ignored");
        }

        let Some(top) = ranked.first() else {
            return DomainClassification {
                domain: self.default_domain.to_string(),
                subdomain: GENERAL.to_string(),
                source: Source::Default,
                confidence: 0.0,
            };
        };

        let winner = match contamination_override(&ranked) {
            Some(challenger) => {
                debug!(
                    from = %format!("{}/{}", top.entry.domain, top.entry.subdomain),
                    to = %format!("{}/{}", challenger.entry.domain, challenger.entry.subdomain),
                    "phrase match overrides shared-token winner"
                );
                challenger
            }
            None => top,
        };

        DomainClassification {
            domain: winner.entry.domain.clone(),
            subdomain: winner.entry.subdomain.clone(),
            source: Source::Detected,
            confidence: winner.score.confidence(query),
        }
    }

    /// Non-zero entries of `jurisdiction`, best first.
    ///
    /// Order: raw score, then whole-keyword hits, then domain priority, then
    /// domain and subdomain name.
    pub fn rank(&self, jurisdiction: &str, query: &QueryText) -> Vec<ScoredEntry<'a>> {
        let mut ranked: Vec<ScoredEntry<'a>> = self
            .lexicon
            .lookup(jurisdiction)
            .iter()
            .map(|entry| ScoredEntry {
                entry,
                score: score_entry(entry, query, self.scoring),
            })
            .filter(|s| !s.score.is_zero())
            .collect();
        ranked.sort_by(|a, b| self.compare(a, b));
        ranked
    }

    fn compare(&self, a: &ScoredEntry<'_>, b: &ScoredEntry<'_>) -> Ordering {
        b.score
            .raw
            .total_cmp(&a.score.raw)
            .then_with(|| b.score.exact_hits.cmp(&a.score.exact_hits))
            .then_with(|| {
                self.scoring
                    .priority_of(&a.entry.domain)
                    .cmp(&self.scoring.priority_of(&b.entry.domain))
            })
            .then_with(|| a.entry.domain.cmp(&b.entry.domain))
            .then_with(|| a.entry.subdomain.cmp(&b.entry.subdomain))
    }

    fn resolve_hint(&self, jurisdiction: &str, hint: &str) -> Option<String> {
        let key = normalize_text(hint).replace(' ', "_");
        if key.is_empty() {
            return None;
        }
        if key == GENERAL {
            return Some(key);
        }
        self.lexicon
            .domains(jurisdiction)
            .into_iter()
            .find(|d| *d == key)
            .map(str::to_string)
    }
}

/// An entry whose full-phrase coverage strictly contains everything the top
/// entry matched. Among several, the widest phrase coverage wins, then the
/// higher raw score, then rank order.
fn contamination_override<'r, 'e>(ranked: &'r [ScoredEntry<'e>]) -> Option<&'r ScoredEntry<'e>> {
    let top = ranked.first()?;
    ranked
        .iter()
        .skip(1)
        .filter(|c| {
            top.score.matched.is_subset(&c.score.phrase_covered)
                && top.score.phrase_covered.len() < c.score.phrase_covered.len()
        })
        .fold(None, |best: Option<&ScoredEntry<'e>>, c| match best {
            Some(b)
                if b.score.phrase_covered.len() > c.score.phrase_covered.len()
                    || (b.score.phrase_covered.len() == c.score.phrase_covered.len()
                        && b.score.raw >= c.score.raw) =>
            {
                Some(b)
            }
            _ => Some(c),
        })
}
