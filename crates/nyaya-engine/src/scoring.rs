//! Keyword scoring shared by jurisdiction detection and domain classification.
//!
//! For each keyword of an entry:
//!
//! - a single-token keyword that matches any query token adds `token_weight`;
//! - a multi-word phrase found as consecutive query tokens adds
//!   `phrase_weight` per phrase token;
//! - a phrase that does not occur in full contributes its individually
//!   matching query tokens, each counted once per entry at `token_weight`.
//!
//! Confidence is the raw score divided by the number of distinct query
//! tokens, clamped to [0, 1].

use std::collections::BTreeSet;

use nyaya_core::text::QueryText;
use nyaya_core::{LexiconEntry, ScoringConfig};

/// Score of one lexicon entry against a query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryScore {
    pub raw: f32,
    /// Distinct-token ids matched by any keyword of the entry.
    pub matched: BTreeSet<usize>,
    /// Distinct-token ids covered by full phrase hits.
    pub phrase_covered: BTreeSet<usize>,
    /// Keywords that matched whole (single tokens and complete phrases).
    pub exact_hits: usize,
}

impl EntryScore {
    pub fn is_zero(&self) -> bool {
        self.raw <= 0.0
    }

    pub fn confidence(&self, query: &QueryText) -> f32 {
        normalize(self.raw, query)
    }
}

/// `raw` divided by the query's distinct token count, clamped to [0, 1].
pub fn normalize(raw: f32, query: &QueryText) -> f32 {
    if query.is_empty() {
        return 0.0;
    }
    (raw / query.token_count() as f32).clamp(0.0, 1.0)
}

pub fn score_entry(entry: &LexiconEntry, query: &QueryText, scoring: &ScoringConfig) -> EntryScore {
    let mut score = EntryScore::default();
    if query.is_empty() {
        return score;
    }
    let mut partial = BTreeSet::new();

    for keyword in &entry.keywords {
        if keyword.is_phrase() {
            match query.find_phrase(&keyword.tokens, scoring.min_prefix) {
                Some(ids) => {
                    score.raw += entry.phrase_weight * keyword.tokens.len() as f32;
                    score.exact_hits += 1;
                    score.matched.extend(ids.iter().copied());
                    score.phrase_covered.extend(ids);
                }
                None => {
                    for token in &keyword.tokens {
                        partial.extend(query.matching_ids(token, scoring.min_prefix));
                    }
                }
            }
        } else if let Some(token) = keyword.tokens.first() {
            let ids = query.matching_ids(token, scoring.min_prefix);
            if !ids.is_empty() {
                score.raw += scoring.token_weight;
                score.exact_hits += 1;
                score.matched.extend(ids);
            }
        }
    }

    // Partial phrase tokens only count where nothing else already matched.
    let leftover: Vec<usize> = partial.difference(&score.matched).copied().collect();
    score.raw += scoring.token_weight * leftover.len() as f32;
    score.matched.extend(leftover);
    score
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(keywords: &[&str]) -> LexiconEntry {
        LexiconEntry::new("X", "criminal", "cyber", keywords.iter().copied(), 2.0).unwrap()
    }

    fn score(keywords: &[&str], query: &str) -> EntryScore {
        score_entry(&entry(keywords), &QueryText::new(query), &ScoringConfig::default())
    }

    #[test]
    fn single_tokens_count_per_keyword() {
        let s = score(&["murder", "murdered", "theft"], "I have murdered someone");
        assert_eq!(s.raw, 2.0, "murder (prefix) and murdered (exact) both hit");
        assert_eq!(s.exact_hits, 2);
        assert_eq!(s.matched, BTreeSet::from([0]));
        assert!(s.phrase_covered.is_empty());
    }

    #[test]
    fn full_phrase_outweighs_its_tokens() {
        let s = score(&["breach of contract"], "a breach of contract by the seller");
        assert_eq!(s.raw, 4.0);
        assert_eq!(s.phrase_covered, BTreeSet::from([0, 1]));

        let partial = score(&["breach of contract"], "the contract was never signed");
        assert_eq!(partial.raw, 1.0);
        assert_eq!(partial.exact_hits, 0);
        assert!(partial.phrase_covered.is_empty());
    }

    #[test]
    fn partial_tokens_counted_once_per_entry() {
        let s = score(&["identity theft", "data theft"], "theft of my bicycle");
        assert_eq!(s.raw, 1.0, "'theft' shared by two phrases counts once");

        let s = score(&["theft", "data theft"], "theft of my bicycle");
        assert_eq!(s.raw, 1.0, "partial token already matched by a single keyword");
        assert_eq!(s.exact_hits, 1);
    }

    #[test]
    fn confidence_normalised_by_distinct_tokens() {
        let query = QueryText::new("murder murder bicycle");
        let s = score_entry(&entry(&["murder"]), &query, &ScoringConfig::default());
        assert_eq!(s.confidence(&query), 0.5);

        let saturated = QueryText::new("unauthorised access");
        let s = score_entry(
            &entry(&["unauthorised access"]),
            &saturated,
            &ScoringConfig::default(),
        );
        assert_eq!(s.confidence(&saturated), 1.0, "clamped");
    }

    #[test]
    fn empty_query_scores_zero() {
        let query = QueryText::new("the of and");
        let s = score_entry(&entry(&["murder"]), &query, &ScoringConfig::default());
        assert!(s.is_zero());
        assert_eq!(s.confidence(&query), 0.0);
    }
}
