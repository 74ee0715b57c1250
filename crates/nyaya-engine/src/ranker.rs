//! Relevance Ranker.
//!
//! `relevance = base_confidence × max(overlap, ε) × max(domain_confidence, ε)`
//! where `overlap` is the share of distinct query tokens found among the
//! record's indexed terms. Records from another domain, and primary records
//! caught by a topic-conflict rule, are never returned. Records under
//! `min_relevance` are dropped, except fallback records filed under the
//! classified (domain, subdomain). If nothing would remain, the best
//! fallback records are kept instead.

use std::collections::HashSet;

use nyaya_core::text::{QueryText, token_matches};
use nyaya_core::{ClassificationResult, GENERAL, ProvisionRecord, RankedProvision, ScoringConfig};
use tracing::debug;

pub struct RelevanceRanker<'a> {
    scoring: &'a ScoringConfig,
}

struct Scored<'r> {
    record: &'r ProvisionRecord,
    score: f32,
    admissible: bool,
    /// Fallback for exactly the classified domain and subdomain.
    own_fallback: bool,
}

impl<'a> RelevanceRanker<'a> {
    pub fn new(scoring: &'a ScoringConfig) -> Self {
        Self { scoring }
    }

    /// Rank `candidates` for `query`. Non-empty whenever `candidates` is.
    pub fn rank(
        &self,
        query: &QueryText,
        classification: &ClassificationResult,
        candidates: &[&ProvisionRecord],
    ) -> Vec<RankedProvision> {
        let scored: Vec<Scored<'_>> = candidates
            .iter()
            .map(|&record| Scored {
                record,
                score: self.relevance(query, record, classification.domain_confidence),
                admissible: self.admissible(query, record, &classification.domain),
                own_fallback: record.is_fallback
                    && record.domain == classification.domain
                    && record.subdomain == classification.subdomain,
            })
            .collect();

        let mut kept: Vec<&Scored<'_>> = scored
            .iter()
            .filter(|s| s.admissible && (s.own_fallback || s.score >= self.scoring.min_relevance))
            .collect();

        if kept.is_empty() {
            kept = top_tier(scored.iter().filter(|s| s.admissible && s.record.is_fallback));
            if kept.is_empty() {
                kept = top_tier(scored.iter().filter(|s| s.record.is_fallback));
            }
            if kept.is_empty() {
                kept = top_tier(scored.iter());
            }
            debug!(kept = kept.len(), "no record above threshold, keeping fallbacks");
        }

        kept.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.record.id.cmp(&b.record.id))
        });
        let mut seen = HashSet::new();
        kept.into_iter()
            .filter(|s| seen.insert(s.record.id.as_str()))
            .take(self.scoring.max_results)
            .map(|s| RankedProvision {
                provision: s.record.clone(),
                relevance_score: s.score,
            })
            .collect()
    }

    pub fn relevance(&self, query: &QueryText, record: &ProvisionRecord, domain_confidence: f32) -> f32 {
        let eps = self.scoring.epsilon;
        let overlap = self.overlap(query, record).max(eps);
        (record.base_confidence * overlap * domain_confidence.max(eps)).clamp(0.0, 1.0)
    }

    /// Share of distinct query tokens present among the record's terms.
    pub fn overlap(&self, query: &QueryText, record: &ProvisionRecord) -> f32 {
        if query.is_empty() {
            return 0.0;
        }
        let hits = query
            .distinct
            .iter()
            .filter(|q| {
                record
                    .terms
                    .iter()
                    .any(|t| token_matches(q, t, self.scoring.min_prefix))
            })
            .count();
        hits as f32 / query.token_count() as f32
    }

    fn admissible(&self, query: &QueryText, record: &ProvisionRecord, domain: &str) -> bool {
        if record.domain != domain && record.domain != GENERAL {
            return false;
        }
        if record.is_fallback {
            return true;
        }
        let prefix = self.scoring.min_prefix;
        let mut record_text = None;
        for conflict in &self.scoring.conflicts {
            if !query.mentions_any(&conflict.query_terms, prefix) {
                continue;
            }
            let text = record_text.get_or_insert_with(|| QueryText::new(&record.search_text()));
            if text.mentions_any(&conflict.record_terms, prefix)
                && !text.mentions_any(&conflict.query_terms, prefix)
            {
                debug!(id = %record.id, rule = %conflict.name, "record dropped by topic conflict");
                return false;
            }
        }
        true
    }
}

/// Entries sharing the highest score.
fn top_tier<'s, 'r>(scored: impl Iterator<Item = &'s Scored<'r>>) -> Vec<&'s Scored<'r>>
where
    'r: 's,
{
    let all: Vec<_> = scored.collect();
    let Some(max) = all.iter().map(|s| s.score).reduce(f32::max) else {
        return Vec::new();
    };
    all.into_iter().filter(|s| s.score == max).collect()
}

#[cfg(test)]
mod tests {
    use nyaya_core::{Source, TopicConflict};

    use super::*;

    fn record(id: &str, domain: &str, title: &str, fallback: bool, base: f32) -> ProvisionRecord {
        let mut r = ProvisionRecord {
            id: id.into(),
            jurisdiction: "X".into(),
            domain: domain.into(),
            subdomain: "any".into(),
            title: title.into(),
            definition: String::new(),
            elements: Vec::new(),
            penalties: Default::default(),
            process: Vec::new(),
            citations: Vec::new(),
            is_fallback: fallback,
            base_confidence: base,
            terms: Vec::new(),
        };
        r.index_terms();
        r
    }

    fn classification(domain: &str, domain_confidence: f32) -> ClassificationResult {
        ClassificationResult {
            jurisdiction: "X".into(),
            jurisdiction_source: Source::Detected,
            confidence: 1.0,
            domain: domain.into(),
            subdomain: "any".into(),
            domain_source: Source::Detected,
            domain_confidence,
        }
    }

    fn ids(ranked: &[RankedProvision]) -> Vec<&str> {
        ranked.iter().map(|r| r.provision.id.as_str()).collect()
    }

    #[test]
    fn relevance_formula() {
        let scoring = ScoringConfig::default();
        let ranker = RelevanceRanker::new(&scoring);
        let r = record("A", "criminal", "Theft of movable property", false, 0.8);
        let q = QueryText::new("theft of my bicycle");
        assert_eq!(ranker.overlap(&q, &r), 0.5);
        assert!((ranker.relevance(&q, &r, 0.5) - 0.2).abs() < 1e-6);

        let unrelated = QueryText::new("zxqv");
        assert!((ranker.relevance(&unrelated, &r, 0.0) - 0.8 * 0.01 * 0.01).abs() < 1e-9);
    }

    #[test]
    fn sorted_by_score_then_id_and_capped() {
        let scoring = ScoringConfig {
            max_results: 2,
            ..ScoringConfig::default()
        };
        let ranker = RelevanceRanker::new(&scoring);
        let a = record("B", "criminal", "Theft", false, 0.9);
        let b = record("A", "criminal", "Theft", false, 0.9);
        let c = record("C", "criminal", "Theft", false, 0.5);
        let q = QueryText::new("theft");
        let ranked = ranker.rank(&q, &classification("criminal", 1.0), &[&c, &a, &b]);
        assert_eq!(ids(&ranked), vec!["A", "B"]);
    }

    #[test]
    fn duplicates_collapsed_by_id() {
        let scoring = ScoringConfig::default();
        let ranker = RelevanceRanker::new(&scoring);
        let a = record("A", "criminal", "Theft", false, 0.9);
        let ranked = ranker.rank(&QueryText::new("theft"), &classification("criminal", 1.0), &[&a, &a]);
        assert_eq!(ids(&ranked), vec!["A"]);
    }

    #[test]
    fn other_domains_never_returned() {
        let scoring = ScoringConfig::default();
        let ranker = RelevanceRanker::new(&scoring);
        let civil = record("CIV", "civil", "Breach of contract damages", false, 0.9);
        let family = record("FAM", "family", "Breach of contract in marriage", false, 0.9);
        let consult = record("GEN", GENERAL, "General consultation", true, 0.5);
        let ranked = ranker.rank(
            &QueryText::new("breach of contract"),
            &classification("civil", 1.0),
            &[&civil, &family, &consult],
        );
        assert_eq!(ids(&ranked)[0], "CIV");
        assert!(ranked.iter().all(|r| r.provision.domain != "family"));
    }

    #[test]
    fn below_threshold_keeps_top_fallbacks() {
        let scoring = ScoringConfig::default();
        let ranker = RelevanceRanker::new(&scoring);
        let primary = record("P", "criminal", "Section 66", false, 0.9);
        let fb_hi = record("FB1", "criminal", "Homicide guidance", true, 0.8);
        let fb_lo = record("FB2", "criminal", "Killing guidance", true, 0.4);
        let mut widened = classification("criminal", 0.0);
        widened.subdomain = "other".into();
        let ranked = ranker.rank(
            &QueryText::new("zxqv blorft"),
            &widened,
            &[&primary, &fb_hi, &fb_lo],
        );
        assert_eq!(ids(&ranked), vec!["FB1"]);
        assert!(ranked[0].relevance_score > 0.0);
    }

    #[test]
    fn fallbacks_of_classified_subdomain_always_kept() {
        let scoring = ScoringConfig::default();
        let ranker = RelevanceRanker::new(&scoring);
        let primary = record("P", "criminal", "Punishment for murder", false, 0.9);
        let fallback = record("FB", "criminal", "Homicide guidance", true, 0.8);
        let ranked = ranker.rank(
            &QueryText::new("I have murdered someone"),
            &classification("criminal", 1.0),
            &[&fallback, &primary],
        );
        assert_eq!(ids(&ranked), vec!["P", "FB"]);
        assert!(ranked[1].relevance_score < scoring.min_relevance);
    }

    #[test]
    fn without_fallbacks_best_record_kept() {
        let scoring = ScoringConfig::default();
        let ranker = RelevanceRanker::new(&scoring);
        let a = record("A", "criminal", "Section 66", false, 0.9);
        let b = record("B", "criminal", "Section 67", false, 0.3);
        let ranked = ranker.rank(&QueryText::new("zxqv"), &classification("criminal", 0.0), &[&b, &a]);
        assert_eq!(ids(&ranked), vec!["A"]);
    }

    #[test]
    fn topic_conflict_drops_personal_status_records_for_device_queries() {
        let scoring = ScoringConfig {
            conflicts: vec![TopicConflict {
                name: "tech".into(),
                query_terms: vec!["phone".into(), "unauthorised access".into()],
                record_terms: vec!["divorce".into(), "custody".into()],
            }],
            ..ScoringConfig::default()
        };
        let ranker = RelevanceRanker::new(&scoring);
        let divorce = record("DIV", "criminal", "Divorce and access to phone records", false, 0.9);
        let custody = record("CUS", "criminal", "Custody of children", false, 0.9);
        let cyber = record("CYB", "criminal", "Unauthorised access to a phone", false, 0.9);
        let ranked = ranker.rank(
            &QueryText::new("someone got unauthorised access to my phone"),
            &classification("criminal", 1.0),
            &[&divorce, &custody, &cyber],
        );
        assert_eq!(ids(&ranked), vec!["CYB", "DIV"], "DIV also mentions phone, so it stays");
    }

    #[test]
    fn empty_candidates_rank_empty() {
        let scoring = ScoringConfig::default();
        let ranker = RelevanceRanker::new(&scoring);
        assert!(ranker
            .rank(&QueryText::new("theft"), &classification("criminal", 1.0), &[])
            .is_empty());
    }
}
