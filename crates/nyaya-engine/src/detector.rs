//! Jurisdiction Detector.

use nyaya_core::text::QueryText;
use nyaya_core::{ScoringConfig, Source};
use nyaya_store::{JurisdictionProfile, LexiconStore};
use tracing::debug;

use crate::scoring::{normalize, score_entry};

/// Chosen jurisdiction and how it was chosen.
#[derive(Debug, Clone, PartialEq)]
pub struct JurisdictionDetection {
    pub code: String,
    pub source: Source,
    pub confidence: f32,
}

/// Picks the jurisdiction a query is about.
///
/// A recognised hint wins outright. Otherwise every loaded jurisdiction is
/// scored over its marker keywords (weighted by `marker_weight`) plus all of
/// its domain entries; the highest normalised score wins. Ties go to the
/// default jurisdiction, then to lexicon order. With no matches at all the
/// default is returned with confidence 0.
pub struct JurisdictionDetector<'a> {
    lexicon: &'a LexiconStore,
    scoring: &'a ScoringConfig,
    default: &'a str,
}

impl<'a> JurisdictionDetector<'a> {
    /// `default` must be a code loaded in `lexicon`.
    pub fn new(lexicon: &'a LexiconStore, scoring: &'a ScoringConfig, default: &'a str) -> Self {
        Self {
            lexicon,
            scoring,
            default,
        }
    }

    pub fn detect(&self, query: &QueryText, hint: Option<&str>) -> JurisdictionDetection {
        if let Some(hint) = hint.map(str::trim).filter(|h| !h.is_empty()) {
            match self.lexicon.resolve_alias(hint) {
                Some(code) => {
                    return JurisdictionDetection {
                        code: code.to_string(),
                        source: Source::Hint,
                        confidence: 1.0,
                    };
                }
                None => debug!(hint, "unrecognised jurisdiction hint ignored"),
            }
        }

        let mut best: Option<(&JurisdictionProfile, f32)> = None;
        for profile in self.lexicon.profiles() {
            let raw = self.raw_score(profile, query);
            debug!(jurisdiction = %profile.code, raw, "jurisdiction score");
            let replace = match best {
                None => true,
                Some((current, best_raw)) => {
                    raw > best_raw
                        || (raw == best_raw
                            && profile.code == self.default
                            && current.code != self.default)
                }
            };
            if replace {
                best = Some((profile, raw));
            }
        }

        match best {
            Some((profile, raw)) if raw > 0.0 => JurisdictionDetection {
                code: profile.code.clone(),
                source: Source::Detected,
                confidence: normalize(raw, query),
            },
            _ => JurisdictionDetection {
                code: self.default.to_string(),
                source: Source::Default,
                confidence: 0.0,
            },
        }
    }

    /// Unnormalised score of `profile` for `query`.
    pub fn raw_score(&self, profile: &JurisdictionProfile, query: &QueryText) -> f32 {
        let markers = score_entry(&profile.markers, query, self.scoring).raw;
        let domains: f32 = self
            .lexicon
            .lookup(&profile.code)
            .iter()
            .map(|entry| score_entry(entry, query, self.scoring).raw)
            .sum();
        self.scoring.marker_weight * markers + domains
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    const LEXICON: &str = r#"{
        "jurisdictions": [
            { "code": "AA", "name": "Aland", "aliases": ["ALAND"], "markers": ["aland", "alville"],
              "domains": { "criminal": { "theft": ["theft"] },
                           "civil": { "contract": ["contract", "breach of contract"] } } },
            { "code": "BB", "name": "Beeland", "aliases": ["BEELAND", "BEE"], "markers": ["beeland"],
              "domains": { "criminal": { "homicide": ["murder"], "theft": ["theft"] },
                           "civil": { "contract": ["contract"] } } },
            { "code": "CC", "name": "Ceeland", "markers": ["ceeland"],
              "domains": { "criminal": { "theft": ["theft"] } } }
        ]
    }"#;

    fn lexicon() -> LexiconStore {
        LexiconStore::from_json(LEXICON, &BTreeSet::new(), &ScoringConfig::default()).unwrap()
    }

    fn detect(default: &str, query: &str, hint: Option<&str>) -> JurisdictionDetection {
        let lexicon = lexicon();
        let scoring = ScoringConfig::default();
        JurisdictionDetector::new(&lexicon, &scoring, default).detect(&QueryText::new(query), hint)
    }

    #[test]
    fn hint_short_circuits_with_full_confidence() {
        let d = detect("AA", "someone committed murder", Some("bee"));
        assert_eq!(d.code, "BB");
        assert_eq!(d.source, Source::Hint);
        assert_eq!(d.confidence, 1.0);

        let by_code = detect("AA", "murder", Some(" cc "));
        assert_eq!(by_code.code, "CC");
    }

    #[test]
    fn unrecognised_hint_falls_through_to_detection() {
        let d = detect("AA", "murder in the night", Some("atlantis"));
        assert_eq!(d.code, "BB");
        assert_eq!(d.source, Source::Detected);
    }

    #[test]
    fn only_jurisdiction_with_matching_keywords_wins() {
        let d = detect("AA", "I have murdered someone", None);
        assert_eq!(d.code, "BB");
        assert_eq!(d.confidence, 0.5);
    }

    #[test]
    fn markers_outweigh_shared_domain_keywords() {
        let d = detect("AA", "theft in ceeland", None);
        assert_eq!(d.code, "CC");
        assert!(d.confidence > 0.0 && d.confidence <= 1.0);
    }

    #[test]
    fn ties_prefer_default_then_lexicon_order() {
        assert_eq!(detect("CC", "bicycle theft", None).code, "CC");
        assert_eq!(detect("ZZ", "bicycle theft", None).code, "AA");
    }

    #[test]
    fn phrase_hit_breaks_shared_token_tie() {
        let d = detect("BB", "breach of contract", None);
        assert_eq!(d.code, "AA", "AA carries the full phrase");
    }

    #[test]
    fn no_match_yields_default_with_zero_confidence() {
        let d = detect("BB", "zxqv blorft wug", None);
        assert_eq!(d.code, "BB");
        assert_eq!(d.source, Source::Default);
        assert_eq!(d.confidence, 0.0);
    }
}
