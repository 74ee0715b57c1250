//! The query pipeline over tables loaded once at startup.

use std::collections::BTreeSet;

use nyaya_core::text::QueryText;
use nyaya_core::{
    ClassificationResult, ConfigError, EngineConfig, GENERAL, ProvisionRecord, QueryResult,
    Source, ValidationError,
};
use nyaya_store::{Glossary, LexiconStore, ProvisionIndex, RouteTable};
use tracing::{debug, info};

use crate::assembler::ResponseAssembler;
use crate::classifier::{DomainClassification, DomainClassifier};
use crate::detector::JurisdictionDetector;
use crate::ranker::RelevanceRanker;

/// Loaded lexicon, provisions, routes, and glossary plus the configuration that
/// scores against them. Immutable after construction; share it behind an
/// `Arc` across threads.
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    lexicon: LexiconStore,
    index: ProvisionIndex,
    routes: RouteTable,
    glossary: Glossary,
    default_jurisdiction: String,
}

impl Engine {
    /// Load every table named by `config.data`, falling back to the bundled
    /// datasets for paths left unset.
    pub fn load(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let wanted: BTreeSet<String> = config.jurisdictions.iter().cloned().collect();

        let lexicon = match &config.data.lexicon {
            Some(path) => LexiconStore::load_path(path, &wanted, &config.scoring)?,
            None => LexiconStore::builtin(&wanted, &config.scoring)?,
        };
        let index = match &config.data.provisions {
            Some(path) => ProvisionIndex::load_path(path, &lexicon)?,
            None => ProvisionIndex::builtin(&lexicon)?,
        };
        let routes = match &config.data.routes {
            Some(path) => RouteTable::load_path(path)?,
            None => RouteTable::builtin()?,
        };
        let glossary = match &config.data.glossary {
            Some(path) => Glossary::load_path(path)?,
            None => Glossary::builtin()?,
        };

        Self::new(config, lexicon, index, routes, glossary)
    }

    /// Assemble an engine from tables that are already loaded.
    pub fn new(
        config: EngineConfig,
        lexicon: LexiconStore,
        index: ProvisionIndex,
        routes: RouteTable,
        glossary: Glossary,
    ) -> Result<Self, ConfigError> {
        let default_jurisdiction = lexicon
            .profile(&config.defaults.jurisdiction)
            .map(|p| p.code.clone())
            .ok_or_else(|| ConfigError::UnknownJurisdiction(config.defaults.jurisdiction.clone()))?;

        info!(
            jurisdictions = lexicon.profiles().len(),
            entries = lexicon.len(),
            provisions = index.len(),
            glossary = glossary.len(),
            default = %default_jurisdiction,
            "engine ready"
        );
        Ok(Self {
            config,
            lexicon,
            index,
            routes,
            glossary,
            default_jurisdiction,
        })
    }

    /// Classify `query`, retrieve and rank provisions, and assemble the result.
    ///
    /// Fails only on invalid input. Every valid query yields at least one
    /// provision, at worst the jurisdiction's consultation record.
    pub fn classify_and_retrieve(
        &self,
        query: &str,
        jurisdiction_hint: Option<&str>,
        domain_hint: Option<&str>,
    ) -> Result<QueryResult, ValidationError> {
        let query = self.validate(query)?;
        let text = QueryText::new(query);
        let classification = self.classify_text(&text, jurisdiction_hint, domain_hint);

        let candidates = self.candidates(&classification);
        let ranked = RelevanceRanker::new(&self.config.scoring).rank(
            &text,
            &classification,
            &candidates,
        );
        debug!(
            jurisdiction = %classification.jurisdiction,
            domain = %classification.domain,
            subdomain = %classification.subdomain,
            candidates = candidates.len(),
            ranked = ranked.len(),
            "query processed"
        );

        Ok(
            ResponseAssembler::new(&self.lexicon, &self.routes, &self.glossary, &self.config)
                .assemble(&text, &classification, ranked),
        )
    }

    /// Jurisdiction detection and domain classification only.
    pub fn classify(
        &self,
        query: &str,
        jurisdiction_hint: Option<&str>,
        domain_hint: Option<&str>,
    ) -> Result<ClassificationResult, ValidationError> {
        let query = self.validate(query)?;
        Ok(self.classify_text(&QueryText::new(query), jurisdiction_hint, domain_hint))
    }

    /// Trim `query` and check its length in characters.
    pub fn validate<'q>(&self, query: &'q str) -> Result<&'q str, ValidationError> {
        let trimmed = query.trim();
        let len = trimmed.chars().count();
        let limits = &self.config.validation;
        if len == 0 {
            Err(ValidationError::EmptyQuery)
        } else if len < limits.min_chars {
            Err(ValidationError::QueryTooShort {
                len,
                min: limits.min_chars,
            })
        } else if len > limits.max_chars {
            Err(ValidationError::QueryTooLong {
                len,
                max: limits.max_chars,
            })
        } else {
            Ok(trimmed)
        }
    }

    fn classify_text(
        &self,
        text: &QueryText,
        jurisdiction_hint: Option<&str>,
        domain_hint: Option<&str>,
    ) -> ClassificationResult {
        let scoring = &self.config.scoring;
        let jurisdiction =
            JurisdictionDetector::new(&self.lexicon, scoring, &self.default_jurisdiction)
                .detect(text, jurisdiction_hint);
        let mut domain = DomainClassifier::new(&self.lexicon, scoring, &self.config.defaults.domain)
            .classify(&jurisdiction.code, text, domain_hint);
        if let Some(pinned) = self.title_domain(&jurisdiction.code, text, &domain) {
            domain = pinned;
        }

        ClassificationResult {
            jurisdiction: jurisdiction.code,
            jurisdiction_source: jurisdiction.source,
            confidence: jurisdiction.confidence,
            domain: domain.domain,
            subdomain: domain.subdomain,
            domain_source: domain.source,
            domain_confidence: domain.confidence,
        }
    }

    /// A query naming a provision by its full title is filed where that
    /// provision is, whatever the keywords suggest. A domain hint still
    /// wins. Confidence is the share of query tokens the title covers.
    fn title_domain(
        &self,
        jurisdiction: &str,
        text: &QueryText,
        classified: &DomainClassification,
    ) -> Option<DomainClassification> {
        if classified.source == Source::Hint {
            return None;
        }
        let (record, covered) = self
            .index
            .title_match(jurisdiction, text, self.config.scoring.min_prefix)?;
        if record.domain == classified.domain && record.subdomain == classified.subdomain {
            return None;
        }
        debug!(
            id = %record.id,
            from = %format!("{}/{}", classified.domain, classified.subdomain),
            "query names a provision title"
        );
        Some(DomainClassification {
            domain: record.domain.clone(),
            subdomain: record.subdomain.clone(),
            source: Source::Detected,
            confidence: (covered as f32 / text.token_count().max(1) as f32).clamp(0.0, 1.0),
        })
    }

    /// Provisions to rank: the classified triple, widened to the whole
    /// domain when the triple has no primary record, and the consultation
    /// record when both are empty.
    fn candidates(&self, c: &ClassificationResult) -> Vec<&ProvisionRecord> {
        let mut candidates = self.index.query(&c.jurisdiction, &c.domain, &c.subdomain);
        if c.domain != GENERAL && !candidates.iter().any(|r| !r.is_fallback) {
            let widened = self.index.query_domain(&c.jurisdiction, &c.domain);
            if !widened.is_empty() {
                candidates = widened;
            }
        }
        if candidates.is_empty() {
            candidates.extend(self.index.consultation(&c.jurisdiction));
        }
        candidates
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn lexicon(&self) -> &LexiconStore {
        &self.lexicon
    }

    pub fn index(&self) -> &ProvisionIndex {
        &self.index
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn glossary(&self) -> &Glossary {
        &self.glossary
    }

    pub fn default_jurisdiction(&self) -> &str {
        &self.default_jurisdiction
    }
}

#[cfg(test)]
mod tests {
    use nyaya_core::{ResultStatus, Source};

    use super::*;

    const LEXICON: &str = r#"{ "jurisdictions": [
        { "code": "X", "name": "Xland", "aliases": ["XLAND"],
          "domains": {
            "criminal": { "homicide": ["murder", "murdered", "killed"], "theft": ["theft", "stolen"] },
            "civil": { "contract": ["contract", "breach of contract"] } } },
        { "code": "Y", "name": "Yland", "markers": ["yland"],
          "domains": {
            "criminal": { "theft": ["theft", "stolen"] },
            "civil": { "contract": ["contract", "breach of contract"] } } } ] }"#;

    const PROVISIONS: &str = r#"{ "provisions": [
        { "id": "X-MUR", "jurisdiction": "X", "domain": "criminal", "subdomain": "homicide",
          "title": "Murder", "definition": "Intentional killing", "citations": ["Penal Code s.1"],
          "elements": ["intent"], "base_confidence": 0.9 },
        { "id": "X-FB-MUR", "jurisdiction": "X", "domain": "criminal", "subdomain": "homicide",
          "title": "Homicide guidance", "is_fallback": true, "base_confidence": 0.8 },
        { "id": "X-THEFT", "jurisdiction": "X", "domain": "criminal", "subdomain": "theft",
          "title": "Theft", "base_confidence": 0.9 },
        { "id": "X-CON", "jurisdiction": "X", "domain": "civil", "subdomain": "contract",
          "title": "Breach of contract", "base_confidence": 0.9 },
        { "id": "X-LEASE", "jurisdiction": "X", "domain": "civil", "subdomain": "contract",
          "title": "Stolen Goods Lease Act", "base_confidence": 0.9 },
        { "id": "X-GEN", "jurisdiction": "X", "domain": "general", "subdomain": "general",
          "title": "General consultation", "is_fallback": true, "base_confidence": 0.5 },
        { "id": "Y-THEFT", "jurisdiction": "Y", "domain": "criminal", "subdomain": "theft",
          "title": "Theft in Yland", "base_confidence": 0.9 },
        { "id": "Y-GEN", "jurisdiction": "Y", "domain": "general", "subdomain": "general",
          "title": "General consultation", "is_fallback": true, "base_confidence": 0.5 } ] }"#;

    const ROUTES: &str = r#"{ "default": { "civil": [ { "step": "FILE", "description": "File" } ] } }"#;

    fn engine() -> Engine {
        let config = EngineConfig {
            defaults: nyaya_core::DefaultsConfig {
                jurisdiction: "x".into(),
                domain: GENERAL.into(),
            },
            ..EngineConfig::default()
        };
        let lexicon =
            LexiconStore::from_json(LEXICON, &BTreeSet::new(), &config.scoring).unwrap();
        let index = ProvisionIndex::from_json(PROVISIONS, &lexicon).unwrap();
        let routes = RouteTable::from_json(ROUTES).unwrap();
        Engine::new(config, lexicon, index, routes, Glossary::default()).unwrap()
    }

    #[test]
    fn validation_counts_trimmed_characters() {
        let engine = engine();
        assert_eq!(engine.validate("   "), Err(ValidationError::EmptyQuery));
        assert_eq!(
            engine.validate(" a "),
            Err(ValidationError::QueryTooShort { len: 1, min: 3 })
        );
        assert_eq!(engine.validate("  abc  "), Ok("abc"));
        let long = "é".repeat(1001);
        assert_eq!(
            engine.validate(&long),
            Err(ValidationError::QueryTooLong { len: 1001, max: 1000 })
        );
        assert!(engine.validate(&"é".repeat(1000)).is_ok(), "limit counts chars, not bytes");
    }

    #[test]
    fn murder_retrieves_primary_and_fallback() {
        let result = engine()
            .classify_and_retrieve("I have murdered someone", None, None)
            .unwrap();
        assert_eq!(result.jurisdiction, "X");
        assert_eq!(result.domain, "criminal");
        let ids: Vec<&str> = result.provisions.iter().map(|p| p.provision.id.as_str()).collect();
        assert!(ids.contains(&"X-FB-MUR"), "got {ids:?}");
        assert!(result.confidence > 0.0);
        assert_eq!(result.status, ResultStatus::Retrieved);
    }

    #[test]
    fn sparse_triple_widens_to_domain() {
        let engine = engine();
        let c = ClassificationResult {
            jurisdiction: "Y".into(),
            jurisdiction_source: Source::Hint,
            confidence: 1.0,
            domain: "civil".into(),
            subdomain: "contract".into(),
            domain_source: Source::Detected,
            domain_confidence: 1.0,
        };
        let ids: Vec<&str> = engine.candidates(&c).iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["Y-GEN"], "no civil records at all: consultation only");

        let c = ClassificationResult {
            jurisdiction: "X".into(),
            subdomain: "fraud".into(),
            domain: "criminal".into(),
            ..c
        };
        assert_eq!(engine.candidates(&c).len(), 3);
    }

    #[test]
    fn hint_overrides_detection() {
        let result = engine()
            .classify_and_retrieve("stolen bicycle in yland", Some("X"), None)
            .unwrap();
        assert_eq!(result.jurisdiction, "X");
        assert_eq!(result.jurisdiction_confidence, 1.0);
        assert!(result.provisions.iter().all(|p| p.provision.jurisdiction == "X"));
    }

    #[test]
    fn nonsense_returns_consultation_only() {
        let result = engine().classify_and_retrieve("zxqv blorft wug", None, None).unwrap();
        assert_eq!(result.jurisdiction, "X");
        assert_eq!(result.domain, GENERAL);
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.provisions.len(), 1);
        assert_eq!(result.provisions[0].provision.id, "X-GEN");
        assert_eq!(result.status, ResultStatus::FallbackOnly);
    }

    #[test]
    fn provision_title_in_query_overrides_keywords() {
        let engine = engine();
        let result = engine
            .classify_and_retrieve("Stolen Goods Lease Act", None, None)
            .unwrap();
        assert_eq!((result.domain.as_str(), result.subdomain.as_str()), ("civil", "contract"));
        assert_eq!(result.domain_confidence, 1.0);
        assert_eq!(result.provisions[0].provision.id, "X-LEASE");

        let plain = engine.classify("my bike was stolen", None, None).unwrap();
        assert_eq!(plain.subdomain, "theft");

        let hinted = engine
            .classify("Stolen Goods Lease Act", None, Some("criminal"))
            .unwrap();
        assert_eq!(hinted.domain, "criminal", "a domain hint still wins");
    }

    #[test]
    fn stop_word_only_query_is_valid() {
        let result = engine().classify_and_retrieve("what is the", None, None).unwrap();
        assert_eq!(result.domain, GENERAL);
        assert!(!result.provisions.is_empty());
    }

    #[test]
    fn unknown_default_jurisdiction_rejected() {
        let config = EngineConfig {
            defaults: nyaya_core::DefaultsConfig {
                jurisdiction: "ZZ".into(),
                domain: GENERAL.into(),
            },
            ..EngineConfig::default()
        };
        let lexicon =
            LexiconStore::from_json(LEXICON, &BTreeSet::new(), &config.scoring).unwrap();
        let index = ProvisionIndex::from_json(PROVISIONS, &lexicon).unwrap();
        let routes = RouteTable::from_json(ROUTES).unwrap();
        let err = Engine::new(config, lexicon, index, routes, Glossary::default()).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownJurisdiction(ref c) if c == "ZZ"));
    }
}
