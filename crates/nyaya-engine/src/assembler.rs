//! Response Assembler: turns a classification and ranked provisions into a
//! [`QueryResult`].

use std::collections::HashSet;

use nyaya_core::text::QueryText;
use nyaya_core::{ClassificationResult, EngineConfig, QueryResult, RankedProvision, ResultStatus};
use nyaya_store::{Glossary, LexiconStore, RouteTable, evidence_requirements, timeline_estimate};

pub const DISCLAIMER: &str = "This legal information is for general guidance only and is not legal \
advice. Consult qualified legal counsel about your specific situation.";

pub struct ResponseAssembler<'a> {
    lexicon: &'a LexiconStore,
    routes: &'a RouteTable,
    glossary: &'a Glossary,
    config: &'a EngineConfig,
}

impl<'a> ResponseAssembler<'a> {
    pub fn new(
        lexicon: &'a LexiconStore,
        routes: &'a RouteTable,
        glossary: &'a Glossary,
        config: &'a EngineConfig,
    ) -> Self {
        Self {
            lexicon,
            routes,
            glossary,
            config,
        }
    }

    pub fn assemble(
        &self,
        query: &QueryText,
        classification: &ClassificationResult,
        provisions: Vec<RankedProvision>,
    ) -> QueryResult {
        let defaults = &self.config.defaults;
        let jurisdiction = or_default(&classification.jurisdiction, &defaults.jurisdiction);
        let domain = or_default(&classification.domain, &defaults.domain);
        let subdomain = or_default(&classification.subdomain, &defaults.domain);
        let jurisdiction_name = self
            .lexicon
            .profile(&jurisdiction)
            .map(|p| p.name.clone())
            .unwrap_or_else(|| jurisdiction.clone());

        let best = provisions
            .iter()
            .map(|p| p.relevance_score)
            .fold(0.0_f32, f32::max);
        let confidence = (classification.combined_confidence() * best).clamp(0.0, 1.0);

        let mut seen = HashSet::new();
        let citations: Vec<String> = provisions
            .iter()
            .flat_map(|p| p.provision.citations.iter())
            .filter(|c| seen.insert(c.as_str()))
            .cloned()
            .collect();

        let status = if provisions.iter().any(|p| !p.provision.is_fallback) {
            ResultStatus::Retrieved
        } else {
            ResultStatus::FallbackOnly
        };
        let summary = summarize(status, &provisions, &jurisdiction_name, &domain, &subdomain);

        let legal_route = self.routes.route(&jurisdiction, &domain).to_vec();
        let evidence_requirements = evidence_requirements(&legal_route);
        let timeline_estimate = timeline_estimate(legal_route.len()).to_string();
        let glossary_terms = self
            .glossary
            .lookup(&jurisdiction, query, self.config.scoring.min_prefix);
        let key_provisions_count = provisions
            .iter()
            .filter(|p| p.provision.is_key_provision())
            .count();

        QueryResult {
            jurisdiction,
            jurisdiction_name,
            jurisdiction_confidence: classification.confidence,
            domain,
            subdomain,
            domain_confidence: classification.domain_confidence,
            confidence,
            status,
            provisions,
            citations,
            summary,
            legal_route,
            evidence_requirements,
            timeline_estimate,
            glossary_terms,
            key_provisions_count,
            disclaimer: DISCLAIMER.to_string(),
        }
    }
}

fn or_default(value: &str, default: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        default.to_string()
    } else {
        value.to_string()
    }
}

fn summarize(
    status: ResultStatus,
    provisions: &[RankedProvision],
    jurisdiction_name: &str,
    domain: &str,
    subdomain: &str,
) -> String {
    let titles = provisions
        .iter()
        .map(|p| p.provision.title.as_str())
        .collect::<Vec<_>>()
        .join("; ");
    match status {
        ResultStatus::Retrieved => {
            let n = provisions.len();
            let noun = if n == 1 { "provision" } else { "provisions" };
            format!(
                "{n} {noun} found for {} ({}) law in {jurisdiction_name}: {titles}",
                domain.replace('_', " "),
                subdomain.replace('_', " "),
            )
        }
        ResultStatus::FallbackOnly if titles.is_empty() => format!(
            "No specific provision matched in {jurisdiction_name}. \
             Consult a qualified legal professional."
        ),
        ResultStatus::FallbackOnly => format!(
            "No specific provision matched in {jurisdiction_name}; general guidance: {titles}. \
             Consult a qualified legal professional."
        ),
    }
}
