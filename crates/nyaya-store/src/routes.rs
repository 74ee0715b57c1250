//! Legal route table: procedural steps per domain, optionally per jurisdiction.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use nyaya_core::{ConfigError, RouteStep};
use serde::Deserialize;
use tracing::info;

use crate::read_source;

/// Domain whose default route backs every unknown domain.
pub const BASE_ROUTE_DOMAIN: &str = "civil";

#[derive(Deserialize)]
struct RouteSource {
    default: BTreeMap<String, Vec<RouteStep>>,
    #[serde(default)]
    jurisdictions: BTreeMap<String, BTreeMap<String, Vec<RouteStep>>>,
}

#[derive(Debug)]
pub struct RouteTable {
    default: BTreeMap<String, Vec<RouteStep>>,
    jurisdictions: BTreeMap<String, BTreeMap<String, Vec<RouteStep>>>,
}

impl RouteTable {
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_json(crate::builtin::ROUTES)
    }

    pub fn load_path(path: &Path) -> Result<Self, ConfigError> {
        let json = read_source(path)?;
        Self::from_json(&json)
    }

    /// Parse a route document. The `default` table must carry a non-empty
    /// `civil` route; no route may be empty.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let source: RouteSource = serde_json::from_str(json).map_err(|source| {
            ConfigError::Json {
                what: "routes",
                source,
            }
        })?;

        let lower = |table: BTreeMap<String, Vec<RouteStep>>| {
            table
                .into_iter()
                .map(|(domain, steps)| (domain.to_lowercase(), steps))
                .collect::<BTreeMap<_, _>>()
        };
        let default = lower(source.default);
        let jurisdictions: BTreeMap<_, _> = source
            .jurisdictions
            .into_iter()
            .map(|(code, table)| (code.to_ascii_uppercase(), lower(table)))
            .collect();

        if default.get(BASE_ROUTE_DOMAIN).is_none_or(|steps| steps.is_empty()) {
            return Err(ConfigError::Invalid(format!(
                "route table lacks a default {BASE_ROUTE_DOMAIN} route"
            )));
        }
        let all = default
            .iter()
            .chain(jurisdictions.values().flat_map(|t| t.iter()));
        for (domain, steps) in all {
            if steps.is_empty() {
                return Err(ConfigError::Invalid(format!("empty route for {domain}")));
            }
        }

        info!(
            domains = default.len(),
            overrides = jurisdictions.len(),
            "loaded route table"
        );
        Ok(Self {
            default,
            jurisdictions,
        })
    }

    /// Route for `domain` in `jurisdiction`: the jurisdiction override, else
    /// the domain default, else the civil default. Never empty.
    pub fn route(&self, jurisdiction: &str, domain: &str) -> &[RouteStep] {
        self.jurisdictions
            .get(jurisdiction)
            .and_then(|table| table.get(domain))
            .or_else(|| self.default.get(domain))
            .or_else(|| self.default.get(BASE_ROUTE_DOMAIN))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Evidence named across `steps`, first mention kept.
pub fn evidence_requirements(steps: &[RouteStep]) -> Vec<String> {
    let mut seen = HashSet::new();
    steps
        .iter()
        .flat_map(|s| s.evidence_required.iter())
        .filter(|e| seen.insert(e.as_str()))
        .cloned()
        .collect()
}

/// Rough overall duration from the number of route steps.
pub fn timeline_estimate(steps: usize) -> &'static str {
    match steps {
        0..=2 => "3-6 months",
        3..=4 => "6-12 months",
        _ => "12-24 months",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"{
        "default": {
            "civil": [
                { "step": "CASE_ALLOCATION", "description": "Allocation to court", "timeline": "7-14 days",
                  "evidence_required": ["Statement of claim", "Contract"] },
                { "step": "SETTLEMENT", "description": "Attempt to settle",
                  "evidence_required": ["Correspondence", "Contract"] },
                { "step": "TRIAL", "description": "Adjudication" }
            ],
            "Criminal": [
                { "step": "CRIME_REPORTING", "description": "Report the offence" }
            ]
        },
        "jurisdictions": {
            "in": {
                "criminal": [
                    { "step": "FIR_REGISTRATION", "description": "Register an FIR" },
                    { "step": "INVESTIGATION", "description": "Police investigation" },
                    { "step": "CHARGE_SHEET", "description": "Charge sheet filed" }
                ]
            }
        }
    }"#;

    #[test]
    fn override_then_default_then_civil() {
        let table = RouteTable::from_json(FIXTURE).unwrap();
        assert_eq!(table.route("IN", "criminal")[0].step, "FIR_REGISTRATION");
        assert_eq!(table.route("UK", "criminal")[0].step, "CRIME_REPORTING");
        assert_eq!(table.route("UK", "maritime")[0].step, "CASE_ALLOCATION");
        assert_eq!(table.route("IN", "civil").len(), 3);
        assert_eq!(table.route("IN", "civil")[2].timeline, None);
    }

    #[test]
    fn civil_default_required() {
        let err = RouteTable::from_json(r#"{ "default": { "criminal": [
            { "step": "A", "description": "a" } ] } }"#)
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn empty_route_rejected() {
        let err = RouteTable::from_json(r#"{ "default": {
            "civil": [ { "step": "A", "description": "a" } ],
            "family": [] } }"#)
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn evidence_deduplicated_in_route_order() {
        let table = RouteTable::from_json(FIXTURE).unwrap();
        assert_eq!(
            evidence_requirements(table.route("UK", "civil")),
            vec!["Statement of claim", "Contract", "Correspondence"]
        );
        assert!(evidence_requirements(table.route("IN", "criminal")).is_empty());
    }

    #[test]
    fn timeline_buckets() {
        assert_eq!(timeline_estimate(0), "3-6 months");
        assert_eq!(timeline_estimate(2), "3-6 months");
        assert_eq!(timeline_estimate(4), "6-12 months");
        assert_eq!(timeline_estimate(7), "12-24 months");
    }

    #[test]
    fn builtin_routes_cover_core_domains() {
        let table = RouteTable::builtin().unwrap();
        for domain in ["criminal", "civil", "family", "consumer", "employment", "general"] {
            assert!(!table.route("UK", domain).is_empty(), "{domain}");
        }
    }
}
