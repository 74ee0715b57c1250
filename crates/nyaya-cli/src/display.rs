//! Vertical card display for query results and dataset listings.

use std::collections::BTreeMap;
use std::fmt::{self, Write};

use nyaya_core::{QueryResult, RankedProvision};
use nyaya_engine::Engine;
use nyaya_store::LexiconStore;

const MAX_LIST_ITEMS: usize = 10;

// ── Query result ──

/// Render a query result as a card: classification, provisions, citations,
/// route, evidence, glossary, and disclaimer.
pub fn render_result(out: &mut impl Write, result: &QueryResult) -> fmt::Result {
    writeln!(out, "=== {} ({}) ===", result.jurisdiction_name, result.jurisdiction)?;
    writeln!(out, "{}", result.summary)?;
    writeln!(out)?;

    writeln!(out, "Classification")?;
    field(
        out,
        "jurisdiction",
        &format!("{} ({:.2})", result.jurisdiction, result.jurisdiction_confidence),
    )?;
    field(
        out,
        "domain",
        &format!(
            "{} / {} ({:.2})",
            result.domain, result.subdomain, result.domain_confidence
        ),
    )?;
    field(out, "confidence", &format!("{:.2}", result.confidence))?;
    field(out, "status", result.status.as_str())?;
    writeln!(out)?;

    writeln!(out, "Provisions")?;
    for (i, ranked) in result.provisions.iter().enumerate() {
        render_provision(out, i + 1, ranked)?;
    }

    if !result.citations.is_empty() {
        writeln!(out, "Citations")?;
        list(out, &result.citations)?;
        writeln!(out)?;
    }

    writeln!(out, "Legal Route (est. {})", result.timeline_estimate)?;
    for (i, step) in result.legal_route.iter().enumerate() {
        write!(out, "  {}. {:<24} {}", i + 1, step.step, step.description)?;
        if let Some(timeline) = &step.timeline {
            write!(out, " [{timeline}]")?;
        }
        writeln!(out)?;
    }
    writeln!(out)?;

    if !result.evidence_requirements.is_empty() {
        writeln!(out, "Evidence")?;
        list(out, &result.evidence_requirements)?;
        writeln!(out)?;
    }

    if !result.glossary_terms.is_empty() {
        writeln!(out, "Glossary")?;
        for (term, definition) in &result.glossary_terms {
            field(out, term, definition)?;
        }
        writeln!(out)?;
    }

    writeln!(out, "{}", result.disclaimer)
}

fn render_provision(out: &mut impl Write, n: usize, ranked: &RankedProvision) -> fmt::Result {
    let p = &ranked.provision;
    let tag = if p.is_fallback { " [guidance]" } else { "" };
    writeln!(out, "  [{n}] {}{tag}", p.title)?;
    field(out, "  id", &p.id)?;
    field(out, "  relevance", &format!("{:.3}", ranked.relevance_score))?;
    if !p.definition.is_empty() {
        field(out, "  definition", &p.definition)?;
    }
    if !p.elements.is_empty() {
        field(out, "  elements", &truncated(&p.elements).join("; "))?;
    }
    for (kind, penalty) in &p.penalties {
        field(out, &format!("  penalty ({kind})"), penalty)?;
    }
    if !p.process.is_empty() {
        field(out, "  process", &truncated(&p.process).join(" → "))?;
    }
    writeln!(out)
}

// ── Listings ──

/// Loaded jurisdictions with aliases and their domain/subdomain tree.
pub fn render_jurisdictions(out: &mut impl Write, lexicon: &LexiconStore) -> fmt::Result {
    for profile in lexicon.profiles() {
        writeln!(out, "{} - {}", profile.code, profile.name)?;
        field(out, "aliases", &profile.aliases.join(", "))?;
        let mut domains: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for entry in lexicon.lookup(&profile.code) {
            domains
                .entry(entry.domain.as_str())
                .or_default()
                .push(entry.subdomain.as_str());
        }
        for (domain, subdomains) in domains {
            field(out, domain, &subdomains.join(", "))?;
        }
        writeln!(out)?;
    }
    Ok(())
}

/// Dataset counts plus lexicon subdomains that have no provisions of their own.
pub fn render_check(out: &mut impl Write, engine: &Engine) -> fmt::Result {
    let lexicon = engine.lexicon();
    let summary = engine.index().summary();

    writeln!(out, "Datasets")?;
    field(out, "jurisdictions", &lexicon.profiles().len().to_string())?;
    field(out, "default jurisdiction", engine.default_jurisdiction())?;
    field(out, "lexicon entries", &lexicon.len().to_string())?;
    field(out, "provisions", &summary.total.to_string())?;
    field(out, "fallback provisions", &summary.fallback.to_string())?;
    field(out, "indexed triples", &summary.triples.to_string())?;
    field(out, "glossary terms", &engine.glossary().len().to_string())?;
    writeln!(out)?;

    let gaps: Vec<String> = lexicon
        .profiles()
        .iter()
        .flat_map(|p| lexicon.lookup(&p.code))
        .filter(|e| {
            engine
                .index()
                .query(&e.jurisdiction, &e.domain, &e.subdomain)
                .is_empty()
        })
        .map(|e| format!("{}/{}/{}", e.jurisdiction, e.domain, e.subdomain))
        .collect();
    if gaps.is_empty() {
        writeln!(out, "Every lexicon subdomain has provisions.")
    } else {
        writeln!(out, "Subdomains answered from the wider domain")?;
        list(out, &gaps)
    }
}

// ── Helpers ──

fn field(out: &mut impl Write, name: &str, value: &str) -> fmt::Result {
    writeln!(out, "  {:<26} {}", name, value)
}

fn list(out: &mut impl Write, items: &[String]) -> fmt::Result {
    for item in truncated(items) {
        writeln!(out, "  - {item}")?;
    }
    if items.len() > MAX_LIST_ITEMS {
        writeln!(out, "  ... and {} more", items.len() - MAX_LIST_ITEMS)?;
    }
    Ok(())
}

fn truncated(items: &[String]) -> Vec<&str> {
    items.iter().take(MAX_LIST_ITEMS).map(String::as_str).collect()
}
