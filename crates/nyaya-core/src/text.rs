//! Text normalisation and token matching for queries, keywords, and provisions.
//!
//! Every piece of text that takes part in scoring goes through the same
//! pipeline so that a keyword written in a dataset and a word typed by a user
//! compare on equal terms.
//!
//! # Matching conventions
//!
//! - Case-insensitive: everything is lowercased.
//! - Punctuation is a separator: "breach-of-contract" tokenises like
//!   "breach of contract".
//! - Stop words are dropped, so "death of a person" and "death of the person"
//!   reduce to the same content tokens.
//! - Tokens match on equality, or on a shared prefix when the shorter token has
//!   at least `min_prefix` characters ("murder" matches "murdered", "uk" does
//!   not match "ukulele").

/// Function words removed from every token stream before scoring.
pub const STOP_WORDS: &[&str] = &[
    "a", "about", "am", "an", "and", "any", "are", "as", "at", "be", "been", "by", "can", "could",
    "did", "do", "does", "for", "from", "had", "has", "have", "he", "her", "his", "how", "i", "if",
    "in", "into", "is", "it", "its", "me", "my", "of", "on", "or", "our", "she", "should", "so",
    "that", "the", "their", "them", "there", "they", "this", "those", "to", "was", "we", "were",
    "what", "when", "which", "who", "with", "would", "you", "your",
];

/// Lowercase `s`, turn every non-alphanumeric character into a space, and
/// collapse runs of whitespace.
///
/// "  Breach-of  CONTRACT! " → "breach of contract"
pub fn normalize_text(s: &str) -> String {
    let mapped: String = s
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .flat_map(char::to_lowercase)
        .collect();
    mapped.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.binary_search(&token).is_ok()
}

/// Content tokens of `s` in reading order, duplicates kept.
pub fn tokenize(s: &str) -> Vec<String> {
    normalize_text(s)
        .split(' ')
        .filter(|t| !t.is_empty() && !is_stop_word(t))
        .map(str::to_string)
        .collect()
}

/// Whether query token `q` matches dataset token `k`.
pub fn token_matches(q: &str, k: &str, min_prefix: usize) -> bool {
    if q == k {
        return true;
    }
    let (short, long) = if q.len() <= k.len() { (q, k) } else { (k, q) };
    short.chars().count() >= min_prefix && long.starts_with(short)
}

/// A query prepared once per request for scoring.
///
/// `tokens` keeps the content tokens in order (for phrase matching);
/// `distinct` holds each token once in first-seen order, and `ids[i]` is the
/// position in `distinct` of `tokens[i]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryText {
    pub normalized: String,
    pub tokens: Vec<String>,
    pub distinct: Vec<String>,
    pub ids: Vec<usize>,
}

impl QueryText {
    pub fn new(raw: &str) -> Self {
        let tokens = tokenize(raw);
        let mut distinct: Vec<String> = Vec::with_capacity(tokens.len());
        let mut ids = Vec::with_capacity(tokens.len());
        for token in &tokens {
            match distinct.iter().position(|d| d == token) {
                Some(i) => ids.push(i),
                None => {
                    ids.push(distinct.len());
                    distinct.push(token.clone());
                }
            }
        }
        Self {
            normalized: normalize_text(raw),
            tokens,
            distinct,
            ids,
        }
    }

    /// Number of distinct content tokens; the normaliser for every score.
    pub fn token_count(&self) -> usize {
        self.distinct.len()
    }

    pub fn is_empty(&self) -> bool {
        self.distinct.is_empty()
    }

    /// Distinct-token ids matching the single dataset token `k`.
    pub fn matching_ids(&self, k: &str, min_prefix: usize) -> Vec<usize> {
        self.distinct
            .iter()
            .enumerate()
            .filter(|(_, q)| token_matches(q, k, min_prefix))
            .map(|(i, _)| i)
            .collect()
    }

    /// Find the first run of consecutive query tokens matching `phrase`
    /// token-for-token. Returns the distinct-token ids covered by the run.
    pub fn find_phrase(&self, phrase: &[String], min_prefix: usize) -> Option<Vec<usize>> {
        if phrase.is_empty() || phrase.len() > self.tokens.len() {
            return None;
        }
        self.tokens
            .windows(phrase.len())
            .position(|window| {
                window
                    .iter()
                    .zip(phrase)
                    .all(|(q, k)| token_matches(q, k, min_prefix))
            })
            .map(|start| self.ids[start..start + phrase.len()].to_vec())
    }

    /// Mentions any of `terms` (each normalised and phrase-matched).
    pub fn mentions_any(&self, terms: &[String], min_prefix: usize) -> bool {
        terms.iter().any(|term| {
            let phrase = tokenize(term);
            self.find_phrase(&phrase, min_prefix).is_some()
        })
    }
}
