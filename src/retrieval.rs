//! Retrieval scoring: lexical term matching plus hybrid combination.
//!
//! The lexical score is a BM25-flavored heuristic over query term coverage
//! and term prominence (heading, first sentence, opening, body). The hybrid
//! retrieval score blends an externally supplied semantic similarity with
//! the lexical score; this crate never computes embeddings itself.

use serde::{Deserialize, Serialize};

use crate::config::ScoringWeights;
use crate::entities::tokenize_query;

/// Where a query term was found in a chunk, most prominent location first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TermLocation {
    Heading,
    FirstSentence,
    Opening,
    Body,
}

/// A matched query term and the most prominent location it was found in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermMatch {
    pub term: String,
    pub location: TermLocation,
}

/// Lexical relevance of a chunk for a query, with the evidence used to
/// derive it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LexicalScore {
    /// 0–100.
    pub score: f64,
    pub matched_terms: Vec<TermMatch>,
    pub missing_terms: Vec<String>,
    /// Matched terms over total query terms, 0–1.
    pub term_coverage: f64,
    /// Whether the cleaned query appears verbatim in the chunk.
    pub exact_phrase: bool,
}

/// Neutral score used when no query signal is available.
pub const NEUTRAL_SCORE: f64 = 50.0;

/// Characters of the body checked for first-sentence prominence.
const FIRST_SENTENCE_MAX_CHARS: usize = 150;
/// Characters of the body treated as the opening.
const OPENING_CHARS: usize = 100;

/// Score a chunk's lexical relevance to a query.
///
/// Each query term is searched in priority order — heading path, first
/// sentence (up to the first `.` or 150 chars), first 100 characters, full
/// body — and scored `coverage*60 + headingBoost(≤20) + positionBonus(≤15)
/// + exactPhraseBonus(10)`, capped at 100. An empty query yields the
/// neutral 50 rather than penalizing the chunk.
pub fn calculate_lexical_score(
    chunk_text: &str,
    chunk_body: &str,
    query: &str,
    heading_path: &[String],
) -> LexicalScore {
    let terms = tokenize_query(query);
    if terms.is_empty() {
        return LexicalScore {
            score: NEUTRAL_SCORE,
            matched_terms: Vec::new(),
            missing_terms: Vec::new(),
            term_coverage: 0.0,
            exact_phrase: false,
        };
    }

    let heading_text = heading_path.join(" ").to_lowercase();
    let body_lower = chunk_body.to_lowercase();
    let first_sentence = first_sentence_of(&body_lower);
    let opening: String = body_lower.chars().take(OPENING_CHARS).collect();

    let mut matched_terms = Vec::new();
    let mut missing_terms = Vec::new();
    let mut heading_hits = 0usize;
    let mut position_hits = 0usize;

    for term in &terms {
        let location = if heading_text.contains(term.as_str()) {
            heading_hits += 1;
            Some(TermLocation::Heading)
        } else if first_sentence.contains(term.as_str()) {
            position_hits += 1;
            Some(TermLocation::FirstSentence)
        } else if opening.contains(term.as_str()) {
            position_hits += 1;
            Some(TermLocation::Opening)
        } else if body_lower.contains(term.as_str()) {
            Some(TermLocation::Body)
        } else {
            None
        };
        match location {
            Some(location) => matched_terms.push(TermMatch {
                term: term.clone(),
                location,
            }),
            None => missing_terms.push(term.clone()),
        }
    }

    let term_coverage = matched_terms.len() as f64 / terms.len() as f64;
    let heading_boost = (heading_hits as f64 * 5.0).min(20.0);
    let position_bonus = (position_hits as f64 * 5.0).min(15.0);
    let exact_phrase = {
        let cleaned_query = clean_for_phrase(query);
        !cleaned_query.is_empty() && clean_for_phrase(chunk_text).contains(&cleaned_query)
    };
    let phrase_bonus = if exact_phrase { 10.0 } else { 0.0 };

    let score = (term_coverage * 60.0 + heading_boost + position_bonus + phrase_bonus).min(100.0);

    LexicalScore {
        score: score.round(),
        matched_terms,
        missing_terms,
        term_coverage,
        exact_phrase,
    }
}

/// Blend an external semantic similarity (0–100) with the lexical score.
pub fn hybrid_retrieval(semantic: f64, lexical: f64, weights: &ScoringWeights) -> f64 {
    (semantic * weights.semantic_weight + lexical * weights.lexical_weight).round()
}

/// Normalize an externally supplied similarity onto the 0–100 scale.
///
/// Providers report either cosine-style 0–1 similarities or percentages;
/// values at or below 1.0 are treated as the former and scaled ×100, larger
/// values are clamped into range.
pub fn normalize_semantic(raw: f64) -> f64 {
    if raw.is_nan() {
        return 0.0;
    }
    if raw <= 1.0 {
        (raw.max(0.0)) * 100.0
    } else {
        raw.min(100.0)
    }
}

/// First sentence of a text: up to the first `.`, capped at 150 chars.
fn first_sentence_of(text: &str) -> String {
    let mut out = String::new();
    for (count, c) in text.chars().enumerate() {
        if count >= FIRST_SENTENCE_MAX_CHARS {
            break;
        }
        out.push(c);
        if c == '.' {
            break;
        }
    }
    out
}

/// Lowercase, strip punctuation, and collapse whitespace for verbatim
/// phrase comparison.
fn clean_for_phrase(text: &str) -> String {
    let lowered = text.to_lowercase();
    let stripped: String = lowered
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScoringWeights;

    fn path(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_query_neutral() {
        let score = calculate_lexical_score("text", "text", "", &[]);
        assert_eq!(score.score, NEUTRAL_SCORE);
        assert!(score.matched_terms.is_empty());
    }

    #[test]
    fn test_full_coverage_with_heading_terms() {
        let score = calculate_lexical_score(
            "# Chunking Strategies\n\nChunking splits documents into pieces.",
            "Chunking splits documents into pieces.",
            "chunking documents",
            &path(&["Chunking Strategies"]),
        );
        assert_eq!(score.missing_terms.len(), 0);
        assert!((score.term_coverage - 1.0).abs() < 1e-9);
        // coverage 60 + heading 5 + first-sentence 5 ≥ 70
        assert!(score.score >= 70.0);
    }

    #[test]
    fn test_missing_terms_recorded() {
        let score = calculate_lexical_score(
            "Nothing relevant at all in this body.",
            "Nothing relevant at all in this body.",
            "quantum chromodynamics",
            &[],
        );
        assert_eq!(score.missing_terms.len(), 2);
        assert_eq!(score.score, 0.0);
    }

    #[test]
    fn test_exact_phrase_bonus() {
        let with_phrase = calculate_lexical_score(
            "Token budgets matter. A token budget caps chunk size.",
            "Token budgets matter. A token budget caps chunk size.",
            "token budget",
            &[],
        );
        assert!(with_phrase.exact_phrase);
        let without_phrase = calculate_lexical_score(
            "Budgets for tokens matter when capping size.",
            "Budgets for tokens matter when capping size.",
            "token budget",
            &[],
        );
        assert!(!without_phrase.exact_phrase);
        assert!(with_phrase.score > without_phrase.score);
    }

    #[test]
    fn test_score_bounds() {
        let score = calculate_lexical_score(
            "chunking chunking chunking",
            "chunking chunking chunking",
            "chunking chunking chunking chunking",
            &path(&["chunking", "chunking", "chunking", "chunking", "chunking"]),
        );
        assert!(score.score <= 100.0);
        assert!(score.score >= 0.0);
    }

    #[test]
    fn test_hybrid_weighting() {
        let weights = ScoringWeights::default();
        assert_eq!(hybrid_retrieval(100.0, 0.0, &weights), 70.0);
        assert_eq!(hybrid_retrieval(0.0, 100.0, &weights), 30.0);
        assert_eq!(hybrid_retrieval(80.0, 60.0, &weights), 74.0);
    }

    #[test]
    fn test_normalize_semantic_scales() {
        assert_eq!(normalize_semantic(0.85), 85.0);
        assert_eq!(normalize_semantic(1.0), 100.0);
        assert_eq!(normalize_semantic(42.0), 42.0);
        assert_eq!(normalize_semantic(150.0), 100.0);
        assert_eq!(normalize_semantic(-0.2), 0.0);
        assert_eq!(normalize_semantic(f64::NAN), 0.0);
    }

    #[test]
    fn test_first_sentence_caps_at_period() {
        assert_eq!(first_sentence_of("short. rest"), "short.");
        let long = "x".repeat(400);
        assert_eq!(first_sentence_of(&long).chars().count(), 150);
    }
}
