//! Rerank scoring: a cross-encoder-style second-pass relevance judgment.
//!
//! Four independent sub-signals — entity prominence, direct-answer
//! detection, structural clarity, and query restatement — are combined
//! with fixed weights (0.35 / 0.30 / 0.20 / 0.15). Each sub-score carries
//! the evidence it was derived from, for explainability.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::config::ScoringWeights;
use crate::entities::{extract_query_entities, is_stopword, tokenize_query};
use crate::retrieval::NEUTRAL_SCORE;
use crate::sentence::split_into_sentences;

static DEFINITIONAL_RE: OnceLock<Regex> = OnceLock::new();
static EXPLICIT_ANSWER_RE: OnceLock<Regex> = OnceLock::new();
static NUMERIC_UNIT_RE: OnceLock<Regex> = OnceLock::new();
static TIME_UNIT_RE: OnceLock<Regex> = OnceLock::new();
static STEP_MARKER_RE: OnceLock<Regex> = OnceLock::new();
static LIST_MARKER_LINE_RE: OnceLock<Regex> = OnceLock::new();

pub(crate) fn definitional_re() -> &'static Regex {
    DEFINITIONAL_RE.get_or_init(|| {
        Regex::new(
            r"(?i)\b(?:is|are)\s+(?:a|an|the)\b|\brefers? to\b|\bmeans\b|\bdefined as\b|\bis called\b|\bconsists? of\b",
        )
        .expect("definitional regex")
    })
}

pub(crate) fn explicit_answer_re() -> &'static Regex {
    EXPLICIT_ANSWER_RE.get_or_init(|| {
        Regex::new(
            r"(?i)\bthe answer is\b|\btypically takes?\b|\busually takes?\b|\bin short\b|\bsimply put\b|\bto summarize\b|\bthe key is\b",
        )
        .expect("explicit answer regex")
    })
}

pub(crate) fn numeric_unit_re() -> &'static Regex {
    NUMERIC_UNIT_RE.get_or_init(|| {
        Regex::new(
            r"(?i)\b\d+(?:\.\d+)?\s*(?:%|percent|days?|weeks?|months?|years?|hours?|minutes?|seconds?|dollars?|times|x)\b",
        )
        .expect("numeric unit regex")
    })
}

fn time_unit_re() -> &'static Regex {
    TIME_UNIT_RE.get_or_init(|| {
        Regex::new(r"(?i)\b\d+(?:\.\d+)?\s*(?:days?|weeks?|months?|years?|hours?|minutes?|seconds?)\b")
            .expect("time unit regex")
    })
}

fn step_marker_re() -> &'static Regex {
    STEP_MARKER_RE.get_or_init(|| Regex::new(r"(?i)\bstep\s+\d+\b").expect("step marker regex"))
}

fn list_marker_line_re() -> &'static Regex {
    LIST_MARKER_LINE_RE
        .get_or_init(|| Regex::new(r"(?m)^\s*(?:[-*+]|\d+[.)])\s+").expect("list marker regex"))
}

/// Where each query entity was found, with prominence buckets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityProminence {
    /// 0–100; 50 when the query has no entities.
    pub score: f64,
    pub found_in_heading: Vec<String>,
    pub found_in_first_sentence: Vec<String>,
    pub found_in_body: Vec<String>,
    pub missing: Vec<String>,
}

/// Direct-answer detection evidence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectAnswer {
    /// 0–100.
    pub score: f64,
    pub has_direct_answer: bool,
    /// Character offset of the earliest answer signal in the body.
    pub answer_position: Option<usize>,
    /// Names of the patterns that fired.
    pub signals: Vec<String>,
}

/// How strongly the chunk opening restates the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestatementKind {
    Exact,
    Paraphrase,
    Partial,
    None,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRestatement {
    /// 0–100.
    pub score: f64,
    pub kind: RestatementKind,
    /// Non-stopword token overlap between query and chunk opening, 0–1.
    pub token_overlap: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuralClarity {
    /// 0–100.
    pub score: f64,
    pub signals: Vec<String>,
}

/// The combined rerank judgment for one (chunk, query) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RerankScore {
    /// 0–100 weighted combination of the four sub-signals.
    pub score: f64,
    pub entity_prominence: EntityProminence,
    pub direct_answer: DirectAnswer,
    pub query_restatement: QueryRestatement,
    pub structural_clarity: StructuralClarity,
}

/// Score how a cross-encoder reranker would judge this chunk for the query.
///
/// An empty query carries no signal; every sub-score returns the neutral 50
/// rather than penalizing the chunk.
pub fn calculate_rerank_score(
    chunk_text: &str,
    chunk_body: &str,
    query: &str,
    heading_path: &[String],
    weights: &ScoringWeights,
) -> RerankScore {
    if query.trim().is_empty() {
        return neutral_rerank();
    }

    let entity_prominence = score_entity_prominence(chunk_body, query, heading_path);
    let direct_answer = score_direct_answer(chunk_body, query);
    let query_restatement = score_query_restatement(chunk_body, query);
    let structural_clarity = score_structural_clarity(chunk_text, chunk_body, query, heading_path);

    let score = (entity_prominence.score * weights.entity_prominence_weight
        + direct_answer.score * weights.direct_answer_weight
        + structural_clarity.score * weights.structural_clarity_weight
        + query_restatement.score * weights.query_restatement_weight)
        .round();

    RerankScore {
        score,
        entity_prominence,
        direct_answer,
        query_restatement,
        structural_clarity,
    }
}

fn neutral_rerank() -> RerankScore {
    RerankScore {
        score: NEUTRAL_SCORE,
        entity_prominence: EntityProminence {
            score: NEUTRAL_SCORE,
            found_in_heading: Vec::new(),
            found_in_first_sentence: Vec::new(),
            found_in_body: Vec::new(),
            missing: Vec::new(),
        },
        direct_answer: DirectAnswer {
            score: NEUTRAL_SCORE,
            has_direct_answer: false,
            answer_position: None,
            signals: Vec::new(),
        },
        query_restatement: QueryRestatement {
            score: NEUTRAL_SCORE,
            kind: RestatementKind::None,
            token_overlap: 0.0,
        },
        structural_clarity: StructuralClarity {
            score: NEUTRAL_SCORE,
            signals: Vec::new(),
        },
    }
}

/// Entities for prominence checks: extracted query entities, falling back
/// to the query's content terms when extraction finds none.
fn prominence_entities(query: &str) -> Vec<String> {
    let entities = extract_query_entities(query);
    if entities.is_empty() {
        tokenize_query(query)
    } else {
        entities
    }
}

/// Bucket each query entity by the most prominent place it appears:
/// heading (+30 raw), first sentence (+20), body (+10), or missing (−15).
/// The raw sum is normalized linearly between the theoretical minimum
/// (−15·N) and maximum (+30·N); no entities yields a neutral 50.
fn score_entity_prominence(
    chunk_body: &str,
    query: &str,
    heading_path: &[String],
) -> EntityProminence {
    let entities = prominence_entities(query);
    if entities.is_empty() {
        return EntityProminence {
            score: NEUTRAL_SCORE,
            found_in_heading: Vec::new(),
            found_in_first_sentence: Vec::new(),
            found_in_body: Vec::new(),
            missing: Vec::new(),
        };
    }

    let heading_text = heading_path.join(" ").to_lowercase();
    let body_lower = chunk_body.to_lowercase();
    let first_sentence = split_into_sentences(chunk_body)
        .first()
        .map(|s| s.text.to_lowercase())
        .unwrap_or_default();

    let mut found_in_heading = Vec::new();
    let mut found_in_first_sentence = Vec::new();
    let mut found_in_body = Vec::new();
    let mut missing = Vec::new();
    let mut raw = 0.0_f64;

    for entity in entities {
        if heading_text.contains(entity.as_str()) {
            raw += 30.0;
            found_in_heading.push(entity);
        } else if first_sentence.contains(entity.as_str()) {
            raw += 20.0;
            found_in_first_sentence.push(entity);
        } else if body_lower.contains(entity.as_str()) {
            raw += 10.0;
            found_in_body.push(entity);
        } else {
            raw -= 15.0;
            missing.push(entity);
        }
    }

    let n = (found_in_heading.len() + found_in_first_sentence.len() + found_in_body.len() + missing.len()) as f64;
    let min = -15.0 * n;
    let max = 30.0 * n;
    let score = ((raw - min) / (max - min) * 100.0).clamp(0.0, 100.0);

    EntityProminence {
        score: score.round(),
        found_in_heading,
        found_in_first_sentence,
        found_in_body,
        missing,
    }
}

/// Detect definitional language (+30), explicit-answer phrasing (+40), and
/// numeric facts with units (+30), additively capped at 100, plus
/// query-type bonuses (e.g. a "how long" query answered with a time unit).
fn score_direct_answer(chunk_body: &str, query: &str) -> DirectAnswer {
    let mut score = 0.0_f64;
    let mut signals = Vec::new();
    let mut earliest: Option<usize> = None;

    let note = |m: Option<regex::Match>, points: f64, name: &str,
                score: &mut f64,
                signals: &mut Vec<String>,
                earliest: &mut Option<usize>| {
        if let Some(m) = m {
            *score += points;
            signals.push(name.to_string());
            let char_pos = chunk_body[..m.start()].chars().count();
            *earliest = Some(earliest.map_or(char_pos, |e: usize| e.min(char_pos)));
        }
    };

    note(
        definitional_re().find(chunk_body),
        30.0,
        "definitional",
        &mut score,
        &mut signals,
        &mut earliest,
    );
    note(
        explicit_answer_re().find(chunk_body),
        40.0,
        "explicit_answer",
        &mut score,
        &mut signals,
        &mut earliest,
    );
    note(
        numeric_unit_re().find(chunk_body),
        30.0,
        "numeric_fact",
        &mut score,
        &mut signals,
        &mut earliest,
    );

    let query_lower = query.to_lowercase();
    if query_lower.contains("how long") && time_unit_re().is_match(chunk_body) {
        score += 20.0;
        signals.push("how_long_time_unit".to_string());
    }
    if (query_lower.contains("how much") || query_lower.contains("how many"))
        && chunk_body.chars().any(|c| c.is_ascii_digit())
    {
        score += 20.0;
        signals.push("quantity_answer".to_string());
    }

    let score = score.min(100.0);
    DirectAnswer {
        score,
        has_direct_answer: !signals.is_empty(),
        answer_position: earliest,
        signals,
    }
}

/// Score how directly the chunk opening restates the query: verbatim match
/// in the first two sentences is 100; otherwise token-overlap tiers at 0.6
/// (paraphrase, 75) and 0.3 (partial, 40).
fn score_query_restatement(chunk_body: &str, query: &str) -> QueryRestatement {
    let query_terms: Vec<String> = tokenize_query(query)
        .into_iter()
        .filter(|t| !is_stopword(t))
        .collect();

    let opening = split_into_sentences(chunk_body)
        .iter()
        .take(2)
        .map(|s| s.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    let opening = if opening.is_empty() {
        chunk_body.chars().take(300).collect::<String>()
    } else {
        opening
    };

    let cleaned_query = clean(query);
    if !cleaned_query.is_empty() && clean(&opening).contains(&cleaned_query) {
        return QueryRestatement {
            score: 100.0,
            kind: RestatementKind::Exact,
            token_overlap: 1.0,
        };
    }

    if query_terms.is_empty() {
        return QueryRestatement {
            score: 0.0,
            kind: RestatementKind::None,
            token_overlap: 0.0,
        };
    }

    let opening_lower = opening.to_lowercase();
    let matched = query_terms
        .iter()
        .filter(|t| opening_lower.contains(t.as_str()))
        .count();
    let token_overlap = matched as f64 / query_terms.len() as f64;

    let (score, kind) = if token_overlap >= 0.6 {
        (75.0, RestatementKind::Paraphrase)
    } else if token_overlap >= 0.3 {
        (40.0, RestatementKind::Partial)
    } else {
        (0.0, RestatementKind::None)
    };

    QueryRestatement {
        score,
        kind,
        token_overlap,
    }
}

/// Award +25 apiece (capped at 100) for heading-term relevance, list/step
/// markers, definition patterns, and explicit-answer patterns.
fn score_structural_clarity(
    _chunk_text: &str,
    chunk_body: &str,
    query: &str,
    heading_path: &[String],
) -> StructuralClarity {
    let mut score = 0.0_f64;
    let mut signals = Vec::new();

    let query_terms = tokenize_query(query);
    let heading_lower = heading_path.join(" ").to_lowercase();
    let heading_matches = query_terms
        .iter()
        .any(|t| !is_stopword(t) && heading_lower.contains(t.as_str()));
    if heading_matches {
        score += 25.0;
        signals.push("heading_matches_query".to_string());
    }
    if list_marker_line_re().is_match(chunk_body) || step_marker_re().is_match(chunk_body) {
        score += 25.0;
        signals.push("list_or_steps".to_string());
    }
    if definitional_re().is_match(chunk_body) {
        score += 25.0;
        signals.push("definition_pattern".to_string());
    }
    if explicit_answer_re().is_match(chunk_body) {
        score += 25.0;
        signals.push("explicit_answer_pattern".to_string());
    }

    StructuralClarity {
        score: score.min(100.0),
        signals,
    }
}

fn clean(text: &str) -> String {
    let lowered = text.to_lowercase();
    let stripped: String = lowered
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}
