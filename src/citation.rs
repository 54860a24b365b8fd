//! Citation scoring: how likely a generative system is to quote this chunk.
//!
//! Three sub-signals — attributability (specific vs. vague claims),
//! evidence strength, and quotability/format — weighted 0.40 / 0.35 / 0.25.
//! Sentence classification is first-match-wins over a fixed priority:
//! statistic > date > name > definition > process > comparison.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::config::ScoringWeights;
use crate::rerank::definitional_re;
use crate::retrieval::NEUTRAL_SCORE;
use crate::sentence::split_into_sentences;

static STATISTIC_RE: OnceLock<Regex> = OnceLock::new();
static DATE_RE: OnceLock<Regex> = OnceLock::new();
static NAME_RE: OnceLock<Regex> = OnceLock::new();
static PROCESS_RE: OnceLock<Regex> = OnceLock::new();
static COMPARISON_RE: OnceLock<Regex> = OnceLock::new();
static VAGUE_RE: OnceLock<Regex> = OnceLock::new();
static SOURCE_REF_RE: OnceLock<Regex> = OnceLock::new();
static VERB_RE: OnceLock<Regex> = OnceLock::new();

fn statistic_re() -> &'static Regex {
    STATISTIC_RE.get_or_init(|| {
        Regex::new(
            r"\d+(?:\.\d+)?\s*%|(?i:\b\d+\s+percent\b)|\$\s?\d|\b\d+(?:,\d{3})+\b|(?i:\b\d+(?:\.\d+)?\s*(?:times|x)\b)",
        )
        .expect("statistic regex")
    })
}

fn date_re() -> &'static Regex {
    DATE_RE.get_or_init(|| {
        Regex::new(
            r"\b(?:19|20)\d{2}\b|(?i:\b(?:january|february|march|april|may|june|july|august|september|october|november|december)\b)|\b\d{1,2}/\d{1,2}/\d{2,4}\b",
        )
        .expect("date regex")
    })
}

fn name_re() -> &'static Regex {
    NAME_RE.get_or_init(|| {
        Regex::new(r"\b[A-Z][a-z]+(?:\s+[A-Z][a-z]+)+\b|\b[A-Z]{2,}\b").expect("name regex")
    })
}

fn process_re() -> &'static Regex {
    PROCESS_RE.get_or_init(|| {
        Regex::new(r"(?i)\b(?:first|second|then|next|finally|step\s+\d+|begin by|start by)\b")
            .expect("process regex")
    })
}

fn comparison_re() -> &'static Regex {
    COMPARISON_RE.get_or_init(|| {
        Regex::new(
            r"(?i)\b(?:more than|less than|fewer than|compared (?:to|with)|versus|vs\.?|(?:higher|lower|faster|slower|better|worse) than)\b",
        )
        .expect("comparison regex")
    })
}

fn vague_re() -> &'static Regex {
    VAGUE_RE.get_or_init(|| {
        Regex::new(
            r"(?i)\b(?:many|some|several|various|often|usually|generally|typically|might|could|probably|arguably|possibly|it is believed|experts say|a lot of)\b",
        )
        .expect("vague regex")
    })
}

fn source_ref_re() -> &'static Regex {
    SOURCE_REF_RE.get_or_init(|| {
        Regex::new(
            r"(?i)\baccording to\b|\bresearch (?:shows|suggests|indicates)\b|\bstud(?:y|ies) (?:shows?|found|suggests?)\b|\bet al\b|\bsource:|\[\d+\]",
        )
        .expect("source ref regex")
    })
}

fn verb_re() -> &'static Regex {
    VERB_RE.get_or_init(|| {
        Regex::new(
            r"(?i)\b(?:is|are|was|were|has|have|can|will|shows?|provides?|uses?|takes?|means|helps?|improves?|increases?|reduces?|requires?|contains?|supports?|enables?|delivers?|measures?|preserves?|depends?|caps?)\b",
        )
        .expect("verb regex")
    })
}

/// Opening words that make a sentence depend on prior context.
const CONTEXT_DEPENDENT_OPENERS: &[&str] = &[
    "this", "that", "it", "they", "these", "those", "he", "she", "however", "therefore", "thus",
    "also", "additionally", "furthermore", "moreover", "but", "and", "so", "such",
];

/// The specific-claim category a sentence falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimKind {
    Statistic,
    Date,
    Name,
    Definition,
    Process,
    Comparison,
}

/// Specific vs. vague claim balance across the chunk's sentences.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attributability {
    /// 0–100; 50 for empty text.
    pub score: f64,
    pub specific_sentences: usize,
    pub vague_sentences: usize,
    pub total_sentences: usize,
    /// One entry per specific sentence, in document order.
    pub claim_kinds: Vec<ClaimKind>,
}

/// Presence of concrete evidence markers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceStrength {
    /// 0–100; 50 for empty text.
    pub score: f64,
    pub signals: Vec<String>,
}

/// Quotability and formatting of the chunk's sentences.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CitationFormat {
    /// 0–100; 50 for empty text.
    pub score: f64,
    pub quotable_sentences: Vec<String>,
    pub declarative_opening: bool,
    pub standalone_opening: bool,
}

/// Predicted likelihood that a generative system would cite this chunk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CitationScore {
    /// 0–100 weighted combination of the three sub-signals.
    pub score: f64,
    pub attributability: Attributability,
    pub evidence_strength: EvidenceStrength,
    pub citation_format: CitationFormat,
}

/// Score how citable a chunk is. Query-independent: only the chunk's own
/// text matters. Empty text yields the neutral 50 throughout.
pub fn calculate_citation_score(
    _chunk_text: &str,
    chunk_body: &str,
    weights: &ScoringWeights,
) -> CitationScore {
    let sentences = split_into_sentences(chunk_body);
    if sentences.is_empty() {
        return neutral_citation();
    }

    let attributability = score_attributability(&sentences);
    let evidence_strength = score_evidence_strength(chunk_body);
    let citation_format = score_citation_format(&sentences);

    let score = (attributability.score * weights.attributability_weight
        + evidence_strength.score * weights.evidence_strength_weight
        + citation_format.score * weights.citation_format_weight)
        .round();

    CitationScore {
        score,
        attributability,
        evidence_strength,
        citation_format,
    }
}

fn neutral_citation() -> CitationScore {
    CitationScore {
        score: NEUTRAL_SCORE,
        attributability: Attributability {
            score: NEUTRAL_SCORE,
            specific_sentences: 0,
            vague_sentences: 0,
            total_sentences: 0,
            claim_kinds: Vec::new(),
        },
        evidence_strength: EvidenceStrength {
            score: NEUTRAL_SCORE,
            signals: Vec::new(),
        },
        citation_format: CitationFormat {
            score: NEUTRAL_SCORE,
            quotable_sentences: Vec::new(),
            declarative_opening: false,
            standalone_opening: false,
        },
    }
}

/// Classify a sentence into its specific-claim category, first-match-wins.
fn classify_sentence(text: &str) -> Option<ClaimKind> {
    if statistic_re().is_match(text) {
        Some(ClaimKind::Statistic)
    } else if date_re().is_match(text) {
        Some(ClaimKind::Date)
    } else if name_re().is_match(text) {
        Some(ClaimKind::Name)
    } else if definitional_re().is_match(text) {
        Some(ClaimKind::Definition)
    } else if process_re().is_match(text) {
        Some(ClaimKind::Process)
    } else if comparison_re().is_match(text) {
        Some(ClaimKind::Comparison)
    } else {
        None
    }
}

/// `100·specific/total − 30·vague/total`, plus small bonuses for having a
/// statistic (+10), definition (+5), and comparison (+5); clamped to 0–100.
fn score_attributability(sentences: &[crate::models::Sentence]) -> Attributability {
    let mut claim_kinds = Vec::new();
    let mut vague_sentences = 0usize;

    for sentence in sentences {
        match classify_sentence(&sentence.text) {
            Some(kind) => claim_kinds.push(kind),
            None => {
                if vague_re().is_match(&sentence.text) {
                    vague_sentences += 1;
                }
            }
        }
    }

    let total = sentences.len() as f64;
    let specific_sentences = claim_kinds.len();
    let mut score = 100.0 * specific_sentences as f64 / total - 30.0 * vague_sentences as f64 / total;
    if claim_kinds.contains(&ClaimKind::Statistic) {
        score += 10.0;
    }
    if claim_kinds.contains(&ClaimKind::Definition) {
        score += 5.0;
    }
    if claim_kinds.contains(&ClaimKind::Comparison) {
        score += 5.0;
    }

    Attributability {
        score: score.clamp(0.0, 100.0).round(),
        specific_sentences,
        vague_sentences,
        total_sentences: sentences.len(),
        claim_kinds,
    }
}

/// +25 apiece (capped at 100) for: any number, any proper-noun-like
/// phrase, any date, any source-reference phrase.
fn score_evidence_strength(chunk_body: &str) -> EvidenceStrength {
    let mut score = 0.0_f64;
    let mut signals = Vec::new();

    if chunk_body.chars().any(|c| c.is_ascii_digit()) {
        score += 25.0;
        signals.push("number".to_string());
    }
    if name_re().is_match(chunk_body) {
        score += 25.0;
        signals.push("proper_noun".to_string());
    }
    if date_re().is_match(chunk_body) {
        score += 25.0;
        signals.push("date".to_string());
    }
    if source_ref_re().is_match(chunk_body) {
        score += 25.0;
        signals.push("source_reference".to_string());
    }

    EvidenceStrength {
        score: score.min(100.0),
        signals,
    }
}

/// A sentence is quotable when it is declarative, 5–30 words, opens
/// without a context-dependent word, and makes a recognizable claim.
fn is_quotable(text: &str, word_count: usize) -> bool {
    if text.trim_end().ends_with('?') {
        return false;
    }
    if !(5..=30).contains(&word_count) {
        return false;
    }
    if starts_with_context_dependent(text) {
        return false;
    }
    classify_sentence(text).is_some() || verb_re().is_match(text)
}

fn starts_with_context_dependent(text: &str) -> bool {
    text.split_whitespace()
        .next()
        .map(|w| {
            let w: String = w
                .chars()
                .filter(|c| c.is_alphanumeric())
                .collect::<String>()
                .to_lowercase();
            CONTEXT_DEPENDENT_OPENERS.contains(&w.as_str())
        })
        .unwrap_or(false)
}

/// `min(40, 10·quotable) + 30·declarativeOpening + 30·standaloneOpening`.
fn score_citation_format(sentences: &[crate::models::Sentence]) -> CitationFormat {
    let quotable_sentences: Vec<String> = sentences
        .iter()
        .filter(|s| is_quotable(&s.text, s.word_count))
        .map(|s| s.text.clone())
        .collect();

    let first = &sentences[0];
    let declarative_opening = !first.text.trim_end().ends_with('?')
        && (classify_sentence(&first.text).is_some() || verb_re().is_match(&first.text));
    let standalone_opening = !starts_with_context_dependent(&first.text);

    let mut score = (quotable_sentences.len() as f64 * 10.0).min(40.0);
    if declarative_opening {
        score += 30.0;
    }
    if standalone_opening {
        score += 30.0;
    }

    CitationFormat {
        score: score.min(100.0),
        quotable_sentences,
        declarative_opening,
        standalone_opening,
    }
}
