//! Composite passage scoring and failure-mode diagnosis.
//!
//! Combines the three scorer outputs into a single 0–100 passage score and
//! derives a diagnosis: the primary reason a chunk underperforms for a
//! query, with a recommended fix and expected improvement. Rules are
//! evaluated in a fixed order; the first match wins.

use serde::{Deserialize, Serialize};

use crate::citation::CitationScore;
use crate::config::ScoringWeights;
use crate::rerank::RerankScore;
use crate::retrieval::LexicalScore;

/// Character position past which a direct answer counts as buried.
const BURIED_ANSWER_CHARS: usize = 150;

/// Passage score band thresholds.
pub const STRONG_THRESHOLD: f64 = 70.0;
pub const NEEDS_WORK_THRESHOLD: f64 = 45.0;

/// The primary reason a chunk underperforms for a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureMode {
    AlreadyOptimized,
    TopicMismatch,
    VocabularyGap,
    BuriedAnswer,
    NoDirectAnswer,
    MissingSpecifics,
    StructureProblem,
}

/// How urgently the recommended fix should be applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixPriority {
    None,
    Critical,
    Important,
    Minor,
}

/// Qualitative band for a passage score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBand {
    Strong,
    NeedsWork,
    Gap,
}

impl ScoreBand {
    pub fn from_score(score: f64) -> Self {
        if score >= STRONG_THRESHOLD {
            ScoreBand::Strong
        } else if score >= NEEDS_WORK_THRESHOLD {
            ScoreBand::NeedsWork
        } else {
            ScoreBand::Gap
        }
    }
}

/// Derived, read-only diagnosis for one (chunk, query) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkDiagnosis {
    pub primary_failure_mode: FailureMode,
    /// 0–100 confidence in the diagnosis.
    pub confidence: f64,
    pub missing_facets: Vec<String>,
    pub present_strengths: Vec<String>,
    pub recommended_fix: String,
    pub fix_priority: FixPriority,
    /// Approximate passage-score points the fix is expected to recover.
    pub expected_improvement: f64,
}

/// Combine the three scorer outputs into the composite passage score.
pub fn passage_score(
    retrieval: f64,
    rerank: f64,
    citation: f64,
    weights: &ScoringWeights,
) -> f64 {
    (retrieval * weights.retrieval_weight
        + rerank * weights.rerank_weight
        + citation * weights.citation_weight)
        .round()
}

/// Diagnose the primary failure mode for a scored chunk.
///
/// Rule order matters: a true topic mismatch (rule 2) cannot be fixed by
/// rewriting the chunk, so it preempts every content-level diagnosis, and
/// a chunk that already retrieves and reranks well (rule 1) preempts
/// everything.
pub fn diagnose(
    semantic: f64,
    lexical: &LexicalScore,
    hybrid: f64,
    rerank: &RerankScore,
    citation: &CitationScore,
) -> ChunkDiagnosis {
    let missing_facets = collect_missing_facets(lexical, rerank, citation);
    let present_strengths = collect_present_strengths(rerank, citation);

    let (mode, priority, confidence, expected_improvement, fix) = if hybrid >= 75.0
        && rerank.score >= 70.0
    {
        (
            FailureMode::AlreadyOptimized,
            FixPriority::None,
            90.0,
            0.0,
            "No changes needed; the chunk retrieves and reranks well.".to_string(),
        )
    } else if semantic < 50.0 && lexical.score < 40.0 {
        (
            FailureMode::TopicMismatch,
            FixPriority::Critical,
            85.0,
            5.0,
            "The chunk is about a different topic; cover the query in dedicated content instead of rewriting this chunk.".to_string(),
        )
    } else if semantic >= 50.0 && lexical.score < 40.0 {
        (
            FailureMode::VocabularyGap,
            FixPriority::Important,
            80.0,
            15.0,
            format!(
                "The topic matches but the wording does not; work the query terms ({}) into the chunk.",
                lexical.missing_terms.join(", ")
            ),
        )
    } else if rerank.direct_answer.has_direct_answer
        && rerank.direct_answer.answer_position.unwrap_or(0) > BURIED_ANSWER_CHARS
    {
        (
            FailureMode::BuriedAnswer,
            FixPriority::Important,
            75.0,
            20.0,
            "Move the answer into the first sentence or two; it currently appears too late to be picked up.".to_string(),
        )
    } else if !rerank.direct_answer.has_direct_answer {
        (
            FailureMode::NoDirectAnswer,
            FixPriority::Critical,
            80.0,
            25.0,
            "Open the chunk with a direct, standalone answer to the query.".to_string(),
        )
    } else if citation.attributability.score < 40.0 {
        (
            FailureMode::MissingSpecifics,
            FixPriority::Important,
            70.0,
            15.0,
            "Replace vague generalizations with specific, attributable claims (numbers, dates, named sources).".to_string(),
        )
    } else if rerank.structural_clarity.score < 50.0 {
        (
            FailureMode::StructureProblem,
            FixPriority::Minor,
            65.0,
            10.0,
            "Add structure: a descriptive heading, a list or steps, or an explicit definition.".to_string(),
        )
    } else {
        (
            FailureMode::MissingSpecifics,
            FixPriority::Minor,
            50.0,
            5.0,
            "Tighten the chunk with more specific, quotable claims.".to_string(),
        )
    };

    ChunkDiagnosis {
        primary_failure_mode: mode,
        confidence,
        missing_facets,
        present_strengths,
        recommended_fix: fix,
        fix_priority: priority,
        expected_improvement,
    }
}

fn collect_missing_facets(
    lexical: &LexicalScore,
    rerank: &RerankScore,
    citation: &CitationScore,
) -> Vec<String> {
    let mut facets = Vec::new();
    for term in &lexical.missing_terms {
        facets.push(format!("term:{}", term));
    }
    for entity in &rerank.entity_prominence.missing {
        facets.push(format!("entity:{}", entity));
    }
    if !rerank.direct_answer.has_direct_answer {
        facets.push("direct_answer".to_string());
    }
    if citation.attributability.specific_sentences == 0 {
        facets.push("specific_claims".to_string());
    }
    facets
}

fn collect_present_strengths(rerank: &RerankScore, citation: &CitationScore) -> Vec<String> {
    let mut strengths = Vec::new();
    if !rerank.entity_prominence.found_in_heading.is_empty() {
        strengths.push("entities_in_heading".to_string());
    }
    if rerank.direct_answer.has_direct_answer {
        strengths.push("direct_answer".to_string());
    }
    if rerank.structural_clarity.score >= 50.0 {
        strengths.push("clear_structure".to_string());
    }
    if citation.attributability.score >= 60.0 {
        strengths.push("specific_claims".to_string());
    }
    if !citation.citation_format.quotable_sentences.is_empty() {
        strengths.push("quotable_sentences".to_string());
    }
    strengths
}
