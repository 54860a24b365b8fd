//! End-to-end scoring pipeline: chunk a document, score every chunk
//! against every query, and bundle the results into per-query reports.
//!
//! Semantic similarity comes from outside the crate through the
//! [`SemanticSimilarity`] trait; the pipeline never computes embeddings.
//! Callers without a provider get [`FixedSimilarity`] with the neutral
//! similarity, which keeps scores meaningful on the lexical axis alone.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::citation::{calculate_citation_score, CitationScore};
use crate::config::ScoringWeights;
use crate::diagnosis::{diagnose, passage_score, ChunkDiagnosis, ScoreBand};
use crate::models::LayoutAwareChunk;
use crate::rerank::{calculate_rerank_score, RerankScore};
use crate::retrieval::{
    calculate_lexical_score, hybrid_retrieval, normalize_semantic, LexicalScore, NEUTRAL_SCORE,
};

/// Source of semantic similarity between a chunk and a query.
///
/// Implementations typically wrap an embedding model or a precomputed
/// similarity matrix. Values may be cosine-style (0–1) or percentages
/// (0–100); the pipeline normalizes either onto 0–100.
pub trait SemanticSimilarity {
    fn similarity(&self, chunk: &LayoutAwareChunk, query: &str) -> f64;
}

/// Returns the same similarity for every (chunk, query) pair.
pub struct FixedSimilarity(pub f64);

impl SemanticSimilarity for FixedSimilarity {
    fn similarity(&self, _chunk: &LayoutAwareChunk, _query: &str) -> f64 {
        self.0
    }
}

impl Default for FixedSimilarity {
    fn default() -> Self {
        FixedSimilarity(NEUTRAL_SCORE)
    }
}

/// Looks up similarities by (chunk id, query), with a fallback default.
///
/// Useful for replaying similarities produced by an external embedding
/// run, and for tests.
pub struct TableSimilarity {
    scores: HashMap<(String, String), f64>,
    default: f64,
}

impl TableSimilarity {
    pub fn new(default: f64) -> Self {
        TableSimilarity {
            scores: HashMap::new(),
            default,
        }
    }

    pub fn insert(&mut self, chunk_id: &str, query: &str, similarity: f64) {
        self.scores
            .insert((chunk_id.to_string(), query.to_string()), similarity);
    }
}

impl SemanticSimilarity for TableSimilarity {
    fn similarity(&self, chunk: &LayoutAwareChunk, query: &str) -> f64 {
        self.scores
            .get(&(chunk.id.clone(), query.to_string()))
            .copied()
            .unwrap_or(self.default)
    }
}

/// Full scoring breakdown for one (chunk, query) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkReport {
    pub chunk_id: String,
    pub heading_path: Vec<String>,
    /// Normalized semantic similarity, 0–100.
    pub semantic: f64,
    pub lexical: LexicalScore,
    /// Hybrid retrieval score blending semantic and lexical.
    pub retrieval: f64,
    pub rerank: RerankScore,
    pub citation: CitationScore,
    /// Composite 0–100 passage score.
    pub passage_score: f64,
    pub band: ScoreBand,
    pub diagnosis: ChunkDiagnosis,
}

/// All chunk reports for one query, ordered by descending passage score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryReport {
    pub query: String,
    pub chunks: Vec<ChunkReport>,
}

/// Score a single chunk against a single query.
///
/// `semantic_raw` is whatever the provider reported; it is normalized
/// here so providers can return 0–1 or 0–100 interchangeably.
pub fn score_chunk(
    chunk: &LayoutAwareChunk,
    query: &str,
    semantic_raw: f64,
    weights: &ScoringWeights,
) -> ChunkReport {
    let semantic = normalize_semantic(semantic_raw);
    let lexical =
        calculate_lexical_score(&chunk.text, &chunk.text_without_cascade, query, &chunk.heading_path);
    let retrieval = hybrid_retrieval(semantic, lexical.score, weights);
    let rerank = calculate_rerank_score(
        &chunk.text,
        &chunk.text_without_cascade,
        query,
        &chunk.heading_path,
        weights,
    );
    let citation = calculate_citation_score(&chunk.text, &chunk.text_without_cascade, weights);
    let passage = passage_score(retrieval, rerank.score, citation.score, weights);
    let diagnosis = diagnose(semantic, &lexical, retrieval, &rerank, &citation);

    ChunkReport {
        chunk_id: chunk.id.clone(),
        heading_path: chunk.heading_path.clone(),
        semantic,
        lexical,
        retrieval,
        rerank,
        citation,
        passage_score: passage,
        band: ScoreBand::from_score(passage),
        diagnosis,
    }
}

/// Score every chunk against every query.
///
/// Chunks within each report are sorted by descending passage score,
/// ties broken by chunk id so output is deterministic.
pub fn score_document(
    chunks: &[LayoutAwareChunk],
    queries: &[String],
    provider: &dyn SemanticSimilarity,
    weights: &ScoringWeights,
) -> Vec<QueryReport> {
    queries
        .iter()
        .map(|query| {
            let mut reports: Vec<ChunkReport> = chunks
                .iter()
                .map(|chunk| score_chunk(chunk, query, provider.similarity(chunk, query), weights))
                .collect();
            reports.sort_by(|a, b| {
                b.passage_score
                    .partial_cmp(&a.passage_score)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| a.chunk_id.cmp(&b.chunk_id))
            });
            QueryReport {
                query: query.clone(),
                chunks: reports,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunker::create_layout_aware_chunks;
    use crate::config::ChunkerOptions;

    fn sample_chunks() -> Vec<LayoutAwareChunk> {
        let doc = "# Chunking\n\nChunking is a technique that splits documents into \
                   retrieval-sized pieces. It typically improves recall by 30%.\n\n\
                   # Gardening\n\nTomatoes grow best in full sun with regular watering.\n";
        create_layout_aware_chunks(doc, &ChunkerOptions::default())
    }

    #[test]
    fn test_score_chunk_is_total_on_empty_query() {
        let chunks = sample_chunks();
        let report = score_chunk(&chunks[0], "", 0.0, &ScoringWeights::default());
        assert!(report.passage_score >= 0.0 && report.passage_score <= 100.0);
        assert_eq!(report.lexical.score, NEUTRAL_SCORE);
    }

    #[test]
    fn test_relevant_chunk_outscores_irrelevant() {
        let chunks = sample_chunks();
        let weights = ScoringWeights::default();
        let provider = FixedSimilarity(NEUTRAL_SCORE);
        let reports = score_document(
            &chunks,
            &["what is chunking".to_string()],
            &provider,
            &weights,
        );
        assert_eq!(reports.len(), 1);
        let top = &reports[0].chunks[0];
        assert!(top.heading_path.contains(&"Chunking".to_string()));
        assert!(top.passage_score > reports[0].chunks.last().unwrap().passage_score);
    }

    #[test]
    fn test_table_similarity_overrides_default() {
        let chunks = sample_chunks();
        let mut provider = TableSimilarity::new(10.0);
        provider.insert(&chunks[0].id, "q", 0.9);
        assert_eq!(provider.similarity(&chunks[0], "q"), 0.9);
        assert_eq!(provider.similarity(&chunks[0], "other"), 10.0);
    }

    #[test]
    fn test_semantic_normalized_in_report() {
        let chunks = sample_chunks();
        let report = score_chunk(&chunks[0], "chunking", 0.8, &ScoringWeights::default());
        assert_eq!(report.semantic, 80.0);
    }

    #[test]
    fn test_reports_sorted_descending() {
        let chunks = sample_chunks();
        let reports = score_document(
            &chunks,
            &["tomatoes sun".to_string()],
            &FixedSimilarity(NEUTRAL_SCORE),
            &ScoringWeights::default(),
        );
        let scores: Vec<f64> = reports[0].chunks.iter().map(|c| c.passage_score).collect();
        let mut sorted = scores.clone();
        sorted.sort_by(|a, b| b.partial_cmp(a).unwrap());
        assert_eq!(scores, sorted);
    }
}
