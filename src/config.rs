use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration: chunking options and scoring weights.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub chunking: ChunkerOptions,
    #[serde(default)]
    pub scoring: ScoringWeights,
}

/// Options controlling the layout-aware chunker.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ChunkerOptions {
    /// Body-token budget per chunk. Cascade and overlap-seed tokens are
    /// context and do not count against it.
    #[serde(default = "default_max_chunk_size")]
    pub max_chunk_size: usize,
    /// Token overlap carried between consecutive chunks of a split section.
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
    /// Whether to prepend the heading cascade to each chunk.
    #[serde(default = "default_cascade_headings")]
    pub cascade_headings: bool,
}

fn default_max_chunk_size() -> usize {
    512
}
fn default_chunk_overlap() -> usize {
    50
}
fn default_cascade_headings() -> bool {
    true
}

impl Default for ChunkerOptions {
    fn default() -> Self {
        Self {
            max_chunk_size: default_max_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            cascade_headings: default_cascade_headings(),
        }
    }
}

/// Canonical scoring weights for the hybrid, rerank, citation, and passage
/// combinations. Each group must sum to 1.0.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ScoringWeights {
    /// Hybrid retrieval: semantic share (lexical gets the remainder).
    #[serde(default = "default_semantic_weight")]
    pub semantic_weight: f64,
    #[serde(default = "default_lexical_weight")]
    pub lexical_weight: f64,

    /// Rerank sub-signal weights.
    #[serde(default = "default_entity_prominence_weight")]
    pub entity_prominence_weight: f64,
    #[serde(default = "default_direct_answer_weight")]
    pub direct_answer_weight: f64,
    #[serde(default = "default_structural_clarity_weight")]
    pub structural_clarity_weight: f64,
    #[serde(default = "default_query_restatement_weight")]
    pub query_restatement_weight: f64,

    /// Citation sub-signal weights.
    #[serde(default = "default_attributability_weight")]
    pub attributability_weight: f64,
    #[serde(default = "default_evidence_strength_weight")]
    pub evidence_strength_weight: f64,
    #[serde(default = "default_citation_format_weight")]
    pub citation_format_weight: f64,

    /// Passage composite weights.
    #[serde(default = "default_retrieval_weight")]
    pub retrieval_weight: f64,
    #[serde(default = "default_rerank_weight")]
    pub rerank_weight: f64,
    #[serde(default = "default_citation_weight")]
    pub citation_weight: f64,
}

fn default_semantic_weight() -> f64 {
    0.70
}
fn default_lexical_weight() -> f64 {
    0.30
}
fn default_entity_prominence_weight() -> f64 {
    0.35
}
fn default_direct_answer_weight() -> f64 {
    0.30
}
fn default_structural_clarity_weight() -> f64 {
    0.20
}
fn default_query_restatement_weight() -> f64 {
    0.15
}
fn default_attributability_weight() -> f64 {
    0.40
}
fn default_evidence_strength_weight() -> f64 {
    0.35
}
fn default_citation_format_weight() -> f64 {
    0.25
}
fn default_retrieval_weight() -> f64 {
    0.40
}
fn default_rerank_weight() -> f64 {
    0.35
}
fn default_citation_weight() -> f64 {
    0.25
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            semantic_weight: default_semantic_weight(),
            lexical_weight: default_lexical_weight(),
            entity_prominence_weight: default_entity_prominence_weight(),
            direct_answer_weight: default_direct_answer_weight(),
            structural_clarity_weight: default_structural_clarity_weight(),
            query_restatement_weight: default_query_restatement_weight(),
            attributability_weight: default_attributability_weight(),
            evidence_strength_weight: default_evidence_strength_weight(),
            citation_format_weight: default_citation_format_weight(),
            retrieval_weight: default_retrieval_weight(),
            rerank_weight: default_rerank_weight(),
            citation_weight: default_citation_weight(),
        }
    }
}

const WEIGHT_SUM_EPSILON: f64 = 1e-6;

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

/// Validate chunking bounds and scoring weight groups.
///
/// Invalid configuration is rejected here, before any chunking begins; the
/// chunker and scorers themselves are total and never fail.
pub fn validate(config: &Config) -> Result<()> {
    if config.chunking.max_chunk_size == 0 {
        anyhow::bail!("chunking.max_chunk_size must be > 0");
    }
    if config.chunking.chunk_overlap >= config.chunking.max_chunk_size {
        anyhow::bail!(
            "chunking.chunk_overlap ({}) must be < chunking.max_chunk_size ({})",
            config.chunking.chunk_overlap,
            config.chunking.max_chunk_size
        );
    }

    let w = &config.scoring;
    let groups: [(&str, f64); 4] = [
        ("semantic_weight + lexical_weight", w.semantic_weight + w.lexical_weight),
        (
            "rerank sub-signal weights",
            w.entity_prominence_weight
                + w.direct_answer_weight
                + w.structural_clarity_weight
                + w.query_restatement_weight,
        ),
        (
            "citation sub-signal weights",
            w.attributability_weight + w.evidence_strength_weight + w.citation_format_weight,
        ),
        (
            "passage composite weights",
            w.retrieval_weight + w.rerank_weight + w.citation_weight,
        ),
    ];
    for (name, sum) in groups {
        if (sum - 1.0).abs() > WEIGHT_SUM_EPSILON {
            anyhow::bail!("scoring: {} must sum to 1.0 (got {})", name, sum);
        }
    }

    Ok(())
}
