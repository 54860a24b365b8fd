//! End-to-end tests: chunking a document and scoring the chunks through
//! the full pipeline, plus configuration loading from disk.

use std::fs;
use tempfile::TempDir;

use passage_lens::chunker::create_layout_aware_chunks;
use passage_lens::config::{load_config, ChunkerOptions, Config, ScoringWeights};
use passage_lens::diagnosis::FailureMode;
use passage_lens::models::estimate_tokens;
use passage_lens::pipeline::{score_chunk, score_document, FixedSimilarity, TableSimilarity};
use passage_lens::retrieval::NEUTRAL_SCORE;

/// A sentence of exactly `tokens` estimated tokens (tokens * 4 chars).
fn sentence_of_tokens(tokens: usize, idx: usize) -> String {
    let target_chars = tokens * 4;
    let mut s = format!("Calibrated filler sentence number {:04} carries padding words", idx);
    while s.len() < target_chars - 1 {
        s.push_str(" pad");
    }
    s.truncate(target_chars - 1);
    s.push('.');
    assert_eq!(s.len(), target_chars);
    s
}

#[test]
fn test_chunking_heading_scoped_sections() {
    let doc = "\
# Guide

Introduction paragraph for the guide.

## Setup

Install the tool and configure it.

## Usage

Run the tool against your documents.
";
    let chunks = create_layout_aware_chunks(doc, &ChunkerOptions::default());
    assert_eq!(chunks.len(), 3);
    assert_eq!(chunks[0].heading_path, vec!["Guide"]);
    assert_eq!(chunks[1].heading_path, vec!["Guide", "Setup"]);
    assert_eq!(chunks[2].heading_path, vec!["Guide", "Usage"]);
    assert!(chunks[1].text.starts_with("# Guide\n\n## Setup"));
}

#[test]
fn test_oversized_section_splits_into_four_budgeted_chunks() {
    // 20 sentences of exactly 100 tokens: a 2000-token body against a
    // 500-token budget packs 5 sentences per chunk, 4 chunks total.
    let body: Vec<String> = (0..20).map(|i| sentence_of_tokens(100, i)).collect();
    let doc = format!("# Big Section\n\n{}", body.join(" "));
    let options = ChunkerOptions {
        max_chunk_size: 500,
        chunk_overlap: 50,
        cascade_headings: true,
    };

    let chunks = create_layout_aware_chunks(&doc, &options);
    assert_eq!(chunks.len(), 4);
    for (i, chunk) in chunks.iter().enumerate() {
        assert_eq!(chunk.id, format!("0.{}", i));
        assert!(chunk.metadata.token_estimate <= 500);
        assert!(chunk.text.starts_with("# Big Section"));
    }
    // Overlap: each later chunk opens with the previous chunk's last sentence.
    for pair in chunks.windows(2) {
        let prev_last = pair[0]
            .text_without_cascade
            .split("\n\n")
            .last()
            .unwrap()
            .to_string();
        assert!(pair[1].text_without_cascade.starts_with(&prev_last));
    }
}

#[test]
fn test_zero_overlap_rejoins_to_original_body() {
    let body: Vec<String> = (0..12).map(|i| sentence_of_tokens(60, i)).collect();
    let body = body.join(" ");
    let doc = format!("# Big\n\n{}", body);
    let options = ChunkerOptions {
        max_chunk_size: 200,
        chunk_overlap: 0,
        cascade_headings: false,
    };
    let chunks = create_layout_aware_chunks(&doc, &options);
    assert!(chunks.len() > 1);
    let strip = |s: &str| s.chars().filter(|c| !c.is_whitespace()).collect::<String>();
    let rejoined: String = chunks.iter().map(|c| c.text_without_cascade.as_str()).collect();
    assert_eq!(strip(&rejoined), strip(&body));
}

#[test]
fn test_chunking_is_deterministic() {
    let doc = "# A\n\nFirst paragraph of prose.\n\n- bullet one\n- bullet two\n\n## B\n\nSecond body.";
    let a = create_layout_aware_chunks(doc, &ChunkerOptions::default());
    let b = create_layout_aware_chunks(doc, &ChunkerOptions::default());
    assert_eq!(a.len(), b.len());
    for (x, y) in a.iter().zip(b.iter()) {
        assert_eq!(x.id, y.id);
        assert_eq!(x.hash, y.hash);
        assert_eq!(x.metadata.token_estimate, y.metadata.token_estimate);
    }
}

#[test]
fn test_entity_in_heading_outranks_buried_mention() {
    let doc = "\
# Python Performance

Python is slow for numerical computing because the interpreter executes \
bytecode without native vectorization.

# Deployment Notes

Our service ships weekly. Among other things the runtime uses Python \
somewhere deep in the build tooling.
";
    let chunks = create_layout_aware_chunks(doc, &ChunkerOptions::default());
    let reports = score_document(
        &chunks,
        &["Why is Python slow for numerical computing?".to_string()],
        &FixedSimilarity(NEUTRAL_SCORE),
        &ScoringWeights::default(),
    );
    let report = &reports[0];
    assert_eq!(report.chunks[0].heading_path, vec!["Python Performance"]);
    assert!(
        report.chunks[0].rerank.entity_prominence.score
            > report.chunks[1].rerank.entity_prominence.score
    );
    assert!(report.chunks[0].passage_score > report.chunks[1].passage_score);
}

#[test]
fn test_topic_mismatch_diagnosed() {
    let doc = "# Gardening\n\nTomatoes ripen fastest in full sun with consistent watering.";
    let chunks = create_layout_aware_chunks(doc, &ChunkerOptions::default());
    let report = score_chunk(
        &chunks[0],
        "how does transformer attention scale",
        20.0,
        &ScoringWeights::default(),
    );
    assert!(report.lexical.score < 40.0);
    assert_eq!(
        report.diagnosis.primary_failure_mode,
        FailureMode::TopicMismatch
    );
}

#[test]
fn test_scoring_is_total_and_bounded() {
    let docs = [
        "",
        "\n\n\n",
        "# Only a heading",
        "plain text no structure",
        "# H\n\nBody.",
    ];
    let weights = ScoringWeights::default();
    for doc in docs {
        let chunks = create_layout_aware_chunks(doc, &ChunkerOptions::default());
        for query in ["", "a query", "???"] {
            for chunk in &chunks {
                let report = score_chunk(chunk, query, 0.5, &weights);
                for score in [
                    report.semantic,
                    report.lexical.score,
                    report.retrieval,
                    report.rerank.score,
                    report.citation.score,
                    report.passage_score,
                ] {
                    assert!(
                        (0.0..=100.0).contains(&score),
                        "score {} out of range for doc {:?} query {:?}",
                        score,
                        doc,
                        query
                    );
                }
            }
        }
    }
}

#[test]
fn test_empty_query_scores_neutral_lexical() {
    let chunks =
        create_layout_aware_chunks("# H\n\nSome body text.", &ChunkerOptions::default());
    let report = score_chunk(&chunks[0], "", 0.5, &ScoringWeights::default());
    assert_eq!(report.lexical.score, NEUTRAL_SCORE);
}

#[test]
fn test_table_similarity_drives_ranking() {
    let doc = "# First\n\nAlpha body content here.\n\n# Second\n\nBeta body content here.";
    let chunks = create_layout_aware_chunks(doc, &ChunkerOptions::default());
    let query = "unrelated query words".to_string();

    let mut provider = TableSimilarity::new(0.1);
    provider.insert(&chunks[1].id, &query, 0.95);

    let reports = score_document(&chunks, &[query], &provider, &ScoringWeights::default());
    assert_eq!(reports[0].chunks[0].chunk_id, chunks[1].id);
    assert_eq!(reports[0].chunks[0].semantic, 95.0);
}

#[test]
fn test_token_estimate_matches_heuristic() {
    assert_eq!(estimate_tokens(""), 0);
    assert_eq!(estimate_tokens("abcd"), 1);
    assert_eq!(estimate_tokens("abcde"), 2);
    let chunks =
        create_layout_aware_chunks("# H\n\nfour char body", &ChunkerOptions::default());
    assert_eq!(
        chunks[0].metadata.token_estimate,
        estimate_tokens("four char body")
    );
}

#[test]
fn test_load_config_from_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("plens.toml");
    fs::write(
        &path,
        r#"
[chunking]
max_chunk_size = 256
chunk_overlap = 32

[scoring]
semantic_weight = 0.6
lexical_weight = 0.4
"#,
    )
    .unwrap();

    let config = load_config(&path).unwrap();
    assert_eq!(config.chunking.max_chunk_size, 256);
    assert_eq!(config.chunking.chunk_overlap, 32);
    assert!(config.chunking.cascade_headings);
    assert!((config.scoring.semantic_weight - 0.6).abs() < 1e-9);
    assert!((config.scoring.retrieval_weight - 0.40).abs() < 1e-9);
}

#[test]
fn test_load_config_rejects_bad_weights() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("plens.toml");
    fs::write(
        &path,
        r#"
[scoring]
semantic_weight = 0.9
lexical_weight = 0.9
"#,
    )
    .unwrap();
    assert!(load_config(&path).is_err());
}

#[test]
fn test_default_config_is_usable_end_to_end() {
    let config = Config::default();
    let chunks = create_layout_aware_chunks(
        "# Chunking\n\nChunking is a splitting technique that caps chunk size.",
        &config.chunking,
    );
    let reports = score_document(
        &chunks,
        &["what is chunking".to_string()],
        &FixedSimilarity(NEUTRAL_SCORE),
        &config.scoring,
    );
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].chunks.len(), 1);
    assert!(reports[0].chunks[0].passage_score > 0.0);
}
