//! # Passage Lens CLI (`plens`)
//!
//! The `plens` binary chunks markdown documents and scores the chunks
//! against retrieval queries.
//!
//! ## Usage
//!
//! ```bash
//! plens --config ./plens.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `plens chunk <file>` | Chunk a markdown file and print the chunks |
//! | `plens score <file> --query "<q>"` | Score every chunk against one or more queries |
//!
//! ## Examples
//!
//! ```bash
//! # Chunk a document, human-readable
//! plens chunk docs/guide.md
//!
//! # Chunk with machine-readable output
//! plens chunk docs/guide.md --json
//!
//! # Score against a query, with diagnosis
//! plens score docs/guide.md --query "how does chunk overlap work" --diagnose
//!
//! # Replay an externally computed semantic similarity
//! plens score docs/guide.md --query "token budgets" --semantic 0.82 --json
//! ```

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use passage_lens::chunker::create_layout_aware_chunks_observed;
use passage_lens::config::{self, Config};
use passage_lens::diagnosis::ScoreBand;
use passage_lens::observer::ObserverMode;
use passage_lens::pipeline::{score_document, FixedSimilarity};
use passage_lens::retrieval::NEUTRAL_SCORE;

/// Passage Lens CLI — layout-aware chunking and multi-signal relevance
/// scoring for retrieval-augmented generation.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file; without one, built-in defaults are used.
#[derive(Parser)]
#[command(
    name = "plens",
    about = "Passage Lens — layout-aware chunking and relevance scoring for RAG",
    version,
    long_about = "Passage Lens splits markdown documents into heading-scoped, token-budgeted \
    chunks and scores each chunk against a query along retrieval, rerank, and citation axes, \
    with an optional diagnosis of why a chunk underperforms."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Chunking options and scoring weights are read from this file.
    /// Omit it to use the built-in defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Chunking diagnostics: `off`, `human`, or `json` (both on stderr).
    ///
    /// Defaults to `human` when stderr is a terminal, `off` otherwise.
    #[arg(long, global = true)]
    observer: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Chunk a markdown file.
    ///
    /// Parses the document into heading-scoped sections, splits oversized
    /// sections under the token budget with overlap, and prints the
    /// resulting chunks.
    Chunk {
        /// Path to the markdown file.
        file: PathBuf,

        /// Print chunks as a JSON array on stdout.
        #[arg(long)]
        json: bool,
    },

    /// Score a file's chunks against one or more queries.
    ///
    /// Chunks the file, then scores every chunk against every query and
    /// prints per-query reports ordered by descending passage score.
    Score {
        /// Path to the markdown file.
        file: PathBuf,

        /// Query to score against. Repeat for multiple queries.
        #[arg(long, required = true)]
        query: Vec<String>,

        /// Semantic similarity to use for every chunk (0–1 or 0–100).
        ///
        /// This crate computes no embeddings; pass a similarity from an
        /// external provider here, or omit it to score on a neutral 50.
        #[arg(long)]
        semantic: Option<f64>,

        /// Print reports as JSON on stdout.
        #[arg(long)]
        json: bool,

        /// Include the failure-mode diagnosis in human output.
        #[arg(long)]
        diagnose: bool,
    },
}

fn parse_observer_mode(arg: Option<&str>) -> Result<ObserverMode> {
    match arg {
        None => Ok(ObserverMode::default_for_tty()),
        Some("off") => Ok(ObserverMode::Off),
        Some("human") => Ok(ObserverMode::Human),
        Some("json") => Ok(ObserverMode::Json),
        Some(other) => bail!("unknown observer mode '{}' (expected off, human, or json)", other),
    }
}

fn load_config_or_default(path: Option<&PathBuf>) -> Result<Config> {
    match path {
        Some(path) => config::load_config(path),
        None => Ok(Config::default()),
    }
}

fn read_document(path: &PathBuf) -> Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read document: {}", path.display()))
}

fn band_label(band: ScoreBand) -> &'static str {
    match band {
        ScoreBand::Strong => "strong",
        ScoreBand::NeedsWork => "needs work",
        ScoreBand::Gap => "gap",
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = load_config_or_default(cli.config.as_ref())?;
    let observer_mode = parse_observer_mode(cli.observer.as_deref())?;
    let observer = observer_mode.observer();

    match cli.command {
        Commands::Chunk { file, json } => {
            let content = read_document(&file)?;
            let chunks =
                create_layout_aware_chunks_observed(&content, &cfg.chunking, observer.as_ref());

            if json {
                println!("{}", serde_json::to_string_pretty(&chunks)?);
            } else {
                for chunk in &chunks {
                    println!(
                        "[{}] {}  ({} tokens, lines {}-{})",
                        chunk.id,
                        chunk.heading_path.join(" > "),
                        chunk.metadata.token_estimate,
                        chunk.source_lines.0,
                        chunk.source_lines.1
                    );
                    println!("{}", chunk.text);
                    println!();
                }
                println!("{} chunks", chunks.len());
            }
        }

        Commands::Score {
            file,
            query,
            semantic,
            json,
            diagnose,
        } => {
            let content = read_document(&file)?;
            let chunks =
                create_layout_aware_chunks_observed(&content, &cfg.chunking, observer.as_ref());
            let provider = FixedSimilarity(semantic.unwrap_or(NEUTRAL_SCORE));
            let reports = score_document(&chunks, &query, &provider, &cfg.scoring);

            if json {
                println!("{}", serde_json::to_string_pretty(&reports)?);
            } else {
                for report in &reports {
                    println!("query: {}", report.query);
                    for chunk in &report.chunks {
                        println!(
                            "  [{}] passage {:>3}  ({})  retrieval {:.0}  rerank {:.0}  citation {:.0}",
                            chunk.chunk_id,
                            chunk.passage_score,
                            band_label(chunk.band),
                            chunk.retrieval,
                            chunk.rerank.score,
                            chunk.citation.score
                        );
                        if diagnose {
                            println!(
                                "      {:?} (confidence {:.0}, {:?}, expected +{:.0})",
                                chunk.diagnosis.primary_failure_mode,
                                chunk.diagnosis.confidence,
                                chunk.diagnosis.fix_priority,
                                chunk.diagnosis.expected_improvement
                            );
                            println!("      fix: {}", chunk.diagnosis.recommended_fix);
                        }
                    }
                    println!();
                }
            }
        }
    }

    Ok(())
}
