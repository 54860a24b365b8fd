//! # Passage Lens
//!
//! Layout-aware document chunking and multi-signal relevance scoring for
//! retrieval-augmented generation.
//!
//! Passage Lens splits markdown documents into heading-scoped, token-budgeted
//! chunks and scores each chunk against a query along three axes: hybrid
//! retrieval (semantic + lexical), reranking (entity prominence, direct
//! answers, restatement, structure), and citation-worthiness
//! (attributability, evidence, quotability). A diagnosis layer folds the
//! three into a single passage score and names the primary failure mode.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌───────────┐   ┌───────────────────────────┐
//! │ Markdown │──▶│  Chunker  │──▶│         Scorers           │
//! │ document │   │ sections+ │   │ retrieval/rerank/citation │
//! └──────────┘   │  budgets  │   └─────────────┬─────────────┘
//!                └───────────┘                 │
//!                                              ▼
//!                 ┌──────────┐        ┌─────────────────┐
//!                 │   CLI    │◀───────│    Diagnosis    │
//!                 │ (plens)  │        │ score + failure │
//!                 └──────────┘        └─────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! plens chunk docs/guide.md --json
//! plens score docs/guide.md --query "how does chunk overlap work" --diagnose
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types and token estimation |
//! | [`sentence`] | Sentence and clause segmentation |
//! | [`chunker`] | Layout-aware markdown chunking |
//! | [`entities`] | Query tokenization and entity extraction |
//! | [`retrieval`] | Lexical and hybrid retrieval scoring |
//! | [`rerank`] | Rerank scoring signals |
//! | [`citation`] | Citation-worthiness scoring |
//! | [`diagnosis`] | Composite passage score and failure diagnosis |
//! | [`pipeline`] | Document-level scoring pipeline |
//! | [`observer`] | Chunking progress observers |

pub mod chunker;
pub mod citation;
pub mod config;
pub mod diagnosis;
pub mod entities;
pub mod models;
pub mod observer;
pub mod pipeline;
pub mod rerank;
pub mod retrieval;
pub mod sentence;
