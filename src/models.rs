//! Core data models for chunking and scoring.
//!
//! These types represent the headings, body elements, sections, and chunks
//! that flow from the markdown parser through the scoring pipeline. All of
//! them are plain immutable values: the chunker builds them in one pass and
//! the scorers only ever read them.

use serde::{Deserialize, Serialize};

/// Approximate characters-per-token ratio.
///
/// A rough heuristic (4 chars ≈ 1 token). Every downstream threshold in the
/// scoring pipeline is calibrated against this estimate, so swapping in a
/// real tokenizer would require recalibrating all of them.
pub const CHARS_PER_TOKEN: usize = 4;

/// Estimate the token count of a text: `ceil(chars / 4)`.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(CHARS_PER_TOKEN)
}

/// A markdown heading encountered while scanning the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadingInfo {
    /// Heading depth, 1–6 (the number of leading `#` characters).
    pub level: u8,
    /// Heading text without the `#` markers.
    pub text: String,
}

/// The layout role of a body element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyElementKind {
    Paragraph,
    List,
    Table,
    Blockquote,
    Code,
}

/// A block-level element of a section's body.
///
/// Owned exclusively by the [`Section`] that contains it; never mutated
/// after parsing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BodyElement {
    pub kind: BodyElementKind,
    /// Raw text of the element, trailing whitespace trimmed.
    pub content: String,
    /// Estimated token count of `content`.
    pub tokens: usize,
    /// First source line of the element (0-based).
    pub line_start: usize,
    /// Last source line of the element (0-based, inclusive).
    pub line_end: usize,
}

/// A run of body elements under one cascading heading stack.
///
/// The `headings` stack runs outer→inner and is monotonically increasing in
/// depth: when a same-or-shallower heading appears in the document, deeper
/// levels are popped before the new heading is pushed. Sections with no
/// body elements are dropped by the parser and never chunked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    pub headings: Vec<HeadingInfo>,
    pub body: Vec<BodyElement>,
    /// Sum of the body elements' token estimates.
    pub body_tokens: usize,
    pub line_start: usize,
    pub line_end: usize,
}

/// Derived metadata attached to every chunk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Whether a heading cascade was prepended to the body.
    pub has_cascade: bool,
    /// Levels of the headings on the cascade path, outer→inner.
    pub heading_levels: Vec<u8>,
    /// Whitespace-separated word count of the full chunk text.
    pub word_count: usize,
    /// Character count of the full chunk text.
    pub char_count: usize,
    /// Token estimate of the body only. Cascade tokens are free and never
    /// count against the chunk size budget.
    pub token_estimate: usize,
    /// Token estimate of the cascade prefix (0 when there is none).
    pub cascade_tokens: usize,
}

/// The chunking engine's output unit.
///
/// Created in one pass from [`Section`]s and consumed read-only by every
/// scorer. Ids are deterministic (`"<section>.<part>"`) so identical input
/// and options always yield byte-identical chunk sequences.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutAwareChunk {
    pub id: String,
    /// Cascade (if any) followed by the body, joined by blank lines.
    pub text: String,
    /// The body alone, without the heading cascade.
    pub text_without_cascade: String,
    /// Heading texts from the document root to the owning section's leaf.
    pub heading_path: Vec<String>,
    /// `(start, end)` source lines covered by the owning section (0-based,
    /// end inclusive).
    pub source_lines: (usize, usize),
    /// SHA-256 of `text`, for staleness detection by embedding callers.
    pub hash: String,
    pub metadata: ChunkMetadata,
}

/// A sentence-like unit produced by the segmenter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sentence {
    /// Sentence text with leading list/heading markers stripped.
    pub text: String,
    /// Ordinal position within the segmented text, starting at 0.
    pub index: usize,
    /// Character offset of the sentence start in the original input.
    pub char_start: usize,
    /// Character offset one past the sentence end in the original input.
    pub char_end: usize,
    /// Whitespace-separated word count of `text`.
    pub word_count: usize,
}
