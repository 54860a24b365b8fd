//! Sentence and clause segmentation.
//!
//! Splits raw text into sentence-like units and queries into clauses. Every
//! scorer consumes these units, so segmentation must be deterministic: the
//! same input always yields the same sequence.
//!
//! # Strategy
//!
//! One splitting strategy is applied per input, chosen by a fixed ladder:
//!
//! 1. **Markdown structure** — if the text contains bold markers, bullet or
//!    numbered list items, or blank-line-separated blocks, split at blank
//!    lines and before each list-item line.
//! 2. **Terminal punctuation** — else split after `.`/`!`/`?` followed by
//!    whitespace or end-of-text. Numbered-list periods (`3.`) are protected
//!    and never treated as terminators.
//! 3. **Newlines** — else, if the text spans multiple lines, split per line.
//! 4. **Fallback** — the whole text is a single sentence.
//!
//! Produced sentences are stripped of leading list/heading/quote markers;
//! units with fewer than 2 words are discarded. Empty input yields an empty
//! sequence. Reported `char_start`/`char_end` offsets cover the raw segment
//! in the original input, before marker stripping.

use regex::Regex;
use std::sync::OnceLock;

use crate::models::Sentence;

static LIST_ITEM_RE: OnceLock<Regex> = OnceLock::new();
static LEADING_MARKER_RE: OnceLock<Regex> = OnceLock::new();
static CLAUSE_BOUNDARY_RE: OnceLock<Regex> = OnceLock::new();

fn list_item_re() -> &'static Regex {
    LIST_ITEM_RE.get_or_init(|| Regex::new(r"^\s*(?:[-*+]\s+|\d+[.)]\s+)").expect("list regex"))
}

fn leading_marker_re() -> &'static Regex {
    LEADING_MARKER_RE.get_or_init(|| {
        Regex::new(r"^(?:\s*(?:[-*+]\s+|\d+[.)]\s+|#{1,6}\s+|>\s*))+").expect("marker regex")
    })
}

/// Split text into ordered sentence-like units.
pub fn split_into_sentences(text: &str) -> Vec<Sentence> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let spans = if has_markdown_structure(text) {
        markdown_spans(text)
    } else if has_terminal_punctuation(text) {
        punctuation_spans(text)
    } else if text.contains('\n') {
        newline_spans(text)
    } else {
        vec![(0, text.chars().count())]
    };

    let chars: Vec<char> = text.chars().collect();
    let mut sentences = Vec::new();
    for (start, end) in spans {
        let raw: String = chars[start..end].iter().collect();
        let cleaned = strip_markers(&raw);
        let word_count = cleaned.split_whitespace().count();
        if word_count < 2 {
            continue;
        }
        sentences.push(Sentence {
            text: cleaned,
            index: sentences.len(),
            char_start: start,
            char_end: end,
            word_count,
        });
    }
    sentences
}

/// Split a query into clauses on commas, semicolons, and coordinating
/// conjunctions (and/or/but/while/when/if, word-boundary, case-insensitive).
///
/// Clauses under 2 words are discarded. If fewer than 2 clauses survive,
/// the whole trimmed query is returned as a single-element sequence.
pub fn split_query_into_clauses(query: &str) -> Vec<String> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    let re = CLAUSE_BOUNDARY_RE.get_or_init(|| {
        Regex::new(r"(?i)[,;]|\b(?:and|or|but|while|when|if)\b").expect("clause regex")
    });

    let clauses: Vec<String> = re
        .split(trimmed)
        .map(str::trim)
        .filter(|c| c.split_whitespace().count() >= 2)
        .map(str::to_string)
        .collect();

    if clauses.len() < 2 {
        vec![trimmed.to_string()]
    } else {
        clauses
    }
}

/// Strip leading list, heading, and blockquote markers from a unit.
pub fn strip_markers(text: &str) -> String {
    leading_marker_re().replace(text.trim(), "").trim().to_string()
}

fn has_markdown_structure(text: &str) -> bool {
    if text.contains("**") || text.contains("\n\n") {
        return true;
    }
    text.lines().any(|l| list_item_re().is_match(l))
}

fn has_terminal_punctuation(text: &str) -> bool {
    let chars: Vec<char> = text.chars().collect();
    for (i, &c) in chars.iter().enumerate() {
        if matches!(c, '.' | '!' | '?')
            && !is_list_number_period(&chars, i)
            && chars.get(i + 1).is_none_or(|n| n.is_whitespace())
        {
            return true;
        }
    }
    false
}

/// Split at blank lines and before each bullet/numbered list item line.
/// Spans are `(char_start, char_end)` pairs over the original text.
fn markdown_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut unit_start: Option<usize> = None;
    let mut offset = 0usize;
    let mut last_end = 0usize;

    for line in text.split('\n') {
        let line_chars = line.chars().count();
        let blank = line.trim().is_empty();
        let is_item = list_item_re().is_match(line);

        if blank {
            if let Some(start) = unit_start.take() {
                spans.push((start, last_end));
            }
        } else if is_item {
            // A list item always opens a fresh unit.
            if let Some(start) = unit_start.take() {
                spans.push((start, last_end));
            }
            unit_start = Some(offset);
            last_end = offset + line_chars;
        } else {
            if unit_start.is_none() {
                unit_start = Some(offset);
            }
            last_end = offset + line_chars;
        }
        offset += line_chars + 1; // account for the '\n'
    }
    if let Some(start) = unit_start {
        spans.push((start, last_end));
    }
    spans
}

/// Split after `.`/`!`/`?` followed by whitespace or end-of-text, with
/// numbered-list periods protected.
fn punctuation_spans(text: &str) -> Vec<(usize, usize)> {
    let chars: Vec<char> = text.chars().collect();
    let mut spans = Vec::new();
    let mut start = 0usize;

    for i in 0..chars.len() {
        let c = chars[i];
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }
        if c == '.' && is_list_number_period(&chars, i) {
            continue;
        }
        if chars.get(i + 1).is_none_or(|n| n.is_whitespace()) {
            spans.push((start, i + 1));
            start = i + 1;
        }
    }
    if start < chars.len() {
        spans.push((start, chars.len()));
    }
    spans
}

fn newline_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut offset = 0usize;
    for line in text.split('\n') {
        let len = line.chars().count();
        if !line.trim().is_empty() {
            spans.push((offset, offset + len));
        }
        offset += len + 1;
    }
    spans
}

/// True when the `.` at `idx` terminates a list number like `3.` — a digit
/// run that starts the text or follows whitespace.
fn is_list_number_period(chars: &[char], idx: usize) -> bool {
    if idx == 0 || !chars[idx - 1].is_ascii_digit() {
        return false;
    }
    let mut i = idx;
    while i > 0 && chars[i - 1].is_ascii_digit() {
        i -= 1;
    }
    i == 0 || chars[i - 1].is_whitespace()
}
