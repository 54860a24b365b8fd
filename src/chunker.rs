//! Layout-aware markdown chunker.
//!
//! Parses a markdown document into a heading hierarchy with body elements,
//! groups body content into sections under cascading headings, and splits
//! any section exceeding the token budget into overlapping sub-chunks.
//!
//! # Algorithm
//!
//! **Phase A — section parsing.** Lines are scanned once. A `#{1,6}` line
//! starts a new heading: the heading stack is popped while its top is at
//! the same or a deeper level, then the new heading is pushed; this closes
//! the current section. Other lines are parsed into body elements by
//! first-match-wins priority: fenced code → table → blockquote → list →
//! paragraph. Sections with no body elements are dropped.
//!
//! **Phase B — chunk assembly.** Each section gets a cascade string (its
//! heading stack rendered back to markdown) when `cascade_headings` is on.
//! A section within the `max_chunk_size` body-token budget becomes one
//! chunk. An oversized section is flattened into segments (small blocks and
//! list/table/code blocks kept whole, large prose split into sentences) and
//! the segments are accumulated greedily; each flush seeds the next chunk
//! with a trailing overlap buffer of at most `chunk_overlap` tokens.
//!
//! Cascade and overlap-seed tokens are context and never count against the
//! budget: `metadata.token_estimate` covers only a chunk's fresh body
//! content. Unterminated fences and lists are consumed to end-of-document;
//! chunking is total and never fails.

use regex::Regex;
use sha2::{Digest, Sha256};
use std::collections::VecDeque;
use std::sync::OnceLock;

use crate::config::ChunkerOptions;
use crate::models::{
    estimate_tokens, BodyElement, BodyElementKind, ChunkMetadata, HeadingInfo, LayoutAwareChunk,
    Section, CHARS_PER_TOKEN,
};
use crate::observer::{ChunkEvent, ChunkObserver, SilentObserver};
use crate::sentence::split_into_sentences;

/// Blocks at or under this many tokens are kept whole when splitting.
const WHOLE_BLOCK_TOKENS: usize = 100;

static HEADING_RE: OnceLock<Regex> = OnceLock::new();
static LIST_LINE_RE: OnceLock<Regex> = OnceLock::new();

fn heading_re() -> &'static Regex {
    HEADING_RE.get_or_init(|| Regex::new(r"^(#{1,6})\s+(.+)$").expect("heading regex"))
}

fn list_line_re() -> &'static Regex {
    LIST_LINE_RE.get_or_init(|| Regex::new(r"^\s*(?:[-*+]|\d+[.)])\s+").expect("list line regex"))
}

/// Chunk a markdown document into layout-aware, token-bounded chunks.
pub fn create_layout_aware_chunks(markdown: &str, options: &ChunkerOptions) -> Vec<LayoutAwareChunk> {
    create_layout_aware_chunks_observed(markdown, options, &SilentObserver)
}

/// Chunk a markdown document, reporting segmentation decisions to `observer`.
pub fn create_layout_aware_chunks_observed(
    markdown: &str,
    options: &ChunkerOptions,
    observer: &dyn ChunkObserver,
) -> Vec<LayoutAwareChunk> {
    let sections = parse_sections(markdown);
    let mut chunks = Vec::new();

    for (si, section) in sections.iter().enumerate() {
        let heading_path: Vec<String> = section.headings.iter().map(|h| h.text.clone()).collect();
        observer.observe(ChunkEvent::SectionClosed {
            heading_path: heading_path.clone(),
            body_tokens: section.body_tokens,
        });

        let cascade = if options.cascade_headings {
            build_cascade(&section.headings)
        } else {
            String::new()
        };

        if section.body_tokens <= options.max_chunk_size {
            let body_text = join_blocks(section.body.iter().map(|e| e.content.as_str()));
            let chunk = make_chunk(
                si,
                0,
                &cascade,
                body_text,
                section,
                &heading_path,
                section.body_tokens,
            );
            observer.observe(ChunkEvent::ChunkEmitted {
                id: chunk.id.clone(),
                token_estimate: chunk.metadata.token_estimate,
            });
            chunks.push(chunk);
        } else {
            observer.observe(ChunkEvent::SectionSplit {
                heading_path: heading_path.clone(),
                body_tokens: section.body_tokens,
                budget: options.max_chunk_size,
            });
            split_section(si, section, &cascade, &heading_path, options, observer, &mut chunks);
        }
    }

    chunks
}

/// Parse markdown into sections (Phase A). Public so callers can inspect
/// the layout tree without assembling chunks.
pub fn parse_sections(markdown: &str) -> Vec<Section> {
    let lines: Vec<&str> = markdown.lines().collect();
    let mut sections = Vec::new();
    let mut stack: Vec<HeadingInfo> = Vec::new();
    let mut body: Vec<BodyElement> = Vec::new();
    let mut section_start = 0usize;

    let mut i = 0;
    while i < lines.len() {
        let line = lines[i];
        if line.trim().is_empty() {
            i += 1;
            continue;
        }

        if let Some(heading) = parse_heading(line) {
            close_section(&mut sections, &stack, &mut body, section_start);
            while stack.last().is_some_and(|top| top.level >= heading.level) {
                stack.pop();
            }
            stack.push(heading);
            section_start = i;
            i += 1;
            continue;
        }

        let (element, next) = parse_body_element(&lines, i);
        body.push(element);
        i = next;
    }

    close_section(&mut sections, &stack, &mut body, section_start);
    sections
}

fn parse_heading(line: &str) -> Option<HeadingInfo> {
    heading_re().captures(line).map(|caps| HeadingInfo {
        level: caps[1].len() as u8,
        text: caps[2].trim().to_string(),
    })
}

/// Close the current section if it accumulated body elements. Sections
/// without body content are dropped, never chunked.
fn close_section(
    sections: &mut Vec<Section>,
    stack: &[HeadingInfo],
    body: &mut Vec<BodyElement>,
    section_start: usize,
) {
    if body.is_empty() {
        return;
    }
    let elements = std::mem::take(body);
    let body_tokens = elements.iter().map(|e| e.tokens).sum();
    let line_end = elements.last().map(|e| e.line_end).unwrap_or(section_start);
    sections.push(Section {
        headings: stack.to_vec(),
        body: elements,
        body_tokens,
        line_start: section_start,
        line_end,
    });
}

/// Parse one body element starting at line `i`, first-match-wins:
/// fenced code → table → blockquote → list → paragraph.
fn parse_body_element(lines: &[&str], i: usize) -> (BodyElement, usize) {
    let trimmed = lines[i].trim_start();
    if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
        parse_code_fence(lines, i)
    } else if trimmed.starts_with('|') {
        parse_table(lines, i)
    } else if trimmed.starts_with('>') {
        parse_blockquote(lines, i)
    } else if list_line_re().is_match(lines[i]) {
        parse_list(lines, i)
    } else {
        parse_paragraph(lines, i)
    }
}

fn make_element(
    kind: BodyElementKind,
    lines: &[&str],
    start: usize,
    end: usize,
) -> (BodyElement, usize) {
    let content = lines[start..=end].join("\n").trim_end().to_string();
    let tokens = estimate_tokens(&content);
    (
        BodyElement {
            kind,
            content,
            tokens,
            line_start: start,
            line_end: end,
        },
        end + 1,
    )
}

/// Consume a fenced code block until the matching closing fence, or to
/// end-of-document if the fence is never closed.
fn parse_code_fence(lines: &[&str], i: usize) -> (BodyElement, usize) {
    let fence = if lines[i].trim_start().starts_with("~~~") {
        "~~~"
    } else {
        "```"
    };
    let mut j = i + 1;
    while j < lines.len() {
        if lines[j].trim_start().starts_with(fence) {
            return make_element(BodyElementKind::Code, lines, i, j);
        }
        j += 1;
    }
    make_element(BodyElementKind::Code, lines, i, lines.len() - 1)
}

/// Consume consecutive `|`-prefixed lines.
fn parse_table(lines: &[&str], i: usize) -> (BodyElement, usize) {
    let mut end = i;
    while end + 1 < lines.len() && lines[end + 1].trim_start().starts_with('|') {
        end += 1;
    }
    make_element(BodyElementKind::Table, lines, i, end)
}

/// Consume consecutive `>`-prefixed lines, tolerating single blank lines
/// followed by more quote lines.
fn parse_blockquote(lines: &[&str], i: usize) -> (BodyElement, usize) {
    let mut end = i;
    let mut j = i + 1;
    while j < lines.len() {
        let line = lines[j];
        if line.trim_start().starts_with('>') {
            end = j;
            j += 1;
        } else if line.trim().is_empty()
            && lines.get(j + 1).is_some_and(|n| n.trim_start().starts_with('>'))
        {
            j += 1;
        } else {
            break;
        }
    }
    make_element(BodyElementKind::Blockquote, lines, i, end)
}

/// Consume bullet/numbered lines and indented continuations, tolerating one
/// blank line when further list lines follow.
fn parse_list(lines: &[&str], i: usize) -> (BodyElement, usize) {
    let mut end = i;
    let mut j = i + 1;
    while j < lines.len() {
        let line = lines[j];
        if list_line_re().is_match(line) {
            end = j;
            j += 1;
        } else if !line.trim().is_empty()
            && (line.starts_with(' ') || line.starts_with('\t'))
            && parse_heading(line.trim_start()).is_none()
        {
            end = j;
            j += 1;
        } else if line.trim().is_empty()
            && lines.get(j + 1).is_some_and(|n| list_line_re().is_match(n))
        {
            j += 1;
        } else {
            break;
        }
    }
    make_element(BodyElementKind::List, lines, i, end)
}

/// Consume lines until a blank line or the start of any other element.
fn parse_paragraph(lines: &[&str], i: usize) -> (BodyElement, usize) {
    let mut end = i;
    let mut j = i + 1;
    while j < lines.len() {
        let line = lines[j];
        let trimmed = line.trim_start();
        if line.trim().is_empty()
            || parse_heading(line).is_some()
            || trimmed.starts_with("```")
            || trimmed.starts_with("~~~")
            || trimmed.starts_with('|')
            || trimmed.starts_with('>')
            || list_line_re().is_match(line)
        {
            break;
        }
        end = j;
        j += 1;
    }
    make_element(BodyElementKind::Paragraph, lines, i, end)
}

/// Render the heading stack back to markdown, one heading per blank-line
/// separated line: `## Heading text`.
pub fn build_cascade(headings: &[HeadingInfo]) -> String {
    headings
        .iter()
        .map(|h| format!("{} {}", "#".repeat(h.level as usize), h.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn join_blocks<'a>(blocks: impl Iterator<Item = &'a str>) -> String {
    blocks.collect::<Vec<_>>().join("\n\n")
}

/// A unit of the greedy accumulation pass.
#[derive(Debug, Clone)]
struct Segment {
    text: String,
    tokens: usize,
}

/// Split an oversized section into overlapping sub-chunks (Phase B).
#[allow(clippy::too_many_arguments)]
fn split_section(
    si: usize,
    section: &Section,
    cascade: &str,
    heading_path: &[String],
    options: &ChunkerOptions,
    observer: &dyn ChunkObserver,
    chunks: &mut Vec<LayoutAwareChunk>,
) {
    let segments = build_segments(section, options.max_chunk_size);

    let mut seed: Vec<Segment> = Vec::new();
    let mut fresh: Vec<Segment> = Vec::new();
    let mut fresh_tokens = 0usize;
    let mut part = 0usize;

    let flush = |seed: &mut Vec<Segment>,
                 fresh: &mut Vec<Segment>,
                 fresh_tokens: usize,
                 part: &mut usize,
                 chunks: &mut Vec<LayoutAwareChunk>| {
        let all: Vec<Segment> = seed.drain(..).chain(fresh.drain(..)).collect();
        let body_text = join_blocks(all.iter().map(|s| s.text.as_str()));
        let chunk = make_chunk(si, *part, cascade, body_text, section, heading_path, fresh_tokens);
        observer.observe(ChunkEvent::ChunkEmitted {
            id: chunk.id.clone(),
            token_estimate: chunk.metadata.token_estimate,
        });
        chunks.push(chunk);
        *part += 1;
        *seed = overlap_tail(all, options.chunk_overlap);
    };

    for segment in segments {
        if !fresh.is_empty() && fresh_tokens + segment.tokens > options.max_chunk_size {
            flush(&mut seed, &mut fresh, fresh_tokens, &mut part, chunks);
            fresh_tokens = 0;
        }
        fresh_tokens += segment.tokens;
        fresh.push(segment);
    }
    if !fresh.is_empty() {
        flush(&mut seed, &mut fresh, fresh_tokens, &mut part, chunks);
    }
}

/// Flatten a section's body into accumulation segments.
///
/// Blocks at or under [`WHOLE_BLOCK_TOKENS`] stay whole, as do list, table,
/// and code blocks regardless of size. Larger prose blocks split into
/// sentences. Any single segment still over the chunk budget is hard-split
/// at word boundaries so the budget holds unconditionally.
fn build_segments(section: &Section, max_chunk_size: usize) -> Vec<Segment> {
    let mut segments = Vec::new();
    for element in &section.body {
        let atomic = element.tokens <= WHOLE_BLOCK_TOKENS
            || matches!(
                element.kind,
                BodyElementKind::List | BodyElementKind::Table | BodyElementKind::Code
            );
        if atomic {
            push_segment(&mut segments, &element.content, max_chunk_size);
        } else {
            let sentences = split_into_sentences(&element.content);
            if sentences.is_empty() {
                push_segment(&mut segments, &element.content, max_chunk_size);
            } else {
                for sentence in sentences {
                    push_segment(&mut segments, &sentence.text, max_chunk_size);
                }
            }
        }
    }
    segments
}

fn push_segment(segments: &mut Vec<Segment>, text: &str, max_chunk_size: usize) {
    let tokens = estimate_tokens(text);
    if tokens <= max_chunk_size {
        segments.push(Segment {
            text: text.to_string(),
            tokens,
        });
    } else {
        for piece in hard_split(text, max_chunk_size) {
            let tokens = estimate_tokens(&piece);
            segments.push(Segment { text: piece, tokens });
        }
    }
}

/// Split text at word boundaries into pieces of at most `max_tokens`.
/// Words longer than the whole budget are split at character boundaries.
fn hard_split(text: &str, max_tokens: usize) -> Vec<String> {
    let max_chars = max_tokens * CHARS_PER_TOKEN;
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0usize;

    for word in text.split_whitespace() {
        let word_chars = word.chars().count();
        if word_chars > max_chars {
            if !current.is_empty() {
                pieces.push(std::mem::take(&mut current));
                current_chars = 0;
            }
            let chars: Vec<char> = word.chars().collect();
            for slab in chars.chunks(max_chars) {
                pieces.push(slab.iter().collect());
            }
            continue;
        }
        let would_be = if current.is_empty() {
            word_chars
        } else {
            current_chars + 1 + word_chars
        };
        if would_be > max_chars && !current.is_empty() {
            pieces.push(std::mem::take(&mut current));
            current_chars = 0;
        }
        if !current.is_empty() {
            current.push(' ');
            current_chars += 1;
        }
        current.push_str(word);
        current_chars += word_chars;
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}

/// Trailing segments of a flushed chunk whose cumulative token count fits
/// the overlap budget. The oldest segment is dropped repeatedly while the
/// buffer exceeds the budget, keeping at least one segment; a zero budget
/// disables overlap entirely.
fn overlap_tail(all: Vec<Segment>, chunk_overlap: usize) -> Vec<Segment> {
    if chunk_overlap == 0 || all.is_empty() {
        return Vec::new();
    }
    let mut buf: VecDeque<Segment> = all.into();
    let mut total: usize = buf.iter().map(|s| s.tokens).sum();
    while total > chunk_overlap && buf.len() > 1 {
        if let Some(dropped) = buf.pop_front() {
            total -= dropped.tokens;
        }
    }
    buf.into_iter().collect()
}

/// Assemble a [`LayoutAwareChunk`] with a deterministic position-derived id
/// and a SHA-256 content hash.
fn make_chunk(
    section_index: usize,
    part_index: usize,
    cascade: &str,
    body_text: String,
    section: &Section,
    heading_path: &[String],
    token_estimate: usize,
) -> LayoutAwareChunk {
    let has_cascade = !cascade.is_empty();
    let text = if has_cascade {
        format!("{}\n\n{}", cascade, body_text)
    } else {
        body_text.clone()
    };

    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let hash = format!("{:x}", hasher.finalize());

    LayoutAwareChunk {
        id: format!("{}.{}", section_index, part_index),
        metadata: ChunkMetadata {
            has_cascade,
            heading_levels: section.headings.iter().map(|h| h.level).collect(),
            word_count: text.split_whitespace().count(),
            char_count: text.chars().count(),
            token_estimate,
            cascade_tokens: estimate_tokens(cascade),
        },
        text,
        text_without_cascade: body_text,
        heading_path: heading_path.to_vec(),
        source_lines: (section.line_start, section.line_end),
        hash,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_options() -> ChunkerOptions {
        ChunkerOptions::default()
    }

    #[test]
    fn test_empty_document_no_chunks() {
        assert!(create_layout_aware_chunks("", &default_options()).is_empty());
        assert!(create_layout_aware_chunks("\n\n\n", &default_options()).is_empty());
    }

    #[test]
    fn test_simple_heading_split() {
        let chunks = create_layout_aware_chunks("# A\n\nPara1\n\n## B\n\nPara2", &default_options());
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].heading_path, vec!["A"]);
        assert_eq!(chunks[1].heading_path, vec!["A", "B"]);
        assert_eq!(chunks[0].text, "# A\n\nPara1");
        assert_eq!(chunks[1].text, "# A\n\n## B\n\nPara2");
    }

    #[test]
    fn test_heading_stack_pops_on_shallower_heading() {
        let md = "# A\n\nBody a here\n\n## B\n\nBody b here\n\n# C\n\nBody c here";
        let sections = parse_sections(md);
        assert_eq!(sections.len(), 3);
        assert_eq!(sections[2].headings.len(), 1);
        assert_eq!(sections[2].headings[0].text, "C");
    }

    #[test]
    fn test_heading_without_body_dropped() {
        let chunks =
            create_layout_aware_chunks("# Empty\n\n## Also empty\n\n### Full\n\nContent", &default_options());
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].heading_path, vec!["Empty", "Also empty", "Full"]);
    }

    #[test]
    fn test_no_headings_implicit_section() {
        let chunks = create_layout_aware_chunks("Just a paragraph with no headings.", &default_options());
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].heading_path.is_empty());
        assert!(!chunks[0].metadata.has_cascade);
        assert_eq!(chunks[0].text, chunks[0].text_without_cascade);
    }

    #[test]
    fn test_cascade_disabled() {
        let options = ChunkerOptions {
            cascade_headings: false,
            ..default_options()
        };
        let chunks = create_layout_aware_chunks("# A\n\nBody text", &options);
        assert_eq!(chunks[0].text, "Body text");
        assert!(!chunks[0].metadata.has_cascade);
        assert_eq!(chunks[0].metadata.cascade_tokens, 0);
    }

    #[test]
    fn test_cascade_tokens_not_counted_in_estimate() {
        let chunks = create_layout_aware_chunks(
            "# A Very Long Heading Used As Context\n\nshort body",
            &default_options(),
        );
        assert_eq!(chunks.len(), 1);
        assert_eq!(
            chunks[0].metadata.token_estimate,
            estimate_tokens("short body")
        );
        assert!(chunks[0].metadata.cascade_tokens > 0);
    }

    #[test]
    fn test_body_element_kinds() {
        let md = "\
# H

A paragraph line.

- item one
- item two

| a | b |
| 1 | 2 |

> quoted text
> more quote

```
code here
```";
        let sections = parse_sections(md);
        assert_eq!(sections.len(), 1);
        let kinds: Vec<BodyElementKind> = sections[0].body.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                BodyElementKind::Paragraph,
                BodyElementKind::List,
                BodyElementKind::Table,
                BodyElementKind::Blockquote,
                BodyElementKind::Code,
            ]
        );
    }

    #[test]
    fn test_unterminated_code_fence_consumed_to_eof() {
        let sections = parse_sections("```\nnever closed\nstill code");
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].body.len(), 1);
        assert_eq!(sections[0].body[0].kind, BodyElementKind::Code);
        assert!(sections[0].body[0].content.contains("still code"));
    }

    #[test]
    fn test_list_tolerates_single_blank_line() {
        let sections = parse_sections("- one item here\n\n- second item here");
        assert_eq!(sections[0].body.len(), 1);
        assert_eq!(sections[0].body[0].kind, BodyElementKind::List);
    }

    #[test]
    fn test_blockquote_tolerates_single_blank_line() {
        let sections = parse_sections("> first\n\n> second");
        assert_eq!(sections[0].body.len(), 1);
        assert_eq!(sections[0].body[0].kind, BodyElementKind::Blockquote);
    }

    #[test]
    fn test_oversized_section_splits_with_overlap() {
        // 40 sentences of ~100 chars (25 tokens) each: 1000 body tokens.
        let sentence = "This sentence is exactly calibrated to reach one hundred characters of prose for the splitting test.";
        assert_eq!(estimate_tokens(sentence), 25);
        let body = vec![sentence; 40].join(" ");
        let md = format!("# Big\n\n{}", body);
        let options = ChunkerOptions {
            max_chunk_size: 500,
            chunk_overlap: 50,
            cascade_headings: true,
        };
        let chunks = create_layout_aware_chunks(&md, &options);
        assert_eq!(chunks.len(), 2);
        for chunk in &chunks {
            assert!(chunk.metadata.token_estimate <= 500);
            assert_eq!(chunk.heading_path, vec!["Big"]);
        }
        // Consecutive chunks share the overlap seed verbatim.
        let tail_of_first: Vec<&str> = chunks[0]
            .text_without_cascade
            .rsplit("\n\n")
            .take(2)
            .collect();
        for shared in tail_of_first {
            assert!(chunks[1].text_without_cascade.contains(shared));
        }
    }

    #[test]
    fn test_split_chunk_ids_are_positional() {
        let sentence = "Another deliberately padded sentence used to inflate the body token count for chunk splitting.";
        let body = vec![sentence; 60].join(" ");
        let md = format!("# Big\n\n{}", body);
        let options = ChunkerOptions {
            max_chunk_size: 300,
            chunk_overlap: 30,
            cascade_headings: true,
        };
        let chunks = create_layout_aware_chunks(&md, &options);
        assert!(chunks.len() > 1);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.id, format!("0.{}", i));
        }
    }

    #[test]
    fn test_zero_overlap_produces_disjoint_chunks() {
        let sentence = "Padding sentence number whatever keeps adding body tokens to force multiple chunks here.";
        let body = vec![sentence; 40].join(" ");
        let md = format!("# Big\n\n{}", body);
        let options = ChunkerOptions {
            max_chunk_size: 200,
            chunk_overlap: 0,
            cascade_headings: false,
        };
        let chunks = create_layout_aware_chunks(&md, &options);
        assert!(chunks.len() > 1);
        let rejoined: String = chunks
            .iter()
            .map(|c| c.text_without_cascade.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        let strip = |s: &str| s.chars().filter(|c| !c.is_whitespace()).collect::<String>();
        assert_eq!(strip(&rejoined), strip(&body));
    }

    #[test]
    fn test_token_budget_invariant_holds() {
        let md = format!(
            "# A\n\n{}\n\n## B\n\n{}",
            vec!["Mixed content paragraph with enough words to matter for the budget checks."; 30]
                .join(" "),
            "- list item one with words\n- list item two with words"
        );
        let options = ChunkerOptions {
            max_chunk_size: 128,
            chunk_overlap: 16,
            cascade_headings: true,
        };
        for chunk in create_layout_aware_chunks(&md, &options) {
            assert!(
                chunk.metadata.token_estimate <= options.max_chunk_size,
                "chunk {} exceeds budget: {}",
                chunk.id,
                chunk.metadata.token_estimate
            );
        }
    }

    #[test]
    fn test_oversized_atomic_segment_hard_split() {
        // One giant unbroken word cannot fit any budget; it must be split
        // rather than emitted over budget.
        let md = format!("# A\n\n{}", "x".repeat(4000));
        let options = ChunkerOptions {
            max_chunk_size: 100,
            chunk_overlap: 10,
            cascade_headings: false,
        };
        let chunks = create_layout_aware_chunks(&md, &options);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.metadata.token_estimate <= 100);
        }
    }

    #[test]
    fn test_deterministic() {
        let md = "# A\n\nSome body text here.\n\n## B\n\n- one\n- two\n\nMore prose follows the list.";
        let a = create_layout_aware_chunks(md, &default_options());
        let b = create_layout_aware_chunks(md, &default_options());
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b.iter()) {
            assert_eq!(x.id, y.id);
            assert_eq!(x.text, y.text);
            assert_eq!(x.hash, y.hash);
        }
    }

    #[test]
    fn test_source_lines_recorded() {
        let chunks = create_layout_aware_chunks("# A\n\nPara1\n\n## B\n\nPara2", &default_options());
        assert_eq!(chunks[0].source_lines, (0, 2));
        assert_eq!(chunks[1].source_lines, (4, 6));
    }

    #[test]
    fn test_hard_split_respects_budget() {
        let text = "word ".repeat(1000);
        for piece in hard_split(&text, 50) {
            assert!(estimate_tokens(&piece) <= 50);
        }
    }

    #[test]
    fn test_overlap_tail_keeps_at_least_one() {
        let all = vec![
            Segment { text: "a".into(), tokens: 60 },
            Segment { text: "b".into(), tokens: 60 },
        ];
        let tail = overlap_tail(all, 50);
        assert_eq!(tail.len(), 1);
        assert_eq!(tail[0].text, "b");
    }
}
