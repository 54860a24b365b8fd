//! Chunking observability.
//!
//! The chunker reports segmentation decisions through an injectable
//! [`ChunkObserver`] instead of writing to the console directly. Callers
//! that want diagnostics pick a reporter; library callers get silence by
//! default. Human and JSON reporters both emit on **stderr** so stdout
//! remains parseable for scripts.

use std::io::Write;

/// A single chunking decision worth reporting.
#[derive(Clone, Debug)]
pub enum ChunkEvent {
    /// A section was closed with body content and will be chunked.
    SectionClosed {
        heading_path: Vec<String>,
        body_tokens: usize,
    },
    /// A section exceeded the chunk budget and is being split.
    SectionSplit {
        heading_path: Vec<String>,
        body_tokens: usize,
        budget: usize,
    },
    /// A chunk was emitted.
    ChunkEmitted { id: String, token_estimate: usize },
}

/// Observes chunking decisions. Implementations write to stderr (human or
/// JSON) or discard events.
pub trait ChunkObserver {
    /// Emit an event. Called synchronously from the chunker.
    fn observe(&self, event: ChunkEvent);
}

/// Discards all events. The default for library use.
pub struct SilentObserver;

impl ChunkObserver for SilentObserver {
    fn observe(&self, _event: ChunkEvent) {}
}

/// Human-friendly diagnostics on stderr.
pub struct StderrObserver;

impl ChunkObserver for StderrObserver {
    fn observe(&self, event: ChunkEvent) {
        let line = match &event {
            ChunkEvent::SectionClosed {
                heading_path,
                body_tokens,
            } => format!(
                "section [{}]  {} tokens\n",
                heading_path.join(" > "),
                body_tokens
            ),
            ChunkEvent::SectionSplit {
                heading_path,
                body_tokens,
                budget,
            } => format!(
                "section [{}]  {} tokens > budget {}, splitting\n",
                heading_path.join(" > "),
                body_tokens,
                budget
            ),
            ChunkEvent::ChunkEmitted { id, token_estimate } => {
                format!("chunk {}  {} tokens\n", id, token_estimate)
            }
        };
        let _ = std::io::stderr().lock().write_all(line.as_bytes());
    }
}

/// Machine-readable diagnostics: one JSON object per line on stderr.
pub struct JsonObserver;

impl ChunkObserver for JsonObserver {
    fn observe(&self, event: ChunkEvent) {
        let obj = match &event {
            ChunkEvent::SectionClosed {
                heading_path,
                body_tokens,
            } => serde_json::json!({
                "event": "section_closed",
                "heading_path": heading_path,
                "body_tokens": body_tokens
            }),
            ChunkEvent::SectionSplit {
                heading_path,
                body_tokens,
                budget,
            } => serde_json::json!({
                "event": "section_split",
                "heading_path": heading_path,
                "body_tokens": body_tokens,
                "budget": budget
            }),
            ChunkEvent::ChunkEmitted { id, token_estimate } => serde_json::json!({
                "event": "chunk_emitted",
                "id": id,
                "token_estimate": token_estimate
            }),
        };
        if let Ok(line) = serde_json::to_string(&obj) {
            let _ = writeln!(std::io::stderr().lock(), "{}", line);
        }
    }
}

/// Observer mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ObserverMode {
    Off,
    Human,
    Json,
}

impl ObserverMode {
    /// Default: human diagnostics when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ObserverMode::Human
        } else {
            ObserverMode::Off
        }
    }

    /// Build an observer for this mode.
    pub fn observer(&self) -> Box<dyn ChunkObserver> {
        match self {
            ObserverMode::Off => Box::new(SilentObserver),
            ObserverMode::Human => Box::new(StderrObserver),
            ObserverMode::Json => Box::new(JsonObserver),
        }
    }
}
