//! Query tokenization and entity extraction.
//!
//! Derives the query-side signals that the rerank and citation scorers
//! match against chunk text: lowercase content terms and "entities" —
//! proper nouns, acronyms, quantities, and quoted phrases a reader would
//! expect a relevant passage to mention. Extraction is regex/heuristic, not
//! statistical; it only needs to be deterministic and cheap.

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

/// Stopwords dropped during query tokenization.
const STOPWORDS: &[&str] = &[
    "the", "and", "for", "are", "but", "not", "you", "all", "can", "had", "her", "was", "one",
    "our", "out", "has", "have", "his", "how", "its", "may", "new", "now", "old", "see", "two",
    "way", "who", "did", "get", "use", "that", "this", "with", "from", "they", "been", "will",
    "what", "when", "where", "which", "your", "does", "should", "would", "could", "about", "into",
    "than", "them", "then", "there", "these", "those", "some", "such", "only", "other", "more",
    "most", "very", "just", "also", "each", "between", "after", "before", "while", "being",
];

/// Domain acronyms recognized as entities even when written lowercase.
const ACRONYM_WHITELIST: &[&str] = &[
    "seo", "geo", "rag", "llm", "ai", "api", "serp", "ctr", "cms", "roi", "kpi", "b2b", "b2c",
    "saas", "nlp", "faq", "url", "html", "json", "pdf", "ui", "ux", "gpt",
];

static PROPER_PHRASE_RE: OnceLock<Regex> = OnceLock::new();
static ALL_CAPS_RE: OnceLock<Regex> = OnceLock::new();
static NUMBER_UNIT_RE: OnceLock<Regex> = OnceLock::new();
static QUOTED_RE: OnceLock<Regex> = OnceLock::new();
static WORD_RE: OnceLock<Regex> = OnceLock::new();

fn proper_phrase_re() -> &'static Regex {
    PROPER_PHRASE_RE.get_or_init(|| {
        Regex::new(r"\b[A-Z][A-Za-z0-9]+(?:\s+[A-Z][A-Za-z0-9]+)+\b").expect("proper phrase regex")
    })
}

fn all_caps_re() -> &'static Regex {
    ALL_CAPS_RE.get_or_init(|| Regex::new(r"\b[A-Z]{2,}\b").expect("all caps regex"))
}

fn number_unit_re() -> &'static Regex {
    NUMBER_UNIT_RE.get_or_init(|| {
        Regex::new(
            r"(?i)\b\d+(?:\.\d+)?\s*(?:%|percent|days?|weeks?|months?|years?|hours?|minutes?|seconds?|dollars?|words?|pages?|steps?|times|x)\b",
        )
        .expect("number unit regex")
    })
}

fn quoted_re() -> &'static Regex {
    QUOTED_RE.get_or_init(|| Regex::new(r#""([^"]+)"|'([^']+)'"#).expect("quoted regex"))
}

fn word_re() -> &'static Regex {
    WORD_RE.get_or_init(|| Regex::new(r"[a-z0-9][a-z0-9'-]*").expect("word regex"))
}

/// Extract the set of named entities from a query.
///
/// Candidates, unioned: multi-word capitalized phrases, domain acronyms,
/// 2+ letter all-caps tokens, numbers with a unit word, and quoted
/// substrings. The result is lowercased, de-duplicated, and sorted so the
/// output order is deterministic.
pub fn extract_query_entities(query: &str) -> Vec<String> {
    let mut entities: BTreeSet<String> = BTreeSet::new();

    for m in proper_phrase_re().find_iter(query) {
        entities.insert(m.as_str().to_lowercase());
    }
    for m in all_caps_re().find_iter(query) {
        entities.insert(m.as_str().to_lowercase());
    }
    for m in number_unit_re().find_iter(query) {
        entities.insert(m.as_str().trim().to_lowercase());
    }
    for cap in quoted_re().captures_iter(query) {
        if let Some(inner) = cap.get(1).or_else(|| cap.get(2)) {
            let phrase = inner.as_str().trim();
            if !phrase.is_empty() {
                entities.insert(phrase.to_lowercase());
            }
        }
    }
    let lowered = query.to_lowercase();
    for acronym in ACRONYM_WHITELIST {
        if word_re()
            .find_iter(&lowered)
            .any(|m| m.as_str() == *acronym)
        {
            entities.insert((*acronym).to_string());
        }
    }

    entities.into_iter().collect()
}

/// Tokenize a query into lowercase content terms.
///
/// Punctuation is stripped, tokens of length ≤ 2 and stopwords are dropped.
/// Order follows the query; duplicates are kept (term frequency matters to
/// callers that want it).
pub fn tokenize_query(query: &str) -> Vec<String> {
    let lowered = query.to_lowercase();
    word_re()
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .filter(|t| t.len() > 2 && !is_stopword(t))
        .collect()
}

/// True when `word` (already lowercase) is on the fixed stopword list.
pub fn is_stopword(word: &str) -> bool {
    STOPWORDS.contains(&word)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proper_noun_phrases() {
        let e = extract_query_entities("Why is Google Search Console slow");
        assert!(e.contains(&"google search console".to_string()));
    }

    #[test]
    fn test_acronyms_and_all_caps() {
        let e = extract_query_entities("best SEO tips for LLM visibility");
        assert!(e.contains(&"seo".to_string()));
        assert!(e.contains(&"llm".to_string()));
    }

    #[test]
    fn test_lowercase_acronym_whitelist() {
        let e = extract_query_entities("how does rag retrieval work");
        assert!(e.contains(&"rag".to_string()));
    }

    #[test]
    fn test_number_with_unit() {
        let e = extract_query_entities("content audit every 30 days");
        assert!(e.contains(&"30 days".to_string()));
    }

    #[test]
    fn test_quoted_phrases() {
        let e = extract_query_entities(r#"what is "topical authority" in search"#);
        assert!(e.contains(&"topical authority".to_string()));
    }

    #[test]
    fn test_empty_query_no_entities() {
        assert!(extract_query_entities("").is_empty());
        assert!(extract_query_entities("how does it work").is_empty());
    }

    #[test]
    fn test_deterministic_sorted_output() {
        let a = extract_query_entities("SEO and RAG and SEO again");
        let b = extract_query_entities("SEO and RAG and SEO again");
        assert_eq!(a, b);
        let mut sorted = a.clone();
        sorted.sort();
        assert_eq!(a, sorted);
    }

    #[test]
    fn test_tokenize_drops_stopwords_and_short_tokens() {
        let t = tokenize_query("How does the chunker split a document?");
        assert_eq!(t, vec!["chunker", "split", "document"]);
    }

    #[test]
    fn test_tokenize_empty() {
        assert!(tokenize_query("").is_empty());
        assert!(tokenize_query("the a an").is_empty());
    }

    #[test]
    fn test_tokenize_strips_punctuation() {
        let t = tokenize_query("chunking, overlap; budget!");
        assert_eq!(t, vec!["chunking", "overlap", "budget"]);
    }
}
