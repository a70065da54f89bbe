//! Citation extraction and reference rendering
//!
//! Responses from the API carry inline markers such as `[1]` that point into
//! the `search_results` array returned with the same response. This module
//! extracts those markers, renders a human-readable reference block from
//! them, and strips a rendered block back off so it is never sent to the
//! model on a later turn.
//!
//! Everything here is a pure function over strings.

use crate::providers::{ChatCompletionResponse, SearchResult};
use regex::Regex;
use std::collections::HashSet;
use std::fmt::Write;
use std::sync::OnceLock;

/// Heading that introduces a rendered reference block
pub const REFERENCES_HEADER: &str = "\n\n## References:\n";

/// Lowercased markers recognised by [`strip_references`]
const REFERENCE_MARKERS: [&str; 5] = [
    "\n## references:",
    "\n# references:",
    "\nreferences:",
    "\n##references:",
    "\n#references:",
];

fn citation_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // ASCII digits only; `\d` would also match other Unicode digit classes.
    PATTERN.get_or_init(|| Regex::new(r"\[([0-9]+)\]").expect("citation pattern is valid"))
}

/// An inline `[N]` marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Citation {
    /// The literal `N` printed in the text
    pub number: usize,
    /// Zero-based position in the search results, `number - 1`
    ///
    /// `None` for `[0]`, which points at nothing.
    pub index: Option<usize>,
}

impl Citation {
    /// Citation for the literal marker `[number]`
    pub fn new(number: usize) -> Self {
        Self {
            number,
            index: number.checked_sub(1),
        }
    }
}

/// A response reduced to what the presentation layer needs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedResponse {
    /// Raw content of the first choice
    pub content: String,
    /// Markers found in `content`, in order of appearance
    pub citations: Vec<Citation>,
    /// Search results returned with the response
    pub search_results: Vec<SearchResult>,
}

impl ParsedResponse {
    /// Content with a reference block appended, for display
    pub fn formatted(&self) -> String {
        format_with_references(&self.content, &self.citations, &self.search_results)
    }

    /// Content with any reference block removed, for storage and context
    pub fn clean(&self) -> String {
        strip_references(&self.content)
    }
}

/// Find every `[N]` marker in `content`, left to right
///
/// Duplicates are kept. Bracketed text that is not purely decimal digits is
/// ignored, as are digit runs too large to represent.
///
/// # Examples
///
/// ```
/// use pplx::citations::{extract_citations, Citation};
///
/// let found = extract_citations("Paris [1] is nice [not a citation] [2]");
/// assert_eq!(found, vec![Citation::new(1), Citation::new(2)]);
/// assert_eq!(found[0].index, Some(0));
/// ```
pub fn extract_citations(content: &str) -> Vec<Citation> {
    citation_pattern()
        .captures_iter(content)
        .filter_map(|caps| caps.get(1)?.as_str().parse::<usize>().ok())
        .map(Citation::new)
        .collect()
}

/// Remove a trailing reference block
///
/// Looks case-insensitively for a line starting with `## References:`,
/// `# References:` or `References:` (the `#` forms may omit the space). If
/// one is found, everything from its preceding newline onwards is dropped
/// and the remainder is trimmed. Otherwise `content` is returned unchanged.
///
/// # Examples
///
/// ```
/// use pplx::citations::strip_references;
///
/// let text = "Paris is the capital. [1]\n\n## References:\n[1] Wikipedia - https://wikipedia.org\n";
/// assert_eq!(strip_references(text), "Paris is the capital. [1]");
/// assert_eq!(strip_references("No block here"), "No block here");
/// ```
pub fn strip_references(content: &str) -> String {
    let earliest = REFERENCE_MARKERS
        .iter()
        .filter_map(|marker| find_ascii_case_insensitive(content, marker))
        .min();

    match earliest {
        Some(idx) => content[..idx].trim().to_string(),
        None => content.to_string(),
    }
}

/// Byte offset of the first ASCII-case-insensitive occurrence of `needle`
///
/// `needle` must be lowercase ASCII, so any match starts on a char boundary.
fn find_ascii_case_insensitive(haystack: &str, needle: &str) -> Option<usize> {
    let needle = needle.as_bytes();
    haystack
        .as_bytes()
        .windows(needle.len())
        .position(|window| window.eq_ignore_ascii_case(needle))
}

/// Append a numbered reference block for the cited search results
///
/// Each distinct cited index gets one line, in first-seen order, numbered
/// from 1 regardless of the original marker values. Citations that point
/// outside `search_results` are skipped. With no citations or no results,
/// `content` is returned unchanged.
///
/// # Examples
///
/// ```
/// use pplx::citations::{format_with_references, Citation};
/// use pplx::providers::SearchResult;
///
/// let results = vec![SearchResult::new("Wikipedia", "https://wikipedia.org/Paris")];
/// let out = format_with_references("Paris [1]", &[Citation::new(1)], &results);
/// assert_eq!(out, "Paris [1]\n\n## References:\n[1] Wikipedia - https://wikipedia.org/Paris\n");
/// ```
pub fn format_with_references(
    content: &str,
    citations: &[Citation],
    search_results: &[SearchResult],
) -> String {
    if citations.is_empty() || search_results.is_empty() {
        return content.to_string();
    }

    let mut out = String::with_capacity(content.len() + 64 * search_results.len());
    out.push_str(content);
    out.push_str(REFERENCES_HEADER);

    let mut seen = HashSet::new();
    let mut seq = 1;
    for index in citations.iter().filter_map(|c| c.index) {
        let Some(result) = search_results.get(index) else {
            continue;
        };
        if !seen.insert(index) {
            continue;
        }
        // Writing to a String cannot fail.
        let _ = writeln!(out, "[{}] {} - {}", seq, result.title, result.url);
        seq += 1;
    }

    out
}

/// Reduce an API response to content, citations, and search results
///
/// Uses the first choice. A response with no choices yields empty content and
/// no citations.
pub fn parse_response(response: &ChatCompletionResponse) -> ParsedResponse {
    let content = response.first_content().unwrap_or_default().to_string();
    let citations = extract_citations(&content);
    ParsedResponse {
        content,
        citations,
        search_results: response.search_results.clone(),
    }
}
