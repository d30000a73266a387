//! Turns a free-text LLM answer into candidate concept strings.
//!
//! Grammar: one concept per line. A line may start with any run of bullets
//! (`-`, `*`, `+`, `•`) or numbering (`1.`, `2)`) followed by whitespace.
//! Lines longer than [`COMMA_SPLIT_MIN_LEN`] characters that contain commas
//! hold several concepts. Preamble
//! lines (an unbulleted line ending in `:`) and conversational filler are
//! dropped. Duplicates are removed case-insensitively, first spelling wins.

use std::{collections::HashSet, sync::LazyLock};

use regex::Regex;

pub const COMMA_SPLIT_MIN_LEN: usize = 50;

static LIST_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[-*+•]+\s*|\d+[.)](?:\s+|$))+").expect("list marker pattern must compile")
});
static TRAILING_PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?;:]+$").expect("punctuation pattern must compile"));
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern must compile"));
static FILLER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:sure|certainly|of course)(?:[!,.]|\s*$)|\b(?:here are|here is|good question|fun question|i think|i hope|let me know)\b",
    )
    .expect("filler pattern must compile")
});

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("response is empty")]
    Empty,
    #[error("response contains no concept lines")]
    NoConcepts,
}

pub fn parse_concept_list(text: &str) -> Result<Vec<String>, ParseError> {
    if text.trim().is_empty() {
        return Err(ParseError::Empty);
    }

    let mut seen = HashSet::new();
    let mut concepts = Vec::new();

    for raw_line in text.lines() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        let had_marker = LIST_MARKER.is_match(line);
        let body = LIST_MARKER.replace(line, "");
        let body = body.trim();

        if !had_marker && body.ends_with(':') {
            continue;
        }
        if is_filler(body) {
            continue;
        }

        for candidate in split_line(body) {
            let Some(concept) = clean_fragment(candidate) else {
                continue;
            };
            if seen.insert(concept.to_lowercase()) {
                concepts.push(concept);
            }
        }
    }

    if concepts.is_empty() {
        return Err(ParseError::NoConcepts);
    }
    Ok(concepts)
}

fn split_line(line: &str) -> Vec<&str> {
    if line.chars().count() > COMMA_SPLIT_MIN_LEN && line.contains(',') {
        line.split(',').collect()
    } else {
        vec![line]
    }
}

fn clean_fragment(fragment: &str) -> Option<String> {
    let trimmed = fragment
        .trim()
        .trim_matches(|c: char| c == '"' || c == '\'' || c == '`' || c == '*')
        .trim();
    let trimmed = TRAILING_PUNCTUATION.replace(trimmed, "");
    let collapsed = WHITESPACE.replace_all(trimmed.trim(), " ");
    let concept = collapsed.trim();

    if concept.is_empty() || !concept.chars().any(char::is_alphanumeric) {
        return None;
    }
    Some(concept.to_string())
}

fn is_filler(line: &str) -> bool {
    FILLER.is_match(line)
}
