//! Response parsing
//!
//! Model output is free-form text that usually, but not always, contains the
//! JSON we asked for. Extraction is an ordered list of pure strategies; the
//! first candidate that both parses and normalizes into the expected shape
//! wins.

use super::normalize::{normalize, ExpectedShape};
use gofitai_shared::{ChatReply, NormalizedPlan, Subject};
use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde_json::Value;
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// Why a response could not be turned into a plan
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("response was empty")]
    Empty,

    #[error("no extraction strategy produced JSON")]
    NoCandidate,

    #[error("response shape invalid: {0}")]
    Shape(String),
}

/// Extraction strategies, in the order they are tried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    TaggedFence,
    AnyFence,
    LargestSpan,
    KnownKey,
    BraceSpan,
    Direct,
    /// Chat only: the raw text is the reply
    PlainText,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Strategy::TaggedFence => "tagged_fence",
            Strategy::AnyFence => "any_fence",
            Strategy::LargestSpan => "largest_span",
            Strategy::KnownKey => "known_key",
            Strategy::BraceSpan => "brace_span",
            Strategy::Direct => "direct",
            Strategy::PlainText => "plain_text",
        };
        f.write_str(name)
    }
}

type Extractor = fn(&str) -> Option<Value>;

const STRATEGIES: [(Strategy, Extractor); 6] = [
    (Strategy::TaggedFence, extract_tagged_fence),
    (Strategy::AnyFence, extract_any_fence),
    (Strategy::LargestSpan, extract_largest_span),
    (Strategy::KnownKey, extract_around_known_key),
    (Strategy::BraceSpan, extract_brace_span),
    (Strategy::Direct, extract_direct),
];

/// Keys whose presence marks the object we are looking for
const KNOWN_KEYS: [&str; 10] = [
    "weekly_schedule",
    "weeklySchedule",
    "days",
    "meals",
    "recipe_name",
    "recipeName",
    "foodName",
    "food_name",
    "reply",
    "exercises",
];

static TAGGED_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)```[ \t]*json[ \t]*\r?\n?(.*?)```").expect("valid regex"));
static ANY_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```[A-Za-z0-9_-]*[ \t]*\r?\n?(.*?)```").expect("valid regex"));
static FENCE_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```[A-Za-z0-9_-]*").expect("valid regex"));
static TRAILING_COMMA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r",(\s*[}\]])").expect("valid regex"));

/// A successful parse and the strategy that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct Parsed {
    pub plan: NormalizedPlan,
    pub strategy: Strategy,
}

/// Parse raw provider text into a normalized plan
pub fn parse(raw_text: &str, expected: &ExpectedShape<'_>) -> Result<NormalizedPlan, ParseError> {
    parse_with_strategy(raw_text, expected).map(|p| p.plan)
}

/// Like [`parse`], also reporting which strategy matched
pub fn parse_with_strategy(raw_text: &str, expected: &ExpectedShape<'_>) -> Result<Parsed, ParseError> {
    let text = raw_text.trim();
    if text.is_empty() {
        return Err(ParseError::Empty);
    }

    let mut last_error = ParseError::NoCandidate;
    for (strategy, extract) in STRATEGIES {
        let Some(value) = extract(text) else {
            continue;
        };
        match normalize(value, expected) {
            Ok(plan) => {
                debug!(%strategy, subject = %expected.subject, "Response parsed");
                return Ok(Parsed { plan, strategy });
            }
            Err(err) => {
                debug!(%strategy, error = %err, "Candidate rejected by shape normalization");
                last_error = err;
            }
        }
    }

    if expected.subject == Subject::Chat {
        let reply = FENCE_MARKER.replace_all(text, "").trim().to_string();
        if !reply.is_empty() {
            return Ok(Parsed {
                plan: NormalizedPlan::Chat(ChatReply { reply }),
                strategy: Strategy::PlainText,
            });
        }
    }

    Err(last_error)
}

/// Parse a candidate, retrying once with trailing commas removed.
/// Only objects and arrays count.
fn parse_candidate(candidate: &str) -> Option<Value> {
    let candidate = candidate.trim();
    if candidate.is_empty() {
        return None;
    }
    let value = serde_json::from_str::<Value>(candidate).ok().or_else(|| {
        let repaired = TRAILING_COMMA.replace_all(candidate, "$1");
        serde_json::from_str::<Value>(&repaired).ok()
    })?;
    matches!(value, Value::Object(_) | Value::Array(_)).then_some(value)
}

/// 1. Content of a ```json fenced block
pub fn extract_tagged_fence(text: &str) -> Option<Value> {
    TAGGED_FENCE
        .captures_iter(text)
        .filter_map(|c| c.get(1))
        .find_map(|m| parse_candidate(m.as_str()))
}

/// 2. Content of any fenced block
pub fn extract_any_fence(text: &str) -> Option<Value> {
    ANY_FENCE
        .captures_iter(text)
        .filter_map(|c| c.get(1))
        .find_map(|m| parse_candidate(m.as_str()))
}

/// 3. Largest balanced `{...}` or `[...]` span in the text.
/// Spans are scanned at top level only, so a bare array of days wins over
/// the objects nested inside it.
pub fn extract_largest_span(text: &str) -> Option<Value> {
    let bytes = text.as_bytes();
    let mut spans = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        if matches!(bytes[i], b'{' | b'[') {
            match matching_close(bytes, i) {
                Some(end) => {
                    spans.push((i, end));
                    i = end + 1;
                    continue;
                }
                // everything after an unclosed brace is inside it
                None => break,
            }
        }
        i += 1;
    }
    spans.sort_by_key(|(start, end)| std::cmp::Reverse(end - start));
    spans
        .into_iter()
        .find_map(|(start, end)| parse_candidate(&text[start..=end]))
}

/// 4. Smallest object enclosing a known key, closing it if truncated
pub fn extract_around_known_key(text: &str) -> Option<Value> {
    let bytes = text.as_bytes();
    KNOWN_KEYS.iter().find_map(|key| {
        let needle = format!("\"{}\"", key);
        let key_pos = text.find(&needle)?;
        let start = enclosing_object_start(bytes, key_pos)?;
        match matching_close(bytes, start) {
            Some(end) => parse_candidate(&text[start..=end]),
            None => parse_candidate(&close_truncated(&text[start..])),
        }
    })
}

/// 5. Strip fence markers and keep the first `{` to last `}` span
pub fn extract_brace_span(text: &str) -> Option<Value> {
    let stripped = FENCE_MARKER.replace_all(text, "");
    let start = stripped.find('{')?;
    let end = stripped.rfind('}')?;
    if end <= start {
        return None;
    }
    parse_candidate(&stripped[start..=end])
}

/// 6. The text itself
pub fn extract_direct(text: &str) -> Option<Value> {
    parse_candidate(text)
}

/// Index of the bracket closing the one at `open`, string-aware
fn matching_close(bytes: &[u8], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(open) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' | b'[' => depth += 1,
            b'}' | b']' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Start of the innermost `{` still open at `pos`
fn enclosing_object_start(bytes: &[u8], pos: usize) -> Option<usize> {
    let mut stack: Vec<(usize, u8)> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().take(pos) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' | b'[' => stack.push((i, b)),
            b'}' | b']' => {
                stack.pop();
            }
            _ => {}
        }
    }

    stack
        .iter()
        .rev()
        .find(|(_, b)| *b == b'{')
        .map(|(i, _)| *i)
}

/// Close whatever is left open at the end of a truncated object
fn close_truncated(fragment: &str) -> String {
    let mut closers: Vec<char> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for c in fragment.chars() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => closers.push('}'),
            '[' => closers.push(']'),
            '}' | ']' => {
                closers.pop();
            }
            _ => {}
        }
    }

    let mut repaired = fragment.trim_end().to_string();
    if in_string {
        repaired.push('"');
    }
    while repaired.ends_with(',') || repaired.ends_with(':') {
        repaired.pop();
        repaired = repaired.trim_end().to_string();
    }
    repaired.extend(closers.into_iter().rev());
    repaired
}
