//! Resilient extraction of a structured verdict from free-form model
//! replies.
//!
//! The judgment collaborator is instructed to answer with one JSON
//! object, but replies arrive wrapped in explanatory prose, in relaxed
//! object-literal syntax, or truncated mid-structure when generation
//! stopped early. This module recovers a validated object anyway, or
//! returns a typed failure: it sits between an untrusted external text
//! generator and the report pipeline and must never panic on malformed
//! input.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Typed failures of the recovery pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RecoveryError {
    /// The reply contains no opening brace at all
    #[error("no object structure found in reply")]
    NoStructureFound,
    /// Braces balance but neither the lenient nor the strict parser
    /// accepts the extracted object
    #[error("reply object is malformed")]
    MalformedStructure,
    /// The reply was truncated and brace-balance repair still did not
    /// yield a parseable object
    #[error("truncated reply could not be repaired")]
    UnrecoverableTruncation,
    /// A parseable object lacked the required top-level field
    #[error("recovered object is missing required field `{field}`")]
    SchemaMismatch {
        /// The missing field
        field: &'static str,
    },
}

/// A single judged verdict, as the model was asked to shape it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JudgedVerdict {
    /// Whether the element's text sufficiently describes its purpose
    pub descriptive: bool,
    /// Evaluation comment
    #[serde(default)]
    pub evaluation: String,
    /// Concrete improvement recommendations, ordered
    #[serde(default)]
    pub recommendations: Vec<String>,
}

/// One entry of a batch reply. Fields the model omitted (or repair cut
/// away) stay `None`; the caller decides how to degrade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchEntry {
    /// `type` field as echoed back by the model
    pub element_type: Option<String>,
    /// `text` field as echoed back by the model
    pub text: Option<String>,
    /// The verdict, when the entry carried a usable `descriptive` flag
    pub verdict: Option<JudgedVerdict>,
}

/// Recover the one JSON-like object embedded in a free-form reply.
pub fn recover_object(reply: &str) -> Result<Value, RecoveryError> {
    let start = reply.find('{').ok_or(RecoveryError::NoStructureFound)?;
    let tail = &reply[start..];

    let (opens, closes) = brace_counts(tail);
    if closes >= opens {
        let candidate = balanced_slice(tail).ok_or(RecoveryError::MalformedStructure)?;
        parse_lenient(&collapse_whitespace(candidate)).ok_or(RecoveryError::MalformedStructure)
    } else {
        // Fewer closers than openers: the generator stopped mid-output
        let repaired = repair_truncated(tail);
        parse_lenient(&collapse_whitespace(&repaired))
            .ok_or(RecoveryError::UnrecoverableTruncation)
    }
}

/// Recover a single verdict. The schema gate is the `descriptive`
/// field, the one value the report cannot synthesize a meaningful
/// default for.
pub fn recover_verdict(reply: &str) -> Result<JudgedVerdict, RecoveryError> {
    let value = recover_object(reply)?;
    verdict_from_value(&value).ok_or(RecoveryError::SchemaMismatch {
        field: "descriptive",
    })
}

/// Recover a batch reply: the object must expose a top-level
/// `elements` array of verdict records.
pub fn recover_batch(reply: &str) -> Result<Vec<BatchEntry>, RecoveryError> {
    let value = recover_object(reply)?;
    let elements = value
        .get("elements")
        .and_then(Value::as_array)
        .ok_or(RecoveryError::SchemaMismatch { field: "elements" })?;

    Ok(elements
        .iter()
        .map(|entry| BatchEntry {
            element_type: entry
                .get("type")
                .and_then(Value::as_str)
                .map(String::from),
            text: entry.get("text").and_then(Value::as_str).map(String::from),
            verdict: verdict_from_value(entry),
        })
        .collect())
}

fn verdict_from_value(value: &Value) -> Option<JudgedVerdict> {
    let descriptive = value.get("descriptive")?.as_bool()?;
    Some(JudgedVerdict {
        descriptive,
        evaluation: value
            .get("evaluation")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        recommendations: value
            .get("recommendations")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default(),
    })
}

/// Lenient first (trailing commas, unquoted keys, single quotes),
/// strict second.
fn parse_lenient(candidate: &str) -> Option<Value> {
    json5::from_str::<Value>(candidate)
        .ok()
        .or_else(|| serde_json::from_str(candidate).ok())
}

/// Pretty-printed multi-line structures are expected; collapse runs of
/// structural whitespace before parsing so they cannot affect parse
/// success. Whitespace inside string values is content and passes
/// through untouched.
fn collapse_whitespace(text: &str) -> String {
    let mut scan = Scan::new();
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;
    for c in text.chars() {
        if scan.structural(c) && c.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space {
            if !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
        }
        out.push(c);
    }
    out
}

/// Minimal string-aware scanner state shared by the brace passes.
/// Tracks double- and single-quoted strings with backslash escapes so
/// braces inside string values are not counted as structure.
struct Scan {
    in_string: Option<char>,
    escaped: bool,
}

impl Scan {
    const fn new() -> Self {
        Self {
            in_string: None,
            escaped: false,
        }
    }

    /// Feed one character; returns true when the character is
    /// structural (outside any string).
    fn structural(&mut self, c: char) -> bool {
        if let Some(quote) = self.in_string {
            if self.escaped {
                self.escaped = false;
            } else if c == '\\' {
                self.escaped = true;
            } else if c == quote {
                self.in_string = None;
            }
            return false;
        }
        if c == '"' || c == '\'' {
            self.in_string = Some(c);
            return false;
        }
        true
    }
}

/// Opening/closing brace counts outside string values.
fn brace_counts(text: &str) -> (usize, usize) {
    let mut scan = Scan::new();
    let (mut opens, mut closes) = (0, 0);
    for c in text.chars() {
        if scan.structural(c) {
            match c {
                '{' => opens += 1,
                '}' => closes += 1,
                _ => {}
            }
        }
    }
    (opens, closes)
}

/// Depth-tracked extraction: the slice from the leading opening brace
/// to the closer that returns the nesting counter to zero.
fn balanced_slice(text: &str) -> Option<&str> {
    let mut scan = Scan::new();
    let mut depth: usize = 0;
    for (i, c) in text.char_indices() {
        if scan.structural(c) {
            match c {
                '{' => depth += 1,
                '}' => {
                    depth = depth.checked_sub(1)?;
                    if depth == 0 {
                        return Some(&text[..=i]);
                    }
                }
                _ => {}
            }
        }
    }
    None
}

/// Heuristic reconstruction of a truncated reply.
///
/// Truncate at the last closing brace present; when the trailing
/// content ends mid-element (the last comma falls after the last quote
/// character, implying a dangling incomplete entry), cut at that
/// comma; then append the minimum closing sequence for every scope
/// still open.
fn repair_truncated(text: &str) -> String {
    let mut kept = match text.rfind('}') {
        Some(i) => &text[..=i],
        None => text,
    };

    if let Some(comma) = kept.rfind(',') {
        let quote = kept.rfind(['"', '\'']);
        if quote.map_or(true, |q| comma > q) {
            kept = &kept[..comma];
        }
    }

    let mut repaired = kept.to_string();
    repaired.push_str(&closing_sequence(kept));
    repaired
}

/// The closers, innermost first, for every scope left open in `text`.
/// An unterminated string value is closed first so the appended
/// brackets stay structural.
fn closing_sequence(text: &str) -> String {
    let mut scan = Scan::new();
    let mut stack = Vec::new();
    for c in text.chars() {
        if scan.structural(c) {
            match c {
                '{' => stack.push('}'),
                '[' => stack.push(']'),
                '}' | ']' => {
                    stack.pop();
                }
                _ => {}
            }
        }
    }

    let mut out = String::new();
    if let Some(quote) = scan.in_string {
        out.push(quote);
    }
    while let Some(closer) = stack.pop() {
        out.push(closer);
    }
    out
}
