//! Extract a filter object from free-form model output
//!
//! Models wrap JSON in prose, fence it in code blocks, or emit several
//! partial objects back to back. [`normalize`] tries each shape in turn and
//! returns an empty map when nothing parses; it never fails.

use crate::filter::Operator;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};

lazy_static! {
    static ref FENCED_RE: Regex = Regex::new(r"(?s)```(?:json|JSON)?\s*(\{.*?\})\s*```").unwrap();
}

const QUERY_KEY: &str = "query";
const AUTHOR_PREFIX: &str = "author:";

/// Pull a JSON object out of generated text
///
/// Tried in order, falling through whenever a step does not parse:
/// a fenced code block, the span from the first `{` to the last `}`,
/// several top-level objects merged key-wise (needs at least two), a single
/// top-level object. Shape repairs are applied to whatever is returned.
pub fn normalize(text: &str) -> Map<String, Value> {
    if text.trim().is_empty() {
        return Map::new();
    }

    if let Some(object) = FENCED_RE
        .captures(text)
        .and_then(|c| parse_object(c.get(1)?.as_str()))
    {
        tracing::debug!("Parsed filter from fenced code block");
        return repair(object);
    }

    if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
        if end > start {
            if let Some(object) = parse_object(&text[start..=end]) {
                return repair(object);
            }
        }
    }

    let parsed: Vec<Map<String, Value>> = object_spans(text)
        .into_iter()
        .filter_map(parse_object)
        .filter(|o| !o.is_empty())
        .collect();

    match parsed.len() {
        0 => {
            tracing::debug!("No parseable JSON object in response");
            Map::new()
        }
        1 => parsed.into_iter().next().map(repair).unwrap_or_default(),
        n => {
            tracing::debug!("Merging {} JSON objects into one filter", n);
            let mut merged = Map::new();
            for object in parsed {
                merged.extend(object);
            }
            repair(merged)
        }
    }
}

fn parse_object(text: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// Top-level brace-balanced spans, ignoring braces inside JSON strings
fn object_spans(text: &str) -> Vec<&str> {
    let mut spans = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, ch) in text.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' if depth > 0 => in_string = true,
            '{' => {
                if depth == 0 {
                    start = idx;
                }
                depth += 1;
            }
            '}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    spans.push(&text[start..=idx]);
                }
            }
            _ => {}
        }
    }

    spans
}

/// Fix shapes some models produce instead of a filter
fn repair(mut object: Map<String, Value>) -> Map<String, Value> {
    let author = object
        .get(QUERY_KEY)
        .and_then(Value::as_str)
        .and_then(|q| q.trim().strip_prefix(AUTHOR_PREFIX))
        .map(|name| name.trim().to_string());
    if let Some(author) = author {
        object.remove(QUERY_KEY);
        object
            .entry("author")
            .or_insert_with(|| Value::String(author));
    }

    if let Some(Value::Object(tags)) = object.get_mut("tags") {
        if let Some(alternatives) = tags.remove("$or") {
            let key = Operator::In.key();
            let merged = match tags.remove(key) {
                Some(existing) => {
                    let mut values = into_list(existing);
                    for value in into_list(alternatives) {
                        if !values.contains(&value) {
                            values.push(value);
                        }
                    }
                    Value::Array(values)
                }
                None => alternatives,
            };
            tags.insert(key.to_string(), merged);
        }
    }

    object
}

fn into_list(value: Value) -> Vec<Value> {
    match value {
        Value::Array(values) => values,
        other => vec![other],
    }
}
