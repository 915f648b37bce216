//! Best-effort extraction of test cases from free-form model output.
//!
//! Stage 1 takes the greedy `[...]` span. Stage 2, used when there is no array span or it
//! does not parse, collects balanced top-level `{...}` spans and treats them as the array.

use std::collections::BTreeMap;
use std::ops::Range;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::errors::ParseError;
use crate::model::{Method, TestCase};

pub const DEFAULT_DESCRIPTION: &str = "No description provided";
pub const DEFAULT_EXPECTED_STATUS: u16 = 200;

fn array_span() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)\[.*\]").expect("static regex"))
}

/// Parse model output into test cases, defaulting missing fields.
pub fn parse_test_cases(text: &str) -> Result<Vec<TestCase>, ParseError> {
    let elements = extract_elements(text)?;
    let cases: Vec<TestCase> = elements
        .into_iter()
        .enumerate()
        .filter_map(|(i, v)| match v {
            Value::Object(obj) => Some(coerce_case(obj)),
            other => {
                warn!(index = i, kind = %json_kind(&other), "skipping non-object test case");
                None
            }
        })
        .collect();
    debug!(count = cases.len(), "parsed test cases");
    Ok(cases)
}

fn extract_elements(text: &str) -> Result<Vec<Value>, ParseError> {
    let spans = object_spans(text);

    let primary = match array_span().find(text) {
        None => Err(ParseError::NoArray),
        Some(m) => {
            // An array opening inside an object is a field value, not the case list.
            let nested = spans.iter().any(|s| s.start < m.start() && m.start() < s.end);
            match serde_json::from_str::<Value>(m.as_str()) {
                Ok(Value::Array(items)) if !nested && items.iter().any(Value::is_object) => {
                    return Ok(items)
                }
                Ok(Value::Array(items)) => Ok(items),
                Ok(_) => Err(ParseError::NotAnArray),
                Err(e) => Err(ParseError::InvalidJson(e.to_string())),
            }
        }
    };

    let objects: Vec<Value> = spans
        .into_iter()
        .filter_map(|span| serde_json::from_str::<Value>(&text[span]).ok())
        .filter(Value::is_object)
        .collect();

    if objects.is_empty() {
        return primary;
    }
    debug!(count = objects.len(), "recovered test cases from object spans");
    Ok(objects)
}

/// Byte ranges of balanced top-level `{...}` spans, string-literal aware.
fn object_spans(text: &str) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    let mut depth = 0usize;
    let mut start = None;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' if depth > 0 => in_string = true,
            '{' => {
                if depth == 0 {
                    start = Some(i);
                }
                depth += 1;
            }
            '}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    if let Some(s) = start.take() {
                        spans.push(s..i + 1);
                    }
                }
            }
            _ => {}
        }
    }
    spans
}

fn coerce_case(mut obj: Map<String, Value>) -> TestCase {
    let method = obj
        .remove("method")
        .and_then(|v| v.as_str().map(|s| s.trim().to_ascii_lowercase()))
        .filter(|s| !s.is_empty())
        .map(Method::from)
        .unwrap_or(Method::Select);

    let path = obj
        .remove("path")
        .or_else(|| obj.remove("table"))
        .and_then(|v| v.as_str().map(|s| s.trim().to_string()))
        .unwrap_or_default();

    let description = obj
        .remove("description")
        .and_then(|v| v.as_str().map(String::from))
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string());

    let expected_status = obj
        .remove("expectedStatus")
        .or_else(|| obj.remove("expected_status"))
        .and_then(|v| status_from(&v))
        .unwrap_or(DEFAULT_EXPECTED_STATUS);

    let name = obj
        .remove("name")
        .and_then(|v| v.as_str().map(String::from))
        .filter(|s| !s.is_empty());

    let body = obj.remove("body").filter(|v| !v.is_null());
    let query_params = obj
        .remove("queryParams")
        .or_else(|| obj.remove("query_params"))
        .and_then(string_map);
    let headers = obj.remove("headers").and_then(string_map);

    TestCase {
        method,
        path,
        name,
        body,
        query_params,
        headers,
        expected_status,
        description,
    }
}

fn status_from(v: &Value) -> Option<u16> {
    match v {
        Value::Number(n) => n.as_u64().and_then(|n| u16::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Object of scalars → string map; nested values are kept as their JSON text.
fn string_map(v: Value) -> Option<BTreeMap<String, String>> {
    let Value::Object(obj) = v else {
        return None;
    };
    let map: BTreeMap<String, String> = obj
        .into_iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, v)| {
            let s = match v {
                Value::String(s) => s,
                other => other.to_string(),
            };
            (k, s)
        })
        .collect();
    (!map.is_empty()).then_some(map)
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
