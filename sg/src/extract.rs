//! JSON extraction from free-form model output
//!
//! Models wrap JSON in prose and code fences, and occasionally leave a
//! trailing comma behind. [`extract_json`] recovers the first complete JSON
//! object or array from such text.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// A fence delimiter opening a line: three backticks and an optional language tag
static FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*```[A-Za-z0-9_+.-]*[ \t]*").expect("fence pattern is valid"));

/// Which JSON container to look for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonKind {
    Object,
    Array,
}

impl JsonKind {
    pub fn open(&self) -> char {
        match self {
            JsonKind::Object => '{',
            JsonKind::Array => '[',
        }
    }

    pub fn close(&self) -> char {
        match self {
            JsonKind::Object => '}',
            JsonKind::Array => ']',
        }
    }
}

impl fmt::Display for JsonKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JsonKind::Object => write!(f, "object"),
            JsonKind::Array => write!(f, "array"),
        }
    }
}

/// Why extraction failed
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ExtractionError {
    /// The text never opens the requested container
    #[error("no JSON {kind} found in model output")]
    NoDelimiter { kind: JsonKind },

    /// The container opens but never closes
    #[error("JSON {kind} in model output is never closed")]
    Unbalanced { kind: JsonKind },

    /// A candidate span was found but is not valid JSON
    #[error("JSON {kind} in model output failed to parse: {message}")]
    Parse {
        kind: JsonKind,
        message: String,
        candidate: String,
    },
}

impl ExtractionError {
    /// True when no usable span was located (as opposed to a bad parse)
    pub fn is_missing_delimiter(&self) -> bool {
        matches!(
            self,
            ExtractionError::NoDelimiter { .. } | ExtractionError::Unbalanced { .. }
        )
    }
}

/// Extract the first JSON value of the given kind from model text
pub fn extract_json(text: &str, kind: JsonKind) -> Result<Value, ExtractionError> {
    debug!(text_len = text.len(), %kind, "extract_json: called");

    let stripped = strip_code_fences(text);
    let candidate = find_balanced(&stripped, kind)?;
    let repaired = remove_trailing_commas(candidate);

    serde_json::from_str(&repaired).map_err(|e| {
        debug!(error = %e, "extract_json: parse failed");
        ExtractionError::Parse {
            kind,
            message: e.to_string(),
            candidate: repaired.clone(),
        }
    })
}

/// Remove fence delimiters that open a line
///
/// Fences embedded in JSON strings are escaped (`\n```mermaid`) and never
/// start a physical line, so they survive.
pub fn strip_code_fences(text: &str) -> String {
    FENCE_RE.replace_all(text, "").into_owned()
}

/// Locate the first balanced span of `kind`, ignoring delimiters inside strings
fn find_balanced(text: &str, kind: JsonKind) -> Result<&str, ExtractionError> {
    let (open, close) = (kind.open(), kind.close());
    let start = text.find(open).ok_or(ExtractionError::NoDelimiter { kind })?;

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            if escape_next {
                escape_next = false;
            } else if ch == '\\' {
                escape_next = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        if ch == '"' {
            in_string = true;
        } else if ch == open {
            depth += 1;
        } else if ch == close {
            depth -= 1;
            if depth == 0 {
                let end = start + offset + ch.len_utf8();
                debug!(start, end, "find_balanced: found span");
                return Ok(&text[start..end]);
            }
        }
    }

    debug!(start, "find_balanced: span never closed");
    Err(ExtractionError::Unbalanced { kind })
}

/// Drop commas that directly precede `}` or `]` (outside string literals)
fn remove_trailing_commas(json: &str) -> String {
    let chars: Vec<char> = json.chars().collect();
    let mut result = String::with_capacity(json.len());
    let mut in_string = false;
    let mut escape = false;

    for (i, &ch) in chars.iter().enumerate() {
        if in_string {
            if escape {
                escape = false;
            } else if ch == '\\' {
                escape = true;
            } else if ch == '"' {
                in_string = false;
            }
            result.push(ch);
            continue;
        }

        match ch {
            '"' => {
                in_string = true;
                result.push(ch);
            }
            ',' => {
                let next = chars[i + 1..].iter().find(|c| !c.is_whitespace());
                if matches!(next, Some('}') | Some(']')) {
                    continue;
                }
                result.push(ch);
            }
            _ => result.push(ch),
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_clean_object() {
        let value = extract_json(r#"{"a": 1, "b": [1, 2]}"#, JsonKind::Object).unwrap();
        assert_eq!(value, json!({"a": 1, "b": [1, 2]}));
    }

    #[test]
    fn test_prose_around_array() {
        let text = "Sure! Here are the needs:\n[\"As a user, I want A\", \"As a user, I want B\"]\nHope this helps.";
        let value = extract_json(text, JsonKind::Array).unwrap();
        assert_eq!(value, json!(["As a user, I want A", "As a user, I want B"]));
    }

    #[test]
    fn test_code_fence_with_language_tag() {
        let text = "```json\n{\"status\": \"ok\"}\n```";
        assert_eq!(extract_json(text, JsonKind::Object).unwrap(), json!({"status": "ok"}));
    }

    #[test]
    fn test_nested_structures_not_truncated() {
        let text = r#"Result: {"outer": {"inner": {"deep": [1, {"x": "}"}]}}, "tail": true} trailing } junk"#;
        let value = extract_json(text, JsonKind::Object).unwrap();
        assert_eq!(value["tail"], json!(true));
        assert_eq!(value["outer"]["inner"]["deep"][1]["x"], json!("}"));
    }

    #[test]
    fn test_trailing_commas_removed() {
        let text = "{\"a\": [1, 2, 3,], \"b\": {\"c\": 1,},}";
        assert_eq!(extract_json(text, JsonKind::Object).unwrap(), json!({"a": [1, 2, 3], "b": {"c": 1}}));
    }

    #[test]
    fn test_comma_inside_string_preserved() {
        let text = r#"{"a": "keep ,} this", }"#;
        assert_eq!(extract_json(text, JsonKind::Object).unwrap(), json!({"a": "keep ,} this"}));
    }

    #[test]
    fn test_escaped_quotes_in_strings() {
        let text = r#"{"a": "she said \"{hi}\"", "b": 2}"#;
        let value = extract_json(text, JsonKind::Object).unwrap();
        assert_eq!(value["a"], json!("she said \"{hi}\""));
        assert_eq!(value["b"], json!(2));
    }

    #[test]
    fn test_embedded_markdown_fence_survives() {
        let record = json!({
            "detailed_spec_markdown": "## Diagram\n```mermaid\nflowchart TD\n  A-->B\n```\n",
        });
        let text = format!("```json\n{}\n```", serde_json::to_string_pretty(&record).unwrap());
        assert_eq!(extract_json(&text, JsonKind::Object).unwrap(), record);
    }

    #[test]
    fn test_plain_prose_is_no_delimiter() {
        let err = extract_json("I could not produce a specification.", JsonKind::Object).unwrap_err();
        assert_eq!(err, ExtractionError::NoDelimiter { kind: JsonKind::Object });
        assert!(err.is_missing_delimiter());
    }

    #[test]
    fn test_unclosed_is_unbalanced() {
        let err = extract_json("[\"As a user, I want", JsonKind::Array).unwrap_err();
        assert_eq!(err, ExtractionError::Unbalanced { kind: JsonKind::Array });
        assert!(err.is_missing_delimiter());
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        let err = extract_json("{\"a\": nope}", JsonKind::Object).unwrap_err();
        assert!(matches!(err, ExtractionError::Parse { .. }));
        assert!(!err.is_missing_delimiter());
    }

    #[test]
    fn test_strip_code_fences_only_at_line_start() {
        assert_eq!(strip_code_fences("```json\n[1]\n```"), "\n[1]\n");
        assert_eq!(strip_code_fences("a ```b```"), "a ```b```");
    }

    fn arb_json() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(|n| json!(n)),
            "[a-zA-Z0-9 ,:{}\\[\\]\"`\\\\\n-]{0,16}".prop_map(Value::String),
        ];
        leaf.prop_recursive(4, 32, 6, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
                prop::collection::btree_map("[a-z_]{1,8}", inner, 0..6)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    fn arb_container() -> impl Strategy<Value = (Value, JsonKind)> {
        prop_oneof![
            prop::collection::btree_map("[a-z_]{1,8}", arb_json(), 0..6)
                .prop_map(|m| (Value::Object(m.into_iter().collect()), JsonKind::Object)),
            prop::collection::vec(arb_json(), 0..6).prop_map(|v| (Value::Array(v), JsonKind::Array)),
        ]
    }

    proptest! {
        #[test]
        fn prop_clean_json_is_identity((value, kind) in arb_container()) {
            let text = serde_json::to_string(&value).unwrap();
            prop_assert_eq!(extract_json(&text, kind).unwrap(), value);
        }

        #[test]
        fn prop_single_fence_is_transparent((value, kind) in arb_container()) {
            let text = serde_json::to_string_pretty(&value).unwrap();
            let fenced = format!("```json\n{}\n```", text);
            prop_assert_eq!(extract_json(&fenced, kind).unwrap(), extract_json(&text, kind).unwrap());
        }

        #[test]
        fn prop_trailing_comma_tolerated((value, kind) in arb_container()) {
            let text = serde_json::to_string(&value).unwrap();
            let with_comma = format!("{},{}", &text[..text.len() - 1], &text[text.len() - 1..]);
            prop_assert_eq!(extract_json(&with_comma, kind).unwrap(), value);
        }

        #[test]
        fn prop_prose_without_delimiters_fails_cleanly(prose in "[a-zA-Z .,!?'\n]{0,80}") {
            prop_assert!(extract_json(&prose, JsonKind::Object).unwrap_err().is_missing_delimiter());
            prop_assert!(extract_json(&prose, JsonKind::Array).unwrap_err().is_missing_delimiter());
        }
    }
}
