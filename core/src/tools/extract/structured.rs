//! `{"tool": "...", "arguments": {...}}` objects, bare or inside fences

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

use super::scan::find_closing;
use super::{CallRecognizer, Grammar, Recognized};

static TOOL_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""tool"\s*:"#).expect("tool key pattern is valid"));

/// Keys accepted for the argument object, in preference order
const ARGUMENT_KEYS: [&str; 3] = ["arguments", "args", "parameters"];

pub struct StructuredObjectRecognizer;

enum Candidate {
    /// A complete object that mentions `"tool"` somewhere
    Object { start: usize, end: usize },
    /// An object that opens and never closes, with `"tool"` after it
    Unterminated,
}

/// Walk every `{` in position order, yielding the ones that look like calls
fn candidates(text: &str) -> Vec<Candidate> {
    let mut found = Vec::new();
    let mut from = 0;

    while let Some(rel) = text[from..].find('{') {
        let start = from + rel;
        match find_closing(text, start, '{', '}', &['"']) {
            Some(end) => {
                if TOOL_KEY.is_match(&text[start..=end]) {
                    found.push(Candidate::Object { start, end });
                }
            }
            None => {
                if TOOL_KEY.is_match(&text[start..]) {
                    found.push(Candidate::Unterminated);
                }
            }
        }
        from = start + 1;
    }

    found
}

/// Interpret one balanced object. `None` means it is not a call at this level.
fn interpret(candidate: &str) -> Option<Recognized> {
    let value: Value = match serde_json::from_str(candidate) {
        Ok(value) => value,
        Err(e) => {
            return Some(Recognized::Malformed {
                tool_name: None,
                message: format!("invalid JSON in tool call: {}", e),
            })
        }
    };
    let Value::Object(mut object) = value else {
        return None;
    };

    let tool_name = match object.remove("tool")? {
        Value::String(name) if !name.trim().is_empty() => name.trim().to_string(),
        other => {
            return Some(Recognized::Malformed {
                tool_name: None,
                message: format!("`tool` must be a non-empty string, got {}", other),
            })
        }
    };

    let raw = ARGUMENT_KEYS.iter().find_map(|key| object.remove(*key));
    let arguments = match raw {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(arguments)) => arguments,
        // Some models double-encode the argument object
        Some(Value::String(encoded)) => match serde_json::from_str::<Value>(&encoded) {
            Ok(Value::Object(arguments)) => arguments,
            _ => {
                return Some(Recognized::Malformed {
                    tool_name: Some(tool_name),
                    message: "`arguments` must be an object".to_string(),
                })
            }
        },
        Some(other) => {
            return Some(Recognized::Malformed {
                tool_name: Some(tool_name),
                message: format!("`arguments` must be an object, got {}", other),
            })
        }
    };

    Some(Recognized::Call {
        tool_name,
        arguments,
    })
}

impl CallRecognizer for StructuredObjectRecognizer {
    fn grammar(&self) -> Grammar {
        Grammar::StructuredObject
    }

    fn recognize(&self, text: &str, _is_known: &dyn Fn(&str) -> bool) -> Option<Recognized> {
        let mut malformed = None;

        for candidate in candidates(text) {
            match candidate {
                Candidate::Object { start, end } => match interpret(&text[start..=end]) {
                    Some(call @ Recognized::Call { .. }) => return Some(call),
                    Some(broken) => {
                        malformed.get_or_insert(broken);
                    }
                    None => {}
                },
                Candidate::Unterminated => {
                    malformed.get_or_insert(Recognized::Malformed {
                        tool_name: None,
                        message: "unterminated JSON object in tool call".to_string(),
                    });
                }
            }
        }

        malformed
    }

    fn spans(&self, text: &str, _is_known: &dyn Fn(&str) -> bool) -> Vec<(usize, usize)> {
        candidates(text)
            .into_iter()
            .filter_map(|candidate| match candidate {
                Candidate::Object { start, end } => Some((start, end + 1)),
                Candidate::Unterminated => None,
            })
            .collect()
    }
}
