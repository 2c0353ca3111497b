//! `CALL tool: <name> with arguments: {...}` sentences

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

use super::scan::find_closing;
use super::{CallRecognizer, Grammar, Recognized};

static CALL_HEAD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bcall\s+(?:tool|function)\b\s*:?\s*([A-Za-z_][A-Za-z0-9_]*)")
        .expect("call head pattern is valid")
});

static ARGUMENT_CLAUSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:with\b\s*)?(?:(arguments|args|parameters|params)\b\s*:?\s*)?")
        .expect("argument clause pattern is valid")
});

pub struct ImperativeRecognizer;

/// Every imperative call in `text` with the byte range it covers
fn scan(text: &str) -> Vec<(usize, usize, Recognized)> {
    let mut found = Vec::new();

    for caps in CALL_HEAD.captures_iter(text) {
        let (Some(head), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let tool_name = name.as_str().to_string();

        let rest = &text[head.end()..];
        let (keyword, clause_len) = match ARGUMENT_CLAUSE.captures(rest) {
            Some(clause) => (
                clause.get(1).map(|m| m.as_str().to_string()),
                clause.get(0).map_or(0, |m| m.end()),
            ),
            None => (None, 0),
        };
        let body_at = head.end() + clause_len;
        let body = &text[body_at..];

        if body.starts_with('{') {
            let recognized = match find_closing(text, body_at, '{', '}', &['"']) {
                Some(end) => {
                    let parsed = serde_json::from_str::<Map<String, Value>>(&text[body_at..=end]);
                    let recognized = match parsed {
                        Ok(arguments) => Recognized::Call {
                            tool_name,
                            arguments,
                        },
                        Err(e) => Recognized::Malformed {
                            tool_name: Some(tool_name),
                            message: format!("invalid argument object: {}", e),
                        },
                    };
                    found.push((head.start(), end + 1, recognized));
                    continue;
                }
                None => Recognized::Malformed {
                    tool_name: Some(tool_name),
                    message: "unterminated argument object".to_string(),
                },
            };
            found.push((head.start(), body_at, recognized));
        } else if let Some(keyword) = keyword {
            found.push((
                head.start(),
                body_at,
                Recognized::Malformed {
                    tool_name: Some(tool_name),
                    message: format!("expected a JSON object after `{}`", keyword),
                },
            ));
        } else if body.trim_start().starts_with('(') {
            // `CALL tool: name(key=value)` belongs to the call-expression grammar
            continue;
        } else {
            found.push((
                head.start(),
                head.end(),
                Recognized::Call {
                    tool_name,
                    arguments: Map::new(),
                },
            ));
        }
    }

    found
}

impl CallRecognizer for ImperativeRecognizer {
    fn grammar(&self) -> Grammar {
        Grammar::Imperative
    }

    fn recognize(&self, text: &str, _is_known: &dyn Fn(&str) -> bool) -> Option<Recognized> {
        let mut malformed = None;
        for (_, _, recognized) in scan(text) {
            match recognized {
                call @ Recognized::Call { .. } => return Some(call),
                broken => {
                    malformed.get_or_insert(broken);
                }
            }
        }
        malformed
    }

    fn spans(&self, text: &str, _is_known: &dyn Fn(&str) -> bool) -> Vec<(usize, usize)> {
        scan(text)
            .into_iter()
            .map(|(start, end, _)| (start, end))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn recognize(text: &str) -> Option<Recognized> {
        ImperativeRecognizer.recognize(text, &|_| true)
    }

    fn call(name: &str, arguments: Value) -> Option<Recognized> {
        Some(Recognized::Call {
            tool_name: name.to_string(),
            arguments: arguments.as_object().cloned().unwrap(),
        })
    }

    #[test]
    fn test_canonical_form() {
        assert_eq!(
            recognize(r#"CALL tool: search_employees with arguments: {"search_term": "Marketing", "limit": 3}"#),
            call("search_employees", json!({"search_term": "Marketing", "limit": 3}))
        );
    }

    #[test]
    fn test_keyword_variants() {
        assert_eq!(
            recognize(r#"call function get_employee_by_id args {"employee_id": "emp001"}"#),
            call("get_employee_by_id", json!({"employee_id": "emp001"}))
        );
        assert_eq!(
            recognize(r#"Call Tool:get_employee_by_id params: {"employee_id": "EMP003"}"#),
            call("get_employee_by_id", json!({"employee_id": "EMP003"}))
        );
        assert_eq!(
            recognize(r#"CALL tool: get_employee_by_id with {"employee_id": "EMP004"}"#),
            call("get_employee_by_id", json!({"employee_id": "EMP004"}))
        );
    }

    #[test]
    fn test_missing_clause_means_no_arguments() {
        assert_eq!(
            recognize("I will CALL tool: list_departments now."),
            call("list_departments", json!({}))
        );
    }

    #[test]
    fn test_broken_argument_object() {
        let result = recognize(r#"CALL tool: get_employee_by_id with arguments: {"employee_id": EMP001}"#);
        assert!(matches!(
            result,
            Some(Recognized::Malformed { tool_name: Some(ref name), .. }) if name == "get_employee_by_id"
        ));

        let result = recognize("CALL tool: get_employee_by_id with arguments: EMP001");
        assert!(matches!(result, Some(Recognized::Malformed { .. })));

        let result = recognize(r#"CALL tool: x with arguments: {"a": 1"#);
        assert!(matches!(result, Some(Recognized::Malformed { .. })));
    }

    #[test]
    fn test_defers_parenthesised_arguments() {
        assert_eq!(recognize(r#"CALL tool: search_employees(search_term="x")"#), None);
    }

    #[test]
    fn test_prose_is_ignored() {
        assert_eq!(recognize("You can call me any time."), None);
        assert_eq!(recognize("The recall tools were useful."), None);
        assert_eq!(recognize("call tools wisely"), None);
    }
}
