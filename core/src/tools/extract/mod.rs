//! Call extraction from free model text
//!
//! A reply may encode a tool call in any of three surface forms. Each form
//! has its own [`CallRecognizer`]; the [`CallExtractor`] tries them in
//! priority order and resolves the winner against the tool catalog.

mod call_expr;
mod imperative;
mod scan;
mod structured;

pub use call_expr::CallExpressionRecognizer;
pub use imperative::ImperativeRecognizer;
pub use structured::StructuredObjectRecognizer;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::{Arc, LazyLock};
use tracing::debug;

use crate::tools::ToolCatalog;

/// Surface syntax a call was written in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Grammar {
    /// `{"tool": "...", "arguments": {...}}`, bare or fenced
    StructuredObject,
    /// `CALL tool: name with arguments: {...}`
    Imperative,
    /// `name(key=value, ...)`
    CallExpression,
}

/// A call intent pulled out of one model reply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedCall {
    pub tool_name: String,
    pub arguments: Map<String, Value>,
    pub grammar: Grammar,
}

/// What a single recognizer found
#[derive(Debug, Clone, PartialEq)]
pub enum Recognized {
    Call {
        tool_name: String,
        arguments: Map<String, Value>,
    },
    /// The text clearly tries to call something but the payload is broken
    Malformed {
        tool_name: Option<String>,
        message: String,
    },
}

/// Outcome of extracting a call from one reply
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    /// The reply is a final answer
    NoCall,
    /// A call to a registered tool
    Call(ParsedCall),
    /// A well-formed call naming a tool the catalog does not have
    Unresolved(ParsedCall),
    /// A call intent whose arguments could not be parsed
    Malformed {
        grammar: Grammar,
        tool_name: Option<String>,
        message: String,
    },
}

/// One surface grammar for call intents
pub trait CallRecognizer: Send + Sync {
    fn grammar(&self) -> Grammar;

    /// Scan `text` for a call.
    ///
    /// Returns the first well-formed call in position order, else the first
    /// malformed one, else `None`. `is_known` reports whether a name is a
    /// registered tool, for grammars that need it to tell calls from prose.
    fn recognize(&self, text: &str, is_known: &dyn Fn(&str) -> bool) -> Option<Recognized>;

    /// Byte ranges of call artifacts to strip from a final answer
    fn spans(&self, text: &str, is_known: &dyn Fn(&str) -> bool) -> Vec<(usize, usize)>;
}

static FENCED_JSON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```json.*?```").expect("fenced json pattern is valid"));

static BLANK_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("blank line pattern is valid"));

/// Ordered set of recognizers bound to a catalog
pub struct CallExtractor {
    recognizers: Vec<Box<dyn CallRecognizer>>,
    catalog: Arc<ToolCatalog>,
}

impl CallExtractor {
    /// Extractor with the three built-in grammars in priority order
    pub fn new(catalog: Arc<ToolCatalog>) -> Self {
        Self::with_recognizers(
            catalog,
            vec![
                Box::new(StructuredObjectRecognizer),
                Box::new(ImperativeRecognizer),
                Box::new(CallExpressionRecognizer),
            ],
        )
    }

    pub fn with_recognizers(
        catalog: Arc<ToolCatalog>,
        recognizers: Vec<Box<dyn CallRecognizer>>,
    ) -> Self {
        Self {
            recognizers,
            catalog,
        }
    }

    /// Decide whether `text` asks for a tool call.
    ///
    /// The first grammar to produce a well-formed call wins. A malformed
    /// intent is reported only when no grammar produced a well-formed call.
    pub fn extract(&self, text: &str) -> Extraction {
        let catalog = &self.catalog;
        let is_known = |name: &str| catalog.contains(name);
        let mut malformed = None;

        for recognizer in &self.recognizers {
            let grammar = recognizer.grammar();
            match recognizer.recognize(text, &is_known) {
                Some(Recognized::Call {
                    tool_name,
                    arguments,
                }) => {
                    let call = ParsedCall {
                        tool_name,
                        arguments,
                        grammar,
                    };
                    debug!(tool = %call.tool_name, ?grammar, "extracted tool call");
                    return if self.catalog.contains(&call.tool_name) {
                        Extraction::Call(call)
                    } else {
                        Extraction::Unresolved(call)
                    };
                }
                Some(Recognized::Malformed { tool_name, message }) => {
                    if malformed.is_none() {
                        malformed = Some(Extraction::Malformed {
                            grammar,
                            tool_name,
                            message,
                        });
                    }
                }
                None => {}
            }
        }

        match malformed {
            Some(extraction) => {
                debug!(?extraction, "malformed tool call");
                extraction
            }
            None => Extraction::NoCall,
        }
    }

    /// Strip call artifacts from text that will be shown as a final answer
    pub fn clean_answer(&self, text: &str) -> String {
        let catalog = &self.catalog;
        let is_known = |name: &str| catalog.contains(name);

        let without_fences = FENCED_JSON.replace_all(text, "");
        let mut cleaned = without_fences.into_owned();

        for recognizer in &self.recognizers {
            let mut spans = recognizer.spans(&cleaned, &is_known);
            spans.sort_unstable();

            let mut merged: Vec<(usize, usize)> = Vec::new();
            for (start, end) in spans {
                match merged.last_mut() {
                    Some(last) if start < last.1 => last.1 = last.1.max(end),
                    _ => merged.push((start, end)),
                }
            }
            for (start, end) in merged.into_iter().rev() {
                cleaned.replace_range(start..end, "");
            }
        }

        BLANK_RUNS.replace_all(cleaned.trim(), "\n\n").into_owned()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::ToolError;
    use crate::tools::schema::{ParamType, ParameterSchema, ParameterSpec};
    use crate::tools::ToolSpec;
    use serde_json::json;

    pub(crate) fn employee_like_catalog() -> Arc<ToolCatalog> {
        let specs = [
            ("get_employee_by_id", "employee_id"),
            ("search_employees", "search_term"),
            ("get_employees_by_department", "department"),
        ]
        .into_iter()
        .map(|(name, param)| {
            ToolSpec::from_fn(
                name,
                "test tool",
                ParameterSchema::new().with(ParameterSpec::required(param, ParamType::String, "x")),
                |_args| async { Ok::<_, ToolError>(json!(null)) },
            )
        });
        Arc::new(ToolCatalog::with_specs(specs).unwrap())
    }

    fn extractor() -> CallExtractor {
        CallExtractor::new(employee_like_catalog())
    }

    fn expect_call(extraction: Extraction) -> ParsedCall {
        match extraction {
            Extraction::Call(call) => call,
            other => panic!("expected a call, got {:?}", other),
        }
    }

    #[test]
    fn test_each_grammar_yields_same_call() {
        let extractor = extractor();
        let texts = [
            (
                r#"```json
{"tool": "get_employee_by_id", "arguments": {"employee_id": "EMP001"}}
```"#,
                Grammar::StructuredObject,
            ),
            (
                r#"CALL tool: get_employee_by_id with arguments: {"employee_id": "EMP001"}"#,
                Grammar::Imperative,
            ),
            (
                r#"I'll look that up: get_employee_by_id(employee_id="EMP001")"#,
                Grammar::CallExpression,
            ),
        ];

        for (text, grammar) in texts {
            let call = expect_call(extractor.extract(text));
            assert_eq!(call.tool_name, "get_employee_by_id");
            assert_eq!(call.arguments.get("employee_id"), Some(&json!("EMP001")));
            assert_eq!(call.grammar, grammar);
        }
    }

    #[test]
    fn test_plain_answers_are_not_calls() {
        let extractor = extractor();
        for text in [
            "RAG stands for retrieval-augmented generation (see above).",
            "",
            "{ not json at all",
            "The call was fine, no tool needed.",
            "Use a dict like {\"a\": 1} to store it.",
            "Alice Johnson (id=EMP001) is a Senior Engineer.",
            "Bob Smith (department=Marketing, level=3) joined in 2019.",
        ] {
            assert_eq!(extractor.extract(text), Extraction::NoCall, "text: {:?}", text);
        }
    }

    #[test]
    fn test_unknown_tool_is_unresolved() {
        let extraction = extractor().extract(r#"{"tool": "delete_everything", "arguments": {}}"#);
        match extraction {
            Extraction::Unresolved(call) => assert_eq!(call.tool_name, "delete_everything"),
            other => panic!("expected unresolved, got {:?}", other),
        }
    }

    #[test]
    fn test_structured_grammar_has_priority() {
        let text = r#"search_employees(search_term="Bob")
{"tool": "get_employee_by_id", "arguments": {"employee_id": "EMP002"}}"#;
        let call = expect_call(extractor().extract(text));
        assert_eq!(call.tool_name, "get_employee_by_id");
        assert_eq!(call.grammar, Grammar::StructuredObject);
    }

    #[test]
    fn test_malformed_only_without_a_good_call() {
        let extractor = extractor();
        let broken = r#"{"tool": "get_employee_by_id", "arguments": {"employee_id": "EMP001"}"#;
        assert!(matches!(
            extractor.extract(broken),
            Extraction::Malformed {
                grammar: Grammar::StructuredObject,
                ..
            }
        ));

        let recovered = format!("{}\nget_employee_by_id(employee_id=\"EMP001\")", broken);
        let call = expect_call(extractor.extract(&recovered));
        assert_eq!(call.grammar, Grammar::CallExpression);
    }

    #[test]
    fn test_clean_answer_strips_call_artifacts() {
        let extractor = extractor();
        let text = "Ada works in Engineering.\n\n```json\n{\"tool\": \"x\"}\n```\n\nCALL tool: search_employees with arguments: {\"search_term\": \"Ada\"}";
        assert_eq!(extractor.clean_answer(text), "Ada works in Engineering.");

        let text = "Here you go.\n{\"tool\": \"get_employee_by_id\", \"arguments\": {\"employee_id\": \"EMP001\"}}\nget_employee_by_id(employee_id=\"EMP001\")";
        assert_eq!(extractor.clean_answer(text), "Here you go.");

        assert_eq!(extractor.clean_answer("Plain (with parens) answer."), "Plain (with parens) answer.");
    }
}
