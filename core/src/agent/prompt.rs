//! Prompt text for the orchestration loop

use handlebars::Handlebars;
use serde_json::json;

use crate::error::AgentError;
use crate::tools::ToolCatalog;

/// Default system prompt. `{{tools}}` expands to the catalog description.
pub const DEFAULT_SYSTEM_PROMPT: &str = r#"You are an intelligent assistant with access to database tools.
When you need to query the employee database, you can call tools.

{{tools}}
To call a tool, respond in JSON format:
{
    "tool": "tool_name",
    "arguments": {"param1": "value1", "param2": "value2"}
}

Or use this format:
CALL tool: tool_name with arguments: {"param1": "value1"}

Call at most one tool per reply.
After calling a tool, you will receive the results. Use those results to answer the user's question.
If you don't need to call a tool, just answer the question directly."#;

/// Appended to the user's question
pub const DIRECT_ANSWER_HINT: &str = "Think step by step. Do you need to call a tool to answer this question? If yes, call the appropriate tool. If no, answer directly.";

/// Appended to each tool result while the budget lasts
pub const FOLLOW_UP_HINT: &str = "Based on the tool result above, provide a final answer to the user's question. If you need more information, you can call another tool. Otherwise, provide a complete answer.";

/// Sent once the tool budget is spent
pub const FORCE_FINAL_INSTRUCTION: &str = "You cannot call any more tools. Using only the information above, give your final answer to the user's question now. Do not include any tool calls.";

/// Answer used when the model produced nothing usable
pub const FALLBACK_ANSWER: &str = "I apologize, but I'm having trouble processing your request.";

/// Renders system prompt templates
pub struct PromptRenderer {
    handlebars: Handlebars<'static>,
}

impl Default for PromptRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl PromptRenderer {
    pub fn new() -> Self {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(false);
        handlebars.register_escape_fn(handlebars::no_escape);
        Self { handlebars }
    }

    /// Render `template` with the catalog description.
    ///
    /// A template without a `{{tools}}` placeholder gets the description
    /// appended, so a custom prompt never hides the catalog from the model.
    pub fn system_prompt(&self, template: &str, catalog: &ToolCatalog) -> Result<String, AgentError> {
        let tools = catalog.render_description();
        let rendered = self
            .handlebars
            .render_template(template, &json!({ "tools": tools }))
            .map_err(|e| AgentError::Prompt {
                message: e.to_string(),
            })?;

        if template.contains("{{tools}}") {
            Ok(rendered)
        } else {
            Ok(format!("{}\n\n{}", rendered.trim_end(), tools))
        }
    }
}

/// Turn carrying retrieved passages, `None` when there are none
pub fn context_turn(chunks: &[String]) -> Option<String> {
    if chunks.is_empty() {
        None
    } else {
        Some(format!("Context from knowledge base:\n{}", chunks.join("\n\n")))
    }
}

pub fn question_turn(query: &str) -> String {
    format!("User Question: {}\n\n{}", query, DIRECT_ANSWER_HINT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::builtin::employees::tests::FakeStore;
    use std::sync::Arc;

    fn catalog() -> ToolCatalog {
        ToolCatalog::employee_catalog(Arc::new(FakeStore::default())).unwrap()
    }

    #[test]
    fn test_default_prompt_embeds_catalog() {
        let renderer = PromptRenderer::new();
        let catalog = catalog();
        let prompt = renderer.system_prompt(DEFAULT_SYSTEM_PROMPT, &catalog).unwrap();

        assert!(prompt.contains("Tool: get_employee_by_id"));
        assert!(prompt.contains(r#""tool": "tool_name","#));
        assert!(!prompt.contains("{{tools}}"));
        assert_eq!(prompt, renderer.system_prompt(DEFAULT_SYSTEM_PROMPT, &catalog).unwrap());
    }

    #[test]
    fn test_custom_prompt_without_placeholder_gets_catalog() {
        let prompt = PromptRenderer::new()
            .system_prompt("You answer HR questions.", &catalog())
            .unwrap();
        assert!(prompt.starts_with("You answer HR questions.\n\nAvailable Tools/Functions:"));
    }

    #[test]
    fn test_context_turn() {
        assert_eq!(context_turn(&[]), None);
        assert_eq!(
            context_turn(&["a".to_string(), "b".to_string()]).as_deref(),
            Some("Context from knowledge base:\na\n\nb")
        );
    }
}
