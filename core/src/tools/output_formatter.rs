//! Text renderings of tool results
//!
//! Two audiences: the model, which sees results folded into the
//! conversation as plain text, and a terminal user watching a run.

use crate::tools::ToolResult;
use serde_json::{Map, Value};

// ANSI color codes
pub const GRAY: &str = "\x1b[90m";
pub const WHITE: &str = "\x1b[97m";
pub const GREEN: &str = "\x1b[92m";
pub const RED: &str = "\x1b[91m";
pub const RESET: &str = "\x1b[0m";

/// Render a tool result the way the model reads it
pub fn format_tool_result(tool_name: &str, result: &ToolResult) -> String {
    if !result.success {
        let error = result.error.as_deref().unwrap_or("unknown error");
        return format!("Tool '{}' returned an error: {}", tool_name, error);
    }

    match &result.data {
        None | Some(Value::Null) => format!("Tool '{}' found no results.", tool_name),
        Some(Value::Array(items)) if items.is_empty() => {
            format!("Tool '{}' found no results.", tool_name)
        }
        Some(Value::Object(fields)) if fields.is_empty() => {
            format!("Tool '{}' found no results.", tool_name)
        }
        Some(Value::Array(items)) if items.len() == 1 => {
            format!("Tool '{}' result:\n{}", tool_name, pretty(&items[0]))
        }
        Some(data @ Value::Array(items)) => format!(
            "Tool '{}' found {} results:\n{}",
            tool_name,
            items.len(),
            pretty(data)
        ),
        Some(data) => format!("Tool '{}' result:\n{}", tool_name, pretty(data)),
    }
}

/// Render a whole tool turn: which call was made and what came back
pub fn format_tool_turn(tool_name: &str, arguments: &Map<String, Value>, result: &ToolResult) -> String {
    format!(
        "Tool '{}' was called with arguments {}.\n{}",
        tool_name,
        Value::Object(arguments.clone()),
        format_tool_result(tool_name, result)
    )
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// Status of tool execution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolStatus {
    Executing,
    Success,
    Error,
}

/// Terminal formatter for tool activity
pub struct ToolOutputFormatter {
    max_content_chars: usize,
}

impl ToolOutputFormatter {
    /// Create a new formatter instance
    pub fn new() -> Self {
        Self {
            max_content_chars: 200,
        }
    }

    /// Format tool execution status with colored dot
    pub fn format_tool_status(
        &self,
        tool_name: &str,
        arguments: &Map<String, Value>,
        status: ToolStatus,
    ) -> String {
        let dot_color = match status {
            ToolStatus::Executing => WHITE,
            ToolStatus::Success => GREEN,
            ToolStatus::Error => RED,
        };

        let rendered_args = arguments
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect::<Vec<_>>()
            .join(", ");

        format!("{}⏺{} {}({})", dot_color, RESET, tool_name, rendered_args)
    }

    /// Status line plus a truncated summary of the result
    pub fn format_tool_result(
        &self,
        tool_name: &str,
        arguments: &Map<String, Value>,
        result: &ToolResult,
    ) -> String {
        let status = if result.success {
            ToolStatus::Success
        } else {
            ToolStatus::Error
        };
        let status_line = self.format_tool_status(tool_name, arguments, status);

        let content = match (&result.data, &result.error) {
            (_, Some(error)) => error.clone(),
            (Some(Value::Array(items)), None) => format!("{} results", items.len()),
            (Some(data), None) => data.to_string(),
            (None, None) => String::new(),
        };
        if content.trim().is_empty() {
            return status_line;
        }

        let mut line = format!("{}\n  {}⎿{}  {}", status_line, GRAY, RESET, self.truncate(&content));
        if let Some(ms) = result.duration_ms {
            line.push_str(&format!(" {}({} ms){}", GRAY, ms, RESET));
        }
        line
    }

    fn truncate(&self, content: &str) -> String {
        if content.chars().count() > self.max_content_chars {
            let kept: String = content.chars().take(self.max_content_chars - 3).collect();
            format!("{}...", kept)
        } else {
            content.to_string()
        }
    }
}

impl Default for ToolOutputFormatter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_model_facing_renderings() {
        let name = "search_employees";
        assert_eq!(
            format_tool_result(name, &ToolResult::failure("boom")),
            "Tool 'search_employees' returned an error: boom"
        );
        assert_eq!(
            format_tool_result(name, &ToolResult::success(json!([]))),
            "Tool 'search_employees' found no results."
        );
        assert_eq!(
            format_tool_result(name, &ToolResult::success(json!([{"Name": "Ada"}, {"Name": "Bo"}])))
                .lines()
                .next(),
            Some("Tool 'search_employees' found 2 results:")
        );
        assert!(format_tool_result(name, &ToolResult::success(json!({"Name": "Ada"})))
            .starts_with("Tool 'search_employees' result:\n{"));
    }

    #[test]
    fn test_single_match_renders_the_record() {
        let text = format_tool_result(
            "search_employees",
            &ToolResult::success(json!([{"Name": "Ada"}])),
        );
        assert_eq!(text, "Tool 'search_employees' result:\n{\n  \"Name\": \"Ada\"\n}");
    }

    #[test]
    fn test_tool_turn_includes_arguments() {
        let mut args = Map::new();
        args.insert("employee_id".to_string(), json!("EMP001"));
        let text = format_tool_turn("get_employee_by_id", &args, &ToolResult::success(json!({"Name": "Ada"})));
        assert!(text.starts_with(
            "Tool 'get_employee_by_id' was called with arguments {\"employee_id\":\"EMP001\"}."
        ));
        assert!(text.contains("\"Name\": \"Ada\""));
    }

    #[test]
    fn test_terminal_summary_truncates() {
        let formatter = ToolOutputFormatter::new();
        let long = "x".repeat(500);
        let line = formatter.format_tool_result("t", &Map::new(), &ToolResult::failure(long));
        assert!(line.contains("t()"));
        assert!(line.contains("..."));
        assert!(!line.contains(&"x".repeat(201)));
    }
}
