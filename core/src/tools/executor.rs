//! Tool executor: resolves, validates and runs extracted calls

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::FutureExt;
use tracing::{debug, warn};

use crate::error::ToolError;
use crate::tools::extract::ParsedCall;
use crate::tools::{ToolCatalog, ToolResult};

/// Runs calls against a shared catalog
///
/// `execute` never fails: unknown tools, bad arguments, handler errors,
/// timeouts and panics all come back as a failed [`ToolResult`].
#[derive(Clone)]
pub struct ToolExecutor {
    catalog: Arc<ToolCatalog>,
    timeout: Option<Duration>,
}

impl ToolExecutor {
    /// Create a new tool executor
    pub fn new(catalog: Arc<ToolCatalog>) -> Self {
        Self {
            catalog,
            timeout: None,
        }
    }

    /// Bound each handler invocation
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn catalog(&self) -> &Arc<ToolCatalog> {
        &self.catalog
    }

    /// Execute a tool call
    pub async fn execute(&self, call: &ParsedCall) -> ToolResult {
        let start_time = Instant::now();
        let result = self.run(call).await;
        let duration = start_time.elapsed().as_millis() as u64;

        match result {
            Ok(data) => {
                debug!(tool = %call.tool_name, duration_ms = duration, "tool call succeeded");
                ToolResult::success(data).with_duration(duration)
            }
            Err(e) => {
                warn!(tool = %call.tool_name, duration_ms = duration, error = %e, "tool call failed");
                ToolResult::failure(e.to_string()).with_duration(duration)
            }
        }
    }

    async fn run(&self, call: &ParsedCall) -> Result<serde_json::Value, ToolError> {
        let spec = self
            .catalog
            .lookup(&call.tool_name)
            .ok_or_else(|| ToolError::NotFound {
                name: call.tool_name.clone(),
            })?;

        let arguments =
            spec.schema
                .validate(&call.arguments)
                .map_err(|e| ToolError::InvalidParameters {
                    name: spec.name.clone(),
                    message: e.to_string(),
                })?;

        let invocation = AssertUnwindSafe(spec.handler.call(arguments)).catch_unwind();
        let outcome = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, invocation)
                .await
                .map_err(|_| ToolError::Timeout {
                    name: spec.name.clone(),
                    millis: limit.as_millis() as u64,
                })?,
            None => invocation.await,
        };

        match outcome {
            Ok(result) => result,
            Err(panic) => Err(ToolError::ExecutionFailed {
                name: spec.name.clone(),
                message: format!("handler panicked: {}", panic_message(panic.as_ref())),
            }),
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::extract::Grammar;
    use crate::tools::schema::{ParamType, ParameterSchema, ParameterSpec};
    use crate::tools::ToolSpec;
    use serde_json::{json, Map, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn id_schema() -> ParameterSchema {
        ParameterSchema::new().with(ParameterSpec::required(
            "employee_id",
            ParamType::String,
            "Employee id",
        ))
    }

    fn call(name: &str, arguments: Value) -> ParsedCall {
        ParsedCall {
            tool_name: name.to_string(),
            arguments: arguments.as_object().cloned().unwrap_or_else(Map::new),
            grammar: Grammar::StructuredObject,
        }
    }

    fn counting_executor(counter: Arc<AtomicUsize>) -> ToolExecutor {
        let spec = ToolSpec::from_fn("lookup", "Look up", id_schema(), move |args| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                let id: String = args.get("employee_id")?;
                Ok::<_, ToolError>(json!({"EmployeeID": id}))
            }
        });
        ToolExecutor::new(Arc::new(ToolCatalog::with_specs(vec![spec]).unwrap()))
    }

    #[tokio::test]
    async fn test_successful_call() {
        let counter = Arc::new(AtomicUsize::new(0));
        let executor = counting_executor(counter.clone());

        let result = executor
            .execute(&call("lookup", json!({"employee_id": "EMP001"})))
            .await;
        assert!(result.success);
        assert_eq!(result.data, Some(json!({"EmployeeID": "EMP001"})));
        assert!(result.duration_ms.is_some());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unknown_tool_never_runs_a_handler() {
        let counter = Arc::new(AtomicUsize::new(0));
        let executor = counting_executor(counter.clone());

        let result = executor.execute(&call("drop_tables", json!({}))).await;
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("unknown tool: drop_tables"));
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_parameter_never_runs_a_handler() {
        let counter = Arc::new(AtomicUsize::new(0));
        let executor = counting_executor(counter.clone());

        let result = executor.execute(&call("lookup", json!({}))).await;
        assert!(!result.success);
        assert!(result.error.unwrap().contains("employee_id"));
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_handler_error_becomes_failed_result() {
        let spec = ToolSpec::from_fn("flaky", "Fails", id_schema(), |_args| async {
            Err::<Value, _>(ToolError::ExecutionFailed {
                name: "flaky".to_string(),
                message: "database unreachable".to_string(),
            })
        });
        let executor = ToolExecutor::new(Arc::new(ToolCatalog::with_specs(vec![spec]).unwrap()));

        let result = executor
            .execute(&call("flaky", json!({"employee_id": "EMP001"})))
            .await;
        assert!(!result.success);
        assert!(result.error.unwrap().contains("database unreachable"));
    }

    #[tokio::test]
    async fn test_handler_panic_is_contained() {
        let spec = ToolSpec::from_fn("boom", "Panics", id_schema(), |_args| async {
            if true {
                panic!("kaboom");
            }
            Ok::<_, ToolError>(json!(null))
        });
        let executor = ToolExecutor::new(Arc::new(ToolCatalog::with_specs(vec![spec]).unwrap()));

        let result = executor
            .execute(&call("boom", json!({"employee_id": "EMP001"})))
            .await;
        assert!(!result.success);
        assert!(result.error.unwrap().contains("kaboom"));
    }

    #[tokio::test]
    async fn test_handler_timeout_becomes_failed_result() {
        let spec = ToolSpec::from_fn("slow", "Sleeps", id_schema(), |_args| async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok::<_, ToolError>(json!(null))
        });
        let executor = ToolExecutor::new(Arc::new(ToolCatalog::with_specs(vec![spec]).unwrap()))
            .with_timeout(Duration::from_millis(20));

        let result = executor
            .execute(&call("slow", json!({"employee_id": "EMP001"})))
            .await;
        assert!(!result.success);
        assert_eq!(
            result.error.as_deref(),
            Some("tool `slow` timed out after 20 ms")
        );
    }
}
