//! AgentCore implementation

use super::config::AgentConfig;
use super::prompt::{
    PromptRenderer, DEFAULT_SYSTEM_PROMPT, FALLBACK_ANSWER, FOLLOW_UP_HINT,
    FORCE_FINAL_INSTRUCTION,
};
use super::state::ConversationState;
use crate::agent::{Agent, AgentExecution, AgentResult};
use crate::error::{AgentError, LlmError, Result, ToolError};
use crate::llm::{ChatOptions, LlmClient, LlmResponse};
use crate::tools::{CallExtractor, Extraction, ParsedCall, ToolCatalog, ToolExecutor, ToolResult};
use crate::trajectory::{TrajectoryEntry, TrajectoryRecorder};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Name, arguments and outcome of one call turn
type FoldedCall = (String, Map<String, Value>, ToolResult);

/// The tool-calling agent
///
/// Holds only shared, read-only pieces; each query builds its own
/// [`ConversationState`], so one `AgentCore` can serve concurrent runs.
pub struct AgentCore {
    config: AgentConfig,
    llm_client: Arc<dyn LlmClient>,
    catalog: Arc<ToolCatalog>,
    extractor: CallExtractor,
    tool_executor: ToolExecutor,
    system_prompt: String,
    chat_options: ChatOptions,
    trajectory_recorder: Option<Arc<TrajectoryRecorder>>,
}

impl AgentCore {
    pub(crate) fn new(
        config: AgentConfig,
        llm_client: Arc<dyn LlmClient>,
        catalog: Arc<ToolCatalog>,
        chat_options: ChatOptions,
        trajectory_recorder: Option<Arc<TrajectoryRecorder>>,
    ) -> Result<Self> {
        let template = config
            .system_prompt
            .as_deref()
            .unwrap_or(DEFAULT_SYSTEM_PROMPT);
        // Rendered once: the prompt is identical for every query
        let system_prompt = PromptRenderer::new().system_prompt(template, &catalog)?;

        Ok(Self {
            extractor: CallExtractor::new(catalog.clone()),
            tool_executor: ToolExecutor::new(catalog.clone()).with_timeout(config.tool_timeout()),
            config,
            llm_client,
            catalog,
            system_prompt,
            chat_options,
            trajectory_recorder,
        })
    }

    pub fn catalog(&self) -> &Arc<ToolCatalog> {
        &self.catalog
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn trajectory_recorder(&self) -> Option<&Arc<TrajectoryRecorder>> {
        self.trajectory_recorder.as_ref()
    }

    async fn record(&self, entry: TrajectoryEntry) {
        if let Some(recorder) = &self.trajectory_recorder {
            if let Err(e) = recorder.record(entry).await {
                warn!(error = %e, "failed to record trajectory entry");
            }
        }
    }

    /// One bounded generation request
    async fn generate(&self, state: &mut ConversationState, forced_final: bool) -> Result<String> {
        state.generations += 1;
        let step = state.generations;
        debug!(step, forced_final, turns = state.turns.len(), "sending generation request");

        self.record(TrajectoryEntry::llm_request(
            state.turns.clone(),
            self.llm_client.model_name().to_string(),
            self.llm_client.provider_name().to_string(),
            forced_final,
            step,
        ))
        .await;

        let limit = self.config.generation_timeout();
        let request = self
            .llm_client
            .chat_completion(state.turns.clone(), Some(self.chat_options.clone()));
        let response: LlmResponse = match tokio::time::timeout(limit, request).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                error!(step, error = %e, "generation request failed");
                self.record(TrajectoryEntry::error(e.to_string(), Some("generation".to_string()), step))
                    .await;
                return Err(e);
            }
            Err(_) => {
                let e = LlmError::Timeout {
                    millis: limit.as_millis() as u64,
                };
                error!(step, error = %e, "generation request timed out");
                self.record(TrajectoryEntry::error(e.to_string(), Some("generation".to_string()), step))
                    .await;
                return Err(e.into());
            }
        };

        self.record(TrajectoryEntry::llm_response(
            response.message.clone(),
            response.usage.clone(),
            response.finish_reason.as_ref().map(|r| format!("{:?}", r)),
            step,
        ))
        .await;

        let text = response.text();
        debug!(step, reply = %text, "generation reply");
        Ok(text)
    }

    async fn execute_call(&self, call: ParsedCall, step: usize) -> FoldedCall {
        self.record(TrajectoryEntry::tool_call(call.clone(), step)).await;
        let result = self.tool_executor.execute(&call).await;
        (call.tool_name, call.arguments, result)
    }

    async fn reject_unknown(&self, call: ParsedCall, step: usize) -> FoldedCall {
        warn!(tool = %call.tool_name, "model called an unknown tool");
        self.record(TrajectoryEntry::tool_call(call.clone(), step)).await;
        let error = ToolError::NotFound {
            name: call.tool_name.clone(),
        };
        (call.tool_name, call.arguments, ToolResult::failure(error.to_string()))
    }

    /// Drive one query to a final answer, returning the run's state too
    pub(crate) async fn run(
        &self,
        query: &str,
        context: &[String],
    ) -> AgentResult<(AgentExecution, ConversationState)> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AgentError::InvalidQuery {
                message: "query is empty".to_string(),
            }
            .into());
        }

        let start_time = Instant::now();
        info!(query, context_chunks = context.len(), "starting query");
        self.record(TrajectoryEntry::query_start(
            query.to_string(),
            context.len(),
            self.agent_type().to_string(),
            serde_json::to_value(&self.config).unwrap_or_default(),
        ))
        .await;

        let mut state = ConversationState::start(self.system_prompt.clone(), context, query);
        let max_generations = self.config.max_iterations;
        let mut forced_final = false;

        let answer = loop {
            let reply = self.generate(&mut state, false).await?;

            let step = state.generations;
            let (tool_name, arguments, result) = match self.extractor.extract(&reply) {
                Extraction::NoCall => {
                    let cleaned = self.extractor.clean_answer(&reply);
                    break if cleaned.is_empty() {
                        reply.trim().to_string()
                    } else {
                        cleaned
                    };
                }
                Extraction::Call(call) => self.execute_call(call, step).await,
                Extraction::Unresolved(call) => self.reject_unknown(call, step).await,
                Extraction::Malformed {
                    grammar,
                    tool_name,
                    message,
                } => {
                    warn!(?grammar, tool = ?tool_name, %message, "malformed tool call");
                    let result = ToolResult::failure(format!(
                        "could not parse the tool call: {}. Use the documented call format.",
                        message
                    ));
                    (tool_name.unwrap_or_else(|| "unknown".to_string()), Map::new(), result)
                }
            };
            self.record(TrajectoryEntry::tool_result(tool_name.clone(), result.clone(), step))
                .await;

            // The next request is the last one the budget allows
            let budget_spent = state.generations + 1 >= max_generations;
            let follow_up = if budget_spent { None } else { Some(FOLLOW_UP_HINT) };
            state.fold_call(reply, tool_name, arguments, result, follow_up);

            if budget_spent {
                info!(generations = state.generations, "tool budget spent, forcing final answer");
                state.push_user(FORCE_FINAL_INSTRUCTION);
                forced_final = true;
                let reply = self.generate(&mut state, true).await?;
                break self.extractor.clean_answer(&reply);
            }
        };

        let answer = if answer.is_empty() {
            FALLBACK_ANSWER.to_string()
        } else {
            answer
        };

        let execution = AgentExecution {
            answer,
            tool_used: state.tool_used,
            iterations: state.iterations,
            generations: state.generations,
            forced_final,
            tool_calls: state.tool_calls.clone(),
            duration_ms: start_time.elapsed().as_millis() as u64,
        };

        info!(
            tool_used = execution.tool_used,
            generations = execution.generations,
            duration_ms = execution.duration_ms,
            "query complete"
        );
        self.record(TrajectoryEntry::query_complete(
            execution.answer.clone(),
            execution.tool_used,
            execution.generations,
            execution.duration_ms,
        ))
        .await;

        Ok((execution, state))
    }
}

#[async_trait]
impl Agent for AgentCore {
    async fn answer(&self, query: &str, context: &[String]) -> AgentResult<AgentExecution> {
        self.run(query, context).await.map(|(execution, _)| execution)
    }

    fn agent_type(&self) -> &str {
        "sage_agent"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentBuilder;
    use crate::error::Error;
    use crate::llm::mock::{Reply, ScriptedClient};
    use crate::llm::MessageRole;
    use crate::store::Employee;
    use crate::tools::builtin::employees::tests::FakeStore;
    use crate::tools::schema::{ParamType, ParameterSchema, ParameterSpec};
    use crate::tools::ToolSpec;
    use crate::trajectory::EntryType;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const EMP001_CALL: &str =
        r#"{"tool": "get_employee_by_id", "arguments": {"employee_id": "EMP001"}}"#;

    fn employee_catalog() -> Arc<ToolCatalog> {
        Arc::new(ToolCatalog::employee_catalog(Arc::new(FakeStore::sample())).unwrap())
    }

    fn agent(client: Arc<ScriptedClient>, catalog: Arc<ToolCatalog>, max_iterations: usize) -> AgentCore {
        AgentBuilder::with_client(client)
            .with_catalog(catalog)
            .with_max_iterations(max_iterations)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_direct_answer_uses_no_tool() {
        let client = Arc::new(ScriptedClient::new(vec![
            "RAG stands for retrieval-augmented generation.",
        ]));
        let agent = agent(client.clone(), employee_catalog(), 5);

        let execution = agent
            .answer("What is RAG?", &["RAG combines retrieval and generation.".to_string()])
            .await
            .unwrap();

        assert_eq!(execution.answer, "RAG stands for retrieval-augmented generation.");
        assert!(!execution.tool_used);
        assert_eq!(execution.generations, 1);
        assert_eq!(client.calls(), 1);

        let request = &client.requests()[0];
        assert_eq!(request.len(), 3);
        assert!(request[1].prompt_text().contains("RAG combines retrieval"));
    }

    #[tokio::test]
    async fn test_prose_parenthetical_is_a_direct_answer() {
        let client = Arc::new(ScriptedClient::new(vec![
            "Alice Johnson (id=EMP001) is a Senior Engineer.",
            "unused",
        ]));
        let agent = agent(client.clone(), employee_catalog(), 5);

        let execution = agent.answer("Who is Alice?", &[]).await.unwrap();
        assert_eq!(execution.answer, "Alice Johnson (id=EMP001) is a Senior Engineer.");
        assert!(!execution.tool_used);
        assert!(execution.tool_calls.is_empty());
        assert_eq!(execution.generations, 1);
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn test_direct_answer_drops_fenced_json() {
        let client = Arc::new(ScriptedClient::new(vec![
            "Alice works in Engineering.\n```json\n{\"department\": \"Engineering\"}\n```",
        ]));
        let agent = agent(client, employee_catalog(), 5);

        let execution = agent.answer("Where does Alice work?", &[]).await.unwrap();
        assert_eq!(execution.answer, "Alice works in Engineering.");
        assert!(!execution.tool_used);
    }

    #[tokio::test]
    async fn test_employee_lookup_flow() {
        let client = Arc::new(ScriptedClient::new(vec![
            "I'll look that up.\nget_employee_by_id(employee_id=\"EMP001\")",
            "Alice Johnson is a Senior Engineer in Engineering.",
        ]));
        let agent = agent(client.clone(), employee_catalog(), 5);

        let (execution, state) = agent.run("Tell me about EMP001", &[]).await.unwrap();

        assert!(execution.tool_used);
        assert!(!execution.forced_final);
        assert_eq!(execution.tools_called(), vec!["get_employee_by_id"]);
        assert_eq!(execution.tool_calls[0].arguments.get("employee_id"), Some(&json!("EMP001")));
        assert!(execution.answer.contains("Alice Johnson"));

        let second_request = &client.requests()[1];
        let tool_turn = second_request.last().unwrap();
        assert_eq!(tool_turn.role, MessageRole::Tool);
        let text = tool_turn.prompt_text();
        assert!(text.contains("Alice Johnson"));
        assert!(text.contains(FOLLOW_UP_HINT));

        let expected = serde_json::to_value(
            Employee::new("EMP001", "Alice Johnson")
                .with_department("Engineering")
                .with_position("Senior Engineer"),
        )
        .unwrap();
        let folded = state.folded_results();
        assert_eq!(folded.len(), 1);
        assert_eq!(folded[0].0, "get_employee_by_id");
        assert_eq!(folded[0].1.data.as_ref(), Some(&expected));
    }

    #[tokio::test]
    async fn test_budget_bounds_generation_calls() {
        for max_iterations in [2, 3, 5] {
            let client = Arc::new(ScriptedClient::new(vec![EMP001_CALL]));
            let agent = agent(client.clone(), employee_catalog(), max_iterations);

            let execution = agent.answer("Tell me about EMP001", &[]).await.unwrap();

            assert_eq!(client.calls(), max_iterations);
            assert_eq!(execution.generations, max_iterations);
            assert_eq!(execution.iterations, max_iterations - 1);
            assert!(execution.forced_final);
            assert!(execution.tool_used);
            // the forced reply was only a call, so nothing is left after cleaning
            assert_eq!(execution.answer, FALLBACK_ANSWER);

            let last_request = client.requests().pop().unwrap();
            assert_eq!(last_request.last().unwrap().prompt_text(), FORCE_FINAL_INSTRUCTION);
        }
    }

    #[tokio::test]
    async fn test_forced_final_keeps_prose() {
        let client = Arc::new(ScriptedClient::new(vec![
            EMP001_CALL.to_string(),
            format!("Alice works in Engineering.\n{}", EMP001_CALL),
        ]));
        let agent = agent(client.clone(), employee_catalog(), 2);

        let execution = agent.answer("Where does EMP001 work?", &[]).await.unwrap();
        assert!(execution.forced_final);
        assert_eq!(execution.answer, "Alice works in Engineering.");
    }

    #[tokio::test]
    async fn test_unknown_tool_and_bad_arguments_are_folded() {
        let client = Arc::new(ScriptedClient::new(vec![
            r#"{"tool": "drop_tables", "arguments": {}}"#,
            r#"{"tool": "get_employee_by_id", "arguments": {}}"#,
            "I could not find that employee.",
        ]));
        let agent = agent(client.clone(), employee_catalog(), 5);

        let execution = agent.answer("Who is EMP001?", &[]).await.unwrap();
        assert_eq!(execution.answer, "I could not find that employee.");
        assert_eq!(execution.failed_calls(), 2);
        assert_eq!(
            execution.tool_calls[0].result.error.as_deref(),
            Some("unknown tool: drop_tables")
        );
        assert!(execution.tool_calls[1]
            .result
            .error
            .as_deref()
            .unwrap()
            .contains("employee_id"));
    }

    #[tokio::test]
    async fn test_malformed_call_is_folded() {
        let client = Arc::new(ScriptedClient::new(vec![
            r#"{"tool": "get_employee_by_id", "arguments": "EMP001"}"#,
            "Sorry, I could not look that up.",
        ]));
        let agent = agent(client.clone(), employee_catalog(), 5);

        let execution = agent.answer("Who is EMP001?", &[]).await.unwrap();
        assert!(execution.tool_used);
        assert_eq!(execution.answer, "Sorry, I could not look that up.");
        assert!(execution.tool_calls[0]
            .result
            .error
            .as_deref()
            .unwrap()
            .starts_with("could not parse the tool call"));
    }

    #[tokio::test]
    async fn test_handler_failure_does_not_end_run() {
        let counter = Arc::new(AtomicUsize::new(0));
        let calls = counter.clone();
        let spec = ToolSpec::from_fn(
            "lookup",
            "Always fails",
            ParameterSchema::new().with(ParameterSpec::required("id", ParamType::String, "id")),
            move |_args| {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err::<serde_json::Value, _>(ToolError::ExecutionFailed {
                        name: "lookup".to_string(),
                        message: "backend unreachable".to_string(),
                    })
                }
            },
        );
        let catalog = Arc::new(ToolCatalog::with_specs(vec![spec]).unwrap());
        let client = Arc::new(ScriptedClient::new(vec![
            "lookup(id=\"7\")",
            "The lookup service is unavailable right now.",
        ]));
        let agent = agent(client.clone(), catalog, 5);

        let execution = agent.answer("Find 7", &[]).await.unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(execution.answer, "The lookup service is unavailable right now.");
        assert!(client.requests()[1]
            .last()
            .unwrap()
            .prompt_text()
            .contains("backend unreachable"));
    }

    #[tokio::test]
    async fn test_backend_failure_is_fatal() {
        let client = Arc::new(ScriptedClient::with_replies(vec![Reply::Fail]));
        let agent = agent(client, employee_catalog(), 5);

        let result = agent.answer("What is RAG?", &[]).await;
        assert!(matches!(result, Err(Error::Llm(LlmError::Network { .. }))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_generation_timeout_is_fatal() {
        let client = Arc::new(ScriptedClient::with_replies(vec![Reply::Hang]));
        let agent = AgentBuilder::with_client(client)
            .with_catalog(employee_catalog())
            .with_agent_config(AgentConfig {
                generation_timeout_secs: 1,
                ..Default::default()
            })
            .build()
            .unwrap();

        let result = agent.answer("What is RAG?", &[]).await;
        assert!(matches!(
            result,
            Err(Error::Llm(LlmError::Timeout { millis: 1000 }))
        ));
    }

    #[tokio::test]
    async fn test_empty_query_is_rejected() {
        let client = Arc::new(ScriptedClient::new(vec!["unused"]));
        let agent = agent(client.clone(), employee_catalog(), 5);

        assert!(matches!(
            agent.answer("   ", &[]).await,
            Err(Error::Agent(AgentError::InvalidQuery { .. }))
        ));
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn test_trajectory_is_recorded() {
        let recorder = Arc::new(TrajectoryRecorder::new());
        let client = Arc::new(ScriptedClient::new(vec![EMP001_CALL, "Alice."]));
        let agent = AgentBuilder::with_client(client)
            .with_catalog(employee_catalog())
            .with_trajectory_recorder(recorder.clone())
            .build()
            .unwrap();

        agent.answer("Tell me about EMP001", &[]).await.unwrap();

        // start, 2 x (request, response), call, result, complete
        let entries = recorder.get_entries().await;
        assert_eq!(entries.len(), 8);
        assert!(matches!(
            &entries[0].entry_type,
            EntryType::QueryStart { agent_type, .. } if agent_type == "sage_agent"
        ));
    }

    #[test]
    fn test_budget_below_minimum_fails_build() {
        let client = Arc::new(ScriptedClient::new(vec!["unused"]));
        let result = AgentBuilder::with_client(client)
            .with_catalog(employee_catalog())
            .with_max_iterations(1)
            .build();
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
