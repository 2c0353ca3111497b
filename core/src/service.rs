//! Question answering over the knowledge file and the agent

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::info;

use crate::agent::{Agent, AgentExecution};
use crate::error::{RetrievalError, Result};
use crate::retrieval::{KeywordRetriever, Retriever};

/// Default number of passages handed to the model
pub const DEFAULT_MAX_CHUNKS: usize = 3;

/// What a caller gets back for one question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub answer: String,
    pub relevant_chunks: Vec<String>,
    pub tool_calls_used: bool,
}

/// Retrieval plus orchestration, shared by every request
pub struct RagService {
    agent: Arc<dyn Agent>,
    knowledge_file: PathBuf,
    retriever: RwLock<Option<Arc<dyn Retriever>>>,
}

impl RagService {
    /// Service with nothing loaded yet; call [`RagService::reload`] before querying
    pub fn new(agent: Arc<dyn Agent>, knowledge_file: impl Into<PathBuf>) -> Self {
        Self {
            agent,
            knowledge_file: knowledge_file.into(),
            retriever: RwLock::new(None),
        }
    }

    /// Service around an already built retriever
    pub fn with_retriever(agent: Arc<dyn Agent>, retriever: Arc<dyn Retriever>) -> Self {
        Self {
            agent,
            knowledge_file: PathBuf::new(),
            retriever: RwLock::new(Some(retriever)),
        }
    }

    pub fn knowledge_file(&self) -> &Path {
        &self.knowledge_file
    }

    /// (Re)load the knowledge file, returning the number of chunks.
    ///
    /// On failure the previously loaded corpus stays in place.
    pub async fn reload(&self) -> Result<usize> {
        let retriever = KeywordRetriever::load(&self.knowledge_file).await?;
        let chunks = retriever.chunk_count();
        *self.retriever.write().await = Some(Arc::new(retriever));
        info!(chunks, "knowledge base ready");
        Ok(chunks)
    }

    pub async fn is_loaded(&self) -> bool {
        self.retriever.read().await.is_some()
    }

    pub async fn chunk_count(&self) -> usize {
        self.retriever
            .read()
            .await
            .as_ref()
            .map_or(0, |r| r.chunk_count())
    }

    /// Answer `query` with up to `max_chunks` passages of context
    pub async fn query(&self, query: &str, max_chunks: usize) -> Result<QueryResponse> {
        let (response, _) = self.query_with_execution(query, max_chunks).await?;
        Ok(response)
    }

    /// Like [`RagService::query`], also returning the full run record
    pub async fn query_with_execution(
        &self,
        query: &str,
        max_chunks: usize,
    ) -> Result<(QueryResponse, AgentExecution)> {
        // Clone out so a concurrent reload never waits on a model call
        let retriever = self
            .retriever
            .read()
            .await
            .clone()
            .ok_or(RetrievalError::NotLoaded)?;

        let relevant_chunks = retriever.retrieve(query, max_chunks);
        let execution = self.agent.answer(query, &relevant_chunks).await?;

        let response = QueryResponse {
            answer: execution.answer.clone(),
            relevant_chunks,
            tool_calls_used: execution.tool_used,
        };
        Ok((response, execution))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentBuilder;
    use crate::error::Error;
    use crate::llm::mock::ScriptedClient;
    use crate::tools::builtin::employees::tests::FakeStore;
    use crate::tools::ToolCatalog;
    use std::io::Write;

    fn agent(replies: Vec<&str>) -> (Arc<dyn Agent>, Arc<ScriptedClient>) {
        let client = Arc::new(ScriptedClient::new(replies));
        let catalog = ToolCatalog::employee_catalog(Arc::new(FakeStore::sample())).unwrap();
        let agent = AgentBuilder::with_client(client.clone())
            .with_catalog(Arc::new(catalog))
            .build()
            .unwrap();
        let agent: Arc<dyn Agent> = Arc::new(agent);
        (agent, client)
    }

    #[tokio::test]
    async fn test_query_before_load_fails() {
        let (agent, client) = agent(vec!["unused"]);
        let service = RagService::new(agent, "/nonexistent/knowledge.txt");

        assert!(!service.is_loaded().await);
        assert!(matches!(
            service.query("What is RAG?", 3).await,
            Err(Error::Retrieval(RetrievalError::NotLoaded))
        ));
        assert!(service.reload().await.is_err());
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn test_query_passes_context_and_reports_tool_use() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "RAG means retrieval-augmented generation, grounding answers in documents.\n\n\
             The office cafeteria opens at eight in the morning on weekdays."
        )
        .unwrap();

        let (agent, client) = agent(vec![
            r#"{"tool": "get_employee_by_id", "arguments": {"employee_id": "EMP002"}}"#,
            "Bob Smith works in Marketing.",
        ]);
        let service = RagService::new(agent, file.path());
        assert_eq!(service.reload().await.unwrap(), 2);
        assert_eq!(service.chunk_count().await, 2);

        let response = service.query("Who is EMP002 and what is RAG", 3).await.unwrap();
        assert_eq!(response.answer, "Bob Smith works in Marketing.");
        assert!(response.tool_calls_used);
        assert_eq!(response.relevant_chunks.len(), 1);
        assert!(client.requests()[0][1].prompt_text().contains("retrieval-augmented"));
    }

    #[tokio::test]
    async fn test_with_retriever() {
        let (agent, _) = agent(vec!["Nothing relevant."]);
        let retriever = Arc::new(KeywordRetriever::from_chunks(vec![
            "A passage about onboarding new employees in the first week.".to_string(),
        ]));
        let service = RagService::with_retriever(agent, retriever);

        let (response, execution) = service
            .query_with_execution("zebra", DEFAULT_MAX_CHUNKS)
            .await
            .unwrap();
        assert!(response.relevant_chunks.is_empty());
        assert!(!response.tool_calls_used);
        assert_eq!(execution.answer, response.answer);
        assert_eq!(execution.generations, 1);
    }
}
