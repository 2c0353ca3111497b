//! Agent configuration structures

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::ResolvedLlmConfig;
use crate::error::{AgentError, ConfigError, Result};
use crate::llm::{create_client, ChatOptions, LlmClient};
use crate::tools::ToolCatalog;
use crate::trajectory::TrajectoryRecorder;

/// Smallest useful budget: one tool turn plus the forced final answer
pub const MIN_ITERATIONS: usize = 2;

/// Configuration for an agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Maximum generation calls per query, including the forced final one
    pub max_iterations: usize,

    /// Per generation call; expiry ends the run
    pub generation_timeout_secs: u64,

    /// Per tool handler call; expiry becomes a failed result
    pub tool_timeout_secs: u64,

    /// Custom system prompt template (optional)
    /// If not provided, the default system prompt will be used
    pub system_prompt: Option<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: 5,
            generation_timeout_secs: 60,
            tool_timeout_secs: 30,
            system_prompt: None,
        }
    }
}

impl AgentConfig {
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.max_iterations < MIN_ITERATIONS {
            return Err(ConfigError::InvalidValue {
                field: "max_iterations".to_string(),
                value: format!("{} (minimum is {})", self.max_iterations, MIN_ITERATIONS),
            });
        }
        for (field, secs) in [
            ("generation_timeout_secs", self.generation_timeout_secs),
            ("tool_timeout_secs", self.tool_timeout_secs),
        ] {
            if secs == 0 {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    value: "0".to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout_secs)
    }

    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.tool_timeout_secs)
    }
}

enum LlmSource {
    Config(ResolvedLlmConfig),
    Client(Arc<dyn LlmClient>),
}

/// Builder for creating agents
pub struct AgentBuilder {
    llm: LlmSource,
    agent_config: AgentConfig,
    catalog: Option<Arc<ToolCatalog>>,
    chat_options: Option<ChatOptions>,
    trajectory_recorder: Option<Arc<TrajectoryRecorder>>,
}

impl AgentBuilder {
    /// Create a new agent builder with LLM configuration
    pub fn new(llm_config: ResolvedLlmConfig) -> Self {
        Self::with_source(LlmSource::Config(llm_config))
    }

    /// Create a builder around an existing client
    pub fn with_client(client: Arc<dyn LlmClient>) -> Self {
        Self::with_source(LlmSource::Client(client))
    }

    fn with_source(llm: LlmSource) -> Self {
        Self {
            llm,
            agent_config: AgentConfig::default(),
            catalog: None,
            chat_options: None,
            trajectory_recorder: None,
        }
    }

    /// Set agent configuration
    pub fn with_agent_config(mut self, agent_config: AgentConfig) -> Self {
        self.agent_config = agent_config;
        self
    }

    pub fn with_catalog(mut self, catalog: Arc<ToolCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.agent_config.max_iterations = max_iterations;
        self
    }

    /// Set system prompt
    pub fn with_system_prompt(mut self, system_prompt: Option<String>) -> Self {
        self.agent_config.system_prompt = system_prompt;
        self
    }

    /// Override the sampling options sent with every generation request
    pub fn with_chat_options(mut self, options: ChatOptions) -> Self {
        self.chat_options = Some(options);
        self
    }

    pub fn with_trajectory_recorder(mut self, recorder: Arc<TrajectoryRecorder>) -> Self {
        self.trajectory_recorder = Some(recorder);
        self
    }

    /// Build the agent
    pub fn build(self) -> Result<super::AgentCore> {
        self.agent_config.validate()?;

        let catalog = self.catalog.ok_or_else(|| AgentError::NotInitialized {
            message: "no tool catalog configured".to_string(),
        })?;

        let (client, default_options) = match self.llm {
            LlmSource::Config(llm_config) => {
                let options = ChatOptions::from(&llm_config.params);
                (create_client(&llm_config)?, options)
            }
            LlmSource::Client(client) => (client, ChatOptions::default()),
        };

        super::AgentCore::new(
            self.agent_config,
            client,
            catalog,
            self.chat_options.unwrap_or(default_options),
            self.trajectory_recorder,
        )
    }
}
