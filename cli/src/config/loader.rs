//! CLI configuration loader for sage
//!
//! Resolves settings with this priority, highest first:
//! 1. Flag overrides (`--model`, `--database`, ...)
//! 2. --config file/dir
//! 3. Current working directory: ./sage.json or ./.sage/config.json
//! 4. XDG config: $XDG_CONFIG_HOME/sage/config.json or ~/.config/sage/config.json
//! 5. Environment variables (`SAGE_*`)
//! 6. Built-in defaults (local Ollama, `knowledge.txt`, `employees.db`)
//!
//! Only the first config file found is read. Fields it leaves out fall
//! through to the environment and then to the defaults.

use anyhow::{anyhow, Context, Result};
use sage_core::{AgentConfig, ModelParams, Protocol, ResolvedLlmConfig};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DEFAULT_PROTOCOL: Protocol = Protocol::Ollama;
pub const DEFAULT_MODEL: &str = "gemma3:4b";
pub const DEFAULT_KNOWLEDGE_FILE: &str = "knowledge.txt";
pub const DEFAULT_DATABASE: &str = "employees.db";

/// Raw configuration file format; every field is optional
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawConfig {
    /// Protocol to use (`ollama` or `openai_compat`)
    pub protocol: Option<String>,
    /// API key (can be "env:VAR_NAME" for environment variable)
    pub api_key: Option<String>,
    /// Base URL (optional, uses protocol default if not specified)
    pub base_url: Option<String>,
    pub model: Option<String>,
    /// Model parameters (optional)
    pub params: Option<ModelParams>,
    /// Additional headers (optional)
    #[serde(default)]
    pub headers: HashMap<String, String>,
    /// Knowledge corpus to retrieve from
    pub knowledge_file: Option<String>,
    /// SQLite database holding the employee table
    pub database: Option<String>,
    /// Orchestration loop settings
    pub agent: Option<AgentConfig>,
}

impl RawConfig {
    /// Fill fields still unset from `fallback`
    fn or(self, fallback: RawConfig) -> RawConfig {
        RawConfig {
            protocol: self.protocol.or(fallback.protocol),
            api_key: self.api_key.or(fallback.api_key),
            base_url: self.base_url.or(fallback.base_url),
            model: self.model.or(fallback.model),
            params: self.params.or(fallback.params),
            headers: if self.headers.is_empty() {
                fallback.headers
            } else {
                self.headers
            },
            knowledge_file: self.knowledge_file.or(fallback.knowledge_file),
            database: self.database.or(fallback.database),
            agent: self.agent.or(fallback.agent),
        }
    }

    /// Settings carried by `SAGE_*` environment variables
    pub fn from_env_with(lookup: impl Fn(&str) -> Option<String>) -> RawConfig {
        RawConfig {
            protocol: lookup("SAGE_PROTOCOL"),
            api_key: lookup("SAGE_API_KEY"),
            base_url: lookup("SAGE_BASE_URL"),
            model: lookup("SAGE_MODEL"),
            knowledge_file: lookup("SAGE_KNOWLEDGE_FILE"),
            database: lookup("SAGE_DATABASE"),
            ..Default::default()
        }
    }
}

/// Fully resolved application settings
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub knowledge_file: PathBuf,
    pub database: PathBuf,
    pub agent: AgentConfig,
    llm: RawConfig,
}

impl AppConfig {
    /// Resolve and validate the model backend settings.
    ///
    /// Kept separate from loading so commands that never talk to a model
    /// (`import`, `tools`) work without backend credentials.
    pub fn llm_config(&self) -> Result<ResolvedLlmConfig> {
        let protocol: Protocol = match &self.llm.protocol {
            Some(name) => name.parse().map_err(|e| anyhow!("{}", e))?,
            None => DEFAULT_PROTOCOL,
        };

        let api_key = match self.llm.api_key.as_deref() {
            Some(key) if key.starts_with("env:") => {
                let var_name = &key[4..];
                Some(
                    std::env::var(var_name)
                        .with_context(|| format!("Environment variable not found: {}", var_name))?,
                )
            }
            Some(key) => Some(key.to_string()),
            None => None,
        };

        let base_url = self
            .llm
            .base_url
            .clone()
            .unwrap_or_else(|| protocol.default_base_url().to_string());
        let model = self
            .llm
            .model
            .clone()
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let mut resolved = ResolvedLlmConfig::new(protocol, base_url, model)
            .with_params(self.llm.params.clone().unwrap_or_default())
            .with_headers(self.llm.headers.clone());
        if let Some(key) = api_key {
            resolved = resolved.with_api_key(key);
        }

        resolved
            .validate()
            .map_err(|e| anyhow!("Configuration validation failed: {}", e))?;

        Ok(resolved)
    }
}

/// CLI configuration loader
#[derive(Debug, Default)]
pub struct CliConfigLoader {
    /// Override config file/directory path
    config_override: Option<PathBuf>,
    /// Flag overrides
    overrides: RawConfig,
    max_iterations_override: Option<usize>,
}

impl CliConfigLoader {
    /// Create a new loader
    pub fn new() -> Self {
        Self::default()
    }

    /// Set config file/directory override
    pub fn with_config_override(mut self, path: PathBuf) -> Self {
        self.config_override = Some(path);
        self
    }

    pub fn with_protocol_override(mut self, protocol: String) -> Self {
        self.overrides.protocol = Some(protocol);
        self
    }

    pub fn with_api_key_override(mut self, api_key: String) -> Self {
        self.overrides.api_key = Some(api_key);
        self
    }

    pub fn with_base_url_override(mut self, base_url: String) -> Self {
        self.overrides.base_url = Some(base_url);
        self
    }

    pub fn with_model_override(mut self, model: String) -> Self {
        self.overrides.model = Some(model);
        self
    }

    pub fn with_knowledge_file_override(mut self, path: String) -> Self {
        self.overrides.knowledge_file = Some(path);
        self
    }

    pub fn with_database_override(mut self, path: String) -> Self {
        self.overrides.database = Some(path);
        self
    }

    pub fn with_max_iterations_override(mut self, max_iterations: usize) -> Self {
        self.max_iterations_override = Some(max_iterations);
        self
    }

    /// Load and resolve configuration
    pub async fn load(&self) -> Result<AppConfig> {
        let file_config = match &self.config_override {
            Some(override_path) => {
                let path = expand_path(&override_path.to_string_lossy());
                Some(self.load_from_path(&path).await.with_context(|| {
                    format!(
                        "Failed to load config from override path: {}",
                        override_path.display()
                    )
                })?)
            }
            None => self.search_and_load().await?,
        };

        let env_config = RawConfig::from_env_with(|name| std::env::var(name).ok());
        Ok(self.resolve(file_config.unwrap_or_default(), env_config))
    }

    /// Merge the sources in priority order
    fn resolve(&self, file_config: RawConfig, env_config: RawConfig) -> AppConfig {
        let merged = self
            .overrides
            .clone()
            .or(file_config)
            .or(env_config);

        let mut agent = merged.agent.clone().unwrap_or_default();
        if let Some(max_iterations) = self.max_iterations_override {
            agent.max_iterations = max_iterations;
        }

        AppConfig {
            knowledge_file: expand_path(
                merged
                    .knowledge_file
                    .as_deref()
                    .unwrap_or(DEFAULT_KNOWLEDGE_FILE),
            ),
            database: expand_path(merged.database.as_deref().unwrap_or(DEFAULT_DATABASE)),
            agent,
            llm: merged,
        }
    }

    /// Search for a config file in priority order
    async fn search_and_load(&self) -> Result<Option<RawConfig>> {
        let cwd = std::env::current_dir()?;
        if let Some(config) = self.try_load_dir(&cwd).await? {
            return Ok(Some(config));
        }

        if let Some(config_dir) = dirs::config_dir() {
            let config_path = config_dir.join("sage").join("config.json");
            if config_path.exists() {
                debug!(path = %config_path.display(), "using user config");
                return Ok(Some(self.load_file(&config_path).await?));
            }
        }

        Ok(None)
    }

    /// Try ./sage.json, then ./.sage/config.json under `dir`
    async fn try_load_dir(&self, dir: &Path) -> Result<Option<RawConfig>> {
        for candidate in [dir.join("sage.json"), dir.join(".sage").join("config.json")] {
            if candidate.exists() {
                debug!(path = %candidate.display(), "using project config");
                return Ok(Some(self.load_file(&candidate).await?));
            }
        }
        Ok(None)
    }

    /// Load configuration from a specific path (file or directory)
    async fn load_from_path(&self, path: &Path) -> Result<RawConfig> {
        if path.is_file() {
            self.load_file(path).await
        } else if path.is_dir() {
            let config_file = path.join("config.json");
            if config_file.exists() {
                self.load_file(&config_file).await
            } else {
                Err(anyhow!(
                    "No config.json found in directory: {}",
                    path.display()
                ))
            }
        } else {
            Err(anyhow!("Config path does not exist: {}", path.display()))
        }
    }

    /// Load a single config file
    async fn load_file(&self, path: &Path) -> Result<RawConfig> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }
}

/// Expand `~` and `$VARS`; unknown variables leave the path as written
pub fn expand_path(raw: &str) -> PathBuf {
    match shellexpand::full(raw) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(_) => PathBuf::from(shellexpand::tilde(raw).as_ref()),
    }
}
