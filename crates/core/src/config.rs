//! Configuration management for GreenGuide.
//!
//! Configuration is layered, later sources winning:
//! - Built-in defaults
//! - Config file (`.greenguide/config.yaml` or `GREENGUIDE_CONFIG`)
//! - Environment variables
//! - Command-line flags
//!
//! The configuration is workspace-centric: indexes, prompt overrides and the
//! config file all live under `<workspace>/.greenguide/`.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

const KNOWN_LLM_PROVIDERS: [&str; 2] = ["ollama", "openai"];
const KNOWN_EMBEDDING_PROVIDERS: [&str; 3] = ["trigram", "ollama", "openai"];
const KNOWN_SEARCH_PROVIDERS: [&str; 1] = ["tavily"];

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .greenguide/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Explicit API key for the chat provider (`GREENGUIDE_API_KEY`)
    pub api_key: Option<String>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    pub llm: LlmSettings,
    pub embedding: EmbeddingSettings,
    pub search: SearchSettings,
    pub retrieval: RetrievalSettings,
    pub assistant: AssistantSettings,

    /// Knowledge domains served by this process
    pub domains: Vec<DomainConfig>,
}

/// Chat/generation provider settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct LlmSettings {
    /// "ollama" or "openai"
    pub provider: String,

    /// Model used for grading, rewriting, searching and generation
    pub model: String,

    /// Vision-capable model for image summaries (defaults to `model`)
    pub vision_model: Option<String>,

    /// Custom endpoint URL
    pub endpoint: Option<String>,

    /// Environment variable holding the API key
    pub api_key_env: Option<String>,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            model: "llama3.2-vision".to_string(),
            vision_model: None,
            endpoint: None,
            api_key_env: None,
            timeout_secs: 120,
        }
    }
}

impl LlmSettings {
    /// Model used for the image summarizer.
    pub fn vision_model(&self) -> &str {
        self.vision_model.as_deref().unwrap_or(&self.model)
    }
}

/// Embedding provider settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct EmbeddingSettings {
    /// "trigram", "ollama" or "openai"
    pub provider: String,
    pub model: String,
    pub dimensions: usize,
    pub endpoint: Option<String>,
    pub api_key_env: Option<String>,

    /// Maximum texts per embedding request
    pub batch_size: usize,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: "trigram".to_string(),
            model: "trigram-v1".to_string(),
            dimensions: 384,
            endpoint: None,
            api_key_env: None,
            batch_size: 64,
            timeout_secs: 30,
        }
    }
}

/// Web search provider settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct SearchSettings {
    pub provider: String,
    pub endpoint: Option<String>,
    pub api_key_env: String,
    pub max_results: usize,
    pub timeout_secs: u64,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            provider: "tavily".to_string(),
            endpoint: None,
            api_key_env: "TAVILY_API_KEY".to_string(),
            max_results: 3,
            timeout_secs: 30,
        }
    }
}

/// Chunking and retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct RetrievalSettings {
    pub top_k: usize,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            top_k: 1,
            chunk_size: 500,
            chunk_overlap: 100,
        }
    }
}

/// Persona and run settings shared by every domain.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct AssistantSettings {
    /// Geography the assistant persona is scoped to
    pub region: String,

    /// Language used when the question is written in the default script
    pub default_language: String,

    /// Optional deadline for a whole pipeline run
    pub run_timeout_secs: Option<u64>,
}

impl Default for AssistantSettings {
    fn default() -> Self {
        Self {
            region: "Jordan".to_string(),
            default_language: "English".to_string(),
            run_timeout_secs: None,
        }
    }
}

/// A knowledge domain and the folder holding its documents.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DomainConfig {
    pub id: u32,
    pub label: String,

    /// Document folder, relative paths resolve against the workspace
    pub documents: PathBuf,
}

impl DomainConfig {
    pub fn new(id: u32, label: impl Into<String>, documents: impl Into<PathBuf>) -> Self {
        Self {
            id,
            label: label.into(),
            documents: documents.into(),
        }
    }

    /// Absolute document folder for this domain.
    pub fn documents_path(&self, workspace: &Path) -> PathBuf {
        if self.documents.is_absolute() {
            self.documents.clone()
        } else {
            workspace.join(&self.documents)
        }
    }
}

fn default_domains() -> Vec<DomainConfig> {
    vec![
        DomainConfig::new(1, "Agriculture and Farming", "documents/Farming"),
        DomainConfig::new(2, "Food and Nutrition", "documents/Food_and_Nutrition"),
        DomainConfig::new(3, "Nutrition for Athletes", "documents/Athletes"),
    ]
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    workspace: Option<WorkspaceConfig>,
    logging: Option<LoggingConfig>,
    llm: Option<LlmSettings>,
    embedding: Option<EmbeddingSettings>,
    search: Option<SearchSettings>,
    retrieval: Option<RetrievalSettings>,
    assistant: Option<AssistantSettings>,
    domains: Option<Vec<DomainConfig>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WorkspaceConfig {
    path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            api_key: None,
            log_level: None,
            verbose: false,
            no_color: false,
            llm: LlmSettings::default(),
            embedding: EmbeddingSettings::default(),
            search: SearchSettings::default(),
            retrieval: RetrievalSettings::default(),
            assistant: AssistantSettings::default(),
            domains: default_domains(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables, the config file and defaults.
    ///
    /// Environment variables:
    /// - `GREENGUIDE_WORKSPACE`: Override workspace path
    /// - `GREENGUIDE_CONFIG`: Path to config file
    /// - `GREENGUIDE_PROVIDER`: Chat provider
    /// - `GREENGUIDE_MODEL`: Chat model
    /// - `GREENGUIDE_API_KEY`: Chat provider API key
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    pub fn load() -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(workspace) = std::env::var("GREENGUIDE_WORKSPACE") {
            config.workspace = PathBuf::from(workspace);
        }

        if let Ok(config_file) = std::env::var("GREENGUIDE_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = match config.config_file {
            Some(ref cf) => cf.clone(),
            None => config.config_path(),
        };

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        // Environment variables override YAML config
        if let Ok(provider) = std::env::var("GREENGUIDE_PROVIDER") {
            config.llm.provider = provider;
        }

        if let Ok(model) = std::env::var("GREENGUIDE_MODEL") {
            config.llm.model = model;
        }

        config.api_key = std::env::var("GREENGUIDE_API_KEY").ok();
        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = Some(level);
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    pub fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        self.merge_yaml_str(&contents)
            .map_err(|e| AppError::Config(format!("Failed to parse config file {:?}: {}", path, e)))
    }

    fn merge_yaml_str(&self, contents: &str) -> AppResult<Self> {
        let config_file: ConfigFile = serde_yaml::from_str(contents)?;
        let mut result = self.clone();

        if let Some(path) = config_file.workspace.and_then(|ws| ws.path) {
            result.workspace = PathBuf::from(path);
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        if let Some(llm) = config_file.llm {
            result.llm = llm;
        }
        if let Some(embedding) = config_file.embedding {
            result.embedding = embedding;
        }
        if let Some(search) = config_file.search {
            result.search = search;
        }
        if let Some(retrieval) = config_file.retrieval {
            result.retrieval = retrieval;
        }
        if let Some(assistant) = config_file.assistant {
            result.assistant = assistant;
        }
        if let Some(domains) = config_file.domains {
            result.domains = domains;
        }

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// CLI flags take precedence over environment variables and the config file.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        provider: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(provider) = provider {
            self.llm.provider = provider;
        }

        if let Some(model) = model {
            self.llm.model = model;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .greenguide directory.
    pub fn greenguide_dir(&self) -> PathBuf {
        self.workspace.join(".greenguide")
    }

    /// Default config file location inside the workspace.
    pub fn config_path(&self) -> PathBuf {
        self.greenguide_dir().join("config.yaml")
    }

    /// Directory holding prompt overrides.
    pub fn prompts_dir(&self) -> PathBuf {
        self.greenguide_dir().join("prompts")
    }

    /// Ensure the .greenguide directory exists.
    pub fn ensure_greenguide_dir(&self) -> AppResult<()> {
        let dir = self.greenguide_dir();
        if !dir.exists() {
            std::fs::create_dir_all(&dir).map_err(|e| {
                AppError::Config(format!("Failed to create .greenguide directory: {}", e))
            })?;
        }
        Ok(())
    }

    /// Look up a configured domain by id.
    pub fn domain(&self, id: u32) -> Option<&DomainConfig> {
        self.domains.iter().find(|d| d.id == id)
    }

    /// API key for the chat provider.
    pub fn llm_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| resolve_secret(self.llm.api_key_env.as_deref()))
    }

    /// API key for the embedding provider.
    pub fn embedding_api_key(&self) -> Option<String> {
        resolve_secret(self.embedding.api_key_env.as_deref())
    }

    /// API key for the web search provider.
    pub fn search_api_key(&self) -> Option<String> {
        resolve_secret(Some(self.search.api_key_env.as_str()))
    }

    /// Validate the configuration before building any domain.
    pub fn validate(&self) -> AppResult<()> {
        check_known("LLM provider", &self.llm.provider, &KNOWN_LLM_PROVIDERS)?;
        check_known(
            "embedding provider",
            &self.embedding.provider,
            &KNOWN_EMBEDDING_PROVIDERS,
        )?;
        check_known("search provider", &self.search.provider, &KNOWN_SEARCH_PROVIDERS)?;

        if self.llm.provider == "openai" && self.llm_api_key().is_none() {
            return Err(AppError::Config(format!(
                "API key not found for provider 'openai' (set GREENGUIDE_API_KEY or {})",
                self.llm.api_key_env.as_deref().unwrap_or("llm.apiKeyEnv")
            )));
        }

        if self.embedding.dimensions == 0 {
            return Err(AppError::Config(
                "embedding.dimensions must be greater than zero".to_string(),
            ));
        }

        let retrieval = &self.retrieval;
        if retrieval.top_k == 0 {
            return Err(AppError::Config(
                "retrieval.topK must be greater than zero".to_string(),
            ));
        }
        if retrieval.chunk_size == 0 || retrieval.chunk_overlap >= retrieval.chunk_size {
            return Err(AppError::Config(format!(
                "retrieval.chunkOverlap ({}) must be smaller than chunkSize ({})",
                retrieval.chunk_overlap, retrieval.chunk_size
            )));
        }

        let mut seen = HashSet::new();
        for domain in &self.domains {
            if domain.label.trim().is_empty() {
                return Err(AppError::Config(format!(
                    "Domain {} has an empty label",
                    domain.id
                )));
            }
            if !seen.insert(domain.id) {
                return Err(AppError::Config(format!(
                    "Duplicate domain id: {}",
                    domain.id
                )));
            }
        }

        Ok(())
    }
}

fn check_known(kind: &str, value: &str, known: &[&str]) -> AppResult<()> {
    if known.contains(&value) {
        Ok(())
    } else {
        Err(AppError::Config(format!(
            "Unknown {}: {}. Supported: {}",
            kind,
            value,
            known.join(", ")
        )))
    }
}

fn resolve_secret(env_var: Option<&str>) -> Option<String> {
    let value = std::env::var(env_var?).ok()?;
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
