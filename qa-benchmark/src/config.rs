//! Configuration management for the QA benchmark
//!
//! Loads evaluation, backend and oracle settings from TOML files. Every
//! field has a default, so a partial file (or no file) is fine.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use verdict::{EvaluationMode, Thresholds};

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub evaluation: EvaluationConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub syntax: SyntaxConfig,
    #[serde(default)]
    pub oracle: OracleConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Which HTTP API a backend speaks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Local Ollama server
    #[default]
    Ollama,
    /// OpenAI or any OpenAI-compatible server
    OpenAI,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Ollama => "ollama",
            ProviderKind::OpenAI => "openai",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Verdict settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationConfig {
    #[serde(default)]
    pub mode: EvaluationMode,
    #[serde(default)]
    pub thresholds: Thresholds,
    /// Items scored at once; 1 keeps the run strictly sequential
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            mode: EvaluationMode::default(),
            thresholds: Thresholds::default(),
            concurrency: default_concurrency(),
        }
    }
}

/// Sentence-embedding backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub backend: ProviderKind,
    /// Embedding model identifier; Ollama's all-minilm is all-MiniLM-L6-v2
    #[serde(default = "default_embedding_model")]
    pub model: String,
    /// Overrides the backend's default base URL
    #[serde(default)]
    pub base_url: Option<String>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: ProviderKind::Ollama,
            model: default_embedding_model(),
            base_url: None,
        }
    }
}

/// Dependency-parse service used by assertion mode
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyntaxConfig {
    /// Without a parser, assertion mode compares lowercased full texts
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_syntax_model")]
    pub model: String,
    #[serde(default = "default_syntax_url")]
    pub base_url: String,
}

impl Default for SyntaxConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            model: default_syntax_model(),
            base_url: default_syntax_url(),
        }
    }
}

/// Question-answering model under test
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleConfig {
    #[serde(default)]
    pub provider: ProviderKind,
    #[serde(default = "default_oracle_model")]
    pub model: String,
    #[serde(default)]
    pub base_url: Option<String>,
    /// Requests per minute
    #[serde(default = "default_rpm")]
    pub rpm: u32,
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    #[serde(default = "default_max_retry_delay_ms")]
    pub max_retry_delay_ms: u64,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Sent ahead of every question
    #[serde(default)]
    pub system_prompt: Option<String>,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Ollama,
            model: default_oracle_model(),
            base_url: None,
            rpm: default_rpm(),
            retry_count: default_retry_count(),
            retry_delay_ms: default_retry_delay_ms(),
            max_retry_delay_ms: default_max_retry_delay_ms(),
            timeout_ms: default_timeout_ms(),
            temperature: None,
            max_tokens: default_max_tokens(),
            system_prompt: None,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    #[serde(default = "default_true")]
    pub write_json: bool,
    /// Delay between items in the step-by-step display; 0 prints a plain report
    #[serde(default)]
    pub pace_ms: u64,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            write_json: true,
            pace_ms: 0,
        }
    }
}

// Default value functions
fn default_true() -> bool { true }
fn default_concurrency() -> usize { 1 }
fn default_embedding_model() -> String { "all-minilm".to_string() }
fn default_syntax_model() -> String { "en_core_web_sm".to_string() }
fn default_syntax_url() -> String { "http://localhost:8090".to_string() }
fn default_oracle_model() -> String { "llama3".to_string() }
fn default_rpm() -> u32 { 60 }
fn default_retry_count() -> u32 { 3 }
fn default_retry_delay_ms() -> u64 { 1000 }
fn default_max_retry_delay_ms() -> u64 { 60_000 }
fn default_timeout_ms() -> u64 { 120_000 }
fn default_max_tokens() -> u32 { 1024 }
fn default_output_dir() -> String { "results/runs".to_string() }

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load from the default config location or return defaults
    pub fn load_or_default() -> Self {
        let config_paths = [
            "config/qa-benchmark.toml",
            "../config/qa-benchmark.toml",
        ];

        for path in &config_paths {
            if let Ok(config) = Self::from_file(path) {
                tracing::info!("Loaded configuration from {}", path);
                return config;
            }
        }

        tracing::info!("Using default configuration");
        Self::default()
    }

    /// Save configuration to a TOML file
    pub fn save_toml<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Parse(e.to_string()))?;
        fs::write(path, content)
            .map_err(|e| ConfigError::Io(e.to_string()))?;
        Ok(())
    }
}

/// Configuration errors
#[derive(Debug, Clone)]
pub enum ConfigError {
    Io(String),
    Parse(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}
