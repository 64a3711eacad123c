//! Typed view of the merged configuration.
//!
//! Every section has defaults, so an empty `config.toml` (or none at all)
//! yields a runnable setup that uses the hashing embedder and local paths.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::config::expand_path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub knowledge_base: KnowledgeBaseSettings,
    pub retrieval: RetrievalSettings,
    pub embedding: EmbeddingSettings,
    pub tool_server: ToolServerSettings,
    pub orchestrator: OrchestratorSettings,
    pub agents: AgentsSettings,
    pub logging: LoggingSettings,
}

impl Settings {
    /// Base URL of the tool service as seen by the orchestrator.
    pub fn tool_server_url(&self) -> String {
        let url = self.orchestrator.tool_server_url.trim();
        if url.is_empty() {
            format!("http://{}:{}", self.tool_server.host, self.tool_server.port)
        } else {
            url.trim_end_matches('/').to_string()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KnowledgeBaseSettings {
    pub raw_path: String,
    pub processed_path: String,
    pub embeddings_file: String,
    pub metadata_file: String,
    pub chunks_file: String,
}

impl Default for KnowledgeBaseSettings {
    fn default() -> Self {
        Self {
            raw_path: "data/raw".to_string(),
            processed_path: "data/processed".to_string(),
            embeddings_file: "data/processed/index.vec".to_string(),
            metadata_file: "data/processed/index.meta.json".to_string(),
            chunks_file: "data/processed/chunks.json".to_string(),
        }
    }
}

impl KnowledgeBaseSettings {
    pub fn raw_dir(&self) -> PathBuf { expand_path(&self.raw_path) }
    pub fn processed_dir(&self) -> PathBuf { expand_path(&self.processed_path) }
    pub fn embeddings_path(&self) -> PathBuf { expand_path(&self.embeddings_file) }
    pub fn metadata_path(&self) -> PathBuf { expand_path(&self.metadata_file) }
    pub fn chunks_path(&self) -> PathBuf { expand_path(&self.chunks_file) }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    /// Target chunk size in words.
    pub chunk_size: usize,
    /// Overlap carried between consecutive chunks, in words.
    pub chunk_overlap: usize,
    pub top_k: usize,
    pub max_top_k: usize,
    pub max_query_chars: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self { chunk_size: 500, chunk_overlap: 50, top_k: 5, max_top_k: 20, max_query_chars: 1000 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    Hash,
    Model,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub provider: EmbeddingProvider,
    /// Vector width for the hashing provider; model providers report their own.
    pub dimension: usize,
    pub model_dir: String,
    pub max_len: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self { provider: EmbeddingProvider::Hash, dimension: 384, model_dir: "models/embedding".to_string(), max_len: 256 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolServerSettings {
    pub host: String,
    pub port: u16,
    pub request_timeout_secs: u64,
}

impl Default for ToolServerSettings {
    fn default() -> Self {
        Self { host: "127.0.0.1".to_string(), port: 8000, request_timeout_secs: 30 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorSettings {
    /// Empty means "derive from `tool_server`".
    pub tool_server_url: String,
    pub health_timeout_secs: u64,
    pub tool_timeout_secs: u64,
    pub max_attempts: u32,
    pub base_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            tool_server_url: String::new(),
            health_timeout_secs: 5,
            tool_timeout_secs: 30,
            max_attempts: 3,
            base_backoff_ms: 1000,
            max_backoff_ms: 4000,
        }
    }
}

impl OrchestratorSettings {
    pub fn health_timeout(&self) -> Duration { Duration::from_secs(self.health_timeout_secs) }
    pub fn tool_timeout(&self) -> Duration { Duration::from_secs(self.tool_timeout_secs) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentProvider {
    /// Any OpenAI-compatible `/chat/completions` endpoint (Groq, vLLM, Ollama, ...).
    Openai,
    Gemini,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    pub provider: AgentProvider,
    pub base_url: String,
    pub model: String,
    pub api_key: String,
    pub api_key_env: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl AgentSettings {
    pub fn decision_defaults() -> Self {
        Self {
            provider: AgentProvider::Openai,
            base_url: "https://api.groq.com/openai/v1".to_string(),
            model: "llama-3.3-70b-versatile".to_string(),
            api_key: String::new(),
            api_key_env: "GROQ_API_KEY".to_string(),
            temperature: 0.1,
            max_tokens: 1000,
            timeout_secs: 30,
        }
    }

    pub fn synthesis_defaults() -> Self {
        Self {
            provider: AgentProvider::Gemini,
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-1.5-flash".to_string(),
            api_key: String::new(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            temperature: 0.3,
            max_tokens: 2000,
            timeout_secs: 30,
        }
    }

    /// Explicit `api_key` wins; otherwise read the variable named by `api_key_env`.
    pub fn resolved_api_key(&self) -> Option<String> {
        if !self.api_key.trim().is_empty() {
            return Some(self.api_key.trim().to_string());
        }
        if self.api_key_env.is_empty() { return None; }
        std::env::var(&self.api_key_env).ok().filter(|k| !k.trim().is_empty())
    }

    pub fn timeout(&self) -> Duration { Duration::from_secs(self.timeout_secs) }
}

impl Default for AgentSettings {
    fn default() -> Self { Self::decision_defaults() }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentsSettings {
    pub decision: AgentSettings,
    pub synthesis: AgentSettings,
}

impl Default for AgentsSettings {
    fn default() -> Self {
        Self { decision: AgentSettings::decision_defaults(), synthesis: AgentSettings::synthesis_defaults() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self { Self { level: "info".to_string(), json: false } }
}
