//! Domain types shared by the retrieval engine, the tool service and the
//! orchestrator.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt::Write as _;

/// Returned by formatting helpers when there is nothing to cite.
pub const NO_DOCUMENTS_FOUND: &str = "No relevant documents found.";

/// A bounded segment of one source document; the unit of retrieval.
///
/// - `text`: chunk payload, sentences joined with `". "` and ending in `.`
/// - `source`: document name (file stem)
/// - `chunk_id`: zero-based position within `source`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub source: String,
    pub chunk_id: usize,
}

/// One ranked hit. `score` lies in (0, 1]; 1.0 means zero distance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub text: String,
    pub source: String,
    pub chunk_id: usize,
    pub score: f64,
}

impl RetrievalResult {
    pub fn from_chunk(chunk: &Chunk, score: f64) -> Self {
        Self { text: chunk.text.clone(), source: chunk.source.clone(), chunk_id: chunk.chunk_id, score }
    }
}

/// Render results as a citation block, one `[Source n: ...]` header per hit.
/// Returns an empty string for no results; callers decide on a sentinel.
pub fn format_results(results: &[RetrievalResult]) -> String {
    let mut out = String::new();
    for (i, r) in results.iter().enumerate() {
        if i > 0 { out.push('\n'); }
        let _ = writeln!(out, "[Source {}: {} (relevance: {:.2})]\n{}", i + 1, r.source, r.score, r.text);
    }
    out
}

/// Output of the decision step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub needs_retrieval: bool,
    pub reasoning: String,
    #[serde(default)]
    pub search_query: Option<String>,
    #[serde(default)]
    pub specialist_prompt: Option<String>,
}

impl Decision {
    /// Safe default used whenever the decision step cannot be trusted:
    /// retrieve using the user's own words.
    pub fn fallback(query: &str, reasoning: impl Into<String>) -> Self {
        Self { needs_retrieval: true, reasoning: reasoning.into(), search_query: Some(query.to_string()), specialist_prompt: None }
    }

    /// The query to send to the retriever, falling back to the user query
    /// when the decision left it blank.
    pub fn search_query_or<'a>(&'a self, query: &'a str) -> &'a str {
        match self.search_query.as_deref().map(str::trim) {
            Some(q) if !q.is_empty() => q,
            _ => query,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolParameter {
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    #[serde(default = "default_required")]
    pub required: bool,
}

fn default_required() -> bool { true }

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: BTreeMap<String, ToolParameter>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolListResponse {
    pub tools: Vec<ToolDefinition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocationRequest {
    pub tool_name: String,
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocationResponse {
    pub tool_name: String,
    pub results: Vec<RetrievalResult>,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

fn default_status() -> String { "success".to_string() }

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Healthy,
    Degraded,
}

/// Health of the tool service. Serialized with the wire names
/// `index_loaded` / `num_documents`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: ServiceStatus,
    #[serde(rename = "index_loaded")]
    pub ready: bool,
    #[serde(rename = "num_documents")]
    pub indexed_count: usize,
}
