use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

use docqa_core::settings::RetrievalSettings;
use docqa_core::types::{RetrievalResult, ToolDefinition, ToolParameter};
use docqa_core::{Error, Result};
use docqa_retriever::Retriever;

use crate::tool::Tool;

pub const DOCUMENT_RETRIEVER: &str = "document_retriever";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationLimits {
    pub default_top_k: usize,
    pub max_top_k: usize,
    pub max_query_chars: usize,
}

impl Default for ValidationLimits {
    fn default() -> Self { Self { default_top_k: 5, max_top_k: 20, max_query_chars: 1000 } }
}

impl From<&RetrievalSettings> for ValidationLimits {
    fn from(r: &RetrievalSettings) -> Self {
        Self { default_top_k: r.top_k, max_top_k: r.max_top_k, max_query_chars: r.max_query_chars }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedQuery {
    pub query: String,
    pub top_k: usize,
}

/// `query` must be a non-blank string and is cut to `max_query_chars`.
/// `top_k` outside `1..=max_top_k`, or not an integer, falls back to the default.
pub fn validate_params(parameters: &Map<String, Value>, limits: &ValidationLimits) -> Result<ValidatedQuery> {
    let raw = match parameters.get("query") {
        Some(Value::String(s)) => s.trim(),
        Some(Value::Null) | None => "",
        Some(other) => return Err(Error::InvalidParameter(format!("query must be a string, got {other}"))),
    };
    if raw.is_empty() {
        return Err(Error::InvalidParameter("Query parameter is required and cannot be empty".into()));
    }
    let char_count = raw.chars().count();
    let query = if char_count > limits.max_query_chars {
        tracing::warn!(chars = char_count, max = limits.max_query_chars, "query too long, truncating");
        raw.chars().take(limits.max_query_chars).collect()
    } else {
        raw.to_string()
    };

    let top_k = match parameters.get("top_k") {
        None | Some(Value::Null) => limits.default_top_k,
        Some(v) => match v.as_u64() {
            Some(k) if (1..=limits.max_top_k as u64).contains(&k) => k as usize,
            _ => {
                tracing::warn!(top_k = %v, "invalid top_k, using default");
                limits.default_top_k
            }
        },
    };
    Ok(ValidatedQuery { query, top_k })
}

pub struct DocumentRetrieverTool {
    retriever: Arc<Retriever>,
    limits: ValidationLimits,
}

impl DocumentRetrieverTool {
    pub fn new(retriever: Arc<Retriever>, limits: ValidationLimits) -> Self { Self { retriever, limits } }
}

impl Tool for DocumentRetrieverTool {
    fn definition(&self) -> ToolDefinition {
        let mut parameters = BTreeMap::new();
        parameters.insert("query".to_string(), ToolParameter {
            kind: "string".into(),
            description: "The search query to find relevant documents".into(),
            required: true,
        });
        parameters.insert("top_k".to_string(), ToolParameter {
            kind: "integer".into(),
            description: format!("Number of results to return (default: {})", self.limits.default_top_k),
            required: false,
        });
        ToolDefinition {
            name: DOCUMENT_RETRIEVER.to_string(),
            description: "Retrieves relevant text snippets from the knowledge base based on a search query. \
                          Returns top-k most relevant document chunks with source attribution."
                .to_string(),
            parameters,
        }
    }

    fn name(&self) -> String { DOCUMENT_RETRIEVER.to_string() }

    fn is_ready(&self) -> bool { self.retriever.is_ready() }

    fn invoke(&self, parameters: &Map<String, Value>) -> Result<Vec<RetrievalResult>> {
        let ValidatedQuery { query, top_k } = validate_params(parameters, &self.limits)?;
        tracing::info!(tool = DOCUMENT_RETRIEVER, query = %query.chars().take(100).collect::<String>(), top_k, "tool invocation");
        self.retriever.retrieve(&query, top_k)
    }
}
