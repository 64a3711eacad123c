use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

use docqa_core::types::{HealthReport, RetrievalResult, ServiceStatus, ToolDefinition};
use docqa_core::{Error, Result};
use docqa_retriever::Retriever;
use docqa_vector::IndexPaths;

use crate::document_retriever::{DocumentRetrieverTool, ValidationLimits};
use crate::tool::Tool;

/// Outcome of startup: `Ready` when a persisted index was found and loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    Ready,
    Degraded,
}

/// Owns the tool registry and the retriever the tools search.
pub struct ToolService {
    tools: HashMap<String, Arc<dyn Tool>>,
    retriever: Arc<Retriever>,
    index_paths: IndexPaths,
    state: ServiceState,
}

impl ToolService {
    /// Try to load the persisted index, then register `document_retriever`.
    /// A missing or unreadable index leaves the service `Degraded`.
    pub fn start(retriever: Arc<Retriever>, index_paths: IndexPaths, limits: ValidationLimits) -> Self {
        let state = if !index_paths.exist() {
            tracing::warn!(vectors = %index_paths.vectors.display(), metadata = %index_paths.metadata.display(), "index files not found, serving degraded");
            ServiceState::Degraded
        } else {
            match retriever.load_index(&index_paths) {
                Ok(()) if retriever.is_ready() => ServiceState::Ready,
                Ok(()) => { tracing::warn!("index loaded but empty, serving degraded"); ServiceState::Degraded }
                Err(e) => { tracing::warn!(error = %e, "failed to load index, serving degraded"); ServiceState::Degraded }
            }
        };
        Self::with_state(retriever, index_paths, limits, state)
    }

    /// Register `document_retriever` over an already prepared retriever.
    pub fn with_state(retriever: Arc<Retriever>, index_paths: IndexPaths, limits: ValidationLimits, state: ServiceState) -> Self {
        let mut service = Self { tools: HashMap::new(), retriever: retriever.clone(), index_paths, state };
        service.register(Arc::new(DocumentRetrieverTool::new(retriever, limits)));
        tracing::info!(?state, tools = service.tools.len(), "tool service started");
        service
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) { self.tools.insert(tool.name(), tool); }

    pub fn state(&self) -> ServiceState { self.state }

    /// Definitions of all registered tools, ordered by name.
    pub fn list_tools(&self) -> Vec<ToolDefinition> {
        let mut defs: Vec<ToolDefinition> = self.tools.values().map(|t| t.definition()).collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    pub async fn invoke(&self, tool_name: &str, parameters: Map<String, Value>) -> Result<Vec<RetrievalResult>> {
        let tool = self.tools.get(tool_name).cloned().ok_or_else(|| Error::ToolNotFound(tool_name.to_string()))?;
        if !tool.is_ready() {
            return Err(Error::ToolNotReady(tool_name.to_string()));
        }
        let results = tokio::task::spawn_blocking(move || tool.invoke(&parameters))
            .await
            .map_err(|e| Error::Internal(format!("Tool invocation failed: {e}")))?;
        match &results {
            Ok(r) => tracing::info!(tool = tool_name, results = r.len(), "tool invoke success"),
            Err(e) => tracing::error!(tool = tool_name, error = %e, "tool invoke failed"),
        }
        results
    }

    pub fn health(&self) -> HealthReport {
        let ready = self.retriever.is_ready();
        HealthReport {
            status: if ready { ServiceStatus::Healthy } else { ServiceStatus::Degraded },
            ready,
            indexed_count: if ready { self.retriever.indexed_count() } else { 0 },
        }
    }

    /// Re-read the persisted index and swap it in atomically.
    pub async fn reload(&self) -> Result<usize> {
        let retriever = self.retriever.clone();
        let paths = self.index_paths.clone();
        let count = tokio::task::spawn_blocking(move || retriever.store().reload(&paths))
            .await
            .map_err(|e| Error::Internal(format!("reload task failed: {e}")))??;
        tracing::info!(count, "index reloaded");
        Ok(count)
    }
}
