//! Seams between the orchestrator and its remote collaborators.

use async_trait::async_trait;
use serde_json::{Map, Value};

use docqa_core::types::{HealthReport, ToolInvocationResponse};
use docqa_core::Result;

/// Decides whether a query needs retrieval. Returns the raw model output,
/// which is expected (but not trusted) to be a JSON `Decision`.
#[async_trait]
pub trait DecisionService: Send + Sync {
    async fn decide(&self, query: &str) -> Result<String>;
}

/// Turns a fully composed prompt into the final answer text.
#[async_trait]
pub trait SynthesisService: Send + Sync {
    async fn synthesize(&self, prompt: &str) -> Result<String>;
}

/// Client side of the tool service protocol.
#[async_trait]
pub trait ToolClient: Send + Sync {
    async fn invoke(&self, tool_name: &str, parameters: Map<String, Value>) -> Result<ToolInvocationResponse>;
    async fn health(&self) -> Result<HealthReport>;
}
