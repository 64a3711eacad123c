use serde_json::{Map, Value};

use docqa_core::types::{RetrievalResult, ToolDefinition};
use docqa_core::Result;

/// A named capability the tool service can invoke on behalf of a client.
///
/// `invoke` runs on a blocking thread, so implementations may do CPU-bound
/// work directly.
pub trait Tool: Send + Sync {
    fn definition(&self) -> ToolDefinition;
    fn is_ready(&self) -> bool;
    fn invoke(&self, parameters: &Map<String, Value>) -> Result<Vec<RetrievalResult>>;

    fn name(&self) -> String { self.definition().name }
}
