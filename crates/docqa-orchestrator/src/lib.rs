//! Query workflow: decide, optionally retrieve through the tool service,
//! then synthesize an answer.

pub mod agents;
pub mod decision;
pub mod llm;
pub mod orchestrator;
pub mod prompts;
pub mod retry;
pub mod services;
pub mod timing;
pub mod tool_client;

pub use decision::{parse_decision, DecisionParse};
pub use orchestrator::{Orchestrator, QueryOutcome, Timeouts, RETRIEVAL_TOOL};
pub use retry::RetryPolicy;
pub use services::{DecisionService, SynthesisService, ToolClient};
pub use tool_client::HttpToolClient;
