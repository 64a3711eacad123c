use async_trait::async_trait;
use std::sync::Arc;

use docqa_core::Result;

use crate::llm::{ChatModel, ChatRequest};
use crate::prompts::{decision_message, MANAGER_SYSTEM_PROMPT};
use crate::services::{DecisionService, SynthesisService};

/// Decision step backed by a chat model in JSON mode.
pub struct ModelDecisionService { model: Arc<dyn ChatModel> }

impl ModelDecisionService {
    pub fn new(model: Arc<dyn ChatModel>) -> Self { Self { model } }
}

#[async_trait]
impl DecisionService for ModelDecisionService {
    async fn decide(&self, query: &str) -> Result<String> {
        let request = ChatRequest { system: Some(MANAGER_SYSTEM_PROMPT.to_string()), user: decision_message(query), json_mode: true };
        self.model.complete(&request).await
    }
}

/// Synthesis step: the composed prompt goes out as a single user turn.
pub struct ModelSynthesisService { model: Arc<dyn ChatModel> }

impl ModelSynthesisService {
    pub fn new(model: Arc<dyn ChatModel>) -> Self { Self { model } }
}

#[async_trait]
impl SynthesisService for ModelSynthesisService {
    async fn synthesize(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest { system: None, user: prompt.to_string(), json_mode: false };
        self.model.complete(&request).await
    }
}
