use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use docqa_core::settings::Settings;
use docqa_core::types::{format_results, Decision, HealthReport};
use docqa_core::Result;

use crate::agents::{ModelDecisionService, ModelSynthesisService};
use crate::decision::{parse_decision, ERROR_FALLBACK_REASONING};
use crate::llm::build_chat_model;
use crate::prompts::{apology, specialist_prompt, synthesis_input};
use crate::retry::{execute_with_retry, with_timeout, RetryPolicy};
use crate::services::{DecisionService, SynthesisService, ToolClient};
use crate::timing::{timed, Stage, StageTiming};
use crate::tool_client::HttpToolClient;

pub const RETRIEVAL_TOOL: &str = "document_retriever";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub decision: Duration,
    pub tool: Duration,
    pub synthesis: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self { decision: Duration::from_secs(30), tool: Duration::from_secs(30), synthesis: Duration::from_secs(30) }
    }
}

/// What one query produced, beyond the answer text.
#[derive(Debug, Clone, Serialize)]
pub struct QueryOutcome {
    pub answer: String,
    pub decision: Decision,
    pub retrieval_attempted: bool,
    /// Retrieved chunks that made it into the synthesis prompt.
    pub results_used: usize,
    /// Decision, one entry per tool call attempt, synthesis.
    pub timings: Vec<StageTiming>,
}

/// Drives decide -> (retrieve) -> synthesize for each query. Holds only
/// client handles; nothing carries over between queries.
pub struct Orchestrator {
    decision: Arc<dyn DecisionService>,
    synthesis: Arc<dyn SynthesisService>,
    tools: Arc<dyn ToolClient>,
    retry: RetryPolicy,
    timeouts: Timeouts,
}

impl Orchestrator {
    pub fn new(
        decision: Arc<dyn DecisionService>,
        synthesis: Arc<dyn SynthesisService>,
        tools: Arc<dyn ToolClient>,
        retry: RetryPolicy,
        timeouts: Timeouts,
    ) -> Self {
        Self { decision, synthesis, tools, retry, timeouts }
    }

    /// Wire HTTP clients for the tool service and both chat models.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let o = &settings.orchestrator;
        let url = settings.tool_server_url();
        let tools = HttpToolClient::new(&url, o.tool_timeout(), o.health_timeout())?;
        let decision = ModelDecisionService::new(build_chat_model(&settings.agents.decision)?);
        let synthesis = ModelSynthesisService::new(build_chat_model(&settings.agents.synthesis)?);
        let timeouts = Timeouts {
            decision: settings.agents.decision.timeout(),
            tool: o.tool_timeout(),
            synthesis: settings.agents.synthesis.timeout(),
        };
        tracing::info!(tool_server = %url, "orchestrator initialized");
        Ok(Self::new(Arc::new(decision), Arc::new(synthesis), Arc::new(tools), RetryPolicy::from(o), timeouts))
    }

    /// Startup probe: unreachable is an error, reachable without an index only warns.
    pub async fn check_tool_service(&self) -> Result<HealthReport> {
        let health = self.tools.health().await.map_err(|e| {
            tracing::error!(error = %e, "tool service health check failed");
            e
        })?;
        if health.ready {
            tracing::info!(documents = health.indexed_count, "tool service healthy");
        } else {
            tracing::warn!("tool service is running but index not loaded");
        }
        Ok(health)
    }

    async fn decide(&self, query: &str) -> (Decision, StageTiming) {
        let (raw, timing) = timed(Stage::Decision, with_timeout("decision", self.timeouts.decision, self.decision.decide(query))).await;
        let decision = match raw {
            Ok(text) => parse_decision(&text).into_decision(query),
            Err(e) => {
                tracing::error!(error = %e, "decision service failed, falling back to retrieval");
                Decision::fallback(query, ERROR_FALLBACK_REASONING)
            }
        };
        tracing::info!(needs_retrieval = decision.needs_retrieval, reasoning = %decision.reasoning, "decision");
        (decision, timing)
    }

    /// Formatted context and result count, or `None` when retrieval failed or
    /// found nothing. Every attempt gets its own timing entry.
    async fn retrieve(&self, search_query: &str) -> (Option<(String, usize)>, Vec<StageTiming>) {
        let mut parameters = Map::new();
        parameters.insert("query".to_string(), Value::String(search_query.to_string()));
        tracing::info!(tool = RETRIEVAL_TOOL, query = %search_query, "tool call");

        let attempts = Mutex::new(Vec::new());
        let response = execute_with_retry(&self.retry, |attempt| {
            let parameters = parameters.clone();
            let attempts = &attempts;
            async move {
                let call = with_timeout("tool call", self.timeouts.tool, self.tools.invoke(RETRIEVAL_TOOL, parameters));
                let (result, timing) = timed(Stage::Retrieval, call).await;
                tracing::debug!(attempt = attempt + 1, ok = timing.succeeded, "tool call attempt");
                attempts.lock().unwrap_or_else(PoisonError::into_inner).push(timing);
                result
            }
        })
        .await;
        let timings = attempts.into_inner().unwrap_or_else(PoisonError::into_inner);
        match response {
            Ok(resp) => {
                tracing::info!(tool = RETRIEVAL_TOOL, results = resp.results.len(), "tool call succeeded");
                let context = format_results(&resp.results);
                (if context.is_empty() { None } else { Some((context, resp.results.len())) }, timings)
            }
            Err(e) => {
                tracing::error!(tool = RETRIEVAL_TOOL, error = %e, "tool call failed, continuing without context");
                (None, timings)
            }
        }
    }

    async fn synthesize(&self, prompt: &str) -> (String, StageTiming) {
        let input = synthesis_input(prompt);
        let (result, timing) = timed(Stage::Synthesis, with_timeout("synthesis", self.timeouts.synthesis, self.synthesis.synthesize(&input))).await;
        let answer = match result {
            Ok(answer) => answer,
            Err(e) => {
                tracing::error!(error = %e, "synthesis failed");
                apology(&e.to_string())
            }
        };
        (answer, timing)
    }

    /// Answer one query. Never fails: every stage degrades instead.
    pub async fn process_query(&self, query: &str) -> QueryOutcome {
        tracing::info!(query = %query, "query started");
        let mut timings = Vec::with_capacity(2 + self.retry.max_attempts as usize);

        let (decision, t) = self.decide(query).await;
        timings.push(t);

        let mut context = None;
        if decision.needs_retrieval {
            let (retrieved, attempts) = self.retrieve(decision.search_query_or(query)).await;
            timings.extend(attempts);
            context = retrieved;
        } else {
            tracing::info!("skipping retrieval");
        }

        let prompt = specialist_prompt(query, context.as_ref().map(|(c, _)| c.as_str()));
        let (answer, t) = self.synthesize(&prompt).await;
        timings.push(t);

        let outcome = QueryOutcome {
            answer,
            retrieval_attempted: decision.needs_retrieval,
            results_used: context.map_or(0, |(_, n)| n),
            decision,
            timings,
        };
        tracing::info!(retrieval_used = outcome.retrieval_attempted, results = outcome.results_used, "query complete");
        outcome
    }
}
