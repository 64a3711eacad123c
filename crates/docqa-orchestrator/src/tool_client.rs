use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::time::Duration;

use docqa_core::types::{HealthReport, ToolInvocationResponse};
use docqa_core::{Error, Result};

use crate::services::ToolClient;

/// reqwest client for the tool service HTTP protocol.
pub struct HttpToolClient {
    client: reqwest::Client,
    base_url: String,
    invoke_timeout: Duration,
    health_timeout: Duration,
}

impl HttpToolClient {
    pub fn new(base_url: impl Into<String>, invoke_timeout: Duration, health_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::InvalidConfig(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, base_url: base_url.into().trim_end_matches('/').to_string(), invoke_timeout, health_timeout })
    }
}

pub(crate) fn send_error(err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::transport(format!("request timed out: {err}"))
    } else {
        Error::transport(err.to_string())
    }
}

/// Pull `error.message` out of a JSON error body, or fall back to the raw text.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.pointer("/error/message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}

fn status_error(status: u16, body: &str, tool_name: &str) -> Error {
    match status {
        400 | 422 => Error::InvalidParameter(error_message(body)),
        404 => Error::ToolNotFound(tool_name.to_string()),
        503 => Error::ToolNotReady(tool_name.to_string()),
        _ => Error::status(status, error_message(body)),
    }
}

#[async_trait]
impl ToolClient for HttpToolClient {
    async fn invoke(&self, tool_name: &str, parameters: Map<String, Value>) -> Result<ToolInvocationResponse> {
        let url = format!("{}/tools/invoke", self.base_url);
        let response = self
            .client
            .post(&url)
            .timeout(self.invoke_timeout)
            .json(&json!({ "tool_name": tool_name, "parameters": parameters }))
            .send()
            .await
            .map_err(send_error)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(send_error)?;
        if !(200..300).contains(&status) {
            return Err(status_error(status, &body, tool_name));
        }
        serde_json::from_str(&body).map_err(|e| Error::UpstreamProtocol(format!("invalid tool response: {e}")))
    }

    async fn health(&self) -> Result<HealthReport> {
        let url = format!("{}/health", self.base_url);
        let response = self.client.get(&url).timeout(self.health_timeout).send().await.map_err(send_error)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(send_error)?;
        if !(200..300).contains(&status) {
            return Err(Error::status(status, error_message(&body)));
        }
        serde_json::from_str(&body).map_err(|e| Error::UpstreamProtocol(format!("invalid health response: {e}")))
    }
}
