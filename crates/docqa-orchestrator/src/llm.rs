//! Chat model clients used behind the decision and synthesis services.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use docqa_core::settings::{AgentProvider, AgentSettings};
use docqa_core::{Error, Result};

use crate::tool_client::send_error;

#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub system: Option<String>,
    pub user: String,
    /// Ask the provider to constrain output to a JSON object.
    pub json_mode: bool,
}

#[async_trait]
pub trait ChatModel: Send + Sync {
    fn model(&self) -> &str;
    async fn complete(&self, request: &ChatRequest) -> Result<String>;
}

fn http_client(settings: &AgentSettings) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(settings.timeout())
        .build()
        .map_err(|e| Error::InvalidConfig(format!("failed to build HTTP client: {e}")))
}

fn require_key(key: &Option<String>, provider: &str) -> Result<String> {
    key.clone().ok_or_else(|| Error::InvalidConfig(format!("{provider}: no API key configured")))
}

async fn post_json(request: reqwest::RequestBuilder, body: &Value, provider: &str) -> Result<Value> {
    let response = request.json(body).send().await.map_err(send_error)?;
    let status = response.status().as_u16();
    let text = response.text().await.map_err(send_error)?;
    if !(200..300).contains(&status) {
        return Err(Error::status(status, format!("{provider}: {text}")));
    }
    serde_json::from_str(&text).map_err(|e| Error::UpstreamProtocol(format!("{provider}: failed to parse response: {e}")))
}

/// OpenAI-compatible `/chat/completions` (Groq, OpenAI, vLLM, Ollama...).
pub struct OpenAiChatClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAiChatClient {
    pub fn new(settings: &AgentSettings) -> Result<Self> {
        Ok(Self {
            client: http_client(settings)?,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            api_key: settings.resolved_api_key(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
        })
    }

    fn body(&self, request: &ChatRequest) -> Value {
        let mut messages = Vec::new();
        if let Some(system) = &request.system {
            messages.push(json!({ "role": "system", "content": system }));
        }
        messages.push(json!({ "role": "user", "content": request.user }));
        let mut body = json!({
            "model": self.model,
            "messages": messages,
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
        });
        if request.json_mode {
            body["response_format"] = json!({ "type": "json_object" });
        }
        body
    }
}

#[async_trait]
impl ChatModel for OpenAiChatClient {
    fn model(&self) -> &str { &self.model }

    async fn complete(&self, request: &ChatRequest) -> Result<String> {
        let api_key = require_key(&self.api_key, "openai")?;
        let http = self.client.post(format!("{}/chat/completions", self.base_url)).bearer_auth(api_key);
        let response = post_json(http, &self.body(request), "openai").await?;
        response
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| Error::UpstreamProtocol("openai: response has no choices[0].message.content".into()))
    }
}

/// Google Gemini `models/{model}:generateContent`.
pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    temperature: f32,
    max_tokens: u32,
}

impl GeminiClient {
    pub fn new(settings: &AgentSettings) -> Result<Self> {
        Ok(Self {
            client: http_client(settings)?,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            api_key: settings.resolved_api_key(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
        })
    }

    fn body(&self, request: &ChatRequest) -> Value {
        let mut generation_config = json!({
            "temperature": self.temperature,
            "maxOutputTokens": self.max_tokens,
        });
        if request.json_mode {
            generation_config["responseMimeType"] = json!("application/json");
        }
        let mut body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": request.user }] }],
            "generationConfig": generation_config,
        });
        if let Some(system) = &request.system {
            body["systemInstruction"] = json!({ "parts": [{ "text": system }] });
        }
        body
    }
}

#[async_trait]
impl ChatModel for GeminiClient {
    fn model(&self) -> &str { &self.model }

    async fn complete(&self, request: &ChatRequest) -> Result<String> {
        let api_key = require_key(&self.api_key, "gemini")?;
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let http = self.client.post(url).header("x-goog-api-key", api_key);
        let response = post_json(http, &self.body(request), "gemini").await?;
        let parts = response
            .pointer("/candidates/0/content/parts")
            .and_then(Value::as_array)
            .ok_or_else(|| Error::UpstreamProtocol("gemini: response has no candidates[0].content.parts".into()))?;
        let text: String = parts.iter().filter_map(|p| p.get("text").and_then(Value::as_str)).collect();
        if text.is_empty() {
            return Err(Error::UpstreamProtocol("gemini: response contained no text".into()));
        }
        Ok(text)
    }
}

pub fn build_chat_model(settings: &AgentSettings) -> Result<Arc<dyn ChatModel>> {
    let model: Arc<dyn ChatModel> = match settings.provider {
        AgentProvider::Openai => Arc::new(OpenAiChatClient::new(settings)?),
        AgentProvider::Gemini => Arc::new(GeminiClient::new(settings)?),
    };
    tracing::info!(provider = ?settings.provider, model = model.model(), "chat model configured");
    Ok(model)
}
