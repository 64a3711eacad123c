use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Map, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

use docqa_core::settings::{AgentProvider, AgentSettings};
use docqa_core::traits::Embedder;
use docqa_core::types::Chunk;
use docqa_core::Error;
use docqa_embed::HashEmbedder;
use docqa_orchestrator::llm::{ChatModel, ChatRequest, GeminiClient, OpenAiChatClient};
use docqa_orchestrator::{HttpToolClient, RetryPolicy, ToolClient};
use docqa_retriever::Retriever;
use docqa_tools::{build_router, ToolService, ValidationLimits};
use docqa_vector::{IndexPaths, VectorStore};

/// Serve `router` on an ephemeral local port and return its base URL.
async fn spawn(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

fn client(base: &str) -> HttpToolClient {
    HttpToolClient::new(base, Duration::from_secs(5), Duration::from_secs(5)).unwrap()
}

async fn tool_server(dir: &TempDir, with_index: bool) -> String {
    let embedder: Arc<dyn Embedder> = Arc::new(HashEmbedder::new(32));
    let retriever = Arc::new(Retriever::new(embedder, Arc::new(VectorStore::new(32))).unwrap());
    let paths = IndexPaths::new(dir.path().join("index.vec"), dir.path().join("index.meta.json"));
    if with_index {
        let chunks = vec![
            Chunk { text: "Solar panels convert sunlight into electricity.".into(), source: "energy".into(), chunk_id: 0 },
            Chunk { text: "Rainwater is stored in the cistern.".into(), source: "water".into(), chunk_id: 0 },
            Chunk { text: "The garden grows tomatoes in summer.".into(), source: "garden".into(), chunk_id: 0 },
        ];
        retriever.index(chunks).unwrap();
        retriever.store().persist(&paths).unwrap();
    }
    let service = ToolService::start(retriever, paths, ValidationLimits::default());
    spawn(build_router(Arc::new(service), Duration::from_secs(5))).await
}

fn params(query: &str) -> Map<String, Value> {
    let mut m = Map::new();
    m.insert("query".into(), json!(query));
    m
}

#[tokio::test]
async fn round_trips_against_live_tool_server() {
    let tmp = TempDir::new().unwrap();
    let tools = client(&tool_server(&tmp, true).await);

    let health = tools.health().await.unwrap();
    assert!(health.ready);
    assert_eq!(health.indexed_count, 3);

    let resp = tools.invoke("document_retriever", params("solar panels sunlight")).await.unwrap();
    assert_eq!(resp.status, "success");
    assert_eq!(resp.results.len(), 3);
    assert_eq!(resp.results[0].source, "energy");
    assert_eq!(resp.message.as_deref(), Some("Retrieved 3 results"));
}

#[tokio::test]
async fn live_error_statuses_map_to_client_errors() {
    let tmp = TempDir::new().unwrap();
    let tools = client(&tool_server(&tmp, true).await);

    let missing = tools.invoke("web_search", params("x")).await.unwrap_err();
    assert!(matches!(missing, Error::ToolNotFound(_)));
    let blank = tools.invoke("document_retriever", params("   ")).await.unwrap_err();
    assert!(matches!(blank, Error::InvalidParameter(_)));

    let empty = TempDir::new().unwrap();
    let degraded = client(&tool_server(&empty, false).await);
    assert!(!degraded.health().await.unwrap().ready);
    let not_ready = degraded.invoke("document_retriever", params("x")).await.unwrap_err();
    assert!(matches!(not_ready, Error::ToolNotReady(_)));
    assert!(!not_ready.is_retryable());
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);
    let err = client(&base).health().await.unwrap_err();
    assert!(matches!(err, Error::UpstreamTransport { status: None, .. }));
}

#[tokio::test]
async fn flaky_server_is_retried_until_success() {
    let hits = Arc::new(AtomicUsize::new(0));
    let router = Router::new()
        .route(
            "/tools/invoke",
            post(|State(hits): State<Arc<AtomicUsize>>| async move {
                if hits.fetch_add(1, Ordering::SeqCst) < 2 {
                    (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": {"code": "INTERNAL_ERROR", "message": "boom"}})))
                } else {
                    (StatusCode::OK, Json(json!({"tool_name": "document_retriever", "results": [], "status": "success"})))
                }
            }),
        )
        .with_state(hits.clone());
    let tools = client(&spawn(router).await);
    let policy = RetryPolicy { max_attempts: 3, base_delay: Duration::from_millis(10), max_delay: Duration::from_millis(40) };

    let resp = docqa_orchestrator::retry::execute_with_retry(&policy, |_| tools.invoke("document_retriever", params("q"))).await.unwrap();
    assert!(resp.results.is_empty());
    assert_eq!(hits.load(Ordering::SeqCst), 3);
}

#[derive(Default)]
struct Captured {
    body: Mutex<Option<Value>>,
    auth: Mutex<Option<String>>,
}

fn agent(provider: AgentProvider, base_url: String) -> AgentSettings {
    AgentSettings {
        provider,
        base_url,
        model: "test-model".into(),
        api_key: "secret".into(),
        api_key_env: String::new(),
        temperature: 0.2,
        max_tokens: 64,
        timeout_secs: 5,
    }
}

fn record(captured: &Captured, headers: &HeaderMap, header: &str, body: Value) {
    *captured.body.lock().unwrap() = Some(body);
    *captured.auth.lock().unwrap() = headers.get(header).and_then(|v| v.to_str().ok()).map(str::to_string);
}

#[tokio::test]
async fn openai_client_sends_chat_completion() {
    let captured = Arc::new(Captured::default());
    let router = Router::new()
        .route(
            "/chat/completions",
            post(|State(c): State<Arc<Captured>>, headers: HeaderMap, Json(body): Json<Value>| async move {
                record(&c, &headers, "authorization", body);
                Json(json!({"choices": [{"message": {"role": "assistant", "content": "{\"needs_retrieval\": false, \"reasoning\": \"r\"}"}}]}))
            }),
        )
        .with_state(captured.clone());
    let base = spawn(router).await;
    let model = OpenAiChatClient::new(&agent(AgentProvider::Openai, base)).unwrap();

    let request = ChatRequest { system: Some("be brief".into()), user: "hello".into(), json_mode: true };
    let text = model.complete(&request).await.unwrap();
    assert!(text.contains("needs_retrieval"));

    let body = captured.body.lock().unwrap().clone().unwrap();
    assert_eq!(body["model"], "test-model");
    assert_eq!(body["messages"][0], json!({"role": "system", "content": "be brief"}));
    assert_eq!(body["messages"][1], json!({"role": "user", "content": "hello"}));
    assert_eq!(body["response_format"], json!({"type": "json_object"}));
    assert_eq!(captured.auth.lock().unwrap().as_deref(), Some("Bearer secret"));
}

#[tokio::test]
async fn gemini_client_joins_parts() {
    let captured = Arc::new(Captured::default());
    let router = Router::new()
        .route(
            "/models/test-model:generateContent",
            post(|State(c): State<Arc<Captured>>, headers: HeaderMap, Json(body): Json<Value>| async move {
                record(&c, &headers, "x-goog-api-key", body);
                Json(json!({"candidates": [{"content": {"parts": [{"text": "Hello, "}, {"text": "world."}]}}]}))
            }),
        )
        .with_state(captured.clone());
    let base = spawn(router).await;
    let model = GeminiClient::new(&agent(AgentProvider::Gemini, base)).unwrap();

    let text = model.complete(&ChatRequest { system: None, user: "greet".into(), json_mode: false }).await.unwrap();
    assert_eq!(text, "Hello, world.");

    let body = captured.body.lock().unwrap().clone().unwrap();
    assert_eq!(body["contents"][0]["parts"][0]["text"], "greet");
    assert_eq!(body["generationConfig"]["maxOutputTokens"], 64);
    assert!(body.get("systemInstruction").is_none());
    assert_eq!(captured.auth.lock().unwrap().as_deref(), Some("secret"));
}

#[tokio::test]
async fn chat_errors_carry_status_and_missing_key_is_config_error() {
    let router = Router::new().route("/chat/completions", post(|| async { (StatusCode::TOO_MANY_REQUESTS, "rate limited") }));
    let base = spawn(router).await;
    let model = OpenAiChatClient::new(&agent(AgentProvider::Openai, base.clone())).unwrap();
    let request = ChatRequest { system: None, user: "hi".into(), json_mode: false };
    let err = model.complete(&request).await.unwrap_err();
    assert!(matches!(err, Error::UpstreamTransport { status: Some(429), .. }));

    let keyless = AgentSettings { api_key: String::new(), ..agent(AgentProvider::Openai, base) };
    let err = OpenAiChatClient::new(&keyless).unwrap().complete(&request).await.unwrap_err();
    assert!(matches!(err, Error::InvalidConfig(_)));
}
