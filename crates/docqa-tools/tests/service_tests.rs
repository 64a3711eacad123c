use serde_json::{json, Map, Value};
use std::sync::Arc;
use tempfile::TempDir;

use docqa_core::traits::Embedder;
use docqa_core::types::{Chunk, ServiceStatus};
use docqa_core::Error;
use docqa_embed::HashEmbedder;
use docqa_retriever::Retriever;
use docqa_tools::{ServiceState, ToolService, ValidationLimits, DOCUMENT_RETRIEVER};
use docqa_vector::{IndexPaths, VectorStore};

const DIM: usize = 32;

fn retriever() -> Arc<Retriever> {
    let embedder: Arc<dyn Embedder> = Arc::new(HashEmbedder::new(DIM));
    Arc::new(Retriever::new(embedder, Arc::new(VectorStore::new(DIM))).unwrap())
}

fn persisted_index(dir: &TempDir, n: usize) -> IndexPaths {
    let paths = IndexPaths::new(dir.path().join("index.vec"), dir.path().join("index.meta.json"));
    let builder = retriever();
    let chunks = (0..n).map(|i| Chunk { text: format!("note {i} about topic {}", i % 4), source: format!("doc{}", i % 2), chunk_id: i / 2 }).collect();
    builder.index(chunks).unwrap();
    builder.store().persist(&paths).unwrap();
    paths
}

fn params(v: Value) -> Map<String, Value> { v.as_object().cloned().unwrap_or_default() }

#[tokio::test]
async fn starts_ready_when_index_present() {
    let tmp = TempDir::new().unwrap();
    let service = ToolService::start(retriever(), persisted_index(&tmp, 30), ValidationLimits::default());
    assert_eq!(service.state(), ServiceState::Ready);
    let health = service.health();
    assert_eq!(health.status, ServiceStatus::Healthy);
    assert!(health.ready);
    assert_eq!(health.indexed_count, 30);
}

#[tokio::test]
async fn starts_degraded_without_index() {
    let tmp = TempDir::new().unwrap();
    let paths = IndexPaths::new(tmp.path().join("missing.vec"), tmp.path().join("missing.json"));
    let service = ToolService::start(retriever(), paths, ValidationLimits::default());
    assert_eq!(service.state(), ServiceState::Degraded);
    let health = service.health();
    assert_eq!(health.status, ServiceStatus::Degraded);
    assert_eq!(health.indexed_count, 0);

    let err = service.invoke(DOCUMENT_RETRIEVER, params(json!({"query": "topic"}))).await.unwrap_err();
    assert!(matches!(err, Error::ToolNotReady(_)));
}

#[tokio::test]
async fn unknown_tool_is_not_found() {
    let tmp = TempDir::new().unwrap();
    let service = ToolService::start(retriever(), persisted_index(&tmp, 3), ValidationLimits::default());
    let err = service.invoke("web_search", Map::new()).await.unwrap_err();
    assert!(matches!(err, Error::ToolNotFound(name) if name == "web_search"));
}

#[tokio::test]
async fn list_tools_describes_document_retriever() {
    let tmp = TempDir::new().unwrap();
    let service = ToolService::start(retriever(), persisted_index(&tmp, 3), ValidationLimits::default());
    let tools = service.list_tools();
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0].name, DOCUMENT_RETRIEVER);
    assert!(tools[0].parameters["query"].required);
    assert!(!tools[0].parameters["top_k"].required);
}

#[tokio::test]
async fn empty_query_is_invalid_and_long_query_succeeds() {
    let tmp = TempDir::new().unwrap();
    let service = ToolService::start(retriever(), persisted_index(&tmp, 12), ValidationLimits::default());

    let err = service.invoke(DOCUMENT_RETRIEVER, params(json!({"query": "   "}))).await.unwrap_err();
    assert!(matches!(err, Error::InvalidParameter(_)));

    let long = format!("topic {}", "x".repeat(4994));
    assert_eq!(long.len(), 5000);
    let truncated = long.chars().take(1000).collect::<String>();
    let a = service.invoke(DOCUMENT_RETRIEVER, params(json!({ "query": long }))).await.unwrap();
    let b = service.invoke(DOCUMENT_RETRIEVER, params(json!({ "query": truncated }))).await.unwrap();
    assert_eq!(a, b, "only the first 1000 characters are used");
    assert_eq!(a.len(), 5);
}

#[tokio::test]
async fn invalid_top_k_behaves_like_absent() {
    let tmp = TempDir::new().unwrap();
    let service = ToolService::start(retriever(), persisted_index(&tmp, 25), ValidationLimits::default());
    let baseline = service.invoke(DOCUMENT_RETRIEVER, params(json!({"query": "topic 2"}))).await.unwrap();
    assert_eq!(baseline.len(), 5);
    for top_k in [json!(0), json!(21), json!("5")] {
        let got = service.invoke(DOCUMENT_RETRIEVER, params(json!({"query": "topic 2", "top_k": top_k}))).await.unwrap();
        assert_eq!(got, baseline, "top_k={top_k}");
    }
    let seven = service.invoke(DOCUMENT_RETRIEVER, params(json!({"query": "topic 2", "top_k": 7}))).await.unwrap();
    assert_eq!(seven.len(), 7);
}

#[tokio::test]
async fn reload_picks_up_new_snapshot() {
    let tmp = TempDir::new().unwrap();
    let paths = persisted_index(&tmp, 4);
    let service = ToolService::start(retriever(), paths, ValidationLimits::default());
    assert_eq!(service.health().indexed_count, 4);

    persisted_index(&tmp, 9);
    assert_eq!(service.reload().await.unwrap(), 9);
    assert_eq!(service.health().indexed_count, 9);
}
