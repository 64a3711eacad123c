//! HTTP surface of the tool service.
//!
//! Routes:
//! - `GET /`: service info
//! - `GET /health`
//! - `GET /tools` (alias `/mcp/v1/tools`)
//! - `POST /tools/invoke` (alias `/mcp/v1/tools/invoke`)
//! - `POST /admin/reload`: re-read the persisted index

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use docqa_core::settings::ToolServerSettings;
use docqa_core::types::{HealthReport, ToolInvocationRequest, ToolInvocationResponse, ToolListResponse};

use crate::error::ApiError;
use crate::service::ToolService;

type AppState = Arc<ToolService>;

pub fn build_router(service: Arc<ToolService>, request_timeout: Duration) -> Router {
    Router::new()
        .route("/", get(service_info))
        .route("/health", get(health))
        .route("/tools", get(list_tools))
        .route("/mcp/v1/tools", get(list_tools))
        .route("/tools/invoke", post(invoke_tool))
        .route("/mcp/v1/tools/invoke", post(invoke_tool))
        .route("/admin/reload", post(reload_index))
        .fallback(not_found)
        .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, request_timeout))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

async fn service_info() -> Json<Value> {
    Json(json!({
        "service": "docqa tool server",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
    }))
}

async fn health(State(service): State<AppState>) -> Json<HealthReport> { Json(service.health()) }

async fn list_tools(State(service): State<AppState>) -> Json<ToolListResponse> {
    let tools = service.list_tools();
    tracing::info!(count = tools.len(), "tools listed");
    Json(ToolListResponse { tools })
}

async fn invoke_tool(
    State(service): State<AppState>,
    payload: Result<Json<ToolInvocationRequest>, JsonRejection>,
) -> Result<Json<ToolInvocationResponse>, ApiError> {
    let Json(request) = payload?;
    tracing::info!(tool = %request.tool_name, "tool invoke request");
    let results = service.invoke(&request.tool_name, request.parameters).await?;
    let message = format!("Retrieved {} results", results.len());
    Ok(Json(ToolInvocationResponse { tool_name: request.tool_name, results, status: "success".to_string(), message: Some(message) }))
}

async fn reload_index(State(service): State<AppState>) -> Result<Json<Value>, ApiError> {
    let count = service.reload().await?;
    Ok(Json(json!({ "status": "reloaded", "num_documents": count })))
}

async fn not_found() -> ApiError { ApiError::not_found() }

/// Bind and serve until Ctrl+C or SIGTERM.
pub async fn serve(service: Arc<ToolService>, settings: &ToolServerSettings) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", settings.host, settings.port).parse()?;
    let app = build_router(service, Duration::from_secs(settings.request_timeout_secs));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "tool server listening");
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    tracing::info!("tool server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => { sig.recv().await; }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
