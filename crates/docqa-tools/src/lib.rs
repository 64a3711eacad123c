//! Tool service: a registry of invocable tools exposed over HTTP.

pub mod document_retriever;
pub mod error;
pub mod http;
pub mod service;
pub mod tool;

pub use document_retriever::{validate_params, DocumentRetrieverTool, ValidatedQuery, ValidationLimits, DOCUMENT_RETRIEVER};
pub use http::{build_router, serve};
pub use service::{ServiceState, ToolService};
pub use tool::Tool;
