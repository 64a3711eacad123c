use std::sync::Arc;

use docqa_cli::{init_logging, load_settings};
use docqa_core::traits::Embedder;
use docqa_embed::get_default_embedder;
use docqa_retriever::Retriever;
use docqa_tools::{serve, ToolService, ValidationLimits};
use docqa_vector::{IndexPaths, VectorStore};

fn main() -> anyhow::Result<()> {
    let settings = load_settings()?;
    init_logging(&settings.logging);

    let embedder: Arc<dyn Embedder> = Arc::from(get_default_embedder(&settings.embedding)?);
    let store = Arc::new(VectorStore::new(embedder.dim()));
    let retriever = Arc::new(Retriever::new(embedder, store)?);
    let paths = IndexPaths::from_settings(&settings.knowledge_base);
    let service = Arc::new(ToolService::start(retriever, paths, ValidationLimits::from(&settings.retrieval)));

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(serve(service, &settings.tool_server))
}
