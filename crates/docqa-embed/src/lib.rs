use anyhow::Result;

use docqa_core::settings::{EmbeddingProvider, EmbeddingSettings};
use docqa_core::traits::Embedder;

mod hash;
pub use hash::HashEmbedder;

#[cfg(feature = "model")] mod model;
#[cfg(feature = "model")] mod tokenize;
#[cfg(feature = "model")] pub use model::{masked_mean_l2, ModelEmbedder};

/// Build the embedder selected by `[embedding] provider`.
pub fn get_default_embedder(settings: &EmbeddingSettings) -> Result<Box<dyn Embedder>> {
    match settings.provider {
        EmbeddingProvider::Hash => {
            tracing::info!(dim = settings.dimension, "using hashing embedder");
            Ok(Box::new(HashEmbedder::new(settings.dimension)))
        }
        EmbeddingProvider::Model => load_model(settings),
    }
}

#[cfg(feature = "model")]
fn load_model(settings: &EmbeddingSettings) -> Result<Box<dyn Embedder>> {
    let dir = docqa_core::config::expand_path(&settings.model_dir);
    Ok(Box::new(ModelEmbedder::load(&dir, settings.max_len)?))
}

#[cfg(not(feature = "model"))]
fn load_model(_settings: &EmbeddingSettings) -> Result<Box<dyn Embedder>> {
    anyhow::bail!("embedding.provider = \"model\" requires docqa-embed to be built with the `model` feature")
}
