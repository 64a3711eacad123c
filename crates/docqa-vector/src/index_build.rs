use anyhow::{ensure, Result};
use indicatif::{ProgressBar, ProgressStyle};

use docqa_core::traits::Embedder;
use docqa_core::types::Chunk;

pub const DEFAULT_BATCH_SIZE: usize = 32;

/// Embed chunk texts in batches, optionally drawing a progress bar.
/// Output order matches `chunks`.
pub fn embed_chunks(embedder: &dyn Embedder, chunks: &[Chunk], batch_size: usize, show_progress: bool) -> Result<Vec<Vec<f32>>> {
    let batch_size = batch_size.max(1);
    let pb = if show_progress { ProgressBar::new(chunks.len() as u64) } else { ProgressBar::hidden() };
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({percent}%) {msg}")?
            .progress_chars("#>-"),
    );

    let mut vectors = Vec::with_capacity(chunks.len());
    for batch in chunks.chunks(batch_size) {
        let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
        let embedded = embedder.embed_batch(&texts)?;
        ensure!(embedded.len() == texts.len(), "embedder returned {} vectors for {} texts", embedded.len(), texts.len());
        vectors.extend(embedded);
        pb.inc(batch.len() as u64);
    }
    pb.finish_with_message("embedded");
    tracing::info!(chunks = chunks.len(), batch_size, dim = embedder.dim(), "embedded chunks");
    Ok(vectors)
}
