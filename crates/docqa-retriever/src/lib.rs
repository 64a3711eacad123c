use std::sync::Arc;

use docqa_core::traits::Embedder;
use docqa_core::types::{format_results, Chunk, RetrievalResult, NO_DOCUMENTS_FOUND};
use docqa_core::{Error, Result};
use docqa_vector::{embed_chunks, IndexPaths, VectorStore, DEFAULT_BATCH_SIZE};

/// Query -> ranked chunks, on top of an embedder and a vector store that
/// must agree on dimension.
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    store: Arc<VectorStore>,
}

fn round4(score: f64) -> f64 { (score * 10_000.0).round() / 10_000.0 }

impl Retriever {
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<VectorStore>) -> Result<Self> {
        if embedder.dim() != store.dim() {
            return Err(Error::DimensionMismatch { expected: store.dim(), actual: embedder.dim() });
        }
        Ok(Self { embedder, store })
    }

    pub fn store(&self) -> &Arc<VectorStore> { &self.store }

    /// Embed all chunks and replace the index with them.
    pub fn index(&self, chunks: Vec<Chunk>) -> Result<()> {
        let vectors = embed_chunks(self.embedder.as_ref(), &chunks, DEFAULT_BATCH_SIZE, false)
            .map_err(|e| Error::Internal(format!("embedding failed: {e}")))?;
        self.store.build(&vectors, chunks)
    }

    pub fn load_index(&self, paths: &IndexPaths) -> Result<()> { self.store.load(paths) }

    pub fn is_ready(&self) -> bool { self.store.len() >= 1 }

    pub fn indexed_count(&self) -> usize { self.store.len() }

    /// Top-`k` results with scores rounded to 4 decimals. Empty when `k` is 0
    /// or nothing is indexed.
    pub fn retrieve(&self, query: &str, k: usize) -> Result<Vec<RetrievalResult>> {
        if k == 0 || !self.is_ready() { return Ok(vec![]); }
        let vector = self.embedder.embed(query).map_err(|e| Error::Internal(format!("embedding failed: {e}")))?;
        let hits = match self.store.search(&vector, k) {
            Err(Error::NotReady) => return Ok(vec![]),
            other => other?,
        };
        let results: Vec<RetrievalResult> = hits.iter().map(|(chunk, score)| RetrievalResult::from_chunk(chunk, round4(*score))).collect();
        tracing::debug!(k, results = results.len(), "retrieved");
        Ok(results)
    }

    /// Citation-formatted context for prompting; never empty.
    pub fn retrieve_with_context(&self, query: &str, k: usize) -> Result<String> {
        let results = self.retrieve(query, k)?;
        if results.is_empty() { return Ok(NO_DOCUMENTS_FOUND.to_string()); }
        Ok(format_results(&results))
    }
}

#[cfg(test)]
mod tests {
    use super::round4;

    #[test]
    fn rounds_to_four_decimals() {
        assert_eq!(round4(0.123456), 0.1235);
        assert_eq!(round4(1.0), 1.0);
    }
}
