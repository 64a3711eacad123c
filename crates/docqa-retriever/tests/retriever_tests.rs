use std::sync::Arc;
use tempfile::TempDir;

use docqa_core::traits::Embedder;
use docqa_core::types::{Chunk, NO_DOCUMENTS_FOUND};
use docqa_core::Error;
use docqa_embed::HashEmbedder;
use docqa_retriever::Retriever;
use docqa_vector::{IndexPaths, VectorStore};

const DIM: usize = 64;

fn chunks() -> Vec<Chunk> {
    vec![
        Chunk { text: "Solar panels convert sunlight into electricity.".into(), source: "energy".into(), chunk_id: 0 },
        Chunk { text: "Batteries store electricity for the night.".into(), source: "energy".into(), chunk_id: 1 },
        Chunk { text: "Sourdough bread needs a live starter.".into(), source: "baking".into(), chunk_id: 0 },
    ]
}

fn retriever() -> Retriever {
    let embedder: Arc<dyn Embedder> = Arc::new(HashEmbedder::new(DIM));
    Retriever::new(embedder, Arc::new(VectorStore::new(DIM))).expect("retriever")
}

#[test]
fn empty_index_yields_nothing_and_sentinel() {
    let r = retriever();
    assert!(!r.is_ready());
    assert!(r.retrieve("anything", 5).unwrap().is_empty());
    assert_eq!(r.retrieve_with_context("anything", 5).unwrap(), NO_DOCUMENTS_FOUND);
}

#[test]
fn retrieve_ranks_and_rounds() {
    let r = retriever();
    r.index(chunks()).unwrap();
    assert!(r.is_ready());
    assert_eq!(r.indexed_count(), 3);

    let results = r.retrieve("Sourdough bread needs a live starter.", 2).unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].source, "baking");
    assert_eq!(results[0].score, 1.0);
    for res in &results {
        assert_eq!((res.score * 10_000.0).round() / 10_000.0, res.score);
    }
    assert!(r.retrieve("bread", 0).unwrap().is_empty());
}

#[test]
fn context_block_cites_sources_in_rank_order() {
    let r = retriever();
    r.index(chunks()).unwrap();
    let ctx = r.retrieve_with_context("Solar panels convert sunlight into electricity.", 2).unwrap();
    assert!(ctx.starts_with("[Source 1: energy (relevance: 1.00)]\nSolar panels convert sunlight into electricity.\n"));
    assert!(ctx.contains("\n\n[Source 2: "));
    assert!(!ctx.contains("[Source 3:"));
}

#[test]
fn mismatched_embedder_is_rejected() {
    let embedder: Arc<dyn Embedder> = Arc::new(HashEmbedder::new(DIM));
    let err = Retriever::new(embedder, Arc::new(VectorStore::new(DIM * 2))).err().expect("mismatch");
    assert!(matches!(err, Error::DimensionMismatch { .. }));
}

#[test]
fn loads_persisted_index() {
    let tmp = TempDir::new().unwrap();
    let paths = IndexPaths::new(tmp.path().join("i.vec"), tmp.path().join("i.json"));
    let built = retriever();
    built.index(chunks()).unwrap();
    built.store().persist(&paths).unwrap();

    let served = retriever();
    served.load_index(&paths).unwrap();
    assert_eq!(served.retrieve("batteries at night", 3).unwrap(), built.retrieve("batteries at night", 3).unwrap());
}
