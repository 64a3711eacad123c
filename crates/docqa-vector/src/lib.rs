//! Exact nearest-neighbour vector index with file persistence.

pub mod flat;
pub mod index_build;
pub mod persist;
pub mod store;

pub use flat::{distance_to_score, FlatIndex};
pub use index_build::{embed_chunks, DEFAULT_BATCH_SIZE};
pub use persist::{IndexManifest, IndexPaths};
pub use store::VectorStore;
