use std::sync::{Arc, Mutex, RwLock};

use docqa_core::types::Chunk;
use docqa_core::{Error, Result};

use crate::flat::FlatIndex;
use crate::persist::{self, IndexManifest, IndexPaths};

/// Holds the current index snapshot for a fixed embedding dimension.
///
/// Readers clone the `Arc` and search without holding the lock; `build`,
/// `load` and `reload` construct a complete index first and then swap the
/// pointer, so no reader ever sees a partial one. Writers are serialized.
pub struct VectorStore {
    dim: usize,
    current: RwLock<Option<Arc<FlatIndex>>>,
    write_lock: Mutex<()>,
}

impl VectorStore {
    pub fn new(dim: usize) -> Self { Self { dim, current: RwLock::new(None), write_lock: Mutex::new(()) } }

    pub fn dim(&self) -> usize { self.dim }

    pub fn snapshot(&self) -> Option<Arc<FlatIndex>> {
        self.current.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn swap(&self, index: FlatIndex) {
        *self.current.write().unwrap_or_else(|e| e.into_inner()) = Some(Arc::new(index));
    }

    pub fn is_loaded(&self) -> bool { self.snapshot().is_some() }

    /// Number of stored vectors; 0 when nothing is loaded.
    pub fn len(&self) -> usize { self.snapshot().map_or(0, |i| i.len()) }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    pub fn build(&self, vectors: &[Vec<f32>], metadata: Vec<Chunk>) -> Result<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let index = FlatIndex::build(self.dim, vectors, metadata)?;
        tracing::info!(count = index.len(), dim = self.dim, "index built");
        self.swap(index);
        Ok(())
    }

    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(Chunk, f64)>> {
        self.snapshot().ok_or(Error::NotReady)?.search(query, k)
    }

    pub fn persist(&self, paths: &IndexPaths) -> Result<IndexManifest> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let index = self.snapshot().ok_or(Error::NotReady)?;
        persist::save(&index, paths)
    }

    pub fn load(&self, paths: &IndexPaths) -> Result<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let index = persist::load(paths, self.dim)?;
        self.swap(index);
        Ok(())
    }

    /// Re-read the persisted index and swap it in; returns the new size.
    /// On failure the previous snapshot stays in place.
    pub fn reload(&self, paths: &IndexPaths) -> Result<usize> {
        self.load(paths)?;
        Ok(self.len())
    }
}
