//! On-disk format: a binary vector file plus a JSON manifest holding the
//! chunk metadata. Both are written through a temp file in the target
//! directory and renamed into place.
//!
//! Vector file layout (little endian): `DQVF` magic, `u32` dim, `u64` count,
//! then `count * dim` `f32` values.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use docqa_core::settings::KnowledgeBaseSettings;
use docqa_core::types::Chunk;
use docqa_core::{Error, Result};

use crate::flat::FlatIndex;

const MAGIC: &[u8; 4] = b"DQVF";
const HEADER_LEN: usize = 4 + 4 + 8;
const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexPaths {
    pub vectors: PathBuf,
    pub metadata: PathBuf,
}

impl IndexPaths {
    pub fn new(vectors: impl Into<PathBuf>, metadata: impl Into<PathBuf>) -> Self {
        Self { vectors: vectors.into(), metadata: metadata.into() }
    }

    pub fn from_settings(kb: &KnowledgeBaseSettings) -> Self { Self::new(kb.embeddings_path(), kb.metadata_path()) }

    /// Both files must exist for an index to be loadable.
    pub fn exist(&self) -> bool { self.vectors.is_file() && self.metadata.is_file() }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexManifest {
    pub version: u32,
    pub dim: usize,
    pub count: usize,
    /// RFC 3339 build time.
    pub created_at: String,
    /// blake3 of the full vector file.
    pub vectors_blake3: String,
    pub chunks: Vec<Chunk>,
}

fn encode_vectors(index: &FlatIndex) -> Result<Vec<u8>> {
    let dim = u32::try_from(index.dim()).map_err(|_| Error::Serialization(format!("dimension {} does not fit the file header", index.dim())))?;
    let raw = index.raw();
    let mut bytes = Vec::with_capacity(HEADER_LEN + raw.len() * 4);
    bytes.extend_from_slice(MAGIC);
    bytes.extend_from_slice(&dim.to_le_bytes());
    bytes.extend_from_slice(&(index.len() as u64).to_le_bytes());
    for x in raw { bytes.extend_from_slice(&x.to_le_bytes()); }
    Ok(bytes)
}

fn decode_vectors(bytes: &[u8]) -> Result<(usize, usize, Vec<f32>)> {
    if bytes.len() < HEADER_LEN || &bytes[..4] != MAGIC {
        return Err(Error::Serialization("vector file has no valid header".into()));
    }
    let dim = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]) as usize;
    let mut count_bytes = [0u8; 8];
    count_bytes.copy_from_slice(&bytes[8..16]);
    let count = usize::try_from(u64::from_le_bytes(count_bytes))
        .map_err(|_| Error::Serialization("vector count in header exceeds address space".into()))?;
    let expected = count
        .checked_mul(dim)
        .and_then(|n| n.checked_mul(4))
        .ok_or_else(|| Error::Serialization(format!("vector file header {count}x{dim} overflows")))?;
    let body = &bytes[HEADER_LEN..];
    if body.len() != expected {
        return Err(Error::Serialization(format!("vector file holds {} bytes, expected {expected} for {count}x{dim}", body.len())));
    }
    let data = body.chunks_exact(4).map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]])).collect();
    Ok((dim, count, data))
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| Error::Io(e.error))?;
    Ok(())
}

/// Write vectors first, then the manifest that vouches for them.
pub fn save(index: &FlatIndex, paths: &IndexPaths) -> Result<IndexManifest> {
    let bytes = encode_vectors(index)?;
    let manifest = IndexManifest {
        version: FORMAT_VERSION,
        dim: index.dim(),
        count: index.len(),
        created_at: chrono::Utc::now().to_rfc3339(),
        vectors_blake3: blake3::hash(&bytes).to_hex().to_string(),
        chunks: index.metadata().to_vec(),
    };
    write_atomic(&paths.vectors, &bytes)?;
    write_atomic(&paths.metadata, &serde_json::to_vec_pretty(&manifest)?)?;
    tracing::info!(vectors = %paths.vectors.display(), metadata = %paths.metadata.display(), count = manifest.count, dim = manifest.dim, "index persisted");
    Ok(manifest)
}

/// Load an index written by [`save`]. `expected_dim` is the active embedder's
/// dimension; a different stored dimension is rejected.
pub fn load(paths: &IndexPaths, expected_dim: usize) -> Result<FlatIndex> {
    let bytes = fs::read(&paths.vectors)?;
    let manifest: IndexManifest = serde_json::from_slice(&fs::read(&paths.metadata)?)?;

    let checksum = blake3::hash(&bytes).to_hex().to_string();
    if checksum != manifest.vectors_blake3 {
        return Err(Error::Serialization(format!("vector file checksum {checksum} does not match manifest")));
    }
    let (dim, count, data) = decode_vectors(&bytes)?;
    if dim != manifest.dim || count != manifest.count || manifest.chunks.len() != count {
        return Err(Error::Serialization(format!(
            "vector file ({count}x{dim}) disagrees with manifest ({}x{}, {} chunks)",
            manifest.count, manifest.dim, manifest.chunks.len()
        )));
    }
    if dim != expected_dim {
        return Err(Error::DimensionMismatch { expected: expected_dim, actual: dim });
    }
    tracing::info!(count, dim, created_at = %manifest.created_at, "index loaded");
    FlatIndex::from_raw(dim, data, manifest.chunks)
}
