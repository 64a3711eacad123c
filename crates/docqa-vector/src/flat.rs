use docqa_core::types::Chunk;
use docqa_core::{Error, Result};

/// Exact L2 index: every stored vector is compared on every search.
///
/// Vectors live in one contiguous buffer, row `i` belongs to `metadata[i]`.
/// A `FlatIndex` is never mutated after `build`; rebuilding produces a new one.
#[derive(Debug, Clone)]
pub struct FlatIndex {
    dim: usize,
    data: Vec<f32>,
    metadata: Vec<Chunk>,
}

/// Score for a squared-L2 distance: 1.0 at zero distance, decaying towards 0.
pub fn distance_to_score(distance: f32) -> f64 { 1.0 / (1.0 + f64::from(distance)) }

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| { let d = x - y; d * d }).sum()
}

impl FlatIndex {
    pub fn build(dim: usize, vectors: &[Vec<f32>], metadata: Vec<Chunk>) -> Result<Self> {
        if vectors.len() != metadata.len() {
            return Err(Error::LengthMismatch { vectors: vectors.len(), metadata: metadata.len() });
        }
        let mut data = Vec::with_capacity(vectors.len() * dim);
        for v in vectors {
            if v.len() != dim { return Err(Error::DimensionMismatch { expected: dim, actual: v.len() }); }
            data.extend_from_slice(v);
        }
        Ok(Self { dim, data, metadata })
    }

    /// Rebuild from a flat row-major buffer, as read back from disk.
    pub(crate) fn from_raw(dim: usize, data: Vec<f32>, metadata: Vec<Chunk>) -> Result<Self> {
        if dim == 0 || data.len() % dim != 0 {
            return Err(Error::Serialization(format!("vector buffer of {} floats is not a multiple of dim {}", data.len(), dim)));
        }
        if data.len() / dim != metadata.len() {
            return Err(Error::LengthMismatch { vectors: data.len() / dim, metadata: metadata.len() });
        }
        Ok(Self { dim, data, metadata })
    }

    pub fn dim(&self) -> usize { self.dim }
    pub fn len(&self) -> usize { self.metadata.len() }
    pub fn is_empty(&self) -> bool { self.metadata.is_empty() }
    pub fn metadata(&self) -> &[Chunk] { &self.metadata }
    pub(crate) fn raw(&self) -> &[f32] { &self.data }

    /// The `k` nearest chunks with their scores, best first. Equal distances
    /// keep insertion order.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(Chunk, f64)>> {
        if query.len() != self.dim {
            return Err(Error::DimensionMismatch { expected: self.dim, actual: query.len() });
        }
        if k == 0 || self.is_empty() { return Ok(vec![]); }

        let mut distances: Vec<(usize, f32)> = self
            .data
            .chunks_exact(self.dim)
            .map(|row| squared_l2(row, query))
            .enumerate()
            .collect();
        distances.sort_by(|a, b| a.1.total_cmp(&b.1));
        distances.truncate(k);

        Ok(distances
            .into_iter()
            .map(|(i, d)| (self.metadata[i].clone(), distance_to_score(d)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(i: usize) -> Chunk { Chunk { text: format!("t{i}"), source: "s".into(), chunk_id: i } }

    #[test]
    fn score_is_one_at_zero_distance() {
        assert_eq!(distance_to_score(0.0), 1.0);
        assert!(distance_to_score(3.0) < distance_to_score(1.0));
    }

    #[test]
    fn ties_keep_insertion_order() {
        let vectors = vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![-1.0, 0.0]];
        let index = FlatIndex::build(2, &vectors, (0..3).map(chunk).collect()).unwrap();
        let hits = index.search(&[0.0, 0.0], 3).unwrap();
        let ids: Vec<usize> = hits.iter().map(|(c, _)| c.chunk_id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn build_rejects_wrong_dimension() {
        let err = FlatIndex::build(3, &[vec![1.0, 2.0]], vec![chunk(0)]).unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { expected: 3, actual: 2 }));
    }

    #[test]
    fn build_rejects_length_mismatch() {
        let err = FlatIndex::build(1, &[vec![1.0]], vec![]).unwrap_err();
        assert!(matches!(err, Error::LengthMismatch { vectors: 1, metadata: 0 }));
    }
}
