//! # Similarity Engine — Pairwise Cosine Matrix
//!
//! `matrix[i][j] = cos(embed(source[i]), embed(target[j]))`.
//!
//! ## Computation
//!
//! Both embedding sets are stacked into `ndarray` matrices, each row is
//! L2-normalized, and the whole matrix is one product `S · Tᵀ`. There are no
//! per-pair scalar loops.
//!
//! ## Invariants
//!
//! - Shape is `|source| × |target|`. An empty side yields an empty matrix.
//! - A zero-magnitude row stays zero, so its similarity to anything is 0.
//!   Norms accumulate in `f64`, so only a genuinely zero vector (or one with
//!   non-finite components) takes that path.
//! - Values are clamped to `[-1, 1]`; non-finite products become 0.

use ctrlmap_core::{ControlSet, EmbeddingError};
use ctrlmap_embed::EmbeddingProvider;
use ndarray::{Array2, ArrayView1, Axis};

/// Dense similarity matrix, rows = source controls, columns = targets.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatrix {
    values: Array2<f32>,
}

impl SimilarityMatrix {
    /// Embed both control sets with one provider call and compare them.
    pub fn compute(
        provider: &EmbeddingProvider,
        source: &ControlSet,
        target: &ControlSet,
    ) -> Result<Self, EmbeddingError> {
        let mut texts = source.requirements();
        texts.extend(target.requirements());
        let vectors = provider.embed(&texts)?;
        let slices: Vec<&[f32]> = vectors.iter().map(|v| v.as_slice()).collect();
        let (src, tgt) = slices.split_at(source.len());
        Self::from_embeddings(src, tgt)
    }

    /// Compare two lists of embeddings.
    pub fn from_embeddings<V: AsRef<[f32]>>(
        source: &[V],
        target: &[V],
    ) -> Result<Self, EmbeddingError> {
        let dim = source
            .iter()
            .chain(target)
            .map(|v| v.as_ref().len())
            .next()
            .unwrap_or(0);
        let src = stack_normalized(source, dim)?;
        let tgt = stack_normalized(target, dim)?;
        let values = src
            .dot(&tgt.t())
            .mapv(|x| if x.is_finite() { x.clamp(-1.0, 1.0) } else { 0.0 });
        Ok(Self { values })
    }

    /// Wrap precomputed similarity rows. Every row must have the same length.
    pub fn from_rows(rows: &[Vec<f32>]) -> Result<Self, EmbeddingError> {
        let cols = rows.first().map_or(0, Vec::len);
        let mut values = Array2::<f32>::zeros((rows.len(), cols));
        for (i, row) in rows.iter().enumerate() {
            if row.len() != cols {
                return Err(EmbeddingError::DimensionMismatch {
                    expected: cols,
                    actual: row.len(),
                });
            }
            for (j, x) in row.iter().enumerate() {
                values[[i, j]] = *x;
            }
        }
        Ok(Self { values })
    }

    /// Number of source rows.
    pub fn rows(&self) -> usize {
        self.values.nrows()
    }

    /// Number of target columns.
    pub fn cols(&self) -> usize {
        self.values.ncols()
    }

    /// Similarity of source `i` and target `j`.
    pub fn get(&self, i: usize, j: usize) -> Option<f32> {
        self.values.get([i, j]).copied()
    }

    /// All similarities of source `i`.
    pub fn row(&self, i: usize) -> ArrayView1<'_, f32> {
        self.values.row(i)
    }

    /// Underlying array.
    pub fn as_array(&self) -> &Array2<f32> {
        &self.values
    }
}

fn stack_normalized<V: AsRef<[f32]>>(vectors: &[V], dim: usize) -> Result<Array2<f32>, EmbeddingError> {
    let mut out = Array2::<f32>::zeros((vectors.len(), dim));
    for (mut row, vector) in out.axis_iter_mut(Axis(0)).zip(vectors) {
        let vector = vector.as_ref();
        if vector.len() != dim {
            return Err(EmbeddingError::DimensionMismatch {
                expected: dim,
                actual: vector.len(),
            });
        }
        // f64 so tiny components don't underflow and huge ones don't overflow.
        let norm = vector
            .iter()
            .map(|&x| f64::from(x) * f64::from(x))
            .sum::<f64>()
            .sqrt();
        if norm > 0.0 && norm.is_finite() {
            for (slot, &x) in row.iter_mut().zip(vector) {
                *slot = (f64::from(x) / norm) as f32;
            }
        }
    }
    Ok(out)
}
