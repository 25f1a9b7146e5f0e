//! Vector math primitives over `f32` slices.
//!
//! All similarity inside the HNSW graph reduces to a dot product because
//! stored vectors are normalized at insert time. [`cosine`] computes full
//! cosine similarity with magnitudes and is used by the linear-scan oracle,
//! which stores vectors un-normalized.

use crate::error::{Error, Result};

/// Dot product of two vectors. Returns `None` on dimension mismatch.
///
/// Processes four lanes per iteration so the compiler can vectorize the
/// accumulation.
pub fn dot(a: &[f32], b: &[f32]) -> Option<f32> {
    if a.len() != b.len() {
        return None;
    }
    let mut sum = 0.0f32;
    let mut chunks_a = a.chunks_exact(4);
    let mut chunks_b = b.chunks_exact(4);
    for (x, y) in (&mut chunks_a).zip(&mut chunks_b) {
        sum += x[0] * y[0] + x[1] * y[1] + x[2] * y[2] + x[3] * y[3];
    }
    for (x, y) in chunks_a.remainder().iter().zip(chunks_b.remainder()) {
        sum += x * y;
    }
    Some(sum)
}

/// Euclidean length (L2 norm) of a vector.
pub fn magnitude(v: &[f32]) -> f32 {
    v.iter().map(|c| c * c).sum::<f32>().sqrt()
}

/// Cosine similarity of two vectors, in [-1, 1].
///
/// Errors with [`Error::DimensionMismatch`] or [`Error::ZeroMagnitude`].
pub fn cosine(a: &[f32], b: &[f32]) -> Result<f32> {
    let dot = dot(a, b).ok_or(Error::DimensionMismatch)?;
    let mag_a = magnitude(a);
    let mag_b = magnitude(b);
    if mag_a == 0.0 || mag_b == 0.0 {
        return Err(Error::ZeroMagnitude);
    }
    Ok(dot / (mag_a * mag_b))
}

/// Returns a unit-length copy of `v`, or [`Error::ZeroMagnitude`].
pub fn normalize(v: &[f32]) -> Result<Vec<f32>> {
    let mag = magnitude(v);
    if mag == 0.0 {
        return Err(Error::ZeroMagnitude);
    }
    Ok(v.iter().map(|c| c / mag).collect())
}

/// Cosine distance `1 - dot(a, b)` for pre-normalized vectors, in [0, 2].
///
/// A dimension mismatch yields `+inf`, making the mismatched node
/// unreachable through this comparison rather than an error.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    match dot(a, b) {
        Some(d) => 1.0 - d,
        None => f32::INFINITY,
    }
}
