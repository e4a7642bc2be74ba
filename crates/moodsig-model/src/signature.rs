//! Truncated path-signature transform over piecewise-linear streams.
//!
//! A stream of `n >= 2` points in `R^d` is interpolated linearly and
//! summarised by the signature of the resulting path: the tensor of
//! iterated integrals, truncated at a fixed order. A single linear segment
//! with increment `Δ` has level-`k` term `Δ^{⊗k}/k!`; segment signatures
//! combine through Chen's identity, the tensor product truncated at the
//! same order.
//!
//! The flattened layout matches the usual convention:
//! `[1, level 1 (d values), level 2 (d² values), ...]`.

use moodsig_core::{MoodSigError, Result};

/// Number of signature coefficients for a `d`-dimensional stream truncated
/// at `order`, including the constant level-0 term.
pub fn signature_dim(d: usize, order: usize) -> usize {
    let mut total = 1usize;
    let mut pow = 1usize;
    for _ in 0..order {
        pow *= d;
        total += pow;
    }
    total
}

/// Signature of a single linear segment: level `k` is `Δ^{⊗k}/k!`,
/// built incrementally as `level_k = (level_{k-1} ⊗ Δ) / k`.
fn segment_signature(increment: &[f64], order: usize) -> Vec<Vec<f64>> {
    let mut levels = Vec::with_capacity(order + 1);
    levels.push(vec![1.0]);
    for k in 1..=order {
        let prev = &levels[k - 1];
        let mut level = Vec::with_capacity(prev.len() * increment.len());
        let kf = k as f64;
        for &p in prev {
            for &x in increment {
                level.push(p * x / kf);
            }
        }
        levels.push(level);
    }
    levels
}

/// Chen's identity: the signature of a concatenated path is the truncated
/// tensor product of the two signatures, `c_k = Σ_{i+j=k} a_i ⊗ b_j`.
fn chen_product(a: &[Vec<f64>], b: &[Vec<f64>], order: usize) -> Vec<Vec<f64>> {
    let mut out: Vec<Vec<f64>> = (0..=order).map(|k| vec![0.0; a[k].len()]).collect();
    for k in 0..=order {
        for i in 0..=k {
            let j = k - i;
            let bj = &b[j];
            for (ia, &va) in a[i].iter().enumerate() {
                if va == 0.0 {
                    continue;
                }
                let base = ia * bj.len();
                for (ib, &vb) in bj.iter().enumerate() {
                    out[k][base + ib] += va * vb;
                }
            }
        }
    }
    out
}

/// Compute the truncated signature of a stream of points, flattened across
/// levels 0..=`order`.
///
/// # Errors
///
/// Returns a data error if the stream has fewer than 2 points, the points
/// have inconsistent or zero dimension, or `order` is 0.
pub fn stream_signature(points: &[Vec<f64>], order: usize) -> Result<Vec<f64>> {
    if order == 0 {
        return Err(MoodSigError::Data(
            "signature order must be at least 1".to_string(),
        ));
    }
    if points.len() < 2 {
        return Err(MoodSigError::Data(format!(
            "stream must contain at least 2 points, got {}",
            points.len()
        )));
    }
    let d = points[0].len();
    if d == 0 {
        return Err(MoodSigError::Data(
            "stream points must have at least one dimension".to_string(),
        ));
    }
    for (i, point) in points.iter().enumerate() {
        if point.len() != d {
            return Err(MoodSigError::Data(format!(
                "point {} has dimension {}, expected {}",
                i,
                point.len(),
                d
            )));
        }
    }

    // Identity element of the truncated tensor algebra.
    let mut acc: Vec<Vec<f64>> = (0..=order)
        .map(|k| {
            let mut level = vec![0.0; d.pow(k as u32)];
            if k == 0 {
                level[0] = 1.0;
            }
            level
        })
        .collect();

    let mut increment = vec![0.0; d];
    for pair in points.windows(2) {
        for (i, inc) in increment.iter_mut().enumerate() {
            *inc = pair[1][i] - pair[0][i];
        }
        let segment = segment_signature(&increment, order);
        acc = chen_product(&acc, &segment, order);
    }

    Ok(acc.into_iter().flatten().collect())
}
