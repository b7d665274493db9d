//! Sampler — pick-N-without-replacement and center-weighted value synthesis.
//!
//! Both operations consume a caller-supplied generator; nothing here touches
//! global randomness.

use rand::RngCore;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::rng::unit_interval;

/// What to do when more items are requested than the pool holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleMode {
    /// Reject the request.
    #[default]
    Strict,
    /// Return the whole pool (legacy editions with short pools).
    Clamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SampleError {
    #[error("requested {requested} items from a pool of {available}")]
    PoolTooSmall { requested: usize, available: usize },
}

/// Partial Fisher–Yates draw of `n` distinct elements.
///
/// Walks indices from the end, swapping each with `rng.next_u32() % (i + 1)`,
/// and stops after `n` swaps. The result is the last `n` slots in the order
/// they sit in the shuffled index vector.
pub fn pick_without_replacement<T: Clone, R: RngCore + ?Sized>(
    pool: &[T],
    n: usize,
    rng: &mut R,
    mode: SampleMode,
) -> Result<Vec<T>, SampleError> {
    let len = pool.len();
    let take = if n > len {
        match mode {
            SampleMode::Strict => {
                return Err(SampleError::PoolTooSmall {
                    requested: n,
                    available: len,
                })
            }
            SampleMode::Clamp => len,
        }
    } else {
        n
    };

    let mut indices: Vec<usize> = (0..len).collect();
    for i in (len - take..len).rev() {
        let j = (u64::from(rng.next_u32()) % (i as u64 + 1)) as usize;
        indices.swap(i, j);
    }

    Ok(indices[len - take..]
        .iter()
        .map(|&k| pool[k].clone())
        .collect())
}

/// Mean of three uniform draws, in `[0, 1)`.
///
/// Deliberately biased toward 0.5 (an Irwin–Hall shape). Only used to make
/// synthetic statistics look plausible; task selection never goes through it.
pub fn weighted_center_value<R: RngCore + ?Sized>(rng: &mut R) -> f64 {
    let sum = unit_interval(rng) + unit_interval(rng) + unit_interval(rng);
    sum / 3.0
}

/// Center-weighted integer in the inclusive range `[min, max]`.
///
/// Bounds are swapped if given in reverse.
pub fn plausible_in_range<R: RngCore + ?Sized>(rng: &mut R, min: i64, max: i64) -> i64 {
    let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
    // i128 holds the full span of any i64 pair.
    let (lo, hi) = (i128::from(lo), i128::from(hi));
    let span = (hi - lo + 1) as f64;
    let offset = (weighted_center_value(rng) * span).floor() as i128;
    let value = (lo + offset).min(hi);
    // `value` lies in `[lo, hi]`, both of which came from i64.
    i64::try_from(value).unwrap_or(max)
}
