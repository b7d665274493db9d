//! Seed derivation — FNV-1a 32-bit over ordered string fields.
//!
//! Every seed in the system is produced here. A root seed is hashed from the
//! normalized identity fields; sub-seeds for categories, tasks and insights are
//! derived by hashing `(root, discriminator...)`, so streams stay independent
//! of pool sizes and of the order in which they are derived.

use serde::{Deserialize, Serialize};
use std::fmt;

/// FNV-1a 32-bit offset basis.
pub const FNV_OFFSET_BASIS: u32 = 0x811C_9DC5;

/// FNV-1a 32-bit prime.
pub const FNV_PRIME: u32 = 0x0100_0193;

/// Unit folded in after every part so `["ab", "c"]` and `["a", "bc"]` differ.
const PART_BOUNDARY: u16 = 0x1F;

#[inline]
fn step(acc: u32, unit: u16) -> u32 {
    (acc ^ u32::from(unit)).wrapping_mul(FNV_PRIME)
}

/// Fold one part's UTF-16 code units into the accumulator, then the boundary.
#[inline]
fn fold_part(acc: u32, part: &str) -> u32 {
    let acc = part.encode_utf16().fold(acc, step);
    step(acc, PART_BOUNDARY)
}

/// Plain FNV-1a 32-bit of a single string, no boundary unit.
pub fn fnv1a(text: &str) -> u32 {
    text.encode_utf16().fold(FNV_OFFSET_BASIS, step)
}

/// Hash an ordered list of fields into one `u32`.
///
/// Character codes are UTF-16 code units, so the result matches what a browser
/// computes with `charCodeAt` for the same strings. No case folding or
/// trimming happens here.
pub fn hash_parts<S: AsRef<str>>(parts: &[S]) -> u32 {
    parts
        .iter()
        .fold(FNV_OFFSET_BASIS, |acc, part| fold_part(acc, part.as_ref()))
}

/// A 32-bit seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Seed(pub u32);

impl Seed {
    pub fn from_parts<S: AsRef<str>>(parts: &[S]) -> Self {
        Self(hash_parts(parts))
    }

    pub fn value(self) -> u32 {
        self.0
    }

    /// Derive an independent sub-seed for a discriminator tuple.
    ///
    /// Equivalent to `hash_parts([self as decimal, parts...])`.
    pub fn derive<S: AsRef<str>>(self, parts: &[S]) -> Seed {
        let root = fold_part(FNV_OFFSET_BASIS, &self.0.to_string());
        Seed(
            parts
                .iter()
                .fold(root, |acc, part| fold_part(acc, part.as_ref())),
        )
    }
}

impl fmt::Display for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
