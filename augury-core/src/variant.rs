//! Variant resolution — score (0–100) to text.
//!
//! Resolution is total: first matching rule in author order wins, and when
//! nothing matches the first rule's text is returned. Gaps are reported by the
//! validator at authoring time, never at request time.

use std::ops::RangeInclusive;

use crate::definition::{Predicate, VariantRule};

/// Highest score a task can take.
pub const MAX_SCORE: u8 = 100;

/// The three score bands every task must cover.
pub const BANDS: [RangeInclusive<u8>; 3] = [0..=33, 34..=66, 67..=MAX_SCORE];

/// Band labels, index-aligned with [`BANDS`].
pub const BAND_NAMES: [&str; 3] = ["low", "mid", "high"];

impl Predicate {
    pub fn matches(&self, value: u8) -> bool {
        let v = f64::from(value);
        match *self {
            Predicate::Lte(bound) => v <= bound,
            Predicate::Gte(bound) => v >= bound,
            Predicate::Between([a, b]) => {
                let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
                lo <= v && v <= hi
            }
            Predicate::Any(enabled) => enabled,
        }
    }

    /// Canonical predicate for band index 0, 1 or 2.
    pub fn for_band(band: usize) -> Predicate {
        match band {
            0 => Predicate::Lte(f64::from(*BANDS[0].end())),
            1 => Predicate::Between([f64::from(*BANDS[1].start()), f64::from(*BANDS[1].end())]),
            _ => Predicate::Gte(f64::from(*BANDS[2].start())),
        }
    }
}

/// Three canonical rules `[lte 33, between [34, 66], gte 67]` with the given texts.
pub fn canonical_rules(texts: [String; 3]) -> Vec<VariantRule> {
    texts
        .into_iter()
        .enumerate()
        .map(|(band, text)| VariantRule {
            when: Predicate::for_band(band),
            text,
        })
        .collect()
}

/// Text for `value`. Never fails; an empty rule list yields `""`.
pub fn resolve(variants: &[VariantRule], value: u8) -> &str {
    variants
        .iter()
        .find(|rule| rule.when.matches(value))
        .or_else(|| variants.first())
        .map(|rule| rule.text.as_str())
        .unwrap_or("")
}

/// First integer in `0..=100` that no rule matches.
pub fn first_uncovered(variants: &[VariantRule]) -> Option<u8> {
    (0..=MAX_SCORE).find(|&v| !variants.iter().any(|rule| rule.when.matches(v)))
}

/// Whether some rule matches at least one value of `band`.
pub fn band_touched(variants: &[VariantRule], band: &RangeInclusive<u8>) -> bool {
    band.clone()
        .any(|v| variants.iter().any(|rule| rule.when.matches(v)))
}
