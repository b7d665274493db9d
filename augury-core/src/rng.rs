//! Deterministic generator.
//!
//! One algorithm for the whole system: 32-bit xorshift (13, 17, 5). Every
//! generator is built from a [`Seed`]; independent streams come from
//! [`Seed::derive`], never from skipping values of a parent stream, so adding
//! a task to one pool cannot shift the draws of another.

use rand::RngCore;

use crate::seed::Seed;

/// Replacement state for a zero seed (zero is a fixed point of xorshift).
pub const ZERO_SEED_STATE: u32 = 0x9E37_79B9;

const TWO_POW_32: f64 = 4_294_967_296.0;

/// Seeded xorshift32 generator. Owns its state; never shared between calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generator {
    state: u32,
}

impl Generator {
    pub fn new(seed: Seed) -> Self {
        let state = match seed.value() {
            0 => ZERO_SEED_STATE,
            s => s,
        };
        Self { state }
    }

    /// Generator for the sub-stream `root.derive(parts)`.
    pub fn derived<S: AsRef<str>>(root: Seed, parts: &[S]) -> Self {
        Self::new(root.derive(parts))
    }

    #[inline]
    fn advance(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }

    /// Uniform value in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        unit_interval(self)
    }
}

/// Map one 32-bit draw onto `[0, 1)`.
pub fn unit_interval<R: RngCore + ?Sized>(rng: &mut R) -> f64 {
    f64::from(rng.next_u32()) / TWO_POW_32
}

impl RngCore for Generator {
    fn next_u32(&mut self) -> u32 {
        self.advance()
    }

    fn next_u64(&mut self) -> u64 {
        let hi = u64::from(self.advance());
        let lo = u64::from(self.advance());
        (hi << 32) | lo
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(4) {
            let bytes = self.advance().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}
