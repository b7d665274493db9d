//! Augury Core — deterministic content resolution.
//!
//! Turns an identity (subject + birth date, optional name and locale) and a
//! published content definition into a personalized report that is identical
//! on every call:
//! - Seed hashing (FNV-1a over ordered parts) and derived sub-seeds
//! - A seeded xorshift32 generator behind `rand::RngCore`
//! - Sampling without replacement and center-weighted plausible numbers
//! - Score-band variant resolution and placeholder rendering
//! - Definition normalization, structural validation and a locked schema
//! - The compute orchestrator and the free/paid visibility gate

pub mod compute;
pub mod config;
pub mod definition;
pub mod demo;
pub mod gate;
pub mod identity;
pub mod locked;
pub mod normalize;
pub mod rng;
pub mod sampler;
pub mod seed;
pub mod template;
pub mod validate;
pub mod variant;

pub use compute::{compute, ComputeError, ComputeResult};
pub use config::EngineConfig;
pub use definition::ContentDefinition;
pub use identity::{Identity, IdentityInput, InputError};
pub use seed::Seed;
pub use validate::{ErrorCode, ValidationError};
