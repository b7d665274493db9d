//! Augury Runner — catalog, compute service and batch runs.
//!
//! This crate builds on `augury-core` to provide:
//! - TOML application config (engine settings + catalog location)
//! - An on-disk definition catalog with a hash-pinned publish registry
//! - The compute service with its request/response JSON contracts
//! - Parallel batch compute with CSV in and out

pub mod batch;
pub mod catalog;
pub mod config;
pub mod service;

pub use batch::{compute_batch, read_identities, run_batch, write_rows, BatchError, BatchSummary};
pub use catalog::{Catalog, CatalogError, Published, Registry};
pub use config::{AppConfig, ConfigError};
pub use service::{ComputeRequest, ComputeResponse, ComputeService, ErrorResponse, ServiceError};
