//! Compute service — request/response contracts over a loaded catalog.
//!
//! Request:
//! `{"slug": "...", "subject": "...", "birthDate": "YYYY-MM-DD", "name"?: "...", "locale"?: "...", "paid"?: bool}`
//!
//! Success: `{"ok": true, "paid": bool, "result": {...}}`
//! Failure: `{"ok": false, "error": "CODE", "details": "..."}`
//!
//! Compute failures never leak a partial result; the caller sees a generic
//! `COMPUTE_FAILED` and the cause goes to the log.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, warn};

use augury_core::compute::{compute, fallback_locale, ComputeResult};
use augury_core::gate::slice;
use augury_core::identity::{Identity, IdentityInput, InputError};

use crate::catalog::Catalog;

/// One compute call.
///
/// The service trusts `paid` as given. Callers must set it from their own
/// entitlement records and never forward a client-supplied value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputeRequest {
    pub slug: String,
    #[serde(flatten)]
    pub identity: IdentityInput,
    /// Set server-side after checking payment. Defaults to the teaser.
    #[serde(default)]
    pub paid: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputeResponse {
    pub ok: bool,
    pub paid: bool,
    pub result: ComputeResult,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub ok: bool,
    pub error: String,
    pub details: String,
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("malformed request: {0}")]
    BadRequest(#[from] serde_json::Error),

    #[error(transparent)]
    Input(#[from] InputError),

    #[error("no published definition for '{0}'")]
    UnknownSlug(String),

    #[error("compute failed")]
    ComputeFailed,
}

impl ServiceError {
    /// Stable code for the error contract.
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::BadRequest(_) => "BAD_REQUEST",
            ServiceError::Input(_) => "BAD_INPUT",
            ServiceError::UnknownSlug(_) => "UNKNOWN_SLUG",
            ServiceError::ComputeFailed => "COMPUTE_FAILED",
        }
    }

    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            ok: false,
            error: self.code().to_string(),
            details: self.to_string(),
        }
    }
}

/// Stateless request handler over a catalog.
pub struct ComputeService<'a> {
    catalog: &'a Catalog,
}

impl<'a> ComputeService<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    /// Resolve the definition, normalize the identity, compute and gate.
    ///
    /// Identity locale falls back to the definition's engine locale, then the
    /// configured default.
    pub fn handle(&self, request: &ComputeRequest) -> Result<ComputeResponse, ServiceError> {
        let config = self.catalog.config();
        let definition = self.catalog.get(&request.slug).map_err(|_| {
            warn!(slug = %request.slug, "compute for unknown slug");
            ServiceError::UnknownSlug(request.slug.clone())
        })?;

        let identity =
            Identity::from_input(&request.identity, fallback_locale(definition, config))?;

        let full = compute(&identity, definition, config).map_err(|err| {
            error!(slug = %request.slug, error = %err, "compute failed");
            ServiceError::ComputeFailed
        })?;
        debug!(
            slug = %request.slug,
            seed = %full.seed,
            paid = request.paid,
            items = full.item_count(),
            "computed"
        );

        Ok(ComputeResponse {
            ok: true,
            paid: request.paid,
            result: slice(&full, request.paid, &config.gate),
        })
    }

    /// JSON in, JSON out. Always yields one of the two response shapes.
    pub fn handle_json(&self, body: &str) -> String {
        let outcome = serde_json::from_str::<ComputeRequest>(body)
            .map_err(ServiceError::from)
            .and_then(|request| self.handle(&request));
        let encoded = match &outcome {
            Ok(response) => serde_json::to_string(response),
            Err(err) => serde_json::to_string(&err.to_response()),
        };
        // Both shapes are plain strings, numbers and bools.
        encoded.unwrap_or_else(|_| {
            r#"{"ok":false,"error":"COMPUTE_FAILED","details":"compute failed"}"#.to_string()
        })
    }
}
