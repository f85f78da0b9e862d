//! Contract-level error types

use thiserror::Error;

/// Errors raised while checking a request body against the API contract
#[derive(Debug, Error)]
pub enum ApiContractError {
    #[error("validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("invalid value for {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
}
