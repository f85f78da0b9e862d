//! Request validation helpers

use validator::Validate;

use crate::error::ApiContractError;

/// Validate a request body before it is sent to the server
pub fn validate_request<T: Validate>(request: &T) -> Result<(), ApiContractError> {
    request.validate().map_err(ApiContractError::from)
}

/// Check that a progress value lies in `0..=100`
pub fn validate_progress(progress: u8) -> Result<(), ApiContractError> {
    if progress > 100 {
        return Err(ApiContractError::InvalidField {
            field: "progress_percentage",
            reason: format!("{progress} is outside 0..=100"),
        });
    }
    Ok(())
}
