//! Core error types for the completion workflow.

use bw_client_api::ClientApiError;
use bw_rest_api_contract::{ApiContractError, CompletionStatus, DefectId, MilestoneId};

use crate::completion::{CompletionAction, Rejected, Role};

/// Core error type for all workflow operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Rejected(#[from] Rejected),

    #[error("the {role} cannot {action}")]
    NotPermitted {
        role: Role,
        action: CompletionAction,
    },

    #[error("another transition is still in flight")]
    Busy,

    #[error("defect {0} is not part of the ledger")]
    UnknownDefect(DefectId),

    #[error("the defect ledger is read-only once the trade is completed")]
    LedgerFrozen,

    #[error("milestone {0} has no acceptance record")]
    MissingAcceptance(MilestoneId),

    #[error("the {role} cannot schedule an acceptance appointment while the trade is {status}")]
    AppointmentNotAllowed {
        role: Role,
        status: CompletionStatus,
    },

    #[error("failed to schedule the acceptance appointment: {0}")]
    Appointment(#[source] ClientApiError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("failed to {action}: {source}")]
    Transition {
        action: CompletionAction,
        #[source]
        source: ClientApiError,
    },

    #[error("API error: {0}")]
    Api(#[from] ClientApiError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl From<ApiContractError> for Error {
    fn from(err: ApiContractError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl Error {
    /// Create a new validation error.
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation(message.into())
    }

    /// Create a new configuration error.
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    pub(crate) fn transition(action: CompletionAction, source: ClientApiError) -> Self {
        Self::Transition { action, source }
    }

    /// Whether retrying the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Busy | Self::Transition { .. } | Self::Appointment(_) | Self::Api(_)
        )
    }

    /// Alert text for the user, in the wording the app shows.
    pub fn user_message(&self) -> String {
        match self {
            Self::Transition { action, .. } => action.failure_message().to_string(),
            Self::Appointment(_) => {
                "Fehler bei der Terminvereinbarung. Bitte versuchen Sie es erneut.".to_string()
            }
            Self::Busy => "Bitte warten Sie, die vorherige Aktion wird noch ausgeführt.".to_string(),
            other => other.to_string(),
        }
    }
}
