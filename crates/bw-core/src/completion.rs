//! Completion state machine for a trade.
//!
//! The legal transitions are encoded once, in [`CompletionAction::sources`],
//! and checked by [`transition`]. Everything else (which buttons a role sees,
//! whether a workflow call is allowed) derives from that table.

use bw_rest_api_contract::CompletionStatus;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The two parties of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Bauträger: posts the trade, inspects and signs off.
    #[serde(alias = "bautraeger")]
    ProjectOwner,
    /// Dienstleister: performs the work.
    #[serde(alias = "dienstleister")]
    ServiceProvider,
}

impl Role {
    pub fn counterparty(&self) -> Role {
        match self {
            Role::ProjectOwner => Role::ServiceProvider,
            Role::ServiceProvider => Role::ProjectOwner,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::ProjectOwner => f.write_str("project owner"),
            Role::ServiceProvider => f.write_str("service provider"),
        }
    }
}

/// A user (or system) action that moves a trade through the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionAction {
    RequestCompletion,
    AcceptCompletion,
    RejectCompletion,
    AcceptWithDefects,
    ReportDefectResolution,
    ProceedWithoutResolution,
    FinalAccept,
    /// Server-side archival; never triggered from a client.
    Archive,
}

impl CompletionAction {
    pub const ALL: [CompletionAction; 8] = [
        CompletionAction::RequestCompletion,
        CompletionAction::AcceptCompletion,
        CompletionAction::RejectCompletion,
        CompletionAction::AcceptWithDefects,
        CompletionAction::ReportDefectResolution,
        CompletionAction::ProceedWithoutResolution,
        CompletionAction::FinalAccept,
        CompletionAction::Archive,
    ];

    /// Role allowed to trigger the action; `None` for system transitions.
    pub fn actor(&self) -> Option<Role> {
        use CompletionAction::*;
        match self {
            RequestCompletion | ReportDefectResolution | ProceedWithoutResolution => {
                Some(Role::ServiceProvider)
            }
            AcceptCompletion | RejectCompletion | AcceptWithDefects | FinalAccept => {
                Some(Role::ProjectOwner)
            }
            Archive => None,
        }
    }

    /// States from which the action is legal.
    pub fn sources(&self) -> &'static [CompletionStatus] {
        use CompletionStatus::*;
        match self {
            CompletionAction::RequestCompletion => &[InProgress, UnderReview],
            CompletionAction::AcceptCompletion
            | CompletionAction::RejectCompletion
            | CompletionAction::AcceptWithDefects => &[CompletionRequested],
            CompletionAction::ReportDefectResolution
            | CompletionAction::ProceedWithoutResolution => &[CompletedWithDefects],
            CompletionAction::FinalAccept => &[DefectsResolved],
            CompletionAction::Archive => &[Completed],
        }
    }

    /// State the trade is in after the action.
    pub fn target(&self) -> CompletionStatus {
        use CompletionStatus::*;
        match self {
            CompletionAction::RequestCompletion => CompletionRequested,
            CompletionAction::AcceptCompletion | CompletionAction::FinalAccept => Completed,
            CompletionAction::RejectCompletion => UnderReview,
            CompletionAction::AcceptWithDefects => CompletedWithDefects,
            CompletionAction::ReportDefectResolution
            | CompletionAction::ProceedWithoutResolution => DefectsResolved,
            CompletionAction::Archive => Archived,
        }
    }

    /// Alert text shown when the action's API call fails.
    pub fn failure_message(&self) -> &'static str {
        match self {
            CompletionAction::RequestCompletion => {
                "Fehler beim Anfordern der Abnahme. Bitte versuchen Sie es erneut."
            }
            CompletionAction::AcceptCompletion | CompletionAction::RejectCompletion => {
                "Fehler bei der Abnahme-Antwort. Bitte versuchen Sie es erneut."
            }
            CompletionAction::AcceptWithDefects => {
                "Fehler beim Speichern der Mängel. Bitte versuchen Sie es erneut."
            }
            CompletionAction::ReportDefectResolution
            | CompletionAction::ProceedWithoutResolution => {
                "Fehler beim Melden der Mängelbehebung. Bitte versuchen Sie es erneut."
            }
            CompletionAction::FinalAccept => {
                "Fehler beim Abschließen der finalen Abnahme. Bitte versuchen Sie es erneut."
            }
            CompletionAction::Archive => "Fehler beim Archivieren.",
        }
    }
}

impl fmt::Display for CompletionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CompletionAction::RequestCompletion => "request completion",
            CompletionAction::AcceptCompletion => "accept completion",
            CompletionAction::RejectCompletion => "reject completion",
            CompletionAction::AcceptWithDefects => "accept with defects",
            CompletionAction::ReportDefectResolution => "report defect resolution",
            CompletionAction::ProceedWithoutResolution => "proceed without resolution",
            CompletionAction::FinalAccept => "perform final acceptance",
            CompletionAction::Archive => "archive",
        };
        f.write_str(name)
    }
}

/// Result of applying an action to a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Moved {
        from: CompletionStatus,
        to: CompletionStatus,
    },
    /// The trade already is where the action leads; nothing to do.
    Unchanged(CompletionStatus),
}

impl Transition {
    pub fn target(&self) -> CompletionStatus {
        match self {
            Transition::Moved { to, .. } => *to,
            Transition::Unchanged(status) => *status,
        }
    }

    pub fn is_change(&self) -> bool {
        matches!(self, Transition::Moved { .. })
    }
}

/// An action that is not legal in the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cannot {action} while the trade is {status}")]
pub struct Rejected {
    pub status: CompletionStatus,
    pub action: CompletionAction,
}

/// Apply `action` to `current`.
///
/// Repeating an action whose target is already reached is an idempotent
/// no-op rather than an error, so duplicate submissions converge.
pub fn transition(current: CompletionStatus, action: CompletionAction) -> Result<Transition, Rejected> {
    if action.sources().contains(&current) {
        Ok(Transition::Moved {
            from: current,
            to: action.target(),
        })
    } else if current == action.target() {
        Ok(Transition::Unchanged(current))
    } else {
        Err(Rejected {
            status: current,
            action,
        })
    }
}

/// Actions `role` may trigger from `status`, i.e. the controls a UI shows.
pub fn available_actions(status: CompletionStatus, role: Role) -> Vec<CompletionAction> {
    CompletionAction::ALL
        .into_iter()
        .filter(|action| action.actor() == Some(role) && action.sources().contains(&status))
        .collect()
}
