//! Trade completion and acceptance workflow for BuildWise.
//!
//! A trade moves from "in progress" through a completion request, the
//! owner's inspection and an optional defect cycle to its final sign-off.
//! This crate holds the explicit state machine for that path, the versioned
//! client-side mirror of the server status, the defect ledger and the
//! orchestrator that drives the REST calls through [`bw_client_api::ClientApi`].

pub mod completion;
pub mod config;
pub mod error;
pub mod ledger;
pub mod notify;
pub mod poll;
pub mod status;
pub mod workflow;

/// Core result type used throughout the workflow.
pub type Result<T> = std::result::Result<T, Error>;

pub use error::Error;

/// State machine of a trade's completion.
pub use completion::{available_actions, transition, CompletionAction, Rejected, Role, Transition};

pub use config::WorkflowConfig;
pub use ledger::{DefectFailure, DefectLedger, LedgerEntry, ResolutionReport};
pub use notify::{Notifier, SideEffect, TradeContext};
pub use poll::StatusPoller;
pub use status::{Applied, Checkpoint, FetchTicket, StatusCell, StatusSnapshot};
pub use workflow::{CompletionWorkflow, FinalAcceptance, Outcome};
