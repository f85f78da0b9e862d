//! Scenario model and loader for workflow tests
//!
//! A scenario describes the server-side state of one trade (milestone,
//! acceptance records, defect ledger) plus the endpoints that should fail.
//! The mock client is seeded from it.

use bw_rest_api_contract::*;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Collaborator endpoints a scenario can make fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Endpoint {
    GetMilestone,
    RequestCompletion,
    RespondToCompletion,
    SetCompletionStatus,
    PostProgress,
    MarkMessagesRead,
    ListAcceptances,
    CreateAcceptance,
    ListDefects,
    CreateDefect,
    UpdateDefect,
    SubmitResolution,
    FinalAcceptance,
    ScheduleAppointment,
    CreateNotification,
    CreateTask,
}

/// Failure injected for one endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InjectedFailure {
    pub endpoint: Endpoint,
    /// Only fail `UpdateDefect` for this defect
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defect_id: Option<DefectId>,
    #[serde(default = "default_status")]
    pub status: u16,
}

fn default_status() -> u16 {
    500
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub milestone: MilestoneSummary,
    #[serde(default)]
    pub acceptances: Vec<AcceptanceRecord>,
    #[serde(default)]
    pub defects: Vec<Defect>,
    #[serde(default)]
    pub failures: Vec<InjectedFailure>,
}

impl Scenario {
    pub fn from_str(json: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_str(&text)
    }

    /// A trade with both parties known, at the given status
    pub fn trade_at(status: CompletionStatus) -> Self {
        Self {
            name: format!("trade-at-{}", status),
            milestone: MilestoneSummary {
                id: MilestoneId(7),
                project_id: ProjectId(2),
                title: "Fliesenarbeiten Bad".into(),
                completion_status: status,
                progress_percentage: 100,
                bautraeger_id: Some(UserId(10)),
                service_provider_id: Some(UserId(20)),
                has_unread_messages_bautraeger: false,
                has_unread_messages_dienstleister: false,
                revision: None,
            },
            acceptances: Vec::new(),
            defects: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn with_acceptance(mut self, id: i64) -> Self {
        self.acceptances.push(AcceptanceRecord {
            id: AcceptanceId(id),
            milestone_id: self.milestone.id,
            status: Some("under_review".into()),
            final_completion_date: None,
            created_at: None,
        });
        self
    }

    pub fn with_defect(mut self, id: i64, title: &str, resolved: bool) -> Self {
        self.defects.push(Defect {
            id: DefectId(id),
            title: title.into(),
            description: String::new(),
            location: None,
            room: None,
            severity: DefectSeverity::default(),
            photos: Vec::new(),
            resolved,
            resolved_at: None,
            resolution_notes: None,
            task_id: None,
        });
        self
    }

    pub fn failing(mut self, endpoint: Endpoint) -> Self {
        self.failures.push(InjectedFailure {
            endpoint,
            defect_id: None,
            status: default_status(),
        });
        self
    }

    pub fn failing_defect(mut self, defect_id: i64) -> Self {
        self.failures.push(InjectedFailure {
            endpoint: Endpoint::UpdateDefect,
            defect_id: Some(DefectId(defect_id)),
            status: default_status(),
        });
        self
    }
}
