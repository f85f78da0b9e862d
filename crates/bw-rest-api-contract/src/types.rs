//! API contract types for the BuildWise completion workflow

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }
    };
}

numeric_id!(
    /// Identifier of a trade (milestone / Gewerk)
    MilestoneId
);
numeric_id!(
    /// Identifier of a construction project
    ProjectId
);
numeric_id!(
    /// Identifier of an acceptance record
    AcceptanceId
);
numeric_id!(
    /// Identifier of a documented defect
    DefectId
);
numeric_id!(
    /// Identifier of a platform user
    UserId
);

/// Workflow stage of a trade's handoff and acceptance
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionStatus {
    #[default]
    InProgress,
    CompletionRequested,
    #[serde(alias = "revision_required")]
    UnderReview,
    CompletedWithDefects,
    DefectsResolved,
    Completed,
    Archived,
}

impl CompletionStatus {
    pub const ALL: [CompletionStatus; 7] = [
        CompletionStatus::InProgress,
        CompletionStatus::CompletionRequested,
        CompletionStatus::UnderReview,
        CompletionStatus::CompletedWithDefects,
        CompletionStatus::DefectsResolved,
        CompletionStatus::Completed,
        CompletionStatus::Archived,
    ];

    /// Wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            CompletionStatus::InProgress => "in_progress",
            CompletionStatus::CompletionRequested => "completion_requested",
            CompletionStatus::UnderReview => "under_review",
            CompletionStatus::CompletedWithDefects => "completed_with_defects",
            CompletionStatus::DefectsResolved => "defects_resolved",
            CompletionStatus::Completed => "completed",
            CompletionStatus::Archived => "archived",
        }
    }

    /// Whether defects recorded for the trade may still be edited
    pub fn allows_defect_edits(&self) -> bool {
        matches!(
            self,
            CompletionStatus::CompletedWithDefects | CompletionStatus::DefectsResolved
        )
    }

    /// The active workflow ends once the trade is completed
    pub fn is_terminal(&self) -> bool {
        matches!(self, CompletionStatus::Completed | CompletionStatus::Archived)
    }
}

impl fmt::Display for CompletionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity of a documented defect
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DefectSeverity {
    Critical,
    Major,
    #[default]
    Minor,
}

impl DefectSeverity {
    /// Label shown to German-speaking users
    pub fn label(&self) -> &'static str {
        match self {
            DefectSeverity::Critical => "Kritisch",
            DefectSeverity::Major => "Erheblich",
            DefectSeverity::Minor => "Geringfügig",
        }
    }
}

/// Trade as returned by `GET /milestones/{id}`
///
/// Only the fields the completion workflow depends on are modelled; unknown
/// fields are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct MilestoneSummary {
    pub id: MilestoneId,
    pub project_id: ProjectId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub completion_status: CompletionStatus,
    #[serde(default)]
    #[validate(range(min = 0, max = 100))]
    pub progress_percentage: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bautraeger_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_provider_id: Option<UserId>,
    #[serde(default)]
    pub has_unread_messages_bautraeger: bool,
    #[serde(default)]
    pub has_unread_messages_dienstleister: bool,
    /// Monotonic server-side version, when the backend provides one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<u64>,
}

/// Acceptance record as returned by `GET /acceptance/milestone/{id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcceptanceRecord {
    pub id: AcceptanceId,
    pub milestone_id: MilestoneId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_completion_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl AcceptanceRecord {
    pub fn is_final(&self) -> bool {
        self.final_completion_date.is_some()
    }
}

/// Defect (Mangel) documented during an acceptance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Defect {
    pub id: DefectId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
    #[serde(default)]
    pub severity: DefectSeverity,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub photos: Vec<String>,
    #[serde(default)]
    pub resolved: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution_notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<i64>,
}

/// Defect as entered by the project owner, before the server assigns an id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct NewDefect {
    #[validate(length(min = 1, message = "Title cannot be empty"))]
    pub title: String,
    #[validate(length(min = 1, message = "Description cannot be empty"))]
    pub description: String,
    #[serde(default)]
    pub severity: DefectSeverity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub photos: Vec<String>,
}

/// Body of `POST /milestones/{id}/progress/completion`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct CompletionRequest {
    pub message: String,
    #[serde(default = "completion_update_type")]
    pub update_type: String,
}

fn completion_update_type() -> String {
    "completion".to_string()
}

impl CompletionRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            update_type: completion_update_type(),
        }
    }
}

/// Body of `POST /milestones/{id}/progress/completion/response`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct CompletionResponseRequest {
    pub accepted: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision_deadline: Option<NaiveDate>,
}

/// Body of `PUT /milestones/{id}/progress/completion`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct CompletionStatusUpdate {
    pub status: CompletionStatus,
    pub message: String,
}

/// Body of `POST /milestones/{id}/progress/`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ProgressUpdateRequest {
    pub update_type: String,
    pub message: String,
    #[validate(range(min = 0, max = 100))]
    pub progress_percentage: u8,
}

impl ProgressUpdateRequest {
    pub fn new(progress_percentage: u8, message: impl Into<String>) -> Self {
        Self {
            update_type: "progress".to_string(),
            message: message.into(),
            progress_percentage,
        }
    }
}

/// Body of `POST /acceptance`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct CreateAcceptanceRequest {
    pub milestone_id: MilestoneId,
    pub status: CompletionStatus,
    pub notes: String,
}

/// Body of `POST /acceptance/defects`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct CreateDefectRequest {
    pub acceptance_id: AcceptanceId,
    #[serde(flatten)]
    #[validate(nested)]
    pub defect: NewDefect,
    pub resolved: bool,
}

/// Body of `PUT /acceptance/defects/{defectId}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct DefectResolutionUpdate {
    pub resolved: bool,
    pub resolution_notes: String,
}

/// Body of `POST /acceptance/{id}/defects/submit-resolution`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct SubmitResolutionRequest {
    pub message: String,
    pub resolution_notes: String,
}

/// Body of `POST /acceptance/{id}/final-complete`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FinalAcceptanceRequest {
    pub accepted: bool,
    #[validate(range(min = 1, max = 5))]
    pub quality_rating: u8,
    #[validate(range(min = 1, max = 5))]
    pub timeliness_rating: u8,
    #[validate(range(min = 1, max = 5))]
    pub overall_rating: u8,
    pub final_notes: String,
    #[serde(rename = "milestone_id")]
    pub milestone_id: MilestoneId,
}

/// Kind of appointment proposed through `POST /appointments/schedule`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentType {
    Acceptance,
}

/// Body of `POST /appointments/schedule`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct AppointmentRequest {
    pub trade_id: MilestoneId,
    pub appointment_type: AppointmentType,
    pub proposed_date: DateTime<Utc>,
    #[serde(default)]
    pub notes: String,
}

/// Kind of counterparty notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    MilestoneCompleted,
    DefectsResolved,
    AcceptanceWithDefects,
    ProjectStatusChanged,
}

/// Notification urgency
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationPriority {
    Low,
    #[default]
    Normal,
    High,
    Urgent,
}

/// Body of `POST /notifications`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct NotificationRequest {
    pub recipient_id: UserId,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    #[validate(length(min = 1))]
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub priority: NotificationPriority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_project_id: Option<ProjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_milestone_id: Option<MilestoneId>,
    /// Free-form JSON payload, serialized as a string like the backend expects
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

/// Priority of a Kanban task
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

/// Body of `POST /tasks`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct TaskRequest {
    #[validate(length(min = 1, message = "Task title is required"))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_task_status")]
    pub status: String,
    #[serde(default)]
    pub priority: TaskPriority,
    pub project_id: ProjectId,
    #[serde(default)]
    pub assigned_to: Option<UserId>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub is_milestone: bool,
}

fn default_task_status() -> String {
    "todo".to_string()
}

/// Minimal creation response: the id assigned by the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedResource {
    pub id: i64,
}

/// Error body returned by the backend (`{"detail": ...}`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemDetails {
    pub detail: serde_json::Value,
}

impl fmt::Display for ProblemDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.detail {
            serde_json::Value::String(s) => f.write_str(s),
            other => write!(f, "{}", other),
        }
    }
}
