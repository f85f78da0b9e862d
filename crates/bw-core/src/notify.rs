//! Best-effort notifications and tracking tasks for the counterparty.
//!
//! Nothing in here fails a transition: errors are logged and reported as
//! [`SideEffect::Failed`].

use bw_client_api::ClientApi;
use bw_rest_api_contract::{
    MilestoneId, MilestoneSummary, NotificationPriority, NotificationRequest, NotificationType,
    ProjectId, TaskPriority, TaskRequest, UserId,
};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::completion::Role;

/// The trade a workflow operates on, as far as messages need it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeContext {
    pub milestone_id: MilestoneId,
    pub project_id: ProjectId,
    pub title: String,
    pub owner_id: Option<UserId>,
    pub provider_id: Option<UserId>,
}

impl TradeContext {
    pub fn from_milestone(milestone: &MilestoneSummary) -> Self {
        Self {
            milestone_id: milestone.id,
            project_id: milestone.project_id,
            title: milestone.title.clone(),
            owner_id: milestone.bautraeger_id,
            provider_id: milestone.service_provider_id,
        }
    }

    pub fn user_for(&self, role: Role) -> Option<UserId> {
        match role {
            Role::ProjectOwner => self.owner_id,
            Role::ServiceProvider => self.provider_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", content = "detail", rename_all = "snake_case")]
pub enum SideEffect {
    Sent,
    Skipped(&'static str),
    Failed(String),
}

impl SideEffect {
    pub fn is_failed(&self) -> bool {
        matches!(self, SideEffect::Failed(_))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Notifier {
    enabled: bool,
}

impl Notifier {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// Tell `recipient` about a workflow step.
    pub async fn notify<C: ClientApi + ?Sized>(
        &self,
        client: &C,
        trade: &TradeContext,
        recipient: Role,
        kind: NotificationType,
        message: &str,
    ) -> SideEffect {
        if !self.enabled {
            return SideEffect::Skipped("notifications disabled");
        }
        let Some(recipient_id) = trade.user_for(recipient) else {
            debug!(milestone_id = %trade.milestone_id, %recipient, "no recipient known, skipping notification");
            return SideEffect::Skipped("recipient unknown");
        };

        let (title, body, priority) = render(kind, &trade.title);
        let data = json!({
            "trade_title": trade.title,
            "message": message,
            "sent_at": chrono::Utc::now().to_rfc3339(),
        });
        let request = NotificationRequest {
            recipient_id,
            notification_type: kind,
            title,
            message: if message.is_empty() {
                body
            } else {
                format!("{body}\n\n{message}")
            },
            priority,
            related_project_id: Some(trade.project_id),
            related_milestone_id: Some(trade.milestone_id),
            data: Some(data.to_string()),
        };

        match client.create_notification(&request).await {
            Ok(()) => {
                debug!(milestone_id = %trade.milestone_id, ?kind, %recipient_id, "notification sent");
                SideEffect::Sent
            }
            Err(e) => {
                warn!(milestone_id = %trade.milestone_id, ?kind, error = %e, "failed to send notification");
                SideEffect::Failed(e.to_string())
            }
        }
    }

    /// Put a review task for the project owner on the Kanban board.
    pub async fn create_tracking_task<C: ClientApi + ?Sized>(
        &self,
        client: &C,
        trade: &TradeContext,
    ) -> SideEffect {
        if !self.enabled {
            return SideEffect::Skipped("notifications disabled");
        }

        let request = TaskRequest {
            title: format!("Abnahme prüfen: {}", trade.title),
            description: format!(
                "Der Dienstleister hat das Gewerk \"{}\" als fertiggestellt gemeldet. Bitte Abnahme durchführen.",
                trade.title
            ),
            status: "todo".to_string(),
            priority: TaskPriority::High,
            project_id: trade.project_id,
            assigned_to: trade.owner_id,
            due_date: None,
            is_milestone: false,
        };

        match client.create_task(&request).await {
            Ok(created) => {
                debug!(milestone_id = %trade.milestone_id, task_id = created.id, "tracking task created");
                SideEffect::Sent
            }
            Err(e) => {
                warn!(milestone_id = %trade.milestone_id, error = %e, "failed to create tracking task");
                SideEffect::Failed(e.to_string())
            }
        }
    }
}

fn render(kind: NotificationType, trade: &str) -> (String, String, NotificationPriority) {
    match kind {
        NotificationType::MilestoneCompleted => (
            format!("Fertigstellungsmeldung: {trade}"),
            format!(
                "Der Dienstleister hat das Gewerk \"{trade}\" als fertiggestellt markiert und bittet um Abnahme."
            ),
            NotificationPriority::High,
        ),
        NotificationType::AcceptanceWithDefects => (
            format!("Abnahme unter Vorbehalt: {trade}"),
            format!(
                "Das Gewerk \"{trade}\" wurde unter Vorbehalt abgenommen. Bitte beheben Sie die dokumentierten Mängel."
            ),
            NotificationPriority::High,
        ),
        NotificationType::DefectsResolved => (
            format!("Mängel behoben: {trade}"),
            format!(
                "Der Dienstleister meldet die Mängel am Gewerk \"{trade}\" als behoben. Die finale Abnahme kann erfolgen."
            ),
            NotificationPriority::High,
        ),
        NotificationType::ProjectStatusChanged => (
            format!("Statusänderung: {trade}"),
            format!("Der Status des Gewerks \"{trade}\" hat sich geändert."),
            NotificationPriority::Normal,
        ),
    }
}
