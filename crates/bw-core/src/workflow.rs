//! Completion workflow of one trade, seen from one party.
//!
//! Every transition follows the same path: permission check, in-flight
//! guard, state-machine check, optimistic update, API call. A failed call
//! rolls the status back (unless disabled) and surfaces as
//! [`Error::Transition`]. Notifications and tracking tasks run after a
//! successful call and never fail the transition.

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use bw_client_api::{ClientApi, ClientApiResult};
use bw_rest_api_contract::{
    validate_progress, validate_request, AcceptanceId, AcceptanceRecord, AppointmentRequest,
    AppointmentType, CompletionRequest,
    CompletionResponseRequest, CompletionStatus, CompletionStatusUpdate, CreateAcceptanceRequest,
    CreateDefectRequest, Defect, DefectId, FinalAcceptanceRequest, MilestoneId, MilestoneSummary,
    NewDefect, NotificationType, ProgressUpdateRequest, SubmitResolutionRequest,
};
use chrono::{DateTime, NaiveDate, Utc};
use futures::future::join_all;
use serde::Serialize;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::completion::{self, CompletionAction, Role, Transition};
use crate::config::WorkflowConfig;
use crate::ledger::{DefectFailure, DefectLedger, ResolutionReport};
use crate::notify::{Notifier, SideEffect, TradeContext};
use crate::status::{Applied, Checkpoint, StatusCell, StatusSnapshot};
use crate::{Error, Result};

const ACCEPTED_MESSAGE: &str = "Gewerk abgenommen.";
const REVISION_MESSAGE: &str = "Nachbesserung erforderlich.";
const PROCEED_MESSAGE: &str = "Weiter ohne Mängelbehebung.";
const PROCEED_NOTES_PREFIX: &str = "[Ohne Mängelbehebung]";

/// What a workflow operation did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome {
    pub action: CompletionAction,
    pub from: CompletionStatus,
    pub to: CompletionStatus,
    /// `false` when the trade already was at the action's target.
    pub changed: bool,
    pub side_effects: Vec<SideEffect>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<ResolutionReport>,
}

impl Outcome {
    fn unchanged(action: CompletionAction, status: CompletionStatus) -> Self {
        Self {
            action,
            from: status,
            to: status,
            changed: false,
            side_effects: Vec::new(),
            report: None,
        }
    }

    fn moved(action: CompletionAction, from: CompletionStatus, to: CompletionStatus) -> Self {
        Self {
            action,
            from,
            to,
            changed: true,
            side_effects: Vec::new(),
            report: None,
        }
    }
}

/// Ratings and notes for the final sign-off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalAcceptance {
    pub quality: u8,
    pub timeliness: u8,
    pub overall: u8,
    pub notes: String,
}

impl Default for FinalAcceptance {
    fn default() -> Self {
        Self {
            quality: 5,
            timeliness: 5,
            overall: 5,
            notes: String::new(),
        }
    }
}

/// Acceptance record created by an `accept_with_defects` call whose
/// status update has not gone through yet. A retry continues it.
#[derive(Debug, Clone)]
struct PendingAcceptance {
    id: AcceptanceId,
    documented: Vec<(NewDefect, DefectId)>,
}

/// Holds the in-flight flag until dropped.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct CompletionWorkflow<C: ClientApi + ?Sized> {
    client: Arc<C>,
    role: Role,
    config: WorkflowConfig,
    notifier: Notifier,
    trade: TradeContext,
    cell: Mutex<StatusCell>,
    ledger: tokio::sync::Mutex<DefectLedger>,
    acceptance_id: Mutex<Option<AcceptanceId>>,
    pending_acceptance: Mutex<Option<PendingAcceptance>>,
    progress: AtomicU8,
    unread: AtomicBool,
    read_at: Mutex<Option<Instant>>,
    in_flight: AtomicBool,
}

impl<C: ClientApi + ?Sized> CompletionWorkflow<C> {
    /// Fetch the trade and its acceptance records and start tracking it.
    pub async fn open(
        client: Arc<C>,
        milestone_id: MilestoneId,
        role: Role,
        config: WorkflowConfig,
    ) -> Result<Self> {
        config.validate()?;
        let milestone = client.get_milestone(milestone_id).await?;
        let acceptances = fetch_acceptances(&*client, milestone_id).await;
        let status = derive_status(&milestone, acceptances.as_deref());

        let mut cell = StatusCell::new(status);
        let ticket = cell.begin_fetch();
        cell.apply_server(ticket, status, milestone.revision);

        let mut ledger = if status.allows_defect_edits() || status.is_terminal() {
            DefectLedger::load(&*client, milestone_id).await
        } else {
            DefectLedger::default()
        };
        if status.is_terminal() {
            ledger.freeze();
        }

        info!(%milestone_id, %status, %role, "opened completion workflow");

        Ok(Self {
            trade: TradeContext::from_milestone(&milestone),
            progress: AtomicU8::new(milestone.progress_percentage),
            unread: AtomicBool::new(unread_for(&milestone, role)),
            acceptance_id: Mutex::new(acceptances.as_deref().and_then(last_acceptance_id)),
            pending_acceptance: Mutex::new(None),
            notifier: Notifier::new(config.notify_counterparty),
            cell: Mutex::new(cell),
            ledger: tokio::sync::Mutex::new(ledger),
            read_at: Mutex::new(None),
            in_flight: AtomicBool::new(false),
            client,
            role,
            config,
        })
    }

    pub fn milestone_id(&self) -> MilestoneId {
        self.trade.milestone_id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn trade(&self) -> &TradeContext {
        &self.trade
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    pub fn status(&self) -> CompletionStatus {
        self.cell().status()
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        self.cell().snapshot()
    }

    /// Watch every status change, local or fetched.
    pub fn subscribe(&self) -> watch::Receiver<StatusSnapshot> {
        self.cell().subscribe()
    }

    pub fn available_actions(&self) -> Vec<CompletionAction> {
        completion::available_actions(self.status(), self.role)
    }

    pub fn acceptance_id(&self) -> Option<AcceptanceId> {
        *lock(&self.acceptance_id)
    }

    pub fn progress(&self) -> u8 {
        self.progress.load(Ordering::Acquire)
    }

    pub fn has_unread_messages(&self) -> bool {
        self.unread.load(Ordering::Acquire)
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Whether background refreshes should hold off after messages were read.
    pub fn polling_suppressed(&self) -> bool {
        match *lock(&self.read_at) {
            Some(at) => at.elapsed() < self.config.read_cooldown(),
            None => false,
        }
    }

    /// Re-fetch the trade and reconcile the local status.
    pub async fn refresh(&self) -> Result<Applied> {
        let ticket = self.cell().begin_fetch();
        let milestone = self.client.get_milestone(self.trade.milestone_id).await?;
        let acceptances = fetch_acceptances(&*self.client, self.trade.milestone_id).await;
        let status = derive_status(&milestone, acceptances.as_deref());

        self.progress.store(milestone.progress_percentage, Ordering::Release);
        self.unread.store(unread_for(&milestone, self.role), Ordering::Release);
        if let Some(id) = acceptances.as_deref().and_then(last_acceptance_id) {
            *lock(&self.acceptance_id) = Some(id);
        }

        let applied = self.cell().apply_server(ticket, status, milestone.revision);
        match applied {
            Applied::Changed(snapshot) => {
                info!(milestone_id = %self.trade.milestone_id, status = %snapshot.status, "status changed on server");
                if snapshot.status.allows_defect_edits() {
                    self.load_defects().await?;
                } else if snapshot.status.is_terminal() {
                    self.ledger.lock().await.freeze();
                }
            }
            Applied::Stale => {
                debug!(milestone_id = %self.trade.milestone_id, "discarded stale status response");
            }
            Applied::Unchanged => {}
        }
        Ok(applied)
    }

    /// Report the trade as finished and ask the project owner for acceptance.
    pub async fn request_completion(&self, message: &str) -> Result<Outcome> {
        let action = CompletionAction::RequestCompletion;
        let _guard = self.enter(action)?;
        let (from, to) = match self.check(action)? {
            Transition::Moved { from, to } => (from, to),
            Transition::Unchanged(status) => return Ok(Outcome::unchanged(action, status)),
        };

        let checkpoint = self.cell().apply_optimistic(to);
        let request = CompletionRequest::new(message);
        self.commit(
            action,
            checkpoint,
            self.client.request_completion(self.trade.milestone_id, &request),
        )
        .await?;
        info!(milestone_id = %self.trade.milestone_id, %from, %to, "completion requested");

        let mut outcome = Outcome::moved(action, from, to);
        outcome.side_effects.push(
            self.notify(Role::ProjectOwner, NotificationType::MilestoneCompleted, message)
                .await,
        );
        // re-requests after a rejection already have a task on the board
        if from == CompletionStatus::InProgress {
            outcome
                .side_effects
                .push(self.notifier.create_tracking_task(&*self.client, &self.trade).await);
        }
        Ok(outcome)
    }

    /// Accept the trade as is, or send it back for rework.
    pub async fn respond_to_completion(
        &self,
        accepted: bool,
        message: Option<&str>,
        revision_deadline: Option<NaiveDate>,
    ) -> Result<Outcome> {
        let action = if accepted {
            CompletionAction::AcceptCompletion
        } else {
            CompletionAction::RejectCompletion
        };
        let _guard = self.enter(action)?;
        let (from, to) = match self.check(action)? {
            Transition::Moved { from, to } => (from, to),
            Transition::Unchanged(status) => return Ok(Outcome::unchanged(action, status)),
        };

        let message = message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(if accepted { ACCEPTED_MESSAGE } else { REVISION_MESSAGE });
        let request = CompletionResponseRequest {
            accepted,
            message: message.to_string(),
            revision_deadline: if accepted { None } else { revision_deadline },
        };

        let checkpoint = self.cell().apply_optimistic(to);
        self.commit(
            action,
            checkpoint,
            self.client.respond_to_completion(self.trade.milestone_id, &request),
        )
        .await?;
        info!(milestone_id = %self.trade.milestone_id, %from, %to, accepted, "responded to completion request");

        if accepted {
            self.ledger.lock().await.freeze();
        }

        let mut outcome = Outcome::moved(action, from, to);
        outcome.side_effects.push(
            self.notify(Role::ServiceProvider, NotificationType::ProjectStatusChanged, message)
                .await,
        );
        Ok(outcome)
    }

    /// Accept under reservation and document the defects found.
    ///
    /// Defects are created concurrently and independently; the ones the
    /// server rejected are listed in the outcome's report.
    pub async fn accept_with_defects(&self, defects: Vec<NewDefect>, notes: &str) -> Result<Outcome> {
        for defect in &defects {
            validate_request(defect)?;
        }

        let action = CompletionAction::AcceptWithDefects;
        let _guard = self.enter(action)?;
        let (from, to) = match self.check(action)? {
            Transition::Moved { from, to } => (from, to),
            Transition::Unchanged(status) => return Ok(Outcome::unchanged(action, status)),
        };

        let checkpoint = self.cell().apply_optimistic(to);
        let (acceptance_id, report) = self
            .commit(action, checkpoint, self.record_acceptance(defects, notes))
            .await?;
        *lock(&self.acceptance_id) = Some(acceptance_id);
        info!(
            milestone_id = %self.trade.milestone_id,
            %acceptance_id,
            documented = report.persisted.len(),
            failed = report.failed.len(),
            "accepted with defects"
        );

        self.load_defects().await?;

        let mut outcome = Outcome::moved(action, from, to);
        outcome.side_effects.push(
            self.notify(Role::ServiceProvider, NotificationType::AcceptanceWithDefects, notes)
                .await,
        );
        outcome.report = Some(report);
        Ok(outcome)
    }

    async fn record_acceptance(
        &self,
        defects: Vec<NewDefect>,
        notes: &str,
    ) -> ClientApiResult<(AcceptanceId, ResolutionReport)> {
        let pending = lock(&self.pending_acceptance).clone();
        let mut pending = match pending {
            Some(pending) => {
                debug!(acceptance_id = %pending.id, "continuing interrupted acceptance");
                pending
            }
            None => {
                let created = self
                    .client
                    .create_acceptance(&CreateAcceptanceRequest {
                        milestone_id: self.trade.milestone_id,
                        status: CompletionStatus::CompletedWithDefects,
                        notes: notes.to_string(),
                    })
                    .await?;
                PendingAcceptance {
                    id: AcceptanceId(created.id),
                    documented: Vec::new(),
                }
            }
        };
        let acceptance_id = pending.id;

        let requests: Vec<CreateDefectRequest> = defects
            .into_iter()
            .filter(|defect| !pending.documented.iter().any(|(done, _)| done == defect))
            .map(|defect| CreateDefectRequest {
                acceptance_id,
                defect,
                resolved: false,
            })
            .collect();
        let results = join_all(requests.iter().map(|r| self.client.create_defect(r))).await;

        let mut report = ResolutionReport::default();
        for (request, result) in requests.into_iter().zip(results) {
            match result {
                Ok(defect) => pending.documented.push((request.defect, defect.id)),
                Err(e) => {
                    warn!(title = %request.defect.title, error = %e, "failed to document defect");
                    report.failed.push(DefectFailure {
                        defect_id: None,
                        title: request.defect.title,
                        error: e.to_string(),
                    });
                }
            }
        }
        report.persisted = pending.documented.iter().map(|(_, id)| *id).collect();
        *lock(&self.pending_acceptance) = Some(pending);

        self.client
            .set_completion_status(
                self.trade.milestone_id,
                &CompletionStatusUpdate {
                    status: CompletionStatus::CompletedWithDefects,
                    message: notes.to_string(),
                },
            )
            .await?;
        *lock(&self.pending_acceptance) = None;
        Ok((acceptance_id, report))
    }

    /// Reload the defect ledger from the server, discarding local edits.
    pub async fn load_defects(&self) -> Result<usize> {
        let mut ledger = DefectLedger::load(&*self.client, self.trade.milestone_id).await;
        if self.status().is_terminal() {
            ledger.freeze();
        }
        let count = ledger.len();
        *self.ledger.lock().await = ledger;
        Ok(count)
    }

    /// Flip a defect's local resolved flag.
    pub async fn toggle_defect(&self, defect_id: DefectId) -> Result<bool> {
        let mut ledger = self.ledger.lock().await;
        if self.status().is_terminal() {
            ledger.freeze();
        }
        ledger.toggle_resolved(defect_id)
    }

    pub async fn defects(&self) -> Vec<Defect> {
        self.ledger.lock().await.defects()
    }

    pub async fn pending_resolutions(&self) -> Vec<DefectId> {
        self.ledger.lock().await.pending_resolutions()
    }

    /// Persist the defects marked resolved and report the resolution.
    ///
    /// Defects whose update failed are listed in the report; the
    /// transition itself only fails when the resolution report does.
    pub async fn submit_resolution(&self, message: &str, notes: &str) -> Result<Outcome> {
        let action = CompletionAction::ReportDefectResolution;
        let _guard = self.enter(action)?;
        let (from, to) = match self.check(action)? {
            Transition::Moved { from, to } => (from, to),
            Transition::Unchanged(status) => return Ok(Outcome::unchanged(action, status)),
        };
        let acceptance_id = self.require_acceptance()?;

        let checkpoint = self.cell().apply_optimistic(to);
        let report = self
            .ledger
            .lock()
            .await
            .persist_resolutions(&*self.client, notes)
            .await;
        let request = SubmitResolutionRequest {
            message: message.to_string(),
            resolution_notes: notes.to_string(),
        };
        self.commit(
            action,
            checkpoint,
            self.client.submit_resolution(acceptance_id, &request),
        )
        .await?;
        info!(
            milestone_id = %self.trade.milestone_id,
            persisted = report.persisted.len(),
            failed = report.failed.len(),
            "defect resolution reported"
        );

        let mut outcome = Outcome::moved(action, from, to);
        outcome.side_effects.push(
            self.notify(Role::ProjectOwner, NotificationType::DefectsResolved, message)
                .await,
        );
        outcome.report = Some(report);
        Ok(outcome)
    }

    /// Hand the trade back for final acceptance without fixing the defects.
    pub async fn proceed_without_resolution(&self, notes: &str) -> Result<Outcome> {
        let action = CompletionAction::ProceedWithoutResolution;
        let _guard = self.enter(action)?;
        let (from, to) = match self.check(action)? {
            Transition::Moved { from, to } => (from, to),
            Transition::Unchanged(status) => return Ok(Outcome::unchanged(action, status)),
        };
        let acceptance_id = self.require_acceptance()?;

        let request = SubmitResolutionRequest {
            message: PROCEED_MESSAGE.to_string(),
            resolution_notes: format!("{PROCEED_NOTES_PREFIX} {notes}").trim_end().to_string(),
        };
        let checkpoint = self.cell().apply_optimistic(to);
        self.commit(
            action,
            checkpoint,
            self.client.submit_resolution(acceptance_id, &request),
        )
        .await?;
        info!(milestone_id = %self.trade.milestone_id, "proceeding without defect resolution");

        let mut outcome = Outcome::moved(action, from, to);
        outcome.side_effects.push(
            self.notify(Role::ProjectOwner, NotificationType::DefectsResolved, PROCEED_MESSAGE)
                .await,
        );
        Ok(outcome)
    }

    /// Sign the trade off after the defects were handled.
    pub async fn final_accept(&self, acceptance: FinalAcceptance) -> Result<Outcome> {
        let action = CompletionAction::FinalAccept;
        let _guard = self.enter(action)?;
        let (from, to) = match self.check(action)? {
            Transition::Moved { from, to } => (from, to),
            Transition::Unchanged(status) => return Ok(Outcome::unchanged(action, status)),
        };
        let acceptance_id = self.require_acceptance()?;

        let request = FinalAcceptanceRequest {
            accepted: true,
            quality_rating: acceptance.quality,
            timeliness_rating: acceptance.timeliness,
            overall_rating: acceptance.overall,
            final_notes: acceptance.notes,
            milestone_id: self.trade.milestone_id,
        };
        validate_request(&request)?;

        let checkpoint = self.cell().apply_optimistic(to);
        let mut ledger = self.ledger.lock().await;
        let report = ledger
            .persist_resolutions(&*self.client, &request.final_notes)
            .await;
        self.commit(
            action,
            checkpoint,
            self.client.final_acceptance(acceptance_id, &request),
        )
        .await?;
        ledger.freeze();
        drop(ledger);
        info!(
            milestone_id = %self.trade.milestone_id,
            %acceptance_id,
            persisted = report.persisted.len(),
            failed = report.failed.len(),
            "final acceptance completed"
        );

        let mut outcome = Outcome::moved(action, from, to);
        outcome.side_effects.push(
            self.notify(
                Role::ServiceProvider,
                NotificationType::ProjectStatusChanged,
                "Finale Abnahme erfolgt.",
            )
            .await,
        );
        outcome.report = Some(report);
        Ok(outcome)
    }

    /// Propose a date for the on-site acceptance inspection.
    ///
    /// Only the project owner can do this, and only while a completion
    /// request is open. The server notifies the service provider.
    pub async fn schedule_acceptance(&self, proposed_date: DateTime<Utc>, notes: &str) -> Result<()> {
        let status = self.status();
        if self.role != Role::ProjectOwner || status != CompletionStatus::CompletionRequested {
            return Err(Error::AppointmentNotAllowed {
                role: self.role,
                status,
            });
        }
        if proposed_date <= Utc::now() {
            return Err(Error::validation("the proposed appointment lies in the past"));
        }

        let request = AppointmentRequest {
            trade_id: self.trade.milestone_id,
            appointment_type: AppointmentType::Acceptance,
            proposed_date,
            notes: notes.to_string(),
        };
        validate_request(&request)?;
        self.client
            .schedule_appointment(&request)
            .await
            .map_err(Error::Appointment)?;
        info!(milestone_id = %self.trade.milestone_id, %proposed_date, "acceptance appointment proposed");
        Ok(())
    }

    /// Post a progress update; independent of the completion status.
    pub async fn update_progress(&self, progress: u8, message: &str) -> Result<()> {
        validate_progress(progress)?;
        let request = ProgressUpdateRequest::new(progress, message);
        self.client
            .post_progress(self.trade.milestone_id, &request)
            .await?;
        self.progress.store(progress, Ordering::Release);
        info!(milestone_id = %self.trade.milestone_id, progress, "progress updated");
        Ok(())
    }

    /// Mark the trade's messages read and hold off polling for a while.
    pub async fn mark_messages_read(&self) -> Result<()> {
        self.client
            .mark_messages_read(self.trade.milestone_id)
            .await?;
        self.unread.store(false, Ordering::Release);
        *lock(&self.read_at) = Some(Instant::now());
        debug!(milestone_id = %self.trade.milestone_id, "messages marked read");
        Ok(())
    }

    fn cell(&self) -> MutexGuard<'_, StatusCell> {
        lock(&self.cell)
    }

    fn enter(&self, action: CompletionAction) -> Result<InFlight<'_>> {
        if action.actor() != Some(self.role) {
            return Err(Error::NotPermitted {
                role: self.role,
                action,
            });
        }
        InFlight::acquire(&self.in_flight).ok_or(Error::Busy)
    }

    fn check(&self, action: CompletionAction) -> Result<Transition> {
        let transition = completion::transition(self.status(), action)?;
        if !transition.is_change() {
            debug!(milestone_id = %self.trade.milestone_id, %action, "already at target, nothing to do");
        }
        Ok(transition)
    }

    fn require_acceptance(&self) -> Result<AcceptanceId> {
        self.acceptance_id()
            .ok_or(Error::MissingAcceptance(self.trade.milestone_id))
    }

    async fn commit<T>(
        &self,
        action: CompletionAction,
        checkpoint: Checkpoint,
        call: impl Future<Output = ClientApiResult<T>>,
    ) -> Result<T> {
        match call.await {
            Ok(value) => Ok(value),
            Err(e) => {
                if self.config.rollback_on_failure {
                    let restored = self.cell().rollback(checkpoint);
                    warn!(
                        milestone_id = %self.trade.milestone_id,
                        %action,
                        error = %e,
                        restored,
                        previous = %checkpoint.previous(),
                        "transition failed, rolled back"
                    );
                } else {
                    warn!(milestone_id = %self.trade.milestone_id, %action, error = %e, "transition failed");
                }
                Err(Error::transition(action, e))
            }
        }
    }

    async fn notify(&self, recipient: Role, kind: NotificationType, message: &str) -> SideEffect {
        self.notifier
            .notify(&*self.client, &self.trade, recipient, kind, message)
            .await
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

async fn fetch_acceptances<C: ClientApi + ?Sized>(
    client: &C,
    milestone_id: MilestoneId,
) -> Option<Vec<AcceptanceRecord>> {
    match client.list_acceptances(milestone_id).await {
        Ok(records) => Some(records),
        Err(e) => {
            warn!(%milestone_id, error = %e, "could not load acceptance records");
            None
        }
    }
}

/// A final acceptance on record wins over the milestone's own status.
fn derive_status(
    milestone: &MilestoneSummary,
    acceptances: Option<&[AcceptanceRecord]>,
) -> CompletionStatus {
    let finalized = acceptances
        .and_then(|records| records.last())
        .is_some_and(AcceptanceRecord::is_final);
    if finalized && milestone.completion_status != CompletionStatus::Archived {
        CompletionStatus::Completed
    } else {
        milestone.completion_status
    }
}

fn last_acceptance_id(records: &[AcceptanceRecord]) -> Option<AcceptanceId> {
    records.last().map(|r| r.id)
}

fn unread_for(milestone: &MilestoneSummary, role: Role) -> bool {
    match role {
        Role::ProjectOwner => milestone.has_unread_messages_bautraeger,
        Role::ServiceProvider => milestone.has_unread_messages_dienstleister,
    }
}
