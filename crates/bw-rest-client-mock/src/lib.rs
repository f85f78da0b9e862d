//! Mock REST client backed by scenarios
//!
//! [`MockClient`] keeps the server-side state of one trade in memory, applies
//! the same status changes the backend would, records every call and fails
//! the endpoints a scenario marks as broken.

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use bw_client_api::{ClientApi, ClientApiError, ClientApiResult};
use bw_rest_api_contract::*;
use bw_test_scenarios::{Endpoint, InjectedFailure, Scenario};
use chrono::Utc;

/// A call observed by the mock, with the body that was sent
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    GetMilestone(MilestoneId),
    RequestCompletion(MilestoneId, CompletionRequest),
    RespondToCompletion(MilestoneId, CompletionResponseRequest),
    SetCompletionStatus(MilestoneId, CompletionStatusUpdate),
    PostProgress(MilestoneId, ProgressUpdateRequest),
    MarkMessagesRead(MilestoneId),
    ListAcceptances(MilestoneId),
    CreateAcceptance(CreateAcceptanceRequest),
    ListDefects(MilestoneId),
    CreateDefect(CreateDefectRequest),
    UpdateDefect(DefectId, DefectResolutionUpdate),
    SubmitResolution(AcceptanceId, SubmitResolutionRequest),
    FinalAcceptance(AcceptanceId, FinalAcceptanceRequest),
    ScheduleAppointment(AppointmentRequest),
    CreateNotification(NotificationRequest),
    CreateTask(TaskRequest),
}

impl RecordedCall {
    pub fn endpoint(&self) -> Endpoint {
        match self {
            RecordedCall::GetMilestone(..) => Endpoint::GetMilestone,
            RecordedCall::RequestCompletion(..) => Endpoint::RequestCompletion,
            RecordedCall::RespondToCompletion(..) => Endpoint::RespondToCompletion,
            RecordedCall::SetCompletionStatus(..) => Endpoint::SetCompletionStatus,
            RecordedCall::PostProgress(..) => Endpoint::PostProgress,
            RecordedCall::MarkMessagesRead(..) => Endpoint::MarkMessagesRead,
            RecordedCall::ListAcceptances(..) => Endpoint::ListAcceptances,
            RecordedCall::CreateAcceptance(..) => Endpoint::CreateAcceptance,
            RecordedCall::ListDefects(..) => Endpoint::ListDefects,
            RecordedCall::CreateDefect(..) => Endpoint::CreateDefect,
            RecordedCall::UpdateDefect(..) => Endpoint::UpdateDefect,
            RecordedCall::SubmitResolution(..) => Endpoint::SubmitResolution,
            RecordedCall::FinalAcceptance(..) => Endpoint::FinalAcceptance,
            RecordedCall::ScheduleAppointment(..) => Endpoint::ScheduleAppointment,
            RecordedCall::CreateNotification(..) => Endpoint::CreateNotification,
            RecordedCall::CreateTask(..) => Endpoint::CreateTask,
        }
    }
}

#[derive(Debug)]
struct State {
    milestone: MilestoneSummary,
    acceptances: Vec<AcceptanceRecord>,
    defects: Vec<Defect>,
    appointments: Vec<AppointmentRequest>,
    failures: Vec<InjectedFailure>,
    calls: Vec<RecordedCall>,
    next_id: i64,
}

impl State {
    fn check(&self, endpoint: Endpoint, defect_id: Option<DefectId>) -> ClientApiResult<()> {
        let failure = self.failures.iter().find(|f| {
            f.endpoint == endpoint && (f.defect_id.is_none() || f.defect_id == defect_id)
        });
        match failure {
            Some(f) => Err(ClientApiError::Status {
                status: f.status,
                detail: format!("injected failure for {:?}", endpoint),
            }),
            None => Ok(()),
        }
    }

    fn set_status(&mut self, status: CompletionStatus) {
        self.milestone.completion_status = status;
        if let Some(revision) = self.milestone.revision.as_mut() {
            *revision += 1;
        }
    }

    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn require_milestone(&self, milestone_id: MilestoneId) -> ClientApiResult<()> {
        if milestone_id != self.milestone.id {
            return Err(ClientApiError::Status {
                status: 404,
                detail: format!("milestone {} not found", milestone_id),
            });
        }
        Ok(())
    }
}

pub struct MockClient {
    state: Mutex<State>,
    latency: Mutex<Option<Duration>>,
}

impl MockClient {
    pub fn from_scenario(scenario: Scenario) -> Self {
        let next_id = scenario
            .acceptances
            .iter()
            .map(|a| a.id.0)
            .chain(scenario.defects.iter().map(|d| d.id.0))
            .max()
            .unwrap_or(0)
            .max(100);

        Self {
            state: Mutex::new(State {
                milestone: scenario.milestone,
                acceptances: scenario.acceptances,
                defects: scenario.defects,
                appointments: Vec::new(),
                failures: scenario.failures,
                calls: Vec::new(),
                next_id,
            }),
            latency: Mutex::new(None),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // a panicking test thread must not hide the state from the others
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Delay every call by `latency` (tokio time, so paused clocks apply)
    pub fn set_latency(&self, latency: Option<Duration>) {
        *self.latency.lock().unwrap_or_else(|e| e.into_inner()) = latency;
    }

    pub fn fail(&self, endpoint: Endpoint) {
        self.lock().failures.push(InjectedFailure {
            endpoint,
            defect_id: None,
            status: 500,
        });
    }

    pub fn recover(&self, endpoint: Endpoint) {
        self.lock().failures.retain(|f| f.endpoint != endpoint);
    }

    /// Simulate a change made by the counterparty on another device
    pub fn set_server_status(&self, status: CompletionStatus) {
        self.lock().set_status(status);
    }

    /// Simulate the provider resolving a defect from another session
    pub fn set_defect_resolved(&self, defect_id: DefectId, resolved: bool) {
        if let Some(defect) = self.lock().defects.iter_mut().find(|d| d.id == defect_id) {
            defect.resolved = resolved;
        }
    }

    pub fn set_unread(&self, bautraeger: bool, dienstleister: bool) {
        let mut state = self.lock();
        state.milestone.has_unread_messages_bautraeger = bautraeger;
        state.milestone.has_unread_messages_dienstleister = dienstleister;
    }

    pub fn milestone(&self) -> MilestoneSummary {
        self.lock().milestone.clone()
    }

    pub fn defects(&self) -> Vec<Defect> {
        self.lock().defects.clone()
    }

    pub fn acceptances(&self) -> Vec<AcceptanceRecord> {
        self.lock().acceptances.clone()
    }

    /// Appointment proposals the server accepted
    pub fn appointments(&self) -> Vec<AppointmentRequest> {
        self.lock().appointments.clone()
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().calls.clone()
    }

    pub fn calls_to(&self, endpoint: Endpoint) -> Vec<RecordedCall> {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.endpoint() == endpoint)
            .cloned()
            .collect()
    }

    pub fn call_count(&self, endpoint: Endpoint) -> usize {
        self.calls_to(endpoint).len()
    }

    async fn simulate_latency(&self) {
        let latency = *self.latency.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }

    /// Record the call, wait for the configured latency, then fail or run `f`
    async fn handle<T>(
        &self,
        call: RecordedCall,
        defect_id: Option<DefectId>,
        f: impl FnOnce(&mut State) -> ClientApiResult<T>,
    ) -> ClientApiResult<T> {
        let endpoint = call.endpoint();
        self.lock().calls.push(call);
        self.simulate_latency().await;

        let mut state = self.lock();
        state.check(endpoint, defect_id)?;
        f(&mut state)
    }
}

#[async_trait]
impl ClientApi for MockClient {
    async fn get_milestone(&self, milestone_id: MilestoneId) -> ClientApiResult<MilestoneSummary> {
        self.handle(RecordedCall::GetMilestone(milestone_id), None, |s| {
            s.require_milestone(milestone_id)?;
            Ok(s.milestone.clone())
        })
        .await
    }

    async fn request_completion(
        &self,
        milestone_id: MilestoneId,
        request: &CompletionRequest,
    ) -> ClientApiResult<()> {
        let call = RecordedCall::RequestCompletion(milestone_id, request.clone());
        self.handle(call, None, |s| {
            s.require_milestone(milestone_id)?;
            s.set_status(CompletionStatus::CompletionRequested);
            Ok(())
        })
        .await
    }

    async fn respond_to_completion(
        &self,
        milestone_id: MilestoneId,
        request: &CompletionResponseRequest,
    ) -> ClientApiResult<()> {
        let accepted = request.accepted;
        let call = RecordedCall::RespondToCompletion(milestone_id, request.clone());
        self.handle(call, None, |s| {
            s.require_milestone(milestone_id)?;
            s.set_status(if accepted {
                CompletionStatus::Completed
            } else {
                CompletionStatus::UnderReview
            });
            Ok(())
        })
        .await
    }

    async fn set_completion_status(
        &self,
        milestone_id: MilestoneId,
        request: &CompletionStatusUpdate,
    ) -> ClientApiResult<()> {
        let status = request.status;
        let call = RecordedCall::SetCompletionStatus(milestone_id, request.clone());
        self.handle(call, None, |s| {
            s.require_milestone(milestone_id)?;
            s.set_status(status);
            Ok(())
        })
        .await
    }

    async fn post_progress(
        &self,
        milestone_id: MilestoneId,
        request: &ProgressUpdateRequest,
    ) -> ClientApiResult<()> {
        let progress = request.progress_percentage;
        let call = RecordedCall::PostProgress(milestone_id, request.clone());
        self.handle(call, None, |s| {
            s.require_milestone(milestone_id)?;
            s.milestone.progress_percentage = progress;
            Ok(())
        })
        .await
    }

    async fn mark_messages_read(&self, milestone_id: MilestoneId) -> ClientApiResult<()> {
        self.handle(RecordedCall::MarkMessagesRead(milestone_id), None, |s| {
            s.require_milestone(milestone_id)?;
            s.milestone.has_unread_messages_bautraeger = false;
            s.milestone.has_unread_messages_dienstleister = false;
            Ok(())
        })
        .await
    }

    async fn list_acceptances(
        &self,
        milestone_id: MilestoneId,
    ) -> ClientApiResult<Vec<AcceptanceRecord>> {
        self.handle(RecordedCall::ListAcceptances(milestone_id), None, |s| {
            Ok(s.acceptances
                .iter()
                .filter(|a| a.milestone_id == milestone_id)
                .cloned()
                .collect())
        })
        .await
    }

    async fn create_acceptance(
        &self,
        request: &CreateAcceptanceRequest,
    ) -> ClientApiResult<CreatedResource> {
        let call = RecordedCall::CreateAcceptance(request.clone());
        let request = request.clone();
        self.handle(call, None, move |s| {
            let id = s.allocate_id();
            s.acceptances.push(AcceptanceRecord {
                id: AcceptanceId(id),
                milestone_id: request.milestone_id,
                status: Some(request.status.to_string()),
                final_completion_date: None,
                created_at: Some(Utc::now()),
            });
            // a new acceptance cycle starts with an empty ledger
            s.defects.clear();
            Ok(CreatedResource { id })
        })
        .await
    }

    async fn list_defects(&self, milestone_id: MilestoneId) -> ClientApiResult<Vec<Defect>> {
        self.handle(RecordedCall::ListDefects(milestone_id), None, |s| {
            s.require_milestone(milestone_id)?;
            Ok(s.defects.clone())
        })
        .await
    }

    async fn create_defect(&self, request: &CreateDefectRequest) -> ClientApiResult<Defect> {
        let call = RecordedCall::CreateDefect(request.clone());
        let request = request.clone();
        self.handle(call, None, move |s| {
            let id = s.allocate_id();
            let defect = Defect {
                id: DefectId(id),
                title: request.defect.title,
                description: request.defect.description,
                location: request.defect.location,
                room: request.defect.room,
                severity: request.defect.severity,
                photos: request.defect.photos,
                resolved: request.resolved,
                resolved_at: None,
                resolution_notes: None,
                task_id: None,
            };
            s.defects.push(defect.clone());
            Ok(defect)
        })
        .await
    }

    async fn update_defect(
        &self,
        defect_id: DefectId,
        request: &DefectResolutionUpdate,
    ) -> ClientApiResult<()> {
        let call = RecordedCall::UpdateDefect(defect_id, request.clone());
        let request = request.clone();
        self.handle(call, Some(defect_id), move |s| {
            let defect = s
                .defects
                .iter_mut()
                .find(|d| d.id == defect_id)
                .ok_or_else(|| ClientApiError::Status {
                    status: 404,
                    detail: format!("defect {} not found", defect_id),
                })?;
            defect.resolved = request.resolved;
            defect.resolution_notes = Some(request.resolution_notes);
            defect.resolved_at = request.resolved.then(Utc::now);
            Ok(())
        })
        .await
    }

    async fn submit_resolution(
        &self,
        acceptance_id: AcceptanceId,
        request: &SubmitResolutionRequest,
    ) -> ClientApiResult<()> {
        let call = RecordedCall::SubmitResolution(acceptance_id, request.clone());
        self.handle(call, None, |s| {
            s.set_status(CompletionStatus::DefectsResolved);
            Ok(())
        })
        .await
    }

    async fn final_acceptance(
        &self,
        acceptance_id: AcceptanceId,
        request: &FinalAcceptanceRequest,
    ) -> ClientApiResult<()> {
        let call = RecordedCall::FinalAcceptance(acceptance_id, request.clone());
        self.handle(call, None, |s| {
            if let Some(record) = s.acceptances.iter_mut().find(|a| a.id == acceptance_id) {
                record.final_completion_date = Some(Utc::now());
            }
            s.set_status(CompletionStatus::Completed);
            Ok(())
        })
        .await
    }

    async fn schedule_appointment(&self, request: &AppointmentRequest) -> ClientApiResult<()> {
        let call = RecordedCall::ScheduleAppointment(request.clone());
        let request = request.clone();
        self.handle(call, None, move |s| {
            s.require_milestone(request.trade_id)?;
            s.appointments.push(request);
            Ok(())
        })
        .await
    }

    async fn create_notification(&self, request: &NotificationRequest) -> ClientApiResult<()> {
        self.handle(RecordedCall::CreateNotification(request.clone()), None, |_| Ok(()))
            .await
    }

    async fn create_task(&self, request: &TaskRequest) -> ClientApiResult<CreatedResource> {
        self.handle(RecordedCall::CreateTask(request.clone()), None, |s| {
            Ok(CreatedResource {
                id: s.allocate_id(),
            })
        })
        .await
    }
}
