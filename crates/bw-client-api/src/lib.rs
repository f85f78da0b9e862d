//! Client API trait for the BuildWise completion workflow
//!
//! One method per collaborator endpoint. The HTTP client and the
//! scenario-driven mock both implement [`ClientApi`], so the workflow core
//! never depends on a transport.

use async_trait::async_trait;
use bw_rest_api_contract::*;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientApiError {
    #[error("server error: {0}")]
    Server(String),
    #[error("server returned {status}: {detail}")]
    Status { status: u16, detail: String },
    #[error("invalid request: {0}")]
    Validation(String),
    #[error("unexpected: {0}")]
    Unexpected(String),
}

impl From<ApiContractError> for ClientApiError {
    fn from(err: ApiContractError) -> Self {
        ClientApiError::Validation(err.to_string())
    }
}

pub type ClientApiResult<T> = Result<T, ClientApiError>;

#[async_trait]
pub trait ClientApi: Send + Sync {
    async fn get_milestone(&self, milestone_id: MilestoneId) -> ClientApiResult<MilestoneSummary>;

    async fn request_completion(
        &self,
        milestone_id: MilestoneId,
        request: &CompletionRequest,
    ) -> ClientApiResult<()>;

    async fn respond_to_completion(
        &self,
        milestone_id: MilestoneId,
        request: &CompletionResponseRequest,
    ) -> ClientApiResult<()>;

    async fn set_completion_status(
        &self,
        milestone_id: MilestoneId,
        request: &CompletionStatusUpdate,
    ) -> ClientApiResult<()>;

    async fn post_progress(
        &self,
        milestone_id: MilestoneId,
        request: &ProgressUpdateRequest,
    ) -> ClientApiResult<()>;

    async fn mark_messages_read(&self, milestone_id: MilestoneId) -> ClientApiResult<()>;

    async fn list_acceptances(
        &self,
        milestone_id: MilestoneId,
    ) -> ClientApiResult<Vec<AcceptanceRecord>>;

    async fn create_acceptance(
        &self,
        request: &CreateAcceptanceRequest,
    ) -> ClientApiResult<CreatedResource>;

    async fn list_defects(&self, milestone_id: MilestoneId) -> ClientApiResult<Vec<Defect>>;

    async fn create_defect(&self, request: &CreateDefectRequest) -> ClientApiResult<Defect>;

    async fn update_defect(
        &self,
        defect_id: DefectId,
        request: &DefectResolutionUpdate,
    ) -> ClientApiResult<()>;

    async fn submit_resolution(
        &self,
        acceptance_id: AcceptanceId,
        request: &SubmitResolutionRequest,
    ) -> ClientApiResult<()>;

    async fn final_acceptance(
        &self,
        acceptance_id: AcceptanceId,
        request: &FinalAcceptanceRequest,
    ) -> ClientApiResult<()>;

    async fn schedule_appointment(&self, request: &AppointmentRequest) -> ClientApiResult<()>;

    async fn create_notification(&self, request: &NotificationRequest) -> ClientApiResult<()>;

    async fn create_task(&self, request: &TaskRequest) -> ClientApiResult<CreatedResource>;
}
