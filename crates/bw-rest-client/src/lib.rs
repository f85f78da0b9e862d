//! REST API client for the BuildWise backend
//!
//! This crate provides the HTTP client for the endpoints the trade completion
//! workflow depends on. It includes bearer authentication, request
//! validation against the contract types and error-body decoding.

pub mod auth;
pub mod client;
pub mod error;

pub use auth::*;
pub use client::*;
pub use error::*;

use async_trait::async_trait;
use bw_client_api::{ClientApi, ClientApiError, ClientApiResult};
use bw_rest_api_contract::*;

impl From<RestClientError> for ClientApiError {
    fn from(err: RestClientError) -> Self {
        match err {
            RestClientError::ServerError { status, details } => ClientApiError::Status {
                status: status.as_u16(),
                detail: details.to_string(),
            },
            RestClientError::UnexpectedResponse { status, body } => ClientApiError::Status {
                status: status.as_u16(),
                detail: body,
            },
            RestClientError::ApiContract(e) => ClientApiError::Validation(e.to_string()),
            RestClientError::Json(e) => ClientApiError::Unexpected(format!("malformed response body: {e}")),
            other => ClientApiError::Server(other.to_string()),
        }
    }
}

#[async_trait]
impl ClientApi for client::RestClient {
    async fn get_milestone(&self, milestone_id: MilestoneId) -> ClientApiResult<MilestoneSummary> {
        Ok(self.get_milestone(milestone_id).await?)
    }

    async fn request_completion(
        &self,
        milestone_id: MilestoneId,
        request: &CompletionRequest,
    ) -> ClientApiResult<()> {
        Ok(self.request_completion(milestone_id, request).await?)
    }

    async fn respond_to_completion(
        &self,
        milestone_id: MilestoneId,
        request: &CompletionResponseRequest,
    ) -> ClientApiResult<()> {
        Ok(self.respond_to_completion(milestone_id, request).await?)
    }

    async fn set_completion_status(
        &self,
        milestone_id: MilestoneId,
        request: &CompletionStatusUpdate,
    ) -> ClientApiResult<()> {
        Ok(self.set_completion_status(milestone_id, request).await?)
    }

    async fn post_progress(
        &self,
        milestone_id: MilestoneId,
        request: &ProgressUpdateRequest,
    ) -> ClientApiResult<()> {
        Ok(self.post_progress(milestone_id, request).await?)
    }

    async fn mark_messages_read(&self, milestone_id: MilestoneId) -> ClientApiResult<()> {
        Ok(self.mark_messages_read(milestone_id).await?)
    }

    async fn list_acceptances(
        &self,
        milestone_id: MilestoneId,
    ) -> ClientApiResult<Vec<AcceptanceRecord>> {
        Ok(self.list_acceptances(milestone_id).await?)
    }

    async fn create_acceptance(
        &self,
        request: &CreateAcceptanceRequest,
    ) -> ClientApiResult<CreatedResource> {
        Ok(self.create_acceptance(request).await?)
    }

    async fn list_defects(&self, milestone_id: MilestoneId) -> ClientApiResult<Vec<Defect>> {
        Ok(self.list_defects(milestone_id).await?)
    }

    async fn create_defect(&self, request: &CreateDefectRequest) -> ClientApiResult<Defect> {
        Ok(self.create_defect(request).await?)
    }

    async fn update_defect(
        &self,
        defect_id: DefectId,
        request: &DefectResolutionUpdate,
    ) -> ClientApiResult<()> {
        Ok(self.update_defect(defect_id, request).await?)
    }

    async fn submit_resolution(
        &self,
        acceptance_id: AcceptanceId,
        request: &SubmitResolutionRequest,
    ) -> ClientApiResult<()> {
        Ok(self.submit_resolution(acceptance_id, request).await?)
    }

    async fn final_acceptance(
        &self,
        acceptance_id: AcceptanceId,
        request: &FinalAcceptanceRequest,
    ) -> ClientApiResult<()> {
        Ok(self.final_acceptance(acceptance_id, request).await?)
    }

    async fn schedule_appointment(&self, request: &AppointmentRequest) -> ClientApiResult<()> {
        Ok(self.schedule_appointment(request).await?)
    }

    async fn create_notification(&self, request: &NotificationRequest) -> ClientApiResult<()> {
        Ok(self.create_notification(request).await?)
    }

    async fn create_task(&self, request: &TaskRequest) -> ClientApiResult<CreatedResource> {
        Ok(self.create_task(request).await?)
    }
}
