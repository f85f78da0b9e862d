//! Main REST API client implementation

use std::time::Duration;

use bw_rest_api_contract::*;
use reqwest::{Client as HttpClient, Method, Response};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::auth::AuthConfig;
use crate::error::{RestClientError, RestClientResult};

const USER_AGENT: &str = concat!("bw-rest-client/", env!("CARGO_PKG_VERSION"));

/// REST API client for the BuildWise backend
#[derive(Debug, Clone)]
pub struct RestClient {
    http_client: HttpClient,
    base_url: Url,
    auth: AuthConfig,
}

impl RestClient {
    /// Create a new REST client
    pub fn new(base_url: Url, auth: AuthConfig) -> RestClientResult<Self> {
        Self::build(base_url, auth, None)
    }

    /// Create a new REST client whose requests give up after `timeout`
    pub fn with_timeout(base_url: Url, auth: AuthConfig, timeout: Duration) -> RestClientResult<Self> {
        Self::build(base_url, auth, Some(timeout))
    }

    /// Create a client from a base URL string
    pub fn from_url(base_url: &str, auth: AuthConfig) -> RestClientResult<Self> {
        let base_url = Url::parse(base_url)?;
        Self::new(base_url, auth)
    }

    fn build(mut base_url: Url, auth: AuthConfig, timeout: Option<Duration>) -> RestClientResult<Self> {
        // Url::join replaces the last segment unless the base ends in '/'
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let mut builder = HttpClient::builder().user_agent(USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http_client: builder.build()?,
            base_url,
            auth,
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Get the authentication config
    pub fn auth(&self) -> &AuthConfig {
        &self.auth
    }

    /// Fetch a trade with its current completion status
    pub async fn get_milestone(&self, milestone_id: MilestoneId) -> RestClientResult<MilestoneSummary> {
        self.get(&format!("milestones/{}", milestone_id)).await
    }

    /// Service provider reports the trade as finished
    pub async fn request_completion(
        &self,
        milestone_id: MilestoneId,
        request: &CompletionRequest,
    ) -> RestClientResult<()> {
        self.post_discard(&format!("milestones/{}/progress/completion", milestone_id), request)
            .await
    }

    /// Project owner accepts or rejects a completion request
    pub async fn respond_to_completion(
        &self,
        milestone_id: MilestoneId,
        request: &CompletionResponseRequest,
    ) -> RestClientResult<()> {
        self.post_discard(
            &format!("milestones/{}/progress/completion/response", milestone_id),
            request,
        )
        .await
    }

    /// Overwrite the completion status (used after documenting defects)
    pub async fn set_completion_status(
        &self,
        milestone_id: MilestoneId,
        request: &CompletionStatusUpdate,
    ) -> RestClientResult<()> {
        let path = format!("milestones/{}/progress/completion", milestone_id);
        self.send_discard(Method::PUT, &path, Some(request)).await
    }

    /// Post a progress update
    pub async fn post_progress(
        &self,
        milestone_id: MilestoneId,
        request: &ProgressUpdateRequest,
    ) -> RestClientResult<()> {
        validate_request(request)?;
        self.post_discard(&format!("milestones/{}/progress/", milestone_id), request)
            .await
    }

    /// Mark the trade's messages as read for the current user
    pub async fn mark_messages_read(&self, milestone_id: MilestoneId) -> RestClientResult<()> {
        let path = format!("milestones/{}/mark-messages-read", milestone_id);
        self.send_discard(Method::POST, &path, None::<&()>).await
    }

    /// List acceptance records, oldest first
    pub async fn list_acceptances(
        &self,
        milestone_id: MilestoneId,
    ) -> RestClientResult<Vec<AcceptanceRecord>> {
        self.get(&format!("acceptance/milestone/{}", milestone_id)).await
    }

    /// Open a new acceptance record
    pub async fn create_acceptance(
        &self,
        request: &CreateAcceptanceRequest,
    ) -> RestClientResult<CreatedResource> {
        self.post("acceptance", request).await
    }

    /// List the defect ledger of the trade's current acceptance cycle
    pub async fn list_defects(&self, milestone_id: MilestoneId) -> RestClientResult<Vec<Defect>> {
        self.get(&format!("acceptance/milestone/{}/defects", milestone_id))
            .await
    }

    /// Document a single defect
    pub async fn create_defect(&self, request: &CreateDefectRequest) -> RestClientResult<Defect> {
        validate_request(request)?;
        self.post("acceptance/defects", request).await
    }

    /// Persist one defect's resolution
    pub async fn update_defect(
        &self,
        defect_id: DefectId,
        request: &DefectResolutionUpdate,
    ) -> RestClientResult<()> {
        let path = format!("acceptance/defects/{}", defect_id);
        self.send_discard(Method::PUT, &path, Some(request)).await
    }

    /// Report that documented defects were dealt with
    pub async fn submit_resolution(
        &self,
        acceptance_id: AcceptanceId,
        request: &SubmitResolutionRequest,
    ) -> RestClientResult<()> {
        self.post_discard(
            &format!("acceptance/{}/defects/submit-resolution", acceptance_id),
            request,
        )
        .await
    }

    /// Project owner's terminal sign-off
    pub async fn final_acceptance(
        &self,
        acceptance_id: AcceptanceId,
        request: &FinalAcceptanceRequest,
    ) -> RestClientResult<()> {
        validate_request(request)?;
        self.post_discard(&format!("acceptance/{}/final-complete", acceptance_id), request)
            .await
    }

    /// Propose an on-site acceptance appointment
    pub async fn schedule_appointment(&self, request: &AppointmentRequest) -> RestClientResult<()> {
        validate_request(request)?;
        self.post_discard("appointments/schedule", request).await
    }

    /// Notify the counterparty
    pub async fn create_notification(&self, request: &NotificationRequest) -> RestClientResult<()> {
        validate_request(request)?;
        self.post_discard("notifications", request).await
    }

    /// Create a Kanban tracking task
    pub async fn create_task(&self, request: &TaskRequest) -> RestClientResult<CreatedResource> {
        validate_request(request)?;
        self.post("tasks", request).await
    }

    // Private helper methods

    fn endpoint(&self, path: &str) -> RestClientResult<Url> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> RestClientResult<T> {
        self.request(Method::GET, path, None::<&()>).await
    }

    async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> RestClientResult<T> {
        self.request(Method::POST, path, Some(body)).await
    }

    async fn post_discard<B: Serialize>(&self, path: &str, body: &B) -> RestClientResult<()> {
        self.send_discard(Method::POST, path, Some(body)).await
    }

    async fn send_discard<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> RestClientResult<()> {
        let _: IgnoredAny = self.request(method, path, body).await?;
        Ok(())
    }

    async fn request<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> RestClientResult<T> {
        let url = self.endpoint(path)?;
        debug!(%method, %url, "sending request");

        let auth_headers = self.auth.headers().map_err(|e| RestClientError::Auth(e.to_string()))?;
        let mut request = self.http_client.request(method, url).headers(auth_headers);

        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        self.handle_response(response).await
    }

    async fn handle_response<T: DeserializeOwned>(&self, response: Response) -> RestClientResult<T> {
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            // 204 and empty 200 bodies still have to satisfy `()` / IgnoredAny
            let body = if text.trim().is_empty() { "null" } else { text.as_str() };
            serde_json::from_str(body).map_err(RestClientError::from)
        } else {
            debug!(%status, "request failed");
            match serde_json::from_str::<ProblemDetails>(&text) {
                Ok(problem) => Err(RestClientError::ServerError {
                    status,
                    details: problem,
                }),
                Err(_) => Err(RestClientError::UnexpectedResponse { status, body: text }),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation_normalizes_base_path() {
        let client = RestClient::from_url("http://localhost:8000/api/v1", AuthConfig::default()).unwrap();
        assert_eq!(client.base_url().as_str(), "http://localhost:8000/api/v1/");

        let url = client.endpoint("milestones/7/progress/completion").unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8000/api/v1/milestones/7/progress/completion"
        );
    }

    #[test]
    fn test_leading_slash_stays_under_base_path() {
        let client = RestClient::from_url("http://localhost:8000/api/v1/", AuthConfig::default()).unwrap();
        let url = client.endpoint("/acceptance/defects/4").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/api/v1/acceptance/defects/4");
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            RestClient::from_url("not a url", AuthConfig::default()),
            Err(RestClientError::Url(_))
        ));
    }
}
