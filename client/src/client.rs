use crate::types::{AddCaseRequest, BuildId, BuildRequest, CaseResult, PlanId, Project};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Authentication failed")]
    Authentication,

    #[error("Request rejected: {message}")]
    Rejected { message: String },

    #[error("Not found: {what}")]
    NotFound { what: String },

    #[error("Service unavailable: {message}")]
    ServiceUnavailable { message: String },
}

pub type ClientResult<T> = Result<T, ClientError>;

/// Verbs exposed by a test-management service. The wire representation is
/// left to each implementation.
#[async_trait]
pub trait ReportingClient: Send + Sync {
    async fn check_credentials(&self) -> ClientResult<()>;

    async fn create_plan(&self, name: &str, prefix: &str) -> ClientResult<PlanId>;

    async fn create_build(&self, request: BuildRequest) -> ClientResult<BuildId>;

    async fn list_projects(&self) -> ClientResult<Vec<Project>>;

    async fn add_case_to_plan(&self, request: AddCaseRequest) -> ClientResult<()>;

    async fn report_case_result(&self, result: CaseResult) -> ClientResult<()>;

    fn client_name(&self) -> &'static str;
}
