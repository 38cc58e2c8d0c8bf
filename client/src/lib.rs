pub mod client;
pub mod config;
pub mod dry_run;
pub mod types;

pub use client::{ClientError, ClientResult, ReportingClient};
pub use config::{ConnectionSettings, Endpoint};
pub use dry_run::DryRunClient;
pub use types::{
    AddCaseRequest, BuildId, BuildRequest, CaseResult, ExecutionStatus, PlanId, Project,
    ProjectId, StepResult,
};

pub mod prelude {
    pub use crate::client::*;
    pub use crate::config::*;
    pub use crate::dry_run::*;
    pub use crate::types::*;
}
