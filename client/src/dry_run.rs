//! A reporting client that talks to nothing.
//!
//! Every verb is logged and answered locally, so a run can be rehearsed
//! against a configuration without touching the real service.

use crate::client::{ClientError, ClientResult, ReportingClient};
use crate::config::ConnectionSettings;
use crate::types::{AddCaseRequest, BuildId, BuildRequest, CaseResult, PlanId, Project, ProjectId};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

pub struct DryRunClient {
    settings: ConnectionSettings,
    projects: Vec<Project>,
    next_id: AtomicU64,
    plans: Mutex<HashSet<PlanId>>,
}

impl DryRunClient {
    pub fn new(settings: ConnectionSettings) -> ClientResult<Self> {
        settings
            .validate()
            .map_err(|message| ClientError::InvalidConfig { message })?;

        Ok(Self {
            settings,
            projects: Vec::new(),
            next_id: AtomicU64::new(1),
            plans: Mutex::new(HashSet::new()),
        })
    }

    pub fn with_projects(mut self, projects: Vec<Project>) -> Self {
        self.projects = projects;
        self
    }

    /// Convenience for seeding a single project keyed by its prefix.
    pub fn with_project(self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        let project = Project {
            id: ProjectId(1),
            name: prefix.clone(),
            prefix,
        };
        self.with_projects(vec![project])
    }

    pub fn settings(&self) -> &ConnectionSettings {
        &self.settings
    }

    fn allocate_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    fn plans(&self) -> MutexGuard<'_, HashSet<PlanId>> {
        self.plans.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl ReportingClient for DryRunClient {
    async fn check_credentials(&self) -> ClientResult<()> {
        info!(
            "[dry-run] checkDevKey against {}",
            self.settings.endpoint.url()
        );
        Ok(())
    }

    async fn create_plan(&self, name: &str, prefix: &str) -> ClientResult<PlanId> {
        let id = PlanId(self.allocate_id());
        self.plans().insert(id);
        info!("[dry-run] createTestPlan '{}' ({}) -> {}", name, prefix, id);
        Ok(id)
    }

    async fn create_build(&self, request: BuildRequest) -> ClientResult<BuildId> {
        // Builds can only go under plans this client created.
        if !self.plans().contains(&request.plan_id) {
            return Err(ClientError::NotFound {
                what: format!("plan {}", request.plan_id),
            });
        }
        let id = BuildId(self.allocate_id());
        info!(
            "[dry-run] createBuild '{}' under plan {} -> {}",
            request.name, request.plan_id, id
        );
        Ok(id)
    }

    async fn list_projects(&self) -> ClientResult<Vec<Project>> {
        debug!("[dry-run] getProjects -> {} projects", self.projects.len());
        Ok(self.projects.clone())
    }

    async fn add_case_to_plan(&self, request: AddCaseRequest) -> ClientResult<()> {
        if !self.projects.iter().any(|p| p.id == request.project_id) {
            return Err(ClientError::NotFound {
                what: format!("project {}", request.project_id),
            });
        }
        info!(
            "[dry-run] addTestCaseToTestPlan {} -> plan {} (project {}, version {})",
            request.case_external_id, request.plan_id, request.project_id, request.version
        );
        Ok(())
    }

    async fn report_case_result(&self, result: CaseResult) -> ClientResult<()> {
        info!(
            "[dry-run] reportTCResult {} {} plan={} build={} duration={:.4}min steps={}",
            result.case_external_id,
            result.status,
            result.plan_id,
            result.build_id,
            result.duration_minutes,
            result.steps.len()
        );
        if !result.notes.is_empty() {
            debug!("[dry-run] notes for {}: {}", result.case_external_id, result.notes);
        }
        debug!("[dry-run] payload: {}", serde_json::to_string(&result)?);
        Ok(())
    }

    fn client_name(&self) -> &'static str {
        "dry-run"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> ConnectionSettings {
        ConnectionSettings::from_url("https://testlink.example.com/api", "key").unwrap()
    }

    #[test]
    fn test_rejects_invalid_settings() {
        let mut bad = settings();
        bad.api_key = String::new();
        assert!(matches!(
            DryRunClient::new(bad),
            Err(ClientError::InvalidConfig { .. })
        ));
    }

    #[tokio::test]
    async fn test_ids_are_sequential() {
        let client = DryRunClient::new(settings()).unwrap();
        let plan = client.create_plan("plan", "XPJ").await.unwrap();
        let build = client
            .create_build(BuildRequest::new(plan, "build"))
            .await
            .unwrap();
        assert_eq!(plan, PlanId(1));
        assert_eq!(build, BuildId(2));
        assert_eq!(client.client_name(), "dry-run");
    }

    #[tokio::test]
    async fn test_build_under_unknown_plan_not_found() {
        let client = DryRunClient::new(settings()).unwrap();
        let err = client
            .create_build(BuildRequest::new(PlanId(42), "build"))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::NotFound { .. }));
        assert_eq!(err.to_string(), "Not found: plan 42");
    }

    #[tokio::test]
    async fn test_add_case_requires_known_project() {
        let client = DryRunClient::new(settings()).unwrap().with_project("XPJ");
        let plan = client.create_plan("plan", "XPJ").await.unwrap();
        let request = |project_id| AddCaseRequest {
            project_id,
            plan_id: plan,
            case_external_id: "XPJ-1".to_string(),
            version: 1,
        };

        client.add_case_to_plan(request(ProjectId(1))).await.unwrap();
        assert!(matches!(
            client.add_case_to_plan(request(ProjectId(7))).await,
            Err(ClientError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_seeded_projects() {
        let client = DryRunClient::new(settings()).unwrap().with_project("XPJ");
        let projects = client.list_projects().await.unwrap();
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].prefix, "XPJ");

        let empty = DryRunClient::new(settings()).unwrap();
        assert!(empty.list_projects().await.unwrap().is_empty());
    }
}
