//! The result publisher.
//!
//! Handlers registered on the event source never wait on the network: they
//! turn each notification into tasks on the [`SubmissionQueue`] and return.
//! Queued tasks read the [`RunContext`] when they run, which is after every
//! earlier task (including provisioning) has settled.

use crate::case_id::extract_case_ids;
use crate::config::{ProvisioningMode, PublisherConfig};
use crate::error::{PublisherError, PublisherResult};
use crate::events::{EventKind, EventSource, RunEvent, SuiteOutcome, TestError, TestOutcome};
use crate::queue::SubmissionQueue;
use crate::record::ResultRecord;
use chrono::Utc;
use client::{
    AddCaseRequest, BuildId, BuildRequest, ClientResult, ConnectionSettings, PlanId, Project,
    ReportingClient,
};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info, warn};

/// Version of a case added to an auto-provisioned plan.
const CASE_VERSION: u32 = 1;

/// State accumulated over one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunContext {
    pub plan_id: Option<PlanId>,
    pub build_id: Option<BuildId>,
    /// Only set when the plan was auto-provisioned.
    pub project: Option<Project>,
}

impl RunContext {
    fn active_build(&self) -> Option<(PlanId, BuildId)> {
        Some((self.plan_id?, self.build_id?))
    }
}

struct Shared {
    client: Arc<dyn ReportingClient>,
    mode: ProvisioningMode,
    context: RwLock<RunContext>,
    queue: SubmissionQueue,
}

pub struct ResultPublisher {
    shared: Arc<Shared>,
}

impl ResultPublisher {
    /// Validate `config`, connect a reporting client through `connect`, kick
    /// off a credential check and subscribe to `source`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new<S, C, F>(
        source: &mut S,
        config: &PublisherConfig,
        connect: F,
    ) -> PublisherResult<Self>
    where
        S: EventSource + ?Sized,
        C: ReportingClient + 'static,
        F: FnOnce(ConnectionSettings) -> ClientResult<C>,
    {
        let mode = config.validate()?;
        let settings = config.connection_settings()?;
        let queue = SubmissionQueue::start()?;

        info!(
            "Publishing results to {} ({:?})",
            settings.endpoint.url(),
            mode
        );
        let client: Arc<dyn ReportingClient> = Arc::new(connect(settings)?);

        let checker = client.clone();
        tokio::spawn(async move {
            match checker.check_credentials().await {
                Ok(()) => debug!("Credentials accepted by {}", checker.client_name()),
                Err(e) => warn!("Credential check failed: {}", e),
            }
        });

        let publisher = Self {
            shared: Arc::new(Shared {
                client,
                mode,
                context: RwLock::new(RunContext::default()),
                queue,
            }),
        };
        publisher.subscribe(source);

        Ok(publisher)
    }

    fn subscribe<S: EventSource + ?Sized>(&self, source: &mut S) {
        for kind in [
            EventKind::RunBegin,
            EventKind::SuiteEnd,
            EventKind::TestPass,
            EventKind::TestFail,
        ] {
            let shared = self.shared.clone();
            source.on(kind, Box::new(move |event: &RunEvent| shared.handle(event)));
        }
    }

    pub fn mode(&self) -> &ProvisioningMode {
        &self.shared.mode
    }

    pub fn client_name(&self) -> &'static str {
        self.shared.client.client_name()
    }

    pub fn context(&self) -> RunContext {
        self.shared.context()
    }

    /// Wait for every submission enqueued so far to settle.
    pub async fn flush(&self) {
        self.shared.queue.flush().await;
    }
}

impl Shared {
    fn context(&self) -> RunContext {
        self.context
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn update_context(&self, update: impl FnOnce(&mut RunContext)) {
        let mut context = self.context.write().unwrap_or_else(PoisonError::into_inner);
        update(&mut context);
    }

    fn handle(self: &Arc<Self>, event: &RunEvent) {
        match event {
            RunEvent::RunBegin => self.begin_run(),
            RunEvent::SuiteEnd(suite) => self.suite_finished(suite),
            RunEvent::TestPass(test) => self.test_finished(test, None),
            RunEvent::TestFail(test) => {
                let error = test
                    .error
                    .clone()
                    .unwrap_or_else(|| TestError::new(format!("{} failed", test.title)));
                self.test_finished(test, Some(&error));
            }
        }
    }

    fn begin_run(self: &Arc<Self>) {
        match &self.mode {
            ProvisioningMode::Existing { plan_id, build_id } => {
                info!("Using existing plan {} and build {}", plan_id, build_id);
                let (plan_id, build_id) = (*plan_id, *build_id);
                self.update_context(|context| {
                    *context = RunContext {
                        plan_id: Some(plan_id),
                        build_id: Some(build_id),
                        project: None,
                    }
                });
            }
            ProvisioningMode::Auto { prefix } => {
                self.update_context(|context| *context = RunContext::default());
                self.queue.enqueue(
                    format!("provisioning for prefix {}", prefix),
                    provision(self.clone(), prefix.clone()),
                );
            }
        }
    }

    fn suite_finished(self: &Arc<Self>, suite: &SuiteOutcome) {
        for case_id in extract_case_ids(&suite.title) {
            let record = ResultRecord::from_suite(case_id, suite);
            self.publish(record);
        }
    }

    fn test_finished(self: &Arc<Self>, test: &TestOutcome, error: Option<&TestError>) {
        for case_id in extract_case_ids(&test.title) {
            let record = ResultRecord::from_test(case_id, test.duration_ms, error);
            self.publish(record);
        }
    }

    fn publish(self: &Arc<Self>, record: ResultRecord) {
        let case_id = record.case_external_id.clone();

        if self.mode.is_auto() {
            self.queue.enqueue(
                format!("adding {} to plan", case_id),
                add_case(self.clone(), case_id.clone()),
            );
        }

        self.queue.enqueue(
            format!("reporting {} as {}", case_id, record.status),
            submit(self.clone(), record),
        );
    }
}

async fn provision(shared: Arc<Shared>, prefix: String) -> PublisherResult<()> {
    let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S").to_string();

    let plan_name = format!("{} automated test plan {}", prefix, timestamp);
    let plan_id = shared.client.create_plan(&plan_name, &prefix).await?;
    debug!("Created plan {} ('{}')", plan_id, plan_name);

    let build = BuildRequest::new(plan_id, format!("Automated build {}", timestamp))
        .with_notes("Created automatically for a test run");
    let build_id = shared.client.create_build(build).await?;
    debug!("Created build {} under plan {}", build_id, plan_id);

    shared.update_context(|context| {
        context.plan_id = Some(plan_id);
        context.build_id = Some(build_id);
    });

    let project = shared
        .client
        .list_projects()
        .await?
        .into_iter()
        .find(|project| project.prefix == prefix)
        .ok_or(PublisherError::ProjectNotFound { prefix })?;

    info!(
        "Provisioned plan {} and build {} in project {}",
        plan_id, build_id, project.id
    );
    shared.update_context(|context| context.project = Some(project));

    Ok(())
}

async fn add_case(shared: Arc<Shared>, case_external_id: String) -> PublisherResult<()> {
    let context = shared.context();
    let Some(plan_id) = context.plan_id else {
        return Err(PublisherError::NotProvisioned);
    };
    // Provisioning already reported the missing project; results still go out.
    let Some(project) = context.project else {
        debug!("No project resolved; not adding {} to plan {}", case_external_id, plan_id);
        return Ok(());
    };

    let request = AddCaseRequest {
        project_id: project.id,
        plan_id,
        case_external_id,
        version: CASE_VERSION,
    };
    shared.client.add_case_to_plan(request).await?;
    Ok(())
}

async fn submit(shared: Arc<Shared>, record: ResultRecord) -> PublisherResult<()> {
    let Some((plan_id, build_id)) = shared.context().active_build() else {
        return Err(PublisherError::NotProvisioned);
    };

    shared
        .client
        .report_case_result(record.for_build(plan_id, build_id))
        .await?;
    Ok(())
}
