use crate::events::{SuiteOutcome, TestError, TestOutcome};
use client::{BuildId, CaseResult, ExecutionStatus, PlanId, StepResult};

const MILLIS_PER_MINUTE: f64 = 60_000.0;

pub fn ms_to_minutes(duration_ms: u64) -> f64 {
    duration_ms as f64 / MILLIS_PER_MINUTE
}

/// A result built from runner data, not yet bound to a plan and build.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRecord {
    pub case_external_id: String,
    pub status: ExecutionStatus,
    pub duration_minutes: f64,
    pub notes: String,
    pub steps: Vec<StepResult>,
}

impl ResultRecord {
    /// Aggregate a finished suite: it fails if any test did not pass, and each
    /// test becomes a numbered step.
    pub fn from_suite(case_external_id: impl Into<String>, suite: &SuiteOutcome) -> Self {
        let passed = suite.tests.iter().all(TestOutcome::is_passed);
        let duration_ms = suite
            .tests
            .iter()
            .map(|t| t.duration_ms)
            .fold(0u64, u64::saturating_add);

        let steps = suite
            .tests
            .iter()
            .zip(1u32..)
            .map(|(test, step_number)| StepResult {
                step_number,
                status: ExecutionStatus::from_passed(test.is_passed()),
                notes: if test.is_passed() {
                    String::new()
                } else {
                    test.error
                        .as_ref()
                        .map(|e| e.trace().to_string())
                        .unwrap_or_default()
                },
            })
            .collect();

        Self {
            case_external_id: case_external_id.into(),
            status: ExecutionStatus::from_passed(passed),
            duration_minutes: ms_to_minutes(duration_ms),
            notes: String::new(),
            steps,
        }
    }

    pub fn from_test(
        case_external_id: impl Into<String>,
        duration_ms: u64,
        error: Option<&TestError>,
    ) -> Self {
        Self {
            case_external_id: case_external_id.into(),
            status: ExecutionStatus::from_passed(error.is_none()),
            duration_minutes: ms_to_minutes(duration_ms),
            notes: error.map(|e| e.trace().to_string()).unwrap_or_default(),
            steps: Vec::new(),
        }
    }

    pub fn for_build(self, plan_id: PlanId, build_id: BuildId) -> CaseResult {
        CaseResult {
            case_external_id: self.case_external_id,
            plan_id,
            build_id,
            status: self.status,
            duration_minutes: self.duration_minutes,
            notes: self.notes,
            steps: self.steps,
        }
    }
}
