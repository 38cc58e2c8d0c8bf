use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlanId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuildId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(pub u64);

impl fmt::Display for PlanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for BuildId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outcome of a case or step, serialized with the service's single-letter codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionStatus {
    #[serde(rename = "p")]
    Passed,
    #[serde(rename = "f")]
    Failed,
}

impl ExecutionStatus {
    pub fn from_passed(passed: bool) -> Self {
        if passed {
            Self::Passed
        } else {
            Self::Failed
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ExecutionStatus::Passed => "p",
            ExecutionStatus::Failed => "f",
        }
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionStatus::Passed => write!(f, "passed"),
            ExecutionStatus::Failed => write!(f, "failed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub prefix: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildRequest {
    pub plan_id: PlanId,
    pub name: String,
    pub notes: String,
    pub active: bool,
    pub open: bool,
}

impl BuildRequest {
    pub fn new(plan_id: PlanId, name: impl Into<String>) -> Self {
        Self {
            plan_id,
            name: name.into(),
            notes: String::new(),
            active: true,
            open: true,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddCaseRequest {
    pub project_id: ProjectId,
    pub plan_id: PlanId,
    pub case_external_id: String,
    pub version: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepResult {
    pub step_number: u32,
    pub status: ExecutionStatus,
    pub notes: String,
}

/// One reportable outcome for a single external case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseResult {
    pub case_external_id: String,
    pub plan_id: PlanId,
    pub build_id: BuildId,
    pub status: ExecutionStatus,
    pub duration_minutes: f64,
    pub notes: String,
    pub steps: Vec<StepResult>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ExecutionStatus::from_passed(true), ExecutionStatus::Passed);
        assert_eq!(ExecutionStatus::from_passed(false), ExecutionStatus::Failed);
        assert_eq!(ExecutionStatus::Passed.code(), "p");
        assert_eq!(ExecutionStatus::Failed.code(), "f");
        assert_eq!(
            serde_json::to_string(&ExecutionStatus::Failed).unwrap(),
            "\"f\""
        );
    }

    #[test]
    fn test_build_request_builder() {
        let request = BuildRequest::new(PlanId(7), "nightly").with_notes("automated");
        assert_eq!(request.plan_id, PlanId(7));
        assert_eq!(request.name, "nightly");
        assert_eq!(request.notes, "automated");
        assert!(request.active);
        assert!(request.open);
    }

    #[test]
    fn test_project_deserializes_without_name() {
        let project: Project = serde_json::from_str(r#"{"id": 3, "prefix": "XPJ"}"#).unwrap();
        assert_eq!(project.id, ProjectId(3));
        assert_eq!(project.prefix, "XPJ");
        assert!(project.name.is_empty());
    }
}
