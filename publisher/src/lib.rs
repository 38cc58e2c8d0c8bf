pub mod case_id;
pub mod config;
pub mod error;
pub mod events;
pub mod publisher;
pub mod queue;
pub mod record;

pub use case_id::extract_case_ids;
pub use config::{ProvisioningMode, PublisherConfig};
pub use error::{PublisherError, PublisherResult};
pub use events::{
    EventBus, EventHandler, EventKind, EventSource, RunEvent, SuiteOutcome, TestError,
    TestOutcome, TestState,
};
pub use publisher::{ResultPublisher, RunContext};
pub use queue::SubmissionQueue;
pub use record::{ms_to_minutes, ResultRecord};
