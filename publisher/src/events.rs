//! Run lifecycle notifications and the sources that emit them.
//!
//! A test runner is abstracted as an [`EventSource`]: anything handlers can be
//! registered against by [`EventKind`]. [`EventBus`] is the in-process
//! implementation; runners that only speak JSON can feed it deserialized
//! [`RunEvent`]s.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    RunBegin,
    SuiteEnd,
    TestPass,
    TestFail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestState {
    Passed,
    Failed,
    Pending,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestError {
    pub message: String,
    #[serde(default)]
    pub stack: Option<String>,
}

impl TestError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stack: None,
        }
    }

    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    /// Descriptive text for failure notes: the stack trace when one was
    /// captured, the message otherwise.
    pub fn trace(&self) -> &str {
        self.stack.as_deref().unwrap_or(&self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestOutcome {
    pub title: String,
    pub state: TestState,
    #[serde(default)]
    pub duration_ms: u64,
    #[serde(default)]
    pub error: Option<TestError>,
}

impl TestOutcome {
    pub fn passed(title: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            title: title.into(),
            state: TestState::Passed,
            duration_ms,
            error: None,
        }
    }

    pub fn failed(title: impl Into<String>, duration_ms: u64, error: TestError) -> Self {
        Self {
            title: title.into(),
            state: TestState::Failed,
            duration_ms,
            error: Some(error),
        }
    }

    pub fn is_passed(&self) -> bool {
        self.state == TestState::Passed
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteOutcome {
    pub title: String,
    #[serde(default)]
    pub tests: Vec<TestOutcome>,
}

impl SuiteOutcome {
    pub fn new(title: impl Into<String>, tests: Vec<TestOutcome>) -> Self {
        Self {
            title: title.into(),
            tests,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RunEvent {
    RunBegin,
    SuiteEnd(SuiteOutcome),
    TestPass(TestOutcome),
    TestFail(TestOutcome),
}

impl RunEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            RunEvent::RunBegin => EventKind::RunBegin,
            RunEvent::SuiteEnd(_) => EventKind::SuiteEnd,
            RunEvent::TestPass(_) => EventKind::TestPass,
            RunEvent::TestFail(_) => EventKind::TestFail,
        }
    }
}

pub type EventHandler = Box<dyn Fn(&RunEvent) + Send + Sync>;

pub trait EventSource {
    fn on(&mut self, kind: EventKind, handler: EventHandler);
}

#[derive(Default)]
pub struct EventBus {
    handlers: HashMap<EventKind, Vec<EventHandler>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dispatch an event to every handler registered for its kind, in
    /// registration order. Returns the number of handlers invoked.
    pub fn emit(&self, event: &RunEvent) -> usize {
        let Some(handlers) = self.handlers.get(&event.kind()) else {
            trace!("No handlers for {:?}", event.kind());
            return 0;
        };

        for handler in handlers {
            handler(event);
        }
        handlers.len()
    }

    pub fn handler_count(&self, kind: EventKind) -> usize {
        self.handlers.get(&kind).map_or(0, Vec::len)
    }
}

impl EventSource for EventBus {
    fn on(&mut self, kind: EventKind, handler: EventHandler) {
        self.handlers.entry(kind).or_default().push(handler);
    }
}
