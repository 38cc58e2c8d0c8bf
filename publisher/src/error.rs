use client::ClientError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PublisherError {
    #[error("Invalid configuration: {message}")]
    Config { message: String },

    #[error("No Tokio runtime available; the publisher must be created inside one")]
    NoRuntime,

    #[error("Reporting client error: {0}")]
    Client(#[from] ClientError),

    #[error("No project with prefix '{prefix}' found")]
    ProjectNotFound { prefix: String },

    #[error("Run context has no active plan/build; skipping submission")]
    NotProvisioned,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config file error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PublisherError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config { .. })
    }
}

pub type PublisherResult<T> = Result<T, PublisherError>;
