//! Publisher configuration.
//!
//! Options use the reporter-option names a test runner passes through
//! (`URL`, `apiKey`, `testplanid`, `buildid`, `prefix`), either as a
//! `key=value,key=value` string or as a TOML file.

use crate::error::{PublisherError, PublisherResult};
use client::{BuildId, ConnectionSettings, PlanId};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublisherConfig {
    #[serde(rename = "URL", alias = "url", default)]
    pub url: Option<String>,
    #[serde(rename = "apiKey", alias = "api_key", default)]
    pub api_key: Option<String>,
    #[serde(rename = "testplanid", default)]
    pub plan_id: Option<u64>,
    #[serde(rename = "buildid", default)]
    pub build_id: Option<u64>,
    #[serde(default)]
    pub prefix: Option<String>,
}

/// How the run obtains the plan and build its results are recorded against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisioningMode {
    /// Adopt a plan and build that already exist on the service.
    Existing { plan_id: PlanId, build_id: BuildId },
    /// Create a fresh plan and build under the project with this prefix.
    Auto { prefix: String },
}

impl ProvisioningMode {
    pub fn is_auto(&self) -> bool {
        matches!(self, Self::Auto { .. })
    }
}

impl PublisherConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_existing_plan(mut self, plan_id: u64, build_id: u64) -> Self {
        self.plan_id = Some(plan_id);
        self.build_id = Some(build_id);
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Parse a reporter option string such as
    /// `URL=https://tl.example.com/api,apiKey=abc,prefix=XPJ`.
    pub fn from_reporter_options(options: &str) -> PublisherResult<Self> {
        let mut config = Self::default();

        for pair in options.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').ok_or_else(|| {
                PublisherError::config(format!("Malformed reporter option '{}'", pair))
            })?;
            let value = value.trim().to_string();

            match key.trim() {
                "URL" | "url" => config.url = Some(value),
                "apiKey" | "api_key" => config.api_key = Some(value),
                "testplanid" => config.plan_id = Some(parse_id("testplanid", &value)?),
                "buildid" => config.build_id = Some(parse_id("buildid", &value)?),
                "prefix" => config.prefix = Some(value),
                other => warn!("Ignoring unknown reporter option '{}'", other),
            }
        }

        Ok(config)
    }

    pub fn from_toml_str(contents: &str) -> PublisherResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> PublisherResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Overlay every option set in `other` on top of this configuration.
    pub fn merge(mut self, other: PublisherConfig) -> Self {
        if other.url.is_some() {
            self.url = other.url;
        }
        if other.api_key.is_some() {
            self.api_key = other.api_key;
        }
        if other.plan_id.is_some() {
            self.plan_id = other.plan_id;
        }
        if other.build_id.is_some() {
            self.build_id = other.build_id;
        }
        if other.prefix.is_some() {
            self.prefix = other.prefix;
        }
        self
    }

    pub fn validate(&self) -> PublisherResult<ProvisioningMode> {
        if non_empty(&self.url).is_none() {
            return Err(PublisherError::config("URL is required"));
        }

        if non_empty(&self.api_key).is_none() {
            return Err(PublisherError::config("apiKey is required"));
        }

        match (self.plan_id, self.build_id, non_empty(&self.prefix)) {
            (Some(plan_id), Some(build_id), _) => Ok(ProvisioningMode::Existing {
                plan_id: PlanId(plan_id),
                build_id: BuildId(build_id),
            }),
            (_, _, Some(prefix)) => Ok(ProvisioningMode::Auto {
                prefix: prefix.to_string(),
            }),
            _ => Err(PublisherError::config(
                "Either both testplanid and buildid, or a prefix for auto-provisioning, must be provided",
            )),
        }
    }

    pub fn connection_settings(&self) -> PublisherResult<ConnectionSettings> {
        let url = non_empty(&self.url).ok_or_else(|| PublisherError::config("URL is required"))?;
        let api_key =
            non_empty(&self.api_key).ok_or_else(|| PublisherError::config("apiKey is required"))?;

        let settings = ConnectionSettings::from_url(url, api_key).map_err(PublisherError::config)?;
        settings.validate().map_err(PublisherError::config)?;
        Ok(settings)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_id(name: &str, value: &str) -> PublisherResult<u64> {
    value
        .parse()
        .map_err(|_| PublisherError::config(format!("{} must be a number, got '{}'", name, value)))
}
