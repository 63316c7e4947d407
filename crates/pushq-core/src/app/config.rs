//! CloudTasksConfig - 配送先の設定
//!
//! プロセス全体の static 設定の代わりに、明示的に組み立てて
//! mapper に渡す値オブジェクトです。同一プロセス内で複数の設定を
//! 併用できます（テストの分離もこれで容易になります）。

use std::env;

use serde::{Deserialize, Serialize};

use crate::domain::{ConfigError, LocationName};
use crate::ports::ProjectIdSource;

pub const ENV_PROJECT_ID: &str = "PUSHQ_PROJECT_ID";
pub const ENV_LOCATION_ID: &str = "PUSHQ_LOCATION_ID";
pub const ENV_HTTP_TARGET: &str = "PUSHQ_HTTP_TARGET";
pub const ENV_ENSURE_QUEUES: &str = "PUSHQ_ENSURE_QUEUES";

/// Where and how tasks are submitted.
///
/// # Example
/// ```ignore
/// let config = CloudTasksConfig::new()
///     .project_id("my-project")
///     .location_id("europe-west2")
///     .ensure_queues(true);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CloudTasksConfig {
    /// Inferred from ambient credentials when absent.
    pub project_id: Option<String>,

    pub location_id: Option<String>,

    /// Base URL for plain HTTP tasks. When set, tasks target
    /// `http_target + task.url()` instead of the App Engine app.
    pub http_target: Option<String>,

    /// Check (and create if missing) each queue once before its first task.
    pub ensure_queues: bool,
}

impl CloudTasksConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn project_id(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    pub fn location_id(mut self, location_id: impl Into<String>) -> Self {
        self.location_id = Some(location_id.into());
        self
    }

    pub fn http_target(mut self, http_target: impl Into<String>) -> Self {
        self.http_target = Some(http_target.into());
        self
    }

    pub fn ensure_queues(mut self, ensure: bool) -> Self {
        self.ensure_queues = ensure;
        self
    }

    /// Read `PUSHQ_*` variables from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as `from_env` with an injectable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let ensure_queues = match non_empty(ENV_ENSURE_QUEUES) {
            None => false,
            Some(raw) => parse_bool(&raw).ok_or_else(|| ConfigError::InvalidEnv {
                key: ENV_ENSURE_QUEUES.to_string(),
                value: raw.clone(),
            })?,
        };

        Ok(Self {
            project_id: non_empty(ENV_PROJECT_ID),
            location_id: non_empty(ENV_LOCATION_ID),
            http_target: non_empty(ENV_HTTP_TARGET),
            ensure_queues,
        })
    }

    /// Fill in the project from `credentials` if needed and check that
    /// project and location are known.
    pub fn resolve(
        &self,
        credentials: &dyn ProjectIdSource,
    ) -> Result<ResolvedConfig, ConfigError> {
        let project_id = self
            .project_id
            .clone()
            .filter(|p| !p.is_empty())
            .or_else(|| credentials.project_id())
            .ok_or(ConfigError::MissingProjectId)?;
        let location_id = self
            .location_id
            .clone()
            .filter(|l| !l.is_empty())
            .ok_or(ConfigError::MissingLocationId)?;
        let http_target = self.http_target.clone().filter(|t| !t.is_empty());

        Ok(ResolvedConfig {
            location: LocationName::new(&project_id, &location_id),
            project_id,
            location_id,
            http_target,
            ensure_queues: self.ensure_queues,
        })
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Configuration with project and location known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub project_id: String,
    pub location_id: String,
    pub location: LocationName,
    pub http_target: Option<String>,
    pub ensure_queues: bool,
}
