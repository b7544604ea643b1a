use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{BackupError, Result};

pub const ENDPOINT_ENV: &str = "BACKUP_AGENT_ENDPOINT";
pub const TOKEN_ENV: &str = "BACKUP_AGENT_TOKEN";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Base URL of the config agent, e.g. `http://agent.db.svc:3202`
    pub agent_endpoint: String,

    /// Bearer token sent with every agent request
    pub auth_token: Option<String>,

    /// Deadline for a single remote call
    pub request_timeout_secs: u64,

    /// Delay between status polls while a backup is running
    pub poll_interval_secs: u64,

    /// Delete the remote operation once its terminal state was recorded
    pub delete_operation_on_completion: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            agent_endpoint: String::new(),
            auth_token: None,
            request_timeout_secs: 30,
            poll_interval_secs: 15,
            delete_operation_on_completion: true,
        }
    }
}

impl EngineConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            BackupError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| BackupError::Config(e.to_string()))
    }

    /// Applies environment overrides on top of the current values.
    pub fn merge_env(mut self) -> Self {
        if let Ok(endpoint) = std::env::var(ENDPOINT_ENV) {
            self.agent_endpoint = endpoint;
        }
        if let Ok(token) = std::env::var(TOKEN_ENV) {
            self.auth_token = Some(token);
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.agent_endpoint.is_empty() {
            return Err(BackupError::Config("agent_endpoint must be set".to_string()));
        }
        if !self.agent_endpoint.starts_with("http://") && !self.agent_endpoint.starts_with("https://")
        {
            return Err(BackupError::Config(format!(
                "agent_endpoint must be an http(s) URL, got {}",
                self.agent_endpoint
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(BackupError::Config(
                "request_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.poll_interval_secs == 0 {
            return Err(BackupError::Config(
                "poll_interval_secs must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}
