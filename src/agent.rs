use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::{Client, Url};

use crate::types::{Operation, PhysicalBackupRequest};

/// Database-administration agent that runs backups on an instance.
#[mockall::automock]
#[async_trait]
pub trait ConfigAgentClient: Send + Sync {
    /// Starts a physical backup and returns the operation handle.
    async fn start_physical_backup(&self, request: &PhysicalBackupRequest) -> Result<String>;
    async fn delete_operation(&self, handle: &str) -> Result<()>;
}

/// Long-running operation lookup.
#[mockall::automock]
#[async_trait]
pub trait OperationStatusClient: Send + Sync {
    async fn get_operation(&self, handle: &str) -> Result<Operation>;
}

/// JSON over HTTP implementation of both agent-facing traits.
///
/// Requests carry no client-level timeout; per-call deadlines belong to the
/// engine.
pub struct HttpAgentClient {
    client: Client,
    endpoint: Url,
    auth_token: Option<String>,
}

impl HttpAgentClient {
    pub fn new(endpoint: &str, auth_token: Option<String>) -> Result<Self> {
        let endpoint = Url::parse(endpoint)?;
        if endpoint.cannot_be_a_base() {
            return Err(anyhow!("agent endpoint {} cannot be used as a base URL", endpoint));
        }
        Ok(Self {
            client: Client::new(),
            endpoint,
            auth_token,
        })
    }

    /// Appends path segments to the endpoint, percent-encoding each one.
    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("agent endpoint {} cannot be used as a base URL", self.endpoint))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub fn physical_backup_url(&self, instance: &str) -> Result<Url> {
        self.url(&["v1", "instances", &format!("{}:physicalBackup", instance)])
    }

    pub fn operation_url(&self, handle: &str) -> Result<Url> {
        // Handles may be full resource names such as "operations/abc".
        let operation_id = handle.rsplit('/').next().unwrap_or(handle);
        self.url(&["v1", "operations", operation_id])
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }
}

#[async_trait]
impl ConfigAgentClient for HttpAgentClient {
    async fn start_physical_backup(&self, request: &PhysicalBackupRequest) -> Result<String> {
        let url = self.physical_backup_url(&request.instance)?;

        let response = self
            .authorize(self.client.post(url))
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            return Err(anyhow!("physical backup request failed ({}): {}", status, error_text));
        }

        let operation: Operation = response.json().await?;
        if operation.name.is_empty() {
            return Err(anyhow!("No operation name returned from physical backup request"));
        }
        Ok(operation.name)
    }

    async fn delete_operation(&self, handle: &str) -> Result<()> {
        let response = self
            .authorize(self.client.delete(self.operation_url(handle)?))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow!("Failed to delete operation: {}", response.status()));
        }
        Ok(())
    }
}

#[async_trait]
impl OperationStatusClient for HttpAgentClient {
    async fn get_operation(&self, handle: &str) -> Result<Operation> {
        let response = self
            .authorize(self.client.get(self.operation_url(handle)?))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "Failed to get operation status: {}",
                response.status()
            ));
        }

        let mut operation: Operation = response.json().await?;
        if operation.name.is_empty() {
            operation.name = handle.to_string();
        }
        Ok(operation)
    }
}
