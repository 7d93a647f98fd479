use reqwest::Client;
use tracing::debug;

use crate::{config::LogStorageConfig, errors::ManagerError};

/// Client for the append-only log storage service.
#[derive(Clone)]
pub struct LogStorageClient {
    client: Client,
    base_url: String,
}

impl LogStorageClient {
    pub fn new(config: &LogStorageConfig) -> Result<Self, ManagerError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ManagerError::Config(e.to_string()))?;
        Ok(Self {
            client,
            base_url: config.url.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn fetch_log(&self) -> Result<String, ManagerError> {
        let url = format!("{}/log", self.base_url);
        debug!("Fetching log from {}", url);
        let resp = self.client.get(&url).send().await.map_err(collaborator)?;
        if !resp.status().is_success() {
            return Err(ManagerError::Collaborator(format!(
                "log storage returned {}",
                resp.status()
            )));
        }
        resp.text().await.map_err(collaborator)
    }

    pub async fn reset(&self) -> Result<(), ManagerError> {
        let url = format!("{}/reset", self.base_url);
        let resp = self.client.post(&url).send().await.map_err(collaborator)?;
        if !resp.status().is_success() {
            return Err(ManagerError::Collaborator(format!(
                "log storage reset returned {}",
                resp.status()
            )));
        }
        Ok(())
    }
}

fn collaborator(e: reqwest::Error) -> ManagerError {
    ManagerError::Collaborator(format!("Error contacting storage: {}", e))
}
