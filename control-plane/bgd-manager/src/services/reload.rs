//! Pushes the new upstream to an external reverse proxy after each toggle.

use bgd_state_storage::ActiveVersion;
use reqwest::Client;
use serde::Serialize;
use tokio::{sync::watch, task::JoinHandle};
use tracing::{info, warn};

use crate::{
    config::{ReloadConfig, SlotConfig},
    errors::ManagerError,
};

#[derive(Debug, Serialize)]
struct ReloadRequest<'a> {
    active: ActiveVersion,
    upstream: &'a str,
}

#[derive(Clone)]
pub struct ReloadNotifier {
    client: Client,
    url: String,
    slots: SlotConfig,
}

impl ReloadNotifier {
    pub fn new(config: &ReloadConfig, slots: SlotConfig) -> Result<Self, ManagerError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ManagerError::Config(e.to_string()))?;
        Ok(Self {
            client,
            url: config.url.clone(),
            slots,
        })
    }

    pub async fn notify(&self, active: ActiveVersion) -> Result<(), ManagerError> {
        let body = ReloadRequest {
            active,
            upstream: &self.slots.target(active).url,
        };
        let resp = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ManagerError::Collaborator(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(ManagerError::Collaborator(format!(
                "reverse proxy reload returned {}",
                resp.status()
            )));
        }
        info!(active = %active, url = %self.url, "reverse proxy reconfigured");
        Ok(())
    }

    /// Forwards every version change to the reverse proxy until the sender
    /// is dropped. Failures are logged; the toggle itself stands.
    pub fn spawn(self, mut changes: watch::Receiver<ActiveVersion>) -> JoinHandle<()> {
        tokio::spawn(async move {
            while changes.changed().await.is_ok() {
                let active = *changes.borrow_and_update();
                if let Err(e) = self.notify(active).await {
                    warn!(active = %active, error = %e, "reverse proxy reload failed");
                }
            }
        })
    }
}
