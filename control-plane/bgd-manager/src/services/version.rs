use std::sync::Arc;

use bgd_state_storage::{ActiveVersion, StorageError, VersionStore};
use tokio::sync::{Mutex, watch};
use tracing::{info, warn};

use crate::{
    config::SlotConfig,
    errors::{ManagerError, RuntimeError},
    runtime::ContainerRuntime,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscardOutcome {
    Stopped(String),
    /// The inactive instance does not exist; nothing left to discard.
    NotFound(String),
}

/// Owner of the active-version record.
///
/// Reads go straight to the store. Every write (first-read default and
/// toggle) runs under `write_lock`, so read-compute-commit sequences never
/// interleave.
pub struct VersionStateController {
    store: Arc<dyn VersionStore>,
    runtime: Arc<dyn ContainerRuntime>,
    slots: SlotConfig,
    write_lock: Mutex<()>,
    changes: watch::Sender<ActiveVersion>,
}

impl VersionStateController {
    /// Opens the controller, persisting the default (Blue) if no record
    /// exists yet.
    pub async fn open(
        store: Arc<dyn VersionStore>,
        runtime: Arc<dyn ContainerRuntime>,
        slots: SlotConfig,
    ) -> Result<Self, StorageError> {
        let (changes, _) = watch::channel(ActiveVersion::default());
        let controller = Self {
            store,
            runtime,
            slots,
            write_lock: Mutex::new(()),
            changes,
        };
        let current = controller.current_active().await?;
        controller.changes.send_replace(current);
        info!(
            store = %controller.store.describe(),
            active = %current,
            "version state loaded"
        );
        Ok(controller)
    }

    pub fn slots(&self) -> &SlotConfig {
        &self.slots
    }

    pub async fn current_active(&self) -> Result<ActiveVersion, StorageError> {
        if let Some(version) = self.store.load().await? {
            return Ok(version);
        }

        let _guard = self.write_lock.lock().await;
        // another caller may have initialized it while we waited
        if let Some(version) = self.store.load().await? {
            return Ok(version);
        }
        let version = ActiveVersion::default();
        self.store.store(version).await?;
        info!(active = %version, "no version record found, initialized default");
        Ok(version)
    }

    pub async fn toggle(&self) -> Result<ActiveVersion, StorageError> {
        let _guard = self.write_lock.lock().await;
        let current = self.store.load().await?.unwrap_or_default();
        let next = current.other();
        self.store.store(next).await?;
        self.changes.send_replace(next);
        info!(from = %current, to = %next, "active version switched");
        Ok(next)
    }

    /// Stops the instance of the slot that is not currently active.
    pub async fn discard_inactive(&self) -> Result<DiscardOutcome, ManagerError> {
        let inactive = self.current_active().await?.other();
        let name = self.slots.target(inactive).container.clone();
        match self.runtime.stop(&name).await {
            Ok(()) => {
                info!(slot = %inactive, container = %name, "inactive instance stopped");
                Ok(DiscardOutcome::Stopped(name))
            }
            Err(RuntimeError::NotFound(_)) => {
                info!(slot = %inactive, container = %name, "inactive instance already absent");
                Ok(DiscardOutcome::NotFound(name))
            }
            Err(e) => {
                warn!(slot = %inactive, container = %name, error = %e, "failed to stop inactive instance");
                Err(e.into())
            }
        }
    }

    /// Receiver notified after every committed toggle.
    pub fn subscribe(&self) -> watch::Receiver<ActiveVersion> {
        self.changes.subscribe()
    }
}
