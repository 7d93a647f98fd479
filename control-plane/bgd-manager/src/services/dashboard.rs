use std::collections::BTreeMap;
use std::sync::Arc;

use bgd_state_storage::ActiveVersion;
use futures_util::future::join_all;
use serde::Serialize;
use tracing::warn;

use super::{TelemetryStore, VersionStateController, telemetry::LatencyStats};
use crate::{
    clients::LogStorageClient,
    errors::ManagerError,
    runtime::{ContainerRuntime, InstanceStats, ManagedInstance},
};

/// Endpoints forwarded to the active backend.
pub const PROXIED_ENDPOINTS: [&str; 2] = ["status", "log"];

#[derive(Debug, Serialize)]
pub struct InstanceView {
    pub name: String,
    pub slot: Option<ActiveVersion>,
    #[serde(flatten)]
    pub stats: Option<InstanceStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DashboardSnapshot {
    pub active_version: ActiveVersion,
    pub logs: String,
    pub instances: Vec<InstanceView>,
    pub latency: BTreeMap<String, LatencyStats>,
    pub liveness: BTreeMap<String, String>,
}

pub struct DashboardService {
    versions: Arc<VersionStateController>,
    runtime: Arc<dyn ContainerRuntime>,
    telemetry: Arc<TelemetryStore>,
    log_storage: LogStorageClient,
    instances: Vec<ManagedInstance>,
}

impl DashboardService {
    pub fn new(
        versions: Arc<VersionStateController>,
        runtime: Arc<dyn ContainerRuntime>,
        telemetry: Arc<TelemetryStore>,
        log_storage: LogStorageClient,
        monitored: Vec<String>,
    ) -> Self {
        let slots = versions.slots();
        let mut instances: Vec<ManagedInstance> = ActiveVersion::ALL
            .into_iter()
            .map(|v| ManagedInstance {
                name: slots.target(v).container.clone(),
                slot: Some(v),
            })
            .collect();
        for name in monitored {
            if !instances.iter().any(|i| i.name == name) {
                instances.push(ManagedInstance { name, slot: None });
            }
        }
        Self {
            versions,
            runtime,
            telemetry,
            log_storage,
            instances,
        }
    }

    /// Composes the dashboard. Only a failure to read the version record is
    /// fatal; collaborator and runtime failures land in the affected field.
    #[tracing::instrument(skip(self))]
    pub async fn snapshot(&self) -> Result<DashboardSnapshot, ManagerError> {
        let (active, logs, instances) = tokio::join!(
            self.versions.current_active(),
            self.log_storage.fetch_log(),
            join_all(self.instances.iter().map(|i| self.instance_view(i))),
        );
        let active_version = active?;

        let logs = logs.unwrap_or_else(|e| {
            warn!(error = %e, "log storage unavailable");
            match e {
                ManagerError::Collaborator(msg) => msg,
                other => other.to_string(),
            }
        });

        let mut latency: BTreeMap<String, LatencyStats> = PROXIED_ENDPOINTS
            .iter()
            .map(|e| (e.to_string(), LatencyStats::default()))
            .collect();
        latency.extend(self.telemetry.all_latency_stats());

        let liveness = self
            .instances
            .iter()
            .filter(|i| i.slot.is_some())
            .map(|i| (i.name.clone(), self.telemetry.last_alive_description(&i.name)))
            .collect();

        Ok(DashboardSnapshot {
            active_version,
            logs,
            instances,
            latency,
            liveness,
        })
    }

    async fn instance_view(&self, instance: &ManagedInstance) -> InstanceView {
        let (stats, error) = match self.runtime.stats(&instance.name).await {
            Ok(stats) => (Some(stats), None),
            Err(e) => {
                warn!(container = %instance.name, error = %e, "stats unavailable");
                (None, Some(e.to_string()))
            }
        };
        InstanceView {
            name: instance.name.clone(),
            slot: instance.slot,
            stats,
            error,
        }
    }
}
