//! Narrow view of the container runtime: per-instance stats and stop.

pub mod docker;

use std::fmt;

use async_trait::async_trait;
use bgd_state_storage::ActiveVersion;
use chrono::TimeDelta;
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::{clock::humanize, errors::RuntimeError};

pub use docker::DockerRuntime;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// A container this service observes and may stop. Its lifecycle is owned by
/// the deployment tooling.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManagedInstance {
    pub name: String,
    pub slot: Option<ActiveVersion>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Uptime {
    Running(TimeDelta),
    Stopped,
    Unknown,
}

impl fmt::Display for Uptime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Uptime::Running(d) => f.write_str(&humanize(*d)),
            Uptime::Stopped => f.write_str("stopped"),
            Uptime::Unknown => f.write_str("unknown"),
        }
    }
}

impl Serialize for Uptime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Fresh resource snapshot of one instance. Never cached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstanceStats {
    pub cpu_percent: f64,
    pub mem_usage_mb: f64,
    pub mem_limit_mb: f64,
    pub uptime: Uptime,
}

impl InstanceStats {
    pub fn stopped() -> Self {
        Self {
            cpu_percent: 0.0,
            mem_usage_mb: 0.0,
            mem_limit_mb: 0.0,
            uptime: Uptime::Stopped,
        }
    }
}

#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    async fn stats(&self, name: &str) -> Result<InstanceStats, RuntimeError>;

    /// Stops the named instance. An already stopped instance is `Ok`.
    async fn stop(&self, name: &str) -> Result<(), RuntimeError>;
}

/// `(cpu_delta / system_delta) * cpu_count * 100`, or `0.0` unless both
/// deltas are positive.
pub fn compute_cpu_percent(
    cpu_delta: f64,
    system_delta: f64,
    cpu_count: usize,
) -> f64 {
    if system_delta > 0.0 && cpu_delta > 0.0 {
        (cpu_delta / system_delta) * cpu_count as f64 * 100.0
    } else {
        0.0
    }
}

/// CPU percent from a Docker stats document (`cpu_stats` vs `precpu_stats`).
/// Any missing counter yields `0.0`.
pub fn cpu_percent(stats: &Value) -> f64 {
    let counter = |pointer: &str| stats.pointer(pointer).and_then(Value::as_f64);

    let (Some(total), Some(pre_total), Some(system), Some(pre_system)) = (
        counter("/cpu_stats/cpu_usage/total_usage"),
        counter("/precpu_stats/cpu_usage/total_usage"),
        counter("/cpu_stats/system_cpu_usage"),
        counter("/precpu_stats/system_cpu_usage"),
    ) else {
        return 0.0;
    };

    let cpu_count = stats
        .pointer("/cpu_stats/cpu_usage/percpu_usage")
        .and_then(Value::as_array)
        .map(|cores| cores.len())
        .filter(|n| *n > 0)
        .unwrap_or(1);

    compute_cpu_percent(total - pre_total, system - pre_system, cpu_count)
}

/// `(usage_mb, limit_mb)`; missing counters report as 0.
pub fn memory_mb(stats: &Value) -> (f64, f64) {
    let mb = |pointer: &str| {
        stats
            .pointer(pointer)
            .and_then(Value::as_f64)
            .map(|bytes| bytes / BYTES_PER_MB)
            .unwrap_or(0.0)
    };
    (mb("/memory_stats/usage"), mb("/memory_stats/limit"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fixture(total: u64, pre_total: u64, system: u64, pre_system: u64) -> Value {
        json!({
            "cpu_stats": {
                "cpu_usage": {
                    "total_usage": total,
                    "percpu_usage": [1, 1, 1, 1]
                },
                "system_cpu_usage": system
            },
            "precpu_stats": {
                "cpu_usage": { "total_usage": pre_total },
                "system_cpu_usage": pre_system
            }
        })
    }

    #[test]
    fn cpu_percent_matches_reference_counters() {
        assert_eq!(compute_cpu_percent(200_000_000.0, 1_000_000_000.0, 4), 80.0);
        let stats = fixture(1_200_000_000, 1_000_000_000, 6_000_000_000, 5_000_000_000);
        assert_eq!(cpu_percent(&stats), 80.0);
    }

    #[test]
    fn cpu_percent_is_zero_without_positive_deltas() {
        assert_eq!(compute_cpu_percent(0.0, 1_000.0, 4), 0.0);
        assert_eq!(compute_cpu_percent(100.0, 0.0, 4), 0.0);
        assert_eq!(compute_cpu_percent(-5.0, 1_000.0, 4), 0.0);
        assert_eq!(compute_cpu_percent(100.0, -1_000.0, 4), 0.0);

        let idle = fixture(1_000, 1_000, 6_000, 5_000);
        assert_eq!(cpu_percent(&idle), 0.0);
    }

    #[test]
    fn cpu_percent_tolerates_missing_fields() {
        assert_eq!(cpu_percent(&json!({})), 0.0);
        assert_eq!(cpu_percent(&json!({ "cpu_stats": null })), 0.0);
        assert_eq!(
            cpu_percent(&json!({
                "cpu_stats": { "cpu_usage": { "total_usage": 10 } },
                "precpu_stats": {}
            })),
            0.0
        );
    }

    #[test]
    fn cpu_count_falls_back_to_one() {
        let stats = json!({
            "cpu_stats": {
                "cpu_usage": { "total_usage": 300 },
                "system_cpu_usage": 2_000
            },
            "precpu_stats": {
                "cpu_usage": { "total_usage": 100 },
                "system_cpu_usage": 1_000
            }
        });
        assert_eq!(cpu_percent(&stats), 20.0);
    }

    #[test]
    fn memory_reported_in_megabytes() {
        let stats = json!({
            "memory_stats": { "usage": 52_428_800u64, "limit": 1_073_741_824u64 }
        });
        assert_eq!(memory_mb(&stats), (50.0, 1024.0));
        assert_eq!(
            memory_mb(&json!({ "memory_stats": { "usage": 1_048_576 } })),
            (1.0, 0.0)
        );
    }

    #[test]
    fn uptime_serializes_as_text() {
        let running = Uptime::Running(TimeDelta::seconds(90));
        assert_eq!(serde_json::to_value(running).unwrap(), json!("1m 30s"));
        assert_eq!(serde_json::to_value(Uptime::Stopped).unwrap(), json!("stopped"));
    }
}
