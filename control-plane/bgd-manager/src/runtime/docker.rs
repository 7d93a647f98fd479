use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{debug, info};

use super::{ContainerRuntime, InstanceStats, Uptime, cpu_percent, memory_mb};
use crate::{clock::Clock, config::RuntimeConfig, errors::RuntimeError};

/// Docker Engine API client over HTTP (a TCP daemon endpoint or a socket
/// proxy in front of `/var/run/docker.sock`).
#[derive(Clone)]
pub struct DockerRuntime {
    client: Client,
    base_url: String,
    stop_grace_secs: u64,
    clock: Arc<dyn Clock>,
}

impl DockerRuntime {
    pub fn new(
        config: &RuntimeConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, RuntimeError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.timeout)
            .build()?;
        let base_url = if config.api_version.is_empty() {
            config.docker_url.clone()
        } else {
            format!("{}/{}", config.docker_url, config.api_version)
        };
        Ok(Self {
            client,
            base_url,
            stop_grace_secs: config.stop_grace.as_secs(),
            clock,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn container_url(&self, name: &str, action: &str) -> String {
        format!("{}/containers/{}/{}", self.base_url, name, action)
    }

    async fn get_json(&self, name: &str, url: String) -> Result<Value, RuntimeError> {
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(RuntimeError::from_reqwest)?;
        match resp.status() {
            StatusCode::NOT_FOUND => Err(RuntimeError::NotFound(name.to_string())),
            s if s.is_success() => {
                resp.json::<Value>().await.map_err(RuntimeError::from_reqwest)
            }
            s => Err(RuntimeError::Status(s, error_message(resp).await)),
        }
    }

    fn uptime(&self, state: &Value) -> Uptime {
        let running = state
            .pointer("/State/Running")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        if !running {
            return Uptime::Stopped;
        }
        state
            .pointer("/State/StartedAt")
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|started| {
                Uptime::Running(self.clock.now() - started.with_timezone(&Utc))
            })
            .unwrap_or(Uptime::Unknown)
    }
}

async fn error_message(resp: reqwest::Response) -> String {
    let text = resp.text().await.unwrap_or_default();
    serde_json::from_str::<Value>(&text)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(String::from))
        .unwrap_or(text)
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn stats(&self, name: &str) -> Result<InstanceStats, RuntimeError> {
        let inspect = self.get_json(name, self.container_url(name, "json")).await?;
        let uptime = self.uptime(&inspect);
        if uptime == Uptime::Stopped {
            debug!(container = %name, "container not running");
            return Ok(InstanceStats::stopped());
        }

        let stats = self
            .get_json(name, self.container_url(name, "stats?stream=false"))
            .await?;
        let (mem_usage_mb, mem_limit_mb) = memory_mb(&stats);
        Ok(InstanceStats {
            cpu_percent: cpu_percent(&stats),
            mem_usage_mb,
            mem_limit_mb,
            uptime,
        })
    }

    async fn stop(&self, name: &str) -> Result<(), RuntimeError> {
        let resp = self
            .client
            .post(self.container_url(
                name,
                &format!("stop?t={}", self.stop_grace_secs),
            ))
            .send()
            .await
            .map_err(RuntimeError::from_reqwest)?;
        match resp.status() {
            StatusCode::NO_CONTENT => {
                info!(container = %name, "container stopped");
                Ok(())
            }
            StatusCode::NOT_MODIFIED => {
                info!(container = %name, "container already stopped");
                Ok(())
            }
            StatusCode::NOT_FOUND => Err(RuntimeError::NotFound(name.to_string())),
            s => Err(RuntimeError::Status(s, error_message(resp).await)),
        }
    }
}
