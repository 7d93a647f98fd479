#![allow(dead_code)]

use std::{
    collections::{HashMap, HashSet},
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use axum::{Router, response::Response};
use bgd_manager::{
    ApiServer, AppState, build_app_state,
    clock::SystemClock,
    config::AppConfig,
    errors::RuntimeError,
    runtime::{ContainerRuntime, InstanceStats, Uptime},
};
use bgd_state_storage::{
    ActiveVersion, StorageError, StorageResult, VersionStore,
};
use chrono::TimeDelta;
use envconfig::Envconfig;
use reqwest::StatusCode;

pub const BLUE: &str = "service1-blue";
pub const GREEN: &str = "service1-green";

/// Config with an in-memory version store plus the given overrides.
pub fn test_config(overrides: &[(&str, &str)]) -> AppConfig {
    let mut env = HashMap::new();
    env.insert("STATE_STORE".to_string(), "memory".to_string());
    env.insert("STORAGE_URL".to_string(), "http://127.0.0.1:9".to_string());
    env.insert("STORAGE_TIMEOUT".to_string(), "1".to_string());
    for (k, v) in overrides {
        env.insert(k.to_string(), v.to_string());
    }
    AppConfig::init_from_hashmap(&env).expect("test config")
}

/// In-process container runtime. Instances not in `running` do not exist.
#[derive(Default)]
pub struct FakeRuntime {
    running: Mutex<HashSet<String>>,
    failing: Mutex<HashSet<String>>,
    stops: Mutex<Vec<String>>,
}

impl FakeRuntime {
    pub fn with_running(names: &[&str]) -> Self {
        let runtime = Self::default();
        runtime
            .running
            .lock()
            .unwrap()
            .extend(names.iter().map(|n| n.to_string()));
        runtime
    }

    pub fn fail_on(&self, name: &str) {
        self.failing.lock().unwrap().insert(name.to_string());
    }

    pub fn is_running(&self, name: &str) -> bool {
        self.running.lock().unwrap().contains(name)
    }

    pub fn stop_calls(&self) -> Vec<String> {
        self.stops.lock().unwrap().clone()
    }
}

#[async_trait]
impl ContainerRuntime for FakeRuntime {
    async fn stats(&self, name: &str) -> Result<InstanceStats, RuntimeError> {
        if self.failing.lock().unwrap().contains(name) {
            return Err(RuntimeError::Timeout);
        }
        if self.is_running(name) {
            Ok(InstanceStats {
                cpu_percent: 12.5,
                mem_usage_mb: 64.0,
                mem_limit_mb: 512.0,
                uptime: Uptime::Running(TimeDelta::seconds(90)),
            })
        } else {
            Err(RuntimeError::NotFound(name.to_string()))
        }
    }

    async fn stop(&self, name: &str) -> Result<(), RuntimeError> {
        self.stops.lock().unwrap().push(name.to_string());
        if self.failing.lock().unwrap().contains(name) {
            return Err(RuntimeError::Status(
                StatusCode::INTERNAL_SERVER_ERROR,
                "daemon error".to_string(),
            ));
        }
        if self.running.lock().unwrap().remove(name) {
            Ok(())
        } else {
            Err(RuntimeError::NotFound(name.to_string()))
        }
    }
}

/// Version store that counts writes and can be told to fail them.
#[derive(Default)]
pub struct CountingStore {
    value: Mutex<Option<ActiveVersion>>,
    writes: AtomicUsize,
    fail_writes: AtomicBool,
}

impl CountingStore {
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn clear(&self) {
        *self.value.lock().unwrap() = None;
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl VersionStore for CountingStore {
    async fn load(&self) -> StorageResult<Option<ActiveVersion>> {
        Ok(*self.value.lock().unwrap())
    }

    async fn store(&self, version: ActiveVersion) -> StorageResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Backend("write refused".to_string()));
        }
        // widen the window between check and write
        tokio::task::yield_now().await;
        self.writes.fetch_add(1, Ordering::SeqCst);
        *self.value.lock().unwrap() = Some(version);
        Ok(())
    }

    fn describe(&self) -> String {
        "counting".to_string()
    }
}

/// Fully wired state and router over the fake runtime and the system clock.
pub async fn test_app(
    config: &AppConfig,
    runtime: Arc<FakeRuntime>,
) -> anyhow::Result<(AppState, Router)> {
    let state = build_app_state(config, runtime, Arc::new(SystemClock)).await?;
    let router = ApiServer::new(state.clone(), config.server()).into_router();
    Ok((state, router))
}

pub async fn body_json(response: Response) -> anyhow::Result<serde_json::Value> {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    Ok(serde_json::from_slice(&body)?)
}
