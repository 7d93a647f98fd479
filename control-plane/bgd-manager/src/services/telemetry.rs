//! Response-time history and backend liveness.
//!
//! Each collection sits behind its own mutex. Critical sections never await,
//! so a plain `std::sync::Mutex` is enough even on the async request path.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;

use crate::clock::{Clock, humanize};

/// Samples kept per endpoint.
pub const LATENCY_WINDOW: usize = 50;

/// A backend seen more recently than this many seconds is `Living`.
pub const LIVING_THRESHOLD_SECS: i64 = 10;

/// Summary of an endpoint's latency window. All fields are `None` while the
/// window is empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LatencyStats {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg: Option<f64>,
    pub samples: usize,
}

impl LatencyStats {
    pub fn is_empty(&self) -> bool {
        self.samples == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    Never,
    Living,
    Since(TimeDelta),
}

impl fmt::Display for Liveness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Liveness::Never => f.write_str("Never"),
            Liveness::Living => f.write_str("Living"),
            Liveness::Since(elapsed) => write!(f, "{} ago", humanize(*elapsed)),
        }
    }
}

pub struct TelemetryStore {
    latencies: Mutex<HashMap<String, VecDeque<f64>>>,
    last_alive: Mutex<HashMap<String, DateTime<Utc>>>,
    clock: Arc<dyn Clock>,
    window: usize,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl TelemetryStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_window(clock, LATENCY_WINDOW)
    }

    pub fn with_window(clock: Arc<dyn Clock>, window: usize) -> Self {
        Self {
            latencies: Mutex::new(HashMap::new()),
            last_alive: Mutex::new(HashMap::new()),
            clock,
            window: window.max(1),
        }
    }

    pub fn record_latency(&self, endpoint: &str, millis: f64) {
        let mut latencies = lock(&self.latencies);
        let window = latencies.entry(endpoint.to_string()).or_default();
        window.push_back(millis);
        while window.len() > self.window {
            window.pop_front();
        }
    }

    /// Samples for `endpoint`, oldest first.
    pub fn samples(&self, endpoint: &str) -> Vec<f64> {
        lock(&self.latencies)
            .get(endpoint)
            .map(|w| w.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn latency_stats(&self, endpoint: &str) -> LatencyStats {
        let latencies = lock(&self.latencies);
        let Some(window) = latencies.get(endpoint).filter(|w| !w.is_empty())
        else {
            return LatencyStats::default();
        };
        let min = window.iter().copied().fold(f64::INFINITY, f64::min);
        let max = window.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let avg = window.iter().sum::<f64>() / window.len() as f64;
        LatencyStats {
            min: Some(min),
            max: Some(max),
            avg: Some(avg),
            samples: window.len(),
        }
    }

    /// Stats for every endpoint that has recorded at least one sample.
    pub fn all_latency_stats(&self) -> BTreeMap<String, LatencyStats> {
        let endpoints: Vec<String> =
            lock(&self.latencies).keys().cloned().collect();
        endpoints
            .into_iter()
            .map(|e| {
                let stats = self.latency_stats(&e);
                (e, stats)
            })
            .collect()
    }

    pub fn mark_alive(&self, instance: &str, at: DateTime<Utc>) {
        lock(&self.last_alive).insert(instance.to_string(), at);
    }

    pub fn mark_alive_now(&self, instance: &str) {
        self.mark_alive(instance, self.clock.now());
    }

    pub fn liveness(&self, instance: &str) -> Liveness {
        let Some(seen) = lock(&self.last_alive).get(instance).copied() else {
            return Liveness::Never;
        };
        let elapsed = self.clock.now() - seen;
        if elapsed < TimeDelta::seconds(LIVING_THRESHOLD_SECS) {
            Liveness::Living
        } else {
            Liveness::Since(elapsed)
        }
    }

    pub fn last_alive_description(&self, instance: &str) -> String {
        self.liveness(instance).to_string()
    }
}
