//! Backend liveness probe

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::io::HttpClient;
use crate::periodic::PeriodicTask;

/// Longest a single liveness request may take before the backend counts as down
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Body returned by the liveness endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthSnapshot {
    pub status: String,
    pub timestamp: String,
    pub service: String,
    pub version: String,
}

/// Observable probe state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum HealthStatus {
    /// No probe has completed yet
    #[default]
    Checking,
    Online(HealthSnapshot),
    Offline {
        reason: String,
    },
}

impl HealthStatus {
    pub fn snapshot(&self) -> Option<&HealthSnapshot> {
        match self {
            HealthStatus::Online(snapshot) => Some(snapshot),
            _ => None,
        }
    }

    pub fn is_online(&self) -> bool {
        matches!(self, HealthStatus::Online(_))
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthStatus::Checking => write!(f, "Checking"),
            HealthStatus::Online(_) => write!(f, "Online"),
            HealthStatus::Offline { .. } => write!(f, "Offline"),
        }
    }
}

/// Periodically queries the liveness endpoint through the shared pipeline
pub struct HealthProbe {
    url: String,
    http: Arc<dyn HttpClient>,
    timeout: Duration,
    tx: watch::Sender<HealthStatus>,
}

impl fmt::Debug for HealthProbe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HealthProbe")
            .field("url", &self.url)
            .field("status", &*self.tx.borrow())
            .finish()
    }
}

impl HealthProbe {
    pub fn new(url: impl Into<String>, http: Arc<dyn HttpClient>) -> Self {
        let (tx, _rx) = watch::channel(HealthStatus::Checking);
        let url = url.into();
        tracing::debug!("Created HealthProbe for {}", url);
        Self {
            url,
            http,
            timeout: DEFAULT_PROBE_TIMEOUT,
            tx,
        }
    }

    /// Give up on a liveness request after `timeout` and report offline
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Probe once and publish the result. A failure always replaces any
    /// earlier snapshot.
    pub async fn fetch_health(&self) -> HealthStatus {
        let status = self.probe().await;
        if let HealthStatus::Offline { reason } = &status {
            if self.tx.borrow().is_online() {
                tracing::warn!("Backend went offline: {}", reason);
            }
        }
        self.tx.send_replace(status.clone());
        status
    }

    async fn probe(&self) -> HealthStatus {
        tracing::debug!("Probing {}", self.url);
        let response = match tokio::time::timeout(self.timeout, self.http.get(&self.url)).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                tracing::debug!("Health probe failed: {}", e);
                return HealthStatus::Offline {
                    reason: e.to_string(),
                };
            }
            Err(_) => {
                tracing::debug!("Health probe timed out after {:?}", self.timeout);
                return HealthStatus::Offline {
                    reason: format!("timed out after {:?}", self.timeout),
                };
            }
        };

        if !response.is_success() {
            tracing::debug!("Non-success health response: status={}", response.status);
            return HealthStatus::Offline {
                reason: format!("status {}", response.status),
            };
        }

        match serde_json::from_str::<HealthSnapshot>(&response.body) {
            Ok(snapshot) => HealthStatus::Online(snapshot),
            Err(e) => {
                tracing::debug!("Failed to parse health response: {}", e);
                HealthStatus::Offline {
                    reason: format!("malformed health response: {}", e),
                }
            }
        }
    }

    pub fn current(&self) -> HealthStatus {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<HealthStatus> {
        self.tx.subscribe()
    }

    /// Probe now and every `interval` until cancelled
    pub fn spawn(self: &Arc<Self>, interval: Duration, parent: &CancellationToken) -> PeriodicTask {
        let probe = Arc::clone(self);
        PeriodicTask::spawn("health-probe", interval, parent, move || {
            let probe = Arc::clone(&probe);
            async move {
                probe.fetch_health().await;
            }
        })
    }
}
