//! Maintenance interceptor
//!
//! Middleware that observes every response flowing through the request
//! pipeline and drives the [`MaintenanceStore`](crate::maintenance::MaintenanceStore).

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::io::{HttpClient, HttpResponse};
use crate::maintenance::MaintenanceHandle;

/// Status code the backend uses to announce maintenance
pub const SERVICE_UNAVAILABLE: u16 = 503;

/// Wraps an [`HttpClient`] with additional behavior
pub trait Interceptor: Send + Sync {
    fn wrap(&self, inner: Arc<dyn HttpClient>) -> Arc<dyn HttpClient>;
}

/// What a single response says about the backend's operational status
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusSignal {
    /// 503 carrying `maintenance: true`, with the optional message
    Maintenance(Option<String>),
    /// Any 2xx response
    Healthy,
    /// Everything else, including 503 bodies that are not maintenance signals
    None,
}

/// Classify a response. Body parse failures are not errors, just no signal.
pub fn classify(response: &HttpResponse) -> StatusSignal {
    if response.status == SERVICE_UNAVAILABLE {
        // Only a JSON object can carry the flag; arrays and scalars are no signal
        return match serde_json::from_str::<Map<String, Value>>(&response.body) {
            Ok(body) if body.get("maintenance") == Some(&Value::Bool(true)) => {
                StatusSignal::Maintenance(
                    body.get("message")
                        .and_then(Value::as_str)
                        .map(str::to_owned),
                )
            }
            Ok(_) => StatusSignal::None,
            Err(e) => {
                tracing::debug!("503 body is not a maintenance signal: {}", e);
                StatusSignal::None
            }
        };
    }

    if response.is_success() {
        StatusSignal::Healthy
    } else {
        StatusSignal::None
    }
}

/// Installs [`MaintenanceInterceptor`] around a pipeline target
#[derive(Debug, Clone)]
pub struct MaintenanceLayer {
    store: MaintenanceHandle,
}

impl MaintenanceLayer {
    pub fn new(store: MaintenanceHandle) -> Self {
        Self { store }
    }
}

impl Interceptor for MaintenanceLayer {
    fn wrap(&self, inner: Arc<dyn HttpClient>) -> Arc<dyn HttpClient> {
        Arc::new(MaintenanceInterceptor {
            inner,
            store: Arc::clone(&self.store),
        })
    }
}

/// Forwards requests unchanged and updates the maintenance store from each
/// response before handing it back to the caller.
pub struct MaintenanceInterceptor {
    inner: Arc<dyn HttpClient>,
    store: MaintenanceHandle,
}

impl std::fmt::Debug for MaintenanceInterceptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MaintenanceInterceptor")
            .field("store", &self.store)
            .finish()
    }
}

impl MaintenanceInterceptor {
    fn observe(&self, method: &str, url: &str, response: &HttpResponse) {
        match classify(response) {
            StatusSignal::Maintenance(message) => {
                tracing::debug!("{} {} signalled maintenance", method, url);
                self.store.enter(message);
            }
            StatusSignal::Healthy => {
                self.store.exit();
            }
            StatusSignal::None => {}
        }
    }
}

#[async_trait]
impl HttpClient for MaintenanceInterceptor {
    async fn get(&self, url: &str) -> crate::Result<HttpResponse> {
        let response = self.inner.get(url).await?;
        self.observe("GET", url, &response);
        Ok(response)
    }

    async fn post_json(&self, url: &str, body: &serde_json::Value) -> crate::Result<HttpResponse> {
        let response = self.inner.post_json(url, body).await?;
        self.observe("POST", url, &response);
        Ok(response)
    }
}
