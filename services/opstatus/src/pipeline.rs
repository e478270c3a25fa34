//! Shared request pipeline
//!
//! The single choke point every outbound request of the application goes
//! through. Interceptors are mounted onto it for a bounded lifetime and the
//! returned [`InterceptorGuard`] puts the previous target back when it is
//! unmounted or dropped.

use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;

use crate::interceptor::Interceptor;
use crate::io::{HttpClient, HttpResponse};

/// Swappable request target shared by every caller
pub struct RequestPipeline {
    target: RwLock<Arc<dyn HttpClient>>,
}

impl std::fmt::Debug for RequestPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestPipeline").finish_non_exhaustive()
    }
}

impl RequestPipeline {
    pub fn new(client: Arc<dyn HttpClient>) -> Arc<Self> {
        Arc::new(Self {
            target: RwLock::new(client),
        })
    }

    /// The client requests are currently dispatched to
    pub fn target(&self) -> Arc<dyn HttpClient> {
        self.target
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// True if `client` is the exact current target
    pub fn is_target(&self, client: &Arc<dyn HttpClient>) -> bool {
        same_client(&self.target(), client)
    }

    /// Wrap the current target with `interceptor` until the guard is released
    pub fn mount(self: &Arc<Self>, interceptor: &dyn Interceptor) -> InterceptorGuard {
        let mut target = self.target.write().unwrap_or_else(PoisonError::into_inner);
        let original = target.clone();
        let installed = interceptor.wrap(Arc::clone(&original));
        *target = Arc::clone(&installed);
        tracing::debug!("Interceptor mounted on request pipeline");

        InterceptorGuard {
            pipeline: Arc::clone(self),
            original: Some(original),
            installed,
        }
    }

    fn restore(&self, installed: &Arc<dyn HttpClient>, original: Arc<dyn HttpClient>) {
        let mut target = self.target.write().unwrap_or_else(PoisonError::into_inner);
        if !same_client(&target, installed) {
            tracing::warn!("Interceptors unmounted out of order; restoring original target anyway");
        }
        *target = original;
        tracing::debug!("Interceptor unmounted from request pipeline");
    }
}

fn same_client(a: &Arc<dyn HttpClient>, b: &Arc<dyn HttpClient>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

#[async_trait]
impl HttpClient for RequestPipeline {
    async fn get(&self, url: &str) -> crate::Result<HttpResponse> {
        let target = self.target();
        target.get(url).await
    }

    async fn post_json(&self, url: &str, body: &serde_json::Value) -> crate::Result<HttpResponse> {
        let target = self.target();
        target.post_json(url, body).await
    }
}

/// Keeps an interceptor mounted; restores the previous target on release
#[must_use = "dropping the guard immediately unmounts the interceptor"]
pub struct InterceptorGuard {
    pipeline: Arc<RequestPipeline>,
    original: Option<Arc<dyn HttpClient>>,
    installed: Arc<dyn HttpClient>,
}

impl std::fmt::Debug for InterceptorGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterceptorGuard")
            .field("mounted", &self.original.is_some())
            .finish()
    }
}

impl InterceptorGuard {
    /// Unmount explicitly
    pub fn unmount(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(original) = self.original.take() {
            self.pipeline.restore(&self.installed, original);
        }
    }
}

impl Drop for InterceptorGuard {
    fn drop(&mut self) {
        self.release();
    }
}
