//! BDD test world for opstatus service

use std::sync::Arc;

use cucumber::World;
use opstatus::health::HealthProbe;
use opstatus::io::{HttpClient, HttpResponse};
use opstatus::maintenance::{new_maintenance_handle, MaintenanceHandle};
use opstatus::notifications::NotificationPoller;
use opstatus::periodic::PeriodicTask;
use opstatus::pipeline::{InterceptorGuard, RequestPipeline};
use opstatus::session::MemorySessionStore;
use opstatus::Config;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::support::{url, ScriptedApi};

#[derive(Debug, Default, World)]
pub struct OpStatusWorld {
    // Shared transport and pipeline
    pub api: Option<Arc<ScriptedApi>>,
    pub pipeline: Option<Arc<RequestPipeline>>,
    pub store: Option<MaintenanceHandle>,
    pub guard: Option<InterceptorGuard>,
    pub last_response: Option<opstatus::Result<HttpResponse>>,

    // Pollers
    pub poller: Option<Arc<NotificationPoller>>,
    pub probe: Option<Arc<HealthProbe>>,
    pub health_task: Option<PeriodicTask>,
    pub poll_cancel: Option<CancellationToken>,

    // Lifecycle
    pub lifecycle_config: Option<Config>,
    pub lifecycle_cancel: Option<CancellationToken>,
    pub lifecycle_succeeded: Option<bool>,
    pub app_task: Option<JoinHandle<opstatus::Result<()>>>,

    // Dashboard
    pub session: Option<Arc<MemorySessionStore>>,
    pub dashboard_response_status: Option<u16>,
    pub dashboard_response_body: Option<String>,
}

impl OpStatusWorld {
    pub fn api(&mut self) -> Arc<ScriptedApi> {
        Arc::clone(self.api.get_or_insert_with(Default::default))
    }

    /// The shared pipeline over the scripted backend
    pub fn pipeline(&mut self) -> Arc<RequestPipeline> {
        let api = self.api();
        Arc::clone(
            self.pipeline
                .get_or_insert_with(|| RequestPipeline::new(api as Arc<dyn HttpClient>)),
        )
    }

    pub fn store(&mut self) -> MaintenanceHandle {
        Arc::clone(
            self.store
                .get_or_insert_with(|| new_maintenance_handle("Maintenance in progress")),
        )
    }

    pub fn poller(&mut self) -> Arc<NotificationPoller> {
        let pipeline = self.pipeline();
        Arc::clone(self.poller.get_or_insert_with(|| {
            Arc::new(NotificationPoller::new(
                url("/api/notifications"),
                pipeline as Arc<dyn HttpClient>,
            ))
        }))
    }

    pub fn probe(&mut self) -> Arc<HealthProbe> {
        let pipeline = self.pipeline();
        Arc::clone(self.probe.get_or_insert_with(|| {
            Arc::new(HealthProbe::new(
                url("/health"),
                pipeline as Arc<dyn HttpClient>,
            ))
        }))
    }
}
