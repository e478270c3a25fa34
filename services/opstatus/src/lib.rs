//! opstatus - Operational-status interception and notification service
//!
//! Watches every response the client receives for the backend's maintenance
//! signal, and polls for user notifications and backend liveness.

pub mod config;
pub mod dashboard;
pub mod error;
pub mod health;
pub mod interceptor;
pub mod io;
pub mod maintenance;
pub mod notifications;
pub mod periodic;
pub mod pipeline;
pub mod presentation;
pub mod session;

pub use config::{load_config, Config};
pub use error::{OpStatusError, Result};

use std::net::SocketAddr;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::dashboard::DashboardState;
use crate::health::HealthProbe;
use crate::interceptor::MaintenanceLayer;
use crate::io::{HttpClient, ReqwestHttpClient};
use crate::maintenance::{new_maintenance_handle, MaintenanceHandle};
use crate::notifications::NotificationPoller;
use crate::pipeline::RequestPipeline;
use crate::presentation::MaintenancePresenter;
use crate::session::{MemorySessionStore, SessionStore};

/// Assembles an [`AppRoot`] from configuration and optional injected
/// collaborators
pub struct OpStatusBuilder {
    config: Config,
    http: Option<Arc<dyn HttpClient>>,
    session: Option<Arc<dyn SessionStore>>,
    cancel: Option<CancellationToken>,
}

impl OpStatusBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            http: None,
            session: None,
            cancel: None,
        }
    }

    /// Use `http` as the underlying transport instead of reqwest
    pub fn with_http_client(mut self, http: Arc<dyn HttpClient>) -> Self {
        self.http = Some(http);
        self
    }

    pub fn with_session_store(mut self, session: Arc<dyn SessionStore>) -> Self {
        self.session = Some(session);
        self
    }

    pub fn with_cancellation_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub async fn build(self) -> Result<AppRoot> {
        let config = self.config;
        config.validate()?;

        let http = match self.http {
            Some(http) => http,
            None => Arc::new(ReqwestHttpClient::with_timeout(
                config.api.request_timeout(),
            )?),
        };
        let pipeline = RequestPipeline::new(http);
        let maintenance = new_maintenance_handle(config.maintenance.default_message.clone());

        let pipeline_client: Arc<dyn HttpClient> = pipeline.clone();
        // A probe slower than one interval counts as an outage
        let health = Arc::new(
            HealthProbe::new(config.api.health_url(), Arc::clone(&pipeline_client))
                .with_timeout(config.polling.health_interval()),
        );
        let notifications = Arc::new(
            NotificationPoller::new(config.api.notifications_url(), pipeline_client)
                .with_display_limit(config.notifications.display_limit),
        );

        let presenter = MaintenancePresenter::new(
            config.dashboard.login_route.clone(),
            config.maintenance.contact_email.clone(),
        );
        let session = self
            .session
            .unwrap_or_else(|| Arc::new(MemorySessionStore::new()));

        tracing::debug!(
            "Built opstatus root for {} (health every {:?}, notifications every {:?})",
            config.api.base_url,
            config.polling.health_interval(),
            config.polling.notifications_interval()
        );

        Ok(AppRoot {
            config,
            pipeline,
            maintenance,
            health,
            notifications,
            presenter,
            session,
            cancel: self.cancel.unwrap_or_default(),
        })
    }
}

/// The application root: owns the pipeline, the maintenance store and the
/// pollers for as long as it is mounted
pub struct AppRoot {
    config: Config,
    pipeline: Arc<RequestPipeline>,
    maintenance: MaintenanceHandle,
    health: Arc<HealthProbe>,
    notifications: Arc<NotificationPoller>,
    presenter: MaintenancePresenter,
    session: Arc<dyn SessionStore>,
    cancel: CancellationToken,
}

impl std::fmt::Debug for AppRoot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppRoot")
            .field("base_url", &self.config.api.base_url)
            .field("maintenance", &self.maintenance.current())
            .finish()
    }
}

impl AppRoot {
    /// The shared request pipeline every part of the application sends through
    pub fn pipeline(&self) -> &Arc<RequestPipeline> {
        &self.pipeline
    }

    pub fn maintenance(&self) -> &MaintenanceHandle {
        &self.maintenance
    }

    pub fn health(&self) -> &Arc<HealthProbe> {
        &self.health
    }

    pub fn notifications(&self) -> &Arc<NotificationPoller> {
        &self.notifications
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Mount the interceptor, start the pollers and the dashboard, and run
    /// until cancelled. Everything is torn down in reverse order before
    /// returning.
    pub async fn start(self) -> Result<()> {
        let guard = self
            .pipeline
            .mount(&MaintenanceLayer::new(Arc::clone(&self.maintenance)));

        let health_task = self
            .health
            .spawn(self.config.polling.health_interval(), &self.cancel);
        let notifications_task = self
            .notifications
            .spawn(self.config.polling.notifications_interval(), &self.cancel);

        if self.config.dashboard.enabled {
            self.spawn_dashboard();
        }

        tracing::info!("opstatus started");

        self.cancel.cancelled().await;

        notifications_task.cancel().await;
        health_task.cancel().await;
        guard.unmount();
        tracing::info!("opstatus stopped");

        Ok(())
    }

    fn spawn_dashboard(&self) {
        let dashboard_port = self.config.dashboard.port;
        let dashboard_state = DashboardState {
            maintenance: Arc::clone(&self.maintenance),
            health: Arc::clone(&self.health),
            notifications: Arc::clone(&self.notifications),
            presenter: self.presenter.clone(),
            session: Arc::clone(&self.session),
        };
        let cancel_for_dashboard = self.cancel.clone();

        tokio::spawn(async move {
            let router = dashboard::build_router(dashboard_state);
            let addr = SocketAddr::from(([0, 0, 0, 0], dashboard_port));
            tracing::info!("Dashboard listening on http://{}", addr);

            let listener = match tokio::net::TcpListener::bind(addr).await {
                Ok(l) => l,
                Err(e) => {
                    tracing::error!(
                        "Failed to bind dashboard to port {}: {}. Continuing without dashboard.",
                        dashboard_port,
                        e
                    );
                    return;
                }
            };

            axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    cancel_for_dashboard.cancelled().await;
                })
                .await
                .ok();

            tracing::debug!("Dashboard stopped");
        });
    }
}
