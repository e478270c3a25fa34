//! Status dashboard with JSON API endpoints and a server-rendered page

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use crate::health::{HealthProbe, HealthStatus};
use crate::maintenance::MaintenanceHandle;
use crate::notifications::{NotificationId, NotificationPoller};
use crate::presentation::{escape_html, MaintenancePresenter};
use crate::session::SessionStore;

/// Dashboard application state
#[derive(Clone)]
pub struct DashboardState {
    pub maintenance: MaintenanceHandle,
    pub health: Arc<HealthProbe>,
    pub notifications: Arc<NotificationPoller>,
    pub presenter: MaintenancePresenter,
    pub session: Arc<dyn SessionStore>,
}

/// Build the dashboard axum router
pub fn build_router(state: DashboardState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index_handler))
        .route("/api/maintenance", get(maintenance_handler))
        .route("/api/health", get(health_status_handler))
        .route("/api/notifications", get(notifications_handler))
        .route("/api/notifications/read-all", post(read_all_handler))
        .route("/api/notifications/{id}/read", post(read_handler))
        .route("/maintenance/return-to-login", post(return_to_login_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .with_state(state)
}

fn health_badge(status: &HealthStatus) -> String {
    let (color, bg) = match status {
        HealthStatus::Online(_) => ("#155724", "#d4edda"),
        HealthStatus::Offline { .. } => ("#721c24", "#f8d7da"),
        HealthStatus::Checking => ("#383d41", "#e2e3e5"),
    };
    let detail = match status {
        HealthStatus::Online(snapshot) => format!(
            " {} v{}",
            escape_html(&snapshot.service),
            escape_html(&snapshot.version)
        ),
        _ => String::new(),
    };
    format!(
        r#"<span id="health-badge" style="display: inline-block; padding: 0.25em 0.6em; border-radius: 0.25rem; font-size: 0.85em; font-weight: 600; color: {}; background-color: {};">{}</span><span id="health-service">{}</span>"#,
        color, bg, status, detail
    )
}

async fn index_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    let health = dashboard.health.current();
    let view = dashboard.notifications.view();
    let overlay = dashboard
        .presenter
        .render(&dashboard.maintenance.current())
        .map(|o| o.to_html())
        .unwrap_or_default();

    let notification_rows: String = view
        .items
        .iter()
        .map(|n| {
            let weight = if n.is_read { "normal" } else { "600" };
            let message = match &n.link_url {
                Some(link) => format!(
                    r#"<a href="{}">{}</a>"#,
                    escape_html(link),
                    escape_html(&n.message)
                ),
                None => escape_html(&n.message),
            };
            format!(
                r#"<tr style="border-bottom: 1px solid #dee2e6; font-weight: {};">
                    <td style="padding: 0.5rem;">{}</td>
                    <td style="padding: 0.5rem;">{}</td>
                    <td style="padding: 0.5rem;">
                        <button type="button" data-id="{}" onclick="markRead(this.dataset.id)">Mark read</button>
                    </td>
                </tr>"#,
                weight,
                message,
                escape_html(&n.created_at),
                escape_html(n.id.as_str())
            )
        })
        .collect();

    let more = view
        .more_label()
        .map(|label| format!(r#"<p id="notifications-more">{}</p>"#, label))
        .unwrap_or_default();

    let html = format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>Operational Status</title>
    <script>
        function refreshData() {{
            fetch('/api/maintenance')
                .then(r => r.json())
                .then(data => {{
                    const overlay = document.getElementById('maintenance-overlay');
                    if (overlay && !data.active) {{ overlay.remove(); }}
                    if (!overlay && data.active) {{ location.reload(); }}
                }});
            fetch('/api/health')
                .then(r => r.json())
                .then(data => {{
                    const labels = {{ online: 'Online', offline: 'Offline', checking: 'Checking' }};
                    document.getElementById('health-badge').textContent = labels[data.state] || 'Checking';
                }});
        }}
        function markRead(id) {{
            fetch('/api/notifications/' + encodeURIComponent(id) + '/read', {{ method: 'POST' }})
                .then(() => location.reload());
        }}
        function markAllRead() {{
            fetch('/api/notifications/read-all', {{ method: 'POST' }})
                .then(() => location.reload());
        }}
        setInterval(refreshData, 5000);
    </script>
</head>
<body style="font-family: system-ui, sans-serif; max-width: 960px; margin: 0 auto; padding: 1rem;">
    <h1>Operational Status</h1>
    <section>
        <h2>Backend</h2>
        {health_badge}
    </section>
    <section>
        <h2>Notifications <span id="unread-count">{unread}</span></h2>
        <button type="button" id="mark-all-read" onclick="markAllRead()">Mark all read</button>
        <table style="width: 100%; border-collapse: collapse;">
            <thead>
                <tr style="border-bottom: 2px solid #dee2e6;">
                    <th style="padding: 0.5rem; text-align: left;">Message</th>
                    <th style="padding: 0.5rem; text-align: left;">Received</th>
                    <th style="padding: 0.5rem; text-align: left;"></th>
                </tr>
            </thead>
            <tbody id="notification-body">{notification_rows}</tbody>
        </table>
        {more}
    </section>
    {overlay}
</body>
</html>"#,
        health_badge = health_badge(&health),
        unread = view.unread_count,
        notification_rows = notification_rows,
        more = more,
        overlay = overlay,
    );

    Html(html)
}

async fn maintenance_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    axum::Json(dashboard.maintenance.current())
}

async fn health_status_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    axum::Json(dashboard.health.current())
}

async fn notifications_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    let view = dashboard.notifications.view();
    axum::Json(serde_json::json!({
        "items": view.items,
        "unread_count": view.unread_count,
        "hidden_count": view.hidden_count,
        "more_label": view.more_label(),
    }))
}

async fn read_handler(
    State(dashboard): State<DashboardState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let success = dashboard
        .notifications
        .acknowledge(&NotificationId::new(id))
        .await;
    axum::Json(serde_json::json!({
        "success": success,
        "unread_count": dashboard.notifications.unread_count(),
    }))
}

async fn read_all_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    let acknowledged = dashboard.notifications.acknowledge_all().await;
    axum::Json(serde_json::json!({
        "acknowledged": acknowledged,
        "unread_count": dashboard.notifications.unread_count(),
    }))
}

async fn return_to_login_handler(State(dashboard): State<DashboardState>) -> Response {
    match dashboard
        .presenter
        .return_to_login(dashboard.session.as_ref())
    {
        Ok(route) => Redirect::to(route).into_response(),
        Err(e) => {
            tracing::error!("Failed to clear session: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

async fn health_handler() -> impl IntoResponse {
    "OK"
}
