//! Configuration types for the opstatus service

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::maintenance::DEFAULT_MAINTENANCE_MESSAGE;
use crate::notifications::DEFAULT_DISPLAY_LIMIT;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub maintenance: MaintenanceConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

/// Remote API the subsystem talks to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_health_path")]
    pub health_path: String,
    #[serde(default = "default_notifications_path")]
    pub notifications_path: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl ApiConfig {
    pub fn health_url(&self) -> String {
        join_url(&self.base_url, &self.health_path)
    }

    pub fn notifications_url(&self) -> String {
        join_url(&self.base_url, &self.notifications_path)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            health_path: default_health_path(),
            notifications_path: default_notifications_path(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "default_health_interval")]
    pub health_interval_seconds: u64,
    #[serde(default = "default_notifications_interval")]
    pub notifications_interval_seconds: u64,
}

impl PollingConfig {
    pub fn health_interval(&self) -> Duration {
        Duration::from_secs(self.health_interval_seconds)
    }

    pub fn notifications_interval(&self) -> Duration {
        Duration::from_secs(self.notifications_interval_seconds)
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            health_interval_seconds: default_health_interval(),
            notifications_interval_seconds: default_notifications_interval(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaintenanceConfig {
    #[serde(default = "default_maintenance_message")]
    pub default_message: String,
    #[serde(default)]
    pub contact_email: Option<String>,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            default_message: default_maintenance_message(),
            contact_email: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_display_limit")]
    pub display_limit: usize,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            display_limit: default_display_limit(),
        }
    }
}

/// Dashboard configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_dashboard_port")]
    pub port: u16,
    #[serde(default = "default_login_route")]
    pub login_route: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: default_dashboard_port(),
            login_route: default_login_route(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_health_path() -> String {
    "/health".to_string()
}

fn default_notifications_path() -> String {
    "/api/notifications".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_health_interval() -> u64 {
    10
}

fn default_notifications_interval() -> u64 {
    60
}

fn default_maintenance_message() -> String {
    DEFAULT_MAINTENANCE_MESSAGE.to_string()
}

fn default_display_limit() -> usize {
    DEFAULT_DISPLAY_LIMIT
}

fn default_true() -> bool {
    true
}

fn default_dashboard_port() -> u16 {
    11120
}

fn default_login_route() -> String {
    "/login".to_string()
}

/// Load configuration from a JSON file
pub fn load_config(path: &Path) -> crate::Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        crate::OpStatusError::Config(format!("Failed to read config file {:?}: {}", path, e))
    })?;
    let config: Config = serde_json::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

impl Config {
    /// Reject settings that would spin pollers or hide every notification
    pub fn validate(&self) -> crate::Result<()> {
        if self.api.request_timeout_seconds == 0 {
            return Err(crate::OpStatusError::Config(
                "api.request_timeout_seconds must be greater than 0".to_string(),
            ));
        }
        if self.polling.health_interval_seconds == 0 {
            return Err(crate::OpStatusError::Config(
                "polling.health_interval_seconds must be greater than 0".to_string(),
            ));
        }
        if self.polling.notifications_interval_seconds == 0 {
            return Err(crate::OpStatusError::Config(
                "polling.notifications_interval_seconds must be greater than 0".to_string(),
            ));
        }
        if self.notifications.display_limit == 0 {
            return Err(crate::OpStatusError::Config(
                "notifications.display_limit must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}
