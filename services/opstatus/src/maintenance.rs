//! Maintenance state store
//!
//! Process-wide record of whether the backend has announced a maintenance
//! window. Created when the application root mounts and dropped when it
//! unmounts; never persisted.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// Fallback text shown when a maintenance signal carries no message
pub const DEFAULT_MAINTENANCE_MESSAGE: &str =
    "The system is currently undergoing maintenance. Please try again later.";

/// Whether maintenance mode is active, and with which message
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "MaintenanceStatus", from = "MaintenanceStatus")]
pub enum MaintenanceState {
    #[default]
    Inactive,
    Active {
        message: String,
    },
}

impl MaintenanceState {
    pub fn is_active(&self) -> bool {
        matches!(self, MaintenanceState::Active { .. })
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            MaintenanceState::Active { message } => Some(message),
            MaintenanceState::Inactive => None,
        }
    }
}

/// Wire shape of [`MaintenanceState`] as served by the dashboard API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaintenanceStatus {
    pub active: bool,
    pub message: Option<String>,
}

impl From<MaintenanceState> for MaintenanceStatus {
    fn from(state: MaintenanceState) -> Self {
        match state {
            MaintenanceState::Inactive => Self {
                active: false,
                message: None,
            },
            MaintenanceState::Active { message } => Self {
                active: true,
                message: Some(message),
            },
        }
    }
}

impl From<MaintenanceStatus> for MaintenanceState {
    fn from(status: MaintenanceStatus) -> Self {
        if status.active {
            MaintenanceState::Active {
                message: status.message.unwrap_or_default(),
            }
        } else {
            MaintenanceState::Inactive
        }
    }
}

/// Two-operation state machine over [`MaintenanceState`]
///
/// Subscribers only observe real transitions: repeating `enter` with the
/// current message, or calling `exit` while inactive, does not wake them.
#[derive(Debug)]
pub struct MaintenanceStore {
    tx: watch::Sender<MaintenanceState>,
    default_message: String,
}

/// Shared store handle
pub type MaintenanceHandle = Arc<MaintenanceStore>;

impl MaintenanceStore {
    pub fn new(default_message: impl Into<String>) -> Self {
        let (tx, _rx) = watch::channel(MaintenanceState::Inactive);
        Self {
            tx,
            default_message: default_message.into(),
        }
    }

    /// Enter (or stay in) maintenance mode. Returns true if the state changed.
    pub fn enter(&self, message: Option<String>) -> bool {
        let message = message.unwrap_or_else(|| self.default_message.clone());
        let changed = self.tx.send_if_modified(|state| match state {
            MaintenanceState::Active { message: current } if *current == message => false,
            _ => {
                *state = MaintenanceState::Active { message };
                true
            }
        });
        if changed {
            tracing::info!(
                "Maintenance mode entered: {}",
                self.tx.borrow().message().unwrap_or_default()
            );
        }
        changed
    }

    /// Leave maintenance mode. Returns true if the state changed.
    pub fn exit(&self) -> bool {
        let changed = self.tx.send_if_modified(|state| {
            if state.is_active() {
                *state = MaintenanceState::Inactive;
                true
            } else {
                false
            }
        });
        if changed {
            tracing::info!("Maintenance mode cleared");
        }
        changed
    }

    pub fn current(&self) -> MaintenanceState {
        self.tx.borrow().clone()
    }

    pub fn is_active(&self) -> bool {
        self.tx.borrow().is_active()
    }

    /// Observe state transitions
    pub fn subscribe(&self) -> watch::Receiver<MaintenanceState> {
        self.tx.subscribe()
    }

    pub fn default_message(&self) -> &str {
        &self.default_message
    }
}

impl Default for MaintenanceStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAINTENANCE_MESSAGE)
    }
}

pub fn new_maintenance_handle(default_message: impl Into<String>) -> MaintenanceHandle {
    Arc::new(MaintenanceStore::new(default_message))
}
