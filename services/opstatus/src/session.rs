//! Local session markers

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Key holding the bearer token of the signed-in user
pub const AUTH_TOKEN_KEY: &str = "auth_token";
/// Key holding the serialized signed-in user
pub const CURRENT_USER_KEY: &str = "current_user";

/// Key/value store holding the client's session markers
#[cfg_attr(test, mockall::automock)]
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: &str) -> crate::Result<()>;

    fn remove(&self, key: &str) -> crate::Result<()>;
}

/// Remove every session marker, signing the user out locally
pub fn clear_session(store: &dyn SessionStore) -> crate::Result<()> {
    for key in [AUTH_TOKEN_KEY, CURRENT_USER_KEY] {
        store.remove(key)?;
    }
    tracing::debug!("Session markers cleared");
    Ok(())
}

/// Process-local session store
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) -> crate::Result<()> {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> crate::Result<()> {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}
