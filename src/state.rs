//! Per-conversation key/value state.
//!
//! Keys use typed prefixes for scoping, matching the hosting platform's
//! convention:
//!
//! - `app:` - application-wide state
//! - `user:` - user-scoped state
//! - `temp:` - transient data, cleared at each turn boundary

use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

pub const KEY_PREFIX_APP: &str = "app:";
pub const KEY_PREFIX_TEMP: &str = "temp:";
pub const KEY_PREFIX_USER: &str = "user:";

/// Shared, mutable session state. Cheap to clone; all clones observe the
/// same underlying map.
#[derive(Clone, Default)]
pub struct SessionState {
    inner: Arc<RwLock<HashMap<String, Value>>>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner.read().expect("session state lock poisoned").get(key).cloned()
    }

    pub fn set(&self, key: impl Into<String>, value: Value) {
        self.inner.write().expect("session state lock poisoned").insert(key.into(), value);
    }

    pub fn all(&self) -> HashMap<String, Value> {
        self.inner.read().expect("session state lock poisoned").clone()
    }

    /// Drops all `temp:`-prefixed keys. Called at turn boundaries, mirroring
    /// how the hosting platform scopes transient state to one execution chain.
    pub fn clear_temp(&self) {
        self.inner
            .write()
            .expect("session state lock poisoned")
            .retain(|key, _| !key.starts_with(KEY_PREFIX_TEMP));
    }
}
