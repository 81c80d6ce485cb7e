//! Durable key-value persistence.
//!
//! The storage medium is an external collaborator: the core only relies on
//! load-at-init and save-on-mutation semantics. Saves are best-effort; a
//! failed write is logged and swallowed, the in-memory state stays
//! authoritative for the session.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::RwLock;
use thiserror::Error;
use tracing::warn;

/// Well-known store keys.
pub const KEY_ORDERS: &str = "orders";
pub const KEY_OPEN_ORDERS: &str = "open_orders";
pub const KEY_WATCHLIST: &str = "watchlist";
pub const KEY_COIN_LEDGER: &str = "coin_ledger";
pub const KEY_WIDGET_PRICES: &str = "widget_prices";
pub const KEY_WIDGET_HISTORY: &str = "widget_history";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Key → JSON document store. Implementations must be safe to share across
/// the feed and stats tasks.
pub trait StateStore: Send + Sync {
    fn get_raw(&self, key: &str) -> Option<String>;
    fn put_raw(&self, key: &str, value: String) -> Result<(), StoreError>;
}

/// Load a typed value, treating a missing key or a decode failure the same
/// way: start fresh.
pub fn load<T: DeserializeOwned>(store: &dyn StateStore, key: &str) -> Option<T> {
    let raw = store.get_raw(key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(key, error = %e, "Discarding undecodable persisted state");
            None
        }
    }
}

/// Save a typed value, best-effort.
pub fn save<T: Serialize>(store: &dyn StateStore, key: &str, value: &T) {
    let raw = match serde_json::to_string_pretty(value) {
        Ok(raw) => raw,
        Err(e) => {
            warn!(key, error = %e, "Failed to encode state, skipping save");
            return;
        }
    };
    if let Err(e) = store.put_raw(key, raw) {
        warn!(key, error = %e, "Failed to persist state");
    }
}

/// One JSON file per key under a data directory.
pub struct JsonFileStore {
    data_dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir)?;
        Ok(Self { data_dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.data_dir.join(format!("{key}.json"))
    }
}

impl StateStore for JsonFileStore {
    fn get_raw(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.path_for(key)).ok()
    }

    fn put_raw(&self, key: &str, value: String) -> Result<(), StoreError> {
        fs::write(self.path_for(key), value)?;
        Ok(())
    }
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStore {
    fn get_raw(&self, key: &str) -> Option<String> {
        self.entries.read().unwrap().get(key).cloned()
    }

    fn put_raw(&self, key: &str, value: String) -> Result<(), StoreError> {
        self.entries.write().unwrap().insert(key.to_string(), value);
        Ok(())
    }
}
