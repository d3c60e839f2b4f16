//! In-memory implementation of `SnapshotStore`.
//!
//! Holds one encoded snapshot per key (typically a session or run id) behind
//! a `Mutex`. Stands in for the size-constrained session field a web
//! transport would use between turns.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use tracing::debug;

use tollgate_contracts::error::{GateError, GateResult};
use tollgate_core::traits::SnapshotStore;

/// A process-local snapshot store.
///
/// Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct InMemorySnapshotStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
    max_value_len: Option<usize>,
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse values longer than `limit` bytes, like a cookie-backed session.
    pub fn with_max_value_len(mut self, limit: usize) -> Self {
        self.max_value_len = Some(limit);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SnapshotStore for InMemorySnapshotStore {
    fn put(&self, key: &str, encoded: String) -> GateResult<()> {
        if let Some(limit) = self.max_value_len {
            if encoded.len() > limit {
                return Err(GateError::SnapshotTooLarge { size: encoded.len(), limit });
            }
        }
        debug!(key = %key, len = encoded.len(), "snapshot stored");
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), encoded);
        Ok(())
    }

    fn get(&self, key: &str) -> GateResult<Option<String>> {
        Ok(self
            .entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned())
    }

    fn remove(&self, key: &str) -> GateResult<Option<String>> {
        let removed = self
            .entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(key);
        if removed.is_some() {
            debug!(key = %key, "snapshot removed");
        }
        Ok(removed)
    }
}
