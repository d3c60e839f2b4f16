//! In-memory audit writer.
//!
//! `InMemoryAuditWriter` keeps its chain in a `Vec` behind a `Mutex` and
//! implements `EventHandler`, so it is attached by subscribing it to an
//! `EventRegistry` (usually under the wildcard).
//!
//! Use `export_log()` once the stream is done and `verify_integrity()` at any
//! time to confirm the chain has not been altered in memory.

use std::sync::{Arc, Mutex};

use chrono::Utc;
use tracing::{debug, info};

use tollgate_contracts::{
    error::{GateError, GateResult},
    event::Event,
};
use tollgate_core::traits::EventHandler;

use crate::{
    chain::{hash_entry, verify_chain},
    entry::{AuditEntry, AuditLog},
};

// ── Internal mutable state ────────────────────────────────────────────────────

pub(crate) struct InMemoryState {
    /// Entries in append order.
    pub(crate) entries: Vec<AuditEntry>,

    /// Sequence number for the next entry.
    pub(crate) sequence: u64,

    /// `this_hash` of the last entry, or `GENESIS_HASH`.
    pub(crate) last_hash: String,
}

// ── Public writer ─────────────────────────────────────────────────────────────

/// An append-only audit writer backed by a SHA-256 hash chain.
///
/// Clones share one chain, so a clone can be handed to the registry while
/// the original is kept for export.
#[derive(Clone)]
pub struct InMemoryAuditWriter {
    stream_id: String,
    pub(crate) state: Arc<Mutex<InMemoryState>>,
}

impl InMemoryAuditWriter {
    pub fn new(stream_id: impl Into<String>) -> Self {
        let state = InMemoryState {
            entries: Vec::new(),
            sequence: 0,
            last_hash: AuditEntry::GENESIS_HASH.to_string(),
        };
        Self {
            stream_id: stream_id.into(),
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn stream_id(&self) -> &str {
        &self.stream_id
    }

    /// Append one event to the chain.
    pub fn record(&self, event: &Event) -> GateResult<()> {
        let mut state = self.state.lock().map_err(|e| GateError::AuditWriteFailed {
            reason: format!("audit state lock poisoned: {}", e),
        })?;

        let prev_hash = state.last_hash.clone();
        let sequence = state.sequence;
        let this_hash = hash_entry(&self.stream_id, sequence, event, &prev_hash)?;

        debug!(
            stream_id = %self.stream_id,
            sequence,
            event_type = %event.event_type,
            "audit entry appended"
        );

        state.entries.push(AuditEntry {
            sequence,
            stream_id: self.stream_id.clone(),
            event: event.clone(),
            prev_hash,
            this_hash: this_hash.clone(),
        });
        state.sequence += 1;
        state.last_hash = this_hash;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every entry written so far.
    pub fn export_log(&self) -> AuditLog {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let terminal_hash = state
            .entries
            .last()
            .map(|e| e.this_hash.clone())
            .unwrap_or_default();

        AuditLog {
            stream_id: self.stream_id.clone(),
            entries: state.entries.clone(),
            exported_at: Utc::now(),
            terminal_hash,
        }
    }

    pub fn verify_integrity(&self) -> bool {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        verify_chain(&state.entries)
    }

    /// Log the stream's terminal hash. Nothing to flush in memory.
    pub fn finalize(&self) -> GateResult<String> {
        let state = self.state.lock().map_err(|e| GateError::AuditWriteFailed {
            reason: format!("audit state lock poisoned: {}", e),
        })?;
        info!(
            stream_id = %self.stream_id,
            entry_count = state.entries.len(),
            terminal_hash = %state.last_hash,
            "audit log finalized"
        );
        Ok(state.last_hash.clone())
    }
}

// ── EventHandler impl ─────────────────────────────────────────────────────────

impl EventHandler for InMemoryAuditWriter {
    fn handle(&self, event: &Event) -> GateResult<()> {
        self.record(event)
    }
}
