//! Audit entry and log types.
//!
//! `AuditEntry` is one link in the hash chain: a lifecycle `Event` plus its
//! position and the hashes that make tampering detectable. `AuditLog` is the
//! exported form of a whole stream.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tollgate_contracts::event::Event;

/// A single entry in the SHA-256 hash chain for one stream.
///
/// Changing any field, including the embedded event's data, invalidates
/// `this_hash` and every later `prev_hash`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Position in the chain, starting at 0.
    pub sequence: u64,

    /// The stream (conversation or run) this entry belongs to.
    pub stream_id: String,

    /// The lifecycle event as it was dispatched.
    pub event: Event,

    /// Hash of the previous entry, or `GENESIS_HASH` for the first.
    pub prev_hash: String,

    /// SHA-256 (hex) over stream id, sequence, prev hash and the event JSON.
    pub this_hash: String,
}

impl AuditEntry {
    /// `prev_hash` of the first entry in every chain: 64 hex zeros.
    pub const GENESIS_HASH: &'static str =
        "0000000000000000000000000000000000000000000000000000000000000000";
}

/// Every entry of one stream, as exported.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLog {
    pub stream_id: String,

    /// Entries in chain order.
    pub entries: Vec<AuditEntry>,

    pub exported_at: DateTime<Utc>,

    /// `this_hash` of the last entry; empty if there are none.
    pub terminal_hash: String,
}

impl AuditLog {
    /// Event types in chain order.
    pub fn event_types(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.event.event_type.as_str()).collect()
    }
}
