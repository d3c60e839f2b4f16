//! Hash-chain primitives: hashing and chain integrity verification.
//!
//! Hash input layout (bytes, in order):
//!   1. stream_id as UTF-8 bytes
//!   2. sequence as 8-byte little-endian
//!   3. prev_hash as UTF-8 bytes (64 ASCII hex chars)
//!   4. compact JSON of the event

use sha2::{Digest, Sha256};

use tollgate_contracts::{
    error::{GateError, GateResult},
    event::Event,
};

use crate::entry::AuditEntry;

/// Compute the SHA-256 hash for one entry. Returns lowercase hex.
pub fn hash_entry(stream_id: &str, sequence: u64, event: &Event, prev_hash: &str) -> GateResult<String> {
    let event_json = serde_json::to_vec(event).map_err(|e| GateError::AuditWriteFailed {
        reason: format!("event '{}' could not be serialized: {}", event.event_type, e),
    })?;

    let mut hasher = Sha256::new();
    hasher.update(stream_id.as_bytes());
    hasher.update(sequence.to_le_bytes());
    hasher.update(prev_hash.as_bytes());
    hasher.update(&event_json);

    Ok(hex::encode(hasher.finalize()))
}

/// Verify the integrity of a hash chain.
///
/// Valid when every entry's `prev_hash` is the previous entry's `this_hash`
/// (`GENESIS_HASH` for the first), every `sequence` equals its position, and
/// every `this_hash` matches the recomputed value. An empty chain is valid.
pub fn verify_chain(entries: &[AuditEntry]) -> bool {
    let mut expected_prev: &str = AuditEntry::GENESIS_HASH;

    for (position, entry) in entries.iter().enumerate() {
        if entry.prev_hash != expected_prev || entry.sequence != position as u64 {
            return false;
        }

        match hash_entry(&entry.stream_id, entry.sequence, &entry.event, &entry.prev_hash) {
            Ok(recomputed) if recomputed == entry.this_hash => {}
            _ => return false,
        }

        expected_prev = entry.this_hash.as_str();
    }

    true
}
