//! # tollgate-snapshot
//!
//! Storage for runs suspended at an approval point.
//!
//! - [`CompressedJsonCodec`] implements
//!   [`SnapshotCodec`](tollgate_core::traits::SnapshotCodec): compact JSON,
//!   zlib, then standard base64.
//! - [`InMemorySnapshotStore`] implements
//!   [`SnapshotStore`](tollgate_core::traits::SnapshotStore) with an optional
//!   per-value size limit.
//!
//! ```rust,ignore
//! use tollgate_snapshot::{CompressedJsonCodec, InMemorySnapshotStore};
//!
//! let codec = CompressedJsonCodec::new().with_max_encoded_len(4096);
//! let encoded = codec.encode(&payload)?;
//! store.put(&session_id, encoded)?;
//! ```

pub mod codec;
pub mod store;

pub use codec::CompressedJsonCodec;
pub use store::InMemorySnapshotStore;

#[cfg(test)]
mod tests {
    use serde_json::json;

    use tollgate_core::traits::{SnapshotCodec, SnapshotStore};

    use super::{CompressedJsonCodec, InMemorySnapshotStore};

    /// Codec and store together: what a session-backed transport does
    /// between two turns.
    #[test]
    fn payload_survives_a_session_round_trip() {
        let codec = CompressedJsonCodec::new();
        let store = InMemorySnapshotStore::new().with_max_value_len(4096);
        let payload = json!({
            "run_id": "run-9",
            "requirements": [{ "id": "r1", "tool_name": "server_restart", "confirmed": null }],
        });

        store.put("session-1", codec.encode(&payload).unwrap()).unwrap();
        let stored = store.get("session-1").unwrap().unwrap();

        assert_eq!(codec.decode(&stored).unwrap(), payload);
    }
}
