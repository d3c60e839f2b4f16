//! Compact JSON → zlib → standard base64.
//!
//! The encoded form is plain ASCII so it fits a cookie or session field.
//! Object key order survives the round trip (`serde_json` is built with
//! `preserve_order`).

use std::io::{Read, Write};

use base64::Engine;
use flate2::{read::ZlibDecoder, write::ZlibEncoder, Compression};
use serde_json::Value;
use tracing::{debug, warn};

use tollgate_contracts::error::{GateError, GateResult};
use tollgate_core::traits::SnapshotCodec;

/// Upper bound on inflated size accepted by `decode`.
pub const DEFAULT_MAX_DECODED_LEN: usize = 16 * 1024 * 1024;

/// The default snapshot codec.
#[derive(Debug, Clone)]
pub struct CompressedJsonCodec {
    max_encoded_len: Option<usize>,
    max_decoded_len: usize,
}

impl Default for CompressedJsonCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl CompressedJsonCodec {
    pub fn new() -> Self {
        Self {
            max_encoded_len: None,
            max_decoded_len: DEFAULT_MAX_DECODED_LEN,
        }
    }

    /// Refuse to produce encodings longer than `limit` bytes.
    pub fn with_max_encoded_len(mut self, limit: usize) -> Self {
        self.max_encoded_len = Some(limit);
        self
    }

    /// Refuse to inflate more than `limit` bytes when decoding.
    pub fn with_max_decoded_len(mut self, limit: usize) -> Self {
        self.max_decoded_len = limit;
        self
    }
}

impl SnapshotCodec for CompressedJsonCodec {
    fn encode(&self, payload: &Value) -> GateResult<String> {
        let json = serde_json::to_vec(payload).map_err(|e| corrupt("serialize", e))?;

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&json).map_err(|e| corrupt("compress", e))?;
        let compressed = encoder.finish().map_err(|e| corrupt("compress", e))?;

        let encoded = base64::engine::general_purpose::STANDARD.encode(compressed);
        if let Some(limit) = self.max_encoded_len {
            if encoded.len() > limit {
                warn!(size = encoded.len(), limit, "encoded snapshot exceeds limit");
                return Err(GateError::SnapshotTooLarge { size: encoded.len(), limit });
            }
        }

        debug!(json_len = json.len(), encoded_len = encoded.len(), "snapshot encoded");
        Ok(encoded)
    }

    fn decode(&self, encoded: &str) -> GateResult<Value> {
        let compressed = base64::engine::general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|e| corrupt("base64", e))?;

        let mut json = Vec::new();
        let read = ZlibDecoder::new(compressed.as_slice())
            .take(self.max_decoded_len as u64 + 1)
            .read_to_end(&mut json)
            .map_err(|e| corrupt("zlib", e))?;
        if read > self.max_decoded_len {
            return Err(GateError::CorruptSnapshot {
                reason: format!("inflated payload exceeds {} bytes", self.max_decoded_len),
            });
        }

        serde_json::from_slice(&json).map_err(|e| corrupt("json", e))
    }
}

fn corrupt(stage: &str, e: impl std::fmt::Display) -> GateError {
    GateError::CorruptSnapshot {
        reason: format!("{}: {}", stage, e),
    }
}

#[cfg(test)]
mod tests {
    use base64::Engine;
    use serde_json::json;

    use tollgate_contracts::error::GateError;
    use tollgate_core::traits::SnapshotCodec;

    use super::CompressedJsonCodec;

    fn sample() -> serde_json::Value {
        json!({
            "run_id": "run-1",
            "zeta": 1,
            "alpha": [1, 2.5, "three", null, true],
            "nested": { "b": { "deep": [] }, "a": "x" },
            "unicode": "naïve ✓",
        })
    }

    #[test]
    fn round_trip_is_exact() {
        let codec = CompressedJsonCodec::new();
        let payload = sample();
        let decoded = codec.decode(&codec.encode(&payload).unwrap()).unwrap();
        assert_eq!(decoded, payload);
    }

    /// Arbitrary finite doubles, including subnormal and extreme exponents,
    /// come back bit-for-bit.
    #[test]
    fn floats_round_trip_bit_exact() {
        let codec = CompressedJsonCodec::new();
        let mut state: u64 = 0x9E37_79B9_7F4A_7C15;
        let mut checked = 0;
        while checked < 20_000 {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            let f = f64::from_bits(state);
            if !f.is_finite() {
                continue;
            }
            let payload = json!({ "v": f });
            let decoded = codec.decode(&codec.encode(&payload).unwrap()).unwrap();
            let back = decoded["v"].as_f64().unwrap();
            assert_eq!(back.to_bits(), f.to_bits(), "{} came back as {}", f, back);
            checked += 1;
        }
        for f in [1.0715660391465826e-75, 5e-324, f64::MAX, f64::MIN_POSITIVE, 0.1, -2.5e300] {
            let payload = json!({ "v": f });
            assert_eq!(codec.decode(&codec.encode(&payload).unwrap()).unwrap(), payload);
        }
    }

    #[test]
    fn key_order_survives() {
        let codec = CompressedJsonCodec::new();
        let decoded = codec.decode(&codec.encode(&sample()).unwrap()).unwrap();
        let keys: Vec<&str> = decoded.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["run_id", "zeta", "alpha", "nested", "unicode"]);
    }

    #[test]
    fn encoding_is_ascii_and_deterministic() {
        let codec = CompressedJsonCodec::new();
        let a = codec.encode(&sample()).unwrap();
        let b = codec.encode(&sample()).unwrap();
        assert_eq!(a, b);
        assert!(a.is_ascii());
    }

    #[test]
    fn repetitive_payload_compresses() {
        let codec = CompressedJsonCodec::new();
        let payload = json!({ "steps": vec!["restart server db-01"; 200] });
        let encoded = codec.encode(&payload).unwrap();
        assert!(encoded.len() < payload.to_string().len() / 4);
    }

    #[test]
    fn invalid_base64_is_corrupt() {
        let codec = CompressedJsonCodec::new();
        match codec.decode("not-valid-base64!!") {
            Err(GateError::CorruptSnapshot { reason }) => assert!(reason.starts_with("base64")),
            other => panic!("expected CorruptSnapshot, got {:?}", other),
        }
    }

    #[test]
    fn valid_base64_but_not_zlib_is_corrupt() {
        let codec = CompressedJsonCodec::new();
        let bogus = base64::engine::general_purpose::STANDARD.encode(b"plain bytes, no zlib header");
        assert!(matches!(codec.decode(&bogus), Err(GateError::CorruptSnapshot { .. })));
    }

    #[test]
    fn truncated_stream_is_corrupt() {
        let codec = CompressedJsonCodec::new();
        let encoded = codec.encode(&sample()).unwrap();
        let raw = base64::engine::general_purpose::STANDARD.decode(&encoded).unwrap();
        let cut = base64::engine::general_purpose::STANDARD.encode(&raw[..raw.len() / 2]);
        assert!(matches!(codec.decode(&cut), Err(GateError::CorruptSnapshot { .. })));
    }

    #[test]
    fn zlib_of_non_json_is_corrupt() {
        use std::io::Write;
        let mut enc = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        enc.write_all(b"{not json").unwrap();
        let bogus = base64::engine::general_purpose::STANDARD.encode(enc.finish().unwrap());

        let codec = CompressedJsonCodec::new();
        match codec.decode(&bogus) {
            Err(GateError::CorruptSnapshot { reason }) => assert!(reason.starts_with("json")),
            other => panic!("expected CorruptSnapshot, got {:?}", other),
        }
    }

    #[test]
    fn encoded_size_limit() {
        let codec = CompressedJsonCodec::new().with_max_encoded_len(8);
        match codec.encode(&sample()) {
            Err(GateError::SnapshotTooLarge { size, limit }) => {
                assert_eq!(limit, 8);
                assert!(size > 8);
            }
            other => panic!("expected SnapshotTooLarge, got {:?}", other),
        }
    }

    #[test]
    fn decoded_size_limit() {
        let big = CompressedJsonCodec::new();
        let encoded = big.encode(&json!({ "pad": "x".repeat(4096) })).unwrap();
        let small = CompressedJsonCodec::new().with_max_decoded_len(1024);
        assert!(matches!(small.decode(&encoded), Err(GateError::CorruptSnapshot { .. })));
        assert!(big.decode(&encoded).is_ok());
    }
}
