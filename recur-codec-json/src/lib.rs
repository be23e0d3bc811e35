//! The reference [`Codec`]: arguments and return values travel as plain
//! JSON, and a call's memo_key is the hex SHA-256 digest of
//! `task_name` and its canonical JSON encoding.
//!
//! `serde_json::Value`'s object representation (a `BTreeMap` under the
//! hood, since this workspace does not enable the `preserve_order`
//! feature) already sorts object keys, so encoding a `Value` to bytes
//! is deterministic regardless of the order keys were inserted in —
//! exactly the property the memo_key fingerprint needs.

use recur_core::{Call, Codec, RecurError};
use sha2::{Digest, Sha256};

#[derive(Debug, Default, Clone, Copy)]
pub struct JsonCodec;

impl JsonCodec {
    pub fn new() -> Self {
        Self
    }

    fn fingerprint(task_name: &str, args: &serde_json::Value) -> Result<String, RecurError> {
        let canonical =
            serde_json::to_vec(args).map_err(|e| RecurError::Codec(e.to_string()))?;
        let mut hasher = Sha256::new();
        hasher.update(task_name.as_bytes());
        hasher.update([0u8]);
        hasher.update(&canonical);
        Ok(hex_encode(&hasher.finalize()))
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    use std::fmt::Write;
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        write!(s, "{b:02x}").expect("writing to a String never fails");
    }
    s
}

impl Codec for JsonCodec {
    fn create_call(&self, task_name: &str, args: &serde_json::Value) -> Result<Call, RecurError> {
        let memo_key = Self::fingerprint(task_name, args)?;
        Ok(Call::new(task_name, args.clone(), memo_key))
    }

    fn encode_call(&self, args: &serde_json::Value) -> Result<Vec<u8>, RecurError> {
        serde_json::to_vec(args).map_err(|e| RecurError::Codec(e.to_string()))
    }

    fn decode_call_args(&self, bytes: &[u8]) -> Result<serde_json::Value, RecurError> {
        serde_json::from_slice(bytes).map_err(|e| RecurError::Codec(e.to_string()))
    }

    fn encode_return(&self, value: &serde_json::Value) -> Result<Vec<u8>, RecurError> {
        serde_json::to_vec(value).map_err(|e| RecurError::Codec(e.to_string()))
    }

    fn decode_return(&self, bytes: &[u8]) -> Result<serde_json::Value, RecurError> {
        serde_json::from_slice(bytes).map_err(|e| RecurError::Codec(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn memo_key_is_independent_of_object_key_order() {
        let codec = JsonCodec::new();
        let a = codec.create_call("fib", &json!({"n": 10, "step": 1})).unwrap();
        let b = codec.create_call("fib", &json!({"step": 1, "n": 10})).unwrap();
        assert_eq!(a.memo_key, b.memo_key);
    }

    #[test]
    fn memo_key_distinguishes_task_name() {
        let codec = JsonCodec::new();
        let a = codec.create_call("fib", &json!({"n": 10})).unwrap();
        let b = codec.create_call("fob", &json!({"n": 10})).unwrap();
        assert_ne!(a.memo_key, b.memo_key);
    }

    #[test]
    fn memo_key_distinguishes_args() {
        let codec = JsonCodec::new();
        let a = codec.create_call("fib", &json!({"n": 10})).unwrap();
        let b = codec.create_call("fib", &json!({"n": 11})).unwrap();
        assert_ne!(a.memo_key, b.memo_key);
    }

    #[test]
    fn encode_decode_round_trips_arguments() {
        let codec = JsonCodec::new();
        let args = json!({"n": 10, "nested": {"a": [1,2,3]}});
        let bytes = codec.encode_call(&args).unwrap();
        let decoded = codec.decode_call_args(&bytes).unwrap();
        assert_eq!(args, decoded);
    }

    #[test]
    fn encode_decode_round_trips_return_values() {
        let codec = JsonCodec::new();
        let value = json!(55);
        let bytes = codec.encode_return(&value).unwrap();
        let decoded = codec.decode_return(&bytes).unwrap();
        assert_eq!(value, decoded);
    }
}
