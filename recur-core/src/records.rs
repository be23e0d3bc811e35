//! The fixed internal wire format for call-payload and pending-returns
//! records (bencode, per the store schema in the design doc) — entirely
//! independent of whatever [`crate::codec::Codec`] a caller plugs in for
//! task arguments and return values.

use serde::{Deserialize, Serialize};
use serde_bytes::ByteBuf;

use crate::error::RecurError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct CallRecord {
    pub task_name: String,
    pub task_args: ByteBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct PendingReturnsRecord {
    /// UNIX-seconds timestamp of the last (re)enqueue, or `-1` for
    /// "nothing scheduled yet". An age stamp only — never an ordering
    /// token.
    pub scheduled_at: i64,
    /// Sorted, deduplicated parent memo_keys waiting on this call.
    pub returns: Vec<String>,
}

impl PendingReturnsRecord {
    pub fn new_unscheduled(first_parent: &str) -> Self {
        Self {
            scheduled_at: -1,
            returns: vec![first_parent.to_string()],
        }
    }

    pub fn is_unscheduled(&self) -> bool {
        self.scheduled_at < 0
    }

    /// Adds `parent` if not already present. Returns whether the set
    /// changed.
    pub fn add_parent(&mut self, parent: &str) -> bool {
        if self.returns.iter().any(|p| p == parent) {
            return false;
        }
        self.returns.push(parent.to_string());
        self.returns.sort();
        true
    }
}

pub(crate) fn encode_call_record(record: &CallRecord) -> Result<Vec<u8>, RecurError> {
    serde_bencode::to_bytes(record).map_err(|e| RecurError::Codec(format!("bencode encode: {e}")))
}

pub(crate) fn decode_call_record(bytes: &[u8]) -> Result<CallRecord, RecurError> {
    serde_bencode::from_bytes(bytes).map_err(|e| RecurError::Codec(format!("bencode decode: {e}")))
}

pub(crate) fn encode_pending_returns(record: &PendingReturnsRecord) -> Result<Vec<u8>, RecurError> {
    serde_bencode::to_bytes(record).map_err(|e| RecurError::Codec(format!("bencode encode: {e}")))
}

pub(crate) fn decode_pending_returns(bytes: &[u8]) -> Result<PendingReturnsRecord, RecurError> {
    serde_bencode::from_bytes(bytes).map_err(|e| RecurError::Codec(format!("bencode decode: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn call_record_round_trips() {
        let record = CallRecord {
            task_name: "fib".to_string(),
            task_args: ByteBuf::from(br#"{"n":10}"#.to_vec()),
        };
        let bytes = encode_call_record(&record).unwrap();
        let decoded = decode_call_record(&bytes).unwrap();
        assert_eq!(decoded.task_name, "fib");
        assert_eq!(decoded.task_args.as_slice(), br#"{"n":10}"#);
    }

    #[test]
    fn pending_returns_round_trips_and_sorts_parents() {
        let mut record = PendingReturnsRecord::new_unscheduled("p2");
        assert!(record.is_unscheduled());
        assert!(record.add_parent("p1"));
        assert!(!record.add_parent("p1"), "adding an existing parent is a no-op");
        record.scheduled_at = 1_700_000_000;

        let bytes = encode_pending_returns(&record).unwrap();
        let decoded = decode_pending_returns(&bytes).unwrap();
        assert_eq!(decoded.returns, vec!["p1".to_string(), "p2".to_string()]);
        assert_eq!(decoded.scheduled_at, 1_700_000_000);
        assert!(!decoded.is_unscheduled());
    }

    #[test]
    fn null_scheduled_at_encodes_as_negative_one() {
        let record = PendingReturnsRecord::new_unscheduled("p1");
        assert_eq!(record.scheduled_at, -1);
    }
}
