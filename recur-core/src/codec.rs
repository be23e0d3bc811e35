use crate::error::RecurError;
use crate::model::Call;

/// The argument/return serializer and memo_key fingerprinter.
///
/// The codec is the only component in this runtime permitted to inspect
/// argument structure — the [`crate::memory::Memory`] facade and worker
/// loop move everything else as opaque bytes. Internal records (call
/// payloads, pending-returns) use a fixed internal wire format
/// (bencode, see `recur-core::records`) independent of whatever codec is
/// plugged in here.
///
/// Unlike `Store` and `Queue`, codec operations are pure computations —
/// fingerprinting and (de)serialization never need to suspend — so this
/// trait is not `async`.
pub trait Codec: Send + Sync + 'static {
    /// Build a `Call` for `(task_name, args)`. Must be deterministic:
    /// logically equal arguments (e.g. the same JSON object with keys in
    /// a different order) must fingerprint to the same `memo_key`.
    fn create_call(&self, task_name: &str, args: &serde_json::Value) -> Result<Call, RecurError>;

    /// Serialize the arguments portion of a call for storage in its
    /// call-payload record.
    fn encode_call(&self, args: &serde_json::Value) -> Result<Vec<u8>, RecurError>;

    /// The inverse of [`Codec::encode_call`] — reconstructs a call's
    /// arguments from its stored payload bytes, ahead of handler
    /// invocation.
    fn decode_call_args(&self, bytes: &[u8]) -> Result<serde_json::Value, RecurError>;

    /// Encode a handler's return value for storage in its value record.
    fn encode_return(&self, value: &serde_json::Value) -> Result<Vec<u8>, RecurError>;

    /// Decode a stored value record back into a return value, used both
    /// by a parent reading a child's completed value and by `read`.
    fn decode_return(&self, bytes: &[u8]) -> Result<serde_json::Value, RecurError>;
}
