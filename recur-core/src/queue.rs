use async_trait::async_trait;

use crate::error::RecurError;

/// A message pulled off the [`Queue`]: its body (a memo_key) and an
/// opaque receipt used to acknowledge or extend it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueMessage {
    pub body: String,
    pub receipt: String,
}

/// Best-effort, non-authoritative queue metrics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueInfo {
    pub num_messages: u64,
    pub num_inflight: u64,
}

/// The (possibly lossy, possibly duplicating) at-least-once
/// message-delivery backend that drives the worker loop.
///
/// No ordering or exactly-once delivery is required of implementations —
/// the runtime tolerates duplicate and reordered messages by construction
/// (write-once values, CAS'd pending-returns, idempotent handlers).
#[async_trait]
pub trait Queue: Send + Sync + 'static {
    /// Enqueue a message whose body is the memo_key of the call to run.
    /// Idempotent from the caller's perspective — duplicate puts are
    /// allowed; deduping them is the caller's responsibility.
    async fn put(&self, body: &str) -> Result<(), RecurError>;

    /// Pull the next available message. Fails with
    /// [`RecurError::QueueIsEmpty`] when nothing is available right now,
    /// or [`RecurError::QueueIsClosed`] once the queue has been
    /// terminated (test shutdown). May block up to a backend-defined
    /// short interval.
    async fn get_message(&self) -> Result<QueueMessage, RecurError>;

    /// Acknowledge completion of a message. Idempotent.
    async fn delete_message(&self, receipt: &str) -> Result<(), RecurError>;

    /// Extend a message's visibility window. Optional — backends that
    /// don't support visibility timeouts may leave this a no-op.
    async fn set_message_timeout(&self, _receipt: &str, _seconds: u64) -> Result<(), RecurError> {
        Ok(())
    }

    /// Best-effort observational metrics.
    async fn get_info(&self) -> Result<QueueInfo, RecurError> {
        Ok(QueueInfo::default())
    }
}
