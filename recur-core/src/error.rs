use thiserror::Error;

use crate::model::Call;

/// Unified error type for the deferred-execution runtime.
///
/// Mirrors the teacher codebase's habit of folding every subsystem's
/// failure modes into one `thiserror` enum rather than threading a web of
/// per-module error types through the call graph. `Defer` is the one
/// variant that is not a fault at all — see [`RecurError::Defer`].
#[derive(Debug, Error)]
pub enum RecurError {
    /// A required key was absent from the store (`Store::get`, `read`).
    #[error("key not found")]
    NotFound,

    /// A compare-and-swap failed against the backend's current value.
    ///
    /// Never escapes [`crate::memory::Memory`] — it is always retried
    /// there, or translated into [`RecurError::AlreadyExists`].
    #[error("compare-and-swap mismatch")]
    CompareMismatch,

    /// `set_value` observed an existing value for this memo_key.
    ///
    /// Benign: another worker already completed this call. The worker
    /// loop treats this as a race signal, not a fault.
    #[error("value already exists for memo_key {0}")]
    AlreadyExists(String),

    /// No message is available right now; the worker loop should sleep
    /// and poll again.
    #[error("queue is empty")]
    QueueIsEmpty,

    /// The queue has been torn down (test shutdown); the worker loop
    /// should exit cleanly.
    #[error("queue is closed")]
    QueueIsClosed,

    /// Structured control flow, not a fault: the handler's dependencies
    /// are not ready yet. Carries every call the handler is missing.
    ///
    /// Never propagated past the worker loop's invoke step — `schedule`
    /// and `read` callers never see this variant.
    #[error("deferred: {} missing call(s) pending", missing.len())]
    Defer { missing: Vec<Call> },

    /// The codec failed to encode or decode a payload.
    #[error("codec error: {0}")]
    Codec(String),

    /// A queued message names a task with no registered handler.
    #[error("unknown task: {0}")]
    UnknownTask(String),

    /// A CAS retry loop exceeded its configured bound without
    /// converging. Indicates a non-linearizable backend, not contention
    /// within the documented envelope.
    #[error("CAS retry bound exceeded in {0}")]
    CasRetryExceeded(String),

    /// The best-effort spawn-accounting cache tripped its configured
    /// ceiling.
    #[error("spawn limit exceeded: {0}")]
    SpawnLimit(String),

    /// An arbitrary failure raised by task-handler code. Propagated out
    /// of `wrrrk` with the original cause preserved via `#[source]`.
    #[error("task handler failed: {0}")]
    Handler(#[source] anyhow::Error),

    /// An untyped backend failure (connection loss, malformed row, …).
    #[error("backend error: {0}")]
    Backend(String),
}

impl RecurError {
    /// Construct a [`RecurError::Defer`] carrying a single missing call —
    /// the common case for a sequential task-proxy await.
    pub fn defer_one(call: Call) -> Self {
        RecurError::Defer { missing: vec![call] }
    }
}
