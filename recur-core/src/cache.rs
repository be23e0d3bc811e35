use async_trait::async_trait;

use crate::error::RecurError;

/// A best-effort, non-durable collaborator used only for spawn-limit
/// accounting.
///
/// Losing this counter — a restart, an eviction, a backend that never
/// gets wired in at all — never violates any of the store invariants; it
/// only weakens the fan-out guard. Nothing in the core correctness
/// argument depends on it.
#[async_trait]
pub trait Cache: Send + Sync + 'static {
    /// Increment the counter for `key` and return its new value.
    async fn incr(&self, key: &str) -> Result<u64, RecurError>;
}
