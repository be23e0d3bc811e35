use async_trait::async_trait;

use crate::error::RecurError;
use crate::model::StoreKey;

/// The durable, compare-and-swap-capable key-value backend.
///
/// All operations are async so a backend can hit the network (Postgres,
/// a cloud KV table, …) without blocking a worker thread. See
/// `recur-backend-memory` for an in-process reference implementation and
/// `recur-backend-pg` for a Postgres-backed one.
#[async_trait]
pub trait Store: Send + Sync + 'static {
    /// Whether a value currently exists for `key`.
    async fn has(&self, key: &StoreKey) -> Result<bool, RecurError>;

    /// Read the current value for `key`. Fails with
    /// [`RecurError::NotFound`] when absent.
    async fn get(&self, key: &StoreKey) -> Result<Vec<u8>, RecurError>;

    /// Unconditional put. Idempotent: writing the same bytes twice is a
    /// no-op from the caller's perspective.
    async fn set(&self, key: &StoreKey, value: Vec<u8>) -> Result<(), RecurError>;

    /// Idempotent delete; deleting an absent key is success.
    async fn delete(&self, key: &StoreKey) -> Result<(), RecurError>;

    /// Write `value` only if no value currently exists for `key`. Fails
    /// with [`RecurError::CompareMismatch`] if any value exists already
    /// (including one written concurrently by another caller).
    async fn set_new_value(&self, key: &StoreKey, value: Vec<u8>) -> Result<(), RecurError>;

    /// Atomically replace the current value with `new` iff it is
    /// byte-exactly equal to `expected`. Fails with
    /// [`RecurError::CompareMismatch`] otherwise, including when `key` is
    /// absent.
    async fn compare_and_set(
        &self,
        key: &StoreKey,
        new: Vec<u8>,
        expected: &[u8],
    ) -> Result<(), RecurError>;

    /// Atomically delete the current value iff it is byte-exactly equal
    /// to `expected`. Fails with [`RecurError::CompareMismatch`]
    /// otherwise. `expected` is never empty — deleting an absent key is
    /// not expressible through this method.
    async fn compare_and_delete(&self, key: &StoreKey, expected: &[u8]) -> Result<(), RecurError>;
}
