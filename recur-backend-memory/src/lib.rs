//! In-process `Store`, `Queue`, and `Cache` backends for `recur-core`.
//!
//! Not durable and not meant for production — this crate exists for
//! tests, examples, and single-process demos, mirroring the role the
//! teacher codebase's own in-memory fakes play in its integration
//! suite: a backend with the exact same contract as the real thing but
//! zero external dependencies to stand up.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use dashmap::DashMap;
use recur_core::{Cache, Queue, QueueInfo, QueueMessage, RecurError, Store, StoreKey};
use tracing::debug;

/// A `DashMap`-backed [`Store`]. Compare-and-swap is implemented by
/// locking the single shard for the affected key via `DashMap::entry`,
/// which is sufficient for the linearizability the CAS contract
/// requires — no cross-key coordination is ever needed.
#[derive(Default)]
pub struct InMemoryStore {
    data: DashMap<(&'static str, String), Vec<u8>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(key: &StoreKey) -> (&'static str, String) {
        (key.namespace, key.id.clone())
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn has(&self, key: &StoreKey) -> Result<bool, RecurError> {
        Ok(self.data.contains_key(&Self::key(key)))
    }

    async fn get(&self, key: &StoreKey) -> Result<Vec<u8>, RecurError> {
        self.data
            .get(&Self::key(key))
            .map(|v| v.clone())
            .ok_or(RecurError::NotFound)
    }

    async fn set(&self, key: &StoreKey, value: Vec<u8>) -> Result<(), RecurError> {
        self.data.insert(Self::key(key), value);
        Ok(())
    }

    async fn delete(&self, key: &StoreKey) -> Result<(), RecurError> {
        self.data.remove(&Self::key(key));
        Ok(())
    }

    async fn set_new_value(&self, key: &StoreKey, value: Vec<u8>) -> Result<(), RecurError> {
        match self.data.entry(Self::key(key)) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(RecurError::CompareMismatch),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(value);
                Ok(())
            }
        }
    }

    async fn compare_and_set(&self, key: &StoreKey, new: Vec<u8>, expected: &[u8]) -> Result<(), RecurError> {
        match self.data.entry(Self::key(key)) {
            dashmap::mapref::entry::Entry::Occupied(mut slot) => {
                if slot.get().as_slice() == expected {
                    slot.insert(new);
                    Ok(())
                } else {
                    Err(RecurError::CompareMismatch)
                }
            }
            dashmap::mapref::entry::Entry::Vacant(_) => Err(RecurError::CompareMismatch),
        }
    }

    async fn compare_and_delete(&self, key: &StoreKey, expected: &[u8]) -> Result<(), RecurError> {
        match self.data.entry(Self::key(key)) {
            dashmap::mapref::entry::Entry::Occupied(slot) => {
                if slot.get().as_slice() == expected {
                    slot.remove();
                    Ok(())
                } else {
                    Err(RecurError::CompareMismatch)
                }
            }
            dashmap::mapref::entry::Entry::Vacant(_) => Err(RecurError::CompareMismatch),
        }
    }
}

/// A `VecDeque`-backed [`Queue`]. Receipts are the message's body plus a
/// monotonic sequence number so `delete_message` can't accidentally
/// remove a different in-flight copy of the same memo_key.
pub struct InMemoryQueue {
    inner: Mutex<VecDeque<(u64, String)>>,
    next_seq: AtomicU64,
    closed: AtomicBool,
}

impl Default for InMemoryQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryQueue {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(VecDeque::new()),
            next_seq: AtomicU64::new(0),
            closed: AtomicBool::new(false),
        }
    }

    /// Signals the queue as closed: pending `get_message` callers still
    /// drain whatever's buffered, but once empty, `wrrrk` exits instead
    /// of idling forever. Used to tear down a worker loop in tests.
    pub fn close(&self) {
        debug!("closing in-memory queue");
        self.closed.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl Queue for InMemoryQueue {
    async fn put(&self, body: &str) -> Result<(), RecurError> {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        self.inner.lock().unwrap().push_back((seq, body.to_string()));
        Ok(())
    }

    async fn get_message(&self) -> Result<QueueMessage, RecurError> {
        if let Some((seq, body)) = self.inner.lock().unwrap().pop_front() {
            return Ok(QueueMessage {
                body,
                receipt: seq.to_string(),
            });
        }
        if self.closed.load(Ordering::SeqCst) {
            Err(RecurError::QueueIsClosed)
        } else {
            Err(RecurError::QueueIsEmpty)
        }
    }

    async fn delete_message(&self, _receipt: &str) -> Result<(), RecurError> {
        // Messages are removed from the deque at pop time; there is no
        // in-flight/invisible state to reconcile for this backend.
        Ok(())
    }

    async fn get_info(&self) -> Result<QueueInfo, RecurError> {
        Ok(QueueInfo {
            num_messages: self.inner.lock().unwrap().len() as u64,
            num_inflight: 0,
        })
    }
}

/// A `DashMap<String, u64>` counter, for the spawn-limit [`Cache`].
#[derive(Default)]
pub struct InMemoryCache {
    counts: DashMap<String, u64>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Cache for InMemoryCache {
    async fn incr(&self, key: &str) -> Result<u64, RecurError> {
        let mut entry = self.counts.entry(key.to_string()).or_insert(0);
        *entry += 1;
        Ok(*entry)
    }
}
