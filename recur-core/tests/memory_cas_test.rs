//! CAS-level tests for the `Memory` facade, exercised against a tiny
//! hand-rolled `Store` fake rather than a real backend crate — keeping
//! this crate's own test suite free of a dependency on its siblings.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use recur_core::{Call, Codec, Memory, RecurError, Store, StoreKey};

#[derive(Default)]
struct FakeStore {
    data: Mutex<HashMap<(&'static str, String), Vec<u8>>>,
}

fn k(key: &StoreKey) -> (&'static str, String) {
    (key.namespace, key.id.clone())
}

#[async_trait]
impl Store for FakeStore {
    async fn has(&self, key: &StoreKey) -> Result<bool, RecurError> {
        Ok(self.data.lock().unwrap().contains_key(&k(key)))
    }

    async fn get(&self, key: &StoreKey) -> Result<Vec<u8>, RecurError> {
        let result = self.data.lock().unwrap().get(&k(key)).cloned();
        // A real suspension point between the read and whatever write the
        // caller does next — without it, 50 spawned tasks on a
        // single-threaded runtime would each run `add_pending_return` to
        // completion before the next one is even polled, so the CAS race
        // this store exists to exercise would never actually occur.
        tokio::task::yield_now().await;
        result.ok_or(RecurError::NotFound)
    }

    async fn set(&self, key: &StoreKey, value: Vec<u8>) -> Result<(), RecurError> {
        self.data.lock().unwrap().insert(k(key), value);
        Ok(())
    }

    async fn delete(&self, key: &StoreKey) -> Result<(), RecurError> {
        self.data.lock().unwrap().remove(&k(key));
        Ok(())
    }

    async fn set_new_value(&self, key: &StoreKey, value: Vec<u8>) -> Result<(), RecurError> {
        let mut guard = self.data.lock().unwrap();
        if guard.contains_key(&k(key)) {
            return Err(RecurError::CompareMismatch);
        }
        guard.insert(k(key), value);
        Ok(())
    }

    async fn compare_and_set(&self, key: &StoreKey, new: Vec<u8>, expected: &[u8]) -> Result<(), RecurError> {
        let mut guard = self.data.lock().unwrap();
        match guard.get(&k(key)) {
            Some(current) if current.as_slice() == expected => {
                guard.insert(k(key), new);
                Ok(())
            }
            _ => Err(RecurError::CompareMismatch),
        }
    }

    async fn compare_and_delete(&self, key: &StoreKey, expected: &[u8]) -> Result<(), RecurError> {
        let mut guard = self.data.lock().unwrap();
        match guard.get(&k(key)) {
            Some(current) if current.as_slice() == expected => {
                guard.remove(&k(key));
                Ok(())
            }
            _ => Err(RecurError::CompareMismatch),
        }
    }
}

/// A trivial identity codec: arguments and return values are passed
/// through as raw JSON text, and the memo_key is just `name(args)`.
/// Deterministic enough for these tests without pulling in the real
/// JSON/SHA-256 codec from `recur-codec-json`.
struct IdentityCodec;

impl Codec for IdentityCodec {
    fn create_call(&self, task_name: &str, args: &serde_json::Value) -> Result<Call, RecurError> {
        let memo_key = format!("{task_name}({args})");
        Ok(Call::new(task_name, args.clone(), memo_key))
    }

    fn encode_call(&self, args: &serde_json::Value) -> Result<Vec<u8>, RecurError> {
        Ok(args.to_string().into_bytes())
    }

    fn decode_call_args(&self, bytes: &[u8]) -> Result<serde_json::Value, RecurError> {
        serde_json::from_slice(bytes).map_err(|e| RecurError::Codec(e.to_string()))
    }

    fn encode_return(&self, value: &serde_json::Value) -> Result<Vec<u8>, RecurError> {
        Ok(value.to_string().into_bytes())
    }

    fn decode_return(&self, bytes: &[u8]) -> Result<serde_json::Value, RecurError> {
        serde_json::from_slice(bytes).map_err(|e| RecurError::Codec(e.to_string()))
    }
}

fn memory() -> Memory {
    let store: Arc<dyn Store> = Arc::new(FakeStore::default());
    let codec: Arc<dyn Codec> = Arc::new(IdentityCodec);
    Memory::new(store, codec, 100)
}

#[tokio::test]
async fn set_value_is_write_once() {
    let store: Arc<dyn Store> = Arc::new(FakeStore::default());
    let key = StoreKey::new("value", "k1");
    store.set_new_value(&key, b"first".to_vec()).await.unwrap();
    let err = store.set_new_value(&key, b"second".to_vec()).await.unwrap_err();
    assert!(matches!(err, RecurError::CompareMismatch));
    assert_eq!(store.get(&key).await.unwrap(), b"first".to_vec());
}

#[tokio::test]
async fn compare_and_set_rejects_stale_expected() {
    let store: Arc<dyn Store> = Arc::new(FakeStore::default());
    let key = StoreKey::new("pending_returns", "k1");
    store.set(&key, b"v1".to_vec()).await.unwrap();
    let err = store
        .compare_and_set(&key, b"v2".to_vec(), b"not-v1")
        .await
        .unwrap_err();
    assert!(matches!(err, RecurError::CompareMismatch));
    store.compare_and_set(&key, b"v2".to_vec(), b"v1").await.unwrap();
    assert_eq!(store.get(&key).await.unwrap(), b"v2".to_vec());
}

#[tokio::test]
async fn compare_and_delete_is_idempotent_on_mismatch() {
    let store: Arc<dyn Store> = Arc::new(FakeStore::default());
    let key = StoreKey::new("pending_returns", "k1");
    store.set(&key, b"v1".to_vec()).await.unwrap();
    let err = store.compare_and_delete(&key, b"v2").await.unwrap_err();
    assert!(matches!(err, RecurError::CompareMismatch));
    store.compare_and_delete(&key, b"v1").await.unwrap();
    assert!(!store.has(&key).await.unwrap());
}

#[test]
fn identity_codec_is_deterministic() {
    let codec = IdentityCodec;
    let a = codec
        .create_call("foo", &serde_json::json!({"a": 1}))
        .unwrap();
    let b = codec
        .create_call("foo", &serde_json::json!({"a": 1}))
        .unwrap();
    assert_eq!(a.memo_key, b.memo_key);
}

/// Fifty concurrent parents deferring on the same child must collapse
/// into exactly one `schedule_job` invocation (Scenario C's
/// fan-out-debounce mechanism, at the `Memory` layer).
///
/// Needs real OS-thread parallelism (not the default current-thread
/// flavor) plus `FakeStore::get`'s explicit yield point to actually
/// force 50 spawned tasks to interleave their read-modify-write windows
/// — otherwise each `add_pending_return` call would run to completion
/// before the next one is even polled, and this assertion would pass
/// trivially regardless of whether the race is handled correctly.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn add_pending_return_dedupes_concurrent_schedule_jobs() {
    let memory = Arc::new(memory());
    let scheduled = Arc::new(std::sync::atomic::AtomicUsize::new(0));

    let mut handles = Vec::new();
    for i in 0..50 {
        let memory = memory.clone();
        let scheduled = scheduled.clone();
        handles.push(tokio::spawn(async move {
            memory
                .add_pending_return("child-1", &format!("parent-{i}"), || {
                    let scheduled = scheduled.clone();
                    async move {
                        scheduled.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                        Ok(())
                    }
                })
                .await
        }));
    }
    for h in handles {
        h.await.unwrap().unwrap();
    }

    assert_eq!(
        scheduled.load(std::sync::atomic::Ordering::SeqCst),
        1,
        "only the first parent to observe an unscheduled child should invoke schedule_job"
    );

    let parents = memory.with_pending_returns_remove("child-1").await.unwrap();
    assert_eq!(parents.len(), 50);

    // A second removal sees an absent record and returns the empty set —
    // fan-out followed by absent pending_returns is a no-op.
    let again = memory.with_pending_returns_remove("child-1").await.unwrap();
    assert!(again.is_empty());
}

#[tokio::test]
async fn re_scheduling_after_value_exists_is_allowed_and_benign() {
    let memory = memory();
    memory.set_value("child-1", b"55".to_vec()).await.unwrap();
    let err = memory.set_value("child-1", b"56".to_vec()).await.unwrap_err();
    assert!(matches!(err, RecurError::AlreadyExists(ref k) if k == "child-1"));
}
