use serde::{Deserialize, Serialize};

/// An immutable descriptor of a task invocation, content-addressed by
/// [`Call::memo_key`].
///
/// Two `Call`s with equal `memo_key` are the same call regardless of how
/// `args` happens to be represented in memory — the codec guarantees that
/// equal logical arguments fingerprint to the same key (§4.3 of the
/// design doc; see `recur-codec-json` for the reference implementation).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Call {
    pub task_name: String,
    pub args: serde_json::Value,
    pub memo_key: String,
}

impl Call {
    pub fn new(task_name: impl Into<String>, args: serde_json::Value, memo_key: impl Into<String>) -> Self {
        Self {
            task_name: task_name.into(),
            args,
            memo_key: memo_key.into(),
        }
    }
}

/// A key into the external store: a namespace ("call" / "value" /
/// "pending_returns") plus an id (always a memo_key in this runtime).
///
/// Implementations are free to flatten this however they like (string
/// concatenation, a composite primary key, …) provided the namespace/id
/// split can never collide with a different pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoreKey {
    pub namespace: &'static str,
    pub id: String,
}

impl StoreKey {
    pub fn new(namespace: &'static str, id: impl Into<String>) -> Self {
        Self {
            namespace,
            id: id.into(),
        }
    }
}

pub(crate) fn call_key(memo_key: &str) -> StoreKey {
    StoreKey::new("call", memo_key)
}

pub(crate) fn value_key(memo_key: &str) -> StoreKey {
    StoreKey::new("value", memo_key)
}

pub(crate) fn pending_returns_key(memo_key: &str) -> StoreKey {
    StoreKey::new("pending_returns", memo_key)
}
