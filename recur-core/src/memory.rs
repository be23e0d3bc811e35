use std::future::Future;
use std::sync::Arc;

use tracing::debug;

use crate::codec::Codec;
use crate::error::RecurError;
use crate::model::{call_key, pending_returns_key, value_key, Call};
use crate::records::{
    decode_call_record, decode_pending_returns, encode_call_record, encode_pending_returns,
    CallRecord, PendingReturnsRecord,
};
use crate::store::Store;

fn now_seconds() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Typed accessors over a [`Store`] + [`Codec`] pair for the three
/// record families named in the store schema: call payloads, values,
/// and pending-returns.
///
/// This is the only place CAS retry loops live. Both
/// [`Memory::add_pending_return`] and [`Memory::with_pending_returns_remove`]
/// are bounded at `cas_retry_limit` attempts; exceeding the bound raises
/// [`RecurError::CasRetryExceeded`] — a tripwire for a misbehaving
/// backend, never a legitimate outcome under the documented contention
/// envelope.
pub struct Memory {
    store: Arc<dyn Store>,
    codec: Arc<dyn Codec>,
    cas_retry_limit: usize,
}

impl Memory {
    pub fn new(store: Arc<dyn Store>, codec: Arc<dyn Codec>, cas_retry_limit: usize) -> Self {
        Self {
            store,
            codec,
            cas_retry_limit,
        }
    }

    pub fn codec(&self) -> &Arc<dyn Codec> {
        &self.codec
    }

    pub fn make_call(&self, task_name: &str, args: serde_json::Value) -> Result<Call, RecurError> {
        self.codec.create_call(task_name, &args)
    }

    pub async fn has_call(&self, memo_key: &str) -> Result<bool, RecurError> {
        self.store.has(&call_key(memo_key)).await
    }

    /// Writes the call payload record if absent. Idempotent: a call
    /// record is a pure function of `(task_name, args)` under the
    /// memo_key, so an existing record for the same key never needs
    /// overwriting.
    pub async fn set_call(&self, call: &Call) -> Result<(), RecurError> {
        if self.has_call(&call.memo_key).await? {
            return Ok(());
        }
        let task_args = self.codec.encode_call(&call.args)?;
        let record = CallRecord {
            task_name: call.task_name.clone(),
            task_args: serde_bytes::ByteBuf::from(task_args),
        };
        let bytes = encode_call_record(&record)?;
        match self.store.set_new_value(&call_key(&call.memo_key), bytes).await {
            Ok(()) => Ok(()),
            // Another writer landed the identical, content-addressed payload first.
            Err(RecurError::CompareMismatch) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Reconstructs `(task_name, encoded_args)` from a memo_key alone —
    /// what a worker does after pulling a bare memo_key off the queue.
    pub async fn get_call_bytes(&self, memo_key: &str) -> Result<(String, Vec<u8>), RecurError> {
        let bytes = self.store.get(&call_key(memo_key)).await?;
        let record = decode_call_record(&bytes)?;
        Ok((record.task_name, record.task_args.into_vec()))
    }

    pub async fn has_value(&self, memo_key: &str) -> Result<bool, RecurError> {
        self.store.has(&value_key(memo_key)).await
    }

    pub async fn get_value(&self, memo_key: &str) -> Result<Vec<u8>, RecurError> {
        self.store.get(&value_key(memo_key)).await
    }

    /// Write-once: translates the store's raw `CompareMismatch` into the
    /// caller-facing [`RecurError::AlreadyExists`] signal.
    pub async fn set_value(&self, memo_key: &str, bytes: Vec<u8>) -> Result<(), RecurError> {
        match self.store.set_new_value(&value_key(memo_key), bytes).await {
            Ok(()) => Ok(()),
            Err(RecurError::CompareMismatch) => Err(RecurError::AlreadyExists(memo_key.to_string())),
            Err(e) => Err(e),
        }
    }

    /// Registers `parent` as waiting on `memo_key`'s completion,
    /// enqueueing `memo_key` via `schedule_job` the first (and only the
    /// first) time any parent observes `scheduled_at` unset.
    ///
    /// This is the central dedup mechanism: concurrent parents deferring
    /// on the same child collapse into a single queued message, because
    /// only the parent that observes `scheduled_at == null` ever invokes
    /// `schedule_job`.
    pub async fn add_pending_return<F, Fut>(
        &self,
        memo_key: &str,
        parent: &str,
        schedule_job: F,
    ) -> Result<(), RecurError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<(), RecurError>>,
    {
        let key = pending_returns_key(memo_key);
        for attempt in 0..self.cas_retry_limit {
            // `prior_bytes` is the encoding the closing `compare_and_set` below
            // checks against — either what we just read, or (in the absent
            // case) what we just durably created it as. Mirrors the
            // reference implementation's "double CAS" (store.py
            // `add_pending_return`): the unscheduled record is written
            // durably *before* `schedule_job` runs, so a crash or a race
            // between `schedule_job` and the timestamp update never leaves
            // a waiting parent unrecorded.
            let (mut record, prior_bytes) = match self.store.get(&key).await {
                Ok(prior_bytes) => {
                    let record = decode_pending_returns(&prior_bytes)?;
                    (record, prior_bytes)
                }
                Err(RecurError::NotFound) => {
                    let record = PendingReturnsRecord::new_unscheduled(parent);
                    let bytes = encode_pending_returns(&record)?;
                    match self.store.set_new_value(&key, bytes.clone()).await {
                        Ok(()) => (record, bytes),
                        Err(RecurError::CompareMismatch) => {
                            // Another parent created the record between our read and write;
                            // retry the whole read-modify-write against what's there now.
                            debug!(memo_key, attempt, "pending_returns creation race, retrying");
                            continue;
                        }
                        Err(e) => return Err(e),
                    }
                }
                Err(e) => return Err(e),
            };

            let mut changed = record.add_parent(parent);
            if record.is_unscheduled() {
                schedule_job().await?;
                record.scheduled_at = now_seconds();
                changed = true;
            }
            if !changed {
                return Ok(());
            }

            let new_bytes = encode_pending_returns(&record)?;
            match self.store.compare_and_set(&key, new_bytes, &prior_bytes).await {
                Ok(()) => return Ok(()),
                Err(RecurError::CompareMismatch) => {
                    debug!(memo_key, attempt, "pending_returns CAS race, retrying");
                    continue;
                }
                Err(e) => return Err(e),
            }
        }
        Err(RecurError::CasRetryExceeded(format!(
            "add_pending_return({memo_key})"
        )))
    }

    /// Scoped acquisition: yields the pending-return set for `memo_key`
    /// and atomically deletes the record. Yields the empty set if the
    /// record is absent. Retried wholesale on a CAS race.
    pub async fn with_pending_returns_remove(&self, memo_key: &str) -> Result<Vec<String>, RecurError> {
        let key = pending_returns_key(memo_key);
        for attempt in 0..self.cas_retry_limit {
            match self.store.get(&key).await {
                Ok(bytes) => {
                    let record = decode_pending_returns(&bytes)?;
                    match self.store.compare_and_delete(&key, &bytes).await {
                        Ok(()) => return Ok(record.returns),
                        Err(RecurError::CompareMismatch) => {
                            debug!(memo_key, attempt, "pending_returns removal race, retrying");
                            continue;
                        }
                        Err(e) => return Err(e),
                    }
                }
                Err(RecurError::NotFound) => return Ok(Vec::new()),
                Err(e) => return Err(e),
            }
        }
        Err(RecurError::CasRetryExceeded(format!(
            "with_pending_returns_remove({memo_key})"
        )))
    }
}
