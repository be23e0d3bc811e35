use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info_span, Instrument};

use crate::config::RunnerConfig;
use crate::error::RecurError;
use crate::memory::Memory;
use crate::queue::Queue;
use crate::registry::{ErasedHandler, TaskContext};

/// The outcome of a single worker iteration, used only to decide what
/// the drive loop does next — never surfaced outside this module.
enum Progress {
    /// A message was processed (or the queue was momentarily empty and
    /// we should try again without sleeping first, e.g. right after
    /// acking a message).
    Continue,
    /// No message was available; sleep for `poll_interval_ms` before
    /// the next attempt.
    Idle,
    /// The queue has been closed; stop driving.
    Closed,
}

/// Drives the drain-and-execute loop described in the design doc's
/// worker-loop section. Built internally by
/// [`crate::runtime::Recur::wrrrk`] — not constructed directly by
/// callers.
pub(crate) struct WorkerLoop {
    pub(crate) memory: Arc<Memory>,
    pub(crate) queue: Arc<dyn Queue>,
    pub(crate) registry: Arc<HashMap<String, Arc<dyn ErasedHandler>>>,
    pub(crate) config: RunnerConfig,
}

impl WorkerLoop {
    /// Runs until the queue reports [`RecurError::QueueIsClosed`], or
    /// until any other error escapes a single iteration — a task
    /// handler's own failure, or a fatal backend fault. The caller (the
    /// host process driving `wrrrk`) decides whether to restart.
    pub async fn run(&self) -> Result<(), RecurError> {
        loop {
            match self.step().await {
                Ok(Progress::Continue) => continue,
                Ok(Progress::Idle) => {
                    tokio::time::sleep(Duration::from_millis(self.config.poll_interval_ms)).await;
                }
                Ok(Progress::Closed) => return Ok(()),
                Err(e) => return Err(e),
            }
        }
    }

    async fn step(&self) -> Result<Progress, RecurError> {
        let message = match self.queue.get_message().await {
            Ok(m) => m,
            Err(RecurError::QueueIsEmpty) => return Ok(Progress::Idle),
            Err(RecurError::QueueIsClosed) => return Ok(Progress::Closed),
            Err(e) => return Err(e),
        };

        let memo_key = message.body.clone();
        let span = info_span!("worker_iteration", memo_key = %memo_key);
        async {
            let (task_name, args_bytes) = match self.memory.get_call_bytes(&memo_key).await {
                Ok(v) => v,
                Err(RecurError::NotFound) => {
                    error!("no call payload for this message; deleting poison message");
                    self.queue.delete_message(&message.receipt).await?;
                    return Ok(Progress::Continue);
                }
                Err(e) => return Err(e),
            };

            if self.memory.has_value(&memo_key).await? {
                return self.fan_out_and_ack(&memo_key, &message.receipt).await;
            }

            let handler = match self.registry.get(&task_name) {
                Some(h) => h.clone(),
                None => {
                    error!(task_name = %task_name, "unregistered task name; deleting poison message");
                    self.queue.delete_message(&message.receipt).await?;
                    return Ok(Progress::Continue);
                }
            };

            let args_value = self.memory.codec().decode_call_args(&args_bytes)?;
            let ctx = TaskContext::new(self.memory.clone());

            match handler.invoke(ctx, args_value).await {
                Ok(result_value) => {
                    let result_bytes = self.memory.codec().encode_return(&result_value)?;
                    match self.memory.set_value(&memo_key, result_bytes).await {
                        Ok(()) => {}
                        Err(RecurError::AlreadyExists(_)) => {
                            debug!("value already written by another worker; continuing to fan-out");
                        }
                        Err(e) => return Err(e),
                    }
                    self.fan_out_and_ack(&memo_key, &message.receipt).await
                }
                Err(RecurError::Defer { missing }) => {
                    debug!(missing = missing.len(), "handler deferred on missing dependencies");
                    for child in missing {
                        let queue = self.queue.clone();
                        let memory = self.memory.clone();
                        let child_for_job = child.clone();
                        self.memory
                            .add_pending_return(&child.memo_key, &memo_key, move || {
                                let queue = queue.clone();
                                let memory = memory.clone();
                                let child = child_for_job.clone();
                                async move {
                                    memory.set_call(&child).await?;
                                    queue.put(&child.memo_key).await
                                }
                            })
                            .await?;
                    }
                    self.queue.delete_message(&message.receipt).await?;
                    Ok(Progress::Continue)
                }
                // Task-handler faults and backend faults alike propagate out of the
                // loop unchanged; the message is left unacknowledged for the queue's
                // own redelivery mechanism.
                Err(e) => Err(e),
            }
        }
        .instrument(span)
        .await
    }

    async fn fan_out_and_ack(&self, memo_key: &str, receipt: &str) -> Result<Progress, RecurError> {
        let parents = self.memory.with_pending_returns_remove(memo_key).await?;
        debug!(memo_key, parent_count = parents.len(), "fanning out to pending parents");
        for parent in parents {
            self.queue.put(&parent).await?;
        }
        self.queue.delete_message(receipt).await?;
        Ok(Progress::Continue)
    }
}
