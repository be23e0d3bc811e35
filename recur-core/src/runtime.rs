use std::collections::HashMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::info_span;

use crate::cache::Cache;
use crate::codec::Codec;
use crate::config::RunnerConfig;
use crate::error::RecurError;
use crate::memory::Memory;
use crate::model::Call;
use crate::queue::Queue;
use crate::registry::{CallableProxy, ErasedHandler, TaskContext, TaskRegistry};
use crate::store::Store;
use crate::worker::WorkerLoop;

/// Builds a [`Recur`] instance: wires in a [`Store`], a [`Queue`], a
/// [`Codec`], an optional [`Cache`], and registers task handlers.
///
/// Unlike the reference implementation's module-level singleton
/// (`brrr.schedule`, `brrr.wrrrk`, …), this runtime always requires an
/// explicit instance — Rust's ownership model makes implicit global
/// mutable state a worse trade here than in the reference's host
/// language.
pub struct RecurBuilder {
    store: Option<Arc<dyn Store>>,
    queue: Option<Arc<dyn Queue>>,
    codec: Option<Arc<dyn Codec>>,
    cache: Option<Arc<dyn Cache>>,
    config: RunnerConfig,
    registry: TaskRegistry,
}

impl Default for RecurBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RecurBuilder {
    pub fn new() -> Self {
        Self {
            store: None,
            queue: None,
            codec: None,
            cache: None,
            config: RunnerConfig::default(),
            registry: TaskRegistry::new(),
        }
    }

    pub fn with_store(mut self, store: Arc<dyn Store>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_queue(mut self, queue: Arc<dyn Queue>) -> Self {
        self.queue = Some(queue);
        self
    }

    pub fn with_codec(mut self, codec: Arc<dyn Codec>) -> Self {
        self.codec = Some(codec);
        self
    }

    pub fn with_cache(mut self, cache: Arc<dyn Cache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_config(mut self, config: RunnerConfig) -> Self {
        self.config = config;
        self
    }

    /// Registers a task handler, returning the [`CallableProxy`] other
    /// handlers use to call it. See [`TaskRegistry::register_task`].
    pub fn register_task<Args, Ret, F, Fut>(&mut self, name: impl Into<String>, handler: F) -> CallableProxy<Args, Ret>
    where
        Args: DeserializeOwned + Serialize + Send + Sync + 'static,
        Ret: DeserializeOwned + Serialize + Send + Sync + 'static,
        F: Fn(TaskContext, Args) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<Ret, RecurError>> + Send + 'static,
    {
        self.registry.register_task(name, handler)
    }

    pub fn build(self) -> Result<Recur, RecurError> {
        let store = self
            .store
            .ok_or_else(|| RecurError::Backend("no Store configured".to_string()))?;
        let queue = self
            .queue
            .ok_or_else(|| RecurError::Backend("no Queue configured".to_string()))?;
        let codec = self
            .codec
            .ok_or_else(|| RecurError::Backend("no Codec configured".to_string()))?;

        let memory = Arc::new(Memory::new(store, codec, self.config.cas_retry_limit));
        Ok(Recur {
            memory,
            queue,
            registry: Arc::new(self.registry.into_map()),
            cache: self.cache,
            config: self.config,
        })
    }
}

/// The top-level handle to a wired-up runtime: `schedule`, `read`,
/// `wrrrk`, and a [`TaskContext`] for driving handlers directly (e.g.
/// from a one-off script rather than a worker loop).
pub struct Recur {
    memory: Arc<Memory>,
    queue: Arc<dyn Queue>,
    registry: Arc<HashMap<String, Arc<dyn ErasedHandler>>>,
    cache: Option<Arc<dyn Cache>>,
    config: RunnerConfig,
}

impl Recur {
    pub fn builder() -> RecurBuilder {
        RecurBuilder::new()
    }

    /// Enqueues a root call: `call = codec.create_call(name, args)`,
    /// writes its call payload, then puts its memo_key on the queue.
    pub async fn schedule<Args: Serialize>(&self, task_name: &str, args: Args) -> Result<Call, RecurError> {
        let span = info_span!("schedule", task_name);
        let _enter = span.enter();

        if let (Some(cache), Some(limit)) = (&self.cache, self.config.spawn_limit) {
            let count = cache.incr(task_name).await?;
            if count > limit {
                return Err(RecurError::SpawnLimit(format!(
                    "{task_name} exceeded spawn limit of {limit}"
                )));
            }
        }

        let args_value = serde_json::to_value(args).map_err(|e| RecurError::Codec(e.to_string()))?;
        let call = self.memory.make_call(task_name, args_value)?;
        self.memory.set_call(&call).await?;
        self.queue.put(&call.memo_key).await?;
        Ok(call)
    }

    /// Reads a memoized result. Fails with [`RecurError::NotFound`] if
    /// no value has been computed yet — callers may poll or subscribe
    /// externally.
    pub async fn read<Ret: DeserializeOwned>(
        &self,
        task_name: &str,
        args: impl Serialize,
    ) -> Result<Ret, RecurError> {
        let args_value = serde_json::to_value(args).map_err(|e| RecurError::Codec(e.to_string()))?;
        let call = self.memory.make_call(task_name, args_value)?;
        let bytes = self.memory.get_value(&call.memo_key).await?;
        let value = self.memory.codec().decode_return(&bytes)?;
        serde_json::from_value(value).map_err(|e| RecurError::Codec(e.to_string()))
    }

    /// Drives the worker loop until the queue reports it has been
    /// closed, or a handler/backend fault propagates out.
    pub async fn wrrrk(&self) -> Result<(), RecurError> {
        WorkerLoop {
            memory: self.memory.clone(),
            queue: self.queue.clone(),
            registry: self.registry.clone(),
            config: self.config.clone(),
        }
        .run()
        .await
    }

    /// A [`TaskContext`] bound to this runtime's memory facade, for
    /// driving handlers directly outside of `wrrrk` (tests, one-off
    /// scripts).
    pub fn context(&self) -> TaskContext {
        TaskContext::new(self.memory.clone())
    }

    pub fn queue(&self) -> &Arc<dyn Queue> {
        &self.queue
    }
}
