use std::collections::HashMap;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::RecurError;
use crate::gather::gather;
use crate::memory::Memory;

/// Handed to a running task handler so it can call other registered
/// tasks through their [`CallableProxy`]. Cheap to clone — just an
/// `Arc` to the shared [`Memory`] facade.
#[derive(Clone)]
pub struct TaskContext {
    pub(crate) memory: Arc<Memory>,
}

impl TaskContext {
    pub(crate) fn new(memory: Arc<Memory>) -> Self {
        Self { memory }
    }
}

/// Type-erased entry point into a registered handler, used by the
/// worker loop once it has decoded a call's arguments off the queue. Not
/// exposed outside this crate — callers only ever see [`CallableProxy`].
#[async_trait]
pub(crate) trait ErasedHandler: Send + Sync {
    async fn invoke(
        &self,
        ctx: TaskContext,
        args: serde_json::Value,
    ) -> Result<serde_json::Value, RecurError>;
}

struct HandlerAdapter<F, Args, Ret> {
    func: F,
    _marker: PhantomData<fn(Args) -> Ret>,
}

#[async_trait]
impl<F, Args, Ret, Fut> ErasedHandler for HandlerAdapter<F, Args, Ret>
where
    Args: DeserializeOwned + Send + Sync + 'static,
    Ret: Serialize + Send + Sync + 'static,
    F: Fn(TaskContext, Args) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Ret, RecurError>> + Send + 'static,
{
    async fn invoke(
        &self,
        ctx: TaskContext,
        args: serde_json::Value,
    ) -> Result<serde_json::Value, RecurError> {
        let args: Args =
            serde_json::from_value(args).map_err(|e| RecurError::Codec(e.to_string()))?;
        let ret = (self.func)(ctx, args).await?;
        serde_json::to_value(ret).map_err(|e| RecurError::Codec(e.to_string()))
    }
}

/// Name → handler map built up during [`crate::runtime::RecurBuilder`]
/// setup and frozen (wrapped in `Arc`, never behind a `Mutex`) before the
/// first `wrrrk`/`schedule` call. Read-only for the rest of the process's
/// life, mirroring how the teacher codebase treats its own
/// process-lifecycle registries.
#[derive(Default)]
pub struct TaskRegistry {
    handlers: HashMap<String, Arc<dyn ErasedHandler>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` under `name` and returns a callable proxy
    /// other handlers (or top-level callers) use to invoke it.
    ///
    /// `handler` sees a [`TaskContext`] plus its own typed arguments; it
    /// returns `Ok(value)` on completion or an `Err(RecurError::Defer(_))`
    /// the moment one of its own task-proxy calls is missing —
    /// propagated automatically by `?`, no manual signaling required.
    pub fn register_task<Args, Ret, F, Fut>(
        &mut self,
        name: impl Into<String>,
        handler: F,
    ) -> CallableProxy<Args, Ret>
    where
        Args: DeserializeOwned + Serialize + Send + Sync + 'static,
        Ret: DeserializeOwned + Serialize + Send + Sync + 'static,
        F: Fn(TaskContext, Args) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Ret, RecurError>> + Send + 'static,
    {
        let name = name.into();
        let adapter = Arc::new(HandlerAdapter {
            func: handler,
            _marker: PhantomData,
        });
        self.handlers.insert(name.clone(), adapter);
        CallableProxy {
            name: Arc::from(name.as_str()),
            _marker: PhantomData,
        }
    }

    pub(crate) fn into_map(self) -> HashMap<String, Arc<dyn ErasedHandler>> {
        self.handlers
    }
}

/// The callable form of a registered task: `T(args)` for a single call,
/// `T.map(batch)` for the batched parallel form.
pub struct CallableProxy<Args, Ret> {
    name: Arc<str>,
    _marker: PhantomData<fn(Args) -> Ret>,
}

impl<Args, Ret> Clone for CallableProxy<Args, Ret> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            _marker: PhantomData,
        }
    }
}

impl<Args, Ret> CallableProxy<Args, Ret>
where
    Args: Serialize + Send + Sync + 'static,
    Ret: DeserializeOwned + Send + Sync + 'static,
{
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolves this task for `args`: returns its decoded value if
    /// already memoized, otherwise raises
    /// [`RecurError::Defer`] with exactly this one call. Sequential
    /// awaits on missing dependencies short-circuit the handler at the
    /// first missing call via `?`, exactly mirroring the reference
    /// implementation's "raise on first missing dependency" behavior.
    pub async fn call(&self, ctx: &TaskContext, args: Args) -> Result<Ret, RecurError> {
        let args_value = serde_json::to_value(&args).map_err(|e| RecurError::Codec(e.to_string()))?;
        let call = ctx.memory.make_call(&self.name, args_value)?;
        if ctx.memory.has_value(&call.memo_key).await? {
            let bytes = ctx.memory.get_value(&call.memo_key).await?;
            let value = ctx.memory.codec().decode_return(&bytes)?;
            serde_json::from_value(value).map_err(|e| RecurError::Codec(e.to_string()))
        } else {
            Err(RecurError::defer_one(call))
        }
    }

    /// The batched parallel form: drives every element of `batch`
    /// through [`CallableProxy::call`] via [`gather`] so a single Defer
    /// carries the union of every missing child, instead of stopping at
    /// the first.
    pub async fn map(&self, ctx: &TaskContext, batch: Vec<Args>) -> Result<Vec<Ret>, RecurError> {
        gather(batch.into_iter().map(|args| self.call(ctx, args))).await
    }
}
