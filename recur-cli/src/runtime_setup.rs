//! Wires up the demo in-memory runtime shared by every subcommand.
//!
//! This binary exists to exercise the top-level API end to end, not to
//! be a production deployment target — a real deployment swaps
//! `recur-backend-memory` for `recur-backend-pg` and wires the result
//! through the exact same [`RecurBuilder`].

use std::sync::Arc;

use recur_backend_memory::{InMemoryCache, InMemoryQueue, InMemoryStore};
use recur_codec_json::JsonCodec;
use recur_core::{CallableProxy, Recur, RecurBuilder, RunnerConfig};

use crate::demo_tasks;

pub struct DemoRuntime {
    pub recur: Arc<Recur>,
    pub queue: Arc<InMemoryQueue>,
    pub fib: CallableProxy<u64, u64>,
}

pub fn build() -> anyhow::Result<DemoRuntime> {
    let queue = Arc::new(InMemoryQueue::new());
    let mut builder = Recur::builder()
        .with_store(Arc::new(InMemoryStore::new()))
        .with_queue(queue.clone())
        .with_codec(Arc::new(JsonCodec::new()))
        .with_cache(Arc::new(InMemoryCache::new()))
        .with_config(RunnerConfig::load()?);
    let fib = demo_tasks::register(&mut builder);
    let recur = Arc::new(builder.build()?);
    Ok(DemoRuntime { recur, queue, fib })
}
