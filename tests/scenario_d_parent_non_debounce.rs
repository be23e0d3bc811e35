//! The explicit anti-feature named in the design doc: unlike child
//! scheduling (debounced via the pending-returns CAS loop), a parent's
//! own re-invocation is never debounced — every distinct child
//! completion fans out an independent re-enqueue of the parent,
//! regardless of how many of those re-enqueues turn out to be
//! redundant once the parent's value is actually written.
//!
//! With a FIFO, single-process queue, every child of one fan-out wave is
//! drained before any of the parent's redundant re-enqueues reach the
//! front — so the handler-invocation count this test observes is the
//! best case the protocol allows, not the worst case a truly concurrent,
//! non-FIFO backend could produce. The bound below is deliberately loose
//! to hold under either.

mod support;

use std::sync::Arc;

use recur_backend_memory::{InMemoryCache, InMemoryQueue, InMemoryStore};
use recur_codec_json::JsonCodec;
use recur_core::{Recur, RecurError, RunnerConfig, TaskContext};
use support::Counters;

const CHILDREN: u64 = 20;

#[tokio::test]
async fn parent_is_not_debounced_across_distinct_child_completions() {
    let counters = Counters::new();
    let queue = Arc::new(InMemoryQueue::new());
    let mut builder = Recur::builder()
        .with_store(Arc::new(InMemoryStore::new()))
        .with_queue(queue.clone())
        .with_codec(Arc::new(JsonCodec::new()))
        .with_cache(Arc::new(InMemoryCache::new()))
        .with_config(RunnerConfig::default());

    let counters_for_one = counters.clone();
    let one = builder.register_task("one", move |_ctx: TaskContext, i: u64| {
        let counters = counters_for_one.clone();
        async move {
            counters.bump(format!("one({i})"));
            Ok::<u64, RecurError>(i)
        }
    });

    let counters_for_foo = counters.clone();
    let one_for_foo = one.clone();
    let foo = builder.register_task("foo", move |ctx: TaskContext, a: u64| {
        let counters = counters_for_foo.clone();
        let one = one_for_foo.clone();
        async move {
            counters.bump("foo");
            let batch: Vec<u64> = (0..a).collect();
            let results = one.map(&ctx, batch).await?;
            Ok(results.into_iter().sum::<u64>())
        }
    });

    let recur = Arc::new(builder.build().unwrap());
    recur.schedule(foo.name(), CHILDREN).await.unwrap();
    support::drain_to_quiescence(recur.clone(), queue).await.unwrap();

    let result: u64 = recur.read("foo", CHILDREN).await.unwrap();
    assert_eq!(result, (0..CHILDREN).sum::<u64>());

    for i in 0..CHILDREN {
        assert_eq!(counters.get(&format!("one({i})")), 1, "one({i}) must run exactly once");
    }

    let foo_invocations = counters.get("foo");
    assert!(
        foo_invocations >= 2,
        "foo must be re-invoked at least once after its children complete, got {foo_invocations}"
    );
    assert!(
        foo_invocations <= CHILDREN + 1,
        "foo re-invocations are bounded by one initial plus one per child completion, got {foo_invocations}"
    );
}
