//! The task registered by this binary's demo subcommands: a classic
//! memoized Fibonacci, expressed as a self-recursive `recur` task rather
//! than a plain function — every `fib(n-1)`/`fib(n-2)` call is itself a
//! scheduled, memoized call through the runtime.

use std::sync::{Arc, OnceLock};

use recur_core::{CallableProxy, RecurBuilder, TaskContext};

pub fn register(builder: &mut RecurBuilder) -> CallableProxy<u64, u64> {
    let self_ref: Arc<OnceLock<CallableProxy<u64, u64>>> = Arc::new(OnceLock::new());
    let self_ref_for_handler = self_ref.clone();
    let proxy = builder.register_task("fib", move |ctx: TaskContext, n: u64| {
        let self_ref = self_ref_for_handler.clone();
        async move {
            if n < 2 {
                return Ok(n);
            }
            let fib = self_ref.get().expect("fib proxy installed before first invocation").clone();
            let a = fib.call(&ctx, n - 1).await?;
            let b = fib.call(&ctx, n - 2).await?;
            Ok(a + b)
        }
    });
    self_ref
        .set(proxy.clone())
        .unwrap_or_else(|_| unreachable!("set once, immediately after registration"));
    proxy
}
