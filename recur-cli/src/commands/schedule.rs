use std::time::Duration;

use tracing::info;

use crate::output;
use crate::runtime_setup;

/// Schedules `fib(n)`, drives the worker loop to quiescence in-process
/// (since the demo backend is not shared across invocations), and
/// prints the memoized result.
pub async fn run(n: u64) -> anyhow::Result<()> {
    let rt = runtime_setup::build()?;

    let call = rt.recur.schedule(rt.fib.name(), n).await?;
    output::success(format!("scheduled fib({n}) as {}", call.memo_key));

    let watchdog_queue = rt.queue.clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_millis(20)).await;
            let Ok(info) = watchdog_queue.get_info().await else {
                break;
            };
            if info.num_messages == 0 {
                // Double-check after a short grace period: a worker may be
                // mid-invocation and about to re-enqueue a deferred child.
                tokio::time::sleep(Duration::from_millis(100)).await;
                if matches!(watchdog_queue.get_info().await, Ok(i) if i.num_messages == 0) {
                    watchdog_queue.close();
                    break;
                }
            }
        }
    });

    rt.recur.wrrrk().await?;
    info!("worker loop drained to quiescence");

    let value: u64 = rt.recur.read("fib", n).await?;
    output::label("fib", n);
    output::label("result", value);
    Ok(())
}
