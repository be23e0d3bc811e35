use tracing::info;

use crate::output;
use crate::runtime_setup;

/// Drives the worker loop until Ctrl-C, since nothing else shares this
/// demo binary's in-memory queue to eventually close it. A real
/// deployment wires in `recur-backend-pg` (or another persistent
/// `Store`/`Queue` pair) so this subcommand can run as a long-lived,
/// horizontally-scaled process draining work other processes schedule.
pub async fn run() -> anyhow::Result<()> {
    let rt = runtime_setup::build()?;
    output::dim("worker loop running (ctrl-c to stop)");

    tokio::select! {
        result = rt.recur.wrrrk() => {
            result?;
            info!("worker loop exited: queue closed");
        }
        _ = tokio::signal::ctrl_c() => {
            rt.queue.close();
            info!("ctrl-c received, worker loop stopping");
        }
    }
    Ok(())
}
