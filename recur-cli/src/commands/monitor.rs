use chrono::Utc;

use crate::output;
use crate::runtime_setup;

/// Prints a best-effort snapshot of queue depth for a freshly built demo
/// runtime. Against a real, process-shared backend this is the same
/// `Queue::get_info` call a production `monitor` subcommand would poll
/// on an interval; here it only ever reports the state of a brand-new,
/// empty queue, so there is nothing to loop on.
pub async fn run() -> anyhow::Result<()> {
    let rt = runtime_setup::build()?;
    let info = rt.queue.get_info().await?;

    output::label("checked_at", Utc::now().to_rfc3339());
    output::label("num_messages", info.num_messages);
    output::label("num_inflight", info.num_inflight);
    Ok(())
}
