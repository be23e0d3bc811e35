use crate::output;

/// Resets runtime-local state. Against a persistent backend this would
/// truncate the store's three record families and purge the queue; the
/// in-memory demo backend never outlives the process that built it, so
/// there is nothing here to reset — the subcommand exists to keep this
/// binary's surface matching the design doc's CLI contract.
pub async fn run() -> anyhow::Result<()> {
    output::dim("the in-memory demo backend holds no state across invocations; nothing to reset");
    Ok(())
}
