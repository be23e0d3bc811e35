use tracing_subscriber::EnvFilter;

/// Initialize a process-wide `tracing` subscriber.
///
/// Honors `RUST_LOG` if set, otherwise defaults to `info`. Safe to call
/// more than once (e.g. from both a binary's `main` and its test setup) —
/// subsequent calls are silently ignored rather than panicking.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
