use serde::Deserialize;

use crate::error::RecurError;

/// The runtime's tunables: poll interval, CAS retry bound, visibility
/// timeout, and the optional spawn-limit ceiling.
///
/// Loaded by [`RunnerConfig::load`] from an optional `recur.toml` in the
/// working directory, layered under `RECUR__*` environment overrides
/// (e.g. `RECUR__POLL_INTERVAL_MS=10`), via the `config` crate — the same
/// layering strategy the teacher codebase uses for its own
/// `TaskerConfig`. `Default` matches the values this spec calls out
/// explicitly (a 100-attempt CAS bound, in particular).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// How long `wrrrk` sleeps after observing `QueueIsEmpty`.
    pub poll_interval_ms: u64,
    /// The CAS retry bound shared by `add_pending_return` and
    /// `with_pending_returns_remove`. A tripwire for non-linearizable
    /// backends, not a rate limiter.
    pub cas_retry_limit: usize,
    /// Passed to `Queue::set_message_timeout` where the backend honors
    /// it.
    pub visibility_timeout_secs: u64,
    /// Optional ceiling for the best-effort spawn-accounting cache.
    /// `None` disables the guard entirely.
    pub spawn_limit: Option<u64>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 50,
            cas_retry_limit: 100,
            visibility_timeout_secs: 30,
            spawn_limit: None,
        }
    }
}

impl RunnerConfig {
    /// Load configuration from `recur.toml` (if present) overlaid with
    /// `RECUR__*` environment variables, falling back to
    /// [`RunnerConfig::default`] values for anything unset.
    pub fn load() -> Result<Self, RecurError> {
        let defaults = Self::default();
        let settings = config::Config::builder()
            .set_default("poll_interval_ms", defaults.poll_interval_ms)
            .map_err(|e| RecurError::Backend(e.to_string()))?
            .set_default("cas_retry_limit", defaults.cas_retry_limit as i64)
            .map_err(|e| RecurError::Backend(e.to_string()))?
            .set_default("visibility_timeout_secs", defaults.visibility_timeout_secs)
            .map_err(|e| RecurError::Backend(e.to_string()))?
            .add_source(config::File::with_name("recur").required(false))
            .add_source(config::Environment::with_prefix("RECUR").separator("__"))
            .build()
            .map_err(|e| RecurError::Backend(e.to_string()))?;

        settings
            .try_deserialize()
            .map_err(|e| RecurError::Backend(e.to_string()))
    }
}
