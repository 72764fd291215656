//! Subprocess timeouts configured through environment variables.

use std::env;
use std::time::Duration;

use tracing::warn;

/// Read a timeout in seconds from `var`, falling back to `default_secs`.
///
/// An unset or empty variable uses the default silently; a value that is not
/// a non-negative integer logs a warning and uses the default.
pub(crate) fn timeout_from_env(var: &str, default_secs: u64) -> Duration {
    match env::var(var) {
        Ok(v) if !v.is_empty() => match v.parse::<u64>() {
            Ok(secs) => Duration::from_secs(secs),
            Err(_) => {
                warn!("Invalid {} value '{}', using default {}s", var, v, default_secs);
                Duration::from_secs(default_secs)
            }
        },
        _ => Duration::from_secs(default_secs),
    }
}
