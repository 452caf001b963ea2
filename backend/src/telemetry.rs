//! Tracing subscriber bootstrap.

use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

/// Install a JSON formatter filtered by `RUST_LOG`.
///
/// A subscriber that is already installed is left in place and the failure
/// is logged through it. Returns whether this call installed the subscriber.
pub fn init_tracing() -> bool {
    match fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "tracing init failed");
            false
        }
    }
}
