//! Production Environment implementation using OS randomness.

use scs_core::Environment;

/// Production environment drawing fault-injection randomness from the OS.
///
/// Sessions driven by this environment are not reproducible; use
/// [`scs_harness::SimEnv`] with a seed for that.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    fn random_bytes(&self, buffer: &mut [u8]) {
        getrandom::fill(buffer).unwrap_or_else(|e| {
            // NOTE: Only fails on unsupported platforms. Zeros make every
            // fault draw fail, which is loud in the session log.
            tracing::error!("getrandom failed: {}", e);
            buffer.fill(0);
        });
    }
}
