//! Engine configuration.

use std::time::Duration;

/// Configuration for a [`crate::engine::QotdEngine`].
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Prefix for every store key this engine writes.
    pub key_prefix: String,
    /// How long the background refill sleeps between sampling attempts.
    /// The loop must yield rather than spin; this is the yield.
    pub refill_retry_delay: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            key_prefix: "today".into(),
            refill_retry_delay: Duration::from_millis(50),
        }
    }
}
