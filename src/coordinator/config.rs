//! Coordinator configuration

use serde::{Deserialize, Serialize};

/// Configuration for the formation coordinator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// Unified scheduler tick (ms): frame republish + status aggregation.
    /// One deliberate tick replaces the original pair of racing timers.
    pub tick_ms: u64,
    /// Bounded wait for remote action endpoints during Initializing (s)
    pub init_timeout_secs: u64,
    /// Capacity of the per-mission feedback channel; ticks never block on a
    /// slow consumer, overflow frames are dropped
    pub feedback_buffer: usize,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            tick_ms: 50,
            init_timeout_secs: 5,
            feedback_buffer: 32,
        }
    }
}
