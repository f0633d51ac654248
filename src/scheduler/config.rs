//! Scheduler configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use eyre::Result;

use crate::clock;

/// Scheduler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Worker threads in the pool
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Max task bodies running at once across all workers
    #[serde(default = "default_max_running", rename = "max-running")]
    pub max_running: usize,

    /// Frame tick rate in Hz
    #[serde(default = "default_frame_hz", rename = "frame-hz")]
    pub frame_hz: u32,

    /// Delay before a handed-back chain becomes eligible again, in milliseconds
    #[serde(default = "default_retry_delay_ms", rename = "retry-delay-ms")]
    pub retry_delay_ms: u64,
}

fn default_workers() -> usize {
    4
}

fn default_max_running() -> usize {
    4
}

fn default_frame_hz() -> u32 {
    clock::FRAME_RATE
}

fn default_retry_delay_ms() -> u64 {
    5
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            max_running: 4,
            frame_hz: clock::FRAME_RATE,
            retry_delay_ms: 5,
        }
    }
}

impl SchedulerConfig {
    /// Get the frame period as a Duration
    ///
    /// A zero `frame-hz` is clamped to one rather than panicking;
    /// `validate` still rejects it before a pool starts.
    pub fn frame_period(&self) -> Duration {
        Duration::from_secs(1) / self.frame_hz.max(1)
    }

    /// Get the chain retry delay as a Duration
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Reject configurations the worker pool cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(eyre::eyre!("scheduler.workers must be at least 1"));
        }
        if self.max_running == 0 {
            return Err(eyre::eyre!("scheduler.max-running must be at least 1"));
        }
        if self.frame_hz == 0 {
            return Err(eyre::eyre!("scheduler.frame-hz must be at least 1"));
        }
        Ok(())
    }
}
