//! Frame timing helpers

use std::time::Duration;

/// Nominal frame rate driven by every worker thread
pub const FRAME_RATE: u32 = 60;

/// Length of one frame at the nominal rate
pub fn frame_period() -> Duration {
    Duration::from_secs(1) / FRAME_RATE
}

/// Length of `n` frames at the nominal rate
pub fn frames(n: u32) -> Duration {
    frame_period() * n
}
