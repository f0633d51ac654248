//! Subsystem contract for frame-driven engine components

use std::time::Instant;

/// A frame-driven component bound to one worker thread.
///
/// The scheduler calls `thread_init` once when its worker starts, then
/// `handle_events` and `run_batch` once per frame tick, and `terminate`
/// when the scheduler shuts down. All four run on the bound thread, so
/// implementations may hold thread-affine resources such as a rendering
/// context.
pub trait Subsystem: Send {
    /// One-time setup on the bound worker thread, before the first tick
    fn thread_init(&mut self) {}

    /// Apply queued events up to `frame_deadline`; the only place the
    /// subsystem's committed state may change
    fn handle_events(&mut self, frame_deadline: Instant);

    /// Heavier per-frame processing over the state committed by
    /// `handle_events`
    fn run_batch(&mut self);

    /// Teardown on the bound worker thread at scheduler shutdown
    fn terminate(&mut self) {}

    /// Name used in logs
    fn name(&self) -> &str {
        "subsystem"
    }
}
