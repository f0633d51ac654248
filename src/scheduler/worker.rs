//! Worker loop: frame ticks interleaved with deadline-ordered task draining

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Instant;

use tracing::debug;

use crate::subsystem::Subsystem;
use crate::task::{Chain, Task};

use super::core::Shared;

/// Next action for a worker, decided under the queue lock.
enum Step {
    /// The frame deadline arrived; run the subsystem's per-frame work
    Tick,
    /// A task's deadline has passed; run it
    Run(Task),
    /// Shutdown was signalled; terminate and exit
    Halt,
}

/// Body of one worker thread.
pub(crate) fn run(id: usize, shared: Arc<Shared>, mut subsystem: Option<Box<dyn Subsystem>>) {
    if let Some(sub) = subsystem.as_deref_mut() {
        debug!(worker = id, subsystem = sub.name(), "worker::run: thread init");
        sub.thread_init();
    }

    // Built once per thread; every task run on this worker threads its
    // continuations back into the queue through this closure.
    let resume = |chain: Chain| shared.resume_chain(chain);

    let mut next_frame = shared.start + shared.config.frame_period();

    loop {
        match next_step(&shared, next_frame) {
            Step::Tick => {
                if let Some(sub) = subsystem.as_deref_mut() {
                    sub.handle_events(next_frame);
                    sub.run_batch();
                }
                shared.frame_ticks.fetch_add(1, Ordering::Relaxed);
                next_frame += shared.config.frame_period();
                if next_frame < Instant::now() {
                    debug!(worker = id, "worker::run: frame ticks running behind");
                }
            }
            Step::Run(task) => {
                let permit = shared.gate.acquire();
                shared.peak_in_flight.fetch_max(permit.active(), Ordering::Relaxed);
                task.run(&resume);
                drop(permit);
                shared.tasks_executed.fetch_add(1, Ordering::Relaxed);
                shared.queue_cv.notify_all();
            }
            Step::Halt => {
                debug!(worker = id, "worker::run: halting");
                if let Some(sub) = subsystem.as_deref_mut() {
                    sub.terminate();
                }
                return;
            }
        }
    }
}

/// Block until the next thing this worker should do.
///
/// Waits against the earlier of the next task deadline and the frame
/// deadline; both checks happen under the queue lock so a submission or a
/// shutdown signal cannot slip between the check and the wait.
fn next_step(shared: &Shared, next_frame: Instant) -> Step {
    let mut queue = shared.queue.lock();
    loop {
        if shared.is_shutdown() {
            return Step::Halt;
        }
        let now = Instant::now();
        if now >= next_frame {
            return Step::Tick;
        }
        if let Some(task) = queue.pop_due(now) {
            return Step::Run(task);
        }

        let wake_at = queue.next_deadline().map_or(next_frame, |d| d.min(next_frame));
        shared.queue_cv.wait_until(&mut queue, wake_at);
    }
}
