//! Concurrency admission gate

use parking_lot::{Condvar, Mutex};
use tracing::debug;

/// Bounds how many task bodies may run at once across all workers.
///
/// Frame ticks bypass the gate; only task bodies popped from the queue
/// count against the limit.
pub(crate) struct Gate {
    limit: usize,
    running: Mutex<usize>,
    available: Condvar,
}

impl Gate {
    pub(crate) fn new(limit: usize) -> Self {
        Self {
            limit,
            running: Mutex::new(0),
            available: Condvar::new(),
        }
    }

    /// Block until a slot frees up, then claim it.
    ///
    /// The permit releases the slot on drop, including during unwinding, so
    /// a panicking task cannot leak capacity.
    pub(crate) fn acquire(&self) -> GatePermit<'_> {
        let mut running = self.running.lock();
        while *running >= self.limit {
            debug!(running = *running, limit = self.limit, "Gate::acquire: saturated, waiting");
            self.available.wait(&mut running);
        }
        *running += 1;
        GatePermit {
            gate: self,
            active: *running,
        }
    }

    /// Task bodies currently holding a slot
    pub(crate) fn in_flight(&self) -> usize {
        *self.running.lock()
    }
}

/// Claim on one admission slot.
pub(crate) struct GatePermit<'a> {
    gate: &'a Gate,
    active: usize,
}

impl GatePermit<'_> {
    /// In-flight count observed at acquisition, this permit included
    pub(crate) fn active(&self) -> usize {
        self.active
    }
}

impl Drop for GatePermit<'_> {
    fn drop(&mut self) {
        let mut running = self.gate.running.lock();
        *running -= 1;
        drop(running);
        self.gate.available.notify_one();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_acquire_up_to_limit_without_blocking() {
        let gate = Gate::new(2);
        let first = gate.acquire();
        let second = gate.acquire();

        assert_eq!(first.active(), 1);
        assert_eq!(second.active(), 2);
        assert_eq!(gate.in_flight(), 2);

        drop(first);
        drop(second);
        assert_eq!(gate.in_flight(), 0);
    }

    #[test]
    fn test_saturated_gate_blocks_until_release() {
        let gate = Arc::new(Gate::new(1));
        let held = gate.acquire();

        let observed = Arc::new(AtomicUsize::new(0));
        let gate2 = Arc::clone(&gate);
        let observed2 = Arc::clone(&observed);
        let waiter = thread::spawn(move || {
            let permit = gate2.acquire();
            observed2.store(permit.active(), Ordering::SeqCst);
        });

        // Waiter cannot get through while the slot is held
        thread::sleep(Duration::from_millis(50));
        assert_eq!(observed.load(Ordering::SeqCst), 0);

        drop(held);
        waiter.join().unwrap();
        assert_eq!(observed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_permit_releases_on_panic() {
        let gate = Arc::new(Gate::new(1));

        let gate2 = Arc::clone(&gate);
        let result = thread::spawn(move || {
            let _permit = gate2.acquire();
            panic!("task body failed");
        })
        .join();
        assert!(result.is_err());

        // Slot came back despite the unwind
        assert_eq!(gate.in_flight(), 0);
        let _permit = gate.acquire();
    }
}
