//! Scheduler core: shared state, worker pool ownership, and submission

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use eyre::{Context, Result};
use parking_lot::{Condvar, Mutex};
use tracing::{debug, warn};

use crate::subsystem::Subsystem;
use crate::task::{Chain, Task};

use super::config::SchedulerConfig;
use super::gate::Gate;
use super::queue::{DeadlineQueue, SchedulerStats};
use super::worker;

/// State shared by every worker and every handle.
pub(crate) struct Shared {
    pub(crate) config: SchedulerConfig,
    pub(crate) start: Instant,
    pub(crate) queue: Mutex<DeadlineQueue>,
    pub(crate) queue_cv: Condvar,
    pub(crate) gate: Gate,
    pub(crate) shutdown: AtomicBool,
    pub(crate) tasks_executed: AtomicU64,
    pub(crate) chains_resumed: AtomicU64,
    pub(crate) frame_ticks: AtomicU64,
    pub(crate) peak_in_flight: AtomicUsize,
    pub(crate) peak_queue_depth: AtomicUsize,
}

impl Shared {
    fn new(config: SchedulerConfig) -> Self {
        let gate = Gate::new(config.max_running);
        Self {
            config,
            start: Instant::now(),
            queue: Mutex::new(DeadlineQueue::new()),
            queue_cv: Condvar::new(),
            gate,
            shutdown: AtomicBool::new(false),
            tasks_executed: AtomicU64::new(0),
            chains_resumed: AtomicU64::new(0),
            frame_ticks: AtomicU64::new(0),
            peak_in_flight: AtomicUsize::new(0),
            peak_queue_depth: AtomicUsize::new(0),
        }
    }

    /// Insert a task and wake one waiting worker
    pub(crate) fn push_task(&self, task: Task) {
        let depth = {
            let mut queue = self.queue.lock();
            // Checked under the queue lock; halt clears under the same
            // lock, so a submission racing shutdown cannot land after
            // the final clear
            if self.is_shutdown() {
                debug!(kind = task.kind(), "Shared::push_task: shut down, dropping task");
                return;
            }
            queue.push(task);
            queue.len()
        };
        self.peak_queue_depth.fetch_max(depth, Ordering::Relaxed);
        self.queue_cv.notify_one();
    }

    /// Re-enqueue a chain continuation after the configured retry delay
    pub(crate) fn resume_chain(&self, chain: Chain) {
        debug!(remaining = chain.remaining(), "Shared::resume_chain: called");
        self.chains_resumed.fetch_add(1, Ordering::Relaxed);

        let mut task = Task::chain(chain);
        task.reschedule(self.config.retry_delay());
        self.push_task(task);
    }

    pub(crate) fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    fn snapshot(&self) -> SchedulerStats {
        SchedulerStats {
            tasks_executed: self.tasks_executed.load(Ordering::Relaxed),
            chains_resumed: self.chains_resumed.load(Ordering::Relaxed),
            frame_ticks: self.frame_ticks.load(Ordering::Relaxed),
            peak_in_flight: self.peak_in_flight.load(Ordering::Relaxed),
            peak_queue_depth: self.peak_queue_depth.load(Ordering::Relaxed),
            queued: self.queue.lock().len(),
            in_flight: self.gate.in_flight(),
        }
    }
}

/// Owns the worker pool.
///
/// Dropping the scheduler (or calling [`Scheduler::shutdown`]) signals every
/// worker and joins them before returning.
pub struct Scheduler {
    shared: Arc<Shared>,
    workers: Vec<JoinHandle<()>>,
}

impl Scheduler {
    /// Validate the configuration, spawn the worker pool, and bind one
    /// subsystem per worker until the bindings run out. Workers beyond the
    /// bindings tick with no subsystem attached.
    pub fn start(config: SchedulerConfig, subsystems: Vec<Box<dyn Subsystem>>) -> Result<Self> {
        debug!(?config, "Scheduler::start: called");
        config.validate()?;

        if subsystems.len() > config.workers {
            warn!(
                bindings = subsystems.len(),
                workers = config.workers,
                "More subsystem bindings than workers; extras are dropped"
            );
        }

        let worker_count = config.workers;
        let shared = Arc::new(Shared::new(config));

        let mut bindings: Vec<Option<Box<dyn Subsystem>>> = subsystems.into_iter().map(Some).collect();
        bindings.resize_with(worker_count, || None);

        let mut workers = Vec::with_capacity(worker_count);
        for (id, binding) in bindings.into_iter().enumerate() {
            let shared = Arc::clone(&shared);
            let handle = std::thread::Builder::new()
                .name(format!("frame-worker-{}", id))
                .spawn(move || worker::run(id, shared, binding))
                .context("Failed to spawn worker thread")?;
            workers.push(handle);
        }

        debug!(count = workers.len(), "Scheduler::start: worker pool running");
        Ok(Self { shared, workers })
    }

    /// Cloneable handle for submitting work from any thread
    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Snapshot of queue depth, in-flight count, and lifetime counters
    pub fn stats(&self) -> SchedulerStats {
        self.shared.snapshot()
    }

    /// Signal every worker and join them.
    ///
    /// Tasks still queued when the workers exit are discarded; submissions
    /// arriving after shutdown are dropped.
    pub fn shutdown(mut self) {
        self.halt();
    }

    fn halt(&mut self) {
        if self.shared.shutdown.swap(true, Ordering::AcqRel) {
            return;
        }
        debug!("Scheduler::halt: signalling workers");
        self.shared.queue_cv.notify_all();

        for (id, handle) in self.workers.drain(..).enumerate() {
            if handle.join().is_err() {
                warn!(worker = id, "Scheduler::halt: worker exited by panic");
            }
        }

        let mut queue = self.shared.queue.lock();
        if !queue.is_empty() {
            debug!(dropped = queue.len(), "Scheduler::halt: discarding tasks still queued");
            queue.clear();
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.halt();
    }
}

/// Cheap, cloneable submission interface to a running scheduler.
#[derive(Clone)]
pub struct SchedulerHandle {
    shared: Arc<Shared>,
}

impl SchedulerHandle {
    /// Queue a task record for deadline-ordered execution
    pub fn queue(&self, task: Task) {
        debug!(kind = task.kind(), "SchedulerHandle::queue: called");
        self.shared.push_task(task);
    }

    /// Queue a one-shot callable eligible immediately
    pub fn submit<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.queue(Task::once(f));
    }

    /// Queue a one-shot callable eligible after `delay`
    pub fn submit_after<F>(&self, delay: Duration, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.queue(Task::once(f).after(delay));
    }

    /// Queue a chain eligible immediately
    pub fn submit_chain(&self, chain: Chain) {
        self.queue(Task::chain(chain));
    }

    /// Queue a chain eligible after `delay`
    pub fn submit_chain_after(&self, delay: Duration, chain: Chain) {
        self.queue(Task::chain(chain).after(delay));
    }

    /// Run a task on the calling thread right now, bypassing the queue and
    /// the admission gate. Chain continuations still go through the queue.
    pub fn execute(&self, task: Task) {
        debug!(kind = task.kind(), "SchedulerHandle::execute: called");
        let shared = Arc::clone(&self.shared);
        let resume = move |chain: Chain| shared.resume_chain(chain);
        task.run(&resume);
        self.shared.tasks_executed.fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshot of queue depth, in-flight count, and lifetime counters
    pub fn stats(&self) -> SchedulerStats {
        self.shared.snapshot()
    }
}
