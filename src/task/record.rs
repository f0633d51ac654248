//! Task records and deadline bookkeeping

use std::fmt;
use std::time::{Duration, Instant};

use super::chain::Chain;

/// Work carried by a task record.
enum Work {
    Once(Box<dyn FnOnce() + Send>),
    Chain(Chain),
}

/// A schedulable unit of work with an earliest-eligible deadline.
pub struct Task {
    deadline: Instant,
    work: Work,
}

impl Task {
    /// One-shot task eligible immediately
    pub fn once<F>(f: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            deadline: Instant::now(),
            work: Work::Once(Box::new(f)),
        }
    }

    /// Chain task eligible immediately
    pub fn chain(chain: Chain) -> Self {
        Self {
            deadline: Instant::now(),
            work: Work::Chain(chain),
        }
    }

    /// Shift the deadline to `delay` from now
    pub fn after(mut self, delay: Duration) -> Self {
        self.deadline = Instant::now() + delay;
        self
    }

    /// Reset the deadline to `delay` from now.
    ///
    /// Only meaningful outside the queue; ownership transfer keeps a queued
    /// record out of reach of its producer.
    pub fn reschedule(&mut self, delay: Duration) {
        self.deadline = Instant::now() + delay;
    }

    /// Earliest time this task may run
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// True once the deadline has been reached
    pub fn is_due(&self, now: Instant) -> bool {
        self.deadline <= now
    }

    /// Short label for logs
    pub(crate) fn kind(&self) -> &'static str {
        match self.work {
            Work::Once(_) => "once",
            Work::Chain(_) => "chain",
        }
    }

    /// Run the task to completion on the calling thread, consuming it.
    /// Chains may hand a successor record to `resume` on their way out.
    pub(crate) fn run(self, resume: &dyn Fn(Chain)) {
        match self.work {
            Work::Once(f) => f(),
            Work::Chain(chain) => chain.run(resume),
        }
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("kind", &self.kind())
            .field("deadline", &self.deadline)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{Flow, block};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_once_task_is_due_immediately() {
        let task = Task::once(|| {});
        assert!(task.is_due(Instant::now()));
    }

    #[test]
    fn test_after_defers_eligibility() {
        let now = Instant::now();
        let task = Task::once(|| {}).after(Duration::from_millis(50));

        assert!(!task.is_due(now));
        assert!(task.is_due(now + Duration::from_secs(1)));
    }

    #[test]
    fn test_reschedule_moves_deadline_forward() {
        let mut task = Task::once(|| {});
        let original = task.deadline();

        task.reschedule(Duration::from_millis(100));
        assert!(task.deadline() > original);
    }

    #[test]
    fn test_run_invokes_callable_once() {
        let ran = Arc::new(AtomicUsize::new(0));
        let count = Arc::clone(&ran);
        let task = Task::once(move || {
            count.fetch_add(1, Ordering::SeqCst);
        });

        task.run(&|_| panic!("one-shot tasks never hand off"));
        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_run_drives_chain_work() {
        let ran = Arc::new(AtomicUsize::new(0));
        let count = Arc::clone(&ran);
        let chain = Chain::new(vec![block(move || {
            count.fetch_add(1, Ordering::SeqCst);
            Flow::Continue
        })]);

        Task::chain(chain).run(&|_| panic!("nothing to hand off"));
        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_kind_labels() {
        assert_eq!(Task::once(|| {}).kind(), "once");
        assert_eq!(Task::chain(Chain::new(Vec::new())).kind(), "chain");
    }
}
