//! Deadline-ordered queue and scheduler statistics

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Instant;

use crate::task::Task;

/// Heap entry pairing a task with its arrival sequence number.
struct Entry {
    seq: u64,
    task: Task,
}

impl Eq for Entry {}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.seq == other.seq
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so the max-heap yields the earliest deadline first;
        // equal deadlines fall back to arrival order
        other
            .task
            .deadline()
            .cmp(&self.task.deadline())
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Priority queue yielding tasks in earliest-deadline-first order.
pub(crate) struct DeadlineQueue {
    heap: BinaryHeap<Entry>,
    next_seq: u64,
}

impl DeadlineQueue {
    pub(crate) fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            next_seq: 0,
        }
    }

    /// Insert a task, tagging it with the next arrival sequence number
    pub(crate) fn push(&mut self, task: Task) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Entry { seq, task });
    }

    /// Pop the earliest-deadline task if it is due at `now`
    pub(crate) fn pop_due(&mut self, now: Instant) -> Option<Task> {
        if self.heap.peek().is_some_and(|entry| entry.task.is_due(now)) {
            self.heap.pop().map(|entry| entry.task)
        } else {
            None
        }
    }

    /// Deadline of the earliest task, if any
    pub(crate) fn next_deadline(&self) -> Option<Instant> {
        self.heap.peek().map(|entry| entry.task.deadline())
    }

    /// Drop every queued task
    pub(crate) fn clear(&mut self) {
        self.heap.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.heap.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

/// Counters accumulated over a scheduler's lifetime.
#[derive(Debug, Default, Clone)]
pub struct SchedulerStats {
    /// Tasks run to completion, including synchronous executes
    pub tasks_executed: u64,
    /// Chain continuations handed back to the queue
    pub chains_resumed: u64,
    /// Frame ticks serviced across all workers
    pub frame_ticks: u64,
    /// Highest concurrently-running task count observed
    pub peak_in_flight: usize,
    /// Deepest the queue has been
    pub peak_queue_depth: usize,
    /// Tasks waiting in the queue right now
    pub queued: usize,
    /// Task bodies running right now
    pub in_flight: usize,
}
