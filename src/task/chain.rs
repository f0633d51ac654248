//! Resumable block chains
//!
//! A chain is an immutable, reference-counted sequence of blocks plus a
//! cursor. Blocks return a [`Flow`] code that decides whether the chain
//! advances, repeats, forks, or hands itself back to the scheduler.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

/// Control code returned by a chain block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Abandon the chain; remaining blocks never run
    Stop,
    /// Advance to the next block
    Continue,
    /// Run the same block again in this scheduling slot
    Repeat,
    /// Fork a copy of the chain at the current block, then advance
    Split,
    /// Hand the chain back to the scheduler and retry this block later
    Requeue,
}

/// A single step of a chain.
pub type Block = Box<dyn Fn() -> Flow + Send + Sync>;

/// Wrap a closure as a chain block
pub fn block<F>(f: F) -> Block
where
    F: Fn() -> Flow + Send + Sync + 'static,
{
    Box::new(f)
}

/// A resumable sequence of blocks with a cursor.
///
/// The block sequence is shared; forks produced by [`Flow::Split`] point at
/// the same allocation and differ only in cursor position.
pub struct Chain {
    blocks: Arc<[Block]>,
    cursor: usize,
}

impl Chain {
    /// Create a chain owning its block sequence, cursor at the first block
    pub fn new(blocks: Vec<Block>) -> Self {
        Self {
            blocks: blocks.into(),
            cursor: 0,
        }
    }

    /// Create a chain over an already-shared block sequence
    pub fn from_shared(blocks: Arc<[Block]>) -> Self {
        Self { blocks, cursor: 0 }
    }

    /// Total number of blocks in the sequence
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// True for a chain with no blocks
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Blocks not yet completed, counting the current one
    pub fn remaining(&self) -> usize {
        self.blocks.len() - self.cursor
    }

    /// Copy of this chain at the current cursor, sharing the block sequence
    fn fork(&self) -> Self {
        Self {
            blocks: Arc::clone(&self.blocks),
            cursor: self.cursor,
        }
    }

    /// Walk blocks from the cursor until one stops, requeues, or the
    /// sequence ends. Consumes the chain; `Requeue` moves it into the
    /// `resume` callback, so this invocation can never touch it again.
    pub(crate) fn run(mut self, resume: &dyn Fn(Chain)) {
        while self.cursor < self.blocks.len() {
            match (self.blocks[self.cursor])() {
                Flow::Stop => {
                    debug!(cursor = self.cursor, "Chain::run: stopped");
                    return;
                }
                Flow::Continue => {
                    self.cursor += 1;
                }
                Flow::Repeat => {}
                Flow::Split => {
                    debug!(cursor = self.cursor, "Chain::run: forking at current block");
                    resume(self.fork());
                    self.cursor += 1;
                }
                Flow::Requeue => {
                    debug!(cursor = self.cursor, "Chain::run: handing back for retry");
                    resume(self);
                    return;
                }
            }
        }
    }
}

impl fmt::Debug for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chain")
            .field("cursor", &self.cursor)
            .field("len", &self.blocks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_chain_runs_all_blocks_in_order() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut blocks = Vec::new();
        for i in 0..3 {
            let calls = Arc::clone(&calls);
            blocks.push(block(move || {
                calls.lock().push(i);
                Flow::Continue
            }));
        }

        Chain::new(blocks).run(&|_| panic!("no handoff expected"));
        assert_eq!(*calls.lock(), vec![0, 1, 2]);
    }

    #[test]
    fn test_stop_abandons_remaining_blocks() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut blocks = Vec::new();
        for (i, flow) in [Flow::Continue, Flow::Stop, Flow::Continue].into_iter().enumerate() {
            let calls = Arc::clone(&calls);
            blocks.push(block(move || {
                calls.lock().push(i);
                flow
            }));
        }

        Chain::new(blocks).run(&|_| panic!("no handoff expected"));
        assert_eq!(*calls.lock(), vec![0, 1]);
    }

    #[test]
    fn test_repeat_runs_block_twice_before_advancing() {
        let calls = Arc::new(Mutex::new(Vec::new()));

        let first_calls = Arc::clone(&calls);
        let second_calls = Arc::clone(&calls);
        let blocks = vec![
            block(move || {
                let mut calls = first_calls.lock();
                calls.push("first");
                if calls.iter().filter(|c| **c == "first").count() == 1 {
                    Flow::Repeat
                } else {
                    Flow::Continue
                }
            }),
            block(move || {
                second_calls.lock().push("second");
                Flow::Continue
            }),
        ];

        Chain::new(blocks).run(&|_| panic!("no handoff expected"));
        assert_eq!(*calls.lock(), vec!["first", "first", "second"]);
    }

    #[test]
    fn test_split_forks_at_current_block() {
        let split_calls = Arc::new(AtomicUsize::new(0));
        let second_runs = Arc::new(AtomicUsize::new(0));

        let split_count = Arc::clone(&split_calls);
        let run_count = Arc::clone(&second_runs);
        let blocks = vec![
            block(move || {
                if split_count.fetch_add(1, Ordering::SeqCst) == 0 {
                    Flow::Split
                } else {
                    Flow::Continue
                }
            }),
            block(move || {
                run_count.fetch_add(1, Ordering::SeqCst);
                Flow::Continue
            }),
        ];

        let forks = Mutex::new(Vec::new());
        Chain::new(blocks).run(&|chain| forks.lock().push(chain));

        // Original fell through to the second block
        assert_eq!(second_runs.load(Ordering::SeqCst), 1);

        // Fork resumes at the splitting block, sharing the sequence
        let forked = forks.into_inner().pop().unwrap();
        assert_eq!(forked.remaining(), 2);

        forked.run(&|_| panic!("fork should not split again"));
        assert_eq!(split_calls.load(Ordering::SeqCst), 2);
        assert_eq!(second_runs.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_requeue_retries_same_block_later() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let finished = Arc::new(AtomicUsize::new(0));

        let attempt_count = Arc::clone(&attempts);
        let finish_count = Arc::clone(&finished);
        let blocks = vec![
            block(move || {
                if attempt_count.fetch_add(1, Ordering::SeqCst) == 0 {
                    Flow::Requeue
                } else {
                    Flow::Continue
                }
            }),
            block(move || {
                finish_count.fetch_add(1, Ordering::SeqCst);
                Flow::Continue
            }),
        ];

        let handed_back = Mutex::new(Vec::new());
        Chain::new(blocks).run(&|chain| handed_back.lock().push(chain));

        // First run stopped at the requeueing block without advancing
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert_eq!(finished.load(Ordering::SeqCst), 0);

        let resumed = handed_back.into_inner().pop().unwrap();
        assert_eq!(resumed.remaining(), 2);

        resumed.run(&|_| panic!("no further handoff expected"));
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
        assert_eq!(finished.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_empty_chain_completes_immediately() {
        Chain::new(Vec::new()).run(&|_| panic!("no handoff expected"));
    }

    #[test]
    fn test_from_shared_starts_at_first_block() {
        let ran = Arc::new(AtomicUsize::new(0));
        let count = Arc::clone(&ran);
        let blocks: Arc<[Block]> = vec![block(move || {
            count.fetch_add(1, Ordering::SeqCst);
            Flow::Continue
        })]
        .into();

        Chain::from_shared(Arc::clone(&blocks)).run(&|_| panic!("no handoff expected"));
        Chain::from_shared(blocks).run(&|_| panic!("no handoff expected"));
        assert_eq!(ran.load(Ordering::SeqCst), 2);
    }
}
