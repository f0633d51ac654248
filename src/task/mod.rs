//! Task records: one-shot callables and resumable block chains
//!
//! A task is the unit of schedulable work. Simple tasks wrap a single
//! callable; chain tasks walk an ordered sequence of blocks whose return
//! codes drive continuation, forking, and re-enqueueing.

mod chain;
mod record;

pub use chain::{Block, Chain, Flow, block};
pub use record::Task;
