//! Frame-synchronized scheduler: worker pool, deadline queue, and admission gate

mod config;
mod core;
mod gate;
mod queue;
mod worker;

pub use config::SchedulerConfig;
pub use core::{Scheduler, SchedulerHandle};
pub use queue::SchedulerStats;
