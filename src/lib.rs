//! FrameSched - Frame-Synchronized Task Scheduler
//!
//! FrameSched runs a pool of worker threads that interleave deadline-ordered
//! task execution with a fixed-rate frame tick. Each worker can carry an
//! engine subsystem whose per-frame work runs on that worker's thread, while
//! submitted tasks drain between frames.
//!
//! # Core Concepts
//!
//! - **Frame Pacing**: Every worker ticks its subsystem at a fixed rate, even
//!   when tasks are waiting
//! - **Deadline Ordering**: Queued tasks run earliest-deadline-first once due
//! - **Bounded Admission**: A gate caps how many tasks run at once across the
//!   whole pool
//! - **Resumable Chains**: Multi-block tasks can stop, repeat, fork, or hand
//!   themselves back for a later retry
//!
//! # Modules
//!
//! - [`task`] - Task records, chains, and block flow control
//! - [`scheduler`] - Worker pool, deadline queue, and admission gate
//! - [`subsystem`] - Per-worker subsystem trait
//! - [`events`] - Thread-safe event queue for frame handlers
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod cli;
pub mod clock;
pub mod config;
pub mod events;
pub mod scheduler;
pub mod subsystem;
pub mod task;

// Re-export commonly used types
pub use config::{Config, WorkloadConfig};
pub use events::EventQueue;
pub use scheduler::{Scheduler, SchedulerConfig, SchedulerHandle, SchedulerStats};
pub use subsystem::Subsystem;
pub use task::{Block, Chain, Flow, Task, block};
