//! Worker tasks that back the runtime orchestration.
//!
//! The scheduler worker owns every live cast and is the only task that runs
//! ability hooks.

mod scheduler;

pub use scheduler::{Command, SchedulerWorker};
