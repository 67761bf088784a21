//! Topic-based event bus for runtime events.
//!
//! Session lifecycle transitions and scheduler ticks are published to
//! separate topics so consumers subscribe only to what they need.

mod bus;
mod types;

pub use bus::{Event, EventBus, Topic};
pub use types::{SchedulerEvent, SessionEvent, TickReport};
