//! Runtime orchestration for the ability-casting engine.
//!
//! This crate wires the pure session state machine from `game-core` to an
//! async scheduler, a concurrent actor directory and per-user message
//! outboxes. Consumers embed [`Runtime`] to start and cancel casts, subscribe
//! to events, and share world state through [`RuntimeHandle`].
//!
//! Modules are organized by responsibility:
//! - [`runtime`] hosts the orchestrator and builder
//! - [`api`] exposes the types downstream clients interact with
//! - [`events`] provides topic-based event bus for flexible event routing
//! - [`directory`] and [`fanout`] implement the world services hooks use
//! - [`workers`] keeps background tasks internal to the crate
pub mod api;
pub mod config;
pub mod dice;
pub mod directory;
pub mod events;
pub mod fanout;
pub mod runtime;

mod workers;

pub use api::{Result, RuntimeError, RuntimeHandle};
pub use config::RuntimeConfig;
pub use dice::EntropyDice;
pub use directory::{ActorDirectory, DirectoryError};
pub use events::{Event, EventBus, SchedulerEvent, SessionEvent, TickReport, Topic};
pub use fanout::MessageHub;
pub use runtime::{Runtime, RuntimeBuilder};
