//! Deterministic casting rules and data types shared across the engine.
//!
//! `game-core` defines the canonical casting model (actors, dice, ability
//! definitions, the session state machine) and exposes pure APIs that the
//! async runtime and content crates build on. Every hook invocation flows
//! through [`session::CastSession`], and supporting crates depend on the types
//! re-exported here.
pub mod ability;
pub mod dice;
pub mod env;
pub mod error;
pub mod memory;
pub mod session;
pub mod state;

pub use ability::{
    AbilityConfig, AbilityDefinition, AbilityRegistry, AbilityScript, ParamKind, ParamSpec,
    ParamValue,
};
pub use dice::{Dice, DiceError, DiceSource, PcgDice, ScriptedDice, roll_sum};
pub use env::{ActorStore, Messenger};
pub use error::{CastError, ConfigError, ErrorSeverity, GameError, HookError, HookResult};
pub use session::{
    AbortReason, ActorRef, CastContext, CastEnv, CastSession, CastState, HookPhase,
    InterruptReason, SessionInfo,
};
pub use state::{AbilityId, Actor, ActorName, RoomId, SessionId, Tick, UserId, Vitals};
