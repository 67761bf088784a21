//! Identifiers and actor records observed by the casting engine.
//!
//! Actors are owned by the surrounding server; the engine only reads identity
//! and location and mutates health and the active-session slot through an
//! [`crate::env::ActorStore`].
mod actor;
mod ids;

pub use actor::{Actor, ActorName, Vitals};
pub use ids::{AbilityId, RoomId, SessionId, Tick, UserId};
