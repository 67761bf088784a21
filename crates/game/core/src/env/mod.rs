//! Traits describing the world services the casting engine depends on.
//!
//! The engine never owns actors or connections. The surrounding server
//! provides an [`ActorStore`] (identity, location, health, session slot) and a
//! [`Messenger`] (narrative delivery); the runtime crate ships the default
//! implementations.

use crate::error::CastError;
use crate::state::{Actor, RoomId, SessionId, UserId};

/// Actor records with atomic per-actor mutation.
pub trait ActorStore: Send + Sync {
    /// Snapshot of an actor.
    ///
    /// # Errors
    ///
    /// `CastError::ActorNotFound` if the actor is absent or was removed.
    fn get_actor(&self, id: UserId) -> Result<Actor, CastError>;

    /// Adds `delta` to the actor's health and returns the new value.
    ///
    /// The result is clamped to `[0, max_health]`. Concurrent deltas on the
    /// same actor are serialized; none is lost.
    fn apply_health_delta(&self, id: UserId, delta: i64) -> Result<u32, CastError>;

    /// Attaches or releases the actor's active cast.
    ///
    /// Attaching fails with `CastError::AlreadyCasting` when a different
    /// session is already attached. `None` always releases.
    fn set_active_session(&self, id: UserId, session: Option<SessionId>)
    -> Result<(), CastError>;
}

/// Best-effort narrative delivery.
///
/// Text is opaque: inline style markers such as `<ansi fg="healing">` are
/// passed through untouched.
pub trait Messenger: Send + Sync {
    /// Delivers to one user. Unreachable recipients are silently skipped.
    fn send_to_user(&self, user: UserId, text: &str);

    /// Delivers to every actor in `room` except those listed in `exclude`.
    ///
    /// Membership is snapshotted once per call. Duplicate ids in `exclude`
    /// are harmless.
    fn send_to_room(&self, room: RoomId, text: &str, exclude: &[UserId]);
}
