//! In-memory [`ActorStore`] and [`Messenger`] implementations for tests and
//! local runs.
//!
//! These favor simplicity over throughput: one mutex guards everything. The
//! runtime crate provides the concurrent directory and the channel-backed
//! fan-out used in production.

use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::env::{ActorStore, Messenger};
use crate::error::CastError;
use crate::state::{Actor, RoomId, SessionId, UserId};

/// Single-lock actor table.
#[derive(Debug, Default)]
pub struct InMemoryActors {
    actors: Mutex<BTreeMap<UserId, Actor>>,
}

impl InMemoryActors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_actors(actors: impl IntoIterator<Item = Actor>) -> Self {
        let store = Self::new();
        for actor in actors {
            store.insert(actor);
        }
        store
    }

    pub fn insert(&self, actor: Actor) {
        if let Ok(mut actors) = self.actors.lock() {
            actors.insert(actor.id, actor);
        }
    }

    pub fn remove(&self, id: UserId) -> Option<Actor> {
        self.actors.lock().ok()?.remove(&id)
    }

    /// Moves an actor without touching anything else.
    pub fn move_to(&self, id: UserId, room: RoomId) -> Result<(), CastError> {
        let mut actors = self.lock()?;
        let actor = actors.get_mut(&id).ok_or(CastError::ActorNotFound(id))?;
        actor.room = room;
        Ok(())
    }

    /// Current health, or `None` if the actor is gone.
    pub fn health(&self, id: UserId) -> Option<u32> {
        self.get_actor(id).ok().map(|actor| actor.vitals.health())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<UserId, Actor>>, CastError> {
        self.actors
            .lock()
            .map_err(|_| CastError::Directory("in-memory actor lock poisoned".into()))
    }
}

impl ActorStore for InMemoryActors {
    fn get_actor(&self, id: UserId) -> Result<Actor, CastError> {
        self.lock()?
            .get(&id)
            .cloned()
            .ok_or(CastError::ActorNotFound(id))
    }

    fn apply_health_delta(&self, id: UserId, delta: i64) -> Result<u32, CastError> {
        let mut actors = self.lock()?;
        let actor = actors.get_mut(&id).ok_or(CastError::ActorNotFound(id))?;
        Ok(actor.vitals.apply_delta(delta))
    }

    fn set_active_session(
        &self,
        id: UserId,
        session: Option<SessionId>,
    ) -> Result<(), CastError> {
        let mut actors = self.lock()?;
        let actor = actors.get_mut(&id).ok_or(CastError::ActorNotFound(id))?;
        match (actor.active_session, session) {
            (Some(current), Some(requested)) if current != requested => {
                Err(CastError::AlreadyCasting {
                    actor: id,
                    session: current,
                })
            }
            _ => {
                actor.active_session = session;
                Ok(())
            }
        }
    }
}

/// One recorded messenger call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Delivery {
    User {
        user: UserId,
        text: String,
    },
    Room {
        room: RoomId,
        text: String,
        exclude: Vec<UserId>,
    },
}

/// Records every call instead of delivering it.
#[derive(Debug, Default)]
pub struct RecordingMessenger {
    deliveries: Mutex<Vec<Delivery>>,
}

impl RecordingMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    /// All calls in order.
    pub fn deliveries(&self) -> Vec<Delivery> {
        self.deliveries
            .lock()
            .map(|deliveries| deliveries.clone())
            .unwrap_or_default()
    }

    /// Texts sent directly to `user`.
    pub fn sent_to(&self, user: UserId) -> Vec<String> {
        self.deliveries()
            .into_iter()
            .filter_map(|delivery| match delivery {
                Delivery::User { user: to, text } if to == user => Some(text),
                _ => None,
            })
            .collect()
    }

    /// Room broadcasts to `room`, with their exclusion lists.
    pub fn broadcasts(&self, room: RoomId) -> Vec<(String, Vec<UserId>)> {
        self.deliveries()
            .into_iter()
            .filter_map(|delivery| match delivery {
                Delivery::Room {
                    room: to,
                    text,
                    exclude,
                } if to == room => Some((text, exclude)),
                _ => None,
            })
            .collect()
    }

    fn record(&self, delivery: Delivery) {
        if let Ok(mut deliveries) = self.deliveries.lock() {
            deliveries.push(delivery);
        }
    }
}

impl Messenger for RecordingMessenger {
    fn send_to_user(&self, user: UserId, text: &str) {
        self.record(Delivery::User {
            user,
            text: text.to_string(),
        });
    }

    fn send_to_room(&self, room: RoomId, text: &str, exclude: &[UserId]) {
        self.record(Delivery::Room {
            room,
            text: text.to_string(),
            exclude: exclude.to_vec(),
        });
    }
}
