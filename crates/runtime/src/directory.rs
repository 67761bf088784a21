//! Concurrent actor directory backing [`ActorStore`].
//!
//! Membership (who exists, who is in which room) lives under one
//! directory-wide `RwLock`; each actor record sits behind its own `Mutex`.
//! Health and session-slot updates only take the read lock plus the record
//! lock, so casts on different actors never contend. Locks are always taken
//! in that order (tables, then record).

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use game_core::{Actor, ActorStore, CastError, RoomId, SessionId, UserId};
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("actor directory lock poisoned")]
    LockPoisoned,
}

impl From<DirectoryError> for CastError {
    fn from(error: DirectoryError) -> Self {
        CastError::Directory(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DirectoryError>;

type Record = Arc<Mutex<Actor>>;

#[derive(Default)]
struct Tables {
    records: HashMap<UserId, Record>,
    rooms: HashMap<RoomId, BTreeSet<UserId>>,
}

impl Tables {
    fn join(&mut self, room: RoomId, id: UserId) {
        self.rooms.entry(room).or_default().insert(id);
    }

    fn leave(&mut self, room: RoomId, id: UserId) {
        if let Some(occupants) = self.rooms.get_mut(&room) {
            occupants.remove(&id);
            if occupants.is_empty() {
                self.rooms.remove(&room);
            }
        }
    }
}

/// Shared table of live actors.
#[derive(Default)]
pub struct ActorDirectory {
    tables: RwLock<Tables>,
}

impl ActorDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an actor, replacing any previous record with the same id.
    pub fn insert(&self, actor: Actor) -> Result<()> {
        let mut tables = self.write()?;
        let id = actor.id;

        if let Some(previous) = tables.records.get(&id).map(Arc::clone) {
            let previous_room = lock_record(&previous)?.room;
            tables.leave(previous_room, id);
        }

        tables.join(actor.room, id);
        tables.records.insert(id, Arc::new(Mutex::new(actor)));
        Ok(())
    }

    /// Removes an actor. Live casts involving it abort on their next hook.
    pub fn remove(&self, id: UserId) -> Result<Option<Actor>> {
        let mut tables = self.write()?;
        let Some(record) = tables.records.remove(&id) else {
            return Ok(None);
        };

        let actor = lock_record(&record)?.clone();
        tables.leave(actor.room, id);
        Ok(Some(actor))
    }

    /// Moves an actor to another room.
    pub fn move_to(&self, id: UserId, room: RoomId) -> std::result::Result<(), CastError> {
        let mut tables = self.write()?;
        let record = tables
            .records
            .get(&id)
            .map(Arc::clone)
            .ok_or(CastError::ActorNotFound(id))?;

        let previous = {
            let mut actor = lock_record(&record)?;
            std::mem::replace(&mut actor.room, room)
        };
        tables.leave(previous, id);
        tables.join(room, id);
        Ok(())
    }

    /// Atomic snapshot of the actors currently in `room`, in id order.
    pub fn room_occupants(&self, room: RoomId) -> Result<Vec<UserId>> {
        let tables = self.read()?;
        Ok(tables
            .rooms
            .get(&room)
            .map(|occupants| occupants.iter().copied().collect())
            .unwrap_or_default())
    }

    pub fn len(&self) -> usize {
        self.read().map(|tables| tables.records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn record(&self, id: UserId) -> std::result::Result<Record, CastError> {
        self.read()?
            .records
            .get(&id)
            .map(Arc::clone)
            .ok_or(CastError::ActorNotFound(id))
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>> {
        self.tables.read().map_err(|_| poisoned("read"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>> {
        self.tables.write().map_err(|_| poisoned("write"))
    }
}

impl ActorStore for ActorDirectory {
    fn get_actor(&self, id: UserId) -> std::result::Result<Actor, CastError> {
        let record = self.record(id)?;
        let actor = lock_record(&record)?.clone();
        Ok(actor)
    }

    fn apply_health_delta(&self, id: UserId, delta: i64) -> std::result::Result<u32, CastError> {
        let record = self.record(id)?;
        let health = lock_record(&record)?.vitals.apply_delta(delta);
        Ok(health)
    }

    fn set_active_session(
        &self,
        id: UserId,
        session: Option<SessionId>,
    ) -> std::result::Result<(), CastError> {
        let record = self.record(id)?;
        let mut actor = lock_record(&record)?;

        if let (Some(current), Some(requested)) = (actor.active_session, session)
            && current != requested
        {
            return Err(CastError::AlreadyCasting {
                actor: id,
                session: current,
            });
        }

        actor.active_session = session;
        Ok(())
    }
}

fn lock_record(record: &Mutex<Actor>) -> Result<MutexGuard<'_, Actor>> {
    record.lock().map_err(|_| poisoned("record"))
}

fn poisoned(lock: &'static str) -> DirectoryError {
    error!(target: "runtime::directory", lock, "actor directory lock poisoned");
    DirectoryError::LockPoisoned
}
