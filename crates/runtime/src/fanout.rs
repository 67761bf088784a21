//! Narrative delivery to connected users.
//!
//! Every connected user owns a bounded outbox. Delivery is fire-and-forget:
//! a message for an unknown, disconnected or saturated outbox is dropped and
//! traced, and never blocks the scheduler.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use game_core::{Messenger, RoomId, UserId};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{error, trace};

use crate::directory::ActorDirectory;

/// Default [`Messenger`] backed by per-user tokio channels.
pub struct MessageHub {
    directory: Arc<ActorDirectory>,
    outboxes: RwLock<HashMap<UserId, mpsc::Sender<String>>>,
    capacity: usize,
}

impl MessageHub {
    pub fn new(directory: Arc<ActorDirectory>, capacity: usize) -> Self {
        Self {
            directory,
            outboxes: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    /// Opens an outbox for `user`, replacing any previous connection.
    pub fn connect(&self, user: UserId) -> mpsc::Receiver<String> {
        let (tx, rx) = mpsc::channel(self.capacity);
        match self.outboxes.write() {
            Ok(mut outboxes) => {
                outboxes.insert(user, tx);
            }
            Err(_) => error!(target: "runtime::fanout", %user, "outbox lock poisoned"),
        }
        rx
    }

    /// Closes the outbox for `user`. Returns `false` if none was open.
    pub fn disconnect(&self, user: UserId) -> bool {
        self.outboxes
            .write()
            .map(|mut outboxes| outboxes.remove(&user).is_some())
            .unwrap_or(false)
    }

    pub fn is_connected(&self, user: UserId) -> bool {
        self.outboxes
            .read()
            .map(|outboxes| outboxes.contains_key(&user))
            .unwrap_or(false)
    }

    fn deliver(
        outboxes: &HashMap<UserId, mpsc::Sender<String>>,
        user: UserId,
        text: &str,
    ) {
        let Some(outbox) = outboxes.get(&user) else {
            trace!(target: "runtime::fanout", %user, "dropping message for offline user");
            return;
        };

        match outbox.try_send(text.to_owned()) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                trace!(target: "runtime::fanout", %user, "outbox full, message dropped");
            }
            Err(TrySendError::Closed(_)) => {
                trace!(target: "runtime::fanout", %user, "outbox closed, message dropped");
            }
        }
    }
}

impl Messenger for MessageHub {
    fn send_to_user(&self, user: UserId, text: &str) {
        match self.outboxes.read() {
            Ok(outboxes) => Self::deliver(&outboxes, user, text),
            Err(_) => error!(target: "runtime::fanout", %user, "outbox lock poisoned"),
        }
    }

    fn send_to_room(&self, room: RoomId, text: &str, exclude: &[UserId]) {
        let occupants = match self.directory.room_occupants(room) {
            Ok(occupants) => occupants,
            Err(err) => {
                error!(target: "runtime::fanout", %room, error = %err, "room broadcast skipped");
                return;
            }
        };

        let outboxes = match self.outboxes.read() {
            Ok(outboxes) => outboxes,
            Err(_) => {
                error!(target: "runtime::fanout", %room, "outbox lock poisoned");
                return;
            }
        };

        for user in occupants {
            if !exclude.contains(&user) {
                Self::deliver(&outboxes, user, text);
            }
        }
    }
}
