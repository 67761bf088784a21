//! Cloneable façade for issuing commands to the runtime.
//!
//! [`RuntimeHandle`] hides channel plumbing and offers async helpers for
//! starting and cancelling casts, stepping the scheduler, or streaming events
//! from specific topics.
use tokio::sync::{broadcast, mpsc, oneshot};

use game_core::{AbilityId, InterruptReason, SessionInfo, UserId};

use super::errors::{Result, RuntimeError};
use crate::events::{Event, EventBus, TickReport, Topic};
use crate::workers::Command;

/// Client-facing handle to interact with the runtime
#[derive(Clone)]
pub struct RuntimeHandle {
    command_tx: mpsc::Sender<Command>,
    event_bus: EventBus,
}

impl RuntimeHandle {
    pub(crate) fn new(command_tx: mpsc::Sender<Command>, event_bus: EventBus) -> Self {
        Self {
            command_tx,
            event_bus,
        }
    }

    async fn request<T>(&self, command: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(command(reply_tx))
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }

    /// Start casting `ability` from `source` on `target`.
    ///
    /// Returns the session snapshot right after `on_initiate`; instant
    /// abilities are already `Resolved`, declined casts already `Aborted`.
    ///
    /// # Errors
    ///
    /// `CastError::AbilityNotFound`, `CastError::ActorNotFound` or
    /// `CastError::AlreadyCasting` wrapped in [`RuntimeError::Cast`].
    pub async fn begin_cast(
        &self,
        source: UserId,
        target: UserId,
        ability: impl Into<AbilityId>,
    ) -> Result<SessionInfo> {
        let ability = ability.into();
        let info = self
            .request(|reply| Command::BeginCast {
                source,
                target,
                ability,
                reply,
            })
            .await??;
        Ok(info)
    }

    /// Cancel the live cast of `source`.
    ///
    /// Returns `false` if `source` had nothing to interrupt.
    pub async fn interrupt(&self, source: UserId, reason: InterruptReason) -> Result<bool> {
        self.request(|reply| Command::Interrupt {
            source,
            reason,
            reply,
        })
        .await
    }

    /// Advance the scheduler by one tick, independent of the automatic timer.
    pub async fn tick(&self) -> Result<TickReport> {
        self.request(|reply| Command::Tick { reply }).await
    }

    /// Snapshot of the live cast of `source`, if any.
    pub async fn session(&self, source: UserId) -> Result<Option<SessionInfo>> {
        self.request(|reply| Command::QuerySession { source, reply })
            .await
    }

    /// Snapshots of every live cast.
    pub async fn live_sessions(&self) -> Result<Vec<SessionInfo>> {
        self.request(|reply| Command::LiveSessions { reply }).await
    }

    /// Abort every live cast and stop the scheduler worker.
    pub(crate) async fn shutdown(&self) -> Result<()> {
        self.request(|reply| Command::Shutdown { reply }).await
    }

    /// Subscribe to events from a specific topic
    ///
    /// # Topics
    ///
    /// - `Topic::Session` - Cast started, channeled, resolved, aborted
    /// - `Topic::Scheduler` - Tick reports
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use runtime::Topic;
    ///
    /// let mut casts = handle.subscribe(Topic::Session);
    /// while let Ok(event) = casts.recv().await {
    ///     // Handle cast lifecycle events
    /// }
    /// ```
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.event_bus.subscribe(topic)
    }

    /// Subscribe to multiple topics at once
    ///
    /// Returns a map of topic to receiver for each requested topic.
    pub fn subscribe_multiple(
        &self,
        topics: &[Topic],
    ) -> std::collections::HashMap<Topic, broadcast::Receiver<Event>> {
        self.event_bus.subscribe_multiple(topics)
    }
}
