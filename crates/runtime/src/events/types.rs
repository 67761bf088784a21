//! Event types for different topics.

use game_core::{AbortReason, SessionId, SessionInfo, Tick, UserId};
use serde::{Deserialize, Serialize};

/// Lifecycle transitions of individual casts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionEvent {
    /// A cast was accepted and its slot claimed.
    Started { session: SessionInfo, tick: Tick },

    /// A channeling cast consumed one channel tick.
    Channeled {
        session: SessionId,
        source: UserId,
        remaining_ticks: u32,
        tick: Tick,
    },

    /// `on_resolve` completed.
    Resolved { session: SessionInfo, tick: Tick },

    /// The cast ended without resolving.
    Aborted {
        session: SessionInfo,
        reason: AbortReason,
        tick: Tick,
    },
}

impl SessionEvent {
    pub fn session_id(&self) -> SessionId {
        match self {
            Self::Started { session, .. }
            | Self::Resolved { session, .. }
            | Self::Aborted { session, .. } => session.id,
            Self::Channeled { session, .. } => *session,
        }
    }
}

/// Outcome counts of one scheduler tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickReport {
    pub tick: Tick,
    /// Sessions still channeling after this tick.
    pub channeling: usize,
    pub resolved: usize,
    pub aborted: usize,
}

/// Events emitted by the scheduler itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchedulerEvent {
    Ticked(TickReport),
}
