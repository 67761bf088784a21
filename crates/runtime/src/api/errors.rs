//! Unified error types surfaced by the runtime API.
//!
//! Wraps cast failures and worker coordination failures so clients can bubble
//! them up with consistent context.
use game_core::{CastError, ErrorSeverity, GameError};
use thiserror::Error;
use tokio::sync::oneshot;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Cast(#[from] CastError),

    #[error("scheduler worker command channel closed")]
    CommandChannelClosed,

    #[error("scheduler worker reply channel closed")]
    ReplyChannelClosed(#[source] oneshot::error::RecvError),

    #[error("scheduler worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),

    #[error("runtime requires an actor directory before building")]
    MissingDirectory,
}

impl GameError for RuntimeError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Cast(err) => err.severity(),
            Self::MissingDirectory => ErrorSeverity::Validation,
            Self::CommandChannelClosed | Self::ReplyChannelClosed(_) | Self::WorkerJoin(_) => {
                ErrorSeverity::Internal
            }
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Cast(err) => err.error_code(),
            Self::CommandChannelClosed => "COMMAND_CHANNEL_CLOSED",
            Self::ReplyChannelClosed(_) => "REPLY_CHANNEL_CLOSED",
            Self::WorkerJoin(_) => "WORKER_JOIN",
            Self::MissingDirectory => "MISSING_DIRECTORY",
        }
    }
}
