//! Common error infrastructure for game-core.
//!
//! Errors are split by who raises them:
//!
//! - [`CastError`]: engine-level failures reported to the caller of a cast
//!   (unknown ability, vanished actor, second cast while casting)
//! - [`ConfigError`]: malformed ability definitions, raised at registration
//! - [`HookError`]: failures an ability script returns from inside a hook;
//!   these never escape the session boundary
//! - [`crate::DiceError`]: invalid dice parameters
//!
//! Every error classifies itself through [`GameError`] so the runtime can pick
//! a log level and decide whether a user-facing message is appropriate.

use crate::ability::ParamKind;
use crate::dice::DiceError;
use crate::state::{AbilityId, SessionId, UserId};

/// Severity level of an error, used for categorization and logging.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// Recoverable error - the same request may succeed later.
    ///
    /// Examples: already casting, target left the room
    Recoverable,

    /// Validation error - invalid input, should not retry without changes.
    ///
    /// Examples: unknown ability, malformed configuration
    Validation,

    /// Internal error - unexpected state inconsistency.
    ///
    /// Examples: poisoned directory lock
    Internal,
}

impl ErrorSeverity {
    /// Returns a human-readable description of this severity level.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
        }
    }

    /// Returns true if this error is potentially recoverable.
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }

    /// Returns true if this error indicates an internal bug.
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal)
    }
}

/// Common trait for all game-core errors.
pub trait GameError: core::fmt::Display + core::fmt::Debug {
    /// Returns the severity level of this error.
    fn severity(&self) -> ErrorSeverity;

    /// Returns a static string identifier for this error variant.
    ///
    /// Used as a structured logging field and in tests.
    fn error_code(&self) -> &'static str;
}

/// Failures surfaced to whoever requested or drives a cast.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CastError {
    #[error("ability `{0}` is not registered")]
    AbilityNotFound(AbilityId),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("actor {0} not found")]
    ActorNotFound(UserId),

    #[error("actor {actor} is already casting ({session})")]
    AlreadyCasting { actor: UserId, session: SessionId },

    #[error("actor directory unavailable: {0}")]
    Directory(String),
}

impl GameError for CastError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::AbilityNotFound(_) | Self::Config(_) => ErrorSeverity::Validation,
            Self::ActorNotFound(_) | Self::AlreadyCasting { .. } => ErrorSeverity::Recoverable,
            Self::Directory(_) => ErrorSeverity::Internal,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::AbilityNotFound(_) => "ABILITY_NOT_FOUND",
            Self::Config(_) => "CONFIG_ERROR",
            Self::ActorNotFound(_) => "ACTOR_NOT_FOUND",
            Self::AlreadyCasting { .. } => "ALREADY_CASTING",
            Self::Directory(_) => "DIRECTORY_UNAVAILABLE",
        }
    }
}

/// Malformed ability definition, rejected by [`crate::AbilityRegistry::register`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("ability id must not be empty")]
    EmptyId,

    #[error("ability `{ability}` is already registered")]
    DuplicateAbility { ability: AbilityId },

    #[error("ability `{ability}` is missing parameter `{param}`")]
    MissingParam { ability: AbilityId, param: String },

    #[error("ability `{ability}` parameter `{param}` must be {expected}")]
    ParamKind {
        ability: AbilityId,
        param: String,
        expected: ParamKind,
    },

    #[error("ability `{ability}` parameter `{param}` is {value}, minimum is {min}")]
    ParamBelowMinimum {
        ability: AbilityId,
        param: String,
        value: i64,
        min: i64,
    },
}

impl GameError for ConfigError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyId => "EMPTY_ID",
            Self::DuplicateAbility { .. } => "DUPLICATE_ABILITY",
            Self::MissingParam { .. } => "MISSING_PARAM",
            Self::ParamKind { .. } => "PARAM_KIND",
            Self::ParamBelowMinimum { .. } => "PARAM_BELOW_MINIMUM",
        }
    }
}

/// Failure returned by an ability hook.
///
/// The session converts any hook error into an aborted cast; it is never
/// propagated to the scheduler or the player.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum HookError {
    #[error("actor {0} not found")]
    ActorNotFound(UserId),

    #[error(transparent)]
    Dice(#[from] DiceError),

    #[error("parameter `{param}` is missing or not {expected}")]
    Param { param: String, expected: ParamKind },

    #[error("actor directory unavailable: {0}")]
    Directory(String),

    #[error("{0}")]
    Script(String),
}

impl HookError {
    /// Convenience constructor for script-specific failures.
    pub fn script(message: impl Into<String>) -> Self {
        Self::Script(message.into())
    }
}

impl From<CastError> for HookError {
    fn from(error: CastError) -> Self {
        match error {
            CastError::ActorNotFound(id) => Self::ActorNotFound(id),
            CastError::Directory(message) => Self::Directory(message),
            other => Self::Script(other.to_string()),
        }
    }
}

impl GameError for HookError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::ActorNotFound(_) => ErrorSeverity::Recoverable,
            Self::Dice(_) | Self::Param { .. } | Self::Script(_) => ErrorSeverity::Validation,
            Self::Directory(_) => ErrorSeverity::Internal,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::ActorNotFound(_) => "ACTOR_NOT_FOUND",
            Self::Dice(_) => "DICE",
            Self::Param { .. } => "PARAM",
            Self::Directory(_) => "DIRECTORY_UNAVAILABLE",
            Self::Script(_) => "SCRIPT",
        }
    }
}

/// Result type returned by ability hooks.
pub type HookResult<T> = Result<T, HookError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cast_errors_classify_caller_faults_as_validation() {
        let unknown = CastError::AbilityNotFound(AbilityId::new("fireball"));
        assert_eq!(unknown.severity(), ErrorSeverity::Validation);
        assert_eq!(unknown.error_code(), "ABILITY_NOT_FOUND");

        let busy = CastError::AlreadyCasting {
            actor: UserId(1),
            session: SessionId(9),
        };
        assert!(busy.severity().is_recoverable());
        assert_eq!(busy.to_string(), "actor user#1 is already casting (cast#9)");
    }

    #[test]
    fn hook_error_keeps_actor_identity_from_cast_error() {
        let hook: HookError = CastError::ActorNotFound(UserId(4)).into();
        assert_eq!(hook, HookError::ActorNotFound(UserId(4)));

        let hook: HookError = CastError::Directory("poisoned".into()).into();
        assert!(hook.severity().is_internal());
    }
}
