//! Ability definitions and the script contract content authors implement.
//!
//! An ability is static data ([`AbilityDefinition`]) plus behavior
//! ([`AbilityScript`]). Definitions are validated once by
//! [`AbilityRegistry::register`] and shared by `Arc` across every session that
//! casts them.
//!
//! # Hook lifecycle
//!
//! ```text
//! on_initiate ──false──▶ (aborted)
//!      │true
//!      ▼
//! on_channel_tick × channel_ticks   (only when `channels()` is true)
//!      │
//!      ▼
//! on_resolve
//! ```

mod config;
mod registry;

pub use config::{AbilityConfig, ParamKind, ParamSpec, ParamValue};
pub use registry::AbilityRegistry;

use std::fmt;
use std::sync::Arc;

use crate::error::{ConfigError, HookResult};
use crate::session::CastContext;
use crate::state::AbilityId;

/// Behavior of one ability.
///
/// `on_initiate` and `on_resolve` are required; `on_channel_tick` is optional
/// and only invoked when [`channels`](Self::channels) returns `true`.
///
/// Hooks of a single cast run strictly in sequence on the scheduler, so a
/// script never observes its own hooks running concurrently.
pub trait AbilityScript: Send + Sync {
    /// Parameters this script reads from [`AbilityConfig`].
    ///
    /// Checked at registration; a definition whose config does not satisfy
    /// the schema is rejected with [`ConfigError`].
    fn params(&self) -> &[ParamSpec] {
        &[]
    }

    /// Called once when the cast is requested.
    ///
    /// Returning `false` aborts the cast before any other hook runs.
    fn on_initiate(&self, cast: &mut CastContext<'_>) -> HookResult<bool>;

    /// Whether [`on_channel_tick`](Self::on_channel_tick) should be invoked.
    fn channels(&self) -> bool {
        false
    }

    /// Called on every scheduler tick while channeling. Purely narrative.
    fn on_channel_tick(&self, _cast: &mut CastContext<'_>) -> HookResult<()> {
        Ok(())
    }

    /// Called exactly once when the channel completes uninterrupted.
    fn on_resolve(&self, cast: &mut CastContext<'_>) -> HookResult<()>;
}

/// Immutable description of one ability.
#[derive(Clone)]
pub struct AbilityDefinition {
    id: AbilityId,
    name: String,
    channel_ticks: u32,
    config: AbilityConfig,
    script: Arc<dyn AbilityScript>,
}

impl AbilityDefinition {
    /// Creates an instant (zero-channel) ability with empty configuration.
    pub fn new(
        id: impl Into<AbilityId>,
        name: impl Into<String>,
        script: impl AbilityScript + 'static,
    ) -> Self {
        Self::from_shared(id, name, Arc::new(script))
    }

    /// Same as [`new`](Self::new) for scripts already behind an `Arc`.
    pub fn from_shared(
        id: impl Into<AbilityId>,
        name: impl Into<String>,
        script: Arc<dyn AbilityScript>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            channel_ticks: 0,
            config: AbilityConfig::default(),
            script,
        }
    }

    #[must_use]
    pub fn with_channel_ticks(mut self, ticks: u32) -> Self {
        self.channel_ticks = ticks;
        self
    }

    #[must_use]
    pub fn with_int(mut self, name: impl Into<String>, value: i64) -> Self {
        self.config = self.config.with_int(name, value);
        self
    }

    #[must_use]
    pub fn with_text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config = self.config.with_text(name, value);
        self
    }

    pub fn id(&self) -> &AbilityId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of channel ticks before resolution; `0` resolves immediately.
    pub fn channel_ticks(&self) -> u32 {
        self.channel_ticks
    }

    pub fn is_instant(&self) -> bool {
        self.channel_ticks == 0
    }

    pub fn config(&self) -> &AbilityConfig {
        &self.config
    }

    pub fn script(&self) -> &dyn AbilityScript {
        self.script.as_ref()
    }

    /// Validates id and configuration against the script's schema.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.id.is_empty() {
            return Err(ConfigError::EmptyId);
        }
        self.config.validate(&self.id, self.script.params())
    }
}

impl fmt::Debug for AbilityDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AbilityDefinition")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("channel_ticks", &self.channel_ticks)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
