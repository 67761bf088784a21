//! Ability scripts shipped with the engine.
//!
//! Content is plain Rust: each ability is an [`AbilityScript`] implementation
//! plus a definition constructor carrying its channel length and parameters.
//! [`standard_registry`] bundles everything here into a ready-to-share
//! [`AbilityRegistry`].
//!
//! [`AbilityScript`]: game_core::AbilityScript

pub mod abilities;

pub use abilities::{Heal, Smite, heal, smite};

use game_core::{AbilityRegistry, ConfigError};

/// Id of the channeled healing spell.
pub const HEAL: &str = "heal";
/// Id of the instant damage spell.
pub const SMITE: &str = "smite";

/// Registry containing every ability in this crate.
///
/// # Errors
///
/// Only fails if a bundled definition is malformed, which the tests in this
/// crate rule out.
pub fn standard_registry() -> Result<AbilityRegistry, ConfigError> {
    let mut registry = AbilityRegistry::new();
    registry.register_all([heal(), smite()])?;
    Ok(registry)
}
