//! Registry of ability definitions available for casting.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{CastError, ConfigError};
use crate::state::AbilityId;

use super::AbilityDefinition;

/// Append-only table of validated ability definitions.
///
/// Built mutably during startup, then moved behind an `Arc` into the
/// scheduler. Once shared it can no longer be mutated, so lookups need no
/// locking.
#[derive(Debug, Default)]
pub struct AbilityRegistry {
    abilities: HashMap<AbilityId, Arc<AbilityDefinition>>,
}

impl AbilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates and adds a definition.
    ///
    /// # Errors
    ///
    /// - `ConfigError::EmptyId` / parameter errors from
    ///   [`AbilityDefinition::validate`]
    /// - `ConfigError::DuplicateAbility` if the id is already taken
    pub fn register(&mut self, definition: AbilityDefinition) -> Result<(), ConfigError> {
        definition.validate()?;

        if self.abilities.contains_key(definition.id()) {
            return Err(ConfigError::DuplicateAbility {
                ability: definition.id().clone(),
            });
        }

        self.abilities
            .insert(definition.id().clone(), Arc::new(definition));
        Ok(())
    }

    /// Registers several definitions, stopping at the first invalid one.
    pub fn register_all(
        &mut self,
        definitions: impl IntoIterator<Item = AbilityDefinition>,
    ) -> Result<(), ConfigError> {
        definitions
            .into_iter()
            .try_for_each(|definition| self.register(definition))
    }

    /// Finds a definition by id.
    pub fn lookup(&self, id: &str) -> Result<Arc<AbilityDefinition>, CastError> {
        self.abilities
            .get(id)
            .cloned()
            .ok_or_else(|| CastError::AbilityNotFound(AbilityId::new(id)))
    }

    pub fn len(&self) -> usize {
        self.abilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.abilities.is_empty()
    }

    /// Registered ids in sorted order (for debugging and listings).
    pub fn ids(&self) -> Vec<&AbilityId> {
        let mut ids: Vec<_> = self.abilities.keys().collect();
        ids.sort();
        ids
    }
}
