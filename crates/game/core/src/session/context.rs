//! What an ability hook can see and touch while it runs.

use crate::ability::{AbilityConfig, AbilityDefinition};
use crate::dice::{Dice, DiceSource};
use crate::env::{ActorStore, Messenger};
use crate::error::HookResult;
use crate::state::{Actor, RoomId, UserId};

/// Services borrowed by a session for the duration of one scheduling pass.
pub struct CastEnv<'a> {
    pub actors: &'a dyn ActorStore,
    pub messenger: &'a dyn Messenger,
    pub dice: &'a mut dyn DiceSource,
}

impl<'a> CastEnv<'a> {
    pub fn new(
        actors: &'a dyn ActorStore,
        messenger: &'a dyn Messenger,
        dice: &'a mut dyn DiceSource,
    ) -> Self {
        Self {
            actors,
            messenger,
            dice,
        }
    }
}

/// Live view of one actor, resolved through the store on every call.
///
/// Methods fail with `HookError::ActorNotFound` once the actor is gone.
#[derive(Clone, Copy)]
pub struct ActorRef<'a> {
    id: UserId,
    actors: &'a dyn ActorStore,
}

impl<'a> ActorRef<'a> {
    pub fn identity(&self) -> UserId {
        self.id
    }

    pub fn snapshot(&self) -> HookResult<Actor> {
        Ok(self.actors.get_actor(self.id)?)
    }

    pub fn room_id(&self) -> HookResult<RoomId> {
        Ok(self.snapshot()?.room)
    }

    /// Narrative name; `capitalize` selects the sentence-initial form.
    pub fn display_name(&self, capitalize: bool) -> HookResult<String> {
        Ok(self.snapshot()?.name.display(capitalize))
    }

    pub fn possessive(&self, capitalize: bool) -> HookResult<String> {
        Ok(self.snapshot()?.name.possessive(capitalize))
    }

    /// Applies a clamped health delta and returns the new health.
    pub fn adjust_health(&self, delta: i64) -> HookResult<u32> {
        Ok(self.actors.apply_health_delta(self.id, delta)?)
    }
}

/// Hook-side handle for one cast.
pub struct CastContext<'a> {
    ability: &'a AbilityDefinition,
    source: UserId,
    target: UserId,
    actors: &'a dyn ActorStore,
    messenger: &'a dyn Messenger,
    dice: &'a mut dyn DiceSource,
}

impl<'a> CastContext<'a> {
    pub(crate) fn new(
        ability: &'a AbilityDefinition,
        source: UserId,
        target: UserId,
        env: &'a mut CastEnv<'_>,
    ) -> Self {
        Self {
            ability,
            source,
            target,
            actors: env.actors,
            messenger: env.messenger,
            dice: &mut *env.dice,
        }
    }

    pub fn config(&self) -> &AbilityConfig {
        self.ability.config()
    }

    pub fn source(&self) -> ActorRef<'a> {
        ActorRef {
            id: self.source,
            actors: self.actors,
        }
    }

    pub fn target(&self) -> ActorRef<'a> {
        ActorRef {
            id: self.target,
            actors: self.actors,
        }
    }

    pub fn is_self_cast(&self) -> bool {
        self.source == self.target
    }

    /// Rolls a validated dice expression.
    pub fn roll(&mut self, dice: Dice) -> u32 {
        dice.roll(&mut *self.dice)
    }

    pub fn send_to_user(&self, user: UserId, text: &str) {
        self.messenger.send_to_user(user, text);
    }

    pub fn send_to_room(&self, room: RoomId, text: &str, exclude: &[UserId]) {
        self.messenger.send_to_room(room, text, exclude);
    }
}
