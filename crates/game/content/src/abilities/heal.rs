//! Heal: a short chant that restores the target's health.

use game_core::{AbilityDefinition, AbilityScript, CastContext, HookResult, ParamSpec};

use super::healing_markup;

const DICE_QUANTITY: &str = "dice_quantity";
const DICE_SIDES: &str = "dice_sides";

const PARAMS: [ParamSpec; 2] = [
    ParamSpec::positive_int(DICE_QUANTITY),
    ParamSpec::positive_int(DICE_SIDES),
];

/// Channeled heal on the caster or someone in the same room.
#[derive(Clone, Copy, Debug, Default)]
pub struct Heal;

/// Standard heal definition: one channel tick, 2d3 hitpoints.
pub fn heal() -> AbilityDefinition {
    AbilityDefinition::new(crate::HEAL, "Heal", Heal)
        .with_channel_ticks(1)
        .with_int(DICE_QUANTITY, 2)
        .with_int(DICE_SIDES, 3)
}

impl AbilityScript for Heal {
    fn params(&self) -> &[ParamSpec] {
        &PARAMS
    }

    fn on_initiate(&self, cast: &mut CastContext<'_>) -> HookResult<bool> {
        let source = cast.source();
        let room = source.room_id()?;

        if !cast.is_self_cast() && cast.target().room_id()? != room {
            let target = cast.target().display_name(true)?;
            cast.send_to_user(source.identity(), &format!("{target} is not here."));
            return Ok(false);
        }

        cast.send_to_user(source.identity(), "You begin to chant softly.");
        cast.send_to_room(
            room,
            &format!("{} begins to chant softly.", source.display_name(true)?),
            &[source.identity()],
        );
        Ok(true)
    }

    fn channels(&self) -> bool {
        true
    }

    fn on_channel_tick(&self, cast: &mut CastContext<'_>) -> HookResult<()> {
        let source = cast.source();
        cast.send_to_user(source.identity(), "You continue chanting...");
        cast.send_to_room(
            source.room_id()?,
            &format!("{} continues chanting...", source.display_name(true)?),
            &[source.identity()],
        );
        Ok(())
    }

    fn on_resolve(&self, cast: &mut CastContext<'_>) -> HookResult<()> {
        let dice = cast.config().dice(DICE_QUANTITY, DICE_SIDES)?;
        let amount = cast.roll(dice);

        let source = cast.source();
        let target = cast.target();
        let room = source.room_id()?;
        let caster = source.display_name(true)?;
        let healing = healing_markup(amount);

        target.adjust_health(i64::from(amount))?;

        let participants = [source.identity(), target.identity()];
        if cast.is_self_cast() {
            cast.send_to_user(
                source.identity(),
                &format!("You stop chanting and embrace yourself with glowing hands, healing {healing}."),
            );
            cast.send_to_room(
                room,
                &format!("{caster} stops chanting and embraces themselves with glowing hands, providing health."),
                &participants,
            );
        } else {
            let patient = target.display_name(false)?;
            cast.send_to_user(
                source.identity(),
                &format!("You stop chanting and touch {patient} with glowing hands, healing {healing}."),
            );
            cast.send_to_room(
                room,
                &format!("{caster} stops chanting and touches {patient} with glowing hands, providing health."),
                &participants,
            );
            cast.send_to_user(
                target.identity(),
                &format!("{caster} stops chanting and touches you with glowing hands, healing {healing}."),
            );
        }
        Ok(())
    }
}
