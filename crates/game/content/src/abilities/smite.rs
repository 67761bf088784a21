//! Smite: an instant strike of holy force.

use game_core::{AbilityDefinition, AbilityScript, CastContext, HookResult, ParamSpec};

const DICE_QUANTITY: &str = "dice_quantity";
const DICE_SIDES: &str = "dice_sides";

const PARAMS: [ParamSpec; 2] = [
    ParamSpec::positive_int(DICE_QUANTITY),
    ParamSpec::positive_int(DICE_SIDES),
];

#[derive(Clone, Copy, Debug, Default)]
pub struct Smite;

/// Standard smite definition: instant, 1d4 damage.
pub fn smite() -> AbilityDefinition {
    AbilityDefinition::new(crate::SMITE, "Smite", Smite)
        .with_int(DICE_QUANTITY, 1)
        .with_int(DICE_SIDES, 4)
}

impl AbilityScript for Smite {
    fn params(&self) -> &[ParamSpec] {
        &PARAMS
    }

    fn on_initiate(&self, cast: &mut CastContext<'_>) -> HookResult<bool> {
        if cast.is_self_cast() {
            cast.send_to_user(cast.source().identity(), "You cannot smite yourself.");
            return Ok(false);
        }

        let source = cast.source();
        let target = cast.target();
        if target.room_id()? != source.room_id()? {
            let name = target.display_name(true)?;
            cast.send_to_user(source.identity(), &format!("{name} is not here."));
            return Ok(false);
        }
        Ok(true)
    }

    fn on_resolve(&self, cast: &mut CastContext<'_>) -> HookResult<()> {
        let dice = cast.config().dice(DICE_QUANTITY, DICE_SIDES)?;
        let damage = cast.roll(dice);

        let source = cast.source();
        let target = cast.target();
        let caster = source.display_name(true)?;
        let victim = target.display_name(false)?;
        let hand = source.possessive(false)?;

        target.adjust_health(-i64::from(damage))?;

        cast.send_to_user(
            source.identity(),
            &format!("You raise a hand and smite {victim} for <ansi fg=\"damage\">{damage} damage</ansi>."),
        );
        cast.send_to_room(
            source.room_id()?,
            &format!("Holy light bursts from {hand} hand and smites {victim}."),
            &[source.identity(), target.identity()],
        );
        cast.send_to_user(
            target.identity(),
            &format!("{caster} raises a hand and smites you for <ansi fg=\"damage\">{damage} damage</ansi>."),
        );
        Ok(())
    }
}
