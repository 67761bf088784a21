//! Dice sources available to the scheduler.

use game_core::{DiceSource, PcgDice};
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

use crate::config::RuntimeConfig;

/// Dice drawn from an OS-seeded standard generator.
pub struct EntropyDice {
    rng: StdRng,
}

impl EntropyDice {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl Default for EntropyDice {
    fn default() -> Self {
        Self::new()
    }
}

impl DiceSource for EntropyDice {
    fn next_u32(&mut self) -> u32 {
        self.rng.next_u32()
    }

    fn roll_die(&mut self, sides: u32) -> u32 {
        self.rng.gen_range(1..=sides.max(1))
    }
}

/// Picks the configured source: seeded PCG when `dice_seed` is set.
pub(crate) fn dice_from_config(config: &RuntimeConfig) -> Box<dyn DiceSource> {
    match config.dice_seed {
        Some(seed) => Box::new(PcgDice::new(seed)),
        None => Box::new(EntropyDice::new()),
    }
}
