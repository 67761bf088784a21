//! Dice rolls for randomized ability magnitudes.
//!
//! Randomness enters the engine only through [`DiceSource`]. The scheduler owns
//! exactly one source and lends it to one hook at a time, so concurrent casts
//! never interleave draws on shared generator state.
//!
//! # Determinism
//!
//! [`PcgDice`] produces the same sequence for the same seed, and
//! [`ScriptedDice`] replays a fixed list of faces. Tests use either to assert
//! exact outcomes.

use std::collections::VecDeque;
use std::fmt;

/// Invalid dice parameters.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DiceError {
    #[error("dice quantity must be at least 1 (got {0})")]
    InvalidQuantity(u32),

    #[error("dice sides must be at least 1 (got {0})")]
    InvalidSides(u32),

    #[error("{quantity}d{sides} overflows the roll range")]
    Overflow { quantity: u32, sides: u32 },
}

/// Source of uniform die faces.
pub trait DiceSource: Send {
    /// Next raw 32-bit value from the stream.
    fn next_u32(&mut self) -> u32;

    /// Roll one die with `sides` faces (1..=sides inclusive).
    ///
    /// Uses rejection sampling so every face is equally likely.
    fn roll_die(&mut self, sides: u32) -> u32 {
        let sides = u64::from(sides.max(1));
        let span = 1u64 << 32;
        let limit = span - span % sides;
        loop {
            let value = u64::from(self.next_u32());
            if value < limit {
                // value % sides < sides <= u32::MAX
                return (value % sides) as u32 + 1;
            }
        }
    }
}

impl<S: DiceSource + ?Sized> DiceSource for Box<S> {
    fn next_u32(&mut self) -> u32 {
        (**self).next_u32()
    }

    fn roll_die(&mut self, sides: u32) -> u32 {
        (**self).roll_die(sides)
    }
}

/// Validated `NdM` dice expression.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Dice {
    quantity: u32,
    sides: u32,
}

impl Dice {
    pub fn new(quantity: u32, sides: u32) -> Result<Self, DiceError> {
        if quantity == 0 {
            return Err(DiceError::InvalidQuantity(quantity));
        }
        if sides == 0 {
            return Err(DiceError::InvalidSides(sides));
        }
        if quantity.checked_mul(sides).is_none() {
            return Err(DiceError::Overflow { quantity, sides });
        }
        Ok(Self { quantity, sides })
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn sides(&self) -> u32 {
        self.sides
    }

    /// Smallest possible total.
    pub fn min(&self) -> u32 {
        self.quantity
    }

    /// Largest possible total.
    pub fn max(&self) -> u32 {
        self.quantity * self.sides
    }

    /// Sum of `quantity` independent draws in `[1, sides]`.
    pub fn roll(&self, source: &mut (impl DiceSource + ?Sized)) -> u32 {
        (0..self.quantity).map(|_| source.roll_die(self.sides)).sum()
    }
}

impl fmt::Display for Dice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d{}", self.quantity, self.sides)
    }
}

/// Rolls `quantity` dice with `sides` faces and returns the total.
///
/// The result always lies in `[quantity, quantity * sides]`.
pub fn roll_sum(
    source: &mut (impl DiceSource + ?Sized),
    quantity: u32,
    sides: u32,
) -> Result<u32, DiceError> {
    Ok(Dice::new(quantity, sides)?.roll(source))
}

/// PCG random number generator (Permuted Congruential Generator).
///
/// PCG-XSH-RR: 64-bit LCG state, 32-bit permuted output.
///
/// - **Deterministic**: same seed, same sequence
/// - **Small state**: 64 bits, cheap to create one per test
///
/// Reference: <https://www.pcg-random.org/>
#[derive(Clone, Debug)]
pub struct PcgDice {
    state: u64,
}

impl PcgDice {
    const MULTIPLIER: u64 = 6364136223846793005;
    const INCREMENT: u64 = 1442695040888963407;

    pub fn new(seed: u64) -> Self {
        Self {
            state: Self::step(seed ^ Self::INCREMENT),
        }
    }

    #[inline]
    fn step(state: u64) -> u64 {
        state
            .wrapping_mul(Self::MULTIPLIER)
            .wrapping_add(Self::INCREMENT)
    }

    /// XSH-RR output permutation.
    #[inline]
    fn output(state: u64) -> u32 {
        let xorshifted = (((state >> 18) ^ state) >> 27) as u32;
        let rot = (state >> 59) as u32;
        xorshifted.rotate_right(rot)
    }
}

impl DiceSource for PcgDice {
    fn next_u32(&mut self) -> u32 {
        let current = self.state;
        self.state = Self::step(current);
        Self::output(current)
    }
}

/// Replays a fixed list of faces, cycling when exhausted.
///
/// Each face is clamped into `[1, sides]` of the die being rolled, so a
/// script written for 2d3 stays valid if the ability is reconfigured.
#[derive(Clone, Debug, Default)]
pub struct ScriptedDice {
    faces: VecDeque<u32>,
}

impl ScriptedDice {
    pub fn new(faces: impl IntoIterator<Item = u32>) -> Self {
        Self {
            faces: faces.into_iter().collect(),
        }
    }

    fn next_face(&mut self) -> u32 {
        match self.faces.pop_front() {
            Some(face) => {
                self.faces.push_back(face);
                face
            }
            None => 1,
        }
    }
}

impl DiceSource for ScriptedDice {
    fn next_u32(&mut self) -> u32 {
        self.next_face()
    }

    fn roll_die(&mut self, sides: u32) -> u32 {
        self.next_face().clamp(1, sides.max(1))
    }
}
