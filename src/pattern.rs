//! Pattern library and the step engine.
//!
//! Every pattern maps `(pattern, step, total_pins)` to a logical bitmask where
//! bit 0 is the first LED. Apart from [`Pattern::Random`] the mapping is a
//! pure function, so a pattern can be replayed step by step in tests.
//!
//! Steps past the end of a pattern's natural range are defined as follows:
//! - Increment, decrement, chase, heartbeat and bounce wrap around
//! - Grow saturates at all LEDs on
//! - Shrink saturates at all LEDs off

use crate::config::{ChipLayout, low_mask};
use crate::error::Error;
use crate::random::RandomSource;

/// Animations understood by the engine.
///
/// Discriminants are the legacy pattern ids; id `0` means "no pattern".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "debug-mode", derive(defmt::Format))]
#[repr(u8)]
pub enum Pattern {
    /// Single LED walking up
    Increment = 1,
    /// Single LED walking down
    Decrement = 2,
    /// Single LED walking up forever
    Chase = 3,
    /// Bar filling from the low end
    Grow = 4,
    /// Bar emptying from the low end
    Shrink = 5,
    /// Both ends closing in, then opening out
    Heartbeat = 6,
    /// Single LED reflecting off both ends
    Bounce = 7,
    /// Random bitmask every step
    Random = 8,
    /// Every third LED, moving
    Wave = 9,
    /// Checkerboard flipping each step
    Alternating = 10,
}

impl Pattern {
    pub const ALL: [Pattern; 10] = [
        Pattern::Increment,
        Pattern::Decrement,
        Pattern::Chase,
        Pattern::Grow,
        Pattern::Shrink,
        Pattern::Heartbeat,
        Pattern::Bounce,
        Pattern::Random,
        Pattern::Wave,
        Pattern::Alternating,
    ];

    /// Legacy numeric id, 1 to 10.
    pub const fn id(self) -> u8 {
        self as u8
    }

    /// Decodes a legacy pattern id. `0` decodes to `None`.
    pub fn from_id(id: u8) -> Result<Option<Pattern>, Error> {
        match id {
            0 => Ok(None),
            _ => Pattern::try_from(id).map(Some),
        }
    }
}

impl TryFrom<u8> for Pattern {
    type Error = Error;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        Pattern::ALL
            .iter()
            .copied()
            .find(|pattern| pattern.id() == id)
            .ok_or(Error::InvalidPattern)
    }
}

/// Computes the lit LEDs for one pattern step.
///
/// Depends only on the number of LEDs in the chain, never on the hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternEngine {
    total_pins: u8,
}

impl PatternEngine {
    /// Engine for the chain's total LED count.
    pub const fn new(layout: &ChipLayout) -> Self {
        Self {
            total_pins: layout.total_pins(),
        }
    }

    /// LED count every frame is masked to.
    pub const fn total_pins(&self) -> u8 {
        self.total_pins
    }

    /// Bitmask of lit logical LEDs for `pattern` at `step`.
    ///
    /// `rng` is only consulted by [`Pattern::Random`].
    pub fn compute_state<R>(&self, pattern: Pattern, step: u16, rng: &mut R) -> u16
    where
        R: RandomSource + ?Sized,
    {
        let n = u16::from(self.total_pins);
        let full = low_mask(self.total_pins);

        match pattern {
            Pattern::Increment | Pattern::Chase => bit(step % n),
            Pattern::Decrement => bit(n - 1 - step % n),
            Pattern::Grow => low_bits(step.min(n - 1) + 1),
            Pattern::Shrink => full & !low_bits(step.min(n)),
            Pattern::Heartbeat => {
                let s = step % n;
                let half = n / 2;
                let lit = if s < half { s + 1 } else { n - s };
                let low = low_bits(lit);
                let high = full & !low_bits(n - lit);
                low | high
            }
            Pattern::Bounce => {
                let period = (2 * n).saturating_sub(2).max(1);
                let s = step % period;
                let position = if s < n { s } else { period - s };
                bit(position)
            }
            Pattern::Random => rng.next_below(1u32 << n) as u16,
            Pattern::Wave => (0..n)
                .filter(|i| (i + step % 3) % 3 == 0)
                .fold(0, |state, i| state | bit(i)),
            Pattern::Alternating => {
                let checker = if step % 2 == 1 { 0x5555 } else { 0xaaaa };
                checker & full
            }
        }
    }
}

fn bit(position: u16) -> u16 {
    1 << position
}

fn low_bits(count: u16) -> u16 {
    low_mask(count.min(16) as u8)
}
