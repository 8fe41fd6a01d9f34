//! Chain configuration and driver defaults.
//!
//! The configuration is fixed once a driver is built. Re-initializing a
//! controller swaps in a whole new [`Config`] rather than mutating it.

use embassy_time::Duration;

use crate::error::Error;
use crate::protocol::Protocol;

/// Width of the logical LED bitmask.
pub const MAX_TOTAL_PINS: u8 = 16;

/// Upper bound on chips in a chain (one LED per chip at the widest).
pub const MAX_CHIPS: usize = MAX_TOTAL_PINS as usize;

/// Time between pattern steps until the caller changes it.
pub const DEFAULT_STEP_INTERVAL: Duration = Duration::from_millis(100);

/// Full brightness.
pub const DEFAULT_BRIGHTNESS: u8 = 255;

/// How the logical LEDs are split over physical chips.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "debug-mode", derive(defmt::Format))]
pub struct ChipLayout {
    /// LEDs wired to each chip, 1 to 16
    pins_per_chip: u8,
    /// Cascaded chips sharing the serial lines
    chip_count: u8,
}

impl ChipLayout {
    /// Validates a layout.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidPinConfiguration`] if either count is zero or the
    /// chain holds more than [`MAX_TOTAL_PINS`] LEDs.
    pub const fn new(pins_per_chip: u8, chip_count: u8) -> Result<Self, Error> {
        if pins_per_chip == 0 || chip_count == 0 {
            return Err(Error::InvalidPinConfiguration);
        }
        if pins_per_chip as u16 * chip_count as u16 > MAX_TOTAL_PINS as u16 {
            return Err(Error::InvalidPinConfiguration);
        }
        Ok(Self {
            pins_per_chip,
            chip_count,
        })
    }

    /// LEDs wired to each chip.
    pub const fn pins_per_chip(&self) -> u8 {
        self.pins_per_chip
    }

    /// Number of chips in the chain.
    pub const fn chip_count(&self) -> u8 {
        self.chip_count
    }

    /// Number of logical LEDs across the whole chain.
    pub const fn total_pins(&self) -> u8 {
        self.pins_per_chip * self.chip_count
    }

    /// Bits a single chip can hold: `2^pins_per_chip - 1`.
    pub const fn chip_mask(&self) -> u16 {
        low_mask(self.pins_per_chip)
    }

    /// Bits the whole chain can hold.
    pub const fn chain_mask(&self) -> u16 {
        low_mask(self.total_pins())
    }
}

/// Mask with the lowest `bits` bits set, saturating at 16.
pub(crate) const fn low_mask(bits: u8) -> u16 {
    if bits >= 16 {
        u16::MAX
    } else {
        (1u16 << bits) - 1
    }
}

/// Everything a driver needs to know about its chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "debug-mode", derive(defmt::Format))]
pub struct Config {
    /// Chip family and therefore wire encoding
    pub protocol: Protocol,
    /// How the LEDs are split over the chips
    pub layout: ChipLayout,
}

impl Config {
    /// Pairs a protocol with an already validated layout.
    pub const fn new(protocol: Protocol, layout: ChipLayout) -> Self {
        Self { protocol, layout }
    }

    /// Builds a configuration from the raw ids used by the legacy API.
    ///
    /// The protocol is checked before the pin counts.
    pub fn from_raw(protocol_id: u8, pins_per_chip: u8, chip_count: u8) -> Result<Self, Error> {
        let protocol = Protocol::try_from(protocol_id)?;
        let layout = ChipLayout::new(pins_per_chip, chip_count)?;
        Ok(Self::new(protocol, layout))
    }

    /// Number of logical LEDs across the whole chain.
    pub const fn total_pins(&self) -> u8 {
        self.layout.total_pins()
    }
}
