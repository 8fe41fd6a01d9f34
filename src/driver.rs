//! Per-chip LED state and its transmission.
//!
//! The logical bitmask is split into `pins_per_chip` wide slices, chip 0
//! taking the least significant slice. Each chip keeps its own 16-bit state,
//! always masked to the pins it actually has.

use heapless::Vec;

use crate::config::{ChipLayout, Config, DEFAULT_BRIGHTNESS, MAX_CHIPS};
use crate::lines::SerialLines;

/// One masked state word per chip, chip 0 first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedState {
    /// Layout the state was sized for
    layout: ChipLayout,
    /// One word per chip, masked to `pins_per_chip` bits
    chips: Vec<u16, MAX_CHIPS>,
}

impl LedState {
    /// All LEDs off.
    pub fn new(layout: ChipLayout) -> Self {
        let mut chips = Vec::new();
        // A valid layout never has more chips than MAX_CHIPS
        chips.resize(usize::from(layout.chip_count()), 0).ok();
        Self { layout, chips }
    }

    /// Layout the state was sized for.
    pub fn layout(&self) -> &ChipLayout {
        &self.layout
    }

    /// Per-chip words, chip 0 first.
    pub fn as_slice(&self) -> &[u16] {
        &self.chips
    }

    /// Every LED off.
    pub fn clear(&mut self) {
        self.chips.iter_mut().for_each(|chip| *chip = 0);
    }

    /// Every pin of every chip on.
    pub fn fill(&mut self) {
        let mask = self.layout.chip_mask();
        self.chips.iter_mut().for_each(|chip| *chip = mask);
    }

    /// Replaces the whole state with a logical bitmask.
    pub fn distribute(&mut self, bitmask: u16) {
        let pins = u32::from(self.layout.pins_per_chip());
        let mask = self.layout.chip_mask();
        for (index, chip) in self.chips.iter_mut().enumerate() {
            *chip = bitmask.checked_shr(pins * index as u32).unwrap_or(0) & mask;
        }
    }

    /// Turns on a one-based logical pin. Pins outside the chain are ignored.
    pub fn light(&mut self, pin: u8) {
        if pin == 0 || pin > self.layout.total_pins() {
            return;
        }
        let pins = self.layout.pins_per_chip();
        let chip = usize::from((pin - 1) / pins);
        let offset = (pin - 1) % pins;
        self.chips[chip] |= 1 << offset;
    }

    /// The per-chip words reassembled into one logical bitmask.
    pub fn bitmask(&self) -> u16 {
        let pins = u32::from(self.layout.pins_per_chip());
        self.chips
            .iter()
            .enumerate()
            .fold(0, |state, (index, chip)| state | (chip << (pins * index as u32)))
    }
}

/// Owns the chain's LED state and the lines it is shifted out on.
pub struct ChipOutputDriver<L> {
    /// DATA/CLOCK/LATCH lines of the chain
    lines: L,
    /// Protocol and layout the chain was configured with
    config: Config,
    /// Last state shifted out, or about to be
    state: LedState,
    /// 0 blanks dimmable chains, any other value shows the state
    brightness: u8,
}

impl<L: SerialLines> ChipOutputDriver<L> {
    /// Resets the chips for the configured protocol. Nothing is transmitted.
    pub fn new(lines: L, config: Config) -> Self {
        let mut driver = Self {
            lines,
            config,
            state: LedState::new(config.layout),
            brightness: DEFAULT_BRIGHTNESS,
        };
        driver.config.protocol.reset(&mut driver.lines);

        #[cfg(feature = "debug-mode")]
        defmt::info!("Chain configured: {}", config);

        driver
    }

    /// Swaps in a new configuration with a fresh, dark state.
    pub fn reconfigure(&mut self, config: Config) {
        self.config = config;
        self.state = LedState::new(config.layout);
        self.config.protocol.reset(&mut self.lines);

        #[cfg(feature = "debug-mode")]
        defmt::info!("Chain reconfigured: {}", config);
    }

    /// Protocol and layout in use.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// State as last transmitted.
    pub fn state(&self) -> &LedState {
        &self.state
    }

    /// Brightness last set, 255 by default.
    pub fn brightness(&self) -> u8 {
        self.brightness
    }

    /// Shows a logical bitmask.
    pub fn set_direct(&mut self, bitmask: u16) {
        self.state.distribute(bitmask);
        self.transmit();
    }

    /// Legacy pin-combination decoding.
    ///
    /// Values up to the LED count light that single one-based pin. Larger
    /// values are read as decimal digits, each non-zero digit lighting its
    /// own one-based pin, e.g. `23` lights pins 2 and 3. Digits naming pins
    /// outside the chain are skipped. Kept for compatibility only.
    pub fn set_from_combination(&mut self, value: u32) {
        let total = u32::from(self.config.total_pins());
        self.state.clear();

        if value < total + 1 {
            self.state.light(value as u8);
        } else {
            let mut remaining = value;
            while remaining > 0 {
                let digit = (remaining % 10) as u8;
                self.state.light(digit);
                remaining /= 10;
            }
        }
        self.transmit();
    }

    /// Turns every LED off and transmits.
    pub fn clear_all(&mut self) {
        self.state.clear();
        self.transmit();
    }

    /// Turns every LED on and transmits.
    pub fn set_all(&mut self) {
        self.state.fill();
        self.transmit();
    }

    /// Stores the brightness, resending the frame if the chips can dim.
    pub fn set_brightness(&mut self, brightness: u8) {
        self.brightness = brightness;
        if self.config.protocol.supports_brightness() {
            self.transmit();
        }
    }

    /// Shifts the current state onto the wire and latches it.
    pub fn transmit(&mut self) {
        #[cfg(feature = "debug-mode")]
        defmt::trace!("Frame {}", self.state.as_slice());

        self.config
            .protocol
            .transmit(&mut self.lines, self.state.as_slice(), self.brightness);
    }

    /// Gives the lines back.
    pub fn release(self) -> L {
        self.lines
    }
}
