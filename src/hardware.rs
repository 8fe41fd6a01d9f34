//! Board pin map and bar controller construction.
//!
//! # Pin Assignments
//!
//! ## LED Chain (three-wire serial bus)
//! - **PA15**: DATA - Serial data input of the first chip
//! - **PB3**: CLOCK - Shift clock, rising edge shifts DATA in
//! - **PB5**: LATCH - Storage clock, rising edge commits the frame
//!
//! ## Debug (SWD)
//! - **PA13**: SWDIO
//! - **PA14**: SWCLK

use embassy_stm32::gpio::{Level, Output, Speed};
use embassy_time::{Delay, Instant};

#[cfg(feature = "debug-mode")]
use bar_led::DefmtDiagnostics;
#[cfg(not(feature = "debug-mode"))]
use bar_led::Silent;
use bar_led::{BarLed, ChipLayout, Config, Protocol, Wire, XorShift32};

/// Two 74HC595s, eight LEDs each.
pub const BOARD_CONFIG: Config = match ChipLayout::new(8, 2) {
    Ok(layout) => Config::new(Protocol::ShiftRegister, layout),
    Err(_) => panic!("board layout exceeds the chain width"),
};

pub type BoardWire = Wire<Output<'static>, Output<'static>, Output<'static>, Delay>;

#[cfg(feature = "debug-mode")]
pub type BoardDiagnostics = DefmtDiagnostics;
#[cfg(not(feature = "debug-mode"))]
pub type BoardDiagnostics = Silent;

pub type Board = BarLed<BoardWire, XorShift32, BoardDiagnostics>;

/// Top-level peripheral container.
pub struct Peripherals {
    /// Bar graph on the three-wire chain
    pub bar: Board,
}

impl Peripherals {
    /// Takes the chain pins from the STM32 peripheral singleton.
    ///
    /// # Initial GPIO States
    ///
    /// - PA15 (DATA): Low
    /// - PB3 (CLOCK): Low
    /// - PB5 (LATCH): Low
    ///
    /// The random pattern is seeded from the device unique ID mixed with the
    /// uptime, so boards sharing a firmware image still differ.
    ///
    /// # Arguments
    ///
    /// * `p` - STM32 peripheral singleton from embassy_stm32::init()
    pub fn new(p: embassy_stm32::Peripherals) -> Self {
        let wire = Wire::new(
            Output::new(p.PA15, Level::Low, Speed::VeryHigh),
            Output::new(p.PB3, Level::Low, Speed::VeryHigh),
            Output::new(p.PB5, Level::Low, Speed::VeryHigh),
            Delay,
        );

        let mut bar = BarLed::new(wire, BOARD_CONFIG, XorShift32::new(random_seed()))
            .with_diagnostics(BoardDiagnostics::default());

        #[cfg(feature = "debug-mode")]
        bar.set_debug_mode(true);

        bar.clear_all();

        Self { bar }
    }
}

fn random_seed() -> u32 {
    let uid = embassy_stm32::uid::uid();
    let seed = uid
        .chunks_exact(4)
        .fold(0u32, |seed, word| seed ^ u32::from_le_bytes([word[0], word[1], word[2], word[3]]));
    seed ^ Instant::now().as_ticks() as u32
}
