//! Demo firmware driving a bar graph through every built-in pattern.
//!
//! # Overview
//!
//! Sixteen LEDs sit behind two cascaded 74HC595 shift registers on a
//! three-wire serial bus. The firmware plays each pattern a few times, then
//! moves on to the next one, forever.
//!
//! # Hardware
//!
//! - **MCU**: STM32L031G6U6 (Cortex-M0+, ultra-low-power)
//! - **LED drivers**: 2x 74HC595, 8 LEDs each
//! - **Timekeeping**: embassy time driver on a general-purpose timer
//!
//! # Tasks
//!
//! The main loop owns the timing: it ticks the controller every millisecond
//! and raises [`PATTERN_DONE`] when a pattern used up its repeats.
//! [`pattern_cycle_task`] waits on that signal and selects the next pattern.
//! Both reach the controller through a [`SharedBarLed`].
//!
//! # Module Organization
//!
//! - [`hardware`] - Pin mappings and controller construction

#![no_std]
#![no_main]

mod hardware;

use embassy_executor::Spawner;
use embassy_stm32::{
    Config,
    rcc::{LsConfig, mux::ClockMux},
};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Instant, Timer};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use bar_led::{Pattern, SharedBarLed, XorShift32};
use hardware::{BoardDiagnostics, BoardWire, Peripherals};

type SharedBoard = SharedBarLed<CriticalSectionRawMutex, BoardWire, XorShift32, BoardDiagnostics>;

/// How often the main loop ticks the controller.
const TICK_PERIOD: Duration = Duration::from_millis(1);

/// Time between two frames of a pattern.
const STEP_INTERVAL: Duration = Duration::from_millis(80);

/// Full cycles each pattern plays before the next one is selected.
const PATTERN_REPEATS: u8 = 3;

static BOARD: StaticCell<SharedBoard> = StaticCell::new();

/// Raised by the main loop when the running pattern finishes.
static PATTERN_DONE: Signal<CriticalSectionRawMutex, ()> = Signal::new();

/// Creates the clock configuration for STM32L031.
///
/// # Clock Settings
///
/// - **HSI16**: 16 MHz internal oscillator as system clock (no PLL)
/// - **Low-speed clocks**: HAL defaults, the RTC is unused
/// - **Voltage scale**: Range 1
///
/// The MSI ranges cannot shift a full frame within one tick period.
fn create_clock_config() -> embassy_stm32::rcc::Config {
    embassy_stm32::rcc::Config {
        msi: None,
        hsi: true,
        hse: None,
        pll: None,
        sys: embassy_stm32::rcc::Sysclk::HSI,
        ahb_pre: embassy_stm32::rcc::AHBPrescaler::DIV1,
        apb1_pre: embassy_stm32::rcc::APBPrescaler::DIV1,
        apb2_pre: embassy_stm32::rcc::APBPrescaler::DIV1,
        ls: LsConfig::default(),
        voltage_scale: embassy_stm32::rcc::VoltageScale::RANGE1,
        mux: ClockMux::default(),
    }
}

/// Selects every pattern in turn, waiting for each to finish.
#[embassy_executor::task]
async fn pattern_cycle_task(board: &'static SharedBoard) {
    for pattern in Pattern::ALL.iter().copied().cycle() {
        #[cfg(feature = "debug-mode")]
        defmt::info!("Next pattern: {}", pattern);

        board.lock(|bar| {
            bar.select_pattern(pattern, Instant::now());
            bar.set_repeat_limit(PATTERN_REPEATS);
        });

        PATTERN_DONE.wait().await;
    }
}

/// Main entry point.
///
/// # Initialization Sequence
///
/// 1. Configure clocks (16 MHz HSI)
/// 2. Initialize STM32 peripherals
/// 3. Build the bar controller and blank the chain
/// 4. Spawn the pattern cycle task
/// 5. Enter the tick loop
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let mut config = Config::default();
    config.rcc = create_clock_config();

    let p = embassy_stm32::init(config);

    #[cfg(feature = "debug-mode")]
    defmt::info!("Bar LED firmware starting...");

    let mut peripherals = Peripherals::new(p);
    peripherals.bar.set_step_interval(STEP_INTERVAL);

    let board: &'static SharedBoard = BOARD.init(SharedBarLed::new(peripherals.bar));

    #[cfg(feature = "debug-mode")]
    defmt::info!("Spawning pattern cycle task...");

    spawner.spawn(pattern_cycle_task(board)).unwrap();

    loop {
        let finished = board.lock(|bar| {
            let running = !bar.is_complete();
            bar.tick(Instant::now());
            running && bar.is_complete()
        });

        if finished {
            PATTERN_DONE.signal(());
        }

        Timer::after(TICK_PERIOD).await;
    }
}
