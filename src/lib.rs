//! Driver for bar-graph LEDs on a chain of shift-register style chips.
//!
//! # Overview
//!
//! A chain of up to 16 LEDs is spread across cascaded driver chips that share
//! three GPIO lines (data, clock, latch). Three chip families are supported:
//! - **Shift register** (74HC595 class): two bytes per chip, MSB first
//! - **Constant-current driver** (MBI5027 class): 16 clocked bits per chip
//! - **Serial PWM controller** (WS2803 class): 18 clocked bits per chip with
//!   a 500 µs latch gap
//!
//! The LEDs are either written directly or animated through a fixed library
//! of step-based patterns.
//!
//! # Control Flow
//!
//! The caller invokes [`BarLed::tick`] from its control loop. When a pattern
//! is active and the step interval has elapsed, [`PatternEngine`] computes the
//! next logical bitmask, [`ChipOutputDriver`] splits it across the chips and
//! shifts it onto the wire.
//!
//! # Module Organization
//!
//! - [`config`] - Chip layout, protocol selection and defaults
//! - [`pattern`] - Pattern identifiers and the pure pattern engine
//! - [`lines`] - GPIO/timing collaborator and the embedded-hal adapter
//! - [`protocol`] - Wire encodings for the three chip families
//! - [`driver`] - Per-chip LED state and transmission
//! - [`controller`] - Animation state machine façade
//! - [`shared`] - Mutex wrapper for multi-task access

#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod controller;
pub mod diagnostics;
pub mod driver;
pub mod error;
pub mod lines;
pub mod pattern;
pub mod protocol;
pub mod random;
pub mod shared;

#[cfg(test)]
mod test_utils;

pub use config::{ChipLayout, Config};
pub use controller::{BarLed, ControllerState};
#[cfg(feature = "debug-mode")]
pub use diagnostics::DefmtDiagnostics;
pub use diagnostics::{Diagnostics, Silent};
pub use driver::{ChipOutputDriver, LedState};
pub use error::Error;
pub use lines::{SerialLines, Wire};
pub use pattern::{Pattern, PatternEngine};
pub use protocol::Protocol;
pub use random::{RandomSource, XorShift32};
pub use shared::SharedBarLed;
