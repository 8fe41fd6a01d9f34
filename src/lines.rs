//! The three serial lines shared by every chip in the chain.
//!
//! All chip families are fed the same way: a level is placed on DATA, CLOCK
//! is pulsed to shift it in, and LATCH commits the shifted bits to the
//! outputs. [`SerialLines`] is the seam between the wire encodings and the
//! GPIO/timing hardware; [`Wire`] implements it for embedded-hal pins.

use core::convert::Infallible;

use embedded_hal::blocking::delay::DelayUs;
use embedded_hal::digital::v2::OutputPin;

/// GPIO and busy-wait primitives needed to clock bits into a chain.
pub trait SerialLines {
    /// Drives DATA to the given level.
    fn write_data(&mut self, high: bool);

    /// Raises CLOCK, holds it for `hold_us` microseconds, then lowers it.
    ///
    /// A zero hold toggles the line back to back.
    fn pulse_clock(&mut self, hold_us: u32);

    /// Drives LATCH to the given level.
    fn write_latch(&mut self, high: bool);

    /// Busy-waits for `us` microseconds.
    fn delay_us(&mut self, us: u32);

    /// Shifts one byte out most-significant bit first with no clock hold.
    fn shift_out_msb_first(&mut self, byte: u8) {
        for i in (0..8).rev() {
            self.write_data((byte >> i) & 1 == 1);
            self.pulse_clock(0);
        }
    }
}

impl<T> SerialLines for &mut T
where
    T: SerialLines + ?Sized,
{
    fn write_data(&mut self, high: bool) {
        T::write_data(self, high)
    }

    fn pulse_clock(&mut self, hold_us: u32) {
        T::pulse_clock(self, hold_us)
    }

    fn write_latch(&mut self, high: bool) {
        T::write_latch(self, high)
    }

    fn delay_us(&mut self, us: u32) {
        T::delay_us(self, us)
    }

    fn shift_out_msb_first(&mut self, byte: u8) {
        T::shift_out_msb_first(self, byte)
    }
}

/// DATA, CLOCK and LATCH output pins plus a microsecond delay.
///
/// Pins must be infallible, as embassy HAL outputs are.
pub struct Wire<DATA, CLOCK, LATCH, DELAY> {
    /// Serial data input of the first chip
    data: DATA,
    /// Shift clock, rising edge shifts DATA in
    clock: CLOCK,
    /// Storage/latch clock, commits shifted bits to the outputs
    latch: LATCH,
    delay: DELAY,
}

impl<DATA, CLOCK, LATCH, DELAY> Wire<DATA, CLOCK, LATCH, DELAY>
where
    DATA: OutputPin<Error = Infallible>,
    CLOCK: OutputPin<Error = Infallible>,
    LATCH: OutputPin<Error = Infallible>,
    DELAY: DelayUs<u32>,
{
    /// Takes ownership of the lines and drives all three low.
    pub fn new(data: DATA, clock: CLOCK, latch: LATCH, delay: DELAY) -> Self {
        let mut wire = Self {
            data,
            clock,
            latch,
            delay,
        };
        drive(&mut wire.data, false);
        drive(&mut wire.clock, false);
        drive(&mut wire.latch, false);
        wire
    }

    /// Gives the pins and the delay back.
    pub fn release(self) -> (DATA, CLOCK, LATCH, DELAY) {
        (self.data, self.clock, self.latch, self.delay)
    }
}

impl<DATA, CLOCK, LATCH, DELAY> SerialLines for Wire<DATA, CLOCK, LATCH, DELAY>
where
    DATA: OutputPin<Error = Infallible>,
    CLOCK: OutputPin<Error = Infallible>,
    LATCH: OutputPin<Error = Infallible>,
    DELAY: DelayUs<u32>,
{
    fn write_data(&mut self, high: bool) {
        drive(&mut self.data, high);
    }

    fn pulse_clock(&mut self, hold_us: u32) {
        drive(&mut self.clock, true);
        if hold_us > 0 {
            self.delay.delay_us(hold_us);
        }
        drive(&mut self.clock, false);
    }

    fn write_latch(&mut self, high: bool) {
        drive(&mut self.latch, high);
    }

    fn delay_us(&mut self, us: u32) {
        self.delay.delay_us(us);
    }
}

fn drive<P: OutputPin<Error = Infallible>>(pin: &mut P, high: bool) {
    let Ok(()) = if high { pin.set_high() } else { pin.set_low() };
}
