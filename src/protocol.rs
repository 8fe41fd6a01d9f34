//! Wire encodings for the supported chip families.
//!
//! A frame is always sent the same way: LATCH is pulled low, every chip's
//! state is shifted in starting with the last chip in the chain, and LATCH is
//! raised once all chips have been clocked. Chip N-1 is shifted first so that
//! chip 0, the one wired to the controller, ends up holding the last bits.
//!
//! The encodings differ in how a single chip's state is clocked:
//!
//! ```text
//! Hc595    2 bytes, MSB first, no clock hold
//! Mbi5027  16 bits, MSB first, 1 µs clock hold
//! Ws2803   18 bits, MSB first, 1 µs clock hold, 500 µs before latch
//! ```

use crate::error::Error;
use crate::lines::SerialLines;

/// Clock high time for the constant-current and PWM drivers.
pub const CLOCK_HOLD_US: u32 = 1;

/// Quiet time the PWM controller needs before a latch edge.
pub const FRAME_LATCH_US: u32 = 500;

/// Chip family driving the chain.
///
/// Discriminants are the legacy protocol ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "debug-mode", derive(defmt::Format))]
#[repr(u8)]
pub enum Protocol {
    /// Generic serial-in/parallel-out shift register (74HC595 class)
    ShiftRegister = 0,
    /// Constant-current LED sink driver (MBI5027 class)
    ConstantCurrent = 1,
    /// Serial PWM LED controller (WS2803 class)
    SerialPwm = 2,
}

impl TryFrom<u8> for Protocol {
    type Error = Error;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        match id {
            0 => Ok(Protocol::ShiftRegister),
            1 => Ok(Protocol::ConstantCurrent),
            2 => Ok(Protocol::SerialPwm),
            _ => Err(Error::InvalidProtocol),
        }
    }
}

impl Protocol {
    /// Legacy numeric id, 0 to 2.
    pub const fn id(self) -> u8 {
        self as u8
    }

    /// Whether the chips have a brightness control at all.
    pub const fn supports_brightness(self) -> bool {
        match self {
            Protocol::ShiftRegister => Hc595::DIMMABLE,
            Protocol::ConstantCurrent => Mbi5027::DIMMABLE,
            Protocol::SerialPwm => Ws2803::DIMMABLE,
        }
    }

    /// Brings freshly configured chips into a known state.
    pub fn reset<L: SerialLines + ?Sized>(self, lines: &mut L) {
        match self {
            Protocol::ShiftRegister => Hc595.reset(lines),
            Protocol::ConstantCurrent => Mbi5027.reset(lines),
            Protocol::SerialPwm => Ws2803.reset(lines),
        }
    }

    /// Sends one frame holding `chips`, where `chips[0]` is the first chip.
    ///
    /// With brightness `0` a brightness-capable chain is sent a blank frame.
    pub fn transmit<L: SerialLines + ?Sized>(self, lines: &mut L, chips: &[u16], brightness: u8) {
        match self {
            Protocol::ShiftRegister => send_frame(&Hc595, lines, chips, brightness),
            Protocol::ConstantCurrent => send_frame(&Mbi5027, lines, chips, brightness),
            Protocol::SerialPwm => send_frame(&Ws2803, lines, chips, brightness),
        }
    }
}

/// How one chip family is clocked.
trait ChipEncoding {
    /// Chips without analog brightness ignore the brightness value.
    const DIMMABLE: bool;

    fn reset<L: SerialLines + ?Sized>(&self, _lines: &mut L) {}

    fn shift_chip<L: SerialLines + ?Sized>(&self, lines: &mut L, state: u16);

    /// Runs after the last chip, before LATCH is raised.
    fn end_frame<L: SerialLines + ?Sized>(&self, _lines: &mut L) {}
}

fn send_frame<E, L>(encoding: &E, lines: &mut L, chips: &[u16], brightness: u8)
where
    E: ChipEncoding,
    L: SerialLines + ?Sized,
{
    let blank = E::DIMMABLE && brightness == 0;

    lines.write_latch(false);
    for &state in chips.iter().rev() {
        encoding.shift_chip(lines, if blank { 0 } else { state });
    }
    encoding.end_frame(lines);
    lines.write_latch(true);
}

fn shift_bits<L: SerialLines + ?Sized>(lines: &mut L, value: u32, bits: u8, hold_us: u32) {
    for i in (0..bits).rev() {
        lines.write_data((value >> i) & 1 == 1);
        lines.pulse_clock(hold_us);
    }
}

struct Hc595;

impl ChipEncoding for Hc595 {
    const DIMMABLE: bool = false;

    fn shift_chip<L: SerialLines + ?Sized>(&self, lines: &mut L, state: u16) {
        let [high, low] = state.to_be_bytes();
        lines.shift_out_msb_first(high);
        lines.shift_out_msb_first(low);
    }
}

struct Mbi5027;

impl ChipEncoding for Mbi5027 {
    const DIMMABLE: bool = true;

    fn shift_chip<L: SerialLines + ?Sized>(&self, lines: &mut L, state: u16) {
        shift_bits(lines, u32::from(state), 16, CLOCK_HOLD_US);
    }
}

struct Ws2803;

impl Ws2803 {
    /// Two framing bits ahead of the 16 state bits, always zero.
    const FRAME_BITS: u8 = 18;
}

impl ChipEncoding for Ws2803 {
    const DIMMABLE: bool = true;

    fn reset<L: SerialLines + ?Sized>(&self, lines: &mut L) {
        lines.write_latch(true);
        lines.delay_us(FRAME_LATCH_US);
        lines.write_latch(false);
    }

    fn shift_chip<L: SerialLines + ?Sized>(&self, lines: &mut L, state: u16) {
        shift_bits(lines, u32::from(state), Self::FRAME_BITS, CLOCK_HOLD_US);
    }

    fn end_frame<L: SerialLines + ?Sized>(&self, lines: &mut L) {
        lines.delay_us(FRAME_LATCH_US);
    }
}
