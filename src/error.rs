//! Validation errors reported by the driver.

/// Reasons a configuration or pattern request was rejected.
///
/// None of these are fatal: the rejected call leaves the LED state as it was.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "debug-mode", derive(defmt::Format))]
pub enum Error {
    /// Protocol id outside the known chip families
    #[error("Invalid chip type")]
    InvalidProtocol,
    /// Zero pins per chip, zero chips, or more than 16 LEDs in total
    #[error("Invalid pin configuration")]
    InvalidPinConfiguration,
    /// Pattern id outside the known pattern library
    #[error("Invalid pattern")]
    InvalidPattern,
}

impl Error {
    /// Legacy numeric error code. `0` is reserved for "no error".
    pub const fn code(self) -> u8 {
        match self {
            Error::InvalidProtocol => 1,
            Error::InvalidPinConfiguration => 2,
            Error::InvalidPattern => 3,
        }
    }

    /// Fixed human-readable text, the same as the `Display` output.
    pub const fn message(self) -> &'static str {
        match self {
            Error::InvalidProtocol => "Invalid chip type",
            Error::InvalidPinConfiguration => "Invalid pin configuration",
            Error::InvalidPattern => "Invalid pattern",
        }
    }
}
