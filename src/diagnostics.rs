//! Sinks for validation failures.
//!
//! The controller reports each rejected call exactly once, and only while
//! debug mode is switched on. Nothing below the controller talks to a sink.

use crate::error::Error;

/// Receives each validation failure the controller rejects.
pub trait Diagnostics {
    /// Called once per failed call, after the error was recorded.
    fn report(&mut self, error: Error);
}

/// Drops every report.
#[derive(Debug, Default, Clone, Copy)]
pub struct Silent;

impl Diagnostics for Silent {
    fn report(&mut self, _error: Error) {}
}

impl<F> Diagnostics for F
where
    F: FnMut(Error),
{
    fn report(&mut self, error: Error) {
        self(error)
    }
}

/// Writes `Error: <message>` to the defmt log.
#[cfg(feature = "debug-mode")]
#[derive(Debug, Default, Clone, Copy)]
pub struct DefmtDiagnostics;

#[cfg(feature = "debug-mode")]
impl Diagnostics for DefmtDiagnostics {
    fn report(&mut self, error: Error) {
        defmt::warn!("Error: {}", error.message());
    }
}
