//! A [`BarLed`] that several tasks can reach.
//!
//! The controller itself is single-owner. When one task drives the animation
//! and another picks patterns, wrap it here and hand out `&'static` references.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_time::Instant;

use crate::controller::BarLed;
use crate::diagnostics::{Diagnostics, Silent};
use crate::lines::SerialLines;
use crate::random::RandomSource;

/// [`BarLed`] behind a blocking mutex.
///
/// `M` picks the lock: `CriticalSectionRawMutex` when interrupts or other
/// executors touch it, `NoopRawMutex` within one executor.
pub struct SharedBarLed<M: RawMutex, L, R, D = Silent> {
    /// Controller, borrowed mutably only inside [`SharedBarLed::lock`]
    inner: Mutex<M, RefCell<BarLed<L, R, D>>>,
}

impl<M: RawMutex, L, R, D> SharedBarLed<M, L, R, D> {
    /// Wraps a ready controller.
    pub const fn new(bar: BarLed<L, R, D>) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(bar)),
        }
    }

    /// Runs `f` with exclusive access to the controller.
    ///
    /// Calls must not nest; a nested call panics on the inner borrow.
    pub fn lock<T>(&self, f: impl FnOnce(&mut BarLed<L, R, D>) -> T) -> T {
        self.inner.lock(|cell| f(&mut cell.borrow_mut()))
    }

    /// Unwraps the controller.
    pub fn into_inner(self) -> BarLed<L, R, D> {
        self.inner.into_inner().into_inner()
    }
}

impl<M, L, R, D> SharedBarLed<M, L, R, D>
where
    M: RawMutex,
    L: SerialLines,
    R: RandomSource,
    D: Diagnostics,
{
    /// See [`BarLed::tick`].
    pub fn tick(&self, now: Instant) -> bool {
        self.lock(|bar| bar.tick(now))
    }

    /// See [`BarLed::is_complete`].
    pub fn is_complete(&self) -> bool {
        self.lock(|bar| bar.is_complete())
    }
}
