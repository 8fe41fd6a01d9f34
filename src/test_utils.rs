use core::convert::Infallible;
use std::cell::RefCell;
use std::rc::Rc;

use embedded_hal::blocking::delay::DelayUs;
use embedded_hal::digital::v2::OutputPin;

use crate::diagnostics::Diagnostics;
use crate::error::Error;
use crate::lines::Wire;
use crate::random::RandomSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line {
    Data,
    Clock,
    Latch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Level(Line, bool),
    Delay(u32),
}

/// Shared, ordered record of everything the fake lines saw.
#[derive(Debug, Clone, Default)]
pub struct EventLog(Rc<RefCell<Vec<Event>>>);

impl EventLog {
    pub fn push(&self, event: Event) {
        self.0.borrow_mut().push(event);
    }

    pub fn take(&self) -> Vec<Event> {
        core::mem::take(&mut *self.0.borrow_mut())
    }

    pub fn events(&self) -> Vec<Event> {
        self.0.borrow().clone()
    }

    /// DATA level sampled at every rising CLOCK edge.
    pub fn data_bits(&self) -> Vec<u8> {
        let mut data = false;
        let mut bits = Vec::new();
        for event in self.0.borrow().iter() {
            match event {
                Event::Level(Line::Data, level) => data = *level,
                Event::Level(Line::Clock, true) => bits.push(u8::from(data)),
                _ => {}
            }
        }
        bits
    }

    pub fn delays(&self) -> Vec<u32> {
        self.0
            .borrow()
            .iter()
            .filter_map(|event| match event {
                Event::Delay(us) => Some(*us),
                _ => None,
            })
            .collect()
    }

    pub fn latch_levels(&self) -> Vec<bool> {
        self.0
            .borrow()
            .iter()
            .filter_map(|event| match event {
                Event::Level(Line::Latch, level) => Some(*level),
                _ => None,
            })
            .collect()
    }
}

/// Output pin logging every level it is driven to.
pub struct FakePin {
    line: Line,
    log: EventLog,
}

impl FakePin {
    pub fn new(line: Line, log: &EventLog) -> Self {
        Self {
            line,
            log: log.clone(),
        }
    }

    pub fn line(&self) -> Line {
        self.line
    }
}

impl OutputPin for FakePin {
    type Error = Infallible;

    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.log.push(Event::Level(self.line, false));
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.log.push(Event::Level(self.line, true));
        Ok(())
    }
}

/// Delay logging each wait instead of sleeping.
pub struct FakeDelay {
    log: EventLog,
}

impl FakeDelay {
    pub fn new(log: &EventLog) -> Self {
        Self { log: log.clone() }
    }
}

impl DelayUs<u32> for FakeDelay {
    fn delay_us(&mut self, us: u32) {
        self.log.push(Event::Delay(us));
    }
}

pub type FakeWire = Wire<FakePin, FakePin, FakePin, FakeDelay>;

pub fn fake_wire(log: &EventLog) -> FakeWire {
    Wire::new(
        FakePin::new(Line::Data, log),
        FakePin::new(Line::Clock, log),
        FakePin::new(Line::Latch, log),
        FakeDelay::new(log),
    )
}

/// Replays a fixed list of values and remembers the bounds it was asked for.
pub struct ScriptedRandom {
    values: Vec<u32>,
    next: usize,
    bounds: Vec<u32>,
}

impl ScriptedRandom {
    pub fn new(values: &[u32]) -> Self {
        Self {
            values: values.to_vec(),
            next: 0,
            bounds: Vec::new(),
        }
    }

    pub fn bounds(&self) -> &[u32] {
        &self.bounds
    }
}

impl RandomSource for ScriptedRandom {
    fn next_below(&mut self, bound: u32) -> u32 {
        self.bounds.push(bound);
        let value = self.values[self.next % self.values.len()];
        self.next += 1;
        value % bound
    }
}

#[derive(Debug, Default)]
pub struct Recorder {
    pub errors: Vec<Error>,
}

impl Diagnostics for Recorder {
    fn report(&mut self, error: Error) {
        self.errors.push(error);
    }
}
