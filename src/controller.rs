//! Animation state machine on top of the chip driver.
//!
//! ```text
//! Idle      --select_pattern-->  Animating
//! Animating --pause-->           Paused
//! Paused    --resume-->          Animating
//! Animating --stop / repeat limit reached-->  Idle
//! ```
//!
//! [`BarLed::tick`] is meant to be called from a single control loop. It
//! never blocks beyond the microsecond waits of one transmission.

use embassy_time::{Duration, Instant};

use crate::config::{Config, DEFAULT_STEP_INTERVAL};
use crate::diagnostics::{Diagnostics, Silent};
use crate::driver::ChipOutputDriver;
use crate::error::Error;
use crate::lines::SerialLines;
use crate::pattern::{Pattern, PatternEngine};
use crate::random::RandomSource;

/// Where the controller is in the animation lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "debug-mode", derive(defmt::Format))]
pub enum ControllerState {
    /// No pattern selected
    #[default]
    Idle,
    /// Pattern advancing on every due tick
    Animating,
    /// Pattern selected but frozen
    Paused,
}

/// Progress of the selected pattern.
#[derive(Debug, Clone, Copy)]
struct PatternSession {
    /// Pattern being played
    pattern: Pattern,
    /// Next step to compute, wraps at the LED count
    step: u16,
    /// When the last step was shown, or the pattern selected/resumed
    last_tick: Instant,
    /// Frozen by `pause`
    paused: bool,
    /// Full cycles completed so far
    repeat_count: u8,
}

/// Bar-graph controller.
///
/// Owns the chain driver, the pattern engine and the randomness and
/// diagnostics collaborators.
pub struct BarLed<L, R, D = Silent> {
    /// Chain state and wire output
    driver: ChipOutputDriver<L>,
    /// Pattern frames for the current LED count
    engine: PatternEngine,
    /// Feeds the random pattern
    rng: R,
    /// Sink for validation failures in debug mode
    diagnostics: D,
    /// Running pattern, `None` when idle
    session: Option<PatternSession>,
    /// Minimum time between two pattern steps
    step_interval: Duration,
    /// Completed cycles before a pattern stops itself, 0 for never
    max_repeats: u8,
    /// Most recent validation failure
    last_error: Option<Error>,
    /// Runtime switch for reporting to `diagnostics`
    debug_mode: bool,
}

impl<L: SerialLines, R: RandomSource> BarLed<L, R> {
    /// Creates an idle controller with all LEDs off and debug mode disabled.
    ///
    /// # Arguments
    ///
    /// * `lines` - DATA/CLOCK/LATCH lines of the chain
    /// * `config` - Validated chain configuration
    /// * `rng` - Source for the random pattern
    pub fn new(lines: L, config: Config, rng: R) -> Self {
        Self {
            driver: ChipOutputDriver::new(lines, config),
            engine: PatternEngine::new(&config.layout),
            rng,
            diagnostics: Silent,
            session: None,
            step_interval: DEFAULT_STEP_INTERVAL,
            max_repeats: 0,
            last_error: None,
            debug_mode: false,
        }
    }
}

impl<L: SerialLines, R: RandomSource, D: Diagnostics> BarLed<L, R, D> {
    /// Routes validation failures to `diagnostics` while debug mode is on.
    pub fn with_diagnostics<D2: Diagnostics>(self, diagnostics: D2) -> BarLed<L, R, D2> {
        BarLed {
            driver: self.driver,
            engine: self.engine,
            rng: self.rng,
            diagnostics,
            session: self.session,
            step_interval: self.step_interval,
            max_repeats: self.max_repeats,
            last_error: self.last_error,
            debug_mode: self.debug_mode,
        }
    }

    /// Sink receiving validation failures.
    pub fn diagnostics(&self) -> &D {
        &self.diagnostics
    }

    /// Re-initializes the chain from raw legacy ids.
    ///
    /// On success the pattern session ends and the state is replaced by an
    /// all-off state sized for the new layout. On failure nothing changes
    /// apart from the recorded error.
    pub fn initialize(&mut self, protocol_id: u8, pins_per_chip: u8, chip_count: u8) -> Result<(), Error> {
        let config = Config::from_raw(protocol_id, pins_per_chip, chip_count).map_err(|e| self.fail(e))?;

        self.session = None;
        self.engine = PatternEngine::new(&config.layout);
        self.driver.reconfigure(config);
        Ok(())
    }

    /// Ends any pattern and shows `bitmask` directly.
    pub fn set_direct(&mut self, bitmask: u16) {
        self.session = None;
        self.driver.set_direct(bitmask);
    }

    /// Ends any pattern and lights pins from a legacy pin combination.
    ///
    /// See [`ChipOutputDriver::set_from_combination`].
    pub fn set_combination(&mut self, value: u32) {
        self.session = None;
        self.driver.set_from_combination(value);
    }

    /// Starts `pattern` from its first step with the LEDs blanked.
    ///
    /// The first frame is shown one step interval after `now`.
    pub fn select_pattern(&mut self, pattern: Pattern, now: Instant) {
        #[cfg(feature = "debug-mode")]
        defmt::info!("Pattern {} selected", pattern);

        self.session = Some(PatternSession {
            pattern,
            step: 0,
            last_tick: now,
            paused: false,
            repeat_count: 0,
        });
        self.driver.clear_all();
    }

    /// Selects a pattern by legacy id. Id `0` stops the current pattern.
    pub fn select_pattern_id(&mut self, id: u8, now: Instant) -> Result<(), Error> {
        match Pattern::from_id(id).map_err(|e| self.fail(e))? {
            Some(pattern) => self.select_pattern(pattern, now),
            None => self.stop(),
        }
        Ok(())
    }

    /// Ends any pattern and turns every LED off.
    pub fn clear_all(&mut self) {
        self.session = None;
        self.driver.clear_all();
    }

    /// Ends any pattern and turns every LED on.
    pub fn set_all(&mut self) {
        self.session = None;
        self.driver.set_all();
    }

    /// Advances the pattern if one is running and a step is due.
    ///
    /// Returns whether a frame was sent. Once the step counter wraps past
    /// the last LED a cycle is complete; reaching the repeat limit stops the
    /// pattern and blanks the LEDs.
    pub fn tick(&mut self, now: Instant) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        if session.paused {
            return false;
        }
        match now.checked_duration_since(session.last_tick) {
            Some(elapsed) if elapsed >= self.step_interval => {}
            _ => return false,
        }
        session.last_tick = now;

        let frame = self.engine.compute_state(session.pattern, session.step, &mut self.rng);
        session.step += 1;

        let mut finished = false;
        if session.step >= u16::from(self.engine.total_pins()) {
            session.step = 0;
            session.repeat_count = session.repeat_count.saturating_add(1);
            finished = self.max_repeats > 0 && session.repeat_count >= self.max_repeats;
        }

        self.driver.set_direct(frame);

        if finished {
            #[cfg(feature = "debug-mode")]
            defmt::info!("Pattern finished after {} cycles", self.max_repeats);

            self.stop();
        }
        true
    }

    /// Time between pattern steps, 100 ms by default.
    pub fn set_step_interval(&mut self, interval: Duration) {
        self.step_interval = interval;
    }

    /// Time between pattern steps.
    pub fn step_interval(&self) -> Duration {
        self.step_interval
    }

    /// Ends the pattern and blanks the LEDs.
    pub fn stop(&mut self) {
        self.session = None;
        self.driver.clear_all();
    }

    /// Freezes the pattern on its current frame.
    pub fn pause(&mut self) {
        if let Some(session) = self.session.as_mut() {
            #[cfg(feature = "debug-mode")]
            defmt::debug!("Pattern paused at step {}", session.step);

            session.paused = true;
        }
    }

    /// Continues a paused pattern.
    ///
    /// The interval restarts at `now` so no step is made up for the pause.
    pub fn resume(&mut self, now: Instant) {
        if let Some(session) = self.session.as_mut().filter(|session| session.paused) {
            #[cfg(feature = "debug-mode")]
            defmt::debug!("Pattern resumed at step {}", session.step);

            session.paused = false;
            session.last_tick = now;
        }
    }

    /// Number of full cycles a pattern runs before stopping, `0` for no limit.
    ///
    /// Restarts the cycle count of the running pattern.
    pub fn set_repeat_limit(&mut self, times: u8) {
        self.max_repeats = times;
        if let Some(session) = self.session.as_mut() {
            session.repeat_count = 0;
        }
    }

    /// Cycles a pattern runs before stopping, `0` for no limit.
    pub fn repeat_limit(&self) -> u8 {
        self.max_repeats
    }

    /// True when no pattern is running or the running one used up its repeats.
    pub fn is_complete(&self) -> bool {
        match &self.session {
            None => true,
            Some(session) => self.max_repeats > 0 && session.repeat_count >= self.max_repeats,
        }
    }

    /// Pattern running or paused, `None` when idle.
    pub fn current_pattern(&self) -> Option<Pattern> {
        self.session.map(|session| session.pattern)
    }

    /// Where the controller is in the animation lifecycle.
    pub fn state(&self) -> ControllerState {
        match &self.session {
            None => ControllerState::Idle,
            Some(session) if session.paused => ControllerState::Paused,
            Some(_) => ControllerState::Animating,
        }
    }

    /// Brightness `0..=255`; only constant-current and PWM chains can dim.
    pub fn set_brightness(&mut self, brightness: u8) {
        self.driver.set_brightness(brightness);
    }

    /// Brightness last set, 255 by default.
    pub fn brightness(&self) -> u8 {
        self.driver.brightness()
    }

    /// Most recent validation failure. Never cleared.
    pub fn last_error(&self) -> Option<Error> {
        self.last_error
    }

    /// Enables reporting validation failures to the diagnostics sink.
    pub fn set_debug_mode(&mut self, enable: bool) {
        self.debug_mode = enable;
    }

    /// Whether failures are reported.
    pub fn debug_mode(&self) -> bool {
        self.debug_mode
    }

    /// Current per-chip states, chip 0 first.
    pub fn leds(&self) -> &[u16] {
        self.driver.state().as_slice()
    }

    /// Protocol and layout in use.
    pub fn config(&self) -> &Config {
        self.driver.config()
    }

    /// Gives the lines, the random source and the sink back.
    pub fn release(self) -> (L, R, D) {
        (self.driver.release(), self.rng, self.diagnostics)
    }

    fn fail(&mut self, error: Error) -> Error {
        self.last_error = Some(error);
        if self.debug_mode {
            self.diagnostics.report(error);
        }
        error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChipLayout;
    use crate::protocol::Protocol;
    use crate::random::XorShift32;
    use crate::test_utils::{EventLog, FakeWire, Recorder, ScriptedRandom, fake_wire};

    type TestBar = BarLed<FakeWire, XorShift32>;

    fn at(ms: u64) -> Instant {
        Instant::from_millis(ms)
    }

    fn bar(pins: u8, chips: u8) -> (TestBar, EventLog) {
        let log = EventLog::default();
        let layout = ChipLayout::new(pins, chips).unwrap();
        let config = Config::new(Protocol::ShiftRegister, layout);
        let bar = BarLed::new(fake_wire(&log), config, XorShift32::new(42));
        (bar, log)
    }

    #[test]
    fn starts_idle_with_defaults() {
        let (bar, _log) = bar(8, 1);
        assert_eq!(bar.state(), ControllerState::Idle);
        assert_eq!(bar.current_pattern(), None);
        assert!(bar.is_complete());
        assert_eq!(bar.step_interval(), Duration::from_millis(100));
        assert_eq!(bar.brightness(), 255);
        assert_eq!(bar.repeat_limit(), 0);
        assert_eq!(bar.last_error(), None);
        assert!(!bar.debug_mode());
        assert_eq!(bar.leds(), [0]);
    }

    #[test]
    fn selecting_a_pattern_blanks_and_waits_one_interval() {
        let (mut bar, log) = bar(4, 1);
        bar.set_direct(0b1111);
        log.take();

        bar.select_pattern(Pattern::Increment, at(1_000));
        assert_eq!(bar.state(), ControllerState::Animating);
        assert_eq!(bar.current_pattern(), Some(Pattern::Increment));
        assert_eq!(bar.leds(), [0]);
        assert_eq!(log.latch_levels(), [false, true]);

        assert!(!bar.tick(at(1_099)));
        assert!(bar.tick(at(1_100)));
        assert_eq!(bar.leds(), [0b0001]);
        assert!(!bar.tick(at(1_150)));
        assert!(bar.tick(at(1_200)));
        assert_eq!(bar.leds(), [0b0010]);
    }

    #[test]
    fn repeat_limit_stops_after_exactly_one_cycle() {
        let (mut bar, _log) = bar(4, 1);
        bar.set_repeat_limit(1);
        bar.select_pattern(Pattern::Increment, at(0));

        for (tick, expected) in [(1, 0b0001), (2, 0b0010), (3, 0b0100)] {
            assert!(bar.tick(at(tick * 100)));
            assert_eq!(bar.leds(), [expected]);
            assert_eq!(bar.state(), ControllerState::Animating);
            assert!(!bar.is_complete());
        }

        assert!(bar.tick(at(400)));
        assert_eq!(bar.state(), ControllerState::Idle);
        assert!(bar.is_complete());
        assert_eq!(bar.current_pattern(), None);
        assert_eq!(bar.leds(), [0]);

        assert!(!bar.tick(at(500)));
        assert_eq!(bar.leds(), [0]);
    }

    #[test]
    fn unbounded_pattern_keeps_cycling() {
        let (mut bar, _log) = bar(3, 1);
        bar.select_pattern(Pattern::Chase, at(0));
        let frames: Vec<u16> = (1..=7)
            .map(|tick| {
                assert!(bar.tick(at(tick * 100)));
                bar.leds()[0]
            })
            .collect();
        assert_eq!(frames, [1, 2, 4, 1, 2, 4, 1]);
        assert_eq!(bar.state(), ControllerState::Animating);
        assert!(!bar.is_complete());
    }

    #[test]
    fn pattern_frames_span_chips() {
        let (mut bar, _log) = bar(4, 2);
        bar.select_pattern(Pattern::Grow, at(0));
        for tick in 1..=6 {
            bar.tick(at(tick * 100));
        }
        assert_eq!(bar.leds(), [0b1111, 0b0011]);
    }

    #[test]
    fn pause_freezes_and_resume_restarts_interval() {
        let (mut bar, _log) = bar(4, 1);
        bar.select_pattern(Pattern::Increment, at(0));
        assert!(bar.tick(at(100)));

        bar.pause();
        assert_eq!(bar.state(), ControllerState::Paused);
        assert!(!bar.tick(at(5_000)));
        assert_eq!(bar.leds(), [0b0001]);

        bar.resume(at(10_000));
        assert_eq!(bar.state(), ControllerState::Animating);
        assert!(!bar.tick(at(10_050)));
        assert!(bar.tick(at(10_100)));
        assert_eq!(bar.leds(), [0b0010]);
    }

    #[test]
    fn pause_and_resume_without_pattern_do_nothing() {
        let (mut bar, _log) = bar(4, 1);
        bar.pause();
        bar.resume(at(0));
        assert_eq!(bar.state(), ControllerState::Idle);
    }

    #[test]
    fn resume_when_not_paused_keeps_timing() {
        let (mut bar, _log) = bar(4, 1);
        bar.select_pattern(Pattern::Increment, at(0));
        bar.resume(at(90));
        assert!(bar.tick(at(100)));
    }

    #[test]
    fn clock_going_backwards_is_not_due() {
        let (mut bar, _log) = bar(4, 1);
        bar.select_pattern(Pattern::Increment, at(1_000));
        assert!(!bar.tick(at(500)));
    }

    #[test]
    fn step_interval_is_configurable() {
        let (mut bar, _log) = bar(4, 1);
        bar.set_step_interval(Duration::from_millis(20));
        bar.select_pattern(Pattern::Increment, at(0));
        assert!(bar.tick(at(20)));
        assert!(bar.tick(at(40)));
        assert_eq!(bar.leds(), [0b0010]);
    }

    #[test]
    fn set_repeat_limit_restarts_cycle_count() {
        let (mut bar, _log) = bar(2, 1);
        bar.select_pattern(Pattern::Increment, at(0));
        for tick in 1..=4 {
            bar.tick(at(tick * 100));
        }
        bar.set_repeat_limit(1);
        assert!(!bar.is_complete());
        bar.tick(at(500));
        assert_eq!(bar.state(), ControllerState::Animating);
        bar.tick(at(600));
        assert_eq!(bar.state(), ControllerState::Idle);
    }

    #[test]
    fn direct_writes_end_the_pattern() {
        let (mut bar, _log) = bar(4, 2);
        bar.select_pattern(Pattern::Chase, at(0));
        bar.set_direct(0b1010_0101);
        assert_eq!(bar.state(), ControllerState::Idle);
        assert_eq!(bar.leds(), [0b0101, 0b1010]);

        bar.select_pattern(Pattern::Chase, at(0));
        bar.set_combination(23);
        assert_eq!(bar.state(), ControllerState::Idle);
        assert_eq!(bar.leds(), [0b0110, 0]);

        bar.select_pattern(Pattern::Chase, at(0));
        bar.set_all();
        assert_eq!(bar.state(), ControllerState::Idle);
        assert_eq!(bar.leds(), [0b1111, 0b1111]);

        bar.select_pattern(Pattern::Chase, at(0));
        bar.clear_all();
        assert_eq!(bar.state(), ControllerState::Idle);
        assert_eq!(bar.leds(), [0, 0]);
    }

    #[test]
    fn stop_blanks_and_goes_idle() {
        let (mut bar, _log) = bar(4, 1);
        bar.select_pattern(Pattern::Grow, at(0));
        bar.tick(at(100));
        bar.stop();
        assert_eq!(bar.state(), ControllerState::Idle);
        assert_eq!(bar.leds(), [0]);
    }

    #[test]
    fn pattern_ids() {
        let (mut bar, _log) = bar(4, 1);
        assert_eq!(bar.select_pattern_id(7, at(0)), Ok(()));
        assert_eq!(bar.current_pattern(), Some(Pattern::Bounce));

        bar.tick(at(100));
        assert_eq!(bar.select_pattern_id(42, at(150)), Err(Error::InvalidPattern));
        assert_eq!(bar.last_error(), Some(Error::InvalidPattern));
        assert_eq!(bar.current_pattern(), Some(Pattern::Bounce));
        assert_eq!(bar.leds(), [0b0001]);

        assert_eq!(bar.select_pattern_id(0, at(200)), Ok(()));
        assert_eq!(bar.state(), ControllerState::Idle);
        assert_eq!(bar.last_error(), Some(Error::InvalidPattern));
    }

    #[test]
    fn failed_initialize_leaves_state_untouched() {
        let (mut bar, _log) = bar(4, 2);
        bar.set_direct(0b0011_0110);

        assert_eq!(bar.initialize(0, 0, 2), Err(Error::InvalidPinConfiguration));
        assert_eq!(bar.last_error(), Some(Error::InvalidPinConfiguration));
        assert_eq!(bar.leds(), [0b0110, 0b0011]);
        assert_eq!(bar.config().total_pins(), 8);

        assert_eq!(bar.initialize(9, 4, 2), Err(Error::InvalidProtocol));
        assert_eq!(bar.last_error(), Some(Error::InvalidProtocol));

        bar.set_all();
        assert_eq!(bar.leds(), [0b1111, 0b1111]);
    }

    #[test]
    fn initialize_replaces_layout_and_ends_pattern() {
        let (mut bar, _log) = bar(4, 2);
        bar.select_pattern(Pattern::Chase, at(0));
        bar.tick(at(100));

        assert_eq!(bar.initialize(1, 3, 3), Ok(()));
        assert_eq!(bar.state(), ControllerState::Idle);
        assert_eq!(bar.config().protocol, Protocol::ConstantCurrent);
        assert_eq!(bar.leds(), [0, 0, 0]);

        bar.set_repeat_limit(1);
        bar.select_pattern(Pattern::Increment, at(0));
        for tick in 1..=8 {
            bar.tick(at(tick * 100));
        }
        assert_eq!(bar.leds(), [0, 0, 0b010]);
        bar.tick(at(900));
        assert!(bar.is_complete());
    }

    #[test]
    fn errors_reach_diagnostics_only_in_debug_mode() {
        let (bar, _log) = bar(4, 1);
        let mut bar = bar.with_diagnostics(Recorder::default());

        bar.select_pattern_id(99, at(0)).unwrap_err();
        assert!(bar.diagnostics().errors.is_empty());
        assert_eq!(bar.last_error(), Some(Error::InvalidPattern));

        bar.set_debug_mode(true);
        bar.select_pattern_id(99, at(0)).unwrap_err();
        bar.initialize(0, 0, 0).unwrap_err();
        assert_eq!(bar.select_pattern_id(3, at(0)), Ok(()));
        assert_eq!(
            bar.diagnostics().errors,
            [Error::InvalidPattern, Error::InvalidPinConfiguration]
        );
    }

    #[test]
    fn closures_work_as_diagnostics() {
        let mut seen = Vec::new();
        {
            let (bar, _log) = bar(4, 1);
            let mut bar = bar.with_diagnostics(|error: Error| seen.push(error));
            bar.set_debug_mode(true);
            bar.initialize(5, 4, 1).unwrap_err();
        }
        assert_eq!(seen, [Error::InvalidProtocol]);
    }

    #[test]
    fn random_pattern_draws_from_rng() {
        let log = EventLog::default();
        let config = Config::new(Protocol::ShiftRegister, ChipLayout::new(3, 1).unwrap());
        let mut bar = BarLed::new(fake_wire(&log), config, ScriptedRandom::new(&[5, 2]));

        bar.select_pattern(Pattern::Random, at(0));
        bar.tick(at(100));
        assert_eq!(bar.leds(), [5]);
        bar.tick(at(200));
        assert_eq!(bar.leds(), [2]);

        let (_wire, rng, _diagnostics) = bar.release();
        assert_eq!(rng.bounds(), [8, 8]);
    }

    #[test]
    fn brightness_is_forwarded() {
        let log = EventLog::default();
        let config = Config::new(Protocol::ConstantCurrent, ChipLayout::new(8, 1).unwrap());
        let mut bar = BarLed::new(fake_wire(&log), config, XorShift32::new(1));
        bar.set_all();
        log.take();

        bar.set_brightness(0);
        assert_eq!(bar.brightness(), 0);
        assert_eq!(log.data_bits(), [0; 16]);
        assert_eq!(bar.leds(), [0xff]);
    }
}
