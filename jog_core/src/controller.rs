//! The owned controller: command interpreter plus tracking loop.
//!
//! One `tick` runs a single tracking increment and then drains every complete
//! command line from the serial source. Nothing here returns an error to the
//! caller; faults are reported on the console and through `tracing`.

use std::sync::Arc;
use std::time::Instant;

use jog_traits::clock::Clock;
use jog_traits::{AnalogChannel, AnalogInput, PinBank, SerialSource, Watchdog};

use crate::actuator::{Direction, StepActuator};
use crate::command::{Axis, AxisCommand, HELP_LINES, StepCount};
use crate::config::{ControllerCfg, JogPolicy};
use crate::console::Console;
use crate::error::MoveFault;
use crate::hw_error::map_boxed;
use crate::line::LineAssembler;
use crate::tracker::{PositionTracker, TickOutcome};

/// Result of one scheduler tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    pub tracking: TickOutcome,
    /// Command lines interpreted this tick
    pub lines: usize,
}

pub struct Controller<P, A, W> {
    actuator: StepActuator<P, W>,
    analog: A,
    console: Box<dyn Console>,
    clock: Arc<dyn Clock + Send + Sync>,
    epoch: Instant,
    tracker: PositionTracker,
    lines: LineAssembler,
    cfg: ControllerCfg,
}

impl<P, A, W> core::fmt::Debug for Controller<P, A, W> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Controller")
            .field("actuator", &self.actuator)
            .field("tracking", self.tracker.state())
            .finish_non_exhaustive()
    }
}

impl<P: PinBank, A: AnalogInput, W: Watchdog> Controller<P, A, W> {
    pub(crate) fn new(
        pins: P,
        analog: A,
        watchdog: W,
        console: Box<dyn Console>,
        clock: Arc<dyn Clock + Send + Sync>,
        cfg: ControllerCfg,
    ) -> Self {
        let epoch = clock.now();
        Self {
            actuator: StepActuator::new(pins, watchdog, clock.clone(), cfg.pins.enable),
            analog,
            console,
            clock,
            epoch,
            tracker: PositionTracker::new(cfg.tracking.clone()),
            lines: LineAssembler::new(cfg.line_capacity),
            cfg,
        }
    }

    pub fn cfg(&self) -> &ControllerCfg {
        &self.cfg
    }

    pub fn tracker(&self) -> &PositionTracker {
        &self.tracker
    }

    pub fn actuator(&self) -> &StepActuator<P, W> {
        &self.actuator
    }

    pub fn analog(&self) -> &A {
        &self.analog
    }

    pub fn clock(&self) -> &Arc<dyn Clock + Send + Sync> {
        &self.clock
    }

    pub fn line_assembler(&self) -> &LineAssembler {
        &self.lines
    }

    /// Milliseconds since the controller was built.
    pub fn now_ms(&self) -> u64 {
        self.clock.ms_since(self.epoch)
    }

    /// Release the drivers and print the banner.
    pub fn init(&mut self) {
        match self.actuator.disable() {
            Ok(()) => self.say("Steppers DISABLED - Manual movement allowed"),
            Err(e) => {
                tracing::error!(error = %e, "could not release drivers at init");
                self.say(&format!("Stepper disable failed: {e}"));
            }
        }
        self.say("Manual Control Initialized");
        self.say("Commands: h, b, x+[steps], y+[steps], z+[steps], e+[steps], on, off");
        self.say("ADC Control: adc_on, adc_off, adc_zero, adc_range[value]");
        self.say("Examples: x+200, y-50, z+5, e+100 (type 'help' for full list)");
        tracing::info!(
            range = self.tracker.range(),
            axis = %self.cfg.tracking.axis,
            policy = ?self.cfg.tracking.jog_policy,
            "controller initialized"
        );
    }

    /// Stop tracking and release the drivers on the way out.
    pub fn release(&mut self) {
        self.tracker.deactivate();
        match self.actuator.disable() {
            Ok(()) => tracing::info!(total_steps = self.actuator.total_steps(), "drivers released"),
            Err(e) => tracing::warn!(error = %e, "could not release drivers"),
        }
    }

    /// One scheduler tick: tracking first, then queued commands.
    pub fn tick<S: SerialSource + ?Sized>(&mut self, serial: &mut S) -> TickReport {
        self.actuator.refresh_watchdog();
        let tracking = self.tracking_tick();
        let lines = self.lines.drain(serial);
        for line in &lines {
            self.interpret(line);
        }
        TickReport {
            tracking,
            lines: lines.len(),
        }
    }

    /// Parse and execute one command line.
    pub fn interpret(&mut self, line: &str) {
        if let Some(cmd) = AxisCommand::parse(line, &self.cfg.jog) {
            tracing::debug!(?cmd, "command");
            self.execute(cmd);
        }
    }

    pub fn execute(&mut self, cmd: AxisCommand) {
        match cmd {
            AxisCommand::JogAxis {
                axis,
                direction,
                steps,
            } => self.jog(axis, direction, steps),
            AxisCommand::EnableSteppers => {
                self.enable_steppers();
            }
            AxisCommand::DisableSteppers => match self.actuator.disable() {
                Ok(()) => self.say("Steppers DISABLED - Manual movement allowed"),
                Err(e) => {
                    tracing::error!(error = %e, "disable failed");
                    self.say(&format!("Stepper disable failed: {e}"));
                }
            },
            AxisCommand::ReadThermistor { which } => self.read_thermistor(which),
            AxisCommand::TrackingOn => self.tracking_on(),
            AxisCommand::TrackingOff => {
                self.tracker.deactivate();
                self.say("ADC Position Control DISABLED");
            }
            AxisCommand::TrackingZero => {
                self.tracker.zero();
                self.say("Current position reset to zero");
            }
            AxisCommand::SetRange { value } => match self.tracker.set_range(value) {
                Ok(half) => self.say(&format!("Position range set to ±{half}")),
                Err(rejected) => {
                    tracing::warn!(%rejected, "range rejected");
                    self.report_range();
                }
            },
            AxisCommand::QueryRange => self.report_range(),
            AxisCommand::Help => {
                for line in HELP_LINES {
                    self.say(line);
                }
            }
            AxisCommand::Unknown { raw } => {
                self.say(&format!("Unknown command: {raw} (type 'help' for commands)"));
            }
        }
    }

    /// One increment of the position tracker.
    pub fn tracking_tick(&mut self) -> TickOutcome {
        if !self.tracker.is_active() {
            return TickOutcome::Inactive;
        }
        let now = self.now_ms();
        if !self.tracker.is_due(now) {
            return TickOutcome::RateLimited;
        }

        let raw = match self.analog.read(AnalogChannel::Bed) {
            Ok(raw) => raw,
            Err(e) => {
                let e = map_boxed(e);
                tracing::warn!(error = %e, "tracking sample failed");
                return TickOutcome::SampleFailed;
            }
        };
        let Some(median) = self.tracker.observe(raw) else {
            return TickOutcome::SampleFailed;
        };
        let Some(correction) = self.tracker.plan(raw, median) else {
            let state = self.tracker.state();
            return TickOutcome::InDeadzone {
                target: state.target_position,
                error: state.target_position - state.current_position,
            };
        };

        let pins = self.cfg.pins.axis(self.cfg.tracking.axis);
        let timing = self.cfg.timing.track_pulse();
        let issued = match self.actuator.move_axis(
            pins,
            correction.direction,
            correction.steps,
            self.cfg.tracking.max_steps_per_update,
            &timing,
        ) {
            Ok(n) => n,
            Err(fault) => {
                self.report_fault(&fault);
                fault.issued
            }
        };
        if let Some(status) = self.tracker.commit(&correction, issued, now) {
            self.say(&status.to_string());
        }
        TickOutcome::Corrected {
            issued,
            error: correction.error,
        }
    }

    fn jog(&mut self, axis: Axis, direction: Direction, steps: StepCount) {
        if let StepCount::Substituted { steps, rejected } = &steps {
            tracing::warn!(%axis, %rejected, default = steps, "step count replaced by default");
            self.say(&format!(
                "Invalid step count '{rejected}' (allowed 1-{}), using default {steps}",
                self.cfg.jog.max_steps
            ));
        }

        if self.tracker.is_active() && axis == self.cfg.tracking.axis {
            match self.cfg.tracking.jog_policy {
                JogPolicy::DropTracking => {
                    self.tracker.deactivate();
                    self.say("ADC Position Control DISABLED (manual jog)");
                }
                JogPolicy::RejectJog => {
                    tracing::warn!(%axis, "jog rejected while tracking");
                    self.say(&format!(
                        "Jog rejected: {axis} is under ADC position control (adc_off first)"
                    ));
                    return;
                }
                JogPolicy::Allow => {}
            }
        }

        let n = steps.steps();
        self.say(&format!("Moving {n} steps {}", direction.describe()));
        let pins = self.cfg.pins.axis(axis);
        let timing = self.cfg.timing.jog_pulse();
        tracing::debug!(
            %axis,
            steps = n,
            busy_us = u64::try_from(timing.move_duration(n).as_micros()).unwrap_or(u64::MAX),
            "jog"
        );
        match self
            .actuator
            .move_axis(pins, direction, n, self.cfg.jog.max_steps, &timing)
        {
            Ok(_) => self.say("Move complete"),
            Err(fault) => self.report_fault(&fault),
        }
    }

    fn enable_steppers(&mut self) -> bool {
        match self.actuator.enable() {
            Ok(()) => {
                self.say("Steppers ENABLED");
                true
            }
            Err(e) => {
                tracing::error!(error = %e, "enable failed");
                self.say(&format!("Stepper enable failed: {e}"));
                false
            }
        }
    }

    fn tracking_on(&mut self) {
        if !self.enable_steppers() {
            return;
        }
        self.tracker.activate();
        let half = self.tracker.half_range();
        self.say(&format!(
            "ADC Position Control ENABLED - ADC controls {} position",
            self.cfg.tracking.axis
        ));
        self.say(&format!("Range: {} to +{half} steps", -half));
    }

    fn read_thermistor(&mut self, which: AnalogChannel) {
        let label = match which {
            AnalogChannel::Hotend => "Hotend",
            AnalogChannel::Bed => "Bed",
        };
        match self.analog.read(which) {
            Ok(raw) => {
                let reading = self.cfg.thermistor.reading(raw);
                self.say(&reading.describe(label));
            }
            Err(e) => {
                let e = map_boxed(e);
                tracing::error!(channel = label, error = %e, "thermistor read failed");
                self.say(&format!("{label} ADC read failed: {e}"));
            }
        }
    }

    fn report_range(&mut self) {
        let half = self.tracker.half_range();
        self.say(&format!("Current position range: ±{half}"));
    }

    fn report_fault(&mut self, fault: &MoveFault) {
        tracing::error!(
            issued = fault.issued,
            requested = fault.requested,
            error = %fault.error,
            "move aborted"
        );
        self.say(&format!("Move aborted: {fault}"));
    }

    fn say(&mut self, text: &str) {
        self.console.line(text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::ControllerBuilder;
    use crate::mocks::{CountingWatchdog, MemoryConsole, RecordingPins, ScriptedAnalog};
    use jog_traits::TestClock;
    use std::collections::VecDeque;

    type TestController = Controller<RecordingPins, ScriptedAnalog, CountingWatchdog>;

    fn controller() -> (TestController, RecordingPins, MemoryConsole) {
        let pins = RecordingPins::new();
        let console = MemoryConsole::new();
        let c = ControllerBuilder::new()
            .with_pins(pins.clone())
            .with_analog(ScriptedAnalog::new())
            .with_watchdog(CountingWatchdog::new())
            .with_console(console.clone())
            .with_clock(Arc::new(TestClock::new()))
            .build()
            .unwrap();
        (c, pins, console)
    }

    #[test]
    fn init_releases_drivers_and_prints_banner() {
        let (mut c, pins, console) = controller();
        c.init();
        assert_eq!(pins.last_level(26), Some(jog_traits::Level::High));
        let lines = console.lines();
        assert_eq!(lines[0], "Steppers DISABLED - Manual movement allowed");
        assert_eq!(lines[1], "Manual Control Initialized");
        assert_eq!(lines.len(), 5);
    }

    #[test]
    fn lines_are_interpreted_after_tracking() {
        let (mut c, _pins, console) = controller();
        let mut serial: VecDeque<u8> = b"adc_on\n".iter().copied().collect();
        let report = c.tick(&mut serial);
        assert_eq!(report.tracking, TickOutcome::Inactive);
        assert_eq!(report.lines, 1);
        assert!(c.tracker().is_active());
        assert!(console.contains("Range: -3200 to +3200 steps"));
    }

    #[test]
    fn substituted_count_is_reported() {
        let (mut c, pins, console) = controller();
        c.interpret("z+abc");
        assert!(console.contains("Invalid step count 'abc'"));
        assert!(console.contains("Moving 10 steps forward"));
        assert_eq!(pins.rising_edges(24), 10);
    }
}
