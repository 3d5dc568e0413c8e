use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use jog_core::config::{ControllerCfg, JogPolicy};
use jog_core::mocks::{CountingWatchdog, FailingPins, MemoryConsole, RecordingPins, ScriptedAnalog};
use jog_core::{Controller, ControllerBuilder, TickOutcome};
use jog_traits::{AnalogChannel, Level, PinBank, TestClock};
use rstest::rstest;

const ENABLE: u8 = 26;
const X_STEP: u8 = 17;
const X_DIR: u8 = 27;
const Y_STEP: u8 = 22;

struct Rig<P> {
    ctl: Controller<P, ScriptedAnalog, CountingWatchdog>,
    analog: ScriptedAnalog,
    console: MemoryConsole,
    clock: TestClock,
}

fn rig_with<P: PinBank>(pins: P, cfg: ControllerCfg) -> Rig<P> {
    let analog = ScriptedAnalog::new();
    let console = MemoryConsole::new();
    let clock = TestClock::new();
    let mut ctl = ControllerBuilder::new()
        .with_pins(pins)
        .with_analog(analog.clone())
        .with_watchdog(CountingWatchdog::new())
        .with_console(console.clone())
        .with_clock(Arc::new(clock.clone()))
        .with_config(cfg)
        .build()
        .expect("controller build");
    ctl.init();
    console.take();
    Rig {
        ctl,
        analog,
        console,
        clock,
    }
}

fn rig() -> (Rig<RecordingPins>, RecordingPins) {
    let pins = RecordingPins::new();
    let r = rig_with(pins.clone(), ControllerCfg::default());
    pins.clear();
    (r, pins)
}

fn rig_policy(policy: JogPolicy) -> (Rig<RecordingPins>, RecordingPins) {
    let pins = RecordingPins::new();
    let mut cfg = ControllerCfg::default();
    cfg.tracking.jog_policy = policy;
    let r = rig_with(pins.clone(), cfg);
    pins.clear();
    (r, pins)
}

/// Bed value whose median maps to a target of +8 on the default 6400 span.
const BED_TARGET_8: u16 = 2053;

#[test]
fn jog_while_disabled_enables_and_pulses() {
    let (mut r, pins) = rig();
    assert!(!r.ctl.actuator().is_enabled());
    r.ctl.interpret("x+50");
    assert_eq!(pins.writes()[0], (ENABLE, Level::Low));
    assert_eq!(pins.rising_edges(X_STEP), 50);
    assert_eq!(pins.last_level(X_DIR), Some(Level::High));
    assert!(r.ctl.actuator().is_enabled());
    assert_eq!(
        r.console.lines(),
        vec!["Moving 50 steps forward", "Move complete"]
    );
}

#[rstest]
#[case("x-", X_STEP, 100)]
#[case("z+", 24, 10)]
#[case("e-", 5, 50)]
#[case("y+0", Y_STEP, 100)]
#[case("e+10001", 5, 50)]
fn jog_defaults(#[case] line: &str, #[case] step_pin: u8, #[case] pulses: usize) {
    let (mut r, pins) = rig();
    r.ctl.interpret(line);
    assert_eq!(pins.rising_edges(step_pin), pulses);
}

#[test]
fn range_zero_is_rejected_and_reported() {
    let (mut r, _pins) = rig();
    r.ctl.interpret("adc_range0");
    assert_eq!(r.ctl.tracker().range(), 6400);
    assert_eq!(r.console.lines(), vec!["Current position range: ±3200"]);
}

#[rstest]
#[case("adc_range3200", 3200, "Position range set to ±1600")]
#[case("adc_range50000", 50_000, "Position range set to ±25000")]
#[case("adc_range1", 1, "Position range set to ±0")]
#[case("adc_range50001", 6400, "Current position range: ±3200")]
#[case("adc_rangeabc", 6400, "Current position range: ±3200")]
#[case("adc_range", 6400, "Current position range: ±3200")]
fn range_commands(#[case] line: &str, #[case] range: i32, #[case] said: &str) {
    let (mut r, _pins) = rig();
    r.ctl.interpret(line);
    assert_eq!(r.ctl.tracker().range(), range);
    assert_eq!(r.console.lines(), vec![said]);
}

#[test]
fn unknown_command_mutates_nothing() {
    let (mut r, pins) = rig();
    let before = r.ctl.tracker().state().clone();
    r.ctl.interpret("bogus");
    assert!(pins.writes().is_empty());
    assert_eq!(r.ctl.tracker().state(), &before);
    assert_eq!(
        r.console.lines(),
        vec!["Unknown command: bogus (type 'help' for commands)"]
    );
}

#[test]
fn zero_twice_without_movement() {
    let (mut r, pins) = rig();
    r.ctl.interpret("adc_zero");
    r.ctl.interpret("adc_zero");
    assert_eq!(r.ctl.tracker().current_position(), 0);
    assert!(pins.writes().is_empty());
    assert_eq!(r.console.lines().len(), 2);
}

#[test]
fn on_off_toggle_enable_line() {
    let (mut r, pins) = rig();
    r.ctl.interpret("on");
    assert_eq!(pins.last_level(ENABLE), Some(Level::Low));
    r.ctl.interpret("off");
    assert_eq!(pins.last_level(ENABLE), Some(Level::High));
    assert_eq!(
        r.console.lines(),
        vec!["Steppers ENABLED", "Steppers DISABLED - Manual movement allowed"]
    );
}

#[test]
fn help_prints_summary() {
    let (mut r, _pins) = rig();
    r.ctl.interpret("help");
    let lines = r.console.lines();
    assert_eq!(lines.len(), 17);
    assert_eq!(lines[16], "adc_range[value] - Set position range");
}

#[test]
fn thermistor_reports() {
    let (mut r, _pins) = rig();
    r.analog.set(AnalogChannel::Hotend, 2048);
    r.ctl.interpret("h");
    r.ctl.interpret("b");
    let lines = r.console.lines();
    assert!(lines[0].starts_with("Hotend ADC Input - ADC: 2048, Voltage: 1.65V"));
    assert!(lines[0].ends_with("kΩ"), "{}", lines[0]);
    assert_eq!(
        lines[1],
        "Bed ADC Input - ADC: 0, Voltage: 0.00V, Calculated R: OPEN"
    );
}

#[test]
fn thermistor_read_failure_is_reported() {
    let (mut r, _pins) = rig();
    r.analog.set_failing(true);
    r.ctl.interpret("h");
    assert!(r.console.contains("Hotend ADC read failed"));
}

#[test]
fn adc_on_enables_and_reports_range() {
    let (mut r, pins) = rig();
    r.ctl.interpret("adc_on");
    assert!(r.ctl.tracker().is_active());
    assert_eq!(pins.last_level(ENABLE), Some(Level::Low));
    assert_eq!(
        r.console.lines(),
        vec![
            "Steppers ENABLED",
            "ADC Position Control ENABLED - ADC controls Y position",
            "Range: -3200 to +3200 steps",
        ]
    );
    r.ctl.interpret("adc_off");
    assert!(!r.ctl.tracker().is_active());
    assert!(r.ctl.actuator().is_enabled());
}

#[test]
fn toggle_takes_effect_next_tick() {
    let (mut r, pins) = rig();
    r.analog.set(AnalogChannel::Bed, 4095);
    let mut serial: VecDeque<u8> = b"adc_on\n".iter().copied().collect();
    let first = r.ctl.tick(&mut serial);
    assert_eq!(first.tracking, TickOutcome::Inactive);
    assert_eq!(pins.rising_edges(Y_STEP), 0);

    let second = r.ctl.tick(&mut serial);
    assert_eq!(
        second.tracking,
        TickOutcome::Corrected {
            issued: 10,
            error: 3200
        }
    );
    assert_eq!(pins.rising_edges(Y_STEP), 10);
    assert_eq!(r.ctl.tracker().current_position(), 10);
}

#[test]
fn rate_gate_and_deadzone() {
    let (mut r, pins) = rig();
    r.analog.set(AnalogChannel::Bed, BED_TARGET_8);
    r.ctl.interpret("adc_on");
    let mut serial = VecDeque::<u8>::new();

    assert_eq!(
        r.ctl.tick(&mut serial).tracking,
        TickOutcome::Corrected { issued: 8, error: 8 }
    );
    // the 8-step move took ~8 ms of the 10 ms interval
    assert_eq!(r.ctl.tick(&mut serial).tracking, TickOutcome::RateLimited);
    r.clock.advance(Duration::from_millis(5));
    assert_eq!(
        r.ctl.tick(&mut serial).tracking,
        TickOutcome::InDeadzone {
            target: 8,
            error: 0
        }
    );
    assert_eq!(pins.rising_edges(Y_STEP), 8);
}

#[test]
fn status_line_every_25th_correction() {
    let (mut r, _pins) = rig();
    r.analog.set(AnalogChannel::Bed, 4095);
    r.ctl.interpret("adc_range50000");
    r.ctl.interpret("adc_on");
    r.console.take();
    let mut serial = VecDeque::<u8>::new();
    for _ in 0..25 {
        r.ctl.tick(&mut serial);
    }
    assert_eq!(
        r.console.lines(),
        vec!["ADC Position Control - Raw: 4095, Median: 4095, Target: 25000, Current: 250, Error: 24760"]
    );
}

#[test]
fn tracking_sample_failure_skips_tick() {
    let (mut r, pins) = rig();
    r.ctl.interpret("adc_on");
    r.analog.set_failing(true);
    let mut serial = VecDeque::<u8>::new();
    assert_eq!(r.ctl.tick(&mut serial).tracking, TickOutcome::SampleFailed);
    assert_eq!(pins.rising_edges(Y_STEP), 0);
}

#[test]
fn drop_tracking_policy_leaves_tracking_then_jogs() {
    let (mut r, pins) = rig_policy(JogPolicy::DropTracking);
    r.ctl.interpret("adc_on");
    r.console.take();
    r.ctl.interpret("y+5");
    assert!(!r.ctl.tracker().is_active());
    assert_eq!(pins.rising_edges(Y_STEP), 5);
    assert_eq!(r.ctl.tracker().current_position(), 0);
    assert_eq!(
        r.console.lines()[0],
        "ADC Position Control DISABLED (manual jog)"
    );
}

#[test]
fn reject_jog_policy_refuses_tracked_axis_only() {
    let (mut r, pins) = rig_policy(JogPolicy::RejectJog);
    r.ctl.interpret("adc_on");
    r.ctl.interpret("y-5");
    assert!(r.ctl.tracker().is_active());
    assert_eq!(pins.rising_edges(Y_STEP), 0);
    assert!(r.console.contains("Jog rejected"));

    r.ctl.interpret("x+5");
    assert_eq!(pins.rising_edges(X_STEP), 5);
}

#[test]
fn allow_policy_moves_without_touching_position() {
    let (mut r, pins) = rig_policy(JogPolicy::Allow);
    r.ctl.interpret("adc_on");
    r.ctl.interpret("y+5");
    assert!(r.ctl.tracker().is_active());
    assert_eq!(pins.rising_edges(Y_STEP), 5);
    assert_eq!(r.ctl.tracker().current_position(), 0);
}

#[test]
fn pin_fault_mid_jog_is_reported() {
    // init's disable, enable, dir, four full pulses and a fifth rising edge
    // succeed; the fifth falling edge fails.
    let pins = FailingPins::after(2 + 2 * 5);
    let mut r = rig_with(pins.clone(), ControllerCfg::default());
    r.ctl.interpret("x+50");
    assert_eq!(pins.recorded().rising_edges(X_STEP), 5);
    let lines = r.console.lines();
    assert_eq!(lines[0], "Moving 50 steps forward");
    assert!(
        lines[1].starts_with("Move aborted: move stopped after 5 of 50 steps"),
        "{}",
        lines[1]
    );
}

#[test]
fn pin_fault_mid_correction_counts_issued_steps() {
    // init disables (1 write), adc_on enables (1), then enable + dir + 3 pulses
    // and one more rising edge before the falling edge fails.
    let pins = FailingPins::after(2 + 2 + 2 * 3 + 1);
    let mut r = rig_with(pins.clone(), ControllerCfg::default());
    r.analog.set(AnalogChannel::Bed, 4095);
    r.ctl.interpret("adc_on");
    let mut serial = VecDeque::<u8>::new();
    let out = r.ctl.tick(&mut serial).tracking;
    assert_eq!(
        out,
        TickOutcome::Corrected {
            issued: 4,
            error: 3200
        }
    );
    assert_eq!(r.ctl.tracker().current_position(), 4);
    assert!(r.console.contains("Move aborted"));
}

#[test]
fn release_stops_tracking_and_disables_drivers() {
    let (mut r, pins) = rig();
    r.ctl.interpret("adc_on");
    assert!(r.ctl.tracker().is_active());
    r.console.take();
    r.ctl.release();
    assert!(!r.ctl.tracker().is_active());
    assert!(!r.ctl.actuator().is_enabled());
    assert_eq!(pins.last_level(ENABLE), Some(Level::High));
    assert!(r.console.lines().is_empty());
}
