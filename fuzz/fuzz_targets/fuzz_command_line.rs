#![no_main]
use jog_core::{AxisCommand, JogCfg, LineAssembler, StepCount};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let jog = JogCfg::default();
    let mut lines = LineAssembler::new(jog_core::line::DEFAULT_LINE_CAPACITY);
    for &byte in data {
        let Some(line) = lines.push(byte) else {
            continue;
        };
        assert!(line.len() <= lines.capacity());
        if let Some(AxisCommand::JogAxis { steps, .. }) = AxisCommand::parse(&line, &jog) {
            let n = steps.steps();
            assert!((1..=jog.max_steps).contains(&n));
            if let StepCount::Substituted { steps, .. } = steps {
                assert!(steps >= 1);
            }
        }
    }
});
