#![no_main]
use libfuzzer_sys::fuzz_target;

// Parsing or validating arbitrary TOML may fail but must never panic.
fuzz_target!(|data: &str| {
    if let Ok(cfg) = jog_config::load_toml(data) {
        if cfg.validate().is_ok() {
            // a validated config must convert cleanly
            let _core: jog_core::ControllerCfg = (&cfg).into();
        }
    }
});
