//! Human-readable error descriptions and structured JSON error formatting.

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    use jog_core::error::{BuildError, JogError};

    // Typed matches first
    if let Some(BuildError::InvalidConfig(msg)) = err.downcast_ref::<BuildError>() {
        return format!(
            "What happened: Invalid configuration ({msg}).\nLikely causes: Out-of-range timing, jog or tracking values in the TOML.\nHow to fix: Edit the config file, then rerun. See etc/jog_config.toml for a sample."
        );
    }

    if let Some(je) = err.downcast_ref::<JogError>() {
        return match je {
            JogError::Hardware(m) | JogError::HardwareFault(m) => format!(
                "What happened: Hardware access failed ({m}).\nLikely causes: Wrong pin or SPI settings, missing permissions on /dev/gpiomem or /dev/spidev*, or the board is not wired.\nHow to fix: Check [pins] and [analog] in the config and run as a user in the gpio/spi groups."
            ),
            JogError::Config(m) => format!(
                "What happened: Invalid configuration ({m}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun."
            ),
            other => format!(
                "What happened: {other}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    // String-based heuristics for errors coming from init or config
    let msg = format!("{err:#}");
    let lower = msg.to_ascii_lowercase();

    if lower.contains("read config") {
        return format!(
            "What happened: The config file could not be read.\nLikely causes: Wrong --config path or missing permissions.\nHow to fix: Pass --config <FILE> pointing at a readable TOML file. Original: {msg}"
        );
    }

    if lower.contains("invalid configuration") || lower.contains("parse config") {
        return format!(
            "What happened: Configuration is invalid or incomplete.\nLikely causes: A TOML syntax error, an unknown value, or an out-of-range setting.\nHow to fix: Edit the TOML config and try again. Original: {msg}"
        );
    }

    if lower.contains("open stepper pins") || lower.contains("open mcp3208") || lower.contains("open uart") {
        return format!(
            "What happened: Failed to initialize hardware.\nLikely causes: Incorrect pin/bus numbers or insufficient device permissions.\nHow to fix: Fix [pins], [analog] or [serial] in the config; ensure the process can access GPIO, SPI and the UART. Original: {msg}"
        );
    }

    if lower.contains("watchdog") {
        return format!(
            "What happened: The watchdog device could not be opened.\nLikely causes: The kernel watchdog driver is not loaded or another process holds it.\nHow to fix: Load the driver, stop the other holder, or remove [watchdog].device. Original: {msg}"
        );
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes: 2 config, 3 hardware, 1 anything else.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    use jog_core::error::{BuildError, JogError};
    if err.downcast_ref::<BuildError>().is_some() {
        return 2;
    }
    if err.downcast_ref::<jog_hardware::error::HwError>().is_some() {
        return 3;
    }
    match err.downcast_ref::<JogError>() {
        Some(JogError::Config(_)) => 2,
        Some(JogError::Hardware(_) | JogError::HardwareFault(_)) => 3,
        Some(_) => 1,
        None => {
            let lower = format!("{err:#}").to_ascii_lowercase();
            if lower.contains("invalid configuration")
                || lower.contains("read config")
                || lower.contains("parse config")
            {
                2
            } else {
                1
            }
        }
    }
}

fn reason_name(err: &eyre::Report) -> &'static str {
    use jog_core::error::{BuildError, JogError};
    if err.downcast_ref::<BuildError>().is_some() {
        return "InvalidConfig";
    }
    if err.downcast_ref::<jog_hardware::error::HwError>().is_some() {
        return "Hardware";
    }
    match err.downcast_ref::<JogError>() {
        Some(JogError::Hardware(_)) => "Hardware",
        Some(JogError::HardwareFault(_)) => "HardwareFault",
        Some(JogError::Config(_)) => "Config",
        Some(JogError::Io(_)) => "Io",
        None if exit_code_for_error(err) == 2 => "Config",
        None => "Error",
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    serde_json::json!({
        "reason": reason_name(err),
        "exit_code": exit_code_for_error(err),
        "message": humanize(err),
    })
    .to_string()
}
