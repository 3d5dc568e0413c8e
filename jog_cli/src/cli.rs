//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "jog", version, about = "Manual axis control: jogging, thermistors, ADC tracking")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/jog_config.toml")]
    pub config: PathBuf,

    /// Log as JSON lines instead of pretty
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); overrides [logging].level, default info
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Also append every operator message to this file
    #[arg(long, value_name = "FILE")]
    pub transcript: Option<PathBuf>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the interactive control loop until Ctrl-C or end of input
    Run {
        /// Read commands from stdin even on hardware builds (instead of the UART)
        #[arg(long, action = ArgAction::SetTrue)]
        stdin: bool,
        /// Keep running after the command input closes
        #[arg(long = "keep-alive", action = ArgAction::SetTrue)]
        keep_alive: bool,
        /// Enable real-time mode (SCHED_FIFO, mlockall; needs the `rt` feature)
        #[arg(
            long,
            action = ArgAction::SetTrue,
            long_help = "Enable real-time mode on Linux builds with the `rt` feature.\n\nRaises the process to SCHED_FIFO and locks its pages into RAM with mlockall(MCL_CURRENT|MCL_FUTURE). Step pulse timing is busy-waited, so this mainly reduces preemption jitter. Needs CAP_SYS_NICE and CAP_IPC_LOCK (or root)."
        )]
        rt: bool,
        /// SCHED_FIFO priority for --rt (clamped to the system range)
        #[arg(long, value_name = "PRIO")]
        rt_prio: Option<i32>,
        /// Print tick loop stats on exit
        #[arg(long, action = ArgAction::SetTrue)]
        stats: bool,
    },
    /// Initialize, run each LINE as one operator command, then exit
    Exec {
        /// Command lines, e.g. `x+50` `h` `adc_on`
        #[arg(value_name = "LINE", required = true)]
        lines: Vec<String>,
        /// Extra idle ticks after the last line (lets tracking run)
        #[arg(long, value_name = "N", default_value_t = 0)]
        settle_ticks: u32,
    },
    /// Quick health check: config, hardware handles, one read per channel
    SelfCheck,
}
