//! Assembling a controller from config and driving it for each subcommand.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use eyre::WrapErr;
use jog_core::error::JogError;
use jog_core::{
    Console, Controller, ControllerBuilder, ControllerCfg, RunStats, RunnerCfg, StdoutConsole,
    TranscriptConsole,
};
use jog_hardware::{SimulatedAnalog, SimulatedPins, SimulatedWatchdog};
use jog_traits::{AnalogChannel, AnalogInput, PinBank, SerialSource, Watchdog};

use crate::rt::setup_rt_once;

/// Options of the `run` subcommand.
#[derive(Debug, Clone, Copy)]
pub struct RunOpts {
    pub stdin: bool,
    pub keep_alive: bool,
    pub rt: bool,
    pub rt_prio: Option<i32>,
    pub stats: bool,
}

pub struct Session {
    cfg: jog_config::Config,
    transcript: Option<PathBuf>,
}

impl Session {
    pub fn new(cfg: jog_config::Config, transcript: Option<PathBuf>) -> Self {
        Self { cfg, transcript }
    }

    fn controller_cfg(&self) -> ControllerCfg {
        (&self.cfg).into()
    }

    fn console(&self) -> Box<dyn Console> {
        match &self.transcript {
            Some(path) => Box::new(TranscriptConsole::new(
                path.display().to_string(),
                StdoutConsole,
            )),
            None => Box::new(StdoutConsole),
        }
    }

    fn assemble<P, A, W>(&self, pins: P, analog: A, watchdog: W) -> eyre::Result<Controller<P, A, W>>
    where
        P: PinBank,
        A: AnalogInput,
        W: Watchdog,
    {
        ControllerBuilder::new()
            .with_pins(pins)
            .with_analog(analog)
            .with_watchdog(watchdog)
            .with_console(self.console())
            .with_config(self.controller_cfg())
            .build()
    }

    fn simulated(
        &self,
    ) -> eyre::Result<Controller<SimulatedPins, SimulatedAnalog, SimulatedWatchdog>> {
        self.assemble(
            SimulatedPins::new(),
            SimulatedAnalog::from_env(),
            SimulatedWatchdog::new(),
        )
    }

    /// `run`: tick until Ctrl-C, or until stdin closes unless `keep_alive`.
    pub fn run(&self, opts: RunOpts) -> eyre::Result<RunStats> {
        setup_rt_once(opts.rt, opts.rt_prio);

        let shutdown = Arc::new(AtomicBool::new(false));
        {
            let flag = shutdown.clone();
            ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed))
                .wrap_err("install Ctrl-C handler")?;
        }

        let mut runner: RunnerCfg = (&self.cfg.runner).into();
        runner.exit_on_eof = !opts.keep_alive;

        #[cfg(feature = "hardware")]
        let stats = {
            let mut controller = hw::controller(self)?;
            if opts.stdin {
                let mut serial = jog_core::ByteFeeder::spawn(std::io::stdin());
                drive(&mut controller, &mut serial, &shutdown, &runner)
            } else {
                let mut serial = hw::uart(&self.cfg)?;
                drive(&mut controller, &mut serial, &shutdown, &runner)
            }
        };
        #[cfg(not(feature = "hardware"))]
        let stats = {
            if opts.stdin {
                tracing::debug!("--stdin is implied without the hardware feature");
            }
            let mut controller = self.simulated()?;
            let mut serial = jog_core::ByteFeeder::spawn(std::io::stdin());
            drive(&mut controller, &mut serial, &shutdown, &runner)
        };

        if opts.stats {
            print_stats(&stats);
        }
        Ok(stats)
    }

    /// `exec`: one tick per line, then `settle_ticks` idle ticks.
    pub fn exec(&self, lines: &[String], settle_ticks: u32) -> eyre::Result<RunStats> {
        #[cfg(feature = "hardware")]
        let mut controller = hw::controller(self)?;
        #[cfg(not(feature = "hardware"))]
        let mut controller = self.simulated()?;

        controller.init();
        let idle = Duration::from_micros(self.cfg.runner.idle_us);
        let mut serial: VecDeque<u8> = VecDeque::new();
        let mut stats = ExecTally::default();
        for line in lines {
            serial.extend(line.as_bytes());
            serial.push_back(b'\n');
            stats.add(controller.tick(&mut serial));
        }
        for _ in 0..settle_ticks {
            controller.clock().sleep(idle);
            stats.add(controller.tick(&mut serial));
        }
        controller.release();
        Ok(stats.0)
    }

    /// `self-check`: open every handle and take one reading per channel.
    pub fn self_check(&self) -> eyre::Result<()> {
        let divider: jog_core::Divider = (&self.cfg.thermistor).into();

        #[cfg(feature = "hardware")]
        let mut analog = hw::analog(&self.cfg)?;
        #[cfg(not(feature = "hardware"))]
        let mut analog = SimulatedAnalog::from_env();

        for (label, channel) in [("Hotend", AnalogChannel::Hotend), ("Bed", AnalogChannel::Bed)] {
            let raw = analog
                .read(channel)
                .map_err(jog_core::hw_error::map_boxed)
                .wrap_err_with(|| format!("{label} ADC read"))?;
            println!("{}", divider.reading(raw).describe(label));
        }

        #[cfg(feature = "hardware")]
        {
            let _pins = hw::pins(&self.cfg)?;
            let _watchdog = hw::watchdog(&self.cfg)?;
        }

        // validates the controller-level limits too
        let _ = self.simulated()?;
        println!("OK");
        Ok(())
    }
}

/// `RunStats` accumulated outside `jog_core::run`.
#[derive(Default)]
struct ExecTally(RunStats);

impl ExecTally {
    fn add(&mut self, report: jog_core::TickReport) {
        self.0.ticks += 1;
        self.0.lines += report.lines as u64;
        if matches!(report.tracking, jog_core::TickOutcome::Corrected { .. }) {
            self.0.corrections += 1;
        }
    }
}

fn drive<P, A, W, S>(
    controller: &mut Controller<P, A, W>,
    serial: &mut S,
    shutdown: &AtomicBool,
    runner: &RunnerCfg,
) -> RunStats
where
    P: PinBank,
    A: AnalogInput,
    W: Watchdog,
    S: SerialSource + ?Sized,
{
    controller.init();
    let stats = jog_core::run(controller, serial, shutdown, runner);
    controller.release();
    stats
}

/// Print loop stats to stderr.
pub fn print_stats(stats: &RunStats) {
    eprintln!("\n--- Jog Stats ---");
    eprintln!("Ticks: {}", stats.ticks);
    eprintln!("Command lines: {}", stats.lines);
    eprintln!("Tracking corrections: {}", stats.corrections);
    eprintln!("Longest tick (us): {}", stats.max_tick_us);
    eprintln!("Overruns: {}", stats.overruns);
    eprintln!("-----------------\n");
}

pub fn stats_json(stats: &RunStats) -> serde_json::Value {
    serde_json::json!({
        "ticks": stats.ticks,
        "lines": stats.lines,
        "corrections": stats.corrections,
        "max_tick_us": stats.max_tick_us,
        "overruns": stats.overruns,
    })
}

/// Read and parse failures stay wrapped reports; validation failures become `JogError::Config`.
pub fn load_config(path: &Path) -> eyre::Result<jog_config::Config> {
    let text = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("read config {}", path.display()))?;
    let cfg = jog_config::load_toml(&text)
        .wrap_err_with(|| format!("parse config {}", path.display()))?;
    cfg.validate()
        .map_err(|e| JogError::Config(format!("{e:#}")))?;
    Ok(cfg)
}

#[cfg(feature = "hardware")]
mod hw {
    use eyre::WrapErr;
    use jog_hardware::mcp3208::{ChannelMap, Mcp3208, SpiSettings};
    use jog_hardware::pi::{GpioPins, UartSerial};
    use jog_hardware::{DevWatchdog, SimulatedWatchdog};
    use jog_traits::Watchdog;

    use super::Session;

    pub fn pins(cfg: &jog_config::Config) -> eyre::Result<GpioPins> {
        let p = &cfg.pins;
        let all = [
            p.enable, p.x.step, p.x.dir, p.y.step, p.y.dir, p.z.step, p.z.dir, p.e.step, p.e.dir,
        ];
        GpioPins::new(&all).wrap_err("open stepper pins")
    }

    pub fn analog(cfg: &jog_config::Config) -> eyre::Result<Mcp3208> {
        let a = &cfg.analog;
        Mcp3208::new(
            SpiSettings {
                bus: a.spi_bus,
                slave_select: a.spi_slave_select,
                clock_hz: a.spi_clock_hz,
            },
            ChannelMap {
                hotend: a.hotend_channel,
                bed: a.bed_channel,
            },
        )
        .wrap_err("open mcp3208")
    }

    pub fn watchdog(cfg: &jog_config::Config) -> eyre::Result<Box<dyn Watchdog>> {
        Ok(match &cfg.watchdog.device {
            Some(path) => Box::new(DevWatchdog::open(path).wrap_err("open watchdog")?),
            None => {
                tracing::warn!("no watchdog device configured; keepalives are not sent");
                Box::new(SimulatedWatchdog::new())
            }
        })
    }

    pub fn uart(cfg: &jog_config::Config) -> eyre::Result<UartSerial> {
        UartSerial::open(&cfg.serial.device, cfg.serial.baud).wrap_err("open uart")
    }

    pub fn controller(
        session: &Session,
    ) -> eyre::Result<jog_core::Controller<GpioPins, Mcp3208, Box<dyn Watchdog>>> {
        session.assemble(pins(&session.cfg)?, analog(&session.cfg)?, watchdog(&session.cfg)?)
    }
}
