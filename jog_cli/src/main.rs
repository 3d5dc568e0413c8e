mod cli;
mod error_fmt;
mod rt;
mod session;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::MakeWriterExt;

use crate::cli::{Cli, Commands, FILE_GUARD, JSON_MODE};
use crate::error_fmt::{exit_code_for_error, format_error_json, humanize};
use crate::session::{RunOpts, Session, load_config, stats_json};

fn main() {
    let _ = color_eyre::install();
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    if let Err(err) = real_main(cli) {
        let json = JSON_MODE.get().copied().unwrap_or(false);
        if json {
            eprintln!("{}", format_error_json(&err));
        } else {
            eprintln!("{}", humanize(&err));
        }
        std::process::exit(exit_code_for_error(&err));
    }
}

fn real_main(cli: Cli) -> eyre::Result<()> {
    let cfg = load_config(&cli.config)?;
    init_tracing(&cli, &cfg.logging);
    tracing::debug!(config = %cli.config.display(), "config loaded");

    let session = Session::new(cfg, cli.transcript.clone());
    match cli.cmd {
        Commands::Run {
            stdin,
            keep_alive,
            rt,
            rt_prio,
            stats,
        } => {
            let result = session.run(RunOpts {
                stdin,
                keep_alive,
                rt,
                rt_prio,
                stats,
            })?;
            if cli.json {
                println!("{}", serde_json::json!({ "stats": stats_json(&result) }));
            }
        }
        Commands::Exec {
            lines,
            settle_ticks,
        } => {
            let result = session.exec(&lines, settle_ticks)?;
            if cli.json {
                println!("{}", serde_json::json!({ "stats": stats_json(&result) }));
            }
        }
        Commands::SelfCheck => session.self_check()?,
    }
    Ok(())
}

/// Console logs go to stderr so stdout stays the operator channel.
fn init_tracing(cli: &Cli, logging: &jog_config::Logging) {
    let level = cli
        .log_level
        .as_deref()
        .or(logging.level.as_deref())
        .unwrap_or("info");
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let file_writer = logging.file.as_deref().map(|path| {
        let path = std::path::Path::new(path);
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| std::path::Path::new("."));
        let name = path
            .file_name()
            .map_or_else(|| "jog.log".into(), |n| n.to_string_lossy().into_owned());
        let appender = match logging.rotation.as_deref() {
            Some("daily") => tracing_appender::rolling::daily(dir, name),
            Some("hourly") => tracing_appender::rolling::hourly(dir, name),
            _ => tracing_appender::rolling::never(dir, name),
        };
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let _ = FILE_GUARD.set(guard);
        writer
    });

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);
    let result = match (cli.json, file_writer) {
        (true, Some(file)) => builder
            .json()
            .with_writer(std::io::stderr.and(file))
            .try_init(),
        (true, None) => builder.json().with_writer(std::io::stderr).try_init(),
        (false, Some(file)) => builder
            .with_ansi(false)
            .with_writer(std::io::stderr.and(file))
            .try_init(),
        (false, None) => builder.with_writer(std::io::stderr).try_init(),
    };
    if let Err(e) = result {
        eprintln!("logging already initialized: {e}");
    }
}
