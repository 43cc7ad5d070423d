//! Notiguard CLI entry point.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use notiguard_cli::{run, Command};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Notiguard - time-window notification blocking rules
#[derive(Parser, Debug)]
#[command(name = "notiguard", version, about)]
struct Args {
    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Also write logs to daily rotated files in this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Engine config file (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

/// Initialize logging. Console output goes to stderr so command output
/// on stdout stays machine-readable.
fn init_logging(args: &Args) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let log_level = if args.debug { "debug" } else { &args.log_level };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("notiguard={},warn", log_level)));

    if let Some(log_dir) = &args.log_dir {
        if std::fs::create_dir_all(log_dir).is_ok() {
            let file_appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .max_log_files(5)
                .filename_prefix("notiguard")
                .filename_suffix("log")
                .build(log_dir)
                .ok();

            if let Some(appender) = file_appender {
                let (non_blocking, guard) = tracing_appender::non_blocking(appender);
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt::layer().with_writer(std::io::stderr))
                    .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
                    .init();

                tracing::debug!("Logging to {:?}", log_dir);
                return Some(guard);
            }
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    None
}

fn main() -> Result<()> {
    let args = Args::parse();
    let _log_guard = init_logging(&args);

    let output = run(&args.command, args.config.as_deref())?;
    println!("{output}");

    Ok(())
}
