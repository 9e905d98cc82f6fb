use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod dispatch;
mod download;
mod flows;
mod render;

const LOG_FILTER_ENV: &str = "CONFPULL_LOG";

#[derive(Parser, Debug)]
#[command(name = "confpull")]
#[command(
    about = "Fetch, validate, back up and install configuration files",
    long_about = None
)]
struct Cli {
    /// Directory live paths and the backup directory are relative to.
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,
    /// Config file; defaults to `<root>/confpull.toml` when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Request timeout in seconds. Unbounded unless set here or in the config.
    #[arg(long, global = true, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    timeout: Option<u64>,
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Download a file, validate it, back up the current copy and install it.
    #[command(aliases = ["get-config", "getConfig", "config:get"])]
    Get { url: Option<String> },
    /// Restore a file from its backup slot.
    #[command(aliases = ["revert-config", "revertConfig", "config:revert"])]
    Revert {
        file_name: String,
        app_name: Option<String>,
    },
    /// Show registry entries and their backup slots.
    Status,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match dispatch::run_cli(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_directive = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_FILTER_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_directive));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
