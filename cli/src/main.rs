mod commands;
mod formatters;
mod options;

use clap::Parser;
use options::{Cli, Command};
use tracing_subscriber::EnvFilter;

/// Log level variable; wins over RUST_LOG
const LOG_LEVEL_ENV: &str = "EMBEDMONGO_LOG_LEVEL";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let cli = Cli::parse();

    match cli.command {
        Command::Features { version } => commands::handle_features(&version)?,
        Command::CommandLine { target, json, bin } => {
            commands::handle_command_line(target, json, bin.bin_dir)?
        }
        Command::Run(args) => commands::handle_run(args).await?,
        Command::Up { dir, bin } => commands::handle_up(&dir, bin).await?,
    }

    Ok(())
}

/// EMBEDMONGO_LOG_LEVEL > RUST_LOG > info, written to stderr
fn init_logging() {
    let filter = std::env::var(LOG_LEVEL_ENV)
        .ok()
        .and_then(|level| EnvFilter::try_new(level).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
