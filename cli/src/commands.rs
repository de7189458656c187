use crate::formatters::{feature_table, format_state, process_table};
use crate::options::{BinDirArgs, CommandLineTarget, RunArgs};
use anyhow::{Context, Result};
use colored::*;
use embedmongo_engine::domain::config::RoleConfig;
use embedmongo_engine::domain::ports::ExecutableResolver;
use embedmongo_engine::domain::services::{synthesize, PlatformAdapter};
use embedmongo_engine::domain::value_objects::Version;
use embedmongo_engine::infrastructure::{
    load_from_directory, DirectoryResolver, TokioProcessExecutor,
};
use embedmongo_engine::{ManagedProcess, MongoLauncher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Placeholder passed to mongod when no database directory was given
const DBPATH_PLACEHOLDER: &str = "<dbpath>";

fn launcher(bin_dir: Option<PathBuf>) -> Result<MongoLauncher> {
    let resolver = match bin_dir {
        Some(dir) => DirectoryResolver::new(dir)?,
        None => DirectoryResolver::from_env()
            .context("no distribution directory; pass --bin-dir or set EMBEDMONGO_BIN_DIR")?,
    };
    Ok(MongoLauncher::new(
        Arc::new(TokioProcessExecutor::new()),
        Arc::new(resolver),
    ))
}

pub fn handle_features(version: &str) -> Result<()> {
    let version = Version::parse(version)?;
    println!("MongoDB {}", version.to_string().bold());
    print!("{}", feature_table(&version.features())?);
    Ok(())
}

/// Prints the command line; the bare tool name stands in for the
/// executable when no distribution directory is known
pub fn handle_command_line(
    target: CommandLineTarget,
    json: bool,
    bin_dir: Option<PathBuf>,
) -> Result<()> {
    let config: RoleConfig = match target {
        CommandLineTarget::Mongod(args) => args.into_config()?.into(),
        CommandLineTarget::Mongos(args) => args.into_config()?.into(),
    };
    let role = config.role();

    let executable = match bin_dir {
        Some(dir) => DirectoryResolver::new(dir)?.resolve(role, config.version())?,
        None => PathBuf::from(role.executable_name()),
    };
    let data_dir = match &config {
        RoleConfig::Mongod(c) if c.storage.database_dir.is_none() => {
            Some(Path::new(DBPATH_PLACEHOLDER))
        }
        _ => None,
    };

    let command_line = synthesize(&config, &executable, data_dir, &config.version().features())?;
    let command_line = PlatformAdapter::detect().adapt(role, &command_line);

    if json {
        println!("{}", serde_json::to_string_pretty(command_line.tokens())?);
    } else {
        println!("{}", command_line);
    }
    Ok(())
}

pub async fn handle_run(args: RunArgs) -> Result<()> {
    let launcher = launcher(args.bin.bin_dir.clone())?;
    let config = args.into_config()?;

    let process = launcher.start(config).await?;
    print_started(&process);

    wait_for_shutdown().await;
    process.stop().await;
    println!("[OK] Stopped");
    Ok(())
}

pub async fn handle_up(dir: &Path, bin: BinDirArgs) -> Result<()> {
    let definitions = load_from_directory(dir)?;
    if definitions.is_empty() {
        println!("No definitions in {}", dir.display());
        return Ok(());
    }
    let launcher = launcher(bin.bin_dir)?;

    let mut started: Vec<(String, ManagedProcess)> = Vec::new();
    for (name, config) in definitions {
        match launcher.start(config).await {
            Ok(process) => {
                info!(name = %name, port = process.net().port(), "Started");
                started.push((name, process));
            }
            Err(e) => {
                eprintln!("[ERROR] {}: {}", name, e);
                stop_all(&started).await;
                return Err(e).context(format!("failed to start {}", name));
            }
        }
    }

    print!("{}", process_table(&started)?);
    wait_for_shutdown().await;
    stop_all(&started).await;
    println!("[OK] Stopped {} process(es)", started.len());
    Ok(())
}

async fn stop_all(processes: &[(String, ManagedProcess)]) {
    // reverse start order
    for (name, process) in processes.iter().rev() {
        info!(name = %name, "Stopping");
        process.stop().await;
    }
}

fn print_started(process: &ManagedProcess) {
    println!("[OK] {} started", process.role().executable_name());
    println!("  Version:  {}", process.features().version());
    println!("  Port:     {}", process.net().port());
    if let Some(pid) = process.pid().or(process.os_pid()) {
        println!("  PID:      {}", pid);
    }
    if let Some(dir) = process.data_dir() {
        println!("  Data dir: {}", dir.display());
    }
    println!("  State:    {}", format_state(process.state()));
    println!("  Command:  {}", process.command_line());
    println!();
    println!("Press Ctrl-C to stop");
}

async fn wait_for_shutdown() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C; stopping now");
    }
}
