//! Mongo launcher
//! Composition root: wires the executor and resolver ports into the domain
//! services and hands out one managed process per start.

use crate::domain::config::RoleConfig;
use crate::domain::ports::{ExecutableResolver, ProcessExecutor, SpawnConfig};
use crate::domain::services::{
    synthesize, LogClassifier, OutputMode, PlatformAdapter, ProcessSupervisor, Readiness,
    StopSettings,
};
use crate::domain::value_objects::{CommandLine, FeatureSet, Net, Role, SupervisorState};
use crate::domain::{DomainError, Result};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tracing::{debug, info, warn};

const DATA_DIR_PREFIX: &str = "embedmongo-db-";

/// Tunables shared by every process a launcher starts
#[derive(Debug, Clone)]
pub struct LauncherSettings {
    pub stop: StopSettings,
    pub output: OutputMode,
    pub platform: PlatformAdapter,
}

impl Default for LauncherSettings {
    fn default() -> Self {
        Self {
            stop: StopSettings::default(),
            output: OutputMode::default(),
            platform: PlatformAdapter::detect(),
        }
    }
}

/// Caller-owned engine value; each `start` yields an independent process
pub struct MongoLauncher {
    executor: Arc<dyn ProcessExecutor>,
    resolver: Arc<dyn ExecutableResolver>,
    settings: LauncherSettings,
}

impl MongoLauncher {
    pub fn new(executor: Arc<dyn ProcessExecutor>, resolver: Arc<dyn ExecutableResolver>) -> Self {
        Self::with_settings(executor, resolver, LauncherSettings::default())
    }

    pub fn with_settings(
        executor: Arc<dyn ProcessExecutor>,
        resolver: Arc<dyn ExecutableResolver>,
        settings: LauncherSettings,
    ) -> Self {
        Self {
            executor,
            resolver,
            settings,
        }
    }

    pub fn settings(&self) -> &LauncherSettings {
        &self.settings
    }

    /// Resolves, synthesizes and adapts the command line without spawning
    pub fn command_line(&self, config: &RoleConfig, data_dir: Option<&Path>) -> Result<CommandLine> {
        let role = config.role();
        let features = config.version().features();
        let executable = self.resolver.resolve(role, config.version())?;
        let command_line = synthesize(config, &executable, data_dir, &features)?;
        Ok(self.settings.platform.adapt(role, &command_line))
    }

    /// Starts a process and waits until it is ready
    ///
    /// A mongod without a database directory gets a temporary one that lives
    /// as long as the returned handle. On failure the error carries the
    /// captured output.
    pub async fn start(&self, config: impl Into<RoleConfig>) -> Result<ManagedProcess> {
        let config = config.into();
        let role = config.role();
        let version = config.version();
        let features = version.features();

        let temp_dir = match &config {
            RoleConfig::Mongod(c) if c.storage.database_dir.is_none() => {
                let dir = tempfile::Builder::new()
                    .prefix(DATA_DIR_PREFIX)
                    .tempdir()
                    .map_err(|e| {
                        DomainError::Io(format!("Failed to create database directory: {}", e))
                    })?;
                debug!(path = %dir.path().display(), "Created temporary database directory");
                Some(dir)
            }
            _ => None,
        };

        let command_line =
            self.command_line(&config, temp_dir.as_ref().map(|d| d.path()))?;
        info!(role = %role, version = %version, port = config.net().port(), "Launching");

        let mut supervisor = ProcessSupervisor::new(
            role,
            config.net().clone(),
            Arc::clone(&self.executor),
            self.settings.stop,
        );
        if let Some(pid_file) = config.pid_file() {
            supervisor = supervisor.with_pid_file(pid_file);
        }

        let (stdout, stderr) = self.settings.output.processors(role);
        let readiness = Readiness {
            classifier: LogClassifier::new(role.success_marker(&features), role.failure_markers()),
            timeout: config.startup_timeout(),
            stdout,
            stderr,
        };

        supervisor
            .start(SpawnConfig::from_command_line(&command_line), readiness)
            .await?;

        Ok(ManagedProcess {
            supervisor,
            config,
            features,
            command_line,
            data_dir: Mutex::new(temp_dir),
        })
    }
}

impl std::fmt::Debug for MongoLauncher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MongoLauncher")
            .field("settings", &self.settings)
            .finish()
    }
}

/// Handle to one started process
///
/// Owns the supervisor and any temporary database directory.
#[derive(Debug)]
pub struct ManagedProcess {
    supervisor: ProcessSupervisor,
    config: RoleConfig,
    features: FeatureSet,
    command_line: CommandLine,
    data_dir: Mutex<Option<TempDir>>,
}

impl ManagedProcess {
    /// Stops the process and removes its temporary database directory
    ///
    /// Idempotent. Never fails; problems are logged.
    pub async fn stop(&self) {
        self.supervisor.stop().await;

        let dir = self
            .data_dir
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(dir) = dir {
            let path = dir.path().to_path_buf();
            match dir.close() {
                Ok(()) => debug!(path = %path.display(), "Removed temporary database directory"),
                Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove database directory"),
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.supervisor.is_running()
    }

    /// PID reported by the process log
    pub fn pid(&self) -> Option<u32> {
        self.supervisor.pid()
    }

    pub fn os_pid(&self) -> Option<u32> {
        self.supervisor.os_pid()
    }

    pub fn state(&self) -> SupervisorState {
        self.supervisor.state()
    }

    pub fn role(&self) -> Role {
        self.supervisor.role()
    }

    pub fn config(&self) -> &RoleConfig {
        &self.config
    }

    pub fn net(&self) -> &Net {
        self.config.net()
    }

    pub fn features(&self) -> &FeatureSet {
        &self.features
    }

    pub fn command_line(&self) -> &CommandLine {
        &self.command_line
    }

    /// Temporary database directory, until `stop` removes it
    pub fn data_dir(&self) -> Option<PathBuf> {
        self.data_dir
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .map(|d| d.path().to_path_buf())
    }
}

impl Drop for ManagedProcess {
    fn drop(&mut self) {
        if self.supervisor.is_running() && self.role().is_server() {
            warn!(
                role = %self.role(),
                os_pid = ?self.os_pid(),
                "Managed process dropped without stop"
            );
        }
    }
}
