//! ProcessExecutor port
//! Interface for spawning and signalling OS processes

use crate::domain::value_objects::CommandLine;
use crate::domain::DomainError;
use async_trait::async_trait;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use tokio::io::AsyncRead;

/// Configuration for spawning a process
#[derive(Debug, Clone)]
pub struct SpawnConfig {
    pub command: String,
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
    pub env_vars: Vec<(String, String)>,
}

impl SpawnConfig {
    /// Splits a synthesized command line into executable and arguments
    pub fn from_command_line(command_line: &CommandLine) -> Self {
        Self {
            command: command_line.executable().to_string(),
            args: command_line.args().to_vec(),
            working_dir: None,
            env_vars: Vec::new(),
        }
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_vars.push((key.into(), value.into()));
        self
    }
}

/// Handle for monitoring process exit
/// Resolves with the exit code once the OS reports the process gone
pub type ProcessExitHandle = Pin<Box<dyn Future<Output = Result<i32, DomainError>> + Send>>;

/// Byte stream of a child's stdout or stderr
pub type OutputStream = Pin<Box<dyn AsyncRead + Send>>;

/// Result of spawning a process
pub struct SpawnResult {
    pub pid: u32,
    /// None means the exit cannot be observed
    pub exit_handle: Option<ProcessExitHandle>,
    pub stdout: Option<OutputStream>,
    pub stderr: Option<OutputStream>,
}

impl std::fmt::Debug for SpawnResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpawnResult")
            .field("pid", &self.pid)
            .field("exit_handle", &self.exit_handle.is_some())
            .field("stdout", &self.stdout.is_some())
            .field("stderr", &self.stderr.is_some())
            .finish()
    }
}

/// Port for executing system processes
#[async_trait]
pub trait ProcessExecutor: Send + Sync {
    /// Spawn a new process with piped stdout and stderr
    async fn spawn(&self, config: SpawnConfig) -> Result<SpawnResult, DomainError>;

    /// Send a signal to a running process
    async fn kill(&self, pid: u32, signal: i32) -> Result<(), DomainError>;

    /// Check if a process is still running
    async fn is_running(&self, pid: u32) -> Result<bool, DomainError>;
}
