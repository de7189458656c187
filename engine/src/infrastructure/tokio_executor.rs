//! Tokio Process Executor
//! Real implementation of ProcessExecutor port using tokio
//!
//! Children get their own session and, on Linux, die with the launcher.
//! stdout and stderr are piped back to the caller.

use crate::domain::{
    ports::{ProcessExecutor, ProcessExitHandle, SpawnConfig, SpawnResult},
    DomainError,
};
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::{Child, Command};
use tracing::{debug, error, info, warn};

/// Tokio-based process executor
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioProcessExecutor;

impl TokioProcessExecutor {
    pub fn new() -> Self {
        Self
    }

    fn create_exit_handle(mut child: Child, pid: u32) -> ProcessExitHandle {
        let (tx, rx) = tokio::sync::oneshot::channel();

        tokio::spawn(async move {
            let exit_result = match child.wait().await {
                Ok(status) => {
                    let exit_code = exit_code(status);
                    debug!(pid = pid, exit_code = exit_code, "Process exited");
                    Ok(exit_code)
                }
                Err(e) => {
                    error!(pid = pid, error = %e, "Failed to wait for process");
                    Err(DomainError::Io(format!("Failed to wait for process: {}", e)))
                }
            };
            let _ = tx.send(exit_result);
        });

        Box::pin(async move {
            match rx.await {
                Ok(result) => result,
                Err(_) => Err(DomainError::Io(
                    "Process monitor task died unexpectedly".to_string(),
                )),
            }
        })
    }
}

#[cfg(unix)]
fn exit_code(status: std::process::ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    // shell convention for signal deaths
    status
        .code()
        .or_else(|| status.signal().map(|s| 128 + s))
        .unwrap_or(1)
}

#[cfg(not(unix))]
fn exit_code(status: std::process::ExitStatus) -> i32 {
    status.code().unwrap_or(1)
}

#[async_trait]
impl ProcessExecutor for TokioProcessExecutor {
    async fn spawn(&self, config: SpawnConfig) -> Result<SpawnResult, DomainError> {
        info!(
            command = %config.command,
            args = ?config.args,
            "Spawning process"
        );

        if config.command.is_empty() {
            return Err(DomainError::SpawnFailed("Empty command".to_string()));
        }

        let mut cmd = Command::new(&config.command);
        cmd.args(&config.args);

        if let Some(ref dir) = config.working_dir {
            debug!(working_dir = %dir.display(), "Setting working directory");
            cmd.current_dir(dir);
        }

        if !config.env_vars.is_empty() {
            debug!(count = config.env_vars.len(), "Setting environment variables");
            cmd.envs(config.env_vars.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }

        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        #[cfg(unix)]
        configure_unix_spawn(&mut cmd);

        let mut child = cmd.spawn().map_err(|e| {
            error!(
                command = %config.command,
                error = %e,
                "Failed to spawn process"
            );
            DomainError::SpawnFailed(format!("{}: {}", config.command, e))
        })?;

        let pid = child
            .id()
            .ok_or_else(|| DomainError::SpawnFailed("Process exited before reporting a pid".to_string()))?;

        let stdout = child
            .stdout
            .take()
            .map(|s| Box::pin(s) as crate::domain::ports::OutputStream);
        let stderr = child
            .stderr
            .take()
            .map(|s| Box::pin(s) as crate::domain::ports::OutputStream);

        info!(pid = pid, "Process spawned successfully");

        Ok(SpawnResult {
            pid,
            exit_handle: Some(Self::create_exit_handle(child, pid)),
            stdout,
            stderr,
        })
    }

    async fn kill(&self, pid: u32, signal: i32) -> Result<(), DomainError> {
        info!(pid = pid, signal = signal, "Killing process");

        #[cfg(unix)]
        {
            let result = unsafe { libc::kill(pid as i32, signal) };
            if result != 0 {
                let err = std::io::Error::last_os_error();
                warn!(
                    pid = pid,
                    signal = signal,
                    error = %err,
                    "Failed to send signal to process"
                );
                return Err(DomainError::SignalFailed(format!(
                    "Failed to send signal {}: {}",
                    signal, err
                )));
            }
            debug!(pid = pid, signal = signal, "Signal sent successfully");
            Ok(())
        }

        #[cfg(not(unix))]
        {
            let _ = (pid, signal);
            Err(DomainError::SignalFailed(
                "Process signalling not implemented on this platform".to_string(),
            ))
        }
    }

    async fn is_running(&self, pid: u32) -> Result<bool, DomainError> {
        #[cfg(unix)]
        {
            let result = unsafe { libc::kill(pid as i32, 0) };
            Ok(result == 0)
        }

        #[cfg(not(unix))]
        {
            let _ = pid;
            Err(DomainError::SignalFailed(
                "Process status check not implemented on this platform".to_string(),
            ))
        }
    }
}

#[cfg(unix)]
fn configure_unix_spawn(cmd: &mut Command) {
    unsafe {
        cmd.pre_exec(|| {
            // Own session; fails harmlessly if already a session leader
            let _ = libc::setsid();

            #[cfg(target_os = "linux")]
            {
                const PR_SET_PDEATHSIG: libc::c_int = 1;
                if libc::prctl(PR_SET_PDEATHSIG, libc::SIGKILL) != 0 {
                    return Err(std::io::Error::last_os_error());
                }
            }

            Ok(())
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    fn spawn_config(command: &str, args: &[&str]) -> SpawnConfig {
        SpawnConfig {
            command: command.to_string(),
            args: args.iter().map(|s| s.to_string()).collect(),
            working_dir: None,
            env_vars: vec![],
        }
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn test_spawn_captures_stdout_and_exit_code() {
        let executor = TokioProcessExecutor::new();
        let result = executor
            .spawn(spawn_config("/bin/sh", &["-c", "echo hello; exit 3"]))
            .await
            .unwrap();
        assert!(result.pid > 0);

        let mut out = String::new();
        result
            .stdout
            .unwrap()
            .read_to_string(&mut out)
            .await
            .unwrap();
        assert_eq!(out, "hello\n");
        assert_eq!(result.exit_handle.unwrap().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_spawn_invalid_command() {
        let executor = TokioProcessExecutor::new();
        let result = executor
            .spawn(spawn_config("/nonexistent/command", &[]))
            .await;
        assert!(matches!(result, Err(DomainError::SpawnFailed(_))));
    }

    #[tokio::test]
    async fn test_spawn_empty_command() {
        let executor = TokioProcessExecutor::new();
        assert!(executor.spawn(spawn_config("", &[])).await.is_err());
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn test_is_running_and_kill() {
        let executor = TokioProcessExecutor::new();
        let result = executor
            .spawn(spawn_config("/bin/sleep", &["5"]))
            .await
            .unwrap();
        let pid = result.pid;

        assert!(executor.is_running(pid).await.unwrap());

        executor.kill(pid, libc::SIGKILL).await.unwrap();
        let code = result.exit_handle.unwrap().await.unwrap();
        assert_eq!(code, 128 + libc::SIGKILL);
        assert!(!executor.is_running(pid).await.unwrap());
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn test_spawn_with_env_vars() {
        let executor = TokioProcessExecutor::new();
        let mut config = spawn_config("/bin/sh", &["-c", "echo $EMBEDMONGO_TEST_VAR"]);
        config.env_vars = vec![("EMBEDMONGO_TEST_VAR".to_string(), "test_value".to_string())];

        let result = executor.spawn(config).await.unwrap();
        let mut out = String::new();
        result
            .stdout
            .unwrap()
            .read_to_string(&mut out)
            .await
            .unwrap();
        assert_eq!(out.trim(), "test_value");
    }
}
