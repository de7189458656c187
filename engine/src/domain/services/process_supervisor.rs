//! Process supervisor
//!
//! Owns one spawned process. `start` blocks until the log watcher resolves
//! readiness; `stop` runs the shutdown escalation exactly once no matter how
//! many callers ask for it.

use crate::constants::shutdown::{
    DEFAULT_GRACEFUL_WAIT_MS, DEFAULT_KILL_WAIT_MS, DEFAULT_TERMINATE_GRACE_MS,
};
use crate::constants::signals::{SIGKILL, SIGTERM};
use crate::domain::constants::{PID_PATTERNS, SUCCESS_EXIT_CODE};
use crate::domain::ports::{ProcessExecutor, SpawnConfig};
use crate::domain::services::log_watch::{drain, LogClassifier, LogWatch, LogWatchResult};
use crate::domain::services::output::OutputProcessor;
use crate::domain::services::shutdown_protocol::ShutdownClient;
use crate::domain::value_objects::{InstanceId, Net, Role, SupervisorState};
use crate::domain::{DomainError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

static PID_REGEXES: Lazy<Vec<Regex>> = Lazy::new(|| {
    PID_PATTERNS
        .iter()
        .filter_map(|pattern| Regex::new(pattern).ok())
        .collect()
});

/// How long a closed output stream may precede the exit status
const EXIT_SETTLE: Duration = Duration::from_secs(1);
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// First PID reported in captured startup output
pub fn extract_pid(output: &str) -> Option<u32> {
    PID_REGEXES.iter().find_map(|re| {
        re.captures(output)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok())
    })
}

/// Waits used by the stop escalation
#[derive(Debug, Clone, Copy)]
pub struct StopSettings {
    /// After an accepted protocol shutdown
    pub graceful_wait: Duration,
    /// After SIGTERM
    pub terminate_grace: Duration,
    /// After SIGKILL
    pub kill_wait: Duration,
    pub shutdown_client: ShutdownClient,
}

impl Default for StopSettings {
    fn default() -> Self {
        Self {
            graceful_wait: Duration::from_millis(DEFAULT_GRACEFUL_WAIT_MS),
            terminate_grace: Duration::from_millis(DEFAULT_TERMINATE_GRACE_MS),
            kill_wait: Duration::from_millis(DEFAULT_KILL_WAIT_MS),
            shutdown_client: ShutdownClient::default(),
        }
    }
}

/// What the supervisor watches for while the process starts
pub struct Readiness {
    pub classifier: LogClassifier,
    pub timeout: Duration,
    pub stdout: Arc<dyn OutputProcessor>,
    pub stderr: Arc<dyn OutputProcessor>,
}

/// OS handle of the spawned process
#[derive(Debug, Clone)]
struct Spawned {
    os_pid: u32,
    /// Exit code once the process is gone; None when exit cannot be observed
    exit: Option<watch::Receiver<Option<i32>>>,
}

pub struct ProcessSupervisor {
    id: InstanceId,
    role: Role,
    net: Net,
    executor: Arc<dyn ProcessExecutor>,
    settings: StopSettings,
    pid_file: Option<PathBuf>,
    state: Mutex<SupervisorState>,
    spawned: Mutex<Option<Spawned>>,
    stop_guard: tokio::sync::Mutex<()>,
}

impl ProcessSupervisor {
    pub fn new(
        role: Role,
        net: Net,
        executor: Arc<dyn ProcessExecutor>,
        settings: StopSettings,
    ) -> Self {
        Self {
            id: InstanceId::generate(),
            role,
            net,
            executor,
            settings,
            pid_file: None,
            state: Mutex::new(SupervisorState::Starting),
            spawned: Mutex::new(None),
            stop_guard: tokio::sync::Mutex::new(()),
        }
    }

    /// Write the PID here once it is known, remove it on stop
    pub fn with_pid_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.pid_file = Some(path.into());
        self
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn state(&self) -> SupervisorState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// PID reported by the process in its log, if any
    pub fn pid(&self) -> Option<u32> {
        match self.state() {
            SupervisorState::Running { pid } => pid,
            _ => None,
        }
    }

    /// PID of the spawned OS process
    pub fn os_pid(&self) -> Option<u32> {
        self.spawned().map(|s| s.os_pid)
    }

    /// Running state and no exit observed
    pub fn is_running(&self) -> bool {
        self.state().is_running() && self.exit_code().is_none()
    }

    /// Exit code, once the OS reported the process gone
    pub fn exit_code(&self) -> Option<i32> {
        let rx = self.spawned()?.exit?;
        let code = *rx.borrow();
        code
    }

    fn spawned(&self) -> Option<Spawned> {
        self.spawned
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn transition(&self, target: SupervisorState) -> Result<()> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if !state.can_transition_to(target) {
            return Err(DomainError::InvalidStateTransition {
                from: state.to_string(),
                to: target.to_string(),
            });
        }
        debug!(
            instance = %self.id.short(),
            role = %self.role,
            from = %*state,
            to = %target,
            "State transition"
        );
        *state = target;
        Ok(())
    }

    /// Spawns the process and blocks until it is ready, failed or timed out
    pub async fn start(&self, config: SpawnConfig, readiness: Readiness) -> Result<()> {
        let state = self.state();
        if state != SupervisorState::Starting {
            return Err(DomainError::InvalidStateTransition {
                from: state.to_string(),
                to: "starting".to_string(),
            });
        }

        info!(
            instance = %self.id.short(),
            role = %self.role,
            command = %config.command,
            "Starting process"
        );

        let spawn_result = match self.executor.spawn(config).await {
            Ok(result) => result,
            Err(e) => {
                error!(role = %self.role, error = %e, "Failed to spawn process");
                self.transition(SupervisorState::StartFailed)?;
                return Err(e);
            }
        };
        let os_pid = spawn_result.pid;

        let exit = spawn_result.exit_handle.map(|handle| {
            let (tx, rx) = watch::channel(None);
            tokio::spawn(async move {
                let code = match handle.await {
                    Ok(code) => code,
                    Err(e) => {
                        warn!(pid = os_pid, error = %e, "Lost track of process exit");
                        -1
                    }
                };
                let _ = tx.send(Some(code));
            });
            rx
        });
        *self.spawned.lock().unwrap_or_else(|e| e.into_inner()) = Some(Spawned { os_pid, exit });

        if let Some(stderr) = spawn_result.stderr {
            drain(stderr, readiness.stderr);
        }
        let outcome = match spawn_result.stdout {
            Some(stdout) => {
                LogWatch::spawn(stdout, readiness.classifier, readiness.stdout)
                    .wait(readiness.timeout)
                    .await
            }
            None => readiness.classifier.close(),
        };

        match outcome {
            LogWatchResult::Success(output) => {
                self.mark_running(extract_pid(&output), os_pid)?;
                Ok(())
            }
            LogWatchResult::Failure { marker, output } => {
                self.fail_start(format!("found failure marker '{}'", marker), output)
                    .await
            }
            LogWatchResult::StreamClosed(output) => {
                if self.await_exit(EXIT_SETTLE).await
                    && self.exit_code() == Some(SUCCESS_EXIT_CODE)
                {
                    info!(role = %self.role, "Process completed without a readiness marker");
                    self.mark_running(extract_pid(&output), os_pid)?;
                    return Ok(());
                }
                self.fail_start(
                    format!(
                        "output ended before '{}' appeared",
                        readiness_hint(&self.role)
                    ),
                    output,
                )
                .await
            }
            LogWatchResult::TimedOut(output) => {
                if self.exit_code() == Some(SUCCESS_EXIT_CODE) {
                    info!(role = %self.role, "Process completed without a readiness marker");
                    self.mark_running(extract_pid(&output), os_pid)?;
                    return Ok(());
                }
                self.fail_start(
                    format!("no readiness marker within {:?}", readiness.timeout),
                    output,
                )
                .await
            }
        }
    }

    fn mark_running(&self, pid: Option<u32>, os_pid: u32) -> Result<()> {
        self.transition(SupervisorState::Running { pid })?;
        info!(
            instance = %self.id.short(),
            role = %self.role,
            pid = ?pid,
            os_pid = os_pid,
            "Process is ready"
        );
        if let Some(path) = &self.pid_file {
            let pid = pid.unwrap_or(os_pid);
            match std::fs::write(path, pid.to_string()) {
                Ok(()) => debug!(pidfile = %path.display(), pid = pid, "Wrote PID file"),
                Err(e) => warn!(pidfile = %path.display(), error = %e, "Failed to write PID file"),
            }
        }
        Ok(())
    }

    async fn fail_start(&self, reason: String, output: String) -> Result<()> {
        warn!(role = %self.role, reason = %reason, "Process failed to start");

        if let Some(spawned) = self.spawned() {
            let alive = self.exit_code().is_none()
                && self
                    .executor
                    .is_running(spawned.os_pid)
                    .await
                    .unwrap_or(false);
            if alive {
                debug!(pid = spawned.os_pid, "Killing process left over from failed start");
                match self.executor.kill(spawned.os_pid, SIGKILL).await {
                    Ok(()) => {
                        self.await_exit(self.settings.kill_wait).await;
                    }
                    Err(e) => warn!(pid = spawned.os_pid, error = %e, "Failed to kill process"),
                }
            }
        }

        self.transition(SupervisorState::StartFailed)?;
        Err(DomainError::StartFailure {
            role: self.role,
            reason,
            output,
        })
    }

    /// Waits up to `timeout` for the process to be gone
    async fn await_exit(&self, timeout: Duration) -> bool {
        let Some(spawned) = self.spawned() else {
            return true;
        };
        match spawned.exit {
            Some(mut rx) => matches!(
                tokio::time::timeout(timeout, rx.wait_for(Option::is_some)).await,
                Ok(Ok(_))
            ),
            None => {
                let deadline = tokio::time::Instant::now() + timeout;
                loop {
                    if !self
                        .executor
                        .is_running(spawned.os_pid)
                        .await
                        .unwrap_or(true)
                    {
                        return true;
                    }
                    if tokio::time::Instant::now() >= deadline {
                        return false;
                    }
                    tokio::time::sleep(POLL_INTERVAL).await;
                }
            }
        }
    }

    /// Stops the process
    ///
    /// Server roles escalate: protocol shutdown (loopback only), SIGTERM,
    /// then SIGKILL, until the exit is confirmed. Utility roles only release
    /// their resources. Repeated or concurrent calls run the sequence once.
    /// Failures are logged, never returned.
    pub async fn stop(&self) {
        let _guard = self.stop_guard.lock().await;

        let state = self.state();
        if !state.is_running() {
            debug!(instance = %self.id.short(), state = %state, "Nothing to stop");
            return;
        }

        if self.role.is_server() {
            self.escalate().await;
        } else if let Err(e) = self.transition(SupervisorState::Stopped) {
            warn!(error = %e, "Unexpected state while stopping");
        }

        if let Some(path) = &self.pid_file {
            if let Err(e) = std::fs::remove_file(path) {
                debug!(pidfile = %path.display(), error = %e, "Could not remove PID file");
            }
        }
        info!(instance = %self.id.short(), role = %self.role, "Process stopped");
    }

    async fn escalate(&self) {
        let Some(spawned) = self.spawned() else {
            return;
        };
        let pid = spawned.os_pid;

        if let Err(e) = self.transition(SupervisorState::StoppingGraceful) {
            warn!(error = %e, "Unexpected state while stopping");
        }
        let mut gone = self.exit_code().is_some();

        if !gone {
            match self.net.server_address().filter(|a| a.is_loopback()) {
                Some(address) => {
                    info!(pid = pid, port = self.net.port(), "Sending shutdown command");
                    if self
                        .settings
                        .shutdown_client
                        .send_shutdown(address, self.net.port())
                        .await
                    {
                        gone = self.await_exit(self.settings.graceful_wait).await;
                    }
                }
                None => {
                    info!(
                        pid = pid,
                        bind_ip = ?self.net.bind_ip(),
                        "Not a loopback address, skipping protocol shutdown"
                    );
                }
            }
        }

        if let Err(e) = self.transition(SupervisorState::StoppingForced) {
            warn!(error = %e, "Unexpected state while stopping");
        }

        if !gone {
            gone = self
                .signal_and_wait(pid, SIGTERM, self.settings.terminate_grace)
                .await;
        }
        if !gone {
            warn!(pid = pid, "Process ignored graceful shutdown and SIGTERM, killing");
            gone = self
                .signal_and_wait(pid, SIGKILL, self.settings.kill_wait)
                .await;
        }
        if !gone {
            warn!(pid = pid, "Could not confirm process termination");
        }

        if let Err(e) = self.transition(SupervisorState::Stopped) {
            warn!(error = %e, "Unexpected state while stopping");
        }
    }

    async fn signal_and_wait(&self, pid: u32, signal: i32, wait: Duration) -> bool {
        debug!(pid = pid, signal = signal, "Signalling process");
        if let Err(e) = self.executor.kill(pid, signal).await {
            warn!(pid = pid, signal = signal, error = %e, "Failed to signal process");
            // already gone is as good as a confirmed exit
            return self.exit_code().is_some()
                || !self.executor.is_running(pid).await.unwrap_or(true);
        }
        self.await_exit(wait).await
    }
}

fn readiness_hint(role: &Role) -> &'static str {
    if role.is_server() {
        "waiting for connections"
    } else {
        "completion"
    }
}

impl std::fmt::Debug for ProcessSupervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessSupervisor")
            .field("id", &self.id)
            .field("role", &self.role)
            .field("state", &self.state())
            .field("os_pid", &self.os_pid())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{OutputStream, ProcessExitHandle, SpawnResult};
    use crate::domain::services::output::{CollectingProcessor, NullProcessor};
    use crate::domain::services::shutdown_protocol::SHUTDOWN_COMMAND;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    const READY: &str = "waiting for connections on port";

    /// Fake process: prints `stdout` and exits when signalled
    struct MockExecutor {
        stdout: &'static str,
        exit_on_spawn: Option<i32>,
        exit_on: Vec<i32>,
        kill_count: AtomicUsize,
        signals: Mutex<Vec<i32>>,
        exited: AtomicBool,
        exit_tx: Mutex<Option<oneshot::Sender<i32>>>,
        hang: bool,
        stdout_writer: Mutex<Option<DuplexStream>>,
    }

    impl MockExecutor {
        fn new(stdout: &'static str) -> Self {
            Self {
                stdout,
                exit_on_spawn: None,
                exit_on: vec![SIGTERM, SIGKILL],
                kill_count: AtomicUsize::new(0),
                signals: Mutex::new(Vec::new()),
                exited: AtomicBool::new(false),
                exit_tx: Mutex::new(None),
                hang: false,
                stdout_writer: Mutex::new(None),
            }
        }

        /// Keeps stdout open after printing
        fn hanging(mut self) -> Self {
            self.hang = true;
            self
        }

        fn exiting_with(mut self, code: i32) -> Self {
            self.exit_on_spawn = Some(code);
            self
        }

        fn ignoring(mut self, signal: i32) -> Self {
            self.exit_on.retain(|s| *s != signal);
            self
        }

        fn kills(&self) -> usize {
            self.kill_count.load(Ordering::SeqCst)
        }

        fn exit(&self, code: i32) {
            self.exited.store(true, Ordering::SeqCst);
            if let Some(tx) = self.exit_tx.lock().unwrap().take() {
                let _ = tx.send(code);
            }
        }
    }

    #[async_trait]
    impl ProcessExecutor for MockExecutor {
        async fn spawn(&self, _config: SpawnConfig) -> Result<SpawnResult> {
            let (tx, rx) = oneshot::channel();
            *self.exit_tx.lock().unwrap() = Some(tx);
            let exit_handle: ProcessExitHandle = Box::pin(async move {
                rx.await
                    .map_err(|_| DomainError::Io("mock dropped".to_string()))
            });
            if let Some(code) = self.exit_on_spawn {
                self.exit(code);
            }
            let stdout: OutputStream = if self.hang {
                let (mut writer, reader) = tokio::io::duplex(4096);
                writer.write_all(self.stdout.as_bytes()).await?;
                *self.stdout_writer.lock().unwrap() = Some(writer);
                Box::pin(reader)
            } else {
                Box::pin(std::io::Cursor::new(self.stdout.as_bytes()))
            };
            Ok(SpawnResult {
                pid: 4242,
                exit_handle: Some(exit_handle),
                stdout: Some(stdout),
                stderr: Some(Box::pin(std::io::Cursor::new(&b"stderr line\n"[..]))),
            })
        }

        async fn kill(&self, _pid: u32, signal: i32) -> Result<()> {
            self.kill_count.fetch_add(1, Ordering::SeqCst);
            self.signals.lock().unwrap().push(signal);
            if self.exit_on.contains(&signal) {
                self.exit(128 + signal);
            }
            Ok(())
        }

        async fn is_running(&self, _pid: u32) -> Result<bool> {
            Ok(!self.exited.load(Ordering::SeqCst))
        }
    }

    fn fast_settings() -> StopSettings {
        StopSettings {
            graceful_wait: Duration::from_millis(200),
            terminate_grace: Duration::from_millis(200),
            kill_wait: Duration::from_millis(200),
            shutdown_client: ShutdownClient::new(
                Duration::from_millis(200),
                Duration::from_millis(200),
                Duration::from_millis(10),
            ),
        }
    }

    fn readiness(marker: &str) -> Readiness {
        Readiness {
            classifier: LogClassifier::new(marker, vec!["ERROR:".to_string()]),
            timeout: Duration::from_secs(2),
            stdout: Arc::new(NullProcessor),
            stderr: Arc::new(NullProcessor),
        }
    }

    fn spawn_config() -> SpawnConfig {
        SpawnConfig {
            command: "/bin/mongod".to_string(),
            args: vec![],
            working_dir: None,
            env_vars: vec![],
        }
    }

    fn remote_net() -> Net {
        Net::new(Some("10.20.30.40".to_string()), 27017, false).unwrap()
    }

    fn supervisor(role: Role, net: Net, executor: Arc<MockExecutor>) -> ProcessSupervisor {
        ProcessSupervisor::new(role, net, executor, fast_settings())
    }

    #[test]
    fn test_extract_pid() {
        assert_eq!(
            extract_pid("Mon Jan 1 [initandlisten] MongoDB starting : pid=4821 port=27017 dbpath=/tmp"),
            Some(4821)
        );
        assert_eq!(
            extract_pid(r#"{"msg":"MongoDB starting","attr":{"pid":977,"port":27017}}"#),
            Some(977)
        );
        assert_eq!(extract_pid("no pid here"), None);
    }

    #[tokio::test]
    async fn test_start_records_pid() {
        let executor = Arc::new(MockExecutor::new(
            "MongoDB starting : pid=4821 port=27017\nwaiting for connections on port 27017\n",
        ));
        let sup = supervisor(Role::Server, remote_net(), executor.clone());

        sup.start(spawn_config(), readiness(READY)).await.unwrap();

        assert_eq!(sup.state(), SupervisorState::Running { pid: Some(4821) });
        assert_eq!(sup.pid(), Some(4821));
        assert_eq!(sup.os_pid(), Some(4242));
        assert!(sup.is_running());
    }

    #[tokio::test]
    async fn test_start_without_pid_line() {
        let executor = Arc::new(MockExecutor::new("waiting for connections on port 27017\n"));
        let sup = supervisor(Role::Server, remote_net(), executor);

        sup.start(spawn_config(), readiness(READY)).await.unwrap();
        assert_eq!(sup.state(), SupervisorState::Running { pid: None });
    }

    #[tokio::test]
    async fn test_failure_marker_fails_start_and_kills() {
        let executor = Arc::new(MockExecutor::new(
            "starting\nERROR: dbpath (/nope) does not exist\n",
        ));
        let sup = supervisor(Role::Server, remote_net(), executor.clone());

        let err = sup.start(spawn_config(), readiness(READY)).await.unwrap_err();

        assert!(matches!(err, DomainError::StartFailure { role: Role::Server, .. }));
        assert!(err.captured_output().unwrap().contains("dbpath (/nope)"));
        assert_eq!(sup.state(), SupervisorState::StartFailed);
        assert_eq!(executor.kills(), 1);
        assert!(!sup.is_running());
    }

    #[tokio::test]
    async fn test_stream_closed_with_exit_zero_is_success() {
        let executor = Arc::new(MockExecutor::new("2 documents\n").exiting_with(0));
        let sup = supervisor(Role::Import, Net::on_port(27017).unwrap(), executor.clone());

        sup.start(spawn_config(), readiness("imported")).await.unwrap();
        assert!(sup.state().is_running());
        assert_eq!(sup.exit_code(), Some(0));

        sup.stop().await;
        assert_eq!(sup.state(), SupervisorState::Stopped);
        assert_eq!(executor.kills(), 0);
    }

    #[tokio::test]
    async fn test_stream_closed_with_failed_exit() {
        let executor = Arc::new(MockExecutor::new("usage: mongod\n").exiting_with(2));
        let sup = supervisor(Role::Server, remote_net(), executor.clone());

        let err = sup.start(spawn_config(), readiness(READY)).await.unwrap_err();
        assert_eq!(err.captured_output(), Some("usage: mongod\n"));
        assert_eq!(executor.kills(), 0);
    }

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let executor = Arc::new(MockExecutor::new("waiting for connections on port 27017\n"));
        let sup = supervisor(Role::Server, remote_net(), executor.clone());
        sup.start(spawn_config(), readiness(READY)).await.unwrap();

        sup.stop().await;
        assert_eq!(sup.state(), SupervisorState::Stopped);
        sup.stop().await;

        assert_eq!(executor.kills(), 1);
        assert!(!sup.is_running());
    }

    #[tokio::test]
    async fn test_concurrent_stop_runs_once() {
        let executor = Arc::new(MockExecutor::new("waiting for connections on port 27017\n"));
        let sup = Arc::new(supervisor(Role::Server, remote_net(), executor.clone()));
        sup.start(spawn_config(), readiness(READY)).await.unwrap();

        let a = tokio::spawn({
            let sup = sup.clone();
            async move { sup.stop().await }
        });
        let b = tokio::spawn({
            let sup = sup.clone();
            async move { sup.stop().await }
        });
        a.await.unwrap();
        b.await.unwrap();

        assert_eq!(executor.kills(), 1);
        assert_eq!(sup.state(), SupervisorState::Stopped);
    }

    #[tokio::test]
    async fn test_non_loopback_starts_with_sigterm() {
        let executor = Arc::new(MockExecutor::new("waiting for connections on port 27017\n"));
        let sup = supervisor(Role::Server, remote_net(), executor.clone());
        sup.start(spawn_config(), readiness(READY)).await.unwrap();

        sup.stop().await;
        assert_eq!(*executor.signals.lock().unwrap(), vec![SIGTERM]);
    }

    #[tokio::test]
    async fn test_escalates_to_sigkill() {
        let executor = Arc::new(
            MockExecutor::new("waiting for connections on port 27017\n").ignoring(SIGTERM),
        );
        let sup = supervisor(Role::Server, remote_net(), executor.clone());
        sup.start(spawn_config(), readiness(READY)).await.unwrap();

        sup.stop().await;
        assert_eq!(*executor.signals.lock().unwrap(), vec![SIGTERM, SIGKILL]);
        assert_eq!(sup.state(), SupervisorState::Stopped);
    }

    #[tokio::test]
    async fn test_unconfirmed_kill_still_stops() {
        let executor = Arc::new(
            MockExecutor::new("waiting for connections on port 27017\n")
                .ignoring(SIGTERM)
                .ignoring(SIGKILL),
        );
        let sup = supervisor(Role::Server, remote_net(), executor.clone());
        sup.start(spawn_config(), readiness(READY)).await.unwrap();

        sup.stop().await;
        assert_eq!(sup.state(), SupervisorState::Stopped);
        assert_eq!(executor.kills(), 2);
    }

    #[tokio::test]
    async fn test_loopback_without_listener_falls_through() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let executor = Arc::new(MockExecutor::new("waiting for connections on port\n"));
        let sup = supervisor(Role::Server, Net::on_port(port).unwrap(), executor.clone());
        sup.start(spawn_config(), readiness(READY)).await.unwrap();

        sup.stop().await;
        assert_eq!(*executor.signals.lock().unwrap(), vec![SIGTERM]);
    }

    #[tokio::test]
    async fn test_accepted_shutdown_sends_no_signal() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let executor = Arc::new(MockExecutor::new("waiting for connections on port\n"));

        let server = tokio::spawn({
            let executor = executor.clone();
            async move {
                let (mut socket, _) = listener.accept().await.unwrap();
                let mut buf = vec![0u8; SHUTDOWN_COMMAND.len()];
                socket.read_exact(&mut buf).await.unwrap();
                assert_eq!(buf, SHUTDOWN_COMMAND);
                executor.exit(0);
            }
        });

        let sup = supervisor(Role::Server, Net::on_port(port).unwrap(), executor.clone());
        sup.start(spawn_config(), readiness(READY)).await.unwrap();

        sup.stop().await;
        server.await.unwrap();
        assert!(executor.signals.lock().unwrap().is_empty());
        assert_eq!(sup.state(), SupervisorState::Stopped);
    }

    #[tokio::test]
    async fn test_rejected_shutdown_falls_back_to_sigterm() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; SHUTDOWN_COMMAND.len()];
            socket.read_exact(&mut buf).await.unwrap();
            socket.write_all(b"unauthorized").await.unwrap();
            // hold the connection until the client has read the reply
            let _ = socket.read(&mut buf).await;
        });

        let executor = Arc::new(MockExecutor::new("waiting for connections on port\n"));
        let sup = supervisor(Role::Server, Net::on_port(port).unwrap(), executor.clone());
        sup.start(spawn_config(), readiness(READY)).await.unwrap();

        sup.stop().await;
        assert_eq!(*executor.signals.lock().unwrap(), vec![SIGTERM]);
        assert_eq!(sup.state(), SupervisorState::Stopped);
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_timeout_keeps_captured_output() {
        let executor = Arc::new(
            MockExecutor::new("booting\nopening db at /nope\n").hanging(),
        );
        let sup = supervisor(Role::Server, remote_net(), executor.clone());
        let mut r = readiness(READY);
        r.timeout = Duration::from_millis(200);

        let err = sup.start(spawn_config(), r).await.unwrap_err();

        assert!(matches!(err, DomainError::StartFailure { .. }));
        assert_eq!(
            err.captured_output(),
            Some("booting\nopening db at /nope\n")
        );
        assert_eq!(sup.state(), SupervisorState::StartFailed);
        assert_eq!(executor.kills(), 1);
    }

    #[tokio::test]
    async fn test_stdout_is_forwarded() {
        let executor = Arc::new(MockExecutor::new("one\nwaiting for connections on port 1\n"));
        let sup = supervisor(Role::Server, remote_net(), executor);
        let stdout = Arc::new(CollectingProcessor::new());
        let stderr = Arc::new(CollectingProcessor::new());

        let mut r = readiness(READY);
        r.stdout = stdout.clone();
        r.stderr = stderr.clone();
        sup.start(spawn_config(), r).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(stdout.lines().len(), 2);
        assert_eq!(stderr.lines(), vec!["stderr line"]);
    }

    #[tokio::test]
    async fn test_pid_file_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let pid_file = dir.path().join("mongod.pid");
        let executor = Arc::new(MockExecutor::new(
            "MongoDB starting : pid=99 port=1\nwaiting for connections on port 1\n",
        ));
        let sup = supervisor(Role::Server, remote_net(), executor).with_pid_file(&pid_file);

        sup.start(spawn_config(), readiness(READY)).await.unwrap();
        assert_eq!(std::fs::read_to_string(&pid_file).unwrap(), "99");

        sup.stop().await;
        assert!(!pid_file.exists());
    }

    #[tokio::test]
    async fn test_start_twice_is_rejected() {
        let executor = Arc::new(MockExecutor::new("waiting for connections on port 1\n"));
        let sup = supervisor(Role::Server, remote_net(), executor);
        sup.start(spawn_config(), readiness(READY)).await.unwrap();

        let again = sup.start(spawn_config(), readiness(READY)).await;
        assert!(matches!(again, Err(DomainError::InvalidStateTransition { .. })));
    }
}
