//! Output processors
//! Sinks for the lines a child process writes to stdout and stderr

use crate::domain::value_objects::Role;
use std::fmt;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// Receives every line of one output stream, in order
pub trait OutputProcessor: Send + Sync {
    fn process(&self, line: &str);
}

/// Which stream a processor is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStreamKind {
    Stdout,
    Stderr,
}

/// Forwards lines to tracing under the `embedmongo::output` target
///
/// stdout is chatty and goes to debug, stderr goes to info.
#[derive(Debug, Clone)]
pub struct LoggingProcessor {
    role: Role,
    kind: OutputStreamKind,
}

impl LoggingProcessor {
    pub fn new(role: Role, kind: OutputStreamKind) -> Self {
        Self { role, kind }
    }
}

impl OutputProcessor for LoggingProcessor {
    fn process(&self, line: &str) {
        match self.kind {
            OutputStreamKind::Stdout => {
                debug!(target: "embedmongo::output", role = %self.role, "{}", line)
            }
            OutputStreamKind::Stderr => {
                info!(target: "embedmongo::output", role = %self.role, stream = "stderr", "{}", line)
            }
        }
    }
}

/// Discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullProcessor;

impl OutputProcessor for NullProcessor {
    fn process(&self, _line: &str) {}
}

/// Keeps every line in memory
#[derive(Debug, Default)]
pub struct CollectingProcessor {
    lines: Mutex<Vec<String>>,
}

impl CollectingProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }
}

impl OutputProcessor for CollectingProcessor {
    fn process(&self, line: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(line.to_string());
        }
    }
}

/// How a launcher wires child output
#[derive(Clone, Default)]
pub enum OutputMode {
    /// Forward both streams to tracing
    #[default]
    Log,
    Silent,
    Custom {
        stdout: Arc<dyn OutputProcessor>,
        stderr: Arc<dyn OutputProcessor>,
    },
}

impl OutputMode {
    /// Processors for stdout and stderr of a process with `role`
    pub fn processors(&self, role: Role) -> (Arc<dyn OutputProcessor>, Arc<dyn OutputProcessor>) {
        match self {
            OutputMode::Log => (
                Arc::new(LoggingProcessor::new(role, OutputStreamKind::Stdout)),
                Arc::new(LoggingProcessor::new(role, OutputStreamKind::Stderr)),
            ),
            OutputMode::Silent => (Arc::new(NullProcessor), Arc::new(NullProcessor)),
            OutputMode::Custom { stdout, stderr } => (Arc::clone(stdout), Arc::clone(stderr)),
        }
    }
}

impl fmt::Debug for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputMode::Log => write!(f, "Log"),
            OutputMode::Silent => write!(f, "Silent"),
            OutputMode::Custom { .. } => write!(f, "Custom"),
        }
    }
}
