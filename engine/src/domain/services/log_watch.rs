//! Log watcher
//!
//! Classifies a process's stdout against a readiness marker and a set of
//! failure markers. A watch session resolves to exactly one outcome. The
//! stream keeps being drained after that, so the child never blocks on a
//! full pipe.

use crate::domain::services::output::OutputProcessor;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Outcome of one watch session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogWatchResult {
    /// The readiness marker appeared; output captured up to that line
    Success(String),
    /// A known failure marker appeared before readiness
    Failure { marker: String, output: String },
    /// The stream ended or failed before either marker appeared
    StreamClosed(String),
    /// No marker within the timeout; output captured so far
    TimedOut(String),
}

impl LogWatchResult {
    pub fn is_success(&self) -> bool {
        matches!(self, LogWatchResult::Success(_))
    }

    pub fn output(&self) -> &str {
        match self {
            LogWatchResult::Success(output)
            | LogWatchResult::Failure { output, .. }
            | LogWatchResult::StreamClosed(output)
            | LogWatchResult::TimedOut(output) => output,
        }
    }
}

/// Line classifier with its own capture buffer
#[derive(Debug)]
pub struct LogClassifier {
    success_marker: String,
    failure_markers: Vec<String>,
    captured: String,
}

impl LogClassifier {
    pub fn new(success_marker: impl Into<String>, failure_markers: Vec<String>) -> Self {
        Self {
            success_marker: success_marker.into(),
            failure_markers,
            captured: String::new(),
        }
    }

    /// Captures `line` and returns the outcome once one of the markers matches
    pub fn feed(&mut self, line: &str) -> Option<LogWatchResult> {
        self.captured.push_str(line);
        self.captured.push('\n');

        if line.contains(&self.success_marker) {
            return Some(LogWatchResult::Success(self.captured.clone()));
        }
        self.failure_markers
            .iter()
            .find(|marker| line.contains(marker.as_str()))
            .map(|marker| LogWatchResult::Failure {
                marker: marker.clone(),
                output: self.captured.clone(),
            })
    }

    /// Outcome when the stream ends without a match
    pub fn close(self) -> LogWatchResult {
        LogWatchResult::StreamClosed(self.captured)
    }

    pub fn captured(&self) -> &str {
        &self.captured
    }
}

/// A running watch session over one stream
pub struct LogWatch {
    result: oneshot::Receiver<LogWatchResult>,
    progress: Arc<Mutex<String>>,
    pump: JoinHandle<()>,
}

impl LogWatch {
    /// Starts pumping `stream` on a background task
    ///
    /// Every line goes to `processor`; lines are classified until the first
    /// outcome.
    pub fn spawn<R>(stream: R, classifier: LogClassifier, processor: Arc<dyn OutputProcessor>) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let progress = Arc::new(Mutex::new(String::new()));
        let seen = progress.clone();

        let pump = tokio::spawn(async move {
            let mut reader = BufReader::new(stream);
            let mut buf = Vec::new();
            let mut pending = Some((classifier, tx));

            loop {
                match read_line(&mut reader, &mut buf).await {
                    Ok(Some(line)) => {
                        processor.process(&line);
                        if let Some((mut classifier, tx)) = pending.take() {
                            match classifier.feed(&line) {
                                Some(result) => {
                                    let _ = tx.send(result);
                                }
                                None => {
                                    {
                                        let mut so_far = lock(&seen);
                                        so_far.push_str(&line);
                                        so_far.push('\n');
                                    }
                                    pending = Some((classifier, tx));
                                }
                            }
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        warn!(error = %e, "Failed to read process output, treating stream as closed");
                        break;
                    }
                }
            }

            if let Some((classifier, tx)) = pending {
                let _ = tx.send(classifier.close());
            }
            debug!("Output stream drained");
        });

        Self {
            result: rx,
            progress,
            pump,
        }
    }

    /// Waits for the outcome; `TimedOut` once `timeout` elapses
    ///
    /// The pump keeps draining after this returns.
    pub async fn wait(self, timeout: Duration) -> LogWatchResult {
        let LogWatch {
            result,
            progress,
            pump,
        } = self;
        let outcome = match tokio::time::timeout(timeout, result).await {
            Ok(Ok(result)) => result,
            // the pump always sends before finishing; a close with what it saw if it died
            Ok(Err(_)) => LogWatchResult::StreamClosed(lock(&progress).clone()),
            Err(_) => LogWatchResult::TimedOut(lock(&progress).clone()),
        };
        drop(pump);
        outcome
    }
}

/// Forwards every line of `stream` to `processor` until it ends
pub fn drain<R>(stream: R, processor: Arc<dyn OutputProcessor>) -> JoinHandle<()>
where
    R: AsyncRead + Send + Unpin + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(stream);
        let mut buf = Vec::new();
        loop {
            match read_line(&mut reader, &mut buf).await {
                Ok(Some(line)) => processor.process(&line),
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, "Failed to read process output");
                    break;
                }
            }
        }
    })
}

/// Next line without its terminator; invalid UTF-8 is replaced, not fatal
async fn read_line<R>(reader: &mut R, buf: &mut Vec<u8>) -> std::io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    if reader.read_until(b'\n', buf).await? == 0 {
        return Ok(None);
    }
    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    }
    Ok(Some(String::from_utf8_lossy(buf).into_owned()))
}

fn lock(progress: &Mutex<String>) -> std::sync::MutexGuard<'_, String> {
    progress.lock().unwrap_or_else(|e| e.into_inner())
}
