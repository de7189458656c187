//! Lifecycle and command-line engine for embedded MongoDB processes
//!
//! Build a role configuration, hand it to a [`MongoLauncher`] wired with a
//! [`ProcessExecutor`](domain::ports::ProcessExecutor) and an
//! [`ExecutableResolver`](domain::ports::ExecutableResolver), and stop the
//! returned [`ManagedProcess`] when done.

pub mod application;
pub mod constants;
pub mod domain;
pub mod infrastructure;

pub use application::{LauncherSettings, ManagedProcess, MongoLauncher};
pub use domain::{DomainError, Result};
