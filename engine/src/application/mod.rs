//! Application Layer
//!
//! Wires infrastructure adapters into the domain services.

pub mod launcher;

pub use launcher::{LauncherSettings, ManagedProcess, MongoLauncher};
