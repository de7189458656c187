//! Infrastructure Layer
//!
//! Adapters that implement the ports defined in the domain layer.
//!
//! - `TokioProcessExecutor`: real process execution using tokio
//! - `DirectoryResolver`: finds tool binaries in an extracted distribution
//! - `config`: mongod definitions from YAML files
//!
//! ## Usage
//!
//! ```rust,no_run
//! use embedmongo_engine::infrastructure::{DirectoryResolver, TokioProcessExecutor};
//! use std::sync::Arc;
//!
//! let executor = Arc::new(TokioProcessExecutor::new());
//! let resolver = Arc::new(DirectoryResolver::new("/opt/mongodb-4.0.28").unwrap());
//!
//! // Wire into a MongoLauncher...
//! ```

pub mod config;
pub mod executable_resolver;
pub mod tokio_executor;

pub use config::{
    get_default_config_dir, load_from_directory, load_mongod_config, MongodFileConfig,
};
pub use executable_resolver::{DirectoryResolver, BIN_DIR_ENV};
pub use tokio_executor::TokioProcessExecutor;
