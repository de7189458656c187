//! Role configurations
//!
//! Immutable value structs produced by validating builders. The engine only
//! reads them.

pub mod cmd_options;
pub mod dump;
pub mod import;
pub mod mongod;
pub mod mongos;
pub mod restore;
pub mod shell;

pub use cmd_options::{CmdOptions, CmdOptionsBuilder};
pub use dump::{DumpConfig, DumpConfigBuilder};
pub use import::{ImportConfig, ImportConfigBuilder};
pub use mongod::{MongodConfig, MongodConfigBuilder, Storage};
pub use mongos::{MongosConfig, MongosConfigBuilder};
pub use restore::{RestoreConfig, RestoreConfigBuilder};
pub use shell::{ShellConfig, ShellConfigBuilder};

use crate::domain::value_objects::{Net, Role, Version};
use crate::domain::DomainError;
use std::path::Path;
use std::time::Duration;

/// Configuration for one launch, tagged by role
#[derive(Debug, Clone)]
pub enum RoleConfig {
    Mongod(MongodConfig),
    Mongos(MongosConfig),
    Dump(DumpConfig),
    Restore(RestoreConfig),
    Import(ImportConfig),
    Shell(ShellConfig),
}

impl RoleConfig {
    pub fn role(&self) -> Role {
        match self {
            RoleConfig::Mongod(_) => Role::Server,
            RoleConfig::Mongos(_) => Role::Router,
            RoleConfig::Dump(_) => Role::Dump,
            RoleConfig::Restore(_) => Role::Restore,
            RoleConfig::Import(_) => Role::Import,
            RoleConfig::Shell(_) => Role::Shell,
        }
    }

    pub fn version(&self) -> Version {
        match self {
            RoleConfig::Mongod(c) => c.version,
            RoleConfig::Mongos(c) => c.version,
            RoleConfig::Dump(c) => c.version,
            RoleConfig::Restore(c) => c.version,
            RoleConfig::Import(c) => c.version,
            RoleConfig::Shell(c) => c.version,
        }
    }

    pub fn net(&self) -> &Net {
        match self {
            RoleConfig::Mongod(c) => &c.net,
            RoleConfig::Mongos(c) => &c.net,
            RoleConfig::Dump(c) => &c.net,
            RoleConfig::Restore(c) => &c.net,
            RoleConfig::Import(c) => &c.net,
            RoleConfig::Shell(c) => &c.net,
        }
    }

    pub fn startup_timeout(&self) -> Duration {
        match self {
            RoleConfig::Mongod(c) => c.startup_timeout,
            RoleConfig::Mongos(c) => c.startup_timeout,
            RoleConfig::Dump(c) => c.startup_timeout,
            RoleConfig::Restore(c) => c.startup_timeout,
            RoleConfig::Import(c) => c.startup_timeout,
            RoleConfig::Shell(c) => c.startup_timeout,
        }
    }

    /// Only server roles write a pid file
    pub fn pid_file(&self) -> Option<&Path> {
        match self {
            RoleConfig::Mongod(c) => c.pid_file.as_deref(),
            RoleConfig::Mongos(c) => c.pid_file.as_deref(),
            _ => None,
        }
    }
}

impl From<MongodConfig> for RoleConfig {
    fn from(config: MongodConfig) -> Self {
        RoleConfig::Mongod(config)
    }
}

impl From<MongosConfig> for RoleConfig {
    fn from(config: MongosConfig) -> Self {
        RoleConfig::Mongos(config)
    }
}

impl From<DumpConfig> for RoleConfig {
    fn from(config: DumpConfig) -> Self {
        RoleConfig::Dump(config)
    }
}

impl From<RestoreConfig> for RoleConfig {
    fn from(config: RestoreConfig) -> Self {
        RoleConfig::Restore(config)
    }
}

impl From<ImportConfig> for RoleConfig {
    fn from(config: ImportConfig) -> Self {
        RoleConfig::Import(config)
    }
}

impl From<ShellConfig> for RoleConfig {
    fn from(config: ShellConfig) -> Self {
        RoleConfig::Shell(config)
    }
}

/// Rejects name/value pairs with a blank name
pub(crate) fn validate_pairs(kind: &str, pairs: &[(String, String)]) -> Result<(), DomainError> {
    for (name, _) in pairs {
        if name.trim().is_empty() {
            return Err(DomainError::InvalidConfiguration(format!(
                "{} name must not be empty",
                kind
            )));
        }
    }
    Ok(())
}
