//! mongod configuration

use super::{validate_pairs, CmdOptions};
use crate::constants::startup::DEFAULT_STARTUP_TIMEOUT_MS;
use crate::domain::value_objects::{Net, Version};
use crate::domain::DomainError;
use std::path::PathBuf;
use std::time::Duration;

/// Database directory and replication settings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[non_exhaustive]
pub struct Storage {
    pub database_dir: Option<PathBuf>,
    pub repl_set_name: Option<String>,
    /// Oplog size in MB; 0 leaves the server default
    pub oplog_size: u32,
}

impl Storage {
    pub fn new(
        database_dir: Option<PathBuf>,
        repl_set_name: Option<String>,
        oplog_size: u32,
    ) -> Result<Self, DomainError> {
        if repl_set_name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(DomainError::InvalidConfiguration(
                "replica set name must not be blank".to_string(),
            ));
        }
        Ok(Self {
            database_dir,
            repl_set_name,
            oplog_size,
        })
    }
}

#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct MongodConfig {
    pub version: Version,
    pub net: Net,
    pub startup_timeout: Duration,
    pub cmd_options: CmdOptions,
    pub storage: Storage,
    pub config_server: bool,
    pub shard_server: bool,
    /// `--setParameter key=value` pairs, in caller order
    pub params: Vec<(String, String)>,
    /// Free-form arguments appended last
    pub args: Vec<(String, String)>,
    pub pid_file: Option<PathBuf>,
}

impl MongodConfig {
    pub fn builder(version: Version, net: Net) -> MongodConfigBuilder {
        MongodConfigBuilder::new(version, net)
    }
}

#[derive(Debug)]
pub struct MongodConfigBuilder {
    version: Version,
    net: Net,
    startup_timeout: Duration,
    cmd_options: CmdOptions,
    storage: Storage,
    config_server: bool,
    shard_server: bool,
    params: Vec<(String, String)>,
    args: Vec<(String, String)>,
    pid_file: Option<PathBuf>,
}

impl MongodConfigBuilder {
    fn new(version: Version, net: Net) -> Self {
        Self {
            version,
            net,
            startup_timeout: Duration::from_millis(DEFAULT_STARTUP_TIMEOUT_MS),
            cmd_options: CmdOptions::default(),
            storage: Storage::default(),
            config_server: false,
            shard_server: false,
            params: Vec::new(),
            args: Vec::new(),
            pid_file: None,
        }
    }

    pub fn startup_timeout(mut self, timeout: Duration) -> Self {
        self.startup_timeout = timeout;
        self
    }

    pub fn cmd_options(mut self, options: CmdOptions) -> Self {
        self.cmd_options = options;
        self
    }

    pub fn storage(mut self, storage: Storage) -> Self {
        self.storage = storage;
        self
    }

    pub fn config_server(mut self, value: bool) -> Self {
        self.config_server = value;
        self
    }

    pub fn shard_server(mut self, value: bool) -> Self {
        self.shard_server = value;
        self
    }

    pub fn set_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    pub fn arg(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.args.push((name.into(), value.into()));
        self
    }

    pub fn pid_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.pid_file = Some(path.into());
        self
    }

    pub fn build(self) -> Result<MongodConfig, DomainError> {
        if self.startup_timeout.is_zero() {
            return Err(DomainError::InvalidConfiguration(
                "startup timeout must be greater than zero".to_string(),
            ));
        }
        if self.config_server && self.shard_server {
            return Err(DomainError::InvalidConfiguration(
                "a mongod cannot be both config server and shard server".to_string(),
            ));
        }
        validate_pairs("set parameter", &self.params)?;
        validate_pairs("argument", &self.args)?;

        Ok(MongodConfig {
            version: self.version,
            net: self.net,
            startup_timeout: self.startup_timeout,
            cmd_options: self.cmd_options,
            storage: self.storage,
            config_server: self.config_server,
            shard_server: self.shard_server,
            params: self.params,
            args: self.args,
            pid_file: self.pid_file,
        })
    }
}
