//! mongos configuration

use super::{validate_pairs, CmdOptions};
use crate::constants::startup::DEFAULT_STARTUP_TIMEOUT_MS;
use crate::domain::value_objects::{Net, Version};
use crate::domain::DomainError;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct MongosConfig {
    pub version: Version,
    pub net: Net,
    pub startup_timeout: Duration,
    pub cmd_options: CmdOptions,
    /// Config server address list (`host:port[,host:port]`)
    pub config_db: Option<String>,
    /// Replica set of the config servers; empty when unset
    pub replica_set: String,
    pub args: Vec<(String, String)>,
    pub pid_file: Option<PathBuf>,
}

impl MongosConfig {
    pub fn builder(version: Version, net: Net) -> MongosConfigBuilder {
        MongosConfigBuilder {
            config: MongosConfig {
                version,
                net,
                startup_timeout: Duration::from_millis(DEFAULT_STARTUP_TIMEOUT_MS),
                cmd_options: CmdOptions::default(),
                config_db: None,
                replica_set: String::new(),
                args: Vec::new(),
                pid_file: None,
            },
        }
    }
}

#[derive(Debug)]
pub struct MongosConfigBuilder {
    config: MongosConfig,
}

impl MongosConfigBuilder {
    pub fn startup_timeout(mut self, timeout: Duration) -> Self {
        self.config.startup_timeout = timeout;
        self
    }

    pub fn cmd_options(mut self, options: CmdOptions) -> Self {
        self.config.cmd_options = options;
        self
    }

    pub fn config_db(mut self, config_db: impl Into<String>) -> Self {
        self.config.config_db = Some(config_db.into());
        self
    }

    pub fn replica_set(mut self, name: impl Into<String>) -> Self {
        self.config.replica_set = name.into();
        self
    }

    pub fn arg(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.args.push((name.into(), value.into()));
        self
    }

    pub fn pid_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pid_file = Some(path.into());
        self
    }

    /// Validates field shapes only; the replica-set requirement depends on the
    /// version and is enforced when the command line is synthesized.
    pub fn build(self) -> Result<MongosConfig, DomainError> {
        if self.config.startup_timeout.is_zero() {
            return Err(DomainError::InvalidConfiguration(
                "startup timeout must be greater than zero".to_string(),
            ));
        }
        if self
            .config
            .config_db
            .as_deref()
            .is_some_and(|db| db.trim().is_empty())
        {
            return Err(DomainError::InvalidConfiguration(
                "config db must not be blank".to_string(),
            ));
        }
        validate_pairs("argument", &self.config.args)?;
        Ok(self.config)
    }
}
