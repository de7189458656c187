//! mongo shell configuration

use crate::constants::startup::DEFAULT_STARTUP_TIMEOUT_MS;
use crate::domain::value_objects::{Net, Version};
use crate::domain::DomainError;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct ShellConfig {
    pub version: Version,
    pub net: Net,
    pub startup_timeout: Duration,
    pub database: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Statements joined with `; ` into a single `--eval`
    pub script_parameters: Vec<String>,
    pub script_name: Option<PathBuf>,
}

impl ShellConfig {
    pub fn builder(version: Version, net: Net) -> ShellConfigBuilder {
        ShellConfigBuilder {
            config: ShellConfig {
                version,
                net,
                startup_timeout: Duration::from_millis(DEFAULT_STARTUP_TIMEOUT_MS),
                database: None,
                username: None,
                password: None,
                script_parameters: Vec::new(),
                script_name: None,
            },
        }
    }
}

#[derive(Debug)]
pub struct ShellConfigBuilder {
    config: ShellConfig,
}

impl ShellConfigBuilder {
    pub fn startup_timeout(mut self, timeout: Duration) -> Self {
        self.config.startup_timeout = timeout;
        self
    }

    pub fn database(mut self, name: impl Into<String>) -> Self {
        self.config.database = Some(name.into());
        self
    }

    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.config.username = Some(username.into());
        self.config.password = Some(password.into());
        self
    }

    pub fn eval(mut self, statement: impl Into<String>) -> Self {
        self.config.script_parameters.push(statement.into());
        self
    }

    pub fn script(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.script_name = Some(path.into());
        self
    }

    pub fn build(self) -> Result<ShellConfig, DomainError> {
        if self.config.startup_timeout.is_zero() {
            return Err(DomainError::InvalidConfiguration(
                "startup timeout must be greater than zero".to_string(),
            ));
        }
        if self
            .config
            .username
            .as_deref()
            .is_some_and(|u| u.trim().is_empty())
        {
            return Err(DomainError::InvalidConfiguration(
                "username must not be blank".to_string(),
            ));
        }
        Ok(self.config)
    }
}
