//! mongoimport configuration

use crate::constants::startup::DEFAULT_STARTUP_TIMEOUT_MS;
use crate::domain::value_objects::{Net, Version};
use crate::domain::DomainError;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct ImportConfig {
    pub version: Version,
    pub net: Net,
    pub startup_timeout: Duration,
    pub verbose: bool,
    pub database: String,
    pub collection: String,
    /// `json`, `csv` or `tsv`
    pub file_type: Option<String>,
    pub fields: Option<String>,
    pub header_line: bool,
    pub json_array: bool,
    pub upsert: bool,
    pub drop: bool,
    pub stop_on_error: bool,
    pub file: Option<PathBuf>,
}

impl ImportConfig {
    pub fn builder(
        version: Version,
        net: Net,
        database: impl Into<String>,
        collection: impl Into<String>,
    ) -> ImportConfigBuilder {
        ImportConfigBuilder {
            config: ImportConfig {
                version,
                net,
                startup_timeout: Duration::from_millis(DEFAULT_STARTUP_TIMEOUT_MS),
                verbose: false,
                database: database.into(),
                collection: collection.into(),
                file_type: None,
                fields: None,
                header_line: false,
                json_array: false,
                upsert: false,
                drop: false,
                stop_on_error: false,
                file: None,
            },
        }
    }
}

#[derive(Debug)]
pub struct ImportConfigBuilder {
    config: ImportConfig,
}

impl ImportConfigBuilder {
    pub fn startup_timeout(mut self, timeout: Duration) -> Self {
        self.config.startup_timeout = timeout;
        self
    }

    pub fn verbose(mut self, value: bool) -> Self {
        self.config.verbose = value;
        self
    }

    pub fn file_type(mut self, file_type: impl Into<String>) -> Self {
        self.config.file_type = Some(file_type.into());
        self
    }

    pub fn fields(mut self, fields: impl Into<String>) -> Self {
        self.config.fields = Some(fields.into());
        self
    }

    pub fn header_line(mut self, value: bool) -> Self {
        self.config.header_line = value;
        self
    }

    pub fn json_array(mut self, value: bool) -> Self {
        self.config.json_array = value;
        self
    }

    pub fn upsert(mut self, value: bool) -> Self {
        self.config.upsert = value;
        self
    }

    pub fn drop_collection(mut self, value: bool) -> Self {
        self.config.drop = value;
        self
    }

    pub fn stop_on_error(mut self, value: bool) -> Self {
        self.config.stop_on_error = value;
        self
    }

    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.file = Some(path.into());
        self
    }

    pub fn build(self) -> Result<ImportConfig, DomainError> {
        let c = &self.config;
        if c.startup_timeout.is_zero() {
            return Err(DomainError::InvalidConfiguration(
                "startup timeout must be greater than zero".to_string(),
            ));
        }
        if c.database.trim().is_empty() || c.collection.trim().is_empty() {
            return Err(DomainError::InvalidConfiguration(
                "import requires a database and a collection".to_string(),
            ));
        }
        if let Some(file_type) = c.file_type.as_deref() {
            if !matches!(file_type, "json" | "csv" | "tsv") {
                return Err(DomainError::InvalidConfiguration(format!(
                    "unsupported import type '{}'",
                    file_type
                )));
            }
        }
        Ok(self.config)
    }
}
