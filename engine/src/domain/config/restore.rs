//! mongorestore configuration

use super::dump::DEFAULT_PARALLEL_COLLECTIONS;
use crate::constants::startup::DEFAULT_STARTUP_TIMEOUT_MS;
use crate::domain::value_objects::{Net, Version};
use crate::domain::DomainError;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_INSERTION_WORKERS: u32 = 1;

#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct RestoreConfig {
    pub version: Version,
    pub net: Net,
    pub startup_timeout: Duration,
    pub verbose: bool,
    pub database: Option<String>,
    pub collection: Option<String>,
    pub obj_check: bool,
    pub oplog_replay: bool,
    pub oplog_limit: Option<String>,
    pub archive: Option<PathBuf>,
    pub restore_db_users_and_roles: bool,
    pub dir: Option<PathBuf>,
    pub gzip: bool,
    pub drop: bool,
    pub write_concern: Option<String>,
    pub no_index_restore: bool,
    pub no_options_restore: bool,
    pub keep_index_version: bool,
    pub maintain_insertion_order: bool,
    pub num_parallel_collections: u32,
    pub num_insertion_workers_per_collection: u32,
    pub stop_on_error: bool,
    pub bypass_document_validation: bool,
}

impl RestoreConfig {
    pub fn builder(version: Version, net: Net) -> RestoreConfigBuilder {
        RestoreConfigBuilder {
            config: RestoreConfig {
                version,
                net,
                startup_timeout: Duration::from_millis(DEFAULT_STARTUP_TIMEOUT_MS),
                verbose: false,
                database: None,
                collection: None,
                obj_check: false,
                oplog_replay: false,
                oplog_limit: None,
                archive: None,
                restore_db_users_and_roles: false,
                dir: None,
                gzip: false,
                drop: false,
                write_concern: None,
                no_index_restore: false,
                no_options_restore: false,
                keep_index_version: false,
                maintain_insertion_order: false,
                num_parallel_collections: DEFAULT_PARALLEL_COLLECTIONS,
                num_insertion_workers_per_collection: DEFAULT_INSERTION_WORKERS,
                stop_on_error: false,
                bypass_document_validation: false,
            },
        }
    }
}

#[derive(Debug)]
pub struct RestoreConfigBuilder {
    config: RestoreConfig,
}

impl RestoreConfigBuilder {
    pub fn startup_timeout(mut self, timeout: Duration) -> Self {
        self.config.startup_timeout = timeout;
        self
    }

    pub fn verbose(mut self, value: bool) -> Self {
        self.config.verbose = value;
        self
    }

    pub fn database(mut self, name: impl Into<String>) -> Self {
        self.config.database = Some(name.into());
        self
    }

    pub fn collection(mut self, name: impl Into<String>) -> Self {
        self.config.collection = Some(name.into());
        self
    }

    pub fn obj_check(mut self, value: bool) -> Self {
        self.config.obj_check = value;
        self
    }

    pub fn oplog_replay(mut self, value: bool) -> Self {
        self.config.oplog_replay = value;
        self
    }

    pub fn oplog_limit(mut self, limit: impl Into<String>) -> Self {
        self.config.oplog_limit = Some(limit.into());
        self
    }

    pub fn archive(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.archive = Some(path.into());
        self
    }

    pub fn restore_db_users_and_roles(mut self, value: bool) -> Self {
        self.config.restore_db_users_and_roles = value;
        self
    }

    pub fn dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.dir = Some(path.into());
        self
    }

    pub fn gzip(mut self, value: bool) -> Self {
        self.config.gzip = value;
        self
    }

    pub fn drop_collections(mut self, value: bool) -> Self {
        self.config.drop = value;
        self
    }

    pub fn write_concern(mut self, concern: impl Into<String>) -> Self {
        self.config.write_concern = Some(concern.into());
        self
    }

    pub fn no_index_restore(mut self, value: bool) -> Self {
        self.config.no_index_restore = value;
        self
    }

    pub fn no_options_restore(mut self, value: bool) -> Self {
        self.config.no_options_restore = value;
        self
    }

    pub fn keep_index_version(mut self, value: bool) -> Self {
        self.config.keep_index_version = value;
        self
    }

    pub fn maintain_insertion_order(mut self, value: bool) -> Self {
        self.config.maintain_insertion_order = value;
        self
    }

    pub fn num_parallel_collections(mut self, count: u32) -> Self {
        self.config.num_parallel_collections = count;
        self
    }

    pub fn num_insertion_workers_per_collection(mut self, count: u32) -> Self {
        self.config.num_insertion_workers_per_collection = count;
        self
    }

    pub fn stop_on_error(mut self, value: bool) -> Self {
        self.config.stop_on_error = value;
        self
    }

    pub fn bypass_document_validation(mut self, value: bool) -> Self {
        self.config.bypass_document_validation = value;
        self
    }

    pub fn build(self) -> Result<RestoreConfig, DomainError> {
        let c = &self.config;
        if c.startup_timeout.is_zero() {
            return Err(DomainError::InvalidConfiguration(
                "startup timeout must be greater than zero".to_string(),
            ));
        }
        if c.num_parallel_collections == 0 || c.num_insertion_workers_per_collection == 0 {
            return Err(DomainError::InvalidConfiguration(
                "parallelism settings must be at least 1".to_string(),
            ));
        }
        if c.archive.is_some() && c.dir.is_some() {
            return Err(DomainError::InvalidConfiguration(
                "archive and dir are mutually exclusive".to_string(),
            ));
        }
        if c.oplog_limit.is_some() && !c.oplog_replay {
            return Err(DomainError::InvalidConfiguration(
                "oplogLimit requires oplogReplay".to_string(),
            ));
        }
        Ok(self.config)
    }
}
