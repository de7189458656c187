//! mongodump configuration

use crate::constants::startup::DEFAULT_STARTUP_TIMEOUT_MS;
use crate::domain::value_objects::{Net, Version};
use crate::domain::DomainError;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_PARALLEL_COLLECTIONS: u32 = 4;

#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct DumpConfig {
    pub version: Version,
    pub net: Net,
    pub startup_timeout: Duration,
    pub verbose: bool,
    pub database: Option<String>,
    pub collection: Option<String>,
    pub query: Option<String>,
    pub query_file: Option<PathBuf>,
    pub read_preference: Option<String>,
    pub force_table_scan: bool,
    pub archive: Option<PathBuf>,
    pub dump_db_users_and_roles: bool,
    pub out: Option<PathBuf>,
    pub gzip: bool,
    pub repair: bool,
    pub oplog: bool,
    pub exclude_collection: Option<String>,
    pub exclude_collection_with_prefix: Option<String>,
    pub num_parallel_collections: u32,
}

impl DumpConfig {
    pub fn builder(version: Version, net: Net) -> DumpConfigBuilder {
        DumpConfigBuilder {
            config: DumpConfig {
                version,
                net,
                startup_timeout: Duration::from_millis(DEFAULT_STARTUP_TIMEOUT_MS),
                verbose: false,
                database: None,
                collection: None,
                query: None,
                query_file: None,
                read_preference: None,
                force_table_scan: false,
                archive: None,
                dump_db_users_and_roles: false,
                out: None,
                gzip: false,
                repair: false,
                oplog: false,
                exclude_collection: None,
                exclude_collection_with_prefix: None,
                num_parallel_collections: DEFAULT_PARALLEL_COLLECTIONS,
            },
        }
    }
}

#[derive(Debug)]
pub struct DumpConfigBuilder {
    config: DumpConfig,
}

impl DumpConfigBuilder {
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

    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.config.query = Some(query.into());
        self
    }

    pub fn query_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.query_file = Some(path.into());
        self
    }

    pub fn read_preference(mut self, preference: impl Into<String>) -> Self {
        self.config.read_preference = Some(preference.into());
        self
    }

    pub fn force_table_scan(mut self, value: bool) -> Self {
        self.config.force_table_scan = value;
        self
    }

    pub fn archive(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.archive = Some(path.into());
        self
    }

    pub fn dump_db_users_and_roles(mut self, value: bool) -> Self {
        self.config.dump_db_users_and_roles = value;
        self
    }

    pub fn out(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.out = Some(path.into());
        self
    }

    pub fn gzip(mut self, value: bool) -> Self {
        self.config.gzip = value;
        self
    }

    pub fn repair(mut self, value: bool) -> Self {
        self.config.repair = value;
        self
    }

    pub fn oplog(mut self, value: bool) -> Self {
        self.config.oplog = value;
        self
    }

    pub fn exclude_collection(mut self, name: impl Into<String>) -> Self {
        self.config.exclude_collection = Some(name.into());
        self
    }

    pub fn exclude_collection_with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.exclude_collection_with_prefix = Some(prefix.into());
        self
    }

    pub fn num_parallel_collections(mut self, count: u32) -> Self {
        self.config.num_parallel_collections = count;
        self
    }

    pub fn build(self) -> Result<DumpConfig, DomainError> {
        let c = &self.config;
        if c.startup_timeout.is_zero() {
            return Err(DomainError::InvalidConfiguration(
                "startup timeout must be greater than zero".to_string(),
            ));
        }
        if c.num_parallel_collections == 0 {
            return Err(DomainError::InvalidConfiguration(
                "numParallelCollections must be at least 1".to_string(),
            ));
        }
        if c.archive.is_some() && c.out.is_some() {
            return Err(DomainError::InvalidConfiguration(
                "archive and out are mutually exclusive".to_string(),
            ));
        }
        if c.collection.is_some() && c.database.is_none() {
            return Err(DomainError::InvalidConfiguration(
                "a collection requires a database".to_string(),
            ));
        }
        Ok(self.config)
    }
}
