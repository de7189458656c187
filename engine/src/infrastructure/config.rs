//! mongod definitions loaded from YAML files
//!
//! A directory holds one YAML file per instance; the instance name is the
//! file stem. Values are converted through the same validating builders as
//! programmatic configuration.

use crate::domain::config::{CmdOptions, MongodConfig, Storage};
use crate::domain::value_objects::{Net, Version};
use crate::domain::DomainError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Environment variable naming the definitions directory
pub const CONFIG_DIR_ENV: &str = "EMBEDMONGO_CONFIG_DIR";

/// One mongod definition as written in YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongodFileConfig {
    /// Version string or alias (`production`, `latest`)
    pub version: String,

    #[serde(default)]
    pub net: NetFileConfig,

    #[serde(default)]
    pub storage: StorageFileConfig,

    #[serde(default)]
    pub cmd_options: CmdOptions,

    #[serde(default)]
    pub config_server: bool,

    #[serde(default)]
    pub shard_server: bool,

    /// `--setParameter` pairs, emitted in key order
    #[serde(default)]
    pub params: BTreeMap<String, String>,

    /// Extra arguments, emitted in key order
    #[serde(default)]
    pub args: BTreeMap<String, String>,

    #[serde(default)]
    pub startup_timeout_sec: Option<u64>,

    #[serde(default)]
    pub pid_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetFileConfig {
    /// A free port is picked when absent
    #[serde(default)]
    pub port: Option<u16>,

    #[serde(default)]
    pub bind_ip: Option<String>,

    #[serde(default)]
    pub ipv6: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageFileConfig {
    #[serde(default)]
    pub database_dir: Option<PathBuf>,

    #[serde(default)]
    pub repl_set_name: Option<String>,

    #[serde(default)]
    pub oplog_size: u32,
}

impl MongodFileConfig {
    pub fn load(path: &Path) -> Result<Self, DomainError> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            DomainError::InvalidConfiguration(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::parse(&contents).map_err(|e| match e {
            DomainError::InvalidConfiguration(msg) => DomainError::InvalidConfiguration(format!(
                "{} ({})",
                msg,
                path.display()
            )),
            other => other,
        })
    }

    pub fn parse(contents: &str) -> Result<Self, DomainError> {
        serde_yaml::from_str(contents).map_err(|e| {
            DomainError::InvalidConfiguration(format!("Failed to parse YAML: {}", e))
        })
    }

    /// Validates and converts into an engine configuration
    pub fn into_config(self) -> Result<MongodConfig, DomainError> {
        let version = Version::parse(&self.version)?;
        let net = match self.net.port {
            Some(port) => Net::new(self.net.bind_ip, port, self.net.ipv6)?,
            None => {
                let free = Net::free_port()?;
                Net::new(self.net.bind_ip, free.port(), self.net.ipv6)?
            }
        };
        let storage = Storage::new(
            self.storage.database_dir,
            self.storage.repl_set_name,
            self.storage.oplog_size,
        )?;

        let mut builder = MongodConfig::builder(version, net)
            .cmd_options(self.cmd_options)
            .storage(storage)
            .config_server(self.config_server)
            .shard_server(self.shard_server);
        for (name, value) in self.params {
            builder = builder.set_parameter(name, value);
        }
        for (name, value) in self.args {
            builder = builder.arg(name, value);
        }
        if let Some(secs) = self.startup_timeout_sec {
            builder = builder.startup_timeout(Duration::from_secs(secs));
        }
        if let Some(pid_file) = self.pid_file {
            builder = builder.pid_file(pid_file);
        }
        builder.build()
    }
}

/// Loads and validates one definition file
pub fn load_mongod_config(path: &Path) -> Result<MongodConfig, DomainError> {
    MongodFileConfig::load(path)?.into_config()
}

/// Loads every `*.yaml`/`*.yml` file of `dir`, sorted by file name
///
/// Files that fail to load are skipped with a warning.
pub fn load_from_directory(dir: &Path) -> Result<Vec<(String, MongodConfig)>, DomainError> {
    let mut entries: Vec<_> = std::fs::read_dir(dir)
        .map_err(|e| {
            DomainError::InvalidConfiguration(format!(
                "Failed to read config directory '{}': {}",
                dir.display(),
                e
            ))
        })?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            matches!(
                path.extension().and_then(|e| e.to_str()),
                Some("yaml") | Some("yml")
            )
        })
        .collect();
    entries.sort();

    let mut configs = Vec::new();
    for path in entries {
        let Some(name) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
            warn!(path = %path.display(), "Skipping file with invalid name");
            continue;
        };
        match load_mongod_config(&path) {
            Ok(config) => {
                debug!(name = %name, path = %path.display(), "Loaded mongod definition");
                configs.push((name, config));
            }
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to load config file"),
        }
    }
    Ok(configs)
}

/// Definitions directory from `EMBEDMONGO_CONFIG_DIR`, if set
pub fn get_default_config_dir() -> Option<PathBuf> {
    std::env::var_os(CONFIG_DIR_ENV).map(PathBuf::from)
}
