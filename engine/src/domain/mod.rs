pub mod config;
pub mod constants;
pub mod error;
pub mod ports;
pub mod services;
pub mod value_objects;

pub use config::{
    CmdOptions, DumpConfig, ImportConfig, MongodConfig, MongosConfig, RestoreConfig, RoleConfig,
    ShellConfig, Storage,
};
pub use error::{DomainError, Result};
pub use value_objects::{
    CommandLine, Feature, FeatureSet, InstanceId, Net, Role, SupervisorState, Version,
};
