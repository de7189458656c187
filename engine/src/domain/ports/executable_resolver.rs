//! ExecutableResolver port
//! Maps a role and version to an executable on disk. Downloading and caching
//! artifacts is the implementor's business.

use crate::domain::value_objects::{Role, Version};
use crate::domain::DomainError;
use std::path::PathBuf;

#[cfg_attr(test, mockall::automock)]
pub trait ExecutableResolver: Send + Sync {
    /// Absolute path of the tool for `role` at `version`
    fn resolve(&self, role: Role, version: Version) -> Result<PathBuf, DomainError>;
}
