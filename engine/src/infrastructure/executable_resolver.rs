//! Filesystem executable resolver
//! Finds tool binaries inside an already extracted distribution directory

use crate::domain::ports::ExecutableResolver;
use crate::domain::value_objects::{Role, Version};
use crate::domain::DomainError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable naming the distribution directory
pub const BIN_DIR_ENV: &str = "EMBEDMONGO_BIN_DIR";

/// Looks for `<dir>/<tool>` and then `<dir>/bin/<tool>`
///
/// The version is not part of the lookup; one directory holds one release.
#[derive(Debug, Clone)]
pub struct DirectoryResolver {
    base_dir: PathBuf,
}

impl DirectoryResolver {
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self, DomainError> {
        let base_dir = base_dir.into();
        if base_dir.as_os_str().is_empty() {
            return Err(DomainError::InvalidConfiguration(
                "executable directory must not be empty".to_string(),
            ));
        }
        Ok(Self { base_dir })
    }

    /// Resolver for the directory named by `EMBEDMONGO_BIN_DIR`
    pub fn from_env() -> Result<Self, DomainError> {
        let dir = std::env::var_os(BIN_DIR_ENV).ok_or_else(|| {
            DomainError::InvalidConfiguration(format!("{} is not set", BIN_DIR_ENV))
        })?;
        Self::new(dir)
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn candidates(&self, role: Role) -> Vec<PathBuf> {
        let file_name = if cfg!(windows) {
            format!("{}.exe", role.executable_name())
        } else {
            role.executable_name().to_string()
        };
        vec![
            self.base_dir.join(&file_name),
            self.base_dir.join("bin").join(&file_name),
        ]
    }
}

impl ExecutableResolver for DirectoryResolver {
    fn resolve(&self, role: Role, version: Version) -> Result<PathBuf, DomainError> {
        let candidates = self.candidates(role);
        for candidate in &candidates {
            if candidate.is_file() {
                let path = std::fs::canonicalize(candidate)?;
                debug!(role = %role, version = %version, path = %path.display(), "Resolved executable");
                return Ok(path);
            }
        }
        Err(DomainError::ExecutableNotFound {
            role,
            reason: format!(
                "none of {} exists",
                candidates
                    .iter()
                    .map(|c| c.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        })
    }
}
