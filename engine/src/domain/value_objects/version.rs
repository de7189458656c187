//! Version value object
//! A MongoDB release identifier (major.minor.patch)

use crate::domain::value_objects::FeatureSet;
use crate::domain::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A release version, ordered by (major, minor, patch)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl Version {
    /// Version used for `production`
    pub const PRODUCTION: Version = Version::new(4, 0, 28);

    /// Version used for `latest`
    pub const LATEST: Version = Version::new(4, 4, 29);

    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parse "3.6.5", "4.0", "v4.4.1" or one of the named aliases
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        let trimmed = s.trim();
        match trimmed.to_lowercase().as_str() {
            "production" => return Ok(Self::PRODUCTION),
            "latest" => return Ok(Self::LATEST),
            _ => {}
        }

        let numeric = trimmed.strip_prefix('v').unwrap_or(trimmed);
        // Drop pre-release suffixes such as "2.4.0-rc3"
        let numeric = numeric.split('-').next().unwrap_or(numeric);

        let parts: Vec<&str> = numeric.split('.').collect();
        if parts.is_empty() || parts.len() > 3 {
            return Err(DomainError::InvalidVersion(s.to_string()));
        }

        let mut numbers = [0u32; 3];
        for (i, part) in parts.iter().enumerate() {
            numbers[i] = part
                .parse()
                .map_err(|_| DomainError::InvalidVersion(s.to_string()))?;
        }

        Ok(Self::new(numbers[0], numbers[1], numbers[2]))
    }

    /// Capability flags that apply to this version
    pub fn features(&self) -> FeatureSet {
        FeatureSet::for_version(*self)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for Version {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
