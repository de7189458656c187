//! Role value object
//! The kind of process the engine launches

use crate::domain::constants::{
    DUMP_DONE_MARKER, IMPORTED_MARKER, KNOWN_FAILURE_MARKERS, SERVER_READY_MARKER,
    SERVER_READY_MARKER_STRUCTURED, SHELL_CONNECTED_MARKER,
};
use crate::domain::value_objects::{Feature, FeatureSet};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// mongod, including config and shard servers
    Server,
    /// mongos
    Router,
    Dump,
    Restore,
    Import,
    Shell,
}

impl Role {
    /// Base name of the tool binary
    pub fn executable_name(&self) -> &'static str {
        match self {
            Role::Server => "mongod",
            Role::Router => "mongos",
            Role::Dump => "mongodump",
            Role::Restore => "mongorestore",
            Role::Import => "mongoimport",
            Role::Shell => "mongo",
        }
    }

    /// Whether the role runs a persistent server that must be shut down
    pub fn is_server(&self) -> bool {
        matches!(self, Role::Server | Role::Router)
    }

    /// Log substring that signals the process is ready
    pub fn success_marker(&self, features: &FeatureSet) -> &'static str {
        match self {
            Role::Server | Role::Router => {
                if features.enabled(Feature::StructuredLogs) {
                    SERVER_READY_MARKER_STRUCTURED
                } else {
                    SERVER_READY_MARKER
                }
            }
            Role::Dump => DUMP_DONE_MARKER,
            Role::Restore | Role::Import => IMPORTED_MARKER,
            Role::Shell => SHELL_CONNECTED_MARKER,
        }
    }

    pub fn failure_markers(&self) -> Vec<String> {
        KNOWN_FAILURE_MARKERS.iter().map(|m| m.to_string()).collect()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.executable_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::Version;

    #[test]
    fn test_server_marker_depends_on_log_format() {
        let legacy = Version::new(3, 6, 5).features();
        let structured = Version::new(4, 4, 0).features();
        assert_eq!(Role::Server.success_marker(&legacy), SERVER_READY_MARKER);
        assert_eq!(
            Role::Router.success_marker(&structured),
            SERVER_READY_MARKER_STRUCTURED
        );
    }

    #[test]
    fn test_only_server_roles_are_persistent() {
        assert!(Role::Server.is_server());
        assert!(Role::Router.is_server());
        for role in [Role::Dump, Role::Restore, Role::Import, Role::Shell] {
            assert!(!role.is_server());
        }
    }
}
