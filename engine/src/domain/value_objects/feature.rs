//! Version/feature matrix
//!
//! Maps a version to the capability flags the synthesizer consults. Each
//! feature is enabled from the version that introduced it and stays enabled
//! until the version that removed it, if any.

use crate::domain::value_objects::Version;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// A capability gated by the target version
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Feature {
    /// `--syncdelay=N` is accepted
    SyncDelay,
    /// Text search must be switched on with `textSearchEnabled=true`
    TextSearch,
    /// `--storageEngine` is accepted
    StorageEngine,
    /// `--nohttpinterface` is accepted
    HttpInterfaceArg,
    /// mongos accepts `--chunkSize`
    ChunkSizeArg,
    /// mongos expects `--configdb <replicaSet>/<hosts>`
    ConfigDbReplicaSetSyntax,
    /// `--noprealloc` and `--smallfiles` are accepted
    MmapV1Options,
    /// `--master` is accepted
    MasterSlave,
    /// Logs are emitted as JSON documents
    StructuredLogs,
}

impl Feature {
    pub const ALL: [Feature; 9] = [
        Feature::SyncDelay,
        Feature::TextSearch,
        Feature::StorageEngine,
        Feature::HttpInterfaceArg,
        Feature::ChunkSizeArg,
        Feature::ConfigDbReplicaSetSyntax,
        Feature::MmapV1Options,
        Feature::MasterSlave,
        Feature::StructuredLogs,
    ];

    /// Half-open range `[introduced, removed)` in which the feature applies
    fn range(&self) -> (Version, Option<Version>) {
        match self {
            Feature::SyncDelay => (Version::new(2, 2, 0), None),
            Feature::TextSearch => (Version::new(2, 4, 0), Some(Version::new(2, 6, 0))),
            Feature::StorageEngine => (Version::new(3, 0, 0), None),
            Feature::HttpInterfaceArg => (Version::new(0, 0, 0), Some(Version::new(3, 6, 0))),
            Feature::ChunkSizeArg => (Version::new(0, 0, 0), Some(Version::new(3, 4, 0))),
            Feature::ConfigDbReplicaSetSyntax => (Version::new(3, 4, 0), None),
            Feature::MmapV1Options => (Version::new(0, 0, 0), Some(Version::new(4, 2, 0))),
            Feature::MasterSlave => (Version::new(0, 0, 0), Some(Version::new(4, 0, 0))),
            Feature::StructuredLogs => (Version::new(4, 4, 0), None),
        }
    }

    pub fn applies_to(&self, version: Version) -> bool {
        let (introduced, removed) = self.range();
        version >= introduced && removed.map_or(true, |r| version < r)
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Feature::SyncDelay => "sync-delay",
            Feature::TextSearch => "text-search",
            Feature::StorageEngine => "storage-engine",
            Feature::HttpInterfaceArg => "http-interface-arg",
            Feature::ChunkSizeArg => "chunk-size-arg",
            Feature::ConfigDbReplicaSetSyntax => "configdb-replica-set-syntax",
            Feature::MmapV1Options => "mmapv1-options",
            Feature::MasterSlave => "master-slave",
            Feature::StructuredLogs => "structured-logs",
        };
        write!(f, "{}", s)
    }
}

/// The version plus every feature enabled for it. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSet {
    version: Version,
    enabled: BTreeSet<Feature>,
}

impl FeatureSet {
    pub fn for_version(version: Version) -> Self {
        let enabled = Feature::ALL
            .iter()
            .copied()
            .filter(|f| f.applies_to(version))
            .collect();
        Self { version, enabled }
    }

    /// Explicit feature set, for callers pinning capabilities by hand
    pub fn with_features(version: Version, features: impl IntoIterator<Item = Feature>) -> Self {
        Self {
            version,
            enabled: features.into_iter().collect(),
        }
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn enabled(&self, feature: Feature) -> bool {
        self.enabled.contains(&feature)
    }

    pub fn iter(&self) -> impl Iterator<Item = Feature> + '_ {
        self.enabled.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features(v: &str) -> FeatureSet {
        Version::parse(v).unwrap().features()
    }

    #[test]
    fn test_old_version_has_legacy_flags_only() {
        let set = features("2.0.9");
        assert!(set.enabled(Feature::HttpInterfaceArg));
        assert!(set.enabled(Feature::ChunkSizeArg));
        assert!(!set.enabled(Feature::SyncDelay));
        assert!(!set.enabled(Feature::StorageEngine));
    }

    #[test]
    fn test_text_search_window() {
        assert!(!features("2.2.7").enabled(Feature::TextSearch));
        assert!(features("2.4.14").enabled(Feature::TextSearch));
        assert!(!features("2.6.0").enabled(Feature::TextSearch));
    }

    #[test]
    fn test_flags_are_monotonic_unless_removed() {
        for v in ["3.0.0", "3.4.0", "3.6.5", "4.0.2", "4.4.1", "6.0.0"] {
            assert!(features(v).enabled(Feature::StorageEngine), "{}", v);
            assert!(features(v).enabled(Feature::SyncDelay), "{}", v);
        }
    }

    #[test]
    fn test_mongos_flags_flip_at_3_4() {
        let before = features("3.2.22");
        assert!(before.enabled(Feature::ChunkSizeArg));
        assert!(!before.enabled(Feature::ConfigDbReplicaSetSyntax));

        let after = features("3.4.0");
        assert!(!after.enabled(Feature::ChunkSizeArg));
        assert!(after.enabled(Feature::ConfigDbReplicaSetSyntax));
    }

    #[test]
    fn test_structured_logs_from_4_4() {
        assert!(!features("4.2.8").enabled(Feature::StructuredLogs));
        assert!(features("4.4.0").enabled(Feature::StructuredLogs));
        assert!(!features("4.2.8").enabled(Feature::MmapV1Options));
    }

    #[test]
    fn test_explicit_feature_set() {
        let set = FeatureSet::with_features(Version::new(1, 0, 0), [Feature::TextSearch]);
        assert!(set.enabled(Feature::TextSearch));
        assert_eq!(set.iter().count(), 1);
    }
}
