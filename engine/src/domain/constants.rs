//! Domain Constants
//!
//! Log markers and patterns the supervisor classifies process output with

/// Exit code indicating successful process termination
pub const SUCCESS_EXIT_CODE: i32 = 0;

/// Readiness marker printed by mongod/mongos with plain-text logs
pub const SERVER_READY_MARKER: &str = "waiting for connections on port";

/// Readiness marker printed by mongod/mongos with structured (JSON) logs
pub const SERVER_READY_MARKER_STRUCTURED: &str = "Waiting for connections";

/// Readiness marker printed by mongodump when it finished
pub const DUMP_DONE_MARKER: &str = "done dumping";

/// Readiness marker printed by mongorestore and mongoimport
pub const IMPORTED_MARKER: &str = "imported";

/// Readiness marker printed by the mongo shell once connected
pub const SHELL_CONNECTED_MARKER: &str = "connecting to:";

/// Substrings that identify a failed startup
pub const KNOWN_FAILURE_MARKERS: &[&str] = &["failed errno", "ERROR:", "error command line"];

/// PID patterns, tried in order against captured output
pub const PID_PATTERNS: &[&str] = &[
    r"MongoDB starting : pid=([0-9]+) port",
    r#""pid":([0-9]+),"port""#,
];

/// Interleaved-memory wrapper prepended on NUMA hosts
pub const NUMA_WRAPPER: &[&str] = &["numactl", "--interleave=all"];
