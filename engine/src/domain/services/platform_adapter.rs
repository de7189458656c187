//! Platform adapter
//! Wraps server command lines for interleaved memory on NUMA hosts

use crate::domain::constants::NUMA_WRAPPER;
use crate::domain::value_objects::{CommandLine, Role};
use std::fmt;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Linux,
    MacOs,
    Windows,
    Other,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(target_os = "linux") {
            Platform::Linux
        } else if cfg!(target_os = "macos") {
            Platform::MacOs
        } else if cfg!(windows) {
            Platform::Windows
        } else {
            Platform::Other
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Platform::Linux => "linux",
            Platform::MacOs => "macos",
            Platform::Windows => "windows",
            Platform::Other => "other",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformAdapter {
    platform: Platform,
    numa: bool,
}

impl PlatformAdapter {
    pub fn new(platform: Platform, numa: bool) -> Self {
        Self { platform, numa }
    }

    /// Inspects the running host
    ///
    /// NUMA counts only on Linux with more than one memory node and
    /// `numactl` on the PATH. Any detection error means no NUMA.
    pub fn detect() -> Self {
        let platform = Platform::current();
        let numa = platform == Platform::Linux && numa_node_count() > 1 && numactl_available();
        debug!(platform = %platform, numa = numa, "Detected execution platform");
        Self { platform, numa }
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn is_numa(&self) -> bool {
        self.numa
    }

    /// Command line to execute for `role`; unchanged unless a wrapper applies
    pub fn adapt(&self, role: Role, command_line: &CommandLine) -> CommandLine {
        if role == Role::Server && self.platform == Platform::Linux && self.numa {
            info!("NUMA host detected, starting mongod with interleaved memory");
            return command_line.wrapped_with(NUMA_WRAPPER);
        }
        command_line.clone()
    }
}

impl Default for PlatformAdapter {
    fn default() -> Self {
        Self::detect()
    }
}

fn numa_node_count() -> usize {
    std::fs::read_dir("/sys/devices/system/node")
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .filter(|e| {
                    let name = e.file_name();
                    let name = name.to_string_lossy();
                    name.strip_prefix("node")
                        .is_some_and(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
                })
                .count()
        })
        .unwrap_or(0)
}

fn numactl_available() -> bool {
    std::env::var_os("PATH")
        .map(|paths| std::env::split_paths(&paths).any(|dir| dir.join("numactl").is_file()))
        .unwrap_or(false)
}
