//! Application-wide constants and default values
//!
//! Centralizes timeouts and other tunables for the launcher

/// Startup readiness defaults
pub mod startup {
    /// Default time to wait for the readiness marker (milliseconds)
    pub const DEFAULT_STARTUP_TIMEOUT_MS: u64 = 20_000;
}

/// Shutdown escalation defaults
pub mod shutdown {
    /// Time allowed for the process to exit after the protocol shutdown was accepted (milliseconds)
    pub const DEFAULT_GRACEFUL_WAIT_MS: u64 = 10_000;

    /// Grace window after SIGTERM before escalating to SIGKILL (milliseconds)
    pub const DEFAULT_TERMINATE_GRACE_MS: u64 = 5_000;

    /// Time to wait for exit confirmation after SIGKILL (milliseconds)
    pub const DEFAULT_KILL_WAIT_MS: u64 = 5_000;
}

/// Shutdown protocol client socket settings
pub mod protocol {
    /// TCP connect timeout (milliseconds)
    pub const CONNECT_TIMEOUT_MS: u64 = 2_000;

    /// Read timeout while waiting for a reply to the shutdown command (milliseconds)
    pub const READ_TIMEOUT_MS: u64 = 2_000;

    /// Size of the buffer used to read a reply
    pub const READ_BUFFER_LEN: usize = 512;

    /// Pause after every attempt so the OS can release the port (milliseconds)
    pub const POST_SHUTDOWN_DELAY_MS: u64 = 100;
}

/// Unix signal numbers used by the executor
pub mod signals {
    pub const SIGTERM: i32 = 15;
    pub const SIGKILL: i32 = 9;
}
