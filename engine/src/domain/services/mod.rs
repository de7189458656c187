pub mod command_line_synthesizer;
pub mod log_watch;
pub mod output;
pub mod platform_adapter;
pub mod process_supervisor;
pub mod shutdown_protocol;

pub use command_line_synthesizer::synthesize;
pub use log_watch::{LogClassifier, LogWatch, LogWatchResult};
pub use output::{
    CollectingProcessor, LoggingProcessor, NullProcessor, OutputMode, OutputProcessor,
    OutputStreamKind,
};
pub use platform_adapter::{Platform, PlatformAdapter};
pub use process_supervisor::{extract_pid, ProcessSupervisor, Readiness, StopSettings};
pub use shutdown_protocol::{ShutdownClient, SHUTDOWN_COMMAND};
