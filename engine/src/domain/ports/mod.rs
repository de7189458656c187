pub mod executable_resolver;
pub mod process_executor;

pub use executable_resolver::ExecutableResolver;
#[cfg(test)]
pub use executable_resolver::MockExecutableResolver;
pub use process_executor::{
    OutputStream, ProcessExecutor, ProcessExitHandle, SpawnConfig, SpawnResult,
};
