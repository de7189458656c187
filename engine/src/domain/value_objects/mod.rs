pub mod command_line;
pub mod feature;
pub mod instance_id;
pub mod net;
pub mod role;
pub mod supervisor_state;
pub mod version;

pub(crate) use command_line::CommandLineBuilder;
pub use command_line::CommandLine;
pub use feature::{Feature, FeatureSet};
pub use instance_id::InstanceId;
pub use net::Net;
pub use role::Role;
pub use supervisor_state::SupervisorState;
pub use version::Version;
