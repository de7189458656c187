//! SupervisorState value object
//! Lifecycle state of one supervised process

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SupervisorState {
    /// Spawned (or about to be), readiness not yet resolved
    #[default]
    Starting,

    /// Readiness marker seen; `pid` is what the log reported, if anything
    Running { pid: Option<u32> },

    /// Protocol-level shutdown in progress
    StoppingGraceful,

    /// OS signals in progress
    StoppingForced,

    /// Terminal: process is gone (or was a finished utility)
    Stopped,

    /// Terminal: readiness failed
    StartFailed,
}

impl SupervisorState {
    pub fn is_running(&self) -> bool {
        matches!(self, SupervisorState::Running { .. })
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SupervisorState::Stopped | SupervisorState::StartFailed)
    }

    pub fn is_stopping(&self) -> bool {
        matches!(
            self,
            SupervisorState::StoppingGraceful | SupervisorState::StoppingForced
        )
    }

    pub fn can_transition_to(&self, target: SupervisorState) -> bool {
        use SupervisorState::*;
        matches!(
            (self, target),
            (Starting, Running { .. })
                | (Starting, StartFailed)
                | (Running { .. }, StoppingGraceful)
                | (Running { .. }, Stopped)
                | (StoppingGraceful, StoppingForced)
                | (StoppingForced, Stopped)
        )
    }
}

impl fmt::Display for SupervisorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SupervisorState::Starting => write!(f, "starting"),
            SupervisorState::Running { pid: Some(pid) } => write!(f, "running (pid {})", pid),
            SupervisorState::Running { pid: None } => write!(f, "running"),
            SupervisorState::StoppingGraceful => write!(f, "stopping (graceful)"),
            SupervisorState::StoppingForced => write!(f, "stopping (forced)"),
            SupervisorState::Stopped => write!(f, "stopped"),
            SupervisorState::StartFailed => write!(f, "start failed"),
        }
    }
}
