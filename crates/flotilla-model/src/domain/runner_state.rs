use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle state of one runner within this process.
///
/// ```text
/// Pending -> Creating -> Started -> Polling -> Terminated -> Deleting -> Deleted
///               |                                              |
///               +------------------> Failed <------------------+
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RunnerState {
    Pending,
    Creating,
    Started,
    Polling,
    Terminated,
    Deleting,
    Deleted,
    Failed,
}

impl RunnerState {
    /// Returns `true` if no further transition is possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunnerState::Deleted | RunnerState::Failed)
    }

    /// Returns `true` if `next` is a legal forward step from `self`.
    pub fn can_advance_to(&self, next: RunnerState) -> bool {
        use RunnerState::*;
        matches!(
            (self, next),
            (Pending, Creating)
                | (Creating, Started)
                | (Started, Polling)
                | (Polling, Terminated)
                | (Terminated, Deleting)
                | (Deleting, Deleted)
                | (Creating, Failed)
                | (Deleting, Failed)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunnerState::Pending => "pending",
            RunnerState::Creating => "creating",
            RunnerState::Started => "started",
            RunnerState::Polling => "polling",
            RunnerState::Terminated => "terminated",
            RunnerState::Deleting => "deleting",
            RunnerState::Deleted => "deleted",
            RunnerState::Failed => "failed",
        }
    }
}

impl fmt::Display for RunnerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
