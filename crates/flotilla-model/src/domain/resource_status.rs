use serde::{Deserialize, Serialize};

/// Provider state string that marks a finished container.
pub const TERMINATED_STATE: &str = "Terminated";

/// Observed status of a remote container group.
///
/// A failed status query is not a variant: clients report it as an error, so
/// "not started yet" and "could not ask" never collapse into one value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResourceStatus {
    /// No instance view yet; the container is still initializing.
    Pending,
    /// The container reports a non-terminal state (e.g. `"Running"`, `"Waiting"`).
    Running(String),
    /// The container finished executing and may be deleted.
    Terminated,
}

impl ResourceStatus {
    /// Map an optional provider state string onto a status.
    pub fn from_state(state: Option<&str>) -> Self {
        match state {
            None => ResourceStatus::Pending,
            Some(TERMINATED_STATE) => ResourceStatus::Terminated,
            Some(other) => ResourceStatus::Running(other.to_string()),
        }
    }

    #[inline]
    pub fn is_terminated(&self) -> bool {
        matches!(self, ResourceStatus::Terminated)
    }
}
