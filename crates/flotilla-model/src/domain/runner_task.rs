use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::{ModelError, ResourceName, RunnerId, RunnerState};

/// Local record of one runner in a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunnerTask {
    /// Runner index, unique within the batch.
    pub id: RunnerId,
    /// Remote container group name.
    pub resource_name: ResourceName,
    /// Current lifecycle state.
    pub state: RunnerState,
    #[serde(with = "time_serde")]
    pub updated_at: SystemTime,
    /// Last error reported by the provider (only set once `Failed`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunnerTask {
    pub fn new(id: RunnerId, resource_name: impl Into<ResourceName>) -> Self {
        Self {
            id,
            resource_name: resource_name.into(),
            state: RunnerState::Pending,
            updated_at: SystemTime::now(),
            error: None,
        }
    }

    /// Move forward to `next`, rejecting any regression or skipped step.
    pub fn advance(&mut self, next: RunnerState) -> Result<(), ModelError> {
        if !self.state.can_advance_to(next) {
            return Err(ModelError::IllegalTransition {
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        self.updated_at = SystemTime::now();
        Ok(())
    }

    /// Move to `Failed` and record the reason.
    pub fn fail(&mut self, reason: impl Into<String>) -> Result<(), ModelError> {
        self.advance(RunnerState::Failed)?;
        self.error = Some(reason.into());
        Ok(())
    }
}

mod time_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::{SystemTime, UNIX_EPOCH};

    pub fn serialize<S>(time: &SystemTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let since_epoch = time
            .duration_since(UNIX_EPOCH)
            .map_err(serde::ser::Error::custom)?;
        since_epoch.as_millis().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<SystemTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(UNIX_EPOCH + std::time::Duration::from_millis(millis))
    }
}
