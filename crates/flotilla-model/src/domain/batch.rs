use serde::{Deserialize, Serialize};

/// The unit of work: a fixed-size batch of runners for one experiment.
///
/// Immutable once launch begins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchRun {
    pub experiment_id: String,
    pub batch_id: String,
    pub runner_count: u32,
}

impl BatchRun {
    pub fn new(
        experiment_id: impl Into<String>,
        batch_id: impl Into<String>,
        runner_count: u32,
    ) -> Self {
        Self {
            experiment_id: experiment_id.into(),
            batch_id: batch_id.into(),
            runner_count,
        }
    }

    /// Runner indices in launch order.
    pub fn runner_ids(&self) -> impl Iterator<Item = crate::RunnerId> {
        0..self.runner_count
    }
}
