use serde::{Deserialize, Serialize};

use crate::{ResourceName, RunnerEnv};

/// Everything that identifies and parameterizes one runner.
///
/// Produced by `RunnerSpecBuilder`; deterministic for fixed inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunnerSpec {
    /// Remote container group name (`<prefix>-<batch_id>-<runner_id>`).
    pub resource_name: ResourceName,
    /// Command line executed as the container entrypoint.
    pub command: Vec<String>,
    /// Environment bindings consumed by the bootstrap procedure.
    pub env: RunnerEnv,
}
