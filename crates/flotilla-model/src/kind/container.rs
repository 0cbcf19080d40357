use serde::{Deserialize, Serialize};

use crate::{RunnerEnv, RunnerSpec};

/// Resource requests for a single container.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceLimits {
    /// Requested CPU cores.
    pub cpu: f64,
    /// Requested memory in GB.
    pub memory_in_gb: f64,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            cpu: 1.0,
            memory_in_gb: 1.5,
        }
    }
}

/// Container group restart policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RestartPolicy {
    Always,
    OnFailure,
    /// Runners are one-shot: once the script exits the group stays terminated.
    #[default]
    Never,
}

/// OS family declared for the container group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OsType {
    #[default]
    Linux,
    Windows,
}

/// Provider-neutral description of one container group to create.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerGroupSpec {
    /// Name of the single container inside the group.
    pub container_name: String,
    /// Image reference (e.g. `"myregistry.azurecr.io/runner:latest"`).
    pub image: String,
    /// Entrypoint override.
    pub command: Vec<String>,
    /// Environment bindings, secrets flagged.
    pub env: RunnerEnv,
    pub limits: ResourceLimits,
    pub restart_policy: RestartPolicy,
    pub os_type: OsType,
}

impl ContainerGroupSpec {
    /// Wrap a runner spec into a one-container group with the given image and sizing.
    pub fn for_runner(
        container_name: impl Into<String>,
        image: impl Into<String>,
        limits: ResourceLimits,
        runner: &RunnerSpec,
    ) -> Self {
        Self {
            container_name: container_name.into(),
            image: image.into(),
            command: runner.command.clone(),
            env: runner.env.clone(),
            limits,
            restart_policy: RestartPolicy::Never,
            os_type: OsType::Linux,
        }
    }
}
