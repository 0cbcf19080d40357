mod env;
pub use env::{EnvVar, RunnerEnv};

mod batch;
pub use batch::BatchRun;

mod runner_state;
pub use runner_state::RunnerState;

mod runner_task;
pub use runner_task::RunnerTask;

mod resource_status;
pub use resource_status::{ResourceStatus, TERMINATED_STATE};

/// Name of a remote container group.
///
/// Derived as `<prefix>-<batch_id>-<runner_id>`; unique among live resources.
pub type ResourceName = String;

/// Index of a runner inside its batch, in `0..runner_count`.
pub type RunnerId = u32;

/// Runner-side timeout in seconds, forwarded verbatim to the container.
pub type TimeoutSecs = u64;
