mod container;
pub use container::{ContainerGroupSpec, OsType, ResourceLimits, RestartPolicy};

mod runner;
pub use runner::RunnerSpec;
