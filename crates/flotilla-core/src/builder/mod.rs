mod bootstrap;
pub use bootstrap::{BOOTSTRAP_SCRIPT, bootstrap_command};

use flotilla_model::{EnvVar, ResourceName, RunnerEnv, RunnerId, RunnerSpec, TimeoutSecs};

/// Default resource name prefix.
pub const DEFAULT_PREFIX: &str = "flotilla-runner";

pub const ENV_EXPERIMENT_ID: &str = "EXPERIMENT_ID";
pub const ENV_RUNNER_ID: &str = "RUNNER_ID";
pub const ENV_DB_URL: &str = "DB_URL";
pub const ENV_TIMEOUT: &str = "TIMEOUT";
pub const ENV_RAISE_EXCEPTION: &str = "RAISE_EXCEPTION";

/// Pure builder for per-runner specs.
#[derive(Debug, Clone)]
pub struct RunnerSpecBuilder {
    prefix: String,
}

impl Default for RunnerSpecBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RunnerSpecBuilder {
    #[inline]
    pub fn new() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
        }
    }

    #[inline]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    #[inline]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// `<prefix>-<batch_id>-<runner_id>`.
    pub fn resource_name(&self, batch_id: &str, runner_id: RunnerId) -> ResourceName {
        format!("{}-{}-{}", self.prefix, batch_id, runner_id)
    }

    /// Build the `RunnerSpec` for one runner.
    ///
    /// `raise_exception` is rendered the way the in-container Python reads it
    /// (`"True"` / `"False"`); `db_uri` is bound as a secure value.
    pub fn build(
        &self,
        batch_id: &str,
        runner_id: RunnerId,
        experiment_id: &str,
        db_uri: &str,
        timeout: TimeoutSecs,
        raise_exception: bool,
    ) -> RunnerSpec {
        let mut env = RunnerEnv::new();
        env.push(EnvVar::plain(ENV_EXPERIMENT_ID, experiment_id));
        env.push(EnvVar::plain(ENV_RUNNER_ID, runner_id.to_string()));
        env.push(EnvVar::secure(ENV_DB_URL, db_uri));
        env.push(EnvVar::plain(ENV_TIMEOUT, timeout.to_string()));
        env.push(EnvVar::plain(
            ENV_RAISE_EXCEPTION,
            if raise_exception { "True" } else { "False" },
        ));

        RunnerSpec {
            resource_name: self.resource_name(batch_id, runner_id),
            command: bootstrap_command(),
            env,
        }
    }
}
