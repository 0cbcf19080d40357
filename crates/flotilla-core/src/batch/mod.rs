use std::{collections::BTreeSet, fmt, time::Duration};

use flotilla_model::{BatchRun, ResourceLimits, ResourceName, TimeoutSecs};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::{
    builder::DEFAULT_PREFIX,
    client::{RemoteComputeClient, ResourceGroup},
    error::CoreError,
    ledger::BatchLedger,
    lifecycle::{PendingOp, await_deletes, launch, poll_until_empty},
    metrics::{MetricsHandle, noop_metrics},
    pacing::{Pacer, Pacing, Phase, PollStrategy},
};

/// Default name of the single container inside each group.
pub const DEFAULT_CONTAINER_NAME: &str = "flotilla-container";

/// What to do with already-targeted resources when a create fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Surface the error and leave cleanup to the caller.
    #[default]
    Propagate,
    /// Issue best-effort deletes for every resource that may exist, then surface the error.
    Rollback,
}

/// Per-runner compute parameters shared by the whole batch.
#[derive(Clone)]
pub struct ComputeParams {
    pub image: String,
    pub limits: ResourceLimits,
    /// Database the bootstrap procedure reads from; bound as a secure value.
    pub db_uri: String,
    pub timeout: TimeoutSecs,
    pub raise_exception: bool,
    pub name_prefix: String,
    pub container_name: String,
}

impl ComputeParams {
    pub fn new(image: impl Into<String>, db_uri: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            limits: ResourceLimits::default(),
            db_uri: db_uri.into(),
            timeout: 0,
            raise_exception: false,
            name_prefix: DEFAULT_PREFIX.to_string(),
            container_name: DEFAULT_CONTAINER_NAME.to_string(),
        }
    }
}

impl fmt::Debug for ComputeParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComputeParams")
            .field("image", &self.image)
            .field("limits", &self.limits)
            .field("db_uri", &"<redacted>")
            .field("timeout", &self.timeout)
            .field("raise_exception", &self.raise_exception)
            .field("name_prefix", &self.name_prefix)
            .field("container_name", &self.container_name)
            .finish()
    }
}

/// Everything one batch invocation needs.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub batch: BatchRun,
    pub compute: ComputeParams,
    /// Wait for every runner to terminate and delete it.
    pub cleanup_on_complete: bool,
    pub failure_policy: FailurePolicy,
    pub pacing: Pacing,
}

impl BatchConfig {
    pub fn new(batch: BatchRun, compute: ComputeParams) -> Self {
        Self {
            batch,
            compute,
            cleanup_on_complete: false,
            failure_policy: FailurePolicy::default(),
            pacing: Pacing::default(),
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.batch.batch_id.is_empty() {
            return Err(CoreError::InvalidConfig("batch id is empty".into()));
        }
        if self.compute.image.is_empty() {
            return Err(CoreError::InvalidConfig("image is empty".into()));
        }
        if self.compute.name_prefix.is_empty() {
            return Err(CoreError::InvalidConfig("name prefix is empty".into()));
        }
        if !(self.compute.limits.cpu > 0.0 && self.compute.limits.memory_in_gb > 0.0) {
            return Err(CoreError::InvalidConfig(
                "cpu and memory requests must be positive".into(),
            ));
        }
        self.pacing.validate()
    }
}

/// Shared state and knobs for one batch run.
#[derive(Clone)]
pub struct BatchContext {
    pub ledger: BatchLedger,
    pub metrics: MetricsHandle,
    pub cancel: Option<CancellationToken>,
    pub deadline: Option<Instant>,
}

impl Default for BatchContext {
    fn default() -> Self {
        Self::new()
    }
}

impl BatchContext {
    pub fn new() -> Self {
        Self {
            ledger: BatchLedger::new(),
            metrics: noop_metrics(),
            cancel: None,
            deadline: None,
        }
    }

    pub fn with_metrics(mut self, metrics: MetricsHandle) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Bound every phase to end within `limit` from now.
    pub fn with_deadline_in(mut self, limit: Duration) -> Self {
        self.deadline = Some(Instant::now() + limit);
        self
    }

    pub fn pacer(&self, phase: Phase, strategy: &PollStrategy) -> Pacer {
        Pacer::new(phase, strategy)
            .with_deadline(self.deadline)
            .with_cancel(self.cancel.clone())
    }
}

/// Outcome of a successful batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Every resource a create was issued for.
    pub targeted: BTreeSet<ResourceName>,
    /// Resources observed terminated and deleted (empty without cleanup).
    pub deleted: BTreeSet<ResourceName>,
}

/// Launch a batch and, if requested, wait for every runner to terminate and delete it.
///
/// Returns normally only when every phase succeeded. On error, `ctx.ledger` shows
/// which resources may still exist.
#[instrument(
    level = "info",
    skip_all,
    fields(batch = %config.batch.batch_id, runners = config.batch.runner_count, cleanup = config.cleanup_on_complete)
)]
pub async fn run_batch<C>(
    client: &C,
    group: &ResourceGroup,
    config: &BatchConfig,
    ctx: &BatchContext,
) -> Result<BatchReport, CoreError>
where
    C: RemoteComputeClient + ?Sized,
{
    config.validate()?;

    let ctx = match (config.pacing.deadline, ctx.deadline) {
        (Some(limit), None) => ctx.clone().with_deadline_in(limit),
        _ => ctx.clone(),
    };
    let record = |e: CoreError| {
        if let Some(phase) = e.phase() {
            ctx.metrics.record_failure(phase);
        }
        e
    };

    let targeted = match launch(
        client,
        group,
        &config.batch,
        &config.compute,
        &config.pacing,
        &ctx,
    )
    .await
    {
        Ok(targeted) => targeted,
        Err(e) => {
            if config.failure_policy == FailurePolicy::Rollback {
                rollback(client, group, &config.pacing, &ctx).await;
            }
            return Err(record(e));
        }
    };

    let mut report = BatchReport {
        targeted,
        deleted: BTreeSet::new(),
    };

    if !config.cleanup_on_complete {
        info!(target: "flotilla.core.batch", "batch started; cleanup not requested");
        return Ok(report);
    }

    let mut tracked = report.targeted.clone();
    let deletes = poll_until_empty(client, group, &mut tracked, &config.pacing, &ctx)
        .await
        .map_err(record)?;
    report.deleted = deletes.iter().map(|op| op.name.clone()).collect();

    await_deletes(deletes, &config.pacing, &ctx)
        .await
        .map_err(record)?;

    info!(target: "flotilla.core.batch", deleted = report.deleted.len(), "batch complete");
    Ok(report)
}

/// Best-effort delete of every resource that may exist after a failed launch.
///
/// Skips the terminated-before-delete rule: the runners are abandoned. The wait
/// ignores the batch deadline and cancellation token, so a launch that failed with
/// `Cancelled` or `DeadlineExceeded` still has its deletes acknowledged.
async fn rollback<C>(client: &C, group: &ResourceGroup, pacing: &Pacing, ctx: &BatchContext)
where
    C: RemoteComputeClient + ?Sized,
{
    let names = ctx.ledger.possibly_live();
    warn!(target: "flotilla.core.batch", count = names.len(), "rolling back launched runners");

    let mut pending = Vec::with_capacity(names.len());
    for name in names {
        match client.delete(group, &name).await {
            Ok(handle) => pending.push(PendingOp::new(name, handle)),
            Err(e) => {
                warn!(target: "flotilla.core.batch", runner = %name, error = %e, "rollback delete rejected")
            }
        }
    }

    let mut pacer = Pacer::new(Phase::Cleanup, &pacing.cleanup);
    while !pending.is_empty() {
        let mut outstanding = Vec::with_capacity(pending.len());
        for mut op in pending {
            match op.probe().await {
                Ok(true) => {}
                Ok(false) => outstanding.push(op),
                Err(e) => {
                    warn!(target: "flotilla.core.batch", runner = %op.name, error = %e, "rollback delete failed")
                }
            }
        }
        pending = outstanding;

        if !pending.is_empty()
            && let Err(e) = pacer.pause(pending.len()).await
        {
            warn!(target: "flotilla.core.batch", error = %e, "rollback abandoned");
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> BatchConfig {
        BatchConfig::new(
            BatchRun::new("42", "b1", 2),
            ComputeParams::new("img:1", "postgres://secret@db/x"),
        )
    }

    #[test]
    fn default_config_is_valid() {
        assert!(config().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_fields() {
        let mut c = config();
        c.batch.batch_id.clear();
        assert!(matches!(c.validate(), Err(CoreError::InvalidConfig(_))));

        let mut c = config();
        c.compute.image.clear();
        assert!(c.validate().is_err());

        let mut c = config();
        c.compute.limits.cpu = 0.0;
        assert!(c.validate().is_err());

        let mut c = config();
        c.pacing.cleanup = PollStrategy::fixed(Duration::ZERO);
        assert!(c.validate().is_err());
    }

    #[test]
    fn debug_redacts_db_uri() {
        let out = format!("{:?}", config());
        assert!(!out.contains("secret"));
        assert!(out.contains("<redacted>"));
    }
}
