use std::collections::BTreeSet;

use flotilla_model::{BatchRun, ContainerGroupSpec, ResourceName, RunnerState};
use tracing::{debug, info, instrument, warn};

use crate::{
    batch::{BatchContext, ComputeParams},
    builder::RunnerSpecBuilder,
    client::{RemoteComputeClient, ResourceGroup},
    error::CoreError,
    lifecycle::{PendingOp, sweep_until_done},
    pacing::{Pacing, Phase},
};

/// Issue one create per runner, then wait until every create handle is done.
///
/// All requests are issued before the first wait. The first failure (a rejected
/// request or a handle that completes with an error) aborts the call; creates
/// already in flight are neither cancelled nor rolled back here.
///
/// Returns every targeted resource name.
#[instrument(
    level = "debug",
    skip_all,
    fields(batch = %batch.batch_id, experiment = %batch.experiment_id, runners = batch.runner_count)
)]
pub async fn launch<C>(
    client: &C,
    group: &ResourceGroup,
    batch: &BatchRun,
    compute: &ComputeParams,
    pacing: &Pacing,
    ctx: &BatchContext,
) -> Result<BTreeSet<ResourceName>, CoreError>
where
    C: RemoteComputeClient + ?Sized,
{
    let builder = RunnerSpecBuilder::new().with_prefix(compute.name_prefix.as_str());

    let specs: Vec<_> = batch
        .runner_ids()
        .map(|runner_id| {
            let spec = builder.build(
                &batch.batch_id,
                runner_id,
                &batch.experiment_id,
                &compute.db_uri,
                compute.timeout,
                compute.raise_exception,
            );
            ctx.ledger.register(runner_id, spec.resource_name.clone());
            spec
        })
        .collect();

    let mut targeted = BTreeSet::new();
    let mut outstanding = Vec::with_capacity(specs.len());

    for spec in &specs {
        let name = spec.resource_name.clone();
        let group_spec = ContainerGroupSpec::for_runner(
            compute.container_name.as_str(),
            compute.image.as_str(),
            compute.limits,
            spec,
        );

        ctx.ledger.advance(&name, RunnerState::Creating)?;
        targeted.insert(name.clone());

        match client.create(group, &name, &group_spec).await {
            Ok(handle) => {
                ctx.metrics.record_create();
                debug!(target: "flotilla.core.launch", runner = %name, "create issued");
                outstanding.push(PendingOp::new(name, handle));
            }
            Err(source) => {
                if let Err(e) = ctx.ledger.fail(&name, source.to_string()) {
                    warn!(target: "flotilla.core.launch", runner = %name, error = %e, "ledger rejected failure");
                }
                return Err(CoreError::Create { name, source });
            }
        }
    }

    info!(
        target: "flotilla.core.launch",
        issued = outstanding.len(),
        "create requests issued; waiting for completion"
    );

    let mut pacer = ctx.pacer(Phase::Launch, &pacing.launch);
    let sweeps = sweep_until_done(
        outstanding,
        &mut pacer,
        ctx,
        RunnerState::Started,
        |name, source| CoreError::Create { name, source },
    )
    .await?;

    info!(target: "flotilla.core.launch", runners = targeted.len(), sweeps, "batch launched");
    Ok(targeted)
}
