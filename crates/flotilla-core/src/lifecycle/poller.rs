use std::collections::{BTreeSet, HashMap};

use flotilla_model::{ResourceName, ResourceStatus, RunnerState};
use tracing::{debug, info, instrument, trace, warn};

use crate::{
    batch::BatchContext,
    client::{RemoteComputeClient, ResourceGroup},
    error::CoreError,
    lifecycle::PendingOp,
    pacing::{Pacing, Phase},
};

/// Poll `tracked` until every resource has terminated, deleting each one in the
/// cycle it is first seen terminated.
///
/// Each cycle queries every tracked name once. `Pending` (no instance view yet) and
/// non-terminal states leave the name in place. Terminated names get their delete
/// issued immediately and are dropped from `tracked` once the sweep ends, so no
/// name is queried again after its delete. A failed status query is tolerated up to
/// `pacing.tolerated_query_errors` consecutive times per resource.
///
/// Without a deadline or cancellation token this never returns while some resource
/// never reports the terminal state.
///
/// Names not in the ledger, or left in a state other than `Started` by an aborted
/// launch, are adopted first; this is how a caller drives cleanup of
/// [`BatchLedger::possibly_live`](crate::BatchLedger::possibly_live) after a failure.
///
/// Returns the outstanding delete operations, in issue order.
#[instrument(level = "debug", skip_all, fields(group = %group.name, tracked = tracked.len()))]
pub async fn poll_until_empty<C>(
    client: &C,
    group: &ResourceGroup,
    tracked: &mut BTreeSet<ResourceName>,
    pacing: &Pacing,
    ctx: &BatchContext,
) -> Result<Vec<PendingOp>, CoreError>
where
    C: RemoteComputeClient + ?Sized,
{
    for name in tracked.iter() {
        let state = ctx.ledger.get(name).map(|t| t.state);
        if state != Some(RunnerState::Started) {
            ctx.ledger.adopt(name.clone());
        }
        ctx.ledger.advance(name, RunnerState::Polling)?;
    }

    let mut pacer = ctx.pacer(Phase::Termination, &pacing.termination);
    let mut query_failures: HashMap<ResourceName, u32> = HashMap::new();
    let mut deletes = Vec::with_capacity(tracked.len());
    let mut cycle = 0u32;

    pacer.check(tracked.len())?;

    while !tracked.is_empty() {
        cycle += 1;
        ctx.metrics.record_poll_cycle();

        let mut terminated = Vec::new();
        for name in tracked.iter() {
            let status = match client.get_status(group, name).await {
                Ok(status) => {
                    query_failures.remove(name);
                    status
                }
                Err(source) => {
                    let failures = query_failures.entry(name.clone()).or_insert(0);
                    *failures += 1;
                    if *failures > pacing.tolerated_query_errors {
                        return Err(CoreError::StatusQuery {
                            name: name.clone(),
                            source,
                        });
                    }
                    warn!(
                        target: "flotilla.core.poll",
                        runner = %name, cycle, failures = *failures, error = %source,
                        "status query failed; retrying next cycle"
                    );
                    continue;
                }
            };

            match status {
                ResourceStatus::Terminated => {
                    ctx.ledger.advance(name, RunnerState::Terminated)?;
                    ctx.ledger.advance(name, RunnerState::Deleting)?;

                    let handle = match client.delete(group, name).await {
                        Ok(handle) => handle,
                        Err(source) => {
                            if let Err(e) = ctx.ledger.fail(name, source.to_string()) {
                                warn!(target: "flotilla.core.poll", runner = %name, error = %e, "ledger rejected failure");
                            }
                            return Err(CoreError::Delete {
                                name: name.clone(),
                                source,
                            });
                        }
                    };
                    ctx.metrics.record_delete();
                    debug!(target: "flotilla.core.poll", runner = %name, cycle, "delete issued");

                    deletes.push(PendingOp::new(name.clone(), handle));
                    terminated.push(name.clone());
                }
                ResourceStatus::Pending => {
                    trace!(target: "flotilla.core.poll", runner = %name, cycle, "no instance view yet");
                }
                ResourceStatus::Running(state) => {
                    trace!(target: "flotilla.core.poll", runner = %name, cycle, %state, "still running");
                }
            }
        }

        for name in &terminated {
            tracked.remove(name);
        }

        if !tracked.is_empty() {
            pacer.pause(tracked.len()).await?;
        }
    }

    info!(target: "flotilla.core.poll", cycles = cycle, deletes = deletes.len(), "all runners terminated");
    Ok(deletes)
}
