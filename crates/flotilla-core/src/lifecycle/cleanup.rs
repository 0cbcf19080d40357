use flotilla_model::RunnerState;
use tracing::{info, instrument};

use crate::{
    batch::BatchContext,
    error::CoreError,
    lifecycle::{PendingOp, sweep_until_done},
    pacing::{Pacing, Phase},
};

/// Wait until every delete handle is done.
///
/// A delete that completes with an error aborts the wait and surfaces as
/// [`CoreError::Delete`].
#[instrument(level = "debug", skip_all, fields(deletes = deletes.len()))]
pub async fn await_deletes(
    deletes: Vec<PendingOp>,
    pacing: &Pacing,
    ctx: &BatchContext,
) -> Result<(), CoreError> {
    let count = deletes.len();
    let mut pacer = ctx.pacer(Phase::Cleanup, &pacing.cleanup);

    let sweeps = sweep_until_done(
        deletes,
        &mut pacer,
        ctx,
        RunnerState::Deleted,
        |name, source| CoreError::Delete { name, source },
    )
    .await?;

    info!(target: "flotilla.core.cleanup", deleted = count, sweeps, "all deletes acknowledged");
    Ok(())
}
