//! The three waiting phases of a batch.
//!
//! All waiting is a cooperative sweep: probe every outstanding item once, then pause
//! via the phase's [`Pacer`]. The first failure aborts the sweep for the whole batch.

mod cleanup;
mod launch;
mod poller;

pub use cleanup::await_deletes;
pub use launch::launch;
pub use poller::poll_until_empty;

use std::fmt;

use flotilla_model::{ResourceName, RunnerState};
use tracing::{debug, warn};

use crate::{
    batch::BatchContext,
    client::HandleRef,
    error::{ClientError, CoreError},
    pacing::Pacer,
};

/// An outstanding remote operation on one resource.
pub struct PendingOp {
    pub name: ResourceName,
    handle: HandleRef,
}

impl PendingOp {
    pub fn new(name: impl Into<ResourceName>, handle: HandleRef) -> Self {
        Self {
            name: name.into(),
            handle,
        }
    }

    /// Probe the underlying handle once.
    pub(crate) async fn probe(&mut self) -> Result<bool, ClientError> {
        self.handle.done().await
    }
}

impl fmt::Debug for PendingOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingOp").field("name", &self.name).finish_non_exhaustive()
    }
}

/// Sweep `ops` until every handle is done; returns the number of sweeps.
///
/// Completed runners advance to `completed`. A failed handle marks its runner
/// `Failed` and ends the sweep with `on_error`.
pub(crate) async fn sweep_until_done<F>(
    mut ops: Vec<PendingOp>,
    pacer: &mut Pacer,
    ctx: &BatchContext,
    completed: RunnerState,
    on_error: F,
) -> Result<u32, CoreError>
where
    F: Fn(ResourceName, ClientError) -> CoreError,
{
    let phase = pacer.phase();
    let mut sweeps = 0u32;

    while !ops.is_empty() {
        sweeps += 1;
        ctx.metrics.record_sweep(phase);

        let mut outstanding = Vec::with_capacity(ops.len());
        for mut op in ops {
            match op.probe().await {
                Ok(true) => {
                    debug!(target: "flotilla.core.sweep", %phase, runner = %op.name, sweep = sweeps, "operation done");
                    ctx.ledger.advance(&op.name, completed)?;
                }
                Ok(false) => outstanding.push(op),
                Err(source) => {
                    if let Err(e) = ctx.ledger.fail(&op.name, source.to_string()) {
                        warn!(target: "flotilla.core.sweep", runner = %op.name, error = %e, "ledger rejected failure");
                    }
                    return Err(on_error(op.name, source));
                }
            }
        }
        ops = outstanding;

        if !ops.is_empty() {
            pacer.pause(ops.len()).await?;
        }
    }

    Ok(sweeps)
}
