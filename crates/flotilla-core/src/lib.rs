//! Batch lifecycle coordination for ephemeral remote runners.
//!
//! The flow is strictly one-directional:
//! [`RunnerSpecBuilder`] -> [`launch`] -> [`poll_until_empty`] -> [`await_deletes`].
//! [`run_batch`] strings the phases together; the poll and cleanup phases only run
//! when cleanup-on-complete is requested.

pub mod error;
pub use error::{ClientError, CoreError};

pub mod client;
pub use client::{
    HandleRef, Operation, OperationHandle, ReadyHandle, RemoteComputeClient, ResourceGroup,
};

pub mod builder;
pub use builder::{BOOTSTRAP_SCRIPT, DEFAULT_PREFIX, RunnerSpecBuilder};

pub mod pacing;
pub use pacing::{Pacer, Pacing, Phase, PollStrategy};

pub mod ledger;
pub use ledger::BatchLedger;

pub mod metrics;
pub use metrics::{MetricsBackend, MetricsHandle, NoopMetrics};

pub mod lifecycle;
pub use lifecycle::{PendingOp, await_deletes, launch, poll_until_empty};

pub mod batch;
pub use batch::{BatchConfig, BatchContext, BatchReport, ComputeParams, FailurePolicy, run_batch};
