use flotilla_model::{ModelError, ResourceName};
use thiserror::Error;

use crate::{client::Operation, pacing::Phase};

/// Failure reported by a [`RemoteComputeClient`](crate::RemoteComputeClient).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("rejected by provider ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("{operation} ended as {status}: {message}")]
    OperationFailed {
        operation: Operation,
        status: String,
        message: String,
    },
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),
    #[error("authentication failed: {0}")]
    Auth(String),
}

/// Failure surfaced by the batch coordinator.
///
/// Every variant is fatal for the batch invocation; resources created before the
/// failure are left for the caller to clean up (see [`BatchLedger`](crate::BatchLedger)).
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("create failed for {name}: {source}")]
    Create {
        name: ResourceName,
        #[source]
        source: ClientError,
    },
    #[error("status query failed for {name}: {source}")]
    StatusQuery {
        name: ResourceName,
        #[source]
        source: ClientError,
    },
    #[error("delete failed for {name}: {source}")]
    Delete {
        name: ResourceName,
        #[source]
        source: ClientError,
    },
    #[error("deadline exceeded during {phase} with {pending} resource(s) pending")]
    DeadlineExceeded { phase: Phase, pending: usize },
    #[error("cancelled during {phase} with {pending} resource(s) pending")]
    Cancelled { phase: Phase, pending: usize },
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Ledger(#[from] ModelError),
}

impl CoreError {
    /// Phase in which the error surfaced, if it belongs to one.
    pub fn phase(&self) -> Option<Phase> {
        match self {
            CoreError::Create { .. } => Some(Phase::Launch),
            CoreError::StatusQuery { .. } => Some(Phase::Termination),
            CoreError::Delete { .. } => Some(Phase::Cleanup),
            CoreError::DeadlineExceeded { phase, .. } | CoreError::Cancelled { phase, .. } => {
                Some(*phase)
            }
            CoreError::InvalidConfig(_) | CoreError::Ledger(_) => None,
        }
    }
}
