use thiserror::Error;

use crate::RunnerState;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("illegal runner transition {from} -> {to}")]
    IllegalTransition { from: RunnerState, to: RunnerState },
    #[error("unknown runner: {0}")]
    UnknownRunner(String),
}
