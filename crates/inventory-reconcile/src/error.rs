use inventory_io::{OpenError, SaveError};
use inventory_model::Column;
use serde::Serialize;
use thiserror::Error;

use crate::allocator::AllocationError;

/// Problems with the inputs of a run. The run is aborted; nothing is committed.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("no file was selected")]
    Cancelled,
    #[error(transparent)]
    Open(#[from] OpenError),
    #[error("column {column} should hold `{expected}` but its header is `{found}`")]
    MissingColumn {
        column: Column,
        expected: String,
        found: String,
    },
}

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error(transparent)]
    Input(#[from] InputError),
    /// Scan-out needs a location; the event is rejected and the session continues.
    #[error("a location is required before scanning items out")]
    LocationRequired,
    /// The final save failed. No changes were committed and the in-memory
    /// sheet must be discarded.
    #[error("failed to save the inventory, no changes were committed: {0}")]
    PersistFailure(#[source] SaveError),
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<OpenError> for ReconcileError {
    fn from(err: OpenError) -> Self {
        ReconcileError::Input(InputError::Open(err))
    }
}

impl From<AllocationError> for ReconcileError {
    fn from(err: AllocationError) -> Self {
        ReconcileError::Internal(err.to_string())
    }
}

/// Non-fatal problems recorded during a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SessionWarning {
    /// The key is a known identifier but no sheet row is on record for it.
    #[error("{code} found in inventory set, but row could not be located")]
    UnlocatableRow { code: String },
    /// The scanned code carries no digits to match on.
    #[error("{code} has no digits after its last letter; it cannot match any row")]
    UnmatchableCode { code: String },
}
