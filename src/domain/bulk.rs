//! Bulk-operation state machine.
//!
//! A bulk batch moves `Idle → Running → (Succeeded | Failed)`. The store
//! holds exactly one [`BulkState`]; "a bulk operation is in flight" is
//! precisely `state.is_running()`.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{BatchId, IncidentPk};

/// Which bulk action a batch performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BulkOperation {
    /// Acknowledge every incident.
    Acknowledge,
    /// Set the same ticket URL on every incident.
    AddTicketUrl,
    /// Reopen every incident.
    Reopen,
    /// Close every incident.
    Close,
}

impl BulkOperation {
    /// Returns the operation name as a static string slice.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Acknowledge => "acknowledge",
            Self::AddTicketUrl => "add_ticket_url",
            Self::Reopen => "reopen",
            Self::Close => "close",
        }
    }
}

impl fmt::Display for BulkOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State of the (single) bulk slot.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum BulkState {
    /// No batch has run yet.
    #[default]
    Idle,
    /// A batch is in flight.
    Running {
        /// Batch identifier.
        batch_id: BatchId,
        /// Operation being applied.
        operation: BulkOperation,
        /// Number of incidents in the batch.
        total: usize,
        /// When the batch entered `Running`.
        started_at: DateTime<Utc>,
    },
    /// The last batch completed for every incident.
    Succeeded {
        /// Batch identifier.
        batch_id: BatchId,
        /// Operation that was applied.
        operation: BulkOperation,
        /// Number of incidents processed.
        completed: usize,
    },
    /// The last batch stopped early.
    Failed {
        /// Batch identifier.
        batch_id: BatchId,
        /// Operation that was applied.
        operation: BulkOperation,
        /// Number of incidents that succeeded before the stop.
        completed: usize,
        /// Incident whose remote call failed. `None` if the batch was
        /// dropped before finishing.
        failed_pk: Option<IncidentPk>,
    },
}

impl BulkState {
    /// Returns `true` while a batch is in flight.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        matches!(self, Self::Running { .. })
    }

    /// Returns the batch this state belongs to, if any.
    #[must_use]
    pub const fn batch_id(&self) -> Option<BatchId> {
        match self {
            Self::Idle => None,
            Self::Running { batch_id, .. }
            | Self::Succeeded { batch_id, .. }
            | Self::Failed { batch_id, .. } => Some(*batch_id),
        }
    }

    /// Returns the state name as a static string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running { .. } => "running",
            Self::Succeeded { .. } => "succeeded",
            Self::Failed { .. } => "failed",
        }
    }
}
