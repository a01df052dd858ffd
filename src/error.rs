//! Error types for the resource client and the action layer.
//!
//! [`ClientError`] is what a remote call fails with. [`ActionError`] is
//! what every action returns; it wraps client and validation failures and
//! adds the bulk-specific cases.
//!
//! # Error Code Ranges
//!
//! | Range     | Category                     |
//! |-----------|------------------------------|
//! | 1000–1999 | Validation (no remote call)  |
//! | 2000–2999 | Local state conflict         |
//! | 3000–3999 | Remote call failure          |
//! | 4000–4999 | Bulk batch failure           |

use crate::domain::{BatchId, BulkOperation, IncidentPk};

/// Failure of a single remote call.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The backend answered with a non-success status.
    #[error("backend returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, as text.
        body: String,
    },

    /// The request never produced a response (connect, timeout, TLS).
    #[error("transport error: {0}")]
    Transport(String),

    /// The response body could not be decoded.
    #[error("could not decode response: {0}")]
    Decode(String),

    /// The request URL could not be built.
    #[error("invalid request url: {0}")]
    InvalidUrl(String),

    /// The request body could not be encoded.
    #[error("could not encode request: {0}")]
    Encode(String),
}

impl ClientError {
    /// Returns the HTTP status for [`ClientError::Status`].
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            Self::Status {
                status: status.as_u16(),
                body: err.to_string(),
            }
        } else {
            Self::Transport(err.to_string())
        }
    }
}

impl From<url::ParseError> for ClientError {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidUrl(err.to_string())
    }
}

/// Input rejected before any remote call is issued.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A ticket URL that is neither empty nor an absolute URL.
    #[error("invalid ticket url {url:?}: {reason}")]
    InvalidTicketUrl {
        /// The rejected input.
        url: String,
        /// Parser message.
        reason: String,
    },

    /// A tag that is not of the form `key=value`.
    #[error("invalid tag {0:?}: expected key=value")]
    InvalidTag(String),
}

/// A bulk batch that stopped at its first failing incident.
///
/// Incidents before `failed_pk` succeeded remotely and their store
/// transitions were applied; their results are not returned.
#[derive(Debug, thiserror::Error)]
#[error(
    "bulk {operation} (batch {batch_id}) failed at incident {failed_pk} after {completed} succeeded: {source}"
)]
pub struct BulkFailure {
    /// Batch identifier.
    pub batch_id: BatchId,
    /// Operation of the batch.
    pub operation: BulkOperation,
    /// Incident whose remote call failed.
    pub failed_pk: IncidentPk,
    /// Number of incidents that succeeded before the failure.
    pub completed: usize,
    /// The original remote failure.
    #[source]
    pub source: ClientError,
}

/// Error returned by every action.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    /// The remote call was rejected.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Input failed validation; no remote call was made.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Another bulk batch is still running; no remote call was made.
    #[error("bulk batch {batch_id} is already running")]
    BulkInProgress {
        /// The batch that holds the bulk slot.
        batch_id: BatchId,
    },

    /// A bulk batch stopped at its first failure.
    #[error(transparent)]
    Bulk(#[from] Box<BulkFailure>),
}

impl ActionError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::Validation(ValidationError::InvalidTicketUrl { .. }) => 1001,
            Self::Validation(ValidationError::InvalidTag(_)) => 1002,
            Self::BulkInProgress { .. } => 2001,
            Self::Client(ClientError::Status { .. }) => 3001,
            Self::Client(ClientError::Transport(_)) => 3002,
            Self::Client(ClientError::Decode(_)) => 3003,
            Self::Client(ClientError::InvalidUrl(_)) => 3004,
            Self::Client(ClientError::Encode(_)) => 3005,
            Self::Bulk(_) => 4001,
        }
    }

    /// Returns the underlying remote failure, looking through bulk
    /// failures.
    #[must_use]
    pub fn client_error(&self) -> Option<&ClientError> {
        match self {
            Self::Client(err) => Some(err),
            Self::Bulk(failure) => Some(&failure.source),
            Self::Validation(_) | Self::BulkInProgress { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bulk_failure_message_names_the_incident() {
        let err = ActionError::from(Box::new(BulkFailure {
            batch_id: BatchId::new(),
            operation: BulkOperation::Close,
            failed_pk: IncidentPk::new(2),
            completed: 1,
            source: ClientError::Status {
                status: 500,
                body: "boom".to_string(),
            },
        }));
        let msg = err.to_string();
        assert!(msg.contains("bulk close"));
        assert!(msg.contains("incident 2"));
        assert!(msg.contains("after 1 succeeded"));
        assert_eq!(err.error_code(), 4001);
        assert_eq!(err.client_error().and_then(ClientError::status), Some(500));
    }

    #[test]
    fn codes_follow_ranges() {
        let validation = ActionError::from(ValidationError::InvalidTag("x".to_string()));
        assert_eq!(validation.error_code(), 1002);
        assert!(validation.client_error().is_none());

        let busy = ActionError::BulkInProgress {
            batch_id: BatchId::new(),
        };
        assert_eq!(busy.error_code(), 2001);

        let remote = ActionError::from(ClientError::Transport("refused".to_string()));
        assert_eq!(remote.error_code(), 3002);
    }
}
