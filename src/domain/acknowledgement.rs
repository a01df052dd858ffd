//! Acknowledgements and their display ordering.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Event;

/// An ACKNOWLEDGE event plus an optional expiration.
///
/// `expiration == None` means the acknowledgement never expires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acknowledgement {
    /// Server-assigned identity.
    pub pk: i64,
    /// The underlying ACKNOWLEDGE event.
    pub event: Event,
    /// When the acknowledgement stops counting as active.
    #[serde(default)]
    pub expiration: Option<DateTime<Utc>>,
}

/// Where an acknowledgement stands relative to its expiration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryStatus {
    /// No expiration set.
    Never,
    /// Still active; expires at the given time.
    Expires(DateTime<Utc>),
    /// Expired at the given time.
    Expired(DateTime<Utc>),
}

impl Acknowledgement {
    /// Classifies the expiration relative to `now`.
    #[must_use]
    pub fn expiry_status(&self, now: DateTime<Utc>) -> ExpiryStatus {
        match self.expiration {
            None => ExpiryStatus::Never,
            Some(at) if at < now => ExpiryStatus::Expired(at),
            Some(at) => ExpiryStatus::Expires(at),
        }
    }

    /// Returns `true` unless the acknowledgement has expired.
    #[must_use]
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        !matches!(self.expiry_status(now), ExpiryStatus::Expired(_))
    }
}

/// Request body for creating an acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcknowledgementBody {
    /// Why the incident was acknowledged.
    pub description: String,
    /// Optional expiration; `None` never expires.
    #[serde(default)]
    pub expiration: Option<DateTime<Utc>>,
}

impl AcknowledgementBody {
    /// Creates a body that never expires.
    #[must_use]
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            expiration: None,
        }
    }

    /// Sets the expiration.
    #[must_use]
    pub fn expiring_at(mut self, expiration: DateTime<Utc>) -> Self {
        self.expiration = Some(expiration);
        self
    }
}

/// Display order of two acknowledgements.
///
/// Newest event first. On equal timestamps the later expiration comes
/// first, and a missing expiration counts as later than any date.
#[must_use]
pub fn display_order(a: &Acknowledgement, b: &Acknowledgement) -> Ordering {
    b.event
        .timestamp
        .cmp(&a.event.timestamp)
        .then_with(|| match (a.expiration, b.expiration) {
            (Some(x), Some(y)) => y.cmp(&x),
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
}

/// Sorts acknowledgements into [`display_order`]. Stable.
pub fn sort_for_display(acks: &mut [Acknowledgement]) {
    acks.sort_by(display_order);
}
