//! Type-safe identifiers.
//!
//! [`FilterPk`] and [`IncidentPk`] wrap the server-assigned integer
//! primary keys so a filter key can never be passed where an incident key
//! is expected. [`BatchId`] is a client-generated UUID v4 tagging one bulk
//! batch in logs, events, and errors.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! server_pk {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wraps a raw server primary key.
            #[must_use]
            pub const fn new(raw: i64) -> Self {
                Self(raw)
            }

            /// Returns the raw primary key.
            #[must_use]
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(raw: i64) -> Self {
                Self(raw)
            }
        }
    };
}

server_pk!(
    /// Server-assigned identity of a saved filter.
    ///
    /// Only a persisted [`super::Filter`] carries one; drafts do not.
    FilterPk
);

server_pk!(
    /// Server-assigned identity of an incident. Immutable once assigned.
    IncidentPk
);

/// Identifier of one bulk batch.
///
/// Generated when a batch enters `Running` and carried by every bulk
/// state, store event, and bulk error of that batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchId(uuid::Uuid);

impl BatchId {
    /// Creates a new random `BatchId` (UUID v4).
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for BatchId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
