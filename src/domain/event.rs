//! Immutable incident events.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::IncidentPk;

/// Kind of an incident event.
///
/// Serialized as the backend's three-letter code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    /// The monitored condition started.
    #[serde(rename = "STA")]
    IncidentStart,
    /// The monitored condition ended.
    #[serde(rename = "END")]
    IncidentEnd,
    /// A user closed the incident.
    #[serde(rename = "CLO")]
    Close,
    /// A user reopened the incident.
    #[serde(rename = "REO")]
    Reopen,
    /// A user acknowledged the incident.
    #[serde(rename = "ACK")]
    Acknowledge,
    /// Free-form event.
    #[serde(rename = "OTH")]
    Other,
    /// Stateless incident marker.
    #[serde(rename = "LES")]
    Stateless,
}

impl EventType {
    /// Returns the wire code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::IncidentStart => "STA",
            Self::IncidentEnd => "END",
            Self::Close => "CLO",
            Self::Reopen => "REO",
            Self::Acknowledge => "ACK",
            Self::Other => "OTH",
            Self::Stateless => "LES",
        }
    }

    /// Returns the human-readable name.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::IncidentStart => "Incident start",
            Self::IncidentEnd => "Incident end",
            Self::Close => "Close",
            Self::Reopen => "Reopen",
            Self::Acknowledge => "Acknowledge",
            Self::Other => "Other",
            Self::Stateless => "Stateless",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// An append-only record of something that happened to an incident.
///
/// Events are never edited after creation; `timestamp` is the
/// authoritative ordering key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Server-assigned identity.
    pub pk: i64,
    /// Incident the event belongs to.
    pub incident: IncidentPk,
    /// Identity of the user or system that produced the event.
    pub actor: i64,
    /// When the event happened.
    pub timestamp: DateTime<Utc>,
    /// Event kind.
    #[serde(rename = "type", with = "event_type_field")]
    pub kind: EventType,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
}

/// The backend nests the type as `{"value": "ACK", "display": "…"}`;
/// a bare code is accepted too.
mod event_type_field {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::EventType;

    #[derive(Serialize)]
    struct Nested {
        value: EventType,
        display: &'static str,
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Incoming {
        Nested { value: EventType },
        Bare(EventType),
    }

    pub(super) fn serialize<S: Serializer>(kind: &EventType, s: S) -> Result<S::Ok, S::Error> {
        Nested {
            value: *kind,
            display: kind.display_name(),
        }
        .serialize(s)
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<EventType, D::Error> {
        Ok(match Incoming::deserialize(d)? {
            Incoming::Nested { value } | Incoming::Bare(value) => value,
        })
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// An event of the given kind on incident `pk` at `timestamp`.
    pub(crate) fn event(pk: i64, kind: EventType, timestamp: &str) -> Event {
        Event {
            pk,
            incident: IncidentPk::new(pk),
            actor: 1,
            timestamp: timestamp.parse().unwrap_or_default(),
            kind,
            description: String::new(),
        }
    }
}
