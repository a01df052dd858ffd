//! Incidents as mirrored from the backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{IncidentPk, Tag};

/// Reference to the external system that reported an incident.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSystem {
    /// Source system identity.
    pub pk: i64,
    /// Display name.
    pub name: String,
    /// Source system type (e.g. `"nav"`).
    #[serde(default, rename = "type")]
    pub kind: String,
}

/// A monitored condition with an open/closed lifecycle.
///
/// Created externally by the monitored systems; this layer only flips
/// `open`, `acked` and `ticket_url`, and never deletes incidents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Incident {
    /// Server-assigned identity.
    pub pk: IncidentPk,
    /// When the condition started.
    pub start_time: DateTime<Utc>,
    /// When the condition ended, for stateful incidents that have ended.
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    /// Reporting system.
    pub source: SourceSystem,
    /// Incident id within the source system.
    #[serde(default)]
    pub source_incident_id: String,
    /// Link back to the source system.
    #[serde(default)]
    pub details_url: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Linked ticket, if any.
    #[serde(default, deserialize_with = "empty_as_none")]
    pub ticket_url: Option<String>,
    /// Whether the incident is open.
    pub open: bool,
    /// Whether the incident has an acknowledgement.
    #[serde(default)]
    pub acked: bool,
    /// Tags attached by the source system.
    #[serde(default)]
    pub tags: Vec<Tag>,
}

/// Server confirmation of a ticket-URL update.
///
/// An empty `ticket_url` means the link was cleared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketUrlBody {
    /// The ticket URL now stored on the incident.
    #[serde(default)]
    pub ticket_url: String,
}

impl TicketUrlBody {
    /// Returns the stored URL, or `None` if it was cleared.
    #[must_use]
    pub fn as_option(&self) -> Option<&str> {
        if self.ticket_url.is_empty() {
            None
        } else {
            Some(&self.ticket_url)
        }
    }
}

/// The backend sends `""` or `null` for "no ticket"; both map to `None`.
fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.filter(|s| !s.is_empty()))
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::TimeZone;

    use super::*;

    /// An open, unacknowledged incident with the given pk.
    pub(crate) fn incident(pk: i64) -> Incident {
        Incident {
            pk: IncidentPk::new(pk),
            start_time: Utc
                .with_ymd_and_hms(2020, 1, 14, 2, 4, 14)
                .single()
                .unwrap_or_default(),
            end_time: None,
            source: SourceSystem {
                pk: 1,
                name: "nav".to_string(),
                kind: "nav".to_string(),
            },
            source_incident_id: format!("src-{pk}"),
            details_url: String::new(),
            description: format!("incident {pk}"),
            ticket_url: None,
            open: true,
            acked: false,
            tags: vec![Tag::new("host", "db1")],
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_backend_payload() {
        let json = r#"{
            "pk": 12,
            "start_time": "2020-01-14T03:04:14.387000+01:00",
            "end_time": null,
            "source": {"pk": 1, "name": "NAV", "type": "nav"},
            "source_incident_id": "123",
            "details_url": "https://nav.example.org/123",
            "description": "link down",
            "ticket_url": "",
            "open": true,
            "acked": false,
            "tags": ["host=db1", "location=oslo"]
        }"#;
        let Ok(incident) = serde_json::from_str::<Incident>(json) else {
            panic!("payload should deserialize");
        };
        assert_eq!(incident.pk, IncidentPk::new(12));
        assert_eq!(incident.ticket_url, None);
        assert_eq!(incident.tags.len(), 2);
        assert_eq!(incident.start_time.to_rfc3339(), "2020-01-14T02:04:14.387+00:00");
    }

    #[test]
    fn empty_ticket_confirmation_means_cleared() {
        let body = TicketUrlBody {
            ticket_url: String::new(),
        };
        assert_eq!(body.as_option(), None);
    }
}
