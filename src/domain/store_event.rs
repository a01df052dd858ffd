//! Change notifications emitted by the domain store.
//!
//! Every applied transition produces one [`StoreEvent`], published through
//! the [`super::EventBus`] so views can refresh the slice that changed.

use serde::Serialize;

use super::{BulkState, FilterPk, IncidentPk};

/// A change to the store's canonical state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum StoreEvent {
    /// A filter was inserted.
    FilterCreated {
        /// Filter identity.
        pk: FilterPk,
    },

    /// A filter was replaced (or re-inserted).
    FilterUpdated {
        /// Filter identity.
        pk: FilterPk,
    },

    /// A filter was removed.
    FilterDeleted {
        /// Filter identity.
        pk: FilterPk,
    },

    /// The filter slice was replaced wholesale.
    FiltersReplaced {
        /// Number of filters now held.
        count: usize,
    },

    /// An incident was inserted or replaced.
    IncidentUpserted {
        /// Incident identity.
        pk: IncidentPk,
    },

    /// The incident slice was replaced wholesale.
    IncidentsReplaced {
        /// Number of incidents now held.
        count: usize,
    },

    /// An incident was closed or reopened.
    IncidentOpenChanged {
        /// Incident identity.
        pk: IncidentPk,
        /// New `open` flag.
        open: bool,
    },

    /// An incident was marked acknowledged.
    IncidentAcknowledged {
        /// Incident identity.
        pk: IncidentPk,
    },

    /// An incident's ticket URL was set or cleared.
    TicketUrlChanged {
        /// Incident identity.
        pk: IncidentPk,
        /// New ticket URL, `None` when cleared.
        ticket_url: Option<String>,
    },

    /// The bulk slot changed state.
    BulkStateChanged {
        /// New state.
        state: BulkState,
    },
}

impl StoreEvent {
    /// Returns the incident this event concerns, if any.
    #[must_use]
    pub fn incident_pk(&self) -> Option<IncidentPk> {
        match self {
            Self::IncidentUpserted { pk }
            | Self::IncidentOpenChanged { pk, .. }
            | Self::IncidentAcknowledged { pk }
            | Self::TicketUrlChanged { pk, .. } => Some(*pk),
            _ => None,
        }
    }

    /// Returns the event type as a static string slice.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::FilterCreated { .. } => "filter_created",
            Self::FilterUpdated { .. } => "filter_updated",
            Self::FilterDeleted { .. } => "filter_deleted",
            Self::FiltersReplaced { .. } => "filters_replaced",
            Self::IncidentUpserted { .. } => "incident_upserted",
            Self::IncidentsReplaced { .. } => "incidents_replaced",
            Self::IncidentOpenChanged { .. } => "incident_open_changed",
            Self::IncidentAcknowledged { .. } => "incident_acknowledged",
            Self::TicketUrlChanged { .. } => "ticket_url_changed",
            Self::BulkStateChanged { .. } => "bulk_state_changed",
        }
    }
}
