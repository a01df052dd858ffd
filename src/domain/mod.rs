//! Domain layer: entities, the domain store, and its change feed.
//!
//! This module contains the client-side model of the dashboard: filters,
//! incidents, events and acknowledgements as received from the backend,
//! the [`DomainStore`] that owns their canonical copies, the bulk-operation
//! state machine, and the [`EventBus`] that announces every store change.

pub mod acknowledgement;
pub mod bulk;
pub mod event;
pub mod event_bus;
pub mod filter;
pub mod ids;
pub mod incident;
pub mod store;
pub mod store_event;

pub use acknowledgement::{Acknowledgement, AcknowledgementBody, ExpiryStatus};
pub use bulk::{BulkOperation, BulkState};
pub use event::{Event, EventType};
pub use event_bus::{EventBus, FeedMessage, StoreFeed};
pub use filter::{Filter, FilterCriteria, FilterDraft, Tag};
pub use ids::{BatchId, FilterPk, IncidentPk};
pub use incident::{Incident, SourceSystem, TicketUrlBody};
pub use store::{BulkGuard, DomainStore, StoreState, Transition};
pub use store_event::StoreEvent;
