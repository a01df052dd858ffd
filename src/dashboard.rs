//! Composition root handed to view code.
//!
//! A [`Dashboard`] owns the shared [`DomainStore`] and one service per
//! domain. Views read a snapshot plus the matching action handle in one
//! call, which keeps them from reaching into the store directly.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{broadcast, watch};

use crate::client::ResourceClient;
use crate::domain::{
    BulkState, DomainStore, EventBus, Filter, Incident, StoreEvent, StoreFeed,
};
use crate::service::{FilterService, IncidentService};

/// Incident slice plus the current bulk-operation state.
#[derive(Debug, Clone, Serialize)]
pub struct IncidentsSnapshot {
    /// Incidents in store order.
    pub incidents: Vec<Incident>,
    /// Current bulk-operation state.
    pub bulk: BulkState,
}

impl IncidentsSnapshot {
    /// `true` while a bulk batch is running; views disable bulk controls.
    #[must_use]
    pub const fn is_bulk_in_progress(&self) -> bool {
        self.bulk.is_running()
    }
}

/// Shared dashboard state: the store and the action services bound to it.
#[derive(Debug)]
pub struct Dashboard<C> {
    store: Arc<DomainStore>,
    filter_service: FilterService<C>,
    incident_service: IncidentService<C>,
}

impl<C> Clone for Dashboard<C> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            filter_service: self.filter_service.clone(),
            incident_service: self.incident_service.clone(),
        }
    }
}

impl<C: ResourceClient> Dashboard<C> {
    /// Builds a dashboard with a fresh store publishing on `event_bus`.
    #[must_use]
    pub fn new(client: Arc<C>, event_bus: EventBus) -> Self {
        Self::from_parts(client, Arc::new(DomainStore::new(event_bus)))
    }

    /// Builds a dashboard around an existing store.
    #[must_use]
    pub fn from_parts(client: Arc<C>, store: Arc<DomainStore>) -> Self {
        Self {
            filter_service: FilterService::new(Arc::clone(&client), Arc::clone(&store)),
            incident_service: IncidentService::new(client, Arc::clone(&store)),
            store,
        }
    }

    /// Current filters and the filter action handle.
    pub async fn filters(&self) -> (Vec<Filter>, &FilterService<C>) {
        (self.store.filters().await, &self.filter_service)
    }

    /// Current incidents, bulk state, and the incident action handle.
    pub async fn incidents(&self) -> (IncidentsSnapshot, &IncidentService<C>) {
        let snapshot = IncidentsSnapshot {
            incidents: self.store.incidents().await,
            bulk: self.store.bulk_state(),
        };
        (snapshot, &self.incident_service)
    }

    /// Filter action handle.
    #[must_use]
    pub const fn filter_service(&self) -> &FilterService<C> {
        &self.filter_service
    }

    /// Incident action handle.
    #[must_use]
    pub const fn incident_service(&self) -> &IncidentService<C> {
        &self.incident_service
    }

    /// The shared store.
    #[must_use]
    pub fn store(&self) -> &Arc<DomainStore> {
        &self.store
    }

    /// Subscribes to every store change.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.store.subscribe()
    }

    /// Opens a lag-aware feed of store changes.
    #[must_use]
    pub fn feed(&self) -> StoreFeed {
        self.store.feed()
    }

    /// Watches the bulk-operation state.
    #[must_use]
    pub fn watch_bulk(&self) -> watch::Receiver<BulkState> {
        self.store.watch_bulk()
    }
}
