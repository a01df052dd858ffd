//! Canonical client-side copy of filters and incidents.
//!
//! [`DomainStore`] is a cache of server state, not the source of truth.
//! It is mutated only through [`Transition`] values; each one is applied
//! atomically under a single write lock by the pure [`StoreState::apply`]
//! and announced on the [`EventBus`]. The bulk slot lives beside the
//! collections in a `tokio::sync::watch` channel so its guard can release
//! it synchronously, even from `Drop`.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{RwLock, broadcast, watch};

use super::{
    BatchId, BulkOperation, BulkState, EventBus, Filter, FilterPk, Incident, IncidentPk,
    StoreEvent, StoreFeed,
};
use crate::error::ActionError;

/// A single atomic mutation of the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Insert a newly created filter.
    CreateFilter(Filter),
    /// Replace a filter, inserting it if absent.
    UpdateFilter(Filter),
    /// Remove a filter. Absent keys are a no-op.
    DeleteFilter(FilterPk),
    /// Replace the whole filter slice.
    ReplaceFilters(Vec<Filter>),
    /// Replace an incident, inserting it if absent.
    UpsertIncident(Incident),
    /// Replace the whole incident slice, keeping the given order.
    ReplaceIncidents(Vec<Incident>),
    /// Set an incident's `open` flag.
    SetIncidentOpen {
        /// Incident identity.
        pk: IncidentPk,
        /// New value.
        open: bool,
    },
    /// Mark an incident acknowledged.
    AcknowledgeIncident(IncidentPk),
    /// Set or clear an incident's ticket URL.
    SetTicketUrl {
        /// Incident identity.
        pk: IncidentPk,
        /// New value; `None` clears it.
        ticket_url: Option<String>,
    },
}

/// Insertion-ordered keyed collection.
#[derive(Debug, Clone)]
struct Keyed<K, V> {
    order: Vec<K>,
    items: HashMap<K, V>,
}

impl<K: Copy + Eq + Hash, V> Keyed<K, V> {
    fn new() -> Self {
        Self {
            order: Vec::new(),
            items: HashMap::new(),
        }
    }

    /// Inserts or replaces. New keys go to the end; existing keys keep
    /// their position.
    fn upsert(&mut self, key: K, value: V) {
        if self.items.insert(key, value).is_none() {
            self.order.push(key);
        }
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        let removed = self.items.remove(key)?;
        self.order.retain(|k| k != key);
        Some(removed)
    }

    fn replace_all(&mut self, entries: impl IntoIterator<Item = (K, V)>) {
        let mut next = Self::new();
        for (key, value) in entries {
            next.upsert(key, value);
        }
        *self = next;
    }

    fn get(&self, key: &K) -> Option<&V> {
        self.items.get(key)
    }

    fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        self.items.get_mut(key)
    }

    fn values(&self) -> impl Iterator<Item = &V> {
        self.order.iter().filter_map(|k| self.items.get(k))
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}

/// The store's collections, with the pure transition function.
#[derive(Debug, Clone)]
pub struct StoreState {
    filters: Keyed<FilterPk, Filter>,
    incidents: Keyed<IncidentPk, Incident>,
}

impl Default for StoreState {
    fn default() -> Self {
        Self::new()
    }
}

impl StoreState {
    /// Creates an empty state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            filters: Keyed::new(),
            incidents: Keyed::new(),
        }
    }

    /// Applies one transition.
    ///
    /// Returns the change notification, or `None` when the transition had
    /// nothing to act on (deleting an absent filter, or a field update on
    /// an unknown incident).
    pub fn apply(&mut self, transition: Transition) -> Option<StoreEvent> {
        match transition {
            Transition::CreateFilter(filter) => {
                let pk = filter.pk;
                self.filters.upsert(pk, filter);
                Some(StoreEvent::FilterCreated { pk })
            }
            Transition::UpdateFilter(filter) => {
                let pk = filter.pk;
                self.filters.upsert(pk, filter);
                Some(StoreEvent::FilterUpdated { pk })
            }
            Transition::DeleteFilter(pk) => self
                .filters
                .remove(&pk)
                .map(|_| StoreEvent::FilterDeleted { pk }),
            Transition::ReplaceFilters(filters) => {
                self.filters
                    .replace_all(filters.into_iter().map(|f| (f.pk, f)));
                Some(StoreEvent::FiltersReplaced {
                    count: self.filters.len(),
                })
            }
            Transition::UpsertIncident(incident) => {
                let pk = incident.pk;
                self.incidents.upsert(pk, incident);
                Some(StoreEvent::IncidentUpserted { pk })
            }
            Transition::ReplaceIncidents(incidents) => {
                self.incidents
                    .replace_all(incidents.into_iter().map(|i| (i.pk, i)));
                Some(StoreEvent::IncidentsReplaced {
                    count: self.incidents.len(),
                })
            }
            Transition::SetIncidentOpen { pk, open } => {
                let incident = self.incidents.get_mut(&pk)?;
                incident.open = open;
                Some(StoreEvent::IncidentOpenChanged { pk, open })
            }
            Transition::AcknowledgeIncident(pk) => {
                let incident = self.incidents.get_mut(&pk)?;
                incident.acked = true;
                Some(StoreEvent::IncidentAcknowledged { pk })
            }
            Transition::SetTicketUrl { pk, ticket_url } => {
                let incident = self.incidents.get_mut(&pk)?;
                incident.ticket_url.clone_from(&ticket_url);
                Some(StoreEvent::TicketUrlChanged { pk, ticket_url })
            }
        }
    }

    /// Returns all filters in insertion order.
    pub fn filters(&self) -> impl Iterator<Item = &Filter> {
        self.filters.values()
    }

    /// Returns the filter with the given pk.
    #[must_use]
    pub fn filter(&self, pk: FilterPk) -> Option<&Filter> {
        self.filters.get(&pk)
    }

    /// Returns all incidents in the order the server listed them.
    pub fn incidents(&self) -> impl Iterator<Item = &Incident> {
        self.incidents.values()
    }

    /// Returns the incident with the given pk.
    #[must_use]
    pub fn incident(&self, pk: IncidentPk) -> Option<&Incident> {
        self.incidents.get(&pk)
    }
}

/// Shared store of filters, incidents, and the bulk slot.
///
/// # Concurrency
///
/// - Reads take a shared lock and return owned snapshots.
/// - Each transition takes the write lock once, so no reader observes a
///   partially applied transition.
/// - The bulk slot is claimed with a single check-and-set; at most one
///   batch is `Running` at a time.
#[derive(Debug)]
pub struct DomainStore {
    state: RwLock<StoreState>,
    bulk: Arc<watch::Sender<BulkState>>,
    event_bus: EventBus,
}

impl DomainStore {
    /// Creates an empty store publishing to `event_bus`.
    #[must_use]
    pub fn new(event_bus: EventBus) -> Self {
        let (bulk, _) = watch::channel(BulkState::Idle);
        Self {
            state: RwLock::new(StoreState::new()),
            bulk: Arc::new(bulk),
            event_bus,
        }
    }

    /// Applies one transition and publishes its change notification.
    pub async fn apply(&self, transition: Transition) -> Option<StoreEvent> {
        let event = self.state.write().await.apply(transition);
        match &event {
            Some(event) => {
                let _ = self.event_bus.publish(event.clone());
            }
            None => tracing::debug!("store transition had no target"),
        }
        event
    }

    /// Returns all filters in insertion order.
    pub async fn filters(&self) -> Vec<Filter> {
        self.state.read().await.filters().cloned().collect()
    }

    /// Returns the filter with the given pk.
    pub async fn filter(&self, pk: FilterPk) -> Option<Filter> {
        self.state.read().await.filter(pk).cloned()
    }

    /// Returns all incidents in server order.
    pub async fn incidents(&self) -> Vec<Incident> {
        self.state.read().await.incidents().cloned().collect()
    }

    /// Returns the incident with the given pk.
    pub async fn incident(&self, pk: IncidentPk) -> Option<Incident> {
        self.state.read().await.incident(pk).cloned()
    }

    /// Returns the current bulk state.
    #[must_use]
    pub fn bulk_state(&self) -> BulkState {
        self.bulk.borrow().clone()
    }

    /// Returns `true` while a bulk batch is running.
    #[must_use]
    pub fn is_bulk_in_progress(&self) -> bool {
        self.bulk.borrow().is_running()
    }

    /// Returns a receiver that observes every bulk state change.
    #[must_use]
    pub fn watch_bulk(&self) -> watch::Receiver<BulkState> {
        self.bulk.subscribe()
    }

    /// Opens a lag-aware feed of store change notifications.
    #[must_use]
    pub fn feed(&self) -> StoreFeed {
        self.event_bus.feed()
    }

    /// Subscribes to all store change notifications.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.event_bus.subscribe()
    }

    /// Claims the bulk slot for a new batch.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::BulkInProgress`] if another batch is
    /// `Running`.
    pub fn begin_bulk(
        &self,
        operation: BulkOperation,
        total: usize,
    ) -> Result<BulkGuard, ActionError> {
        let batch_id = BatchId::new();
        let mut holder = None;
        let claimed = self.bulk.send_if_modified(|state| {
            if state.is_running() {
                holder = state.batch_id();
                return false;
            }
            *state = BulkState::Running {
                batch_id,
                operation,
                total,
                started_at: Utc::now(),
            };
            true
        });
        if !claimed {
            return Err(ActionError::BulkInProgress {
                batch_id: holder.unwrap_or(batch_id),
            });
        }

        let _ = self.event_bus.publish(StoreEvent::BulkStateChanged {
            state: self.bulk_state(),
        });
        tracing::info!(%batch_id, %operation, total, "bulk batch started");

        Ok(BulkGuard {
            bulk: Arc::clone(&self.bulk),
            event_bus: self.event_bus.clone(),
            batch_id,
            operation,
            completed: 0,
            settled: false,
        })
    }
}

/// Holds the bulk slot for one batch and releases it exactly once.
///
/// Call [`BulkGuard::succeed`] or [`BulkGuard::fail`] to settle the
/// batch. A guard dropped unsettled (the batch future was dropped) moves
/// the slot to `Failed` with no failing incident.
#[derive(Debug)]
pub struct BulkGuard {
    bulk: Arc<watch::Sender<BulkState>>,
    event_bus: EventBus,
    batch_id: BatchId,
    operation: BulkOperation,
    completed: usize,
    settled: bool,
}

impl BulkGuard {
    /// Returns the batch identifier.
    #[must_use]
    pub const fn batch_id(&self) -> BatchId {
        self.batch_id
    }

    /// Returns how many incidents have succeeded so far.
    #[must_use]
    pub const fn completed(&self) -> usize {
        self.completed
    }

    /// Records one successful incident.
    pub fn record_success(&mut self) {
        self.completed = self.completed.saturating_add(1);
    }

    /// Settles the batch as `Succeeded`.
    pub fn succeed(mut self) {
        let state = BulkState::Succeeded {
            batch_id: self.batch_id,
            operation: self.operation,
            completed: self.completed,
        };
        self.settle(state);
    }

    /// Settles the batch as `Failed` at `failed_pk`.
    pub fn fail(mut self, failed_pk: IncidentPk) {
        let state = BulkState::Failed {
            batch_id: self.batch_id,
            operation: self.operation,
            completed: self.completed,
            failed_pk: Some(failed_pk),
        };
        self.settle(state);
    }

    fn settle(&mut self, state: BulkState) {
        if self.settled {
            return;
        }
        self.settled = true;
        tracing::info!(
            batch_id = %self.batch_id,
            operation = %self.operation,
            completed = self.completed,
            outcome = state.as_str(),
            "bulk batch finished"
        );
        self.bulk.send_replace(state.clone());
        let _ = self.event_bus.publish(StoreEvent::BulkStateChanged { state });
    }
}

impl Drop for BulkGuard {
    fn drop(&mut self) {
        if !self.settled {
            tracing::warn!(batch_id = %self.batch_id, "bulk batch dropped before settling");
            let state = BulkState::Failed {
                batch_id: self.batch_id,
                operation: self.operation,
                completed: self.completed,
                failed_pk: None,
            };
            self.settle(state);
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::domain::incident::fixtures::incident;
    use crate::domain::{FilterCriteria, StoreEvent};

    fn filter(pk: i64, name: &str) -> Filter {
        Filter {
            pk: FilterPk::new(pk),
            name: name.to_string(),
            criteria: FilterCriteria::default(),
        }
    }

    fn make_store() -> DomainStore {
        DomainStore::new(EventBus::new(64))
    }

    #[test]
    fn update_of_absent_filter_inserts_it() {
        let mut state = StoreState::new();
        let event = state.apply(Transition::UpdateFilter(filter(5, "late")));
        assert_eq!(
            event,
            Some(StoreEvent::FilterUpdated {
                pk: FilterPk::new(5)
            })
        );
        assert_eq!(state.filter(FilterPk::new(5)), Some(&filter(5, "late")));
    }

    #[test]
    fn upsert_of_absent_incident_inserts_it() {
        let mut state = StoreState::new();
        let event = state.apply(Transition::UpsertIncident(incident(9)));
        assert!(event.is_some());
        assert_eq!(state.incident(IncidentPk::new(9)), Some(&incident(9)));
    }

    #[test]
    fn update_keeps_position() {
        let mut state = StoreState::new();
        state.apply(Transition::CreateFilter(filter(1, "a")));
        state.apply(Transition::CreateFilter(filter(2, "b")));
        state.apply(Transition::UpdateFilter(filter(1, "a2")));
        let names: Vec<_> = state.filters().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["a2", "b"]);
    }

    #[test]
    fn delete_absent_filter_is_noop() {
        let mut state = StoreState::new();
        assert_eq!(state.apply(Transition::DeleteFilter(FilterPk::new(1))), None);
    }

    #[test]
    fn replace_filters_discards_previous_slice() {
        let mut state = StoreState::new();
        state.apply(Transition::CreateFilter(filter(1, "old")));
        state.apply(Transition::ReplaceFilters(vec![filter(2, "x"), filter(3, "y")]));
        assert!(state.filter(FilterPk::new(1)).is_none());
        assert_eq!(state.filters().count(), 2);
    }

    #[test]
    fn replace_incidents_keeps_server_order() {
        let mut state = StoreState::new();
        state.apply(Transition::ReplaceIncidents(vec![
            incident(30),
            incident(10),
            incident(20),
        ]));
        let pks: Vec<_> = state.incidents().map(|i| i.pk.get()).collect();
        assert_eq!(pks, [30, 10, 20]);
    }

    #[test]
    fn field_transitions_update_only_their_field() {
        let mut state = StoreState::new();
        state.apply(Transition::UpsertIncident(incident(1)));
        let pk = IncidentPk::new(1);

        state.apply(Transition::SetIncidentOpen { pk, open: false });
        state.apply(Transition::AcknowledgeIncident(pk));
        state.apply(Transition::SetTicketUrl {
            pk,
            ticket_url: Some("https://tickets.example.org/1".to_string()),
        });

        let Some(updated) = state.incident(pk) else {
            panic!("incident should exist");
        };
        assert!(!updated.open);
        assert!(updated.acked);
        assert_eq!(
            updated.ticket_url.as_deref(),
            Some("https://tickets.example.org/1")
        );
        assert_eq!(updated.description, incident(1).description);
    }

    #[test]
    fn field_transition_on_unknown_incident_is_noop() {
        let mut state = StoreState::new();
        let event = state.apply(Transition::SetIncidentOpen {
            pk: IncidentPk::new(404),
            open: false,
        });
        assert_eq!(event, None);
        assert_eq!(state.incidents().count(), 0);
    }

    #[tokio::test]
    async fn apply_publishes_event() {
        let store = make_store();
        let mut rx = store.subscribe();

        store.apply(Transition::CreateFilter(filter(1, "a"))).await;

        let Ok(event) = rx.recv().await else {
            panic!("expected event");
        };
        assert_eq!(event.event_type_str(), "filter_created");
        assert_eq!(store.filters().await.len(), 1);
    }

    #[tokio::test]
    async fn second_bulk_claim_is_rejected() {
        let store = make_store();
        let Ok(guard) = store.begin_bulk(BulkOperation::Close, 2) else {
            panic!("first claim should succeed");
        };
        assert!(store.is_bulk_in_progress());

        let second = store.begin_bulk(BulkOperation::Reopen, 1);
        let Err(ActionError::BulkInProgress { batch_id }) = second else {
            panic!("second claim should be rejected");
        };
        assert_eq!(batch_id, guard.batch_id());

        guard.succeed();
        assert!(!store.is_bulk_in_progress());
        assert!(store.begin_bulk(BulkOperation::Reopen, 1).is_ok());
    }

    #[tokio::test]
    async fn guard_settles_with_counts() {
        let store = make_store();
        let Ok(mut guard) = store.begin_bulk(BulkOperation::Acknowledge, 3) else {
            panic!("claim should succeed");
        };
        guard.record_success();
        guard.fail(IncidentPk::new(2));

        let BulkState::Failed {
            completed,
            failed_pk,
            ..
        } = store.bulk_state()
        else {
            panic!("expected failed state");
        };
        assert_eq!(completed, 1);
        assert_eq!(failed_pk, Some(IncidentPk::new(2)));
    }

    #[tokio::test]
    async fn dropped_guard_releases_slot() {
        let store = make_store();
        let mut watcher = store.watch_bulk();
        {
            let Ok(_guard) = store.begin_bulk(BulkOperation::Close, 5) else {
                panic!("claim should succeed");
            };
            assert!(watcher.borrow_and_update().is_running());
        }
        assert!(!store.is_bulk_in_progress());
        assert!(matches!(
            store.bulk_state(),
            BulkState::Failed {
                failed_pk: None,
                ..
            }
        ));
        assert!(watcher.has_changed().unwrap_or(false));
    }

    #[tokio::test]
    async fn bulk_transitions_are_published() {
        let store = make_store();
        let mut rx = store.subscribe();
        let Ok(guard) = store.begin_bulk(BulkOperation::Reopen, 0) else {
            panic!("claim should succeed");
        };
        guard.succeed();

        let (Ok(started), Ok(finished)) = (rx.recv().await, rx.recv().await) else {
            panic!("expected two events");
        };
        let StoreEvent::BulkStateChanged { state: first } = started else {
            panic!("expected bulk event");
        };
        let StoreEvent::BulkStateChanged { state: second } = finished else {
            panic!("expected bulk event");
        };
        assert!(first.is_running());
        assert_eq!(second.as_str(), "succeeded");
    }
}
