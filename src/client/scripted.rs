//! In-memory [`ResourceClient`] for action tests.
//!
//! Records when each remote call starts and finishes, yields to the
//! runtime in between so overlapping calls would interleave in the log,
//! and fails every call that targets a configured incident pk.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use tokio::sync::Mutex;

use super::ResourceClient;
use crate::domain::{
    Acknowledgement, AcknowledgementBody, Event, EventType, Filter, FilterCriteria, FilterDraft,
    FilterPk, Incident, IncidentPk, TicketUrlBody,
};
use crate::error::ClientError;

/// One entry of the call log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Start(&'static str, i64),
    Finish(&'static str, i64),
}

#[derive(Debug, Default)]
pub(crate) struct ScriptedClient {
    log: Mutex<Vec<Call>>,
    failing: HashSet<i64>,
    fail_filters: AtomicBool,
    next_pk: AtomicI64,
    filters: Mutex<Vec<Filter>>,
    incidents: Vec<Incident>,
    acks: Vec<Acknowledgement>,
    events: Vec<Event>,
}

impl ScriptedClient {
    pub(crate) fn new() -> Self {
        Self {
            next_pk: AtomicI64::new(100),
            ..Self::default()
        }
    }

    pub(crate) fn with_incidents(mut self, incidents: Vec<Incident>) -> Self {
        self.incidents = incidents;
        self
    }

    pub(crate) fn with_filters(self, filters: Vec<Filter>) -> Self {
        Self {
            filters: Mutex::new(filters),
            ..self
        }
    }

    pub(crate) fn with_acks(mut self, acks: Vec<Acknowledgement>) -> Self {
        self.acks = acks;
        self
    }

    pub(crate) fn with_events(mut self, events: Vec<Event>) -> Self {
        self.events = events;
        self
    }

    /// Every incident call targeting `pk` is rejected with a 500.
    pub(crate) fn failing_on(mut self, pk: i64) -> Self {
        self.failing.insert(pk);
        self
    }

    /// Every filter call is rejected with a 500.
    pub(crate) fn fail_filter_calls(&self) {
        self.fail_filters.store(true, Ordering::SeqCst);
    }

    pub(crate) async fn calls(&self) -> Vec<Call> {
        self.log.lock().await.clone()
    }

    /// Forgets every call recorded so far.
    pub(crate) async fn clear_calls(&self) {
        self.log.lock().await.clear();
    }

    /// Incident pks whose call was started, in order.
    pub(crate) async fn started(&self, op: &str) -> Vec<i64> {
        self.log
            .lock()
            .await
            .iter()
            .filter_map(|c| match c {
                Call::Start(name, pk) if *name == op => Some(*pk),
                _ => None,
            })
            .collect()
    }

    fn next_pk(&self) -> i64 {
        self.next_pk.fetch_add(1, Ordering::SeqCst)
    }

    async fn around<T>(
        &self,
        op: &'static str,
        pk: i64,
        fails: bool,
        make: impl FnOnce() -> T,
    ) -> Result<T, ClientError> {
        self.log.lock().await.push(Call::Start(op, pk));
        tokio::task::yield_now().await;
        let result = if fails {
            Err(ClientError::Status {
                status: 500,
                body: format!("{op} {pk} rejected"),
            })
        } else {
            Ok(make())
        };
        self.log.lock().await.push(Call::Finish(op, pk));
        result
    }

    async fn incident_call<T>(
        &self,
        op: &'static str,
        pk: IncidentPk,
        make: impl FnOnce() -> T,
    ) -> Result<T, ClientError> {
        let fails = self.failing.contains(&pk.get());
        self.around(op, pk.get(), fails, make).await
    }

    async fn filter_call<T>(
        &self,
        op: &'static str,
        pk: i64,
        make: impl FnOnce() -> T,
    ) -> Result<T, ClientError> {
        let fails = self.fail_filters.load(Ordering::SeqCst);
        self.around(op, pk, fails, make).await
    }

    fn event(&self, pk: IncidentPk, kind: EventType, description: Option<&str>) -> Event {
        Event {
            pk: self.next_pk(),
            incident: pk,
            actor: 1,
            timestamp: "2020-01-15T03:04:14.387000+01:00"
                .parse()
                .unwrap_or_default(),
            kind,
            description: description.unwrap_or_default().to_string(),
        }
    }
}

impl ResourceClient for ScriptedClient {
    async fn create_filter(&self, draft: &FilterDraft) -> Result<Filter, ClientError> {
        let pk = self.next_pk();
        // The server trims the name and echoes no criteria.
        self.filter_call("create_filter", pk, || Filter {
            pk: FilterPk::new(pk),
            name: draft.name.trim().to_string(),
            criteria: FilterCriteria::default(),
        })
        .await
    }

    async fn delete_filter(&self, pk: FilterPk) -> Result<(), ClientError> {
        self.filter_call("delete_filter", pk.get(), || ()).await
    }

    async fn update_filter(&self, filter: &Filter) -> Result<Filter, ClientError> {
        self.filter_call("update_filter", filter.pk.get(), || Filter {
            name: "server echo".to_string(),
            ..filter.clone()
        })
        .await
    }

    async fn list_filters(&self) -> Result<Vec<Filter>, ClientError> {
        let filters = self.filters.lock().await.clone();
        self.filter_call("list_filters", 0, || filters).await
    }

    async fn list_incidents(&self, criteria: &FilterCriteria) -> Result<Vec<Incident>, ClientError> {
        let matching = self
            .incidents
            .iter()
            .filter(|i| criteria.open.is_none_or(|open| i.open == open))
            .cloned()
            .collect();
        self.around("list_incidents", 0, false, || matching).await
    }

    async fn create_event(
        &self,
        pk: IncidentPk,
        kind: EventType,
        description: Option<&str>,
    ) -> Result<Event, ClientError> {
        let op = match kind {
            EventType::Close => "close",
            EventType::Reopen => "reopen",
            _ => "event",
        };
        self.incident_call(op, pk, || self.event(pk, kind, description))
            .await
    }

    async fn create_acknowledgement(
        &self,
        pk: IncidentPk,
        body: &AcknowledgementBody,
    ) -> Result<Acknowledgement, ClientError> {
        self.incident_call("acknowledge", pk, || Acknowledgement {
            pk: self.next_pk(),
            event: self.event(pk, EventType::Acknowledge, Some(&body.description)),
            expiration: body.expiration,
        })
        .await
    }

    async fn set_ticket_url(
        &self,
        pk: IncidentPk,
        ticket_url: &str,
    ) -> Result<TicketUrlBody, ClientError> {
        self.incident_call("ticket_url", pk, || TicketUrlBody {
            ticket_url: ticket_url.to_string(),
        })
        .await
    }

    async fn list_acknowledgements(&self, pk: IncidentPk) -> Result<Vec<Acknowledgement>, ClientError> {
        let acks = self
            .acks
            .iter()
            .filter(|a| a.event.incident == pk)
            .cloned()
            .collect();
        self.incident_call("list_acks", pk, || acks).await
    }

    async fn list_events(&self, pk: IncidentPk) -> Result<Vec<Event>, ClientError> {
        let events = self
            .events
            .iter()
            .filter(|e| e.incident == pk)
            .cloned()
            .collect();
        self.incident_call("list_events", pk, || events).await
    }
}
