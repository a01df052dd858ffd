//! Resource client: one async call per backend resource.
//!
//! The action layer is generic over [`ResourceClient`]; the crate ships
//! [`HttpResourceClient`] for the REST backend. Implementations return
//! parsed domain objects and never touch the store.

pub mod http;

#[cfg(test)]
pub(crate) mod scripted;

use std::future::Future;

use crate::domain::{
    Acknowledgement, AcknowledgementBody, Event, EventType, Filter, FilterCriteria, FilterDraft,
    FilterPk, Incident, IncidentPk, TicketUrlBody,
};
use crate::error::ClientError;

pub use http::HttpResourceClient;

/// Backend calls used by the action layer.
///
/// Every method is a single remote call and a suspension point. Failures
/// are returned unchanged to the caller of the action.
pub trait ResourceClient: Send + Sync {
    /// Persists a new filter. The result carries the assigned `pk` and
    /// the (possibly normalized) name.
    fn create_filter(
        &self,
        draft: &FilterDraft,
    ) -> impl Future<Output = Result<Filter, ClientError>> + Send;

    /// Deletes a filter.
    fn delete_filter(&self, pk: FilterPk) -> impl Future<Output = Result<(), ClientError>> + Send;

    /// Persists the full filter.
    fn update_filter(
        &self,
        filter: &Filter,
    ) -> impl Future<Output = Result<Filter, ClientError>> + Send;

    /// Lists every saved filter.
    fn list_filters(&self) -> impl Future<Output = Result<Vec<Filter>, ClientError>> + Send;

    /// Lists incidents matching `criteria`, in server order.
    fn list_incidents(
        &self,
        criteria: &FilterCriteria,
    ) -> impl Future<Output = Result<Vec<Incident>, ClientError>> + Send;

    /// Appends an event (close, reopen) to an incident.
    fn create_event(
        &self,
        pk: IncidentPk,
        kind: EventType,
        description: Option<&str>,
    ) -> impl Future<Output = Result<Event, ClientError>> + Send;

    /// Acknowledges an incident.
    fn create_acknowledgement(
        &self,
        pk: IncidentPk,
        body: &AcknowledgementBody,
    ) -> impl Future<Output = Result<Acknowledgement, ClientError>> + Send;

    /// Sets an incident's ticket URL; `""` clears it.
    fn set_ticket_url(
        &self,
        pk: IncidentPk,
        ticket_url: &str,
    ) -> impl Future<Output = Result<TicketUrlBody, ClientError>> + Send;

    /// Lists an incident's acknowledgements.
    fn list_acknowledgements(
        &self,
        pk: IncidentPk,
    ) -> impl Future<Output = Result<Vec<Acknowledgement>, ClientError>> + Send;

    /// Lists an incident's events.
    fn list_events(
        &self,
        pk: IncidentPk,
    ) -> impl Future<Output = Result<Vec<Event>, ClientError>> + Send;
}
