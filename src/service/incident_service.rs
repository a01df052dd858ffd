//! Incident actions: loading, single-item lifecycle changes, and their
//! bulk variants.

use std::sync::Arc;

use crate::client::ResourceClient;
use crate::domain::acknowledgement::sort_for_display;
use crate::domain::{
    Acknowledgement, AcknowledgementBody, BulkOperation, DomainStore, Event, EventType,
    FilterCriteria, Incident, IncidentPk, TicketUrlBody, Transition,
};
use crate::error::{ActionError, ClientError};
use crate::service::bulk::run_sequential;
use crate::validation::normalize_ticket_url;

/// Orchestration layer for incident operations.
///
/// Single-item methods follow the pattern: remote call → on success, one
/// store transition on that incident → return the server's result. Bulk
/// methods run the same per-item step for each incident in order under
/// the store's bulk slot (see [`crate::service::bulk`]).
#[derive(Debug)]
pub struct IncidentService<C> {
    client: Arc<C>,
    store: Arc<DomainStore>,
}

impl<C> Clone for IncidentService<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            store: Arc::clone(&self.store),
        }
    }
}

impl<C: ResourceClient> IncidentService<C> {
    /// Creates a new `IncidentService`.
    #[must_use]
    pub fn new(client: Arc<C>, store: Arc<DomainStore>) -> Self {
        Self { client, store }
    }

    /// Fetches incidents matching `criteria` and replaces the incident
    /// slice with them, in server order.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::Client`] if the listing fails.
    pub async fn load_incidents_filtered(
        &self,
        criteria: &FilterCriteria,
    ) -> Result<Vec<Incident>, ActionError> {
        let incidents = self
            .client
            .list_incidents(criteria)
            .await
            .inspect_err(|err| tracing::warn!(%err, "load incidents failed"))?;

        self.store
            .apply(Transition::ReplaceIncidents(incidents.clone()))
            .await;
        tracing::info!(count = incidents.len(), "incidents loaded");
        Ok(incidents)
    }

    /// Closes an incident. Returns the created CLOSE event.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::Client`] if the backend rejects the event.
    pub async fn close_incident(
        &self,
        pk: IncidentPk,
        description: Option<&str>,
    ) -> Result<Event, ActionError> {
        Ok(self.change_open(pk, EventType::Close, description).await?)
    }

    /// Reopens an incident. Returns the created REOPEN event.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::Client`] if the backend rejects the event.
    pub async fn reopen_incident(
        &self,
        pk: IncidentPk,
        description: Option<&str>,
    ) -> Result<Event, ActionError> {
        Ok(self.change_open(pk, EventType::Reopen, description).await?)
    }

    /// Acknowledges an incident. Returns the created acknowledgement.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::Client`] if the backend rejects it.
    pub async fn acknowledge_incident(
        &self,
        pk: IncidentPk,
        body: &AcknowledgementBody,
    ) -> Result<Acknowledgement, ActionError> {
        Ok(self.acknowledge(pk, body).await?)
    }

    /// Sets (or, with `""`, clears) an incident's ticket URL. Returns the
    /// server's confirmation.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::Validation`] without calling the backend if
    /// `url` is neither empty nor an absolute URL, or
    /// [`ActionError::Client`] if the backend rejects the update.
    pub async fn add_ticket_url(
        &self,
        pk: IncidentPk,
        url: &str,
    ) -> Result<TicketUrlBody, ActionError> {
        let ticket_url = normalize_ticket_url(url)?;
        Ok(self.set_ticket_url(pk, ticket_url.as_deref()).await?)
    }

    /// Fetches an incident's acknowledgements in display order.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::Client`] if the listing fails.
    pub async fn load_acknowledgements(
        &self,
        pk: IncidentPk,
    ) -> Result<Vec<Acknowledgement>, ActionError> {
        let mut acks = self.client.list_acknowledgements(pk).await?;
        sort_for_display(&mut acks);
        Ok(acks)
    }

    /// Fetches an incident's events in server order.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::Client`] if the listing fails.
    pub async fn load_events(&self, pk: IncidentPk) -> Result<Vec<Event>, ActionError> {
        Ok(self.client.list_events(pk).await?)
    }

    /// Acknowledges each incident in order with the same body.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::BulkInProgress`] if another batch is
    /// running, or [`ActionError::Bulk`] at the first rejected incident.
    pub async fn bulk_acknowledge_incidents(
        &self,
        pks: &[IncidentPk],
        body: &AcknowledgementBody,
    ) -> Result<Vec<Acknowledgement>, ActionError> {
        let this = self;
        run_sequential(&self.store, BulkOperation::Acknowledge, pks, move |pk| {
            this.acknowledge(pk, body)
        })
        .await
    }

    /// Sets the same ticket URL on each incident in order.
    ///
    /// The URL is validated once, before the batch starts.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::Validation`] for a malformed URL,
    /// [`ActionError::BulkInProgress`] if another batch is running, or
    /// [`ActionError::Bulk`] at the first rejected incident.
    pub async fn bulk_add_ticket_url(
        &self,
        pks: &[IncidentPk],
        url: &str,
    ) -> Result<Vec<TicketUrlBody>, ActionError> {
        let ticket_url = normalize_ticket_url(url)?;
        let ticket_url = ticket_url.as_deref();
        let this = self;
        run_sequential(&self.store, BulkOperation::AddTicketUrl, pks, move |pk| {
            this.set_ticket_url(pk, ticket_url)
        })
        .await
    }

    /// Reopens each incident in order.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::BulkInProgress`] if another batch is
    /// running, or [`ActionError::Bulk`] at the first rejected incident.
    pub async fn bulk_reopen_incidents(
        &self,
        pks: &[IncidentPk],
        description: Option<&str>,
    ) -> Result<Vec<Event>, ActionError> {
        let this = self;
        run_sequential(&self.store, BulkOperation::Reopen, pks, move |pk| {
            this.change_open(pk, EventType::Reopen, description)
        })
        .await
    }

    /// Closes each incident in order.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::BulkInProgress`] if another batch is
    /// running, or [`ActionError::Bulk`] at the first rejected incident.
    pub async fn bulk_close_incidents(
        &self,
        pks: &[IncidentPk],
        description: Option<&str>,
    ) -> Result<Vec<Event>, ActionError> {
        let this = self;
        run_sequential(&self.store, BulkOperation::Close, pks, move |pk| {
            this.change_open(pk, EventType::Close, description)
        })
        .await
    }

    async fn change_open(
        &self,
        pk: IncidentPk,
        kind: EventType,
        description: Option<&str>,
    ) -> Result<Event, ClientError> {
        let event = self
            .client
            .create_event(pk, kind, description)
            .await
            .inspect_err(|err| tracing::warn!(%pk, event = kind.code(), %err, "event rejected"))?;

        let open = kind == EventType::Reopen;
        self.store
            .apply(Transition::SetIncidentOpen { pk, open })
            .await;
        tracing::info!(%pk, open, "incident state changed");
        Ok(event)
    }

    async fn acknowledge(
        &self,
        pk: IncidentPk,
        body: &AcknowledgementBody,
    ) -> Result<Acknowledgement, ClientError> {
        let ack = self
            .client
            .create_acknowledgement(pk, body)
            .await
            .inspect_err(|err| tracing::warn!(%pk, %err, "acknowledgement rejected"))?;

        self.store.apply(Transition::AcknowledgeIncident(pk)).await;
        tracing::info!(%pk, "incident acknowledged");
        Ok(ack)
    }

    async fn set_ticket_url(
        &self,
        pk: IncidentPk,
        ticket_url: Option<&str>,
    ) -> Result<TicketUrlBody, ClientError> {
        let confirmation = self
            .client
            .set_ticket_url(pk, ticket_url.unwrap_or_default())
            .await
            .inspect_err(|err| tracing::warn!(%pk, %err, "ticket url rejected"))?;

        self.store
            .apply(Transition::SetTicketUrl {
                pk,
                ticket_url: ticket_url.map(str::to_string),
            })
            .await;
        tracing::info!(%pk, cleared = ticket_url.is_none(), "ticket url updated");
        Ok(confirmation)
    }
}
