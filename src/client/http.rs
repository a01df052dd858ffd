//! REST implementation of [`ResourceClient`] on top of `reqwest`.
//!
//! All endpoints live under `api/v1/` relative to the configured base URL.
//! Filter criteria travel JSON-encoded in the `filter_string` field.
//! Incident lists may come back bare or paginated (`results` + `next`);
//! pagination is followed to the end.

use std::collections::HashSet;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use super::ResourceClient;
use crate::config::DashboardConfig;
use crate::domain::{
    Acknowledgement, AcknowledgementBody, Event, EventType, Filter, FilterCriteria, FilterDraft,
    FilterPk, Incident, IncidentPk, TicketUrlBody,
};
use crate::error::ClientError;

const FILTERS_PATH: &str = "api/v1/notificationprofiles/filters/";
const INCIDENTS_PATH: &str = "api/v1/incidents/";

/// Upper bound on pages followed for one listing.
const MAX_PAGES: usize = 1000;

/// HTTP client for the incident backend's REST API.
#[derive(Debug, Clone)]
pub struct HttpResourceClient {
    client: reqwest::Client,
    base_url: Url,
    token: Option<String>,
}

// ── Wire DTOs ──────────────────────────────────────────────────────────

#[derive(Serialize)]
struct FilterRequest<'a> {
    name: &'a str,
    filter_string: String,
}

#[derive(Deserialize)]
struct FilterResponse {
    pk: FilterPk,
    name: String,
    #[serde(default)]
    filter_string: String,
}

impl FilterResponse {
    fn into_filter(self) -> Result<Filter, ClientError> {
        let criteria = if self.filter_string.trim().is_empty() {
            FilterCriteria::default()
        } else {
            serde_json::from_str(&self.filter_string)
                .map_err(|e| ClientError::Decode(format!("filter {}: {e}", self.pk)))?
        };
        Ok(Filter {
            pk: self.pk,
            name: self.name,
            criteria,
        })
    }
}

#[derive(Serialize)]
struct EventRequest<'a> {
    #[serde(rename = "type")]
    kind: EventType,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
}

#[derive(Serialize)]
struct AckEventRequest<'a> {
    description: &'a str,
}

#[derive(Serialize)]
struct AckRequest<'a> {
    event: AckEventRequest<'a>,
    expiration: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
struct TicketUrlRequest<'a> {
    ticket_url: &'a str,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Listing<T> {
    Page {
        results: Vec<T>,
        #[serde(default)]
        next: Option<String>,
    },
    Bare(Vec<T>),
}

fn filter_request<'a>(
    name: &'a str,
    criteria: &FilterCriteria,
) -> Result<FilterRequest<'a>, ClientError> {
    let filter_string = serde_json::to_string(criteria)
        .map_err(|e| ClientError::Encode(e.to_string()))?;
    Ok(FilterRequest {
        name,
        filter_string,
    })
}

impl HttpResourceClient {
    /// Creates a client for the backend at `base_url`.
    ///
    /// `token` is sent as `Authorization: Token <token>` on every request.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Transport`] if the underlying HTTP client
    /// cannot be built.
    pub fn new(
        mut base_url: Url,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            base_url,
            token,
        })
    }

    /// Creates a client from the dashboard configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Transport`] if the underlying HTTP client
    /// cannot be built.
    pub fn from_config(config: &DashboardConfig) -> Result<Self, ClientError> {
        Self::new(
            config.api_url.clone(),
            config.api_token.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    /// Returns the normalized base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> Result<Url, ClientError> {
        Ok(self.base_url.join(path)?)
    }

    fn incident_url(&self, pk: IncidentPk, resource: &str) -> Result<Url, ClientError> {
        self.url(&format!("{INCIDENTS_PATH}{pk}/{resource}"))
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let req = self.client.request(method, url);
        match &self.token {
            Some(token) => req.header(reqwest::header::AUTHORIZATION, format!("Token {token}")),
            None => req,
        }
    }

    async fn send(&self, req: RequestBuilder) -> Result<reqwest::Response, ClientError> {
        let resp = req.send().await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        tracing::warn!(status = status.as_u16(), %body, "backend rejected request");
        Err(ClientError::Status {
            status: status.as_u16(),
            body,
        })
    }

    async fn send_json<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, ClientError> {
        let resp = self.send(req).await?;
        resp.json::<T>()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))
    }

    /// Fetches every page of a listing.
    ///
    /// A `next` link that points back at an already fetched page is a
    /// decode error, as is a listing longer than [`MAX_PAGES`].
    async fn list_all<T: DeserializeOwned>(&self, first: Url) -> Result<Vec<T>, ClientError> {
        let mut items = Vec::new();
        let mut fetched = HashSet::new();
        let mut next = Some(first);
        while let Some(url) = next.take() {
            if fetched.len() >= MAX_PAGES {
                return Err(ClientError::Decode(format!(
                    "listing exceeds {MAX_PAGES} pages at {url}"
                )));
            }
            if !fetched.insert(url.clone()) {
                return Err(ClientError::Decode(format!("pagination loops back to {url}")));
            }
            match self
                .send_json::<Listing<T>>(self.request(Method::GET, url))
                .await?
            {
                Listing::Bare(page) => items.extend(page),
                Listing::Page { results, next: more } => {
                    items.extend(results);
                    next = more.map(|n| self.base_url.join(&n)).transpose()?;
                }
            }
        }
        Ok(items)
    }
}

impl ResourceClient for HttpResourceClient {
    async fn create_filter(&self, draft: &FilterDraft) -> Result<Filter, ClientError> {
        let body = filter_request(&draft.name, &draft.criteria)?;
        let created: FilterResponse = self
            .send_json(self.request(Method::POST, self.url(FILTERS_PATH)?).json(&body))
            .await?;
        created.into_filter()
    }

    async fn delete_filter(&self, pk: FilterPk) -> Result<(), ClientError> {
        let url = self.url(&format!("{FILTERS_PATH}{pk}/"))?;
        self.send(self.request(Method::DELETE, url)).await?;
        Ok(())
    }

    async fn update_filter(&self, filter: &Filter) -> Result<Filter, ClientError> {
        let url = self.url(&format!("{FILTERS_PATH}{}/", filter.pk))?;
        let body = filter_request(&filter.name, &filter.criteria)?;
        let updated: FilterResponse = self
            .send_json(self.request(Method::PUT, url).json(&body))
            .await?;
        updated.into_filter()
    }

    async fn list_filters(&self) -> Result<Vec<Filter>, ClientError> {
        let raw: Vec<FilterResponse> = self.list_all(self.url(FILTERS_PATH)?).await?;
        raw.into_iter().map(FilterResponse::into_filter).collect()
    }

    async fn list_incidents(&self, criteria: &FilterCriteria) -> Result<Vec<Incident>, ClientError> {
        let mut url = self.url(INCIDENTS_PATH)?;
        {
            let mut query = url.query_pairs_mut();
            if let Some(open) = criteria.open {
                query.append_pair("open", if open { "true" } else { "false" });
            }
            if let Some(acked) = criteria.acked {
                query.append_pair("acked", if acked { "true" } else { "false" });
            }
            if !criteria.source_system_ids.is_empty() {
                let ids: Vec<String> = criteria
                    .source_system_ids
                    .iter()
                    .map(ToString::to_string)
                    .collect();
                query.append_pair("source__id__in", &ids.join(","));
            }
            for tag in &criteria.tags {
                query.append_pair("tags", &tag.to_string());
            }
        }
        if url.query() == Some("") {
            url.set_query(None);
        }
        self.list_all(url).await
    }

    async fn create_event(
        &self,
        pk: IncidentPk,
        kind: EventType,
        description: Option<&str>,
    ) -> Result<Event, ClientError> {
        let url = self.incident_url(pk, "events/")?;
        let body = EventRequest { kind, description };
        self.send_json(self.request(Method::POST, url).json(&body))
            .await
    }

    async fn create_acknowledgement(
        &self,
        pk: IncidentPk,
        body: &AcknowledgementBody,
    ) -> Result<Acknowledgement, ClientError> {
        let url = self.incident_url(pk, "acks/")?;
        let body = AckRequest {
            event: AckEventRequest {
                description: &body.description,
            },
            expiration: body.expiration,
        };
        self.send_json(self.request(Method::POST, url).json(&body))
            .await
    }

    async fn set_ticket_url(
        &self,
        pk: IncidentPk,
        ticket_url: &str,
    ) -> Result<TicketUrlBody, ClientError> {
        let url = self.incident_url(pk, "ticket_url/")?;
        let body = TicketUrlRequest { ticket_url };
        self.send_json(self.request(Method::PATCH, url).json(&body))
            .await
    }

    async fn list_acknowledgements(&self, pk: IncidentPk) -> Result<Vec<Acknowledgement>, ClientError> {
        self.list_all(self.incident_url(pk, "acks/")?).await
    }

    async fn list_events(&self, pk: IncidentPk) -> Result<Vec<Event>, ClientError> {
        self.list_all(self.incident_url(pk, "events/")?).await
    }
}
