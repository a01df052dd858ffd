//! incident-sync entry point.
//!
//! Loads saved filters and open incidents from the configured backend
//! into a fresh store, logs every store change, and prints a JSON summary.

use std::sync::Arc;

use serde::Serialize;
use tracing_subscriber::EnvFilter;

use incident_sync::client::HttpResourceClient;
use incident_sync::config::DashboardConfig;
use incident_sync::dashboard::Dashboard;
use incident_sync::domain::{BulkState, EventBus, FeedMessage, FilterCriteria};

#[derive(Debug, Serialize)]
struct Summary {
    api_url: String,
    filters: Vec<String>,
    open_incidents: usize,
    unacked_incidents: usize,
    bulk: BulkState,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = DashboardConfig::from_env()?;
    tracing::info!(api_url = %config.api_url, "starting incident-sync");

    let client = Arc::new(HttpResourceClient::from_config(&config)?);
    let dashboard = Dashboard::new(client, EventBus::new(config.event_bus_capacity));

    // Log store changes
    let mut feed = dashboard.feed();
    let logger = tokio::spawn(async move {
        while let Some(message) = feed.next().await {
            match message {
                FeedMessage::Changed(event) => tracing::debug!(
                    event_type = event.event_type_str(),
                    incident = ?event.incident_pk(),
                    "store changed"
                ),
                FeedMessage::Resync { missed } => {
                    tracing::debug!(missed, "store feed resynced");
                }
            }
        }
    });

    let filters = dashboard.filter_service().load_all_filters().await?;
    let incidents = dashboard
        .incident_service()
        .load_incidents_filtered(&FilterCriteria::open_only())
        .await?;

    let summary = Summary {
        api_url: config.api_url.to_string(),
        filters: filters.into_iter().map(|f| f.name).collect(),
        open_incidents: incidents.len(),
        unacked_incidents: incidents.iter().filter(|i| !i.acked).count(),
        bulk: dashboard.store().bulk_state(),
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);

    logger.abort();
    Ok(())
}
