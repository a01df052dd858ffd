//! Service layer: two-phase action orchestration.
//!
//! [`FilterService`] and [`IncidentService`] issue the remote call through
//! a [`crate::client::ResourceClient`], then apply exactly one store
//! transition per successful item. Bulk incident actions share the
//! sequential runner in `bulk`.

pub(crate) mod bulk;
pub mod filter_service;
pub mod incident_service;

pub use filter_service::FilterService;
pub use incident_service::IncidentService;
