//! # incident-sync
//!
//! Client-side action and state-synchronization layer for an incident
//! dashboard.
//!
//! Every user action is a two-phase operation: a remote call against the
//! incident backend's REST API, followed on success by exactly one
//! transition of the local [`domain::DomainStore`]. Bulk incident actions
//! run strictly sequentially and are gated by a store-owned bulk slot.
//!
//! ## Architecture
//!
//! ```text
//! View code
//!     │
//!     ├── Dashboard (dashboard.rs)      snapshot + action handle
//!     │
//!     ├── FilterService / IncidentService (service/)
//!     │       └── sequential bulk runner
//!     │
//!     ├── ResourceClient (client/)      HTTP, token auth
//!     │
//!     ├── DomainStore (domain/)         filters, incidents, bulk state
//!     └── EventBus (domain/)            StoreEvent feed
//! ```

pub mod client;
pub mod config;
pub mod dashboard;
pub mod domain;
pub mod error;
pub mod service;
pub mod validation;
