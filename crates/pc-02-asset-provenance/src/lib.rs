//! # Asset Provenance Subsystem
//!
//! Confidential asset lifecycle for a multi-organisation supply chain.
//!
//! ## Components
//!
//! | Module | Role |
//! |--------|------|
//! | [`gate`] | Caller/peer identity, rights records, role checks |
//! | [`manufacturing`] | Raw material intake, recipe registration, recipe-checked consumption, terminal products |
//! | [`shipment`] | Hash-committed hand-off of private assets between organisations |
//! | [`deletion_queue`] | Deferred cleanup of claimed shipments |
//! | [`flags`] | Audit trail of soft policy violations |
//! | [`queries`] | Read accessors and lineage tracing |
//! | [`service`] | Orchestration: drain, gate, handle, flag |
//!
//! ## Failure Model
//!
//! | Outcome | Caller sees | State |
//! |---------|-------------|-------|
//! | Applied | `Ok` | handler writes |
//! | Policy violation | `Ok` | one new flag in the caller's collection |
//! | [`ProvenanceError`] | `Err` | transaction discarded |
//!
//! ## Storage Layout
//!
//! | Partition | Records |
//! |-----------|---------|
//! | public | `PublicAsset`, `FinalAsset` |
//! | `<org>PrivateCollection` | `Rights`, `Asset`, `Recipe`, `ShippingPrivate`, `Flag` |
//! | `shippingCollection` | `ShippingPublic`, `DeletionQueue` |

pub mod config;
pub mod deletion_queue;
pub mod domain;
pub mod errors;
pub mod flags;
pub mod gate;
pub mod manufacturing;
pub mod queries;
pub mod service;
pub mod session;
pub mod shipment;

pub use config::{ConfigError, ProvenanceConfig};
pub use domain::*;
pub use errors::{ProvenanceError, Result};
pub use service::{ProvenanceService, ServiceStats};
pub use session::Session;

/// Common imports for callers of the contract.
pub mod prelude {
    pub use crate::config::ProvenanceConfig;
    pub use crate::domain::{
        ClaimShipmentRequest, CreateShipmentRequest, GrantRightsRequest, ManufactureRequest,
        RawAssetRequest, RecipeRequest,
    };
    pub use crate::errors::{ProvenanceError, Result};
    pub use crate::service::ProvenanceService;
}
