//! # Shared Types Crate
//!
//! Record types, identifiers and reserved keys shared by all Provenance-Chain
//! subsystems.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: every record stored on the ledger is defined here.
//! - **Stable Wire Layout**: JSON field names and order never change, because
//!   commitment hashes are computed over the serialized bytes.
//! - **Identity from Context**: records never carry the caller's organisation
//!   unless it is part of the published data (shipment seller).

pub mod entities;
pub mod errors;

pub use entities::*;
pub use errors::*;
