//! # Provenance-Chain Test Suite
//!
//! Unified test crate containing:
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── fixtures.rs       # Four-organisation network on the in-memory ledger
//! └── integration/      # Cross-contract flows
//!     ├── supply_chain_flows.rs
//!     └── emissions_flows.rs
//! tests/benches/
//! └── audit_benchmarks.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p pc-tests
//! cargo test -p pc-tests integration::supply_chain_flows
//! cargo bench -p pc-tests
//! ```

pub mod fixtures;
pub mod integration;
