//! # pc-01-ledger-store
//!
//! Partitioned Store Adapter for Provenance-Chain.
//!
//! ## Role in System
//!
//! - **Leaf Dependency**: every other subsystem reads and writes through this crate
//! - **Two Partitions**: a globally replicated public state, and private
//!   collections restricted to a member set of organisations
//! - **Commitments**: the SHA-256 of a private value can be read by any
//!   organisation without granting access to the value itself
//!
//! ## Layers
//!
//! ```text
//!   pc-02 / pc-03 services
//!            │
//!            ↓
//!   PartitionedStore  (typed records, key namespaces)
//!            │
//!            ↓
//!   TransactionContext port  ←── InMemoryLedger adapter (tests, dev)
//!                           ←── substrate bindings (external)
//! ```
//!
//! ## Transaction Model
//!
//! One contract invocation is one transaction. All writes are staged and
//! applied together on commit; nothing is visible to other transactions
//! before that. The substrate rejects a commit whose reads went stale.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod store;

pub use adapters::*;
pub use domain::*;
pub use ports::*;
pub use store::PartitionedStore;
