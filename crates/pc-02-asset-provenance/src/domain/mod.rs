//! Pure contract logic. Nothing in here touches the ledger.

pub mod lineage;
pub mod policy;
pub mod recipe;
pub mod requests;

pub use lineage::*;
pub use policy::*;
pub use recipe::*;
pub use requests::*;
