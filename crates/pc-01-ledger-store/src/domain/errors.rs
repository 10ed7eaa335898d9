use shared_types::{CollectionName, OrgId};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Collection {collection} is not readable by a peer of org {org}")]
    AccessDenied { org: OrgId, collection: CollectionName },

    #[error("Unknown private data collection: {0}")]
    UnknownCollection(CollectionName),

    #[error("MVCC read conflict on key {key}")]
    MvccConflict { key: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Identity error: {0}")]
    IdentityError(String),

    #[error("Backend error: {0}")]
    BackendError(String),

    #[error("Lock poisoned")]
    LockPoisoned,
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}
