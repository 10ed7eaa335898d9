//! # Error Types
//!
//! Caller-visible failures of the asset-provenance contract. Any of these
//! aborts the whole transaction. Soft policy violations are not errors;
//! see [`crate::domain::PolicyViolation`].

use crate::config::ConfigError;
use pc_01_ledger_store::StoreError;
use shared_types::{CollectionName, OrgId};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ProvenanceError {
    /// Malformed or missing request field.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Referenced record is absent.
    #[error("{kind} {id} does not exist")]
    NotFound { kind: &'static str, id: String },

    /// A record already exists under the target id.
    #[error("{kind} {id} already exists")]
    Conflict { kind: &'static str, id: String },

    /// Caller submitted to a peer of another organisation.
    #[error("Client from org {caller} is not authorized to read or write private data from an org {host} peer")]
    Authorization { caller: OrgId, host: OrgId },

    /// The caller's organisation was never granted a role.
    #[error("Need to receive rights to use this function: no rights record in {collection}")]
    RightsMissing { collection: CollectionName },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl ProvenanceError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn conflict(kind: &'static str, id: impl Into<String>) -> Self {
        Self::Conflict {
            kind,
            id: id.into(),
        }
    }

    /// Stable label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::NotFound { .. } => "not_found",
            Self::Conflict { .. } => "conflict",
            Self::Authorization { .. } => "authorization",
            Self::RightsMissing { .. } => "rights_missing",
            Self::Store(_) => "store",
            Self::Config(_) => "config",
        }
    }
}

pub type Result<T> = std::result::Result<T, ProvenanceError>;
