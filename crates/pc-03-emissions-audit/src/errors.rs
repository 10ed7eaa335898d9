//! # Error Types
//!
//! Every variant aborts the audit transaction. There are no soft outcomes
//! here: a rejected figure is an error the submitter must act on.

use crate::config::AuditConfigError;
use pc_01_ledger_store::StoreError;
use pc_02_asset_provenance::ProvenanceError;
use shared_types::OrgId;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum AuditError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("{kind} {id} does not exist")]
    NotFound { kind: &'static str, id: String },

    #[error("the Emissions Record with ID {id} already exists")]
    Conflict { id: String },

    #[error("Client from org {caller} is not authorized to read or write private data from an org {host} peer")]
    Authorization { caller: OrgId, host: OrgId },

    /// Figure lies outside the acceptance interval of its priors.
    #[error("the submitted emissions ({kg_co2} kg CO2) do not pass the automated audit (accepted range [{lower}, {upper}]), please contact an administrator for manual reauditing")]
    AuditRejected { kg_co2: i64, lower: f64, upper: f64 },

    /// Prior records named by the submitter are missing from the ledger.
    #[error("records on public ledger do not match the submitted priors, missing: {missing:?}")]
    IntegrityMismatch { missing: Vec<String> },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Configuration error: {0}")]
    Config(#[from] AuditConfigError),
}

impl AuditError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
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
            Self::AuditRejected { .. } => "rejected",
            Self::IntegrityMismatch { .. } => "integrity_mismatch",
            Self::Store(_) => "store",
            Self::Config(_) => "config",
        }
    }
}

/// The shared pre-step and gate helpers report in provenance terms.
impl From<ProvenanceError> for AuditError {
    fn from(e: ProvenanceError) -> Self {
        match e {
            ProvenanceError::Validation(msg) => Self::Validation(msg),
            ProvenanceError::NotFound { kind, id } => Self::NotFound { kind, id },
            ProvenanceError::Conflict { id, .. } => Self::Conflict { id },
            ProvenanceError::Authorization { caller, host } => {
                Self::Authorization { caller, host }
            }
            ProvenanceError::Store(e) => Self::Store(e),
            other => Self::Validation(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, AuditError>;
