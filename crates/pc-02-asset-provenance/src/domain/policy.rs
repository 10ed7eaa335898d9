//! Soft policy violations.
//!
//! A violation is never reported to the caller. The contract records it as
//! a flag in the caller's own collection and returns success without any
//! other state change.

use crate::errors::ProvenanceError;
use pc_01_ledger_store::StoreError;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyViolation {
    /// A create-style request used a reserved record id.
    ReservedId { id: String },
    /// The caller lacks the role or authority the operation requires.
    Unauthorized { operation: &'static str },
    /// Shipment date differs from the transaction's calendar date.
    DateMismatch { submitted: String, expected: String },
    /// Seller tried to claim its own shipment.
    SelfClaim { shipment_id: String },
    /// Buyer's reconstruction does not hash to the seller's commitment.
    CommitmentMismatch { shipment_id: String },
}

impl PolicyViolation {
    /// Message stored in the flag record.
    pub fn message(&self) -> String {
        match self {
            Self::ReservedId { id } => format!("GRAVE: tried to set ID to {id}"),
            Self::Unauthorized { operation } => {
                format!("Unauthorized attempt at invoking {operation} chaincode")
            }
            Self::DateMismatch { .. } => {
                "Shipment date does not match the transaction date".to_string()
            }
            Self::SelfClaim { .. } => "Attempt to claim its own shipment".to_string(),
            Self::CommitmentMismatch { .. } => "Failed attempt at claiming shipment".to_string(),
        }
    }

    /// Stable label for metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::ReservedId { .. } => "reserved_id",
            Self::Unauthorized { .. } => "unauthorized",
            Self::DateMismatch { .. } => "date_mismatch",
            Self::SelfClaim { .. } => "self_claim",
            Self::CommitmentMismatch { .. } => "commitment_mismatch",
        }
    }
}

impl fmt::Display for PolicyViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

/// Why a handler stopped early.
#[derive(Debug, Clone)]
pub enum Rejection {
    /// Recorded as a flag; the call still succeeds.
    Violation(PolicyViolation),
    /// Surfaced to the caller; the transaction aborts.
    Failure(ProvenanceError),
}

impl From<PolicyViolation> for Rejection {
    fn from(v: PolicyViolation) -> Self {
        Self::Violation(v)
    }
}

impl From<ProvenanceError> for Rejection {
    fn from(e: ProvenanceError) -> Self {
        Self::Failure(e)
    }
}

impl From<StoreError> for Rejection {
    fn from(e: StoreError) -> Self {
        Self::Failure(ProvenanceError::Store(e))
    }
}

/// Result of a handler step that may end in a soft violation.
pub type Checked<T> = std::result::Result<T, Rejection>;
