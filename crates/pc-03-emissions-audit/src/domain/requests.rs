//! Audit submissions.

use crate::errors::{AuditError, Result};
use serde::{Deserialize, Serialize};

/// One emissions figure offered for the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRequest {
    #[serde(rename = "ID")]
    pub id: String,
    /// Earlier records the figure is compared against.
    #[serde(rename = "prevEmissionsIDs", default)]
    pub prior_ids: Vec<String>,
    #[serde(rename = "KgCO2")]
    pub kg_co2: i64,
    /// Free-form context from the submitter. Logged, never stored.
    #[serde(rename = "info", default)]
    pub note: String,
}

impl AuditRequest {
    pub fn new(id: impl Into<String>, prior_ids: Vec<String>, kg_co2: i64) -> Self {
        Self {
            id: id.into(),
            prior_ids,
            kg_co2,
            note: String::new(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.id.is_empty() {
            return Err(AuditError::validation("ID must be a non-empty string"));
        }
        if self.prior_ids.iter().any(|id| id == &self.id) {
            return Err(AuditError::validation(format!(
                "{} cannot be audited against itself",
                self.id
            )));
        }
        Ok(())
    }

    /// Parses positional arguments `[id, priorIDs (JSON array), kgCO2, info]`.
    pub fn from_args(args: &[&str]) -> Result<Self> {
        let [id, priors, kg, rest @ ..] = args else {
            return Err(AuditError::validation(
                "expected arguments: id, prevEmissionsIDs, kgCO2[, info]",
            ));
        };
        let prior_ids: Vec<String> = if priors.is_empty() {
            Vec::new()
        } else {
            serde_json::from_str(priors).map_err(|e| {
                AuditError::validation(format!("prevEmissionsIDs is not a JSON list: {e}"))
            })?
        };
        let kg_co2 = kg
            .parse()
            .map_err(|_| AuditError::validation(format!("kgCO2 is not an integer: {kg}")))?;
        Ok(Self {
            id: id.to_string(),
            prior_ids,
            kg_co2,
            note: rest.first().map(|s| s.to_string()).unwrap_or_default(),
        })
    }
}
