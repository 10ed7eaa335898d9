//! # Audit Configuration
//!
//! Parameters of the outlier gate plus the naming the audit contract shares
//! with the provenance contract.

use crate::domain::{OutlierParams, QuartileMethod};
use pc_02_asset_provenance::ProvenanceConfig;
use std::env;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub struct AuditConfig {
    /// Outlier gate parameters.
    pub outlier: OutlierParams,
    /// Transient map key carrying the record owner.
    pub owner_key: String,
    /// Collection naming and deletion queue location.
    pub provenance: ProvenanceConfig,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            outlier: OutlierParams::default(),
            owner_key: "ownerID".to_string(),
            provenance: ProvenanceConfig::default(),
        }
    }
}

impl AuditConfig {
    /// Defaults overridden by environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `PC_AUDIT_MIN_IQR_SAMPLES` (default: 5)
    /// - `PC_AUDIT_IQR_MULTIPLIER` (default: 1.5)
    /// - `PC_AUDIT_QUARTILE_METHOD` (`linear` or `shifted-rank`, default: linear)
    /// - every `PC_*` variable read by [`ProvenanceConfig::from_env`]
    pub fn from_env() -> Result<Self, AuditConfigError> {
        let mut config = Self {
            provenance: ProvenanceConfig::from_env()
                .map_err(|e| AuditConfigError::Provenance(e.to_string()))?,
            ..Self::default()
        };
        if let Ok(v) = env::var("PC_AUDIT_MIN_IQR_SAMPLES") {
            config.outlier.min_iqr_samples = v
                .parse()
                .map_err(|_| AuditConfigError::Invalid("PC_AUDIT_MIN_IQR_SAMPLES", v))?;
        }
        if let Ok(v) = env::var("PC_AUDIT_IQR_MULTIPLIER") {
            config.outlier.iqr_multiplier = v
                .parse()
                .map_err(|_| AuditConfigError::Invalid("PC_AUDIT_IQR_MULTIPLIER", v))?;
        }
        if let Ok(v) = env::var("PC_AUDIT_QUARTILE_METHOD") {
            config.outlier.quartile_method = match v.as_str() {
                "linear" => QuartileMethod::Linear,
                "shifted-rank" => QuartileMethod::ShiftedRank,
                _ => return Err(AuditConfigError::Invalid("PC_AUDIT_QUARTILE_METHOD", v)),
            };
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AuditConfigError> {
        let params = &self.outlier;
        if params.min_iqr_samples < 2 {
            return Err(AuditConfigError::OutOfRange(
                "min_iqr_samples must be at least 2",
            ));
        }
        if !(params.band_ratio > 0.0 && params.band_ratio < 1.0) {
            return Err(AuditConfigError::OutOfRange(
                "band_ratio must lie strictly between 0 and 1",
            ));
        }
        if !(params.iqr_multiplier.is_finite() && params.iqr_multiplier >= 0.0) {
            return Err(AuditConfigError::OutOfRange(
                "iqr_multiplier must be a non-negative number",
            ));
        }
        if self.owner_key.is_empty() {
            return Err(AuditConfigError::OutOfRange("owner_key must not be empty"));
        }
        self.provenance
            .validate()
            .map_err(|e| AuditConfigError::Provenance(e.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuditConfigError {
    #[error("{0} has an unparseable value: {1}")]
    Invalid(&'static str, String),

    #[error("{0}")]
    OutOfRange(&'static str),

    #[error("provenance settings: {0}")]
    Provenance(String),
}
