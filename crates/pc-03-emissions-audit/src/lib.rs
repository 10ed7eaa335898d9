//! # Emissions Audit Subsystem
//!
//! Statistical admission control for emissions figures.
//!
//! A submission names the earlier records it should be comparable to. The
//! new figure is admitted only inside an acceptance interval derived from
//! those priors:
//!
//! | Priors | Interval |
//! |--------|----------|
//! | none | unbounded (first figure of a series) |
//! | fewer than 5 | median ± 50% |
//! | 5 or more | Tukey fences, `Q1 - 1.5·IQR ..= Q3 + 1.5·IQR` |
//!
//! Admitted figures are public (`EmissionsRecord`); the reporting owner is
//! kept in the submitting organisation's private collection
//! (`EmissionsRecordPrivateDetails`).

pub mod config;
pub mod domain;
pub mod errors;
pub mod service;

pub use config::{AuditConfig, AuditConfigError};
pub use domain::*;
pub use errors::{AuditError, Result};
pub use service::{EmissionsAuditService, ServiceStats};
