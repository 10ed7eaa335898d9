//! # Error Types
//!
//! Errors raised while interpreting shared record fields.

use thiserror::Error;

/// Errors converting strings into shared enums.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeError {
    /// Role outside Mine, Supplier, OEM.
    #[error("Role does not fit any of the predefined ones [Mine,Supplier,OEM]: {0}")]
    UnknownRole(String),

    /// Direction other than `in` or `out`.
    #[error("Unknown asset direction: {0}")]
    UnknownDirection(String),
}
