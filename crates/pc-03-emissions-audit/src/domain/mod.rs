//! Pure audit logic and request types.

pub mod outlier;
pub mod requests;

pub use outlier::*;
pub use requests::*;
