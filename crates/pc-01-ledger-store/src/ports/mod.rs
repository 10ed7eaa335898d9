pub mod substrate;

pub use substrate::*;
