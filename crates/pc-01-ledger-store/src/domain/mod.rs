pub mod codec;
pub mod errors;
pub mod keys;

pub use codec::*;
pub use errors::*;
pub use keys::*;
