//! Record encoding and commitments.
//!
//! Records are stored as compact JSON. A commitment is the SHA-256 of the
//! exact stored bytes, so two parties that serialize the same record value
//! with these functions obtain the same commitment.

use crate::domain::StoreError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};

/// 32-byte SHA-256 digest.
pub type Hash = [u8; 32];

pub fn encode<R: Serialize + ?Sized>(record: &R) -> Result<Vec<u8>, StoreError> {
    Ok(serde_json::to_vec(record)?)
}

pub fn decode<R: DeserializeOwned>(bytes: &[u8]) -> Result<R, StoreError> {
    Ok(serde_json::from_slice(bytes)?)
}

pub fn commitment(bytes: &[u8]) -> Hash {
    Sha256::digest(bytes).into()
}

/// Commitment of a record as it would be stored.
pub fn commitment_of<R: Serialize + ?Sized>(record: &R) -> Result<Hash, StoreError> {
    Ok(commitment(&encode(record)?))
}

pub fn hash_hex(hash: &Hash) -> String {
    hex::encode(hash)
}
