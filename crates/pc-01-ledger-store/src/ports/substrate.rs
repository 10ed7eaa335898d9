//! Ledger substrate ports.
//!
//! The contracts never talk to a concrete ledger. They see one transaction
//! through these traits: the key-value partitions, who is calling, and the
//! per-transaction inputs (timestamp and transient data).
//!
//! Methods take `&self`; writes are staged inside the transaction and only
//! become visible to others when the adapter commits it.

use crate::domain::{Hash, StoreError};
use chrono::{DateTime, Utc};
use shared_types::{CollectionName, OrgId};

/// A key and its raw value, as yielded by range scans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValue {
    pub key: String,
    pub value: Vec<u8>,
}

/// Iterator over a key range. Resources held by the substrate are released
/// on drop, on every exit path.
pub struct ScanIterator<'a> {
    inner: Box<dyn Iterator<Item = Result<KeyValue, StoreError>> + 'a>,
}

impl<'a> ScanIterator<'a> {
    pub fn new(inner: impl Iterator<Item = Result<KeyValue, StoreError>> + 'a) -> Self {
        Self {
            inner: Box::new(inner),
        }
    }

    pub fn empty() -> Self {
        Self::new(std::iter::empty())
    }
}

impl Iterator for ScanIterator<'_> {
    type Item = Result<KeyValue, StoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

/// Key-value access to the two partitions.
///
/// Range bounds: `start` is inclusive, `end` is exclusive, an empty string
/// leaves that side open.
pub trait LedgerState {
    fn get_public(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;
    fn put_public(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError>;
    fn scan_public(&self, start: &str, end: &str) -> Result<ScanIterator<'_>, StoreError>;

    /// Requires the executing peer's organisation to be a collection member.
    fn get_private(
        &self,
        collection: &CollectionName,
        key: &str,
    ) -> Result<Option<Vec<u8>>, StoreError>;

    /// Writes are accepted from any organisation, member or not.
    fn put_private(
        &self,
        collection: &CollectionName,
        key: &str,
        value: Vec<u8>,
    ) -> Result<(), StoreError>;

    /// Deleting an absent key is a no-op.
    fn delete_private(&self, collection: &CollectionName, key: &str) -> Result<(), StoreError>;

    fn scan_private(
        &self,
        collection: &CollectionName,
        start: &str,
        end: &str,
    ) -> Result<ScanIterator<'_>, StoreError>;

    /// SHA-256 of the stored bytes. Readable by non-members.
    fn private_hash(&self, collection: &CollectionName, key: &str)
        -> Result<Option<Hash>, StoreError>;
}

/// Authenticated identity of the submitter and of the executing peer.
pub trait CallerIdentity {
    fn caller_org(&self) -> Result<OrgId, StoreError>;
    fn host_org(&self) -> Result<OrgId, StoreError>;
}

/// Everything one contract invocation can observe.
pub trait TransactionContext: LedgerState + CallerIdentity {
    fn tx_id(&self) -> &str;

    /// Consensus timestamp of the transaction, identical on every endorser.
    fn tx_timestamp(&self) -> Result<DateTime<Utc>, StoreError>;

    /// Request payload that is never written to the ledger.
    fn transient(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;
}
