//! # Partitioned Store
//!
//! Typed record access on top of a [`TransactionContext`]. Every key is
//! scoped to the namespace of the contract that owns the store, so the
//! provenance and emissions contracts can share one ledger without their
//! records colliding.

use crate::domain::{commitment_of, decode, encode, Hash, Namespace, StoreError};
use crate::ports::TransactionContext;
use serde::de::DeserializeOwned;
use serde::Serialize;
use shared_types::CollectionName;
use tracing::{debug, trace};

pub struct PartitionedStore<'a, C: ?Sized> {
    ctx: &'a C,
    namespace: Namespace,
}

impl<'a, C: TransactionContext + ?Sized> PartitionedStore<'a, C> {
    pub fn new(ctx: &'a C, namespace: Namespace) -> Self {
        Self { ctx, namespace }
    }

    pub fn context(&self) -> &'a C {
        self.ctx
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    // =========================================================================
    // PUBLIC STATE
    // =========================================================================

    pub fn get_public<R: DeserializeOwned>(&self, id: &str) -> Result<Option<R>, StoreError> {
        self.ctx
            .get_public(&self.namespace.key(id))?
            .map(|bytes| decode(&bytes))
            .transpose()
    }

    pub fn public_exists(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.ctx.get_public(&self.namespace.key(id))?.is_some())
    }

    pub fn put_public<R: Serialize>(&self, id: &str, record: &R) -> Result<(), StoreError> {
        debug!(namespace = %self.namespace, key = %id, "Put public");
        self.ctx.put_public(&self.namespace.key(id), encode(record)?)
    }

    /// Every record in the namespace that decodes as `R`, in key order.
    pub fn scan_public<R: DeserializeOwned>(&self) -> Result<Vec<(String, R)>, StoreError> {
        let (start, end) = self.namespace.range();
        let iter = self.ctx.scan_public(&start, &end)?;
        self.collect_decodable(iter)
    }

    // =========================================================================
    // PRIVATE COLLECTIONS
    // =========================================================================

    pub fn get_private<R: DeserializeOwned>(
        &self,
        collection: &CollectionName,
        id: &str,
    ) -> Result<Option<R>, StoreError> {
        self.ctx
            .get_private(collection, &self.namespace.key(id))?
            .map(|bytes| decode(&bytes))
            .transpose()
    }

    pub fn private_exists(&self, collection: &CollectionName, id: &str) -> Result<bool, StoreError> {
        Ok(self
            .ctx
            .get_private(collection, &self.namespace.key(id))?
            .is_some())
    }

    pub fn put_private<R: Serialize>(
        &self,
        collection: &CollectionName,
        id: &str,
        record: &R,
    ) -> Result<(), StoreError> {
        debug!(collection = %collection, key = %id, "Put private");
        self.ctx
            .put_private(collection, &self.namespace.key(id), encode(record)?)
    }

    pub fn delete_private(&self, collection: &CollectionName, id: &str) -> Result<(), StoreError> {
        debug!(collection = %collection, key = %id, "Delete private");
        self.ctx.delete_private(collection, &self.namespace.key(id))
    }

    /// Every record in the collection's namespace that decodes as `R`.
    /// Collections hold several record kinds, so non-matching entries are
    /// skipped rather than treated as corruption.
    pub fn scan_private<R: DeserializeOwned>(
        &self,
        collection: &CollectionName,
    ) -> Result<Vec<(String, R)>, StoreError> {
        let (start, end) = self.namespace.range();
        let iter = self.ctx.scan_private(collection, &start, &end)?;
        self.collect_decodable(iter)
    }

    /// Commitment of a private record, readable without membership.
    pub fn private_hash(
        &self,
        collection: &CollectionName,
        id: &str,
    ) -> Result<Option<Hash>, StoreError> {
        self.ctx.private_hash(collection, &self.namespace.key(id))
    }

    /// Commitment a record would have once stored through this store.
    pub fn commitment_of<R: Serialize>(&self, record: &R) -> Result<Hash, StoreError> {
        commitment_of(record)
    }

    fn collect_decodable<R: DeserializeOwned>(
        &self,
        iter: crate::ports::ScanIterator<'_>,
    ) -> Result<Vec<(String, R)>, StoreError> {
        let mut records = Vec::new();
        for entry in iter {
            let entry = entry?;
            let Some(id) = self.namespace.strip(&entry.key) else {
                continue;
            };
            match decode::<R>(&entry.value) {
                Ok(record) => records.push((id.to_string(), record)),
                Err(_) => trace!(key = %id, "Skipping record of another kind"),
            }
        }
        Ok(records)
    }
}
