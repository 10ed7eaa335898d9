//! Per-invocation view of the ledger.

use crate::config::{ConfigError, ProvenanceConfig};
use crate::errors::{ProvenanceError, Result};
use chrono::{DateTime, Utc};
use pc_01_ledger_store::{Namespace, PartitionedStore, TransactionContext};
use shared_types::{CollectionName, OrgId, EMISSIONS_NAMESPACE, PROVENANCE_NAMESPACE};
use std::fmt::Write;

/// Everything a handler needs for one transaction: the substrate context,
/// the contract configuration and a typed store scoped to this contract.
pub struct Session<'a, C: TransactionContext + ?Sized> {
    ctx: &'a C,
    config: &'a ProvenanceConfig,
    store: PartitionedStore<'a, C>,
}

impl<'a, C: TransactionContext + ?Sized> Session<'a, C> {
    pub fn new(ctx: &'a C, config: &'a ProvenanceConfig) -> Self {
        Self {
            ctx,
            config,
            store: PartitionedStore::new(ctx, Namespace::new(PROVENANCE_NAMESPACE)),
        }
    }

    pub fn ctx(&self) -> &'a C {
        self.ctx
    }

    pub fn config(&self) -> &'a ProvenanceConfig {
        self.config
    }

    pub fn store(&self) -> &PartitionedStore<'a, C> {
        &self.store
    }

    /// Read view of the emissions contract's records.
    pub fn emissions(&self) -> PartitionedStore<'a, C> {
        PartitionedStore::new(self.ctx, Namespace::new(EMISSIONS_NAMESPACE))
    }

    pub fn shared_collection(&self) -> &'a CollectionName {
        &self.config.shipping_collection
    }

    pub fn caller(&self) -> Result<OrgId> {
        Ok(self.ctx.caller_org()?)
    }

    /// Private collection of the calling organisation.
    pub fn own_collection(&self) -> Result<CollectionName> {
        Ok(self.config.collection_of(&self.caller()?))
    }

    pub fn timestamp(&self) -> Result<DateTime<Utc>> {
        Ok(self.ctx.tx_timestamp()?)
    }

    /// Transaction date in the configured shipment date format.
    pub fn today(&self) -> Result<String> {
        let stamp = self.timestamp()?;
        let mut today = String::new();
        write!(today, "{}", stamp.format(&self.config.date_format))
            .map_err(|_| ConfigError::DateFormat(self.config.date_format.clone()))?;
        Ok(today)
    }

    /// Raw request payload from the transient map.
    pub fn transient_payload(&self) -> Result<Vec<u8>> {
        self.ctx
            .transient(&self.config.transient_key)?
            .ok_or_else(|| {
                ProvenanceError::validation(format!(
                    "{} not found in the transient map input",
                    self.config.transient_key
                ))
            })
    }
}
