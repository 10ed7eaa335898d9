//! Read accessors.
//!
//! No drain, no gate, no writes. Private reads are limited by collection
//! membership, which the substrate enforces.

use crate::deletion_queue;
use crate::domain::{lineage, LineageNode};
use crate::errors::{ProvenanceError, Result};
use crate::flags;
use crate::session::Session;
use pc_01_ledger_store::TransactionContext;
use serde::de::DeserializeOwned;
use shared_types::{
    Asset, CollectionName, DeletionQueue, FinalAsset, Flag, PublicAsset, Recipe, ShippingPrivate,
    ShippingPublic,
};

fn public<C, R>(session: &Session<'_, C>, kind: &'static str, id: &str) -> Result<R>
where
    C: TransactionContext + ?Sized,
    R: DeserializeOwned,
{
    session
        .store()
        .get_public(id)?
        .ok_or_else(|| ProvenanceError::not_found(kind, id))
}

fn private<C, R>(
    session: &Session<'_, C>,
    collection: &CollectionName,
    kind: &'static str,
    id: &str,
) -> Result<R>
where
    C: TransactionContext + ?Sized,
    R: DeserializeOwned,
{
    session
        .store()
        .get_private(collection, id)?
        .ok_or_else(|| ProvenanceError::not_found(kind, id))
}

fn values<R>(entries: Vec<(String, R)>) -> Vec<R> {
    entries.into_iter().map(|(_, record)| record).collect()
}

pub fn read_public_asset<C>(session: &Session<'_, C>, id: &str) -> Result<PublicAsset>
where
    C: TransactionContext + ?Sized,
{
    public(session, "Public asset", id)
}

/// Terminal products only. An intermediate asset under `id` is reported as
/// not found.
pub fn read_final_asset<C>(session: &Session<'_, C>, id: &str) -> Result<FinalAsset>
where
    C: TransactionContext + ?Sized,
{
    match public::<C, LineageNode>(session, "Final asset", id)? {
        LineageNode::Final(asset) => Ok(asset),
        LineageNode::Intermediate(_) => Err(ProvenanceError::not_found("Final asset", id)),
    }
}

pub fn read_private_asset<C>(
    session: &Session<'_, C>,
    collection: &CollectionName,
    id: &str,
) -> Result<Asset>
where
    C: TransactionContext + ?Sized,
{
    private(session, collection, "Asset", id)
}

pub fn read_recipe<C>(
    session: &Session<'_, C>,
    collection: &CollectionName,
    id: &str,
) -> Result<Recipe>
where
    C: TransactionContext + ?Sized,
{
    private(session, collection, "Recipe", id)
}

pub fn read_public_shipment<C>(session: &Session<'_, C>, id: &str) -> Result<ShippingPublic>
where
    C: TransactionContext + ?Sized,
{
    private(session, session.shared_collection(), "Shipment", id)
}

pub fn read_private_shipment<C>(
    session: &Session<'_, C>,
    collection: &CollectionName,
    id: &str,
) -> Result<ShippingPrivate>
where
    C: TransactionContext + ?Sized,
{
    private(session, collection, "Shipment", id)
}

/// The current backlog. An absent queue reads as empty.
pub fn read_deletion_queue<C>(session: &Session<'_, C>) -> Result<DeletionQueue>
where
    C: TransactionContext + ?Sized,
{
    Ok(deletion_queue::read(session)?.unwrap_or_default())
}

pub fn list_assets<C>(session: &Session<'_, C>, collection: &CollectionName) -> Result<Vec<Asset>>
where
    C: TransactionContext + ?Sized,
{
    Ok(values(session.store().scan_private(collection)?))
}

pub fn list_recipes<C>(session: &Session<'_, C>, collection: &CollectionName) -> Result<Vec<Recipe>>
where
    C: TransactionContext + ?Sized,
{
    Ok(values(session.store().scan_private(collection)?))
}

pub fn list_private_shipments<C>(
    session: &Session<'_, C>,
    collection: &CollectionName,
) -> Result<Vec<ShippingPrivate>>
where
    C: TransactionContext + ?Sized,
{
    Ok(values(session.store().scan_private(collection)?))
}

/// Every open shipment pointer. Claimed shipments are gone from this list.
pub fn list_public_shipments<C>(session: &Session<'_, C>) -> Result<Vec<ShippingPublic>>
where
    C: TransactionContext + ?Sized,
{
    Ok(values(
        session.store().scan_private(session.shared_collection())?,
    ))
}

/// Ids reachable from `id` through `basedOn`, breadth-first, `id` first.
pub fn trace_lineage<C>(session: &Session<'_, C>, id: &str) -> Result<Vec<String>>
where
    C: TransactionContext + ?Sized,
{
    let store = session.store();
    lineage::trace(id, |node| Ok(store.get_public::<LineageNode>(node)?))
}

pub fn list_flags<C>(session: &Session<'_, C>, collection: &CollectionName) -> Result<Vec<Flag>>
where
    C: TransactionContext + ?Sized,
{
    flags::list(session, collection)
}
