//! # Shipment Hand-off Protocol
//!
//! ```text
//!   absent ──createShipment──→ published ──claimShipment──→ claimed
//! ```
//!
//! The seller keeps the full `ShippingPrivate` record in its own collection
//! and publishes only `{id, seller, name}` to the shared collection. A buyer
//! claims by submitting its own reconstruction of the seller record; the
//! claim goes through only if the reconstruction hashes to the commitment
//! the substrate reports for the seller's record. Neither side ever reads
//! the other's private data.

use crate::deletion_queue;
use crate::domain::{Checked, ClaimShipmentRequest, CreateShipmentRequest, PolicyViolation};
use crate::errors::ProvenanceError;
use crate::gate;
use crate::session::Session;
use pc_01_ledger_store::{hash_hex, TransactionContext};
use provenance_telemetry::{metric_inc, SHIPMENTS_CLAIMED, SHIPMENTS_CREATED};
use shared_types::{Asset, Direction, ShippingPrivate, ShippingPublic};
use tracing::{debug, info};

pub fn create_shipment<C>(session: &Session<'_, C>, request: &CreateShipmentRequest) -> Checked<()>
where
    C: TransactionContext + ?Sized,
{
    let seller = gate::require_same_org_as_peer(session)?;
    let own = gate::resolve_org_collection(session)?;
    gate::reject_reserved_id(&request.id)?;

    let today = session.today()?;
    if request.date != today {
        return Err(PolicyViolation::DateMismatch {
            submitted: request.date.clone(),
            expected: today,
        }
        .into());
    }

    let store = session.store();
    if store.private_exists(&own, &request.id)? {
        return Err(ProvenanceError::conflict("Shipment", &request.id).into());
    }
    if store
        .get_private::<ShippingPublic>(session.shared_collection(), &request.id)?
        .is_some()
    {
        return Err(ProvenanceError::conflict("Shipment pointer", &request.id).into());
    }

    let mut legs = Vec::with_capacity(request.asset_ids.len());
    for id in &request.asset_ids {
        let asset: Asset = store
            .get_private(&own, id)?
            .ok_or_else(|| ProvenanceError::not_found("Asset", id))?;
        if asset.name != request.name {
            return Err(ProvenanceError::validation(format!(
                "All assets being shipped out must be named {}, {} is {}",
                request.name, id, asset.name
            ))
            .into());
        }
        if asset.direction != Direction::Out {
            return Err(ProvenanceError::validation(format!(
                "Asset {id} is not meant to be shipped out"
            ))
            .into());
        }
        legs.push(asset.emissions_ids);
    }

    for id in &request.asset_ids {
        debug!(asset_id = %id, collection = %own, "Shipped");
        store.delete_private(&own, id)?;
    }

    // Transport leg i belongs to asset i
    for (emissions, leg) in legs.iter_mut().zip(&request.shipped_emissions_ids) {
        emissions.push(leg.clone());
    }

    let private = ShippingPrivate {
        id: request.id.clone(),
        quantity: request.quantity,
        asset_ids: request.asset_ids.clone(),
        name: request.name.clone(),
        date: request.date.clone(),
        emissions_ids: legs,
    };
    store.put_private(&own, &private.id, &private)?;

    let pointer = ShippingPublic {
        id: request.id.clone(),
        seller,
        name: request.name.clone(),
    };
    store.put_private(session.shared_collection(), &pointer.id, &pointer)?;

    metric_inc!(SHIPMENTS_CREATED);
    info!(
        shipment_id = %private.id,
        quantity = private.quantity,
        commitment = %hash_hex(&store.commitment_of(&private)?),
        "Shipment published"
    );
    Ok(())
}

pub fn claim_shipment<C>(session: &Session<'_, C>, request: &ClaimShipmentRequest) -> Checked<()>
where
    C: TransactionContext + ?Sized,
{
    let buyer = gate::require_same_org_as_peer(session)?;
    let own = gate::resolve_org_collection(session)?;
    gate::reject_reserved_id(&request.id)?;

    let store = session.store();
    let shared = session.shared_collection();
    let pointer: ShippingPublic = store
        .get_private(shared, &request.id)?
        .ok_or_else(|| ProvenanceError::not_found("Shipment", &request.id))?;

    if pointer.seller == buyer {
        return Err(PolicyViolation::SelfClaim {
            shipment_id: request.id.clone(),
        }
        .into());
    }

    let seller_collection = session.config().collection_of(&pointer.seller);
    let committed = store
        .private_hash(&seller_collection, &request.id)?
        .ok_or_else(|| ProvenanceError::not_found("Shipment commitment", &request.id))?;
    let reconstructed = store.commitment_of(&request.reconstruct())?;
    if reconstructed != committed {
        debug!(
            shipment_id = %request.id,
            seller_hash = %hash_hex(&committed),
            buyer_hash = %hash_hex(&reconstructed),
            "Commitment mismatch"
        );
        return Err(PolicyViolation::CommitmentMismatch {
            shipment_id: request.id.clone(),
        }
        .into());
    }

    for id in &request.asset_ids {
        if store.private_exists(&own, id)? {
            return Err(ProvenanceError::conflict("Asset", id).into());
        }
    }

    // Both the queue entry and the direct pointer delete are kept
    deletion_queue::enqueue(session, &request.id)?;
    store.delete_private(shared, &request.id)?;

    for (id, emissions_ids) in request.asset_ids.iter().zip(&request.emissions_ids) {
        let asset = Asset {
            name: request.name.clone(),
            id: id.clone(),
            emissions_ids: emissions_ids.clone(),
            direction: Direction::In,
        };
        store.put_private(&own, &asset.id, &asset)?;
    }

    metric_inc!(SHIPMENTS_CLAIMED);
    info!(
        shipment_id = %request.id,
        seller = %pointer.seller,
        assets = request.asset_ids.len(),
        "Shipment claimed"
    );
    Ok(())
}
