//! # Recipe & Manufacturing Engine
//!
//! Lifecycle of an asset inside one organisation:
//!
//! ```text
//! receiveRawAsset ──→ Asset{in} ──┐
//!                                 ├─ consumeAssets ──→ Asset{out} + PublicAsset
//! claimShipment   ──→ Asset{in} ──┘        │
//!                                          └─ finalizeProduct ──→ FinalAsset (terminal)
//! ```
//!
//! Consumed assets are deleted from the private collection in the same
//! transaction that publishes the product.

use crate::domain::{
    match_recipe, tally, union_emissions, Checked, ManufactureRequest, RawAssetRequest,
    RecipeRequest,
};
use crate::errors::ProvenanceError;
use crate::gate;
use crate::session::Session;
use pc_01_ledger_store::TransactionContext;
use shared_types::{
    Asset, CollectionName, Direction, EmissionsRecord, FinalAsset, PublicAsset, Recipe, Role,
    LINEAGE_ROOT_SENTINEL,
};
use tracing::{debug, info, warn};

/// Stores a recipe in the target organisation's collection.
pub fn register_recipe<C>(session: &Session<'_, C>, request: &RecipeRequest) -> Checked<()>
where
    C: TransactionContext + ?Sized,
{
    let caller = gate::require_same_org_as_peer(session)?;
    gate::reject_reserved_id(&request.id)?;
    gate::require_issuing_authority(session, &caller, "registerRecipe")?;

    let collection = CollectionName::new(request.collection.as_str());
    let store = session.store();
    // Hash reads work for non-members, so the authority can check for a
    // duplicate in a collection it cannot read
    if store.private_hash(&collection, &request.id)?.is_some() {
        return Err(ProvenanceError::conflict("Recipe", &request.id).into());
    }

    let recipe = Recipe {
        id: request.id.clone(),
        product: request.product.clone(),
        ingredients: request.ingredients.clone(),
        quantities: request.quantities.clone(),
    };
    store.put_private(&collection, &recipe.id, &recipe)?;
    info!(recipe_id = %recipe.id, collection = %collection, "Recipe registered");
    Ok(())
}

/// Base case of the lineage graph: raw material enters at a mine.
pub fn receive_raw_asset<C>(session: &Session<'_, C>, request: &RawAssetRequest) -> Checked<()>
where
    C: TransactionContext + ?Sized,
{
    gate::require_same_org_as_peer(session)?;
    let own = gate::resolve_org_collection(session)?;
    gate::reject_reserved_id(&request.id)?;
    gate::require_role(session, &own, Role::Mine, "receiveRawAsset")?;

    let store = session.store();
    if store.public_exists(&request.id)? {
        return Err(ProvenanceError::conflict("Asset", &request.id).into());
    }

    let public = PublicAsset {
        id: request.id.clone(),
        emissions_ids: request.emissions_ids.clone(),
        based_on: vec![LINEAGE_ROOT_SENTINEL.to_string()],
    };
    store.put_public(&public.id, &public)?;

    let asset = Asset {
        name: request.name.clone(),
        id: request.id.clone(),
        emissions_ids: request.emissions_ids.clone(),
        direction: Direction::In,
    };
    store.put_private(&own, &asset.id, &asset)?;
    info!(asset_id = %asset.id, collection = %own, "Raw asset received");
    Ok(())
}

/// Intermediate manufacturing. Produces a tradeable `out` asset.
pub fn consume_assets<C>(session: &Session<'_, C>, request: &ManufactureRequest) -> Checked<()>
where
    C: TransactionContext + ?Sized,
{
    gate::require_same_org_as_peer(session)?;
    let own = gate::resolve_org_collection(session)?;
    gate::reject_reserved_id(&request.id)?;

    let recipe = load_recipe(session, &own, request)?;
    if recipe.product == session.config().terminal_product {
        return Err(ProvenanceError::validation(
            "Use the finalizeProduct function to create the final product",
        )
        .into());
    }
    let emissions_ids = consume(session, &own, &recipe, request)?;

    let store = session.store();
    let public = PublicAsset {
        id: request.id.clone(),
        emissions_ids: emissions_ids.clone(),
        based_on: request.assets.clone(),
    };
    store.put_public(&public.id, &public)?;

    let product = Asset {
        name: request.name.clone(),
        id: request.id.clone(),
        emissions_ids,
        direction: Direction::Out,
    };
    store.put_private(&own, &product.id, &product)?;
    info!(
        asset_id = %product.id,
        recipe_id = %recipe.id,
        consumed = request.assets.len(),
        "Asset manufactured"
    );
    Ok(())
}

/// Terminal manufacturing, OEM only. Publishes a `FinalAsset` carrying the
/// summed emissions of its lineage. No private mirror is written, so the
/// product can never be consumed or shipped.
pub fn finalize_product<C>(session: &Session<'_, C>, request: &ManufactureRequest) -> Checked<()>
where
    C: TransactionContext + ?Sized,
{
    gate::require_same_org_as_peer(session)?;
    let own = gate::resolve_org_collection(session)?;
    gate::reject_reserved_id(&request.id)?;
    gate::require_role(session, &own, Role::Oem, "finalizeProduct")?;

    let recipe = load_recipe(session, &own, request)?;
    let emissions_ids = consume(session, &own, &recipe, request)?;
    let ghg = total_emissions(session, &emissions_ids)?;

    let product = FinalAsset {
        id: request.id.clone(),
        emissions_ids,
        ghg,
        based_on: request.assets.clone(),
    };
    session.store().put_public(&product.id, &product)?;
    info!(asset_id = %product.id, ghg, "Final product published");
    Ok(())
}

/// Product id must be new and the recipe must exist and produce `name`.
fn load_recipe<C>(
    session: &Session<'_, C>,
    own: &CollectionName,
    request: &ManufactureRequest,
) -> Checked<Recipe>
where
    C: TransactionContext + ?Sized,
{
    let store = session.store();
    if store.public_exists(&request.id)? {
        return Err(ProvenanceError::conflict("Asset", &request.id).into());
    }
    let recipe: Recipe = store
        .get_private(own, &request.recipe_id)?
        .ok_or_else(|| ProvenanceError::not_found("Recipe", &request.recipe_id))?;
    if recipe.product != request.name {
        return Err(ProvenanceError::validation(format!(
            "The name of the new product {} does not match the recipe product {}",
            request.name, recipe.product
        ))
        .into());
    }
    Ok(recipe)
}

/// Matches the consumed assets against the recipe and deletes them.
/// Returns the product's emissions ids.
fn consume<C>(
    session: &Session<'_, C>,
    own: &CollectionName,
    recipe: &Recipe,
    request: &ManufactureRequest,
) -> Checked<Vec<String>>
where
    C: TransactionContext + ?Sized,
{
    let store = session.store();
    let mut inputs = Vec::with_capacity(request.assets.len());
    for id in &request.assets {
        let asset: Asset = store
            .get_private(own, id)?
            .ok_or_else(|| ProvenanceError::not_found("Asset", id))?;
        inputs.push(asset);
    }

    let counts = tally(inputs.iter().map(|a| a.name.as_str()));
    match_recipe(recipe, &counts).map_err(|m| ProvenanceError::validation(m.to_string()))?;

    for asset in &inputs {
        debug!(asset_id = %asset.id, collection = %own, "Consumed");
        store.delete_private(own, &asset.id)?;
    }

    Ok(union_emissions(
        inputs
            .iter()
            .map(|a| &a.emissions_ids)
            .chain(std::iter::once(&request.emissions_ids)),
    ))
}

/// Sum of the recorded kg CO2 of `emissions_ids`. Ids without a record
/// are left out of the total.
fn total_emissions<C>(session: &Session<'_, C>, emissions_ids: &[String]) -> Checked<i64>
where
    C: TransactionContext + ?Sized,
{
    let emissions = session.emissions();
    let mut total: i64 = 0;
    for id in emissions_ids {
        match emissions.get_public::<EmissionsRecord>(id)? {
            Some(record) => total = total.saturating_add(record.kg_co2),
            None => warn!(emissions_id = %id, "No emissions record, excluded from GHG total"),
        }
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProvenanceConfig;
    use crate::domain::{PolicyViolation, Rejection};
    use pc_01_ledger_store::{InMemoryLedger, InMemoryTransaction, Namespace, PartitionedStore};
    use shared_types::{OrgId, Rights, EMISSIONS_NAMESPACE, RIGHTS_KEY};

    fn setup(role: Role) -> (InMemoryLedger, ProvenanceConfig) {
        let config = ProvenanceConfig::default();
        let ledger = InMemoryLedger::for_organisations(
            &[OrgId::new("Org1MSP"), OrgId::new("Org2MSP")],
            &config.collection_suffix,
            &config.shipping_collection,
        );
        let tx = ledger.begin(OrgId::new("Org2MSP")).build();
        let session = Session::new(&tx, &config);
        let own = session.own_collection().unwrap();
        session
            .store()
            .put_private(&own, RIGHTS_KEY, &Rights::new(role))
            .unwrap();
        session
            .store()
            .put_private(
                &own,
                "R1",
                &Recipe {
                    id: "R1".into(),
                    product: "steel".into(),
                    ingredients: vec!["ore".into(), "coal".into()],
                    quantities: vec![2, 1],
                },
            )
            .unwrap();
        session
            .store()
            .put_private(
                &own,
                "R2",
                &Recipe {
                    id: "R2".into(),
                    product: "FinalProduct".into(),
                    ingredients: vec!["steel".into()],
                    quantities: vec![1],
                },
            )
            .unwrap();
        tx.commit().unwrap();
        (ledger, config)
    }

    fn put_asset(tx: &InMemoryTransaction<'_>, config: &ProvenanceConfig, id: &str, name: &str) {
        let session = Session::new(tx, config);
        let own = session.own_collection().unwrap();
        session
            .store()
            .put_private(
                &own,
                id,
                &Asset {
                    name: name.into(),
                    id: id.into(),
                    emissions_ids: vec![format!("E-{id}")],
                    direction: Direction::In,
                },
            )
            .unwrap();
    }

    fn steel_request(assets: &[&str]) -> ManufactureRequest {
        ManufactureRequest {
            version: 1,
            recipe_id: "R1".into(),
            name: "steel".into(),
            id: "P1".into(),
            emissions_ids: vec!["E-melt".into()],
            assets: assets.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_consume_publishes_union_and_deletes_inputs() {
        let (ledger, config) = setup(Role::Supplier);
        let tx = ledger.begin(OrgId::new("Org2MSP")).build();
        put_asset(&tx, &config, "A1", "ore");
        put_asset(&tx, &config, "A2", "coal");
        put_asset(&tx, &config, "A3", "ore");
        let session = Session::new(&tx, &config);

        consume_assets(&session, &steel_request(&["A2", "A3", "A1"])).unwrap();

        let public: PublicAsset = session.store().get_public("P1").unwrap().unwrap();
        assert_eq!(public.based_on, vec!["A2", "A3", "A1"]);
        assert_eq!(
            public.emissions_ids,
            vec!["E-A2", "E-A3", "E-A1", "E-melt"]
        );
        let own = session.own_collection().unwrap();
        for id in ["A1", "A2", "A3"] {
            assert!(!session.store().private_exists(&own, id).unwrap());
        }
        let product: Asset = session.store().get_private(&own, "P1").unwrap().unwrap();
        assert_eq!(product.direction, Direction::Out);
    }

    #[test]
    fn test_consume_mismatch_fails() {
        let (ledger, config) = setup(Role::Supplier);
        let tx = ledger.begin(OrgId::new("Org2MSP")).build();
        put_asset(&tx, &config, "A1", "ore");
        put_asset(&tx, &config, "A2", "coal");
        let session = Session::new(&tx, &config);

        let result = consume_assets(&session, &steel_request(&["A1", "A2"]));
        assert!(matches!(
            result,
            Err(Rejection::Failure(ProvenanceError::Validation(_)))
        ));
    }

    #[test]
    fn test_consume_refuses_terminal_recipe() {
        let (ledger, config) = setup(Role::Oem);
        let tx = ledger.begin(OrgId::new("Org2MSP")).build();
        put_asset(&tx, &config, "P0", "steel");
        let session = Session::new(&tx, &config);
        let request = ManufactureRequest {
            recipe_id: "R2".into(),
            name: "FinalProduct".into(),
            assets: vec!["P0".into()],
            ..steel_request(&[])
        };
        assert!(matches!(
            consume_assets(&session, &request),
            Err(Rejection::Failure(ProvenanceError::Validation(_)))
        ));
    }

    #[test]
    fn test_finalize_requires_oem() {
        let (ledger, config) = setup(Role::Supplier);
        let tx = ledger.begin(OrgId::new("Org2MSP")).build();
        put_asset(&tx, &config, "P0", "steel");
        let session = Session::new(&tx, &config);
        let request = ManufactureRequest {
            recipe_id: "R2".into(),
            name: "FinalProduct".into(),
            id: "F1".into(),
            assets: vec!["P0".into()],
            ..steel_request(&[])
        };
        assert!(matches!(
            finalize_product(&session, &request),
            Err(Rejection::Violation(PolicyViolation::Unauthorized { .. }))
        ));
    }

    #[test]
    fn test_finalize_sums_recorded_emissions() {
        let (ledger, config) = setup(Role::Oem);
        let tx = ledger.begin(OrgId::new("Org2MSP")).build();
        put_asset(&tx, &config, "P0", "steel");
        let emissions = PartitionedStore::new(&tx, Namespace::new(EMISSIONS_NAMESPACE));
        emissions
            .put_public("E-P0", &EmissionsRecord { id: "E-P0".into(), kg_co2: 30 })
            .unwrap();
        emissions
            .put_public("E-melt", &EmissionsRecord { id: "E-melt".into(), kg_co2: 12 })
            .unwrap();
        let session = Session::new(&tx, &config);
        let request = ManufactureRequest {
            recipe_id: "R2".into(),
            name: "FinalProduct".into(),
            id: "F1".into(),
            emissions_ids: vec!["E-melt".into(), "E-missing".into()],
            assets: vec!["P0".into()],
            version: 1,
        };

        finalize_product(&session, &request).unwrap();
        let product: FinalAsset = session.store().get_public("F1").unwrap().unwrap();
        assert_eq!(product.ghg, 42);
        assert_eq!(product.emissions_ids, vec!["E-P0", "E-melt", "E-missing"]);
        let own = session.own_collection().unwrap();
        assert!(!session.store().private_exists(&own, "F1").unwrap());
    }

    #[test]
    fn test_raw_asset_requires_mine_and_fresh_id() {
        let (ledger, config) = setup(Role::Mine);
        let tx = ledger.begin(OrgId::new("Org2MSP")).build();
        let session = Session::new(&tx, &config);
        let request = RawAssetRequest {
            version: 1,
            name: "ore".into(),
            id: "A1".into(),
            emissions_ids: vec!["E1".into()],
        };
        receive_raw_asset(&session, &request).unwrap();
        let public: PublicAsset = session.store().get_public("A1").unwrap().unwrap();
        assert!(public.is_root());

        assert!(matches!(
            receive_raw_asset(&session, &request),
            Err(Rejection::Failure(ProvenanceError::Conflict { .. }))
        ));
    }

    #[test]
    fn test_register_recipe_duplicate_is_conflict() {
        let (ledger, config) = setup(Role::Supplier);
        let tx = ledger.begin(OrgId::new("Org1MSP")).build();
        let session = Session::new(&tx, &config);
        let request = RecipeRequest {
            version: 1,
            id: "R1".into(),
            product: "steel".into(),
            ingredients: vec!["ore".into()],
            quantities: vec![3],
            collection: "Org2MSPPrivateCollection".into(),
        };
        assert!(matches!(
            register_recipe(&session, &request),
            Err(Rejection::Failure(ProvenanceError::Conflict { .. }))
        ));

        let fresh = RecipeRequest {
            id: "R9".into(),
            ..request
        };
        register_recipe(&session, &fresh).unwrap();
    }
}
