//! # Supply Chain Flows
//!
//! Rock dug at a mine becomes ore, is shipped to a supplier that rolls it
//! into steel, and ends as a car at an OEM. Covers:
//!
//! 1. **Rights and recipes**: issued by the authority into each collection
//! 2. **Manufacturing**: recipe-checked consumption and emissions union
//! 3. **Hand-off**: commitment-verified claims, deferred deletion
//! 4. **Terminal products**: GHG totals and lineage tracing
//! 5. **Soft violations**: flagged, never surfaced

#[cfg(test)]
mod tests {
    use crate::fixtures::{Network, AUTHORITY, MINE, OEM, SUPPLIER, TODAY};
    use pc_01_ledger_store::StoreError;
    use pc_02_asset_provenance::{ManufactureRequest, ProvenanceError};
    use serde_json::{json, Value};
    use shared_types::{Direction, OrgId};

    // =============================================================================
    // FIXTURES
    // =============================================================================

    fn register_recipes(network: &Network) {
        let recipes = [
            ("R-ore", "ore", json!(["rock"]), json!([2]), MINE),
            ("R-steel", "steel", json!(["ore"]), json!([2]), SUPPLIER),
            ("R-car", "FinalProduct", json!(["steel"]), json!([1]), OEM),
        ];
        for (id, product, ingredients, quantities, org) in recipes {
            network
                .call(
                    AUTHORITY,
                    "registerRecipe",
                    json!({
                        "recipeID": id,
                        "Product": product,
                        "Ingredients": ingredients,
                        "Quantity": quantities,
                        "Collection": network.collection(org).as_str(),
                    }),
                )
                .unwrap();
        }
    }

    fn report_emissions(network: &Network) {
        for (org, id, kg) in [
            (MINE, "E-dig", 10),
            (MINE, "E-smelt", 20),
            (SUPPLIER, "E-rail", 5),
            (SUPPLIER, "E-mill", 30),
            (OEM, "E-truck", 7),
            (OEM, "E-assembly", 40),
        ] {
            network.report(org, "site-1", id, &[], kg).unwrap();
        }
    }

    /// Mine holds two `out` ore assets, O1 and O2.
    fn mine_two_ore(network: &Network) {
        for rock in ["R1", "R2", "R3", "R4"] {
            network
                .call(
                    MINE,
                    "receiveRawAsset",
                    json!({"assetName": "rock", "assetID": rock, "emissionsIDs": ["E-dig"]}),
                )
                .unwrap();
        }
        for (ore, rocks) in [("O1", ["R1", "R2"]), ("O2", ["R3", "R4"])] {
            network
                .call(
                    MINE,
                    "consumeAssets",
                    json!({
                        "recipeID": "R-ore",
                        "assetName": "ore",
                        "assetID": ore,
                        "emissionsIDs": ["E-smelt"],
                        "assets": rocks,
                    }),
                )
                .unwrap();
        }
    }

    fn ship_ore(network: &Network) {
        network
            .call(
                MINE,
                "createShipment",
                json!({
                    "shippingID": "S1",
                    "quantity": 2,
                    "list_ID": ["O1", "O2"],
                    "assetName": "ore",
                    "date": TODAY,
                    "shipEmissionsIDs": ["E-rail", "E-rail"],
                }),
            )
            .unwrap();
    }

    fn ore_claim() -> Value {
        json!({
            "shippingID": "S1",
            "quantity": 2,
            "list_ID": ["O1", "O2"],
            "assetName": "ore",
            "date": TODAY,
            "emissionsIDs": [
                ["E-dig", "E-smelt", "E-rail"],
                ["E-dig", "E-smelt", "E-rail"],
            ],
        })
    }

    fn prepared() -> Network {
        let network = Network::with_roles();
        register_recipes(&network);
        report_emissions(&network);
        mine_two_ore(&network);
        network
    }

    fn flags_of(network: &Network, org: &str) -> Vec<String> {
        let tx = network.tx(org);
        network
            .provenance
            .list_flags(&tx, &network.collection(org))
            .unwrap()
            .into_iter()
            .map(|flag| flag.message)
            .collect()
    }

    // =============================================================================
    // END TO END
    // =============================================================================

    #[test]
    fn test_rock_to_car_lifecycle() {
        let network = prepared();
        ship_ore(&network);
        network.call(SUPPLIER, "claimShipment", ore_claim()).unwrap();

        network
            .call(
                SUPPLIER,
                "consumeAssets",
                json!({
                    "recipeID": "R-steel",
                    "assetName": "steel",
                    "assetID": "ST1",
                    "emissionsIDs": ["E-mill"],
                    "assets": ["O1", "O2"],
                }),
            )
            .unwrap();
        network
            .call(
                SUPPLIER,
                "createShipment",
                json!({
                    "shippingID": "S2",
                    "quantity": 1,
                    "list_ID": ["ST1"],
                    "assetName": "steel",
                    "date": TODAY,
                    "shipEmissionsIDs": ["E-truck"],
                }),
            )
            .unwrap();
        network
            .call(
                OEM,
                "claimShipment",
                json!({
                    "shippingID": "S2",
                    "quantity": 1,
                    "list_ID": ["ST1"],
                    "assetName": "steel",
                    "date": TODAY,
                    "emissionsIDs": [["E-dig", "E-smelt", "E-rail", "E-mill", "E-truck"]],
                }),
            )
            .unwrap();
        network
            .call(
                OEM,
                "finalizeProduct",
                json!({
                    "recipeID": "R-car",
                    "assetName": "FinalProduct",
                    "assetID": "CAR1",
                    "emissionsIDs": ["E-assembly"],
                    "assets": ["ST1"],
                }),
            )
            .unwrap();

        let tx = network.tx(OEM);
        let car = network.provenance.read_final_asset(&tx, "CAR1").unwrap();
        assert_eq!(car.ghg, 10 + 20 + 5 + 30 + 7 + 40);
        assert_eq!(
            car.emissions_ids,
            vec!["E-dig", "E-smelt", "E-rail", "E-mill", "E-truck", "E-assembly"]
        );
        assert_eq!(
            network.provenance.trace_lineage(&tx, "CAR1").unwrap(),
            vec!["CAR1", "ST1", "O1", "O2", "R1", "R2", "R3", "R4"]
        );
        // Consumed and terminal products leave no private trace at the OEM
        assert!(network
            .provenance
            .list_assets(&tx, &network.collection(OEM))
            .unwrap()
            .is_empty());
        assert!(flags_of(&network, OEM).is_empty());
        assert!(flags_of(&network, SUPPLIER).is_empty());
    }

    #[test]
    fn test_claim_transfers_assets_and_retires_pointer() {
        let network = prepared();
        ship_ore(&network);
        network.call(SUPPLIER, "claimShipment", ore_claim()).unwrap();

        let tx = network.tx(SUPPLIER);
        let ore = network
            .provenance
            .read_private_asset(&tx, &network.collection(SUPPLIER), "O2")
            .unwrap();
        assert_eq!(ore.direction, Direction::In);
        assert_eq!(ore.emissions_ids, vec!["E-dig", "E-smelt", "E-rail"]);
        assert!(network.provenance.list_public_shipments(&tx).unwrap().is_empty());
        assert_eq!(
            network.provenance.read_deletion_queue(&tx).unwrap().pending,
            vec!["S1"]
        );

        // The pointer is gone, so a second claim finds nothing
        assert!(matches!(
            network.call(SUPPLIER, "claimShipment", ore_claim()),
            Err(ProvenanceError::NotFound { .. })
        ));
    }

    // =============================================================================
    // DEFERRED DELETION
    // =============================================================================

    #[test]
    fn test_seller_draining_first_removes_its_shipment_record() {
        let network = prepared();
        ship_ore(&network);
        network.call(SUPPLIER, "claimShipment", ore_claim()).unwrap();

        network.call(MINE, "drainDeletionQueue", json!({})).unwrap();

        let tx = network.tx(MINE);
        assert!(network
            .provenance
            .read_private_shipment(&tx, &network.collection(MINE), "S1")
            .is_err());
        assert!(network
            .provenance
            .read_deletion_queue(&tx)
            .unwrap()
            .pending
            .is_empty());
    }

    #[test]
    fn test_first_drainer_wins_even_when_not_the_seller() {
        let network = prepared();
        ship_ore(&network);
        network.call(SUPPLIER, "claimShipment", ore_claim()).unwrap();

        // The emissions contract drains too
        network.report(OEM, "site-9", "E-late", &[], 3).unwrap();
        network.call(MINE, "drainDeletionQueue", json!({})).unwrap();

        let tx = network.tx(MINE);
        let record = network
            .provenance
            .read_private_shipment(&tx, &network.collection(MINE), "S1")
            .unwrap();
        assert_eq!(record.asset_ids, vec!["O1", "O2"]);
    }

    // =============================================================================
    // SOFT VIOLATIONS
    // =============================================================================

    #[test]
    fn test_mismatched_claim_is_flagged_and_changes_nothing() {
        let network = prepared();
        ship_ore(&network);

        let mut claim = ore_claim();
        claim["emissionsIDs"][1] = json!(["E-dig", "E-smelt"]);
        assert_eq!(
            network.call(SUPPLIER, "claimShipment", claim).unwrap(),
            Value::Null
        );

        assert_eq!(
            flags_of(&network, SUPPLIER),
            vec!["Failed attempt at claiming shipment"]
        );
        let tx = network.tx(SUPPLIER);
        assert_eq!(network.provenance.list_public_shipments(&tx).unwrap().len(), 1);
        assert!(network
            .provenance
            .list_assets(&tx, &network.collection(SUPPLIER))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_seller_cannot_claim_own_shipment() {
        let network = prepared();
        ship_ore(&network);
        network.call(MINE, "claimShipment", ore_claim()).unwrap();
        assert_eq!(
            flags_of(&network, MINE),
            vec!["Attempt to claim its own shipment"]
        );
    }

    #[test]
    fn test_backdated_shipment_is_flagged() {
        let network = prepared();
        network
            .call(
                MINE,
                "createShipment",
                json!({
                    "shippingID": "S1",
                    "quantity": 1,
                    "list_ID": ["O1"],
                    "assetName": "ore",
                    "date": "28-02-2024",
                    "shipEmissionsIDs": ["E-rail"],
                }),
            )
            .unwrap();
        assert_eq!(
            flags_of(&network, MINE),
            vec!["Shipment date does not match the transaction date"]
        );
        let tx = network.tx(MINE);
        assert!(network
            .provenance
            .read_private_asset(&tx, &network.collection(MINE), "O1")
            .is_ok());
    }

    #[test]
    fn test_reserved_shipment_id_leaves_one_flag() {
        let network = prepared();
        let before = network.ledger.height().unwrap();
        network
            .call(
                MINE,
                "createShipment",
                json!({
                    "shippingID": "RIGHTS",
                    "quantity": 1,
                    "list_ID": ["O1"],
                    "assetName": "ore",
                    "date": TODAY,
                    "shipEmissionsIDs": ["E-rail"],
                }),
            )
            .unwrap();
        assert_eq!(network.ledger.height().unwrap(), before + 1);
        assert_eq!(
            flags_of(&network, MINE),
            vec!["GRAVE: tried to set ID to RIGHTS"]
        );
        let tx = network.tx(MINE);
        assert!(network.provenance.list_public_shipments(&tx).unwrap().is_empty());
    }

    #[test]
    fn test_only_the_authority_grants_rights() {
        let network = Network::with_roles();
        network
            .call(
                MINE,
                "grantRights",
                json!({
                    "ID": "RIGHTS",
                    "Role": "OEM",
                    "Collection": network.collection(MINE).as_str(),
                }),
            )
            .unwrap();

        let tx = network.tx(MINE);
        let rights = network
            .provenance
            .read_rights(&tx, &network.collection(MINE))
            .unwrap();
        assert_eq!(rights.role.as_str(), "Mine");
        assert_eq!(
            flags_of(&network, MINE),
            vec!["Unauthorized attempt at invoking grantRights chaincode"]
        );
    }

    // =============================================================================
    // CONCURRENCY
    // =============================================================================

    #[test]
    fn test_racing_consumers_of_one_asset_conflict_at_commit() {
        let network = prepared();
        let request = |id: &str| ManufactureRequest {
            version: 1,
            recipe_id: "R-steel".into(),
            name: "steel".into(),
            id: id.into(),
            emissions_ids: vec!["E-mill".into()],
            assets: vec!["O1".into(), "O2".into()],
        };
        // Ore belongs to the mine here, so give the mine the steel recipe too
        network
            .call(
                AUTHORITY,
                "registerRecipe",
                json!({
                    "recipeID": "R-steel",
                    "Product": "steel",
                    "Ingredients": ["ore"],
                    "Quantity": [2],
                    "Collection": network.collection(MINE).as_str(),
                }),
            )
            .unwrap();

        let first = network.tx(MINE);
        let second = network.tx(MINE);
        network.provenance.consume_assets(&first, &request("STa")).unwrap();
        network.provenance.consume_assets(&second, &request("STb")).unwrap();

        first.commit().unwrap();
        assert!(matches!(
            second.commit(),
            Err(StoreError::MvccConflict { .. })
        ));

        let tx = network.tx(MINE);
        assert!(network.provenance.read_public_asset(&tx, "STa").is_ok());
        assert!(network.provenance.read_public_asset(&tx, "STb").is_err());
    }

    #[test]
    fn test_foreign_peer_is_refused() {
        let network = prepared();
        let tx = network
            .ledger
            .begin(OrgId::new(SUPPLIER))
            .host(OrgId::new(MINE))
            .timestamp(Network::now())
            .build();
        assert!(matches!(
            network.provenance.drain_deletion_queue(&tx),
            Ok(())
        ));
        let claim: pc_02_asset_provenance::ClaimShipmentRequest =
            serde_json::from_value(ore_claim()).unwrap();
        assert!(matches!(
            network.provenance.claim_shipment(&tx, &claim),
            Err(ProvenanceError::Authorization { .. })
        ));
    }
}
