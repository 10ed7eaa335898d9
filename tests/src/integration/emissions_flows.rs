//! # Emissions Flows
//!
//! The audit contract on its own and together with the provenance contract:
//! a series of monthly figures admitted through the outlier gate, private
//! ownership per organisation, and GHG totals that follow what was admitted.

#[cfg(test)]
mod tests {
    use crate::fixtures::{Network, AUTHORITY, MINE, OEM, SUPPLIER};
    use pc_03_emissions_audit::AuditError;
    use serde_json::json;

    #[test]
    fn test_monthly_series_switches_to_iqr_gate() {
        let network = Network::new();
        network.report(MINE, "kiln-a", "M1", &[], 100).unwrap();
        network.report(MINE, "kiln-a", "M2", &["M1"], 120).unwrap();
        network.report(MINE, "kiln-a", "M3", &["M1", "M2"], 90).unwrap();
        network.report(MINE, "kiln-a", "M4", &["M1", "M2", "M3"], 110).unwrap();

        // Four priors [90, 100, 110, 120]: median 105, band [52.5, 157.5]
        let four = ["M1", "M2", "M3", "M4"];
        assert!(network.report(MINE, "kiln-a", "X4", &four, 166).is_err());

        network.report(MINE, "kiln-a", "M5", &four, 105).unwrap();

        // Five priors [90, 100, 105, 110, 120]: Q1 = 100, Q3 = 110,
        // fences [85, 125]
        let five = ["M1", "M2", "M3", "M4", "M5"];
        network.report(MINE, "kiln-a", "M6", &five, 125).unwrap();
        let err = network
            .report(MINE, "kiln-a", "M7", &five, 126)
            .unwrap_err();
        match err {
            AuditError::AuditRejected { lower, upper, .. } => {
                assert_eq!((lower, upper), (85.0, 125.0));
            }
            other => panic!("unexpected {other:?}"),
        }

        let tx = network.tx(MINE);
        assert_eq!(network.audit.list_emissions_records(&tx).unwrap().len(), 6);
        assert_eq!(network.audit.stats().rejected, 2);
    }

    #[test]
    fn test_private_details_stay_with_reporting_org() {
        let network = Network::new();
        network.report(MINE, "kiln-a", "E1", &[], 10).unwrap();
        network.report(MINE, "kiln-b", "E2", &[], 12).unwrap();
        network.report(SUPPLIER, "mill-1", "E3", &[], 30).unwrap();

        let tx = network.tx(MINE);
        let owned = network.audit.list_records_of_owner(&tx, "kiln-a").unwrap();
        assert_eq!(owned.len(), 1);
        assert_eq!(owned[0].id, "E1");
        assert_eq!(network.audit.list_private_details(&tx).unwrap().len(), 2);
        // Public figures are visible to everyone
        assert_eq!(network.audit.read_emissions_record(&tx, "E3").unwrap().kg_co2, 30);

        let tx = network.tx(SUPPLIER);
        assert!(network.audit.read_private_details(&tx, "E1").is_err());
    }

    #[test]
    fn test_ids_are_shared_across_organisations() {
        let network = Network::new();
        network.report(MINE, "kiln-a", "E1", &[], 10).unwrap();
        assert!(matches!(
            network.report(OEM, "line-2", "E1", &[], 10),
            Err(AuditError::Conflict { .. })
        ));
    }

    #[test]
    fn test_unreported_emissions_are_left_out_of_ghg() {
        let network = Network::with_roles();
        network.report(OEM, "line-2", "E-paint", &[], 15).unwrap();

        network
            .call(
                AUTHORITY,
                "registerRecipe",
                json!({
                    "recipeID": "R-car",
                    "Product": "FinalProduct",
                    "Ingredients": ["frame"],
                    "Quantity": [1],
                    "Collection": network.collection(OEM).as_str(),
                }),
            )
            .unwrap();

        // An OEM cannot receive raw assets, so hand it a frame from a mine
        network
            .call(
                AUTHORITY,
                "registerRecipe",
                json!({
                    "recipeID": "R-frame",
                    "Product": "frame",
                    "Ingredients": ["rock"],
                    "Quantity": [1],
                    "Collection": network.collection(MINE).as_str(),
                }),
            )
            .unwrap();
        network
            .call(
                MINE,
                "receiveRawAsset",
                json!({"assetName": "rock", "assetID": "R1", "emissionsIDs": ["E-never-audited"]}),
            )
            .unwrap();
        network
            .call(
                MINE,
                "consumeAssets",
                json!({
                    "recipeID": "R-frame",
                    "assetName": "frame",
                    "assetID": "F1",
                    "emissionsIDs": ["E-weld"],
                    "assets": ["R1"],
                }),
            )
            .unwrap();
        network
            .call(
                MINE,
                "createShipment",
                json!({
                    "shippingID": "S1",
                    "quantity": 1,
                    "list_ID": ["F1"],
                    "assetName": "frame",
                    "date": crate::fixtures::TODAY,
                    "shipEmissionsIDs": ["E-ship"],
                }),
            )
            .unwrap();
        network
            .call(
                OEM,
                "claimShipment",
                json!({
                    "shippingID": "S1",
                    "quantity": 1,
                    "list_ID": ["F1"],
                    "assetName": "frame",
                    "date": crate::fixtures::TODAY,
                    "emissionsIDs": [["E-never-audited", "E-weld", "E-ship"]],
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
                    "emissionsIDs": ["E-paint"],
                    "assets": ["F1"],
                }),
            )
            .unwrap();

        let tx = network.tx(OEM);
        let audited = network
            .audit
            .read_emissions_records(&tx, &["E-paint".into()])
            .unwrap();
        assert_eq!(audited[0].kg_co2, 15);
        let product = network.provenance.read_final_asset(&tx, "CAR1").unwrap();
        assert_eq!(product.ghg, 15);
        assert_eq!(product.emissions_ids.len(), 4);
    }

    #[test]
    fn test_invoke_audit_with_positional_arguments() {
        let network = Network::new();
        network.report(SUPPLIER, "mill-1", "E1", &[], 40).unwrap();

        let tx = network
            .ledger
            .begin(shared_types::OrgId::new(SUPPLIER))
            .timestamp(Network::now())
            .transient("ownerID", b"mill-1".to_vec())
            .build();
        let record = network
            .audit
            .invoke(&tx, "auditEmissions", &["E2", r#"["E1"]"#, "44", "april"])
            .unwrap();
        assert_eq!(record["ID"], "E2");
        tx.commit().unwrap();

        let tx = network.tx(SUPPLIER);
        assert_eq!(
            network.audit.invoke(&tx, "emissionsRecordExists", &["E2"]).unwrap(),
            json!(true)
        );
    }
}
