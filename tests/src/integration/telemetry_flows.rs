//! # Telemetry Flows
//!
//! Logging and the Prometheus registry observed from outside the contracts.

#[cfg(test)]
mod tests {
    use crate::fixtures::{Network, AUTHORITY, MINE, OEM};
    use provenance_telemetry::{
        encode_metrics, init_telemetry, register_metrics, TelemetryConfig, TelemetryError,
        FLAGS_RAISED, SHIPMENTS_CREATED,
    };
    use serde_json::json;

    fn init() {
        let config = TelemetryConfig {
            console_output: false,
            ..TelemetryConfig::for_contract("02", "asset-provenance")
        };
        match init_telemetry(&config) {
            Ok(()) => {}
            // Metrics or subscriber installed by an earlier test in this process
            Err(TelemetryError::MetricsInit(_)) | Err(TelemetryError::AlreadyInitialized(_)) => {}
            Err(other) => panic!("unexpected {other:?}"),
        }
        let _ = register_metrics();
    }

    #[test]
    fn test_flags_and_shipments_reach_the_registry() {
        init();
        let network = Network::with_roles();
        let flags_before = FLAGS_RAISED.with_label_values(&["unauthorized"]).get();
        let shipments_before = SHIPMENTS_CREATED.get();

        // OEM is not the issuing authority
        network
            .call(
                OEM,
                "grantRights",
                json!({"ID": "RIGHTS", "Role": "Mine", "Collection": network.collection(OEM).as_str()}),
            )
            .unwrap();

        network
            .call(
                MINE,
                "receiveRawAsset",
                json!({"assetName": "rock", "assetID": "R1", "emissionsIDs": ["E-dig"]}),
            )
            .unwrap();
        network
            .call(
                AUTHORITY,
                "registerRecipe",
                json!({
                    "recipeID": "R-ore",
                    "Product": "ore",
                    "Ingredients": ["rock"],
                    "Quantity": [1],
                    "Collection": network.collection(MINE).as_str(),
                }),
            )
            .unwrap();
        network
            .call(
                MINE,
                "consumeAssets",
                json!({
                    "recipeID": "R-ore",
                    "assetName": "ore",
                    "assetID": "O1",
                    "emissionsIDs": ["E-smelt"],
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
                    "list_ID": ["O1"],
                    "assetName": "ore",
                    "date": crate::fixtures::TODAY,
                    "shipEmissionsIDs": ["E-rail"],
                }),
            )
            .unwrap();

        assert!(FLAGS_RAISED.with_label_values(&["unauthorized"]).get() >= flags_before + 1.0);
        assert!(SHIPMENTS_CREATED.get() >= shipments_before + 1.0);

        let text = encode_metrics().unwrap();
        assert!(text.contains("pc_provenance_shipments_created_total"));
        assert!(text.contains("pc_provenance_flags_raised_total"));
        assert!(text.contains("pc_operations_total"));
    }
}
