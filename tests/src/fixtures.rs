//! Shared network fixture.
//!
//! | Organisation | Role |
//! |--------------|------|
//! | `Org1MSP` | issuing authority |
//! | `Org2MSP` | Mine |
//! | `Org3MSP` | Supplier |
//! | `Org4MSP` | OEM |
//!
//! Every transaction is stamped 2024-03-01 09:30 UTC, so valid shipment
//! dates are `01-03-2024`.

use chrono::{DateTime, TimeZone, Utc};
use pc_01_ledger_store::{InMemoryLedger, InMemoryTransaction};
use pc_02_asset_provenance::{ProvenanceError, ProvenanceService};
use pc_03_emissions_audit::{AuditError, AuditRequest, EmissionsAuditService};
use serde_json::Value;
use shared_types::{CollectionName, OrgId};

pub const AUTHORITY: &str = "Org1MSP";
pub const MINE: &str = "Org2MSP";
pub const SUPPLIER: &str = "Org3MSP";
pub const OEM: &str = "Org4MSP";
pub const TODAY: &str = "01-03-2024";

pub struct Network {
    pub ledger: InMemoryLedger,
    pub provenance: ProvenanceService,
    pub audit: EmissionsAuditService,
}

impl Default for Network {
    fn default() -> Self {
        Self::new()
    }
}

impl Network {
    pub fn new() -> Self {
        let provenance = ProvenanceService::with_defaults();
        let config = provenance.config();
        let ledger = InMemoryLedger::for_organisations(
            &[AUTHORITY, MINE, SUPPLIER, OEM].map(OrgId::new),
            &config.collection_suffix,
            &config.shipping_collection,
        );
        Self {
            ledger,
            provenance,
            audit: EmissionsAuditService::with_defaults(),
        }
    }

    /// Network with rights granted to Mine, Supplier and OEM.
    pub fn with_roles() -> Self {
        let network = Self::new();
        for (org, role) in [(MINE, "Mine"), (SUPPLIER, "Supplier"), (OEM, "OEM")] {
            network
                .call(
                    AUTHORITY,
                    "grantRights",
                    serde_json::json!({
                        "ID": "RIGHTS",
                        "Role": role,
                        "Collection": network.collection(org).as_str(),
                    }),
                )
                .expect("grant rights");
        }
        network
    }

    pub fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0)
            .single()
            .expect("valid timestamp")
    }

    pub fn collection(&self, org: &str) -> CollectionName {
        self.provenance.config().collection_of(&OrgId::new(org))
    }

    /// Open transaction for `org` with no transient data.
    pub fn tx(&self, org: &str) -> InMemoryTransaction<'_> {
        self.ledger.begin(OrgId::new(org)).timestamp(Self::now()).build()
    }

    /// Submits a provenance function with `payload` in the transient map and
    /// commits it when the call succeeds.
    pub fn call(&self, org: &str, function: &str, payload: Value) -> Result<Value, ProvenanceError> {
        let tx = self
            .ledger
            .begin(OrgId::new(org))
            .timestamp(Self::now())
            .transient(
                self.provenance.config().transient_key.clone(),
                payload.to_string().into_bytes(),
            )
            .build();
        let value = self.provenance.invoke(&tx, function, &[])?;
        tx.commit()?;
        Ok(value)
    }

    /// Submits an emissions figure reported by `owner` and commits it when
    /// admitted.
    pub fn report(
        &self,
        org: &str,
        owner: &str,
        id: &str,
        priors: &[&str],
        kg_co2: i64,
    ) -> Result<(), AuditError> {
        let tx = self
            .ledger
            .begin(OrgId::new(org))
            .timestamp(Self::now())
            .transient(self.audit.config().owner_key.clone(), owner.as_bytes().to_vec())
            .build();
        let request = AuditRequest::new(id, priors.iter().map(|s| s.to_string()).collect(), kg_co2);
        self.audit.audit_and_record_emissions(&tx, &request)?;
        tx.commit()?;
        Ok(())
    }
}
