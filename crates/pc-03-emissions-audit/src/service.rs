//! # Emissions Audit Service
//!
//! Admits emissions figures to the public ledger after an outlier check
//! against earlier records, and keeps who reported each figure private to
//! the reporting organisation.
//!
//! `auditEmissions` is a mutating entry point of the same network as the
//! provenance contract, so it drains the shared deletion queue first.

use crate::config::AuditConfig;
use crate::domain::{judge, AuditRequest, Verdict};
use crate::errors::{AuditError, Result};
use parking_lot::RwLock;
use pc_01_ledger_store::{PartitionedStore, StoreError, TransactionContext};
use pc_02_asset_provenance::{deletion_queue, gate, Session};
use provenance_telemetry::{metric_inc, time_histogram, AUDITS, OPERATIONS, OPERATION_DURATION};
use serde::Serialize;
use serde_json::Value;
use shared_types::{CollectionName, EmissionsRecord, EmissionsRecordPrivateDetails};
use tracing::{debug, info, instrument, warn, Span};

pub const CONTRACT: &str = "emissions";

#[derive(Debug, Default, Clone)]
pub struct ServiceStats {
    pub audits_submitted: u64,
    /// Written after passing the outlier gate.
    pub accepted: u64,
    /// Written without a gate because no priors were named.
    pub unchecked: u64,
    pub rejected: u64,
    /// Any other failure.
    pub failed: u64,
}

pub struct EmissionsAuditService {
    config: AuditConfig,
    stats: RwLock<ServiceStats>,
}

impl Default for EmissionsAuditService {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl EmissionsAuditService {
    pub fn new(config: AuditConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            stats: RwLock::new(ServiceStats::default()),
        })
    }

    pub fn with_defaults() -> Self {
        Self {
            config: AuditConfig::default(),
            stats: RwLock::new(ServiceStats::default()),
        }
    }

    pub fn config(&self) -> &AuditConfig {
        &self.config
    }

    pub fn stats(&self) -> ServiceStats {
        self.stats.read().clone()
    }

    fn session<'a, C>(&'a self, ctx: &'a C) -> Session<'a, C>
    where
        C: TransactionContext + ?Sized,
    {
        Session::new(ctx, &self.config.provenance)
    }

    fn own_collection<C>(&self, session: &Session<'_, C>) -> Result<CollectionName>
    where
        C: TransactionContext + ?Sized,
    {
        Ok(session.own_collection()?)
    }

    // =========================================================================
    // AUDIT
    // =========================================================================

    /// Checks `request.kg_co2` against the prior records and, if admitted,
    /// writes the public record and the caller's private details.
    #[instrument(skip(self, ctx, request), fields(operation = "auditEmissions", caller = tracing::field::Empty, record_id = %request.id))]
    pub fn audit_and_record_emissions<C>(
        &self,
        ctx: &C,
        request: &AuditRequest,
    ) -> Result<EmissionsRecord>
    where
        C: TransactionContext + ?Sized,
    {
        let _timer = time_histogram!(OPERATION_DURATION.with_label_values(&["auditEmissions"]));
        let result = self.audit(ctx, request);

        let mut stats = self.stats.write();
        stats.audits_submitted += 1;
        let outcome = match &result {
            Ok((_, Verdict::Unchecked)) => {
                stats.unchecked += 1;
                "unchecked"
            }
            Ok(_) => {
                stats.accepted += 1;
                "accepted"
            }
            Err(AuditError::AuditRejected { .. }) => {
                stats.rejected += 1;
                "rejected"
            }
            Err(e) => {
                stats.failed += 1;
                warn!(error = %e, "Audit failed");
                "error"
            }
        };
        metric_inc!(AUDITS, &[outcome]);
        let label = if result.is_ok() { "ok" } else { "error" };
        metric_inc!(OPERATIONS, &[CONTRACT, "auditEmissions", label]);
        result.map(|(record, _)| record)
    }

    fn audit<C>(&self, ctx: &C, request: &AuditRequest) -> Result<(EmissionsRecord, Verdict)>
    where
        C: TransactionContext + ?Sized,
    {
        let session = self.session(ctx);
        let drained = deletion_queue::drain_and_reset(&session)?;
        if drained > 0 {
            debug!(drained, "Deletion queue drained before audit");
        }

        request.validate()?;
        let caller = gate::require_same_org_as_peer(&session)?;
        Span::current().record("caller", caller.as_str());
        let own = self.own_collection(&session)?;
        let owner = self.transient_owner(ctx)?;

        let store = session.emissions();
        if store.public_exists(&request.id)? {
            return Err(AuditError::Conflict {
                id: request.id.clone(),
            });
        }
        if store.private_exists(&own, &request.id)? {
            return Err(AuditError::Conflict {
                id: request.id.clone(),
            });
        }

        let verdict = if request.prior_ids.is_empty() {
            Verdict::Unchecked
        } else {
            let priors = fetch_priors(&store, &request.prior_ids)?;
            let values: Vec<i64> = priors.iter().map(|r| r.kg_co2).collect();
            judge(request.kg_co2, &values, &self.config.outlier)
        };
        if let Verdict::Rejected(fence) = verdict {
            warn!(
                record_id = %request.id,
                kg_co2 = request.kg_co2,
                lower = fence.lower,
                upper = fence.upper,
                "Emissions figure rejected"
            );
            return Err(AuditError::AuditRejected {
                kg_co2: request.kg_co2,
                lower: fence.lower,
                upper: fence.upper,
            });
        }

        let record = EmissionsRecord {
            id: request.id.clone(),
            kg_co2: request.kg_co2,
        };
        store.put_public(&record.id, &record)?;
        debug!(key = %record.id, "Public emissions record written");

        let details = EmissionsRecordPrivateDetails {
            id: request.id.clone(),
            owner,
        };
        store.put_private(&own, &details.id, &details)?;
        debug!(key = %details.id, collection = %own, "Private details written");

        info!(
            record_id = %record.id,
            kg_co2 = record.kg_co2,
            priors = request.prior_ids.len(),
            note = %request.note,
            "Emissions recorded"
        );
        Ok((record, verdict))
    }

    fn transient_owner<C>(&self, ctx: &C) -> Result<String>
    where
        C: TransactionContext + ?Sized,
    {
        let key = &self.config.owner_key;
        let bytes = ctx.transient(key)?.ok_or_else(|| {
            AuditError::validation(format!("key \"{key}\" not found in the transient map input"))
        })?;
        let owner = String::from_utf8(bytes).map_err(|_| {
            AuditError::validation(format!("key \"{key}\" in the transient map is not UTF-8"))
        })?;
        if owner.is_empty() {
            return Err(AuditError::validation(format!(
                "key \"{key}\" field in the transient map must be a non-empty string"
            )));
        }
        Ok(owner)
    }

    // =========================================================================
    // READ ACCESSORS
    // =========================================================================

    fn query<C, T, F>(&self, ctx: &C, operation: &'static str, read: F) -> Result<T>
    where
        C: TransactionContext + ?Sized,
        F: FnOnce(&Session<'_, C>, PartitionedStore<'_, C>) -> Result<T>,
    {
        let session = self.session(ctx);
        let store = session.emissions();
        let result = read(&session, store);
        let outcome = if result.is_ok() { "ok" } else { "error" };
        metric_inc!(OPERATIONS, &[CONTRACT, operation, outcome]);
        result
    }

    pub fn read_emissions_record<C>(&self, ctx: &C, id: &str) -> Result<EmissionsRecord>
    where
        C: TransactionContext + ?Sized,
    {
        self.query(ctx, "readEmissionsRecord", |_, store| {
            store
                .get_public(id)?
                .ok_or_else(|| AuditError::not_found("Emissions record", id))
        })
    }

    /// All of `ids`, in order. Fails on the first missing one.
    pub fn read_emissions_records<C>(&self, ctx: &C, ids: &[String]) -> Result<Vec<EmissionsRecord>>
    where
        C: TransactionContext + ?Sized,
    {
        self.query(ctx, "readEmissionsRecords", |_, store| {
            ids.iter()
                .map(|id| {
                    store
                        .get_public(id)?
                        .ok_or_else(|| AuditError::not_found("Emissions record", id))
                })
                .collect()
        })
    }

    pub fn list_emissions_records<C>(&self, ctx: &C) -> Result<Vec<EmissionsRecord>>
    where
        C: TransactionContext + ?Sized,
    {
        self.query(ctx, "listEmissionsRecords", |_, store| {
            Ok(store
                .scan_public::<EmissionsRecord>()?
                .into_iter()
                .map(|(_, record)| record)
                .collect())
        })
    }

    pub fn emissions_record_exists<C>(&self, ctx: &C, id: &str) -> Result<bool>
    where
        C: TransactionContext + ?Sized,
    {
        self.query(ctx, "emissionsRecordExists", |_, store| {
            Ok(store.public_exists(id)?)
        })
    }

    /// Private details from the caller's own collection.
    pub fn read_private_details<C>(&self, ctx: &C, id: &str) -> Result<EmissionsRecordPrivateDetails>
    where
        C: TransactionContext + ?Sized,
    {
        self.query(ctx, "readEmissionsPrivateDetails", |session, store| {
            let own = self.own_collection(session)?;
            store
                .get_private(&own, id)?
                .ok_or_else(|| AuditError::not_found("Emissions private details", id))
        })
    }

    pub fn list_private_details<C>(&self, ctx: &C) -> Result<Vec<EmissionsRecordPrivateDetails>>
    where
        C: TransactionContext + ?Sized,
    {
        self.query(ctx, "listEmissionsPrivateDetails", |session, store| {
            let own = self.own_collection(session)?;
            Ok(store
                .scan_private::<EmissionsRecordPrivateDetails>(&own)?
                .into_iter()
                .map(|(_, details)| details)
                .collect())
        })
    }

    /// Private details in the caller's collection reported by `owner`.
    pub fn list_records_of_owner<C>(
        &self,
        ctx: &C,
        owner: &str,
    ) -> Result<Vec<EmissionsRecordPrivateDetails>>
    where
        C: TransactionContext + ?Sized,
    {
        Ok(self
            .list_private_details(ctx)?
            .into_iter()
            .filter(|details| details.owner == owner)
            .collect())
    }

    // =========================================================================
    // DISPATCH
    // =========================================================================

    /// Routes a function name to its entry point. The record owner travels
    /// in the transient map for `auditEmissions` and
    /// `listEmissionsRecordsOfOwner`.
    pub fn invoke<C>(&self, ctx: &C, function: &str, args: &[&str]) -> Result<Value>
    where
        C: TransactionContext + ?Sized,
    {
        info!(function, tx_id = ctx.tx_id(), "Invoke");
        match function {
            "auditEmissions" => {
                let request = AuditRequest::from_args(args)?;
                to_json(self.audit_and_record_emissions(ctx, &request)?)
            }
            "readEmissionsRecord" => to_json(self.read_emissions_record(ctx, arg(args, 0)?)?),
            "readEmissionsRecords" => {
                let ids: Vec<String> = serde_json::from_str(arg(args, 0)?)
                    .map_err(|e| AuditError::validation(format!("ids is not a JSON list: {e}")))?;
                to_json(self.read_emissions_records(ctx, &ids)?)
            }
            "listEmissionsRecords" => to_json(self.list_emissions_records(ctx)?),
            "emissionsRecordExists" => {
                to_json(self.emissions_record_exists(ctx, arg(args, 0)?)?)
            }
            "readEmissionsPrivateDetails" => {
                to_json(self.read_private_details(ctx, arg(args, 0)?)?)
            }
            "listEmissionsRecordsOfOwner" => {
                let owner = self.transient_owner(ctx)?;
                to_json(self.list_records_of_owner(ctx, &owner)?)
            }
            "listEmissionsPrivateDetails" => to_json(self.list_private_details(ctx)?),
            other => Err(AuditError::validation(format!("unknown function {other}"))),
        }
    }
}

/// Loads every prior record. Names that do not resolve are collected and
/// reported together.
fn fetch_priors<C>(store: &PartitionedStore<'_, C>, ids: &[String]) -> Result<Vec<EmissionsRecord>>
where
    C: TransactionContext + ?Sized,
{
    let mut found = Vec::with_capacity(ids.len());
    let mut missing = Vec::new();
    for id in ids {
        match store.get_public::<EmissionsRecord>(id)? {
            Some(record) => found.push(record),
            None => missing.push(id.clone()),
        }
    }
    if !missing.is_empty() {
        return Err(AuditError::IntegrityMismatch { missing });
    }
    Ok(found)
}

fn arg<'a>(args: &[&'a str], index: usize) -> Result<&'a str> {
    args.get(index)
        .copied()
        .filter(|value| !value.is_empty())
        .ok_or_else(|| AuditError::validation(format!("missing argument {index}")))
}

fn to_json<T: Serialize>(value: T) -> Result<Value> {
    Ok(serde_json::to_value(value).map_err(StoreError::from)?)
}
