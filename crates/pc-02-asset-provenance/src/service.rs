//! # Asset Provenance Service
//!
//! Orchestration layer of the contract. Every mutating entry point runs the
//! same pipeline:
//!
//! 1. Drain the deferred deletion queue (explicit pre-step)
//! 2. Run the handler (gate checks, then reads, validation, writes)
//! 3. Turn a soft [`PolicyViolation`] into exactly one flag in the caller's
//!    own collection, reporting success
//! 4. Record the outcome in metrics and [`ServiceStats`]
//!
//! The service never commits. The host applies the transaction when the
//! entry point returns `Ok` and discards it otherwise.

use crate::config::ProvenanceConfig;
use crate::deletion_queue;
use crate::domain::{
    check_request, decode_payload, Checked, ClaimShipmentRequest, CreateShipmentRequest,
    GrantRightsRequest, ManufactureRequest, RawAssetRequest, RecipeRequest, Rejection, Request,
};
use crate::errors::{ProvenanceError, Result};
use crate::flags;
use crate::gate;
use crate::manufacturing;
use crate::queries;
use crate::session::Session;
use crate::shipment;
use parking_lot::RwLock;
use pc_01_ledger_store::{StoreError, TransactionContext};
use provenance_telemetry::{metric_inc, time_histogram, OPERATIONS, OPERATION_DURATION};
use serde::Serialize;
use serde_json::Value;
use shared_types::{
    Asset, CollectionName, DeletionQueue, FinalAsset, Flag, PublicAsset, Recipe, Rights,
    ShippingPrivate, ShippingPublic,
};
use tracing::{debug, error, info, instrument, Span};

/// Contract label in metrics.
pub const CONTRACT: &str = "provenance";

/// Statistics for the Asset Provenance Service.
#[derive(Debug, Default, Clone)]
pub struct ServiceStats {
    /// Mutating entry points invoked.
    pub operations_executed: u64,
    /// Completed with state changes.
    pub succeeded: u64,
    /// Completed as a recorded policy violation.
    pub flagged: u64,
    /// Aborted with an error.
    pub failed: u64,
    /// Shipment ids removed by queue drains.
    pub deletions_drained: u64,
}

#[derive(Debug, Clone, Copy)]
enum Outcome {
    Applied,
    Flagged,
    Failed,
}

impl Outcome {
    fn label(self) -> &'static str {
        match self {
            Self::Applied => "ok",
            Self::Flagged => "flagged",
            Self::Failed => "error",
        }
    }
}

/// The asset-provenance contract.
pub struct ProvenanceService {
    config: ProvenanceConfig,
    stats: RwLock<ServiceStats>,
}

impl Default for ProvenanceService {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl ProvenanceService {
    pub fn new(config: ProvenanceConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            stats: RwLock::new(ServiceStats::default()),
        })
    }

    pub fn with_defaults() -> Self {
        Self {
            config: ProvenanceConfig::default(),
            stats: RwLock::new(ServiceStats::default()),
        }
    }

    pub fn config(&self) -> &ProvenanceConfig {
        &self.config
    }

    pub fn stats(&self) -> ServiceStats {
        self.stats.read().clone()
    }

    /// Read view over `ctx` with this contract's configuration.
    pub fn session<'a, C>(&'a self, ctx: &'a C) -> Session<'a, C>
    where
        C: TransactionContext + ?Sized,
    {
        Session::new(ctx, &self.config)
    }

    // =========================================================================
    // PIPELINE
    // =========================================================================

    fn execute<C, F>(&self, ctx: &C, operation: &'static str, handler: F) -> Result<()>
    where
        C: TransactionContext + ?Sized,
        F: FnOnce(&Session<'_, C>) -> Checked<()>,
    {
        let _timer = time_histogram!(OPERATION_DURATION.with_label_values(&[operation]));
        let session = self.session(ctx);
        if let Ok(caller) = session.caller() {
            Span::current().record("caller", caller.as_str());
        }

        let result = deletion_queue::drain_and_reset(&session).and_then(|drained| {
            self.stats.write().deletions_drained += drained as u64;
            self.settle(&session, handler(&session))
        });

        let outcome = match &result {
            Ok(outcome) => *outcome,
            Err(e) => {
                error!(operation, tx_id = ctx.tx_id(), error = %e, "Operation failed");
                Outcome::Failed
            }
        };
        metric_inc!(OPERATIONS, &[CONTRACT, operation, outcome.label()]);

        let mut stats = self.stats.write();
        stats.operations_executed += 1;
        match outcome {
            Outcome::Applied => stats.succeeded += 1,
            Outcome::Flagged => stats.flagged += 1,
            Outcome::Failed => stats.failed += 1,
        }
        result.map(|_| ())
    }

    /// [`Self::execute`] for operations that carry a typed request. The
    /// request is checked after the drain, before the handler runs.
    fn execute_request<C, R, F>(
        &self,
        ctx: &C,
        operation: &'static str,
        request: &R,
        handler: F,
    ) -> Result<()>
    where
        C: TransactionContext + ?Sized,
        R: Request,
        F: FnOnce(&Session<'_, C>, &R) -> Checked<()>,
    {
        self.execute(ctx, operation, |s| {
            check_request(request)?;
            handler(s, request)
        })
    }

    /// Single handler for soft violations.
    fn settle<C>(&self, session: &Session<'_, C>, checked: Checked<()>) -> Result<Outcome>
    where
        C: TransactionContext + ?Sized,
    {
        match checked {
            Ok(()) => Ok(Outcome::Applied),
            Err(Rejection::Violation(violation)) => {
                let own = session.own_collection()?;
                let flag = flags::raise(session, &own, &violation)?;
                debug!(flag_id = %flag.id, "Call completed as a no-op");
                Ok(Outcome::Flagged)
            }
            Err(Rejection::Failure(e)) => Err(e),
        }
    }

    fn query<C, T, F>(&self, ctx: &C, operation: &'static str, read: F) -> Result<T>
    where
        C: TransactionContext + ?Sized,
        F: FnOnce(&Session<'_, C>) -> Result<T>,
    {
        let _timer = time_histogram!(OPERATION_DURATION.with_label_values(&[operation]));
        let result = read(&self.session(ctx));
        let outcome = if result.is_ok() { "ok" } else { "error" };
        metric_inc!(OPERATIONS, &[CONTRACT, operation, outcome]);
        result
    }

    // =========================================================================
    // MUTATING ENTRY POINTS
    // =========================================================================

    #[instrument(skip(self, ctx, request), fields(operation = "grantRights", caller = tracing::field::Empty, collection = %request.collection))]
    pub fn grant_rights<C>(&self, ctx: &C, request: &GrantRightsRequest) -> Result<()>
    where
        C: TransactionContext + ?Sized,
    {
        self.execute_request(ctx, "grantRights", request, |s, r| gate::grant_rights(s, r))
    }

    #[instrument(skip(self, ctx, request), fields(operation = "receiveRawAsset", caller = tracing::field::Empty, asset_id = %request.id))]
    pub fn receive_raw_asset<C>(&self, ctx: &C, request: &RawAssetRequest) -> Result<()>
    where
        C: TransactionContext + ?Sized,
    {
        self.execute_request(ctx, "receiveRawAsset", request, |s, r| {
            manufacturing::receive_raw_asset(s, r)
        })
    }

    #[instrument(skip(self, ctx, request), fields(operation = "registerRecipe", caller = tracing::field::Empty, recipe_id = %request.id))]
    pub fn register_recipe<C>(&self, ctx: &C, request: &RecipeRequest) -> Result<()>
    where
        C: TransactionContext + ?Sized,
    {
        self.execute_request(ctx, "registerRecipe", request, |s, r| {
            manufacturing::register_recipe(s, r)
        })
    }

    #[instrument(skip(self, ctx, request), fields(operation = "consumeAssets", caller = tracing::field::Empty, asset_id = %request.id))]
    pub fn consume_assets<C>(&self, ctx: &C, request: &ManufactureRequest) -> Result<()>
    where
        C: TransactionContext + ?Sized,
    {
        self.execute_request(ctx, "consumeAssets", request, |s, r| {
            manufacturing::consume_assets(s, r)
        })
    }

    #[instrument(skip(self, ctx, request), fields(operation = "finalizeProduct", caller = tracing::field::Empty, asset_id = %request.id))]
    pub fn finalize_product<C>(&self, ctx: &C, request: &ManufactureRequest) -> Result<()>
    where
        C: TransactionContext + ?Sized,
    {
        self.execute_request(ctx, "finalizeProduct", request, |s, r| {
            manufacturing::finalize_product(s, r)
        })
    }

    #[instrument(skip(self, ctx, request), fields(operation = "createShipment", caller = tracing::field::Empty, shipment_id = %request.id))]
    pub fn create_shipment<C>(&self, ctx: &C, request: &CreateShipmentRequest) -> Result<()>
    where
        C: TransactionContext + ?Sized,
    {
        self.execute_request(ctx, "createShipment", request, |s, r| shipment::create_shipment(s, r))
    }

    #[instrument(skip(self, ctx, request), fields(operation = "claimShipment", caller = tracing::field::Empty, shipment_id = %request.id))]
    pub fn claim_shipment<C>(&self, ctx: &C, request: &ClaimShipmentRequest) -> Result<()>
    where
        C: TransactionContext + ?Sized,
    {
        self.execute_request(ctx, "claimShipment", request, |s, r| shipment::claim_shipment(s, r))
    }

    /// Runs only the drain pre-step.
    #[instrument(skip(self, ctx), fields(operation = "drainDeletionQueue", caller = tracing::field::Empty))]
    pub fn drain_deletion_queue<C>(&self, ctx: &C) -> Result<()>
    where
        C: TransactionContext + ?Sized,
    {
        self.execute(ctx, "drainDeletionQueue", |_| Ok(()))
    }

    // =========================================================================
    // READ ACCESSORS
    // =========================================================================

    pub fn read_rights<C>(&self, ctx: &C, collection: &CollectionName) -> Result<Rights>
    where
        C: TransactionContext + ?Sized,
    {
        self.query(ctx, "readRights", |s| gate::read_rights(s, collection))
    }

    pub fn read_public_asset<C>(&self, ctx: &C, id: &str) -> Result<PublicAsset>
    where
        C: TransactionContext + ?Sized,
    {
        self.query(ctx, "readPublicAsset", |s| queries::read_public_asset(s, id))
    }

    pub fn read_final_asset<C>(&self, ctx: &C, id: &str) -> Result<FinalAsset>
    where
        C: TransactionContext + ?Sized,
    {
        self.query(ctx, "readFinalAsset", |s| queries::read_final_asset(s, id))
    }

    pub fn read_private_asset<C>(
        &self,
        ctx: &C,
        collection: &CollectionName,
        id: &str,
    ) -> Result<Asset>
    where
        C: TransactionContext + ?Sized,
    {
        self.query(ctx, "readPrivateAsset", |s| {
            queries::read_private_asset(s, collection, id)
        })
    }

    pub fn read_recipe<C>(&self, ctx: &C, collection: &CollectionName, id: &str) -> Result<Recipe>
    where
        C: TransactionContext + ?Sized,
    {
        self.query(ctx, "readRecipe", |s| queries::read_recipe(s, collection, id))
    }

    pub fn read_public_shipment<C>(&self, ctx: &C, id: &str) -> Result<ShippingPublic>
    where
        C: TransactionContext + ?Sized,
    {
        self.query(ctx, "readPublicShipment", |s| {
            queries::read_public_shipment(s, id)
        })
    }

    pub fn read_private_shipment<C>(
        &self,
        ctx: &C,
        collection: &CollectionName,
        id: &str,
    ) -> Result<ShippingPrivate>
    where
        C: TransactionContext + ?Sized,
    {
        self.query(ctx, "readPrivateShipment", |s| {
            queries::read_private_shipment(s, collection, id)
        })
    }

    pub fn read_deletion_queue<C>(&self, ctx: &C) -> Result<DeletionQueue>
    where
        C: TransactionContext + ?Sized,
    {
        self.query(ctx, "readDeletionQueue", queries::read_deletion_queue)
    }

    pub fn list_assets<C>(&self, ctx: &C, collection: &CollectionName) -> Result<Vec<Asset>>
    where
        C: TransactionContext + ?Sized,
    {
        self.query(ctx, "listAssets", |s| queries::list_assets(s, collection))
    }

    pub fn list_recipes<C>(&self, ctx: &C, collection: &CollectionName) -> Result<Vec<Recipe>>
    where
        C: TransactionContext + ?Sized,
    {
        self.query(ctx, "listRecipes", |s| queries::list_recipes(s, collection))
    }

    pub fn list_private_shipments<C>(
        &self,
        ctx: &C,
        collection: &CollectionName,
    ) -> Result<Vec<ShippingPrivate>>
    where
        C: TransactionContext + ?Sized,
    {
        self.query(ctx, "listPrivateShipments", |s| {
            queries::list_private_shipments(s, collection)
        })
    }

    pub fn list_public_shipments<C>(&self, ctx: &C) -> Result<Vec<ShippingPublic>>
    where
        C: TransactionContext + ?Sized,
    {
        self.query(ctx, "listPublicShipments", queries::list_public_shipments)
    }

    pub fn trace_lineage<C>(&self, ctx: &C, id: &str) -> Result<Vec<String>>
    where
        C: TransactionContext + ?Sized,
    {
        self.query(ctx, "traceLineage", |s| queries::trace_lineage(s, id))
    }

    pub fn list_flags<C>(&self, ctx: &C, collection: &CollectionName) -> Result<Vec<Flag>>
    where
        C: TransactionContext + ?Sized,
    {
        self.query(ctx, "listFlags", |s| queries::list_flags(s, collection))
    }

    // =========================================================================
    // DISPATCH
    // =========================================================================

    /// Routes a function name to its entry point.
    ///
    /// Mutating functions read their request from the transient map; read
    /// functions take positional `args` (`collection` before `id`). Mutating
    /// functions return `null`.
    pub fn invoke<C>(&self, ctx: &C, function: &str, args: &[&str]) -> Result<Value>
    where
        C: TransactionContext + ?Sized,
    {
        info!(function, tx_id = ctx.tx_id(), "Invoke");
        match function {
            "grantRights" => self
                .grant_rights(ctx, &self.payload(ctx)?)
                .map(|_| Value::Null),
            "receiveRawAsset" => self
                .receive_raw_asset(ctx, &self.payload(ctx)?)
                .map(|_| Value::Null),
            "registerRecipe" => self
                .register_recipe(ctx, &self.payload(ctx)?)
                .map(|_| Value::Null),
            "consumeAssets" => self
                .consume_assets(ctx, &self.payload(ctx)?)
                .map(|_| Value::Null),
            "finalizeProduct" => self
                .finalize_product(ctx, &self.payload(ctx)?)
                .map(|_| Value::Null),
            "createShipment" => self
                .create_shipment(ctx, &self.payload(ctx)?)
                .map(|_| Value::Null),
            "claimShipment" => self
                .claim_shipment(ctx, &self.payload(ctx)?)
                .map(|_| Value::Null),
            "drainDeletionQueue" => self.drain_deletion_queue(ctx).map(|_| Value::Null),

            "readRights" => to_json(self.read_rights(ctx, &collection_arg(args, 0)?)?),
            "readPublicAsset" => to_json(self.read_public_asset(ctx, arg(args, 0, "id")?)?),
            "readFinalAsset" => to_json(self.read_final_asset(ctx, arg(args, 0, "id")?)?),
            "readPrivateAsset" => to_json(self.read_private_asset(
                ctx,
                &collection_arg(args, 0)?,
                arg(args, 1, "id")?,
            )?),
            "readRecipe" => to_json(self.read_recipe(
                ctx,
                &collection_arg(args, 0)?,
                arg(args, 1, "id")?,
            )?),
            "readPublicShipment" => {
                to_json(self.read_public_shipment(ctx, arg(args, 0, "id")?)?)
            }
            "readPrivateShipment" => to_json(self.read_private_shipment(
                ctx,
                &collection_arg(args, 0)?,
                arg(args, 1, "id")?,
            )?),
            "readDeletionQueue" => to_json(self.read_deletion_queue(ctx)?),
            "listAssets" => to_json(self.list_assets(ctx, &collection_arg(args, 0)?)?),
            "listRecipes" => to_json(self.list_recipes(ctx, &collection_arg(args, 0)?)?),
            "listPrivateShipments" => {
                to_json(self.list_private_shipments(ctx, &collection_arg(args, 0)?)?)
            }
            "listPublicShipments" => to_json(self.list_public_shipments(ctx)?),
            "traceLineage" => to_json(self.trace_lineage(ctx, arg(args, 0, "id")?)?),
            "listFlags" => to_json(self.list_flags(ctx, &collection_arg(args, 0)?)?),

            other => Err(ProvenanceError::validation(format!(
                "unknown function {other}"
            ))),
        }
    }

    fn payload<C, R>(&self, ctx: &C) -> Result<R>
    where
        C: TransactionContext + ?Sized,
        R: Request,
    {
        decode_payload(&self.session(ctx).transient_payload()?)
    }
}

fn arg<'a>(args: &[&'a str], index: usize, name: &str) -> Result<&'a str> {
    args.get(index)
        .copied()
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ProvenanceError::validation(format!("missing argument {name}")))
}

fn collection_arg(args: &[&str], index: usize) -> Result<CollectionName> {
    arg(args, index, "collection").map(CollectionName::new)
}

fn to_json<T: Serialize>(value: T) -> Result<Value> {
    Ok(serde_json::to_value(value).map_err(StoreError::from)?)
}
