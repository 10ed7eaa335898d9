//! # Core Domain Entities
//!
//! Ledger records exchanged between the provenance and emissions subsystems.
//!
//! ## Clusters
//!
//! - **Identity**: `OrgId`, `CollectionName`, `Role`, `Rights`
//! - **Assets & Recipes**: `Asset`, `PublicAsset`, `FinalAsset`, `Recipe`
//! - **Shipments**: `ShippingPrivate`, `ShippingPublic`, `DeletionQueue`
//! - **Audit Trail**: `Flag`, `FlagSequence`
//! - **Emissions**: `EmissionsRecord`, `EmissionsRecordPrivateDetails`
//!
//! Field names on the wire are fixed by `#[serde(rename)]`. Struct field
//! order is part of the format: commitment hashes are computed over the
//! serialized bytes, so reordering fields breaks shipment claims.

use crate::errors::TypeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// RESERVED KEYS & NAMESPACES
// =============================================================================

/// Key of the rights record in every organisation collection.
pub const RIGHTS_KEY: &str = "RIGHTS";

/// Key of the per-collection flag counter.
pub const FLAG_SEQUENCE_KEY: &str = "FLAG_SEQ";

/// Key of the deletion backlog in the shared pointer collection.
pub const DELETION_QUEUE_KEY: &str = "DEL";

/// `basedOn` marker for raw material that was not produced from other assets.
pub const LINEAGE_ROOT_SENTINEL: &str = "none";

/// Key namespace of the asset-provenance contract.
pub const PROVENANCE_NAMESPACE: &str = "provenance";

/// Key namespace of the emissions-audit contract.
pub const EMISSIONS_NAMESPACE: &str = "emissions";

/// Returns true for identifiers that no asset, recipe or shipment may take.
pub fn is_reserved_key(id: &str) -> bool {
    matches!(id, RIGHTS_KEY | FLAG_SEQUENCE_KEY | DELETION_QUEUE_KEY)
}

// =============================================================================
// CLUSTER A: IDENTITY
// =============================================================================

/// Membership-service identifier of an organisation, e.g. `Org1MSP`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrgId(String);

impl OrgId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name of the collection private to this organisation.
    pub fn private_collection(&self, suffix: &str) -> CollectionName {
        CollectionName(format!("{}{}", self.0, suffix))
    }
}

impl fmt::Display for OrgId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OrgId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Name of a private data collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollectionName(String);

impl CollectionName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CollectionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CollectionName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Role granted to an organisation by the issuing authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Injects raw material into the chain.
    Mine,
    /// Manufactures intermediate goods.
    Supplier,
    /// Produces terminal goods.
    #[serde(rename = "OEM")]
    Oem,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mine => "Mine",
            Self::Supplier => "Supplier",
            Self::Oem => "OEM",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Mine" => Ok(Self::Mine),
            "Supplier" => Ok(Self::Supplier),
            "OEM" => Ok(Self::Oem),
            other => Err(TypeError::UnknownRole(other.to_string())),
        }
    }
}

/// Rights record stored under [`RIGHTS_KEY`] in an organisation collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rights {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Role")]
    pub role: Role,
}

impl Rights {
    pub fn new(role: Role) -> Self {
        Self {
            id: RIGHTS_KEY.to_string(),
            role,
        }
    }
}

// =============================================================================
// CLUSTER B: ASSETS & RECIPES
// =============================================================================

/// Whether a private asset was received (`in`) or produced for shipping (`out`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    In,
    Out,
}

impl FromStr for Direction {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in" => Ok(Self::In),
            "out" => Ok(Self::Out),
            other => Err(TypeError::UnknownDirection(other.to_string())),
        }
    }
}

/// Private view of an asset held by one organisation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    #[serde(rename = "assetName")]
    pub name: String,
    #[serde(rename = "assetID")]
    pub id: String,
    #[serde(rename = "emissionsIDs")]
    pub emissions_ids: Vec<String>,
    #[serde(rename = "Direction")]
    pub direction: Direction,
}

/// Public lineage node of an asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicAsset {
    #[serde(rename = "assetID")]
    pub id: String,
    #[serde(rename = "emissionsIDs")]
    pub emissions_ids: Vec<String>,
    #[serde(rename = "BasedOn")]
    pub based_on: Vec<String>,
}

impl PublicAsset {
    /// True when this asset was injected as raw material.
    pub fn is_root(&self) -> bool {
        self.based_on.is_empty()
            || (self.based_on.len() == 1 && self.based_on[0] == LINEAGE_ROOT_SENTINEL)
    }

    /// Parents in the lineage graph, without the root sentinel.
    pub fn parents(&self) -> impl Iterator<Item = &str> {
        self.based_on
            .iter()
            .map(String::as_str)
            .filter(|id| *id != LINEAGE_ROOT_SENTINEL)
    }
}

/// Terminal lineage node. Nothing can be produced from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalAsset {
    #[serde(rename = "assetID")]
    pub id: String,
    #[serde(rename = "emissionsIDs")]
    pub emissions_ids: Vec<String>,
    /// Sum of the kg CO2 of every emissions record in `emissions_ids`.
    #[serde(rename = "GHG")]
    pub ghg: i64,
    #[serde(rename = "BasedOn")]
    pub based_on: Vec<String>,
}

/// Production recipe. `ingredients[i]` is needed `quantities[i]` times.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    #[serde(rename = "recipeID")]
    pub id: String,
    #[serde(rename = "product")]
    pub product: String,
    #[serde(rename = "ingredients")]
    pub ingredients: Vec<String>,
    #[serde(rename = "quantity")]
    pub quantities: Vec<u32>,
}

// =============================================================================
// CLUSTER C: SHIPMENTS
// =============================================================================

/// Seller-side shipment record. Its hash is the commitment a buyer checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingPrivate {
    #[serde(rename = "shippingID")]
    pub id: String,
    #[serde(rename = "quantity")]
    pub quantity: u32,
    #[serde(rename = "list_ID")]
    pub asset_ids: Vec<String>,
    #[serde(rename = "assetName")]
    pub name: String,
    #[serde(rename = "date")]
    pub date: String,
    /// Emissions ids per shipped asset, shipment leg last.
    #[serde(rename = "emissionsIDs")]
    pub emissions_ids: Vec<Vec<String>>,
}

/// Pointer published in the shared collection while a shipment is claimable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingPublic {
    #[serde(rename = "shippingID")]
    pub id: String,
    #[serde(rename = "sellerID")]
    pub seller: OrgId,
    #[serde(rename = "assetName")]
    pub name: String,
}

/// Backlog of claimed shipment ids awaiting cleanup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletionQueue {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Del_List")]
    pub pending: Vec<String>,
}

impl DeletionQueue {
    pub fn new(pending: Vec<String>) -> Self {
        Self {
            id: DELETION_QUEUE_KEY.to_string(),
            pending,
        }
    }
}

impl Default for DeletionQueue {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

// =============================================================================
// CLUSTER D: AUDIT TRAIL
// =============================================================================

/// Audit entry for a rejected or unauthorised attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flag {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Mesg")]
    pub message: String,
}

impl Flag {
    pub fn id_for(sequence: u64) -> String {
        format!("F{sequence}")
    }

    /// Sequence number encoded in the id, if it is a well-formed flag id.
    pub fn sequence(&self) -> Option<u64> {
        self.id.strip_prefix('F')?.parse().ok()
    }
}

/// Monotonic counter of flags raised in one collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FlagSequence {
    #[serde(rename = "Next")]
    pub next: u64,
}

// =============================================================================
// CLUSTER E: EMISSIONS
// =============================================================================

/// Publicly visible emissions figure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmissionsRecord {
    #[serde(rename = "ID")]
    pub id: String,
    /// Total emissions in kg of CO2.
    #[serde(rename = "KgCO2")]
    pub kg_co2: i64,
}

/// Owner details visible only to the submitting organisation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmissionsRecordPrivateDetails {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Owner")]
    pub owner: String,
}
