//! # Typed Requests
//!
//! Confidential inputs travel in the transient side channel as JSON. Each
//! operation decodes its payload into one of these structs and validates it
//! before any ledger access.
//!
//! Every request carries a `version`. Omitting it means version 1.

use crate::errors::{ProvenanceError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use shared_types::{Role, ShippingPrivate};
use std::collections::HashSet;

/// Highest request version this contract understands.
pub const CURRENT_REQUEST_VERSION: u32 = 1;

fn default_version() -> u32 {
    CURRENT_REQUEST_VERSION
}

/// Boundary validation shared by all request types.
pub trait Request: DeserializeOwned {
    fn version(&self) -> u32;

    /// Field-level checks that need no ledger access.
    fn validate(&self) -> Result<()>;
}

/// Decodes a transient payload without checking it.
pub fn decode_payload<R: Request>(bytes: &[u8]) -> Result<R> {
    serde_json::from_slice(bytes)
        .map_err(|e| ProvenanceError::validation(format!("failed to unmarshal JSON: {e}")))
}

/// Version check followed by [`Request::validate`].
pub fn check_request<R: Request>(request: &R) -> Result<()> {
    if request.version() == 0 || request.version() > CURRENT_REQUEST_VERSION {
        return Err(ProvenanceError::validation(format!(
            "unsupported request version {}",
            request.version()
        )));
    }
    request.validate()
}

/// Decodes, version-checks and validates a transient payload.
pub fn decode_request<R: Request>(bytes: &[u8]) -> Result<R> {
    let request: R = decode_payload(bytes)?;
    check_request(&request)?;
    Ok(request)
}

fn require_non_empty(field: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(ProvenanceError::validation(format!(
            "{field} field must be a non-empty string"
        )));
    }
    Ok(())
}

fn require_non_empty_list(field: &str, values: &[String]) -> Result<()> {
    if values.is_empty() {
        return Err(ProvenanceError::validation(format!(
            "{field} must be a non-empty list"
        )));
    }
    if values.iter().any(String::is_empty) {
        return Err(ProvenanceError::validation(format!(
            "{field} must not contain empty ids"
        )));
    }
    Ok(())
}

fn require_distinct(field: &str, values: &[String]) -> Result<()> {
    let mut seen = HashSet::with_capacity(values.len());
    for value in values {
        if !seen.insert(value.as_str()) {
            return Err(ProvenanceError::validation(format!(
                "{field} lists {value} more than once"
            )));
        }
    }
    Ok(())
}

// =============================================================================
// RIGHTS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantRightsRequest {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Role")]
    pub role: String,
    #[serde(rename = "Collection")]
    pub collection: String,
}

impl GrantRightsRequest {
    pub fn role(&self) -> Result<Role> {
        self.role.parse().map_err(|_| {
            ProvenanceError::validation("Role does not fit any of the predefined ones [Mine,Supplier,OEM]")
        })
    }
}

impl Request for GrantRightsRequest {
    fn version(&self) -> u32 {
        self.version
    }

    fn validate(&self) -> Result<()> {
        if self.id != shared_types::RIGHTS_KEY {
            return Err(ProvenanceError::validation("ID must be adjusted to 'RIGHTS'"));
        }
        require_non_empty("Role", &self.role)?;
        require_non_empty("Collection", &self.collection)?;
        self.role().map(|_| ())
    }
}

// =============================================================================
// ASSETS & RECIPES
// =============================================================================

/// Raw material entering the chain at a mine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawAssetRequest {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(rename = "assetName")]
    pub name: String,
    #[serde(rename = "assetID")]
    pub id: String,
    #[serde(rename = "emissionsIDs")]
    pub emissions_ids: Vec<String>,
}

impl Request for RawAssetRequest {
    fn version(&self) -> u32 {
        self.version
    }

    fn validate(&self) -> Result<()> {
        require_non_empty("assetName", &self.name)?;
        require_non_empty("assetID", &self.id)?;
        require_non_empty_list("emissionsIDs", &self.emissions_ids)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeRequest {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(rename = "recipeID")]
    pub id: String,
    #[serde(rename = "Product")]
    pub product: String,
    #[serde(rename = "Ingredients")]
    pub ingredients: Vec<String>,
    #[serde(rename = "Quantity")]
    pub quantities: Vec<u32>,
    /// Collection of the organisation that will use the recipe.
    #[serde(rename = "Collection")]
    pub collection: String,
}

impl Request for RecipeRequest {
    fn version(&self) -> u32 {
        self.version
    }

    fn validate(&self) -> Result<()> {
        require_non_empty("recipeID", &self.id)?;
        require_non_empty("Product", &self.product)?;
        require_non_empty("Collection", &self.collection)?;
        require_non_empty_list("Ingredients", &self.ingredients)?;
        if self.quantities.is_empty() {
            return Err(ProvenanceError::validation("Quantity must be a non-empty list"));
        }
        if self.ingredients.len() != self.quantities.len() {
            return Err(ProvenanceError::validation(
                "Lists parameters must have the same length",
            ));
        }
        if self.quantities.contains(&0) {
            return Err(ProvenanceError::validation(
                "Quantity entries must be positive",
            ));
        }
        require_distinct("Ingredients", &self.ingredients)
    }
}

/// Input of both manufacturing paths (intermediate and terminal).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManufactureRequest {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(rename = "recipeID")]
    pub recipe_id: String,
    #[serde(rename = "assetName")]
    pub name: String,
    #[serde(rename = "assetID")]
    pub id: String,
    /// Emissions of the manufacturing step itself.
    #[serde(rename = "emissionsIDs")]
    pub emissions_ids: Vec<String>,
    /// Private asset ids consumed as ingredients.
    #[serde(rename = "assets")]
    pub assets: Vec<String>,
}

impl Request for ManufactureRequest {
    fn version(&self) -> u32 {
        self.version
    }

    fn validate(&self) -> Result<()> {
        require_non_empty("recipeID", &self.recipe_id)?;
        require_non_empty("assetName", &self.name)?;
        require_non_empty("assetID", &self.id)?;
        require_non_empty_list("emissionsIDs", &self.emissions_ids)?;
        require_non_empty_list("assets", &self.assets)?;
        require_distinct("assets", &self.assets)
    }
}

// =============================================================================
// SHIPMENTS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateShipmentRequest {
    #[serde(default = "default_version")]
    pub version: u32,
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
    /// One emissions id per shipped asset, for the transport leg.
    #[serde(rename = "shipEmissionsIDs")]
    pub shipped_emissions_ids: Vec<String>,
}

impl Request for CreateShipmentRequest {
    fn version(&self) -> u32 {
        self.version
    }

    fn validate(&self) -> Result<()> {
        require_non_empty("shippingID", &self.id)?;
        if self.quantity == 0 {
            return Err(ProvenanceError::validation(
                "Quantity field must be a non-empty, positive integer",
            ));
        }
        require_non_empty_list("list_ID", &self.asset_ids)?;
        require_non_empty("assetName", &self.name)?;
        require_non_empty("date", &self.date)?;
        require_non_empty_list("shipEmissionsIDs", &self.shipped_emissions_ids)?;
        if self.asset_ids.len() != self.quantity as usize {
            return Err(ProvenanceError::validation(
                "Number of Asset IDs in list_ID must match quantity",
            ));
        }
        if self.shipped_emissions_ids.len() != self.asset_ids.len() {
            return Err(ProvenanceError::validation(
                "shipEmissionsIDs must hold one id per shipped asset",
            ));
        }
        require_distinct("list_ID", &self.asset_ids)
    }
}

/// The buyer's reconstruction of a shipment. Its fields mirror
/// [`ShippingPrivate`] exactly, so the reconstruction hashes to the seller's
/// commitment iff every field matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimShipmentRequest {
    #[serde(default = "default_version")]
    pub version: u32,
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
    #[serde(rename = "emissionsIDs")]
    pub emissions_ids: Vec<Vec<String>>,
}

impl ClaimShipmentRequest {
    /// The seller record this claim asserts exists.
    pub fn reconstruct(&self) -> ShippingPrivate {
        ShippingPrivate {
            id: self.id.clone(),
            quantity: self.quantity,
            asset_ids: self.asset_ids.clone(),
            name: self.name.clone(),
            date: self.date.clone(),
            emissions_ids: self.emissions_ids.clone(),
        }
    }
}

impl Request for ClaimShipmentRequest {
    fn version(&self) -> u32 {
        self.version
    }

    fn validate(&self) -> Result<()> {
        require_non_empty("shippingID", &self.id)?;
        if self.quantity == 0 {
            return Err(ProvenanceError::validation(
                "Quantity field must be a non-empty, positive integer",
            ));
        }
        require_non_empty_list("list_ID", &self.asset_ids)?;
        require_non_empty("assetName", &self.name)?;
        require_non_empty("date", &self.date)?;
        if self.emissions_ids.is_empty() {
            return Err(ProvenanceError::validation(
                "emissionsIDs must be a non-empty list",
            ));
        }
        if self.emissions_ids.len() != self.asset_ids.len() {
            return Err(ProvenanceError::validation(
                "emissionsIDs must hold one list per asset in list_ID",
            ));
        }
        require_distinct("list_ID", &self.asset_ids)
    }
}
