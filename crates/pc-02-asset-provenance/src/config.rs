//! # Provenance Configuration
//!
//! Names and formats the contract depends on. All of them are fixed per
//! network, so every endorsing peer must run with the same values.

use chrono::format::{Item, StrftimeItems};
use shared_types::{CollectionName, OrgId};
use std::env;
use thiserror::Error;

/// Configuration of the asset-provenance contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvenanceConfig {
    /// Only organisation allowed to grant rights and register recipes.
    pub issuing_authority: OrgId,
    /// Appended to an organisation id to name its private collection.
    pub collection_suffix: String,
    /// Collection shared by every organisation, holding shipment pointers
    /// and the deletion queue.
    pub shipping_collection: CollectionName,
    /// Product name reserved for the OEM terminal path.
    pub terminal_product: String,
    /// `chrono` format of shipment dates.
    pub date_format: String,
    /// Transient map key carrying the request payload.
    pub transient_key: String,
}

impl Default for ProvenanceConfig {
    fn default() -> Self {
        Self {
            issuing_authority: OrgId::new("Org1MSP"),
            collection_suffix: "PrivateCollection".to_string(),
            shipping_collection: CollectionName::new("shippingCollection"),
            terminal_product: "FinalProduct".to_string(),
            date_format: "%d-%m-%Y".to_string(),
            transient_key: "asset_properties".to_string(),
        }
    }
}

impl ProvenanceConfig {
    /// Defaults overridden by environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `PC_ISSUING_AUTHORITY` (default: Org1MSP)
    /// - `PC_COLLECTION_SUFFIX` (default: PrivateCollection)
    /// - `PC_SHIPPING_COLLECTION` (default: shippingCollection)
    /// - `PC_TERMINAL_PRODUCT` (default: FinalProduct)
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Ok(v) = env::var("PC_ISSUING_AUTHORITY") {
            config.issuing_authority = OrgId::new(v);
        }
        if let Ok(v) = env::var("PC_COLLECTION_SUFFIX") {
            config.collection_suffix = v;
        }
        if let Ok(v) = env::var("PC_SHIPPING_COLLECTION") {
            config.shipping_collection = CollectionName::new(v);
        }
        if let Ok(v) = env::var("PC_TERMINAL_PRODUCT") {
            config.terminal_product = v;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("issuing_authority", self.issuing_authority.as_str()),
            ("collection_suffix", self.collection_suffix.as_str()),
            ("shipping_collection", self.shipping_collection.as_str()),
            ("terminal_product", self.terminal_product.as_str()),
            ("date_format", self.date_format.as_str()),
            ("transient_key", self.transient_key.as_str()),
        ];
        for (field, value) in required {
            if value.is_empty() {
                return Err(ConfigError::Empty(field));
            }
        }
        if StrftimeItems::new(&self.date_format).any(|item| matches!(item, Item::Error)) {
            return Err(ConfigError::DateFormat(self.date_format.clone()));
        }
        // An org collection named like the shared one would leak pointers
        if self
            .issuing_authority
            .private_collection(&self.collection_suffix)
            == self.shipping_collection
        {
            return Err(ConfigError::CollectionClash(
                self.shipping_collection.clone(),
            ));
        }
        Ok(())
    }

    /// Private collection of `org`.
    pub fn collection_of(&self, org: &OrgId) -> CollectionName {
        org.private_collection(&self.collection_suffix)
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Configuration field {0} must not be empty")]
    Empty(&'static str),

    #[error("Private collection of the issuing authority clashes with {0}")]
    CollectionClash(CollectionName),

    #[error("Unsupported date format {0:?}")]
    DateFormat(String),
}
