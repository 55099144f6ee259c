use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Vendor plan tier that earns the reduced platform commission.
/// Compared by exact string match; every other tier pays the standard rate.
pub const PREMIUM_VENDOR_TIER: &str = "PREMIUM";

/// Supplier selling through the marketplace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vendor {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    /// Subscription tier of the vendor, e.g. "STANDARD" or "PREMIUM"
    pub plan_tier: String,
    pub created_at: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateVendor {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    pub plan_tier: String,
}

/// Catalog item. Prices are in currency units (dollars, not cents).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub vendor_id: String,
    /// Cost basis owed to the supplying vendor before commission
    pub wholesale_price: f64,
    pub suggested_retail_price: f64,
    /// True when the item ships through the platform's managed supply
    /// (as opposed to a seller's private inventory)
    pub is_managed: bool,
    pub created_at: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateProduct {
    pub id: String,
    pub name: String,
    pub vendor_id: String,
    pub wholesale_price: f64,
    pub suggested_retail_price: f64,
    #[serde(default)]
    pub is_managed: bool,
}

impl CreateProduct {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::BadRequest("Product name cannot be empty".into()));
        }
        if !self.wholesale_price.is_finite() || self.wholesale_price < 0.0 {
            return Err(AppError::BadRequest("wholesale_price must be a non-negative number".into()));
        }
        if !self.suggested_retail_price.is_finite() || self.suggested_retail_price < 0.0 {
            return Err(AppError::BadRequest(
                "suggested_retail_price must be a non-negative number".into(),
            ));
        }
        Ok(())
    }
}

/// Storefront owned by a seller. Profit on orders placed through the store
/// is paid to `owner_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Store {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub created_at: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateStore {
    pub id: String,
    pub owner_id: String,
    pub name: String,
}
