use thiserror::Error;

/// Message constants shared by handlers, the ledger and tests.
pub mod msg {
    pub const INVALID_WEBHOOK_SECRET: &str = "Invalid webhook secret";
    pub const WEBHOOK_SECRET_NOT_CONFIGURED: &str = "Webhook secret is not configured";
    pub const INVALID_SIGNATURE: &str = "Invalid signature";

    pub const INVALID_PAYLOAD: &str = "Payload is not a webhook envelope";
    pub const MISSING_METADATA: &str = "Event has no metadata";
    pub const MISSING_REFERENCE: &str = "Event has no payment reference";
    pub const UNRECOGNIZED_METADATA: &str = "Metadata carries neither a cart nor a userId";
    pub const MISSING_STORE_ID: &str = "Cart metadata has no storeId";
    pub const EMPTY_CART: &str = "Cart is empty";
    pub const INVALID_QUANTITY: &str = "Cart quantity must be at least 1";
    pub const MISSING_PLAN_TIER: &str = "Activation metadata has no planTier";
    pub const INVALID_BILLING_INTERVAL: &str = "plan must be monthly or yearly";
    pub const MISSING_AMOUNT: &str = "Event has no captured amount";
    pub const NEGATIVE_AMOUNT: &str = "Captured amount cannot be negative";

    pub const PRODUCT_NOT_FOUND: &str = "Product not found";
    pub const VENDOR_NOT_FOUND: &str = "Vendor profile not found";
    pub const STORE_NOT_FOUND: &str = "Store not found";
    pub const USER_NOT_FOUND: &str = "User not found";
    pub const ALERT_NOT_FOUND: &str = "Alert not found";
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Builds a `NotFound` naming the missing entity and its id.
    pub fn not_found(what: &str, id: &str) -> Self {
        AppError::NotFound(format!("{}: {}", what, id))
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
