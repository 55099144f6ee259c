use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

/// Platform revenue category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum RevenueType {
    /// Commission taken on a managed-supply sale
    Transaction,
    /// Subscription payment
    Subscription,
}

/// Append-only platform revenue record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevenueLogEntry {
    pub id: String,
    pub amount: f64,
    pub currency: String,
    pub revenue_type: RevenueType,
    pub payment_reference: String,
    /// Order id for transaction revenue, user id for subscriptions
    pub source_id: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateRevenueLog {
    pub amount: f64,
    pub revenue_type: RevenueType,
    pub source_id: String,
}
