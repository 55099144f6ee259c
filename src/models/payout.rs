use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

/// Payout state while it waits for withdrawal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PayoutStatus {
    /// Withdrawable
    Pending,
    /// Held until `matures_at`; promoted to `Pending` by the maturity sweep
    PendingMaturity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PayoutType {
    SaleCommission,
    ReferralReward,
    StoreProfit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RecipientKind {
    Vendor,
    StoreOwner,
    Referrer,
}

/// Money owed to a vendor, store owner or referrer, not yet withdrawn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoutPending {
    pub id: String,
    pub recipient_id: String,
    pub recipient_kind: RecipientKind,
    /// Currency units, always > 0
    pub amount: f64,
    pub currency: String,
    pub status: PayoutStatus,
    pub payout_type: PayoutType,
    pub order_id: Option<String>,
    pub payment_reference: String,
    /// Referral rewards only: the user whose activation produced the reward
    pub referred_user_id: Option<String>,
    /// Descriptive context for audit (product name, quantity, locality).
    /// Never used in computation.
    pub metadata: Option<serde_json::Value>,
    pub created_at: i64,
    /// Earliest time a held payout may be promoted to `Pending`
    pub matures_at: Option<i64>,
}

/// Data required to record a payout. Built by the settlement engines.
#[derive(Debug, Clone, PartialEq)]
pub struct CreatePayout {
    pub recipient_id: String,
    pub recipient_kind: RecipientKind,
    pub amount: f64,
    pub status: PayoutStatus,
    pub payout_type: PayoutType,
    pub referred_user_id: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub matures_at: Option<i64>,
}
