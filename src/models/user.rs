use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

/// Billing interval of a subscription plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BillingInterval {
    Monthly,
    Yearly,
}

impl BillingInterval {
    /// Months billed per charge. A yearly plan is priced at ten months.
    pub fn price_multiplier(&self) -> f64 {
        match self {
            Self::Monthly => 1.0,
            Self::Yearly => 10.0,
        }
    }
}

/// Marketplace account. Carries the referral counters for users who refer
/// others.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    /// Paid subscription is active
    pub has_access: bool,
    pub access_granted_at: Option<i64>,
    /// User id of whoever referred this user
    pub referred_by: Option<String>,
    pub plan_tier: Option<String>,
    pub billing_interval: Option<BillingInterval>,
    /// Referred users that have activated a paid plan
    pub active_referral_count: i64,
    /// Sum of all referral rewards ever accrued (currency units)
    pub total_referral_earnings: f64,
    pub created_at: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateUser {
    pub id: String,
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub referred_by: Option<String>,
    #[serde(default)]
    pub has_access: bool,
    #[serde(default)]
    pub active_referral_count: i64,
}
