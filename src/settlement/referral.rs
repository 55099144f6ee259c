//! Referral rewards for subscription activations.
//!
//! A referrer earns a share of the referred user's plan price. The share is a
//! step function of how many referrals the referrer already has, evaluated
//! before this activation is counted. Rewards are held for
//! [`MATURITY_HOLD_SECS`] before they can be withdrawn.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::models::{BillingInterval, CreatePayout, PayoutStatus, PayoutType, RecipientKind};

/// Hold applied to every referral reward before withdrawal (14 days).
pub const MATURITY_HOLD_SECS: i64 = 14 * 86400;

/// Rate paid when the referrer has 51 or more active referrals.
pub const TOP_TIER_RATE: f64 = 0.20;
/// Rate paid when the referrer has 21 to 50 active referrals.
pub const MID_TIER_RATE: f64 = 0.15;
/// Rate paid below 21 active referrals.
pub const BASE_TIER_RATE: f64 = 0.10;

/// Commission rate for a referrer with `active_referral_count` activations
/// recorded so far.
pub fn referral_commission_rate(active_referral_count: i64) -> f64 {
    if active_referral_count >= 51 {
        TOP_TIER_RATE
    } else if active_referral_count >= 21 {
        MID_TIER_RATE
    } else {
        BASE_TIER_RATE
    }
}

/// Base monthly price per plan tier, in currency units.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanPricing {
    prices: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid plan pricing entry '{0}'")]
pub struct PlanPricingError(String);

impl Default for PlanPricing {
    fn default() -> Self {
        Self::from_pairs([("MERCHANT", 19.99), ("SUPPLIER", 29.99), ("ENTERPRISE", 99.99)])
    }
}

impl PlanPricing {
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, f64)>) -> Self {
        Self {
            prices: pairs
                .into_iter()
                .map(|(tier, price)| (tier.to_string(), price))
                .collect(),
        }
    }

    /// Parses `TIER=price` pairs separated by commas, e.g.
    /// `MERCHANT=19.99,SUPPLIER=29.99`.
    pub fn parse(raw: &str) -> Result<Self, PlanPricingError> {
        let mut prices = BTreeMap::new();
        for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (tier, price) = entry
                .split_once('=')
                .ok_or_else(|| PlanPricingError(entry.to_string()))?;
            let tier = tier.trim();
            let price: f64 = price
                .trim()
                .parse()
                .map_err(|_| PlanPricingError(entry.to_string()))?;
            if tier.is_empty() || !price.is_finite() || price < 0.0 {
                return Err(PlanPricingError(entry.to_string()));
            }
            prices.insert(tier.to_string(), price);
        }
        if prices.is_empty() {
            return Err(PlanPricingError(raw.to_string()));
        }
        Ok(Self { prices })
    }

    /// Monthly price for a tier. Unknown tiers price at zero.
    pub fn base_price(&self, plan_tier: &str) -> f64 {
        self.prices.get(plan_tier).copied().unwrap_or(0.0)
    }
}

/// Reward owed to a referrer for one activation.
pub fn compute_referral_reward(
    pricing: &PlanPricing,
    plan_tier: &str,
    interval: BillingInterval,
    active_referral_count: i64,
) -> f64 {
    pricing.base_price(plan_tier)
        * interval.price_multiplier()
        * referral_commission_rate(active_referral_count)
}

/// Builds the held payout for a referral reward, or `None` when the amount is
/// not positive.
pub fn referral_payout(
    referrer_id: &str,
    referred_user_id: &str,
    amount: f64,
    plan_tier: &str,
    interval: BillingInterval,
    rate: f64,
    now: i64,
) -> Option<CreatePayout> {
    if amount <= 0.0 {
        return None;
    }
    Some(CreatePayout {
        recipient_id: referrer_id.to_string(),
        recipient_kind: RecipientKind::Referrer,
        amount,
        status: PayoutStatus::PendingMaturity,
        payout_type: PayoutType::ReferralReward,
        referred_user_id: Some(referred_user_id.to_string()),
        metadata: Some(serde_json::json!({
            "plan_tier": plan_tier,
            "billing_interval": interval.as_ref(),
            "commission_rate": rate,
        })),
        matures_at: Some(now + MATURITY_HOLD_SECS),
    })
}
