//! Atomic application of settlement writes.
//!
//! Each settlement runs in one `BEGIN IMMEDIATE` transaction. The write lock is
//! taken before the idempotency check, so two deliveries of the same reference
//! serialize: the second one waits on the busy timeout, then sees the first
//! one's rows and returns [`SettleOutcome::AlreadyProcessed`]. Every read that
//! feeds an amount (products, vendor tiers, referrer counters) happens under
//! the same lock.

use rusqlite::{Connection, TransactionBehavior};

use super::commission::{SplitLine, compute_split};
use super::referral::{
    PlanPricing, compute_referral_reward, referral_commission_rate, referral_payout,
};
use crate::db::queries;
use crate::error::{AppError, Result, msg};
use crate::id::order_id_for_reference;
use crate::models::{
    CreateOrder, CreateRevenueLog, Order, OrderItem, PayoutPending, RevenueLogEntry, RevenueType,
};
use crate::payments::{ActivationCharge, OrderCharge};

#[derive(Debug)]
pub enum SettleOutcome<T> {
    Committed(T),
    /// The reference was settled by an earlier delivery; nothing was written
    AlreadyProcessed,
}

#[derive(Debug)]
pub struct SettledOrder {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub payouts: Vec<PayoutPending>,
    pub revenue: Vec<RevenueLogEntry>,
    pub store_profit: f64,
}

/// Result of the referral step of an activation.
#[derive(Debug)]
pub enum ReferralOutcome {
    Rewarded(PayoutPending),
    /// Referrer counted, but the plan price yields no reward
    NothingOwed,
    NoReferrer,
    ReferrerNotFound(String),
    /// Referrer has not paid; unpaid referrers earn nothing
    ReferrerInactive(String),
    /// User already had access, so this charge is a renewal
    NotFirstActivation,
}

#[derive(Debug)]
pub struct ActivationRecord {
    pub user_id: String,
    pub referral: ReferralOutcome,
    pub revenue: RevenueLogEntry,
}

fn begin(conn: &mut Connection) -> Result<rusqlite::Transaction<'_>> {
    conn.transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(|e| {
            tracing::error!("Failed to start settlement transaction: {}", e);
            e.into()
        })
}

/// Records the order for a checkout charge with its commission split.
///
/// Fails without writing anything if the store, any product, or the vendor of
/// any split line is missing.
pub fn settle_order(
    conn: &mut Connection,
    charge: &OrderCharge,
    platform_vendor_id: &str,
    now: i64,
) -> Result<SettleOutcome<SettledOrder>> {
    let order_id = order_id_for_reference(&charge.reference);
    let tx = begin(conn)?;

    if queries::order_exists(&tx, &order_id)? {
        return Ok(SettleOutcome::AlreadyProcessed);
    }

    let store = queries::get_store_by_id(&tx, &charge.store_id)?
        .ok_or_else(|| AppError::not_found(msg::STORE_NOT_FOUND, &charge.store_id))?;

    let mut lines = Vec::with_capacity(charge.cart.len());
    for entry in &charge.cart {
        let product = queries::get_product_by_id(&tx, &entry.product_id)?
            .ok_or_else(|| AppError::not_found(msg::PRODUCT_NOT_FOUND, &entry.product_id))?;
        let mut line = SplitLine {
            product,
            vendor: None,
            quantity: entry.quantity,
        };
        if line.is_split(platform_vendor_id) {
            let vendor_id = &line.product.vendor_id;
            line.vendor = Some(
                queries::get_vendor_by_id(&tx, vendor_id)?
                    .ok_or_else(|| AppError::not_found(msg::VENDOR_NOT_FOUND, vendor_id))?,
            );
        }
        lines.push(line);
    }

    let plan = compute_split(
        &lines,
        charge.amount,
        platform_vendor_id,
        &store.owner_id,
        &order_id,
        charge.shipping_locality(),
    )?;

    let order = queries::create_order(
        &tx,
        &CreateOrder {
            id: order_id,
            store_id: store.id.clone(),
            customer_email: charge.customer_email.clone(),
            shipping_address: charge.shipping_address.clone(),
            payment_reference: charge.reference.clone(),
            total_amount: charge.amount,
            currency: charge.currency.clone(),
        },
        now,
    )?;

    let items = plan
        .items
        .iter()
        .map(|item| queries::create_order_item(&tx, &order.id, item))
        .collect::<Result<Vec<_>>>()?;

    let payouts = plan
        .payouts
        .iter()
        .map(|p| {
            queries::create_payout(&tx, p, Some(&order.id), &charge.reference, &charge.currency, now)
        })
        .collect::<Result<Vec<_>>>()?;

    let revenue = plan
        .revenue
        .iter()
        .map(|r| queries::create_revenue_log(&tx, r, &charge.reference, &charge.currency, now))
        .collect::<Result<Vec<_>>>()?;

    tx.commit()?;

    Ok(SettleOutcome::Committed(SettledOrder {
        order,
        items,
        payouts,
        revenue,
        store_profit: plan.store_profit,
    }))
}

/// Applies a plan activation: grants access, accrues the referrer's reward and
/// logs subscription revenue.
///
/// A reference that already has subscription revenue is a replay. A user who
/// already has access is renewing, which records revenue but never a reward.
pub fn activate_subscription(
    conn: &mut Connection,
    charge: &ActivationCharge,
    pricing: &PlanPricing,
    now: i64,
) -> Result<SettleOutcome<ActivationRecord>> {
    let tx = begin(conn)?;

    if queries::subscription_revenue_exists(&tx, &charge.reference)? {
        return Ok(SettleOutcome::AlreadyProcessed);
    }

    let user = queries::get_user_by_id(&tx, &charge.user_id)?
        .ok_or_else(|| AppError::not_found(msg::USER_NOT_FOUND, &charge.user_id))?;

    let referrer = match (&user.referred_by, user.has_access) {
        (Some(referrer_id), false) => Some((
            referrer_id.clone(),
            queries::get_user_by_id(&tx, referrer_id)?,
        )),
        _ => None,
    };

    if user.has_access {
        tracing::debug!(user_id = %user.id, "User already has access, recording renewal");
    } else {
        queries::grant_access(&tx, &user.id, &charge.plan_tier, charge.billing_interval, now)?;
    }

    let referral = match referrer {
        None if user.has_access => ReferralOutcome::NotFirstActivation,
        None => ReferralOutcome::NoReferrer,
        Some((referrer_id, None)) => {
            tracing::warn!(
                user_id = %user.id,
                referrer_id = %referrer_id,
                "Referrer record not found, skipping referral reward"
            );
            ReferralOutcome::ReferrerNotFound(referrer_id)
        }
        Some((referrer_id, Some(referrer))) if !referrer.has_access => {
            ReferralOutcome::ReferrerInactive(referrer_id)
        }
        Some((_, Some(referrer))) => {
            let rate = referral_commission_rate(referrer.active_referral_count);
            let amount = compute_referral_reward(
                pricing,
                &charge.plan_tier,
                charge.billing_interval,
                referrer.active_referral_count,
            );
            let payout = referral_payout(
                &referrer.id,
                &user.id,
                amount,
                &charge.plan_tier,
                charge.billing_interval,
                rate,
                now,
            );
            match payout {
                Some(payout) => {
                    let payout = queries::create_payout(
                        &tx,
                        &payout,
                        None,
                        &charge.reference,
                        &charge.currency,
                        now,
                    )?;
                    queries::increment_referral_counters(&tx, &referrer.id, amount)?;
                    ReferralOutcome::Rewarded(payout)
                }
                None => {
                    queries::increment_referral_counters(&tx, &referrer.id, 0.0)?;
                    ReferralOutcome::NothingOwed
                }
            }
        }
    };

    // Written even for a zero amount: this row is the activation's replay marker.
    let revenue = queries::create_revenue_log(
        &tx,
        &CreateRevenueLog {
            amount: charge.amount,
            revenue_type: RevenueType::Subscription,
            source_id: user.id.clone(),
        },
        &charge.reference,
        &charge.currency,
        now,
    )?;

    tx.commit()?;

    Ok(SettleOutcome::Committed(ActivationRecord {
        user_id: user.id,
        referral,
        revenue,
    }))
}
