//! Commission split for marketplace orders.
//!
//! Money is carried as `f64` currency units and never rounded here; rounding
//! to minor units is a presentation concern.

use crate::error::{AppError, Result, msg};
use crate::models::{
    CreateOrderItem, CreatePayout, CreateRevenueLog, PREMIUM_VENDOR_TIER, PayoutStatus,
    PayoutType, Product, RecipientKind, RevenueType, Vendor,
};

pub const STANDARD_COMMISSION_RATE: f64 = 0.09;
pub const PREMIUM_COMMISSION_RATE: f64 = 0.03;

/// Platform commission on a vendor's wholesale price. Exact tier match only.
pub fn commission_rate(vendor_plan_tier: &str) -> f64 {
    if vendor_plan_tier == PREMIUM_VENDOR_TIER {
        PREMIUM_COMMISSION_RATE
    } else {
        STANDARD_COMMISSION_RATE
    }
}

/// A cart line resolved against the catalog.
///
/// `vendor` is only required for lines that are split, i.e. managed products
/// not sold by the platform itself.
#[derive(Debug, Clone)]
pub struct SplitLine {
    pub product: Product,
    pub vendor: Option<Vendor>,
    pub quantity: i64,
}

impl SplitLine {
    pub fn is_split(&self, platform_vendor_id: &str) -> bool {
        self.product.is_managed && self.product.vendor_id != platform_vendor_id
    }
}

/// Every write an order settlement produces, before it is committed.
#[derive(Debug, Clone, Default)]
pub struct SplitPlan {
    pub items: Vec<CreateOrderItem>,
    pub payouts: Vec<CreatePayout>,
    pub revenue: Vec<CreateRevenueLog>,
    pub total_wholesale_cost: f64,
    pub store_profit: f64,
}

impl SplitPlan {
    pub fn vendor_payout_total(&self) -> f64 {
        self.payouts
            .iter()
            .filter(|p| p.payout_type == PayoutType::SaleCommission)
            .map(|p| p.amount)
            .sum()
    }

    pub fn platform_fee_total(&self) -> f64 {
        self.revenue.iter().map(|r| r.amount).sum()
    }
}

/// Computes vendor payouts, platform fees and the store owner's profit.
///
/// Lines that are not split still count toward the wholesale total. Profit is
/// taken once for the whole order as `amount_captured - total_wholesale_cost`
/// and only paid out when positive.
///
/// A split line without its vendor is an error: the fee and payout cannot be
/// computed without the vendor's tier.
pub fn compute_split(
    lines: &[SplitLine],
    amount_captured: f64,
    platform_vendor_id: &str,
    store_owner_id: &str,
    order_id: &str,
    shipping_locality: Option<&str>,
) -> Result<SplitPlan> {
    let mut plan = SplitPlan::default();

    for line in lines {
        let product = &line.product;
        let qty = line.quantity as f64;
        plan.total_wholesale_cost += product.wholesale_price * qty;

        plan.items.push(CreateOrderItem {
            product_id: product.id.clone(),
            product_name: product.name.clone(),
            vendor_id: product.vendor_id.clone(),
            quantity: line.quantity,
            retail_price: product.suggested_retail_price,
            wholesale_cost: product.wholesale_price,
        });

        if !line.is_split(platform_vendor_id) {
            continue;
        }
        let vendor = line
            .vendor
            .as_ref()
            .ok_or_else(|| AppError::not_found(msg::VENDOR_NOT_FOUND, &product.vendor_id))?;

        let rate = commission_rate(&vendor.plan_tier);
        let platform_fee = product.wholesale_price * rate * qty;
        let vendor_payout = (product.wholesale_price - product.wholesale_price * rate) * qty;

        if vendor_payout > 0.0 {
            plan.payouts.push(CreatePayout {
                recipient_id: vendor.id.clone(),
                recipient_kind: RecipientKind::Vendor,
                amount: vendor_payout,
                status: PayoutStatus::Pending,
                payout_type: PayoutType::SaleCommission,
                referred_user_id: None,
                metadata: Some(serde_json::json!({
                    "product_id": product.id,
                    "product_name": product.name,
                    "quantity": line.quantity,
                    "commission_rate": rate,
                    "shipping_locality": shipping_locality,
                })),
                matures_at: None,
            });
        }
        if platform_fee > 0.0 {
            plan.revenue.push(CreateRevenueLog {
                amount: platform_fee,
                revenue_type: RevenueType::Transaction,
                source_id: order_id.to_string(),
            });
        }
    }

    plan.store_profit = amount_captured - plan.total_wholesale_cost;
    if plan.store_profit > 0.0 {
        plan.payouts.push(CreatePayout {
            recipient_id: store_owner_id.to_string(),
            recipient_kind: RecipientKind::StoreOwner,
            amount: plan.store_profit,
            status: PayoutStatus::Pending,
            payout_type: PayoutType::StoreProfit,
            referred_user_id: None,
            metadata: Some(serde_json::json!({
                "item_count": lines.len(),
                "total_wholesale_cost": plan.total_wholesale_cost,
                "shipping_locality": shipping_locality,
            })),
            matures_at: None,
        });
    }

    Ok(plan)
}
