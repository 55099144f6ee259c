//! Commission split tests

#[path = "../common/mod.rs"]
mod common;

use common::*;
use soma_settlement::settlement::{SplitLine, compute_split};

fn product(id: &str, vendor_id: &str, wholesale: f64, retail: f64, managed: bool) -> Product {
    Product {
        id: id.to_string(),
        name: format!("Product {}", id),
        vendor_id: vendor_id.to_string(),
        wholesale_price: wholesale,
        suggested_retail_price: retail,
        is_managed: managed,
        created_at: 0,
    }
}

fn vendor(id: &str, tier: &str) -> Vendor {
    Vendor {
        id: id.to_string(),
        name: id.to_string(),
        email: None,
        plan_tier: tier.to_string(),
        created_at: 0,
    }
}

fn managed_line(id: &str, vendor_id: &str, tier: &str, wholesale: f64, qty: i64) -> SplitLine {
    SplitLine {
        product: product(id, vendor_id, wholesale, wholesale * 1.8, true),
        vendor: Some(vendor(vendor_id, tier)),
        quantity: qty,
    }
}

#[test]
fn test_standard_vendor_split() {
    let lines = vec![SplitLine {
        product: product("p1", "v1", 100.0, 180.0, true),
        vendor: Some(vendor("v1", "STANDARD")),
        quantity: 2,
    }];

    let plan = compute_split(&lines, 360.0, PLATFORM_VENDOR, "owner1", "ord_1", Some("Lagos")).unwrap();

    assert_money(plan.vendor_payout_total(), 182.0);
    assert_money(plan.platform_fee_total(), 18.0);
    assert_money(plan.total_wholesale_cost, 200.0);
    assert_money(plan.store_profit, 160.0);

    let vendor_payout = &plan.payouts[0];
    assert_eq!(vendor_payout.recipient_id, "v1");
    assert_eq!(vendor_payout.recipient_kind, RecipientKind::Vendor);
    assert_eq!(vendor_payout.payout_type, PayoutType::SaleCommission);
    assert_eq!(vendor_payout.status, PayoutStatus::Pending);
    let metadata = vendor_payout.metadata.as_ref().unwrap();
    assert_eq!(metadata["quantity"], 2);
    assert_eq!(metadata["shipping_locality"], "Lagos");

    let profit = plan
        .payouts
        .iter()
        .find(|p| p.payout_type == PayoutType::StoreProfit)
        .expect("store profit payout");
    assert_eq!(profit.recipient_id, "owner1");
    assert_eq!(profit.recipient_kind, RecipientKind::StoreOwner);
    assert_money(profit.amount, 160.0);

    assert_eq!(plan.revenue.len(), 1);
    assert_eq!(plan.revenue[0].revenue_type, RevenueType::Transaction);
    assert_eq!(plan.revenue[0].source_id, "ord_1");
}

#[test]
fn test_premium_vendor_pays_three_percent() {
    let lines = vec![managed_line("p1", "v1", "PREMIUM", 50.0, 1)];
    let plan = compute_split(&lines, 90.0, PLATFORM_VENDOR, "owner1", "ord", None).unwrap();

    assert_money(plan.platform_fee_total(), 1.5);
    assert_money(plan.vendor_payout_total(), 48.5);
}

#[test]
fn test_unknown_tier_pays_standard_rate() {
    for tier in ["GOLD", "Premium", "PREMIUM ", ""] {
        let lines = vec![managed_line("p1", "v1", tier, 100.0, 1)];
        let plan = compute_split(&lines, 150.0, PLATFORM_VENDOR, "owner1", "ord", None).unwrap();
        assert_money(plan.platform_fee_total(), 9.0);
    }
}

#[test]
fn test_split_conserves_wholesale_per_line() {
    let lines = vec![
        managed_line("p1", "v1", "STANDARD", 19.99, 3),
        managed_line("p2", "v2", "PREMIUM", 7.35, 7),
        managed_line("p3", "v1", "STANDARD", 0.33, 11),
    ];
    let plan = compute_split(&lines, 200.0, PLATFORM_VENDOR, "owner1", "ord", None).unwrap();

    for (line, (payout, fee)) in lines
        .iter()
        .zip(plan.payouts.iter().zip(plan.revenue.iter()))
    {
        let expected = line.product.wholesale_price * line.quantity as f64;
        assert!((payout.amount + fee.amount - expected).abs() < 1e-9);
    }

    let expected_total = 19.99 * 3.0 + 7.35 * 7.0 + 0.33 * 11.0;
    assert!((plan.vendor_payout_total() + plan.platform_fee_total() - expected_total).abs() < 1e-9);
    assert!((plan.store_profit - (200.0 - expected_total)).abs() < 1e-9);
}

#[test]
fn test_private_inventory_counts_toward_wholesale_only() {
    let lines = vec![
        managed_line("p1", "v1", "STANDARD", 100.0, 1),
        SplitLine {
            product: product("p2", "v1", 20.0, 40.0, false),
            vendor: None,
            quantity: 2,
        },
    ];
    let plan = compute_split(&lines, 250.0, PLATFORM_VENDOR, "owner1", "ord", None).unwrap();

    assert_eq!(plan.items.len(), 2);
    assert_eq!(plan.revenue.len(), 1);
    assert_money(plan.total_wholesale_cost, 140.0);
    assert_money(plan.store_profit, 110.0);
    // one vendor payout + one store profit
    assert_eq!(plan.payouts.len(), 2);
}

#[test]
fn test_profit_is_computed_once_per_order() {
    let lines = vec![
        managed_line("p1", "v1", "STANDARD", 10.0, 1),
        managed_line("p2", "v2", "STANDARD", 10.0, 1),
        managed_line("p3", "v3", "STANDARD", 10.0, 1),
    ];
    let plan = compute_split(&lines, 45.0, PLATFORM_VENDOR, "owner1", "ord", None).unwrap();

    let profits: Vec<_> = plan
        .payouts
        .iter()
        .filter(|p| p.payout_type == PayoutType::StoreProfit)
        .collect();
    assert_eq!(profits.len(), 1);
    assert_money(profits[0].amount, 15.0);
}

#[test]
fn test_no_rounding_inside_split() {
    let lines = vec![managed_line("p1", "v1", "STANDARD", 0.01, 1)];
    let plan = compute_split(&lines, 1.0, PLATFORM_VENDOR, "owner1", "ord", None).unwrap();

    // 0.01 * 0.09 is kept as is, not rounded to a cent
    assert!(plan.platform_fee_total() > 0.0);
    assert!(plan.platform_fee_total() < 0.001);
}

#[test]
fn test_order_items_snapshot_catalog_prices() {
    let lines = vec![SplitLine {
        product: product("p1", "v1", 100.0, 180.0, true),
        vendor: Some(vendor("v1", "STANDARD")),
        quantity: 2,
    }];
    let plan = compute_split(&lines, 360.0, PLATFORM_VENDOR, "owner1", "ord", None).unwrap();

    let item = &plan.items[0];
    assert_eq!(item.product_id, "p1");
    assert_eq!(item.vendor_id, "v1");
    assert_eq!(item.quantity, 2);
    assert_money(item.retail_price, 180.0);
    assert_money(item.wholesale_cost, 100.0);
}
