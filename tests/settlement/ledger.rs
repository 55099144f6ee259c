//! Ledger writer tests - atomicity and idempotency of order settlement

#[path = "../common/mod.rs"]
mod common;

use common::*;
use soma_settlement::error::AppError;
use soma_settlement::id::order_id_for_reference;
use soma_settlement::settlement::{SettleOutcome, activate_subscription, settle_order};

const NOW: i64 = 1_750_000_000;

fn count(conn: &rusqlite::Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))
        .unwrap()
}

#[test]
fn test_settle_order_writes_everything() {
    let mut conn = setup_test_db();
    seed_marketplace(&conn);

    let charge = order_charge("ref_order_1", 360.0, "s1", &[("p1", 2)]);
    let SettleOutcome::Committed(settled) = settle_order(&mut conn, &charge, PLATFORM_VENDOR, NOW).unwrap() else {
        panic!("expected commit");
    };

    assert_eq!(settled.order.id, order_id_for_reference("ref_order_1"));
    assert_eq!(settled.order.status, OrderStatus::Pending);
    assert_money(settled.store_profit, 160.0);

    let order = queries::get_order_by_reference(&conn, "ref_order_1").unwrap().unwrap();
    assert_eq!(order.id, settled.order.id);
    assert_money(order.total_amount, 360.0);
    assert_eq!(order.customer_email.as_deref(), Some("buyer@example.com"));
    assert_eq!(order.shipping_address.unwrap()["city"], "Lagos");

    let by_id = queries::get_order_by_id(&conn, &order_id_for_reference("ref_order_1")).unwrap();
    assert_eq!(by_id.unwrap().payment_reference, "ref_order_1");

    let items = queries::list_order_items(&conn, &order.id).unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].quantity, 2);

    let payouts = queries::list_payouts_for_reference(&conn, "ref_order_1").unwrap();
    assert_eq!(payouts.len(), 2);
    let vendor = payouts.iter().find(|p| p.recipient_id == "v1").unwrap();
    assert_money(vendor.amount, 182.0);
    assert_eq!(vendor.order_id.as_deref(), Some(order.id.as_str()));
    assert_eq!(vendor.currency, "USD");
    let owner = payouts.iter().find(|p| p.recipient_id == "owner1").unwrap();
    assert_money(owner.amount, 160.0);
    assert_eq!(owner.payout_type, PayoutType::StoreProfit);

    let revenue = queries::list_revenue_for_reference(&conn, "ref_order_1").unwrap();
    assert_eq!(revenue.len(), 1);
    assert_money(revenue[0].amount, 18.0);
    assert_eq!(revenue[0].source_id, order.id);
}

#[test]
fn test_replayed_order_is_noop() {
    let mut conn = setup_test_db();
    seed_marketplace(&conn);
    let charge = order_charge("ref_replay", 360.0, "s1", &[("p1", 2)]);

    assert!(matches!(
        settle_order(&mut conn, &charge, PLATFORM_VENDOR, NOW).unwrap(),
        SettleOutcome::Committed(_)
    ));
    for _ in 0..3 {
        assert!(matches!(
            settle_order(&mut conn, &charge, PLATFORM_VENDOR, NOW).unwrap(),
            SettleOutcome::AlreadyProcessed
        ));
    }

    assert_eq!(count(&conn, "orders"), 1);
    assert_eq!(count(&conn, "order_items"), 1);
    assert_eq!(count(&conn, "payouts_pending"), 2);
    assert_eq!(count(&conn, "revenue_logs"), 1);
}

#[test]
fn test_missing_product_aborts_whole_order() {
    let mut conn = setup_test_db();
    seed_marketplace(&conn);

    let charge = order_charge("ref_partial", 500.0, "s1", &[("p1", 1), ("nope", 1)]);
    let err = settle_order(&mut conn, &charge, PLATFORM_VENDOR, NOW).unwrap_err();
    assert!(matches!(err, AppError::NotFound(ref m) if m.contains("nope")));

    assert_eq!(count(&conn, "orders"), 0);
    assert_eq!(count(&conn, "order_items"), 0);
    assert_eq!(count(&conn, "payouts_pending"), 0);
    assert_eq!(count(&conn, "revenue_logs"), 0);
}

#[test]
fn test_missing_vendor_aborts() {
    let mut conn = setup_test_db();
    seed_marketplace(&conn);
    create_test_product(&conn, "orphan", "v_missing", 10.0, 20.0, true);

    let charge = order_charge("ref_orphan", 100.0, "s1", &[("p1", 1), ("orphan", 1)]);
    let err = settle_order(&mut conn, &charge, PLATFORM_VENDOR, NOW).unwrap_err();
    assert!(matches!(err, AppError::NotFound(ref m) if m.contains("v_missing")));
    assert_eq!(count(&conn, "orders"), 0);
    assert_eq!(count(&conn, "payouts_pending"), 0);
}

#[test]
fn test_missing_store_aborts() {
    let mut conn = setup_test_db();
    seed_marketplace(&conn);

    let charge = order_charge("ref_nostore", 100.0, "s_missing", &[("p1", 1)]);
    assert!(settle_order(&mut conn, &charge, PLATFORM_VENDOR, NOW).is_err());
    assert_eq!(count(&conn, "orders"), 0);
}

#[test]
fn test_private_inventory_vendor_not_required() {
    let mut conn = setup_test_db();
    seed_marketplace(&conn);
    create_test_product(&conn, "private", "v_missing", 10.0, 20.0, false);

    let charge = order_charge("ref_private", 30.0, "s1", &[("private", 2)]);
    let SettleOutcome::Committed(settled) = settle_order(&mut conn, &charge, PLATFORM_VENDOR, NOW).unwrap() else {
        panic!("expected commit");
    };
    assert!(settled.revenue.is_empty());
    assert_eq!(settled.payouts.len(), 1);
    assert_money(settled.payouts[0].amount, 10.0);
}

#[test]
fn test_platform_products_are_not_split() {
    let mut conn = setup_test_db();
    seed_marketplace(&conn);
    create_test_product(&conn, "mug", PLATFORM_VENDOR, 8.0, 15.0, true);

    let charge = order_charge("ref_mug", 15.0, "s1", &[("mug", 1)]);
    let SettleOutcome::Committed(settled) = settle_order(&mut conn, &charge, PLATFORM_VENDOR, NOW).unwrap() else {
        panic!("expected commit");
    };
    assert!(settled.revenue.is_empty());
    assert!(settled
        .payouts
        .iter()
        .all(|p| p.payout_type == PayoutType::StoreProfit));
}

#[test]
fn test_loss_making_order_has_no_profit_payout() {
    let mut conn = setup_test_db();
    seed_marketplace(&conn);

    let charge = order_charge("ref_loss", 150.0, "s1", &[("p1", 2)]);
    let SettleOutcome::Committed(settled) = settle_order(&mut conn, &charge, PLATFORM_VENDOR, NOW).unwrap() else {
        panic!("expected commit");
    };
    assert!(settled.store_profit < 0.0);
    assert_eq!(settled.payouts.len(), 1);
    assert_eq!(settled.payouts[0].payout_type, PayoutType::SaleCommission);
}

#[test]
fn test_vendor_tier_read_at_settlement_time() {
    let mut conn = setup_test_db();
    seed_marketplace(&conn);
    queries::update_vendor_tier(&conn, "v1", "PREMIUM").unwrap();

    let charge = order_charge("ref_tier", 360.0, "s1", &[("p1", 2)]);
    settle_order(&mut conn, &charge, PLATFORM_VENDOR, NOW).unwrap();

    let revenue = queries::list_revenue_for_reference(&conn, "ref_tier").unwrap();
    assert_money(revenue[0].amount, 6.0);
}

#[test]
fn test_replayed_activation_is_noop() {
    let mut conn = setup_test_db();
    seed_referral(&conn, true, 0);
    let charge = activation_charge("ref_act", 19.99, "u1", "MERCHANT", BillingInterval::Monthly);

    assert!(matches!(
        activate_subscription(&mut conn, &charge, &PlanPricing::default(), NOW).unwrap(),
        SettleOutcome::Committed(_)
    ));
    assert!(matches!(
        activate_subscription(&mut conn, &charge, &PlanPricing::default(), NOW).unwrap(),
        SettleOutcome::AlreadyProcessed
    ));

    let referrer = queries::get_user_by_id(&conn, "r1").unwrap().unwrap();
    assert_eq!(referrer.active_referral_count, 1);
    assert_eq!(count(&conn, "payouts_pending"), 1);
    assert_eq!(count(&conn, "revenue_logs"), 1);
}

#[test]
fn test_missing_user_aborts_activation() {
    let mut conn = setup_test_db();
    let charge = activation_charge("ref_nouser", 19.99, "ghost", "MERCHANT", BillingInterval::Monthly);

    let err = activate_subscription(&mut conn, &charge, &PlanPricing::default(), NOW).unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    assert_eq!(count(&conn, "revenue_logs"), 0);
}

#[test]
fn test_concurrent_duplicates_settle_once() {
    let app = TestApp::new();
    seed_marketplace(&app.conn());

    let charge = order_charge("ref_race", 360.0, "s1", &[("p1", 2)]);
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let pool = app.state.db.clone();
            let charge = charge.clone();
            std::thread::spawn(move || {
                let mut conn = pool.get().unwrap();
                settle_order(&mut conn, &charge, PLATFORM_VENDOR, NOW).unwrap()
            })
        })
        .collect();

    let committed = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|outcome| matches!(outcome, SettleOutcome::Committed(_)))
        .count();
    assert_eq!(committed, 1);

    let conn = app.conn();
    assert_eq!(count(&conn, "orders"), 1);
    assert_eq!(count(&conn, "payouts_pending"), 2);
    assert_eq!(count(&conn, "revenue_logs"), 1);
}
