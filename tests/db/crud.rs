//! Database CRUD tests for catalog and users

#[path = "../common/mod.rs"]
mod common;

use common::*;

#[test]
fn test_vendor_roundtrip() {
    let conn = setup_test_db();
    create_test_vendor(&conn, "v1", "PREMIUM");

    let vendor = queries::get_vendor_by_id(&conn, "v1").unwrap().unwrap();
    assert_eq!(vendor.plan_tier, "PREMIUM");
    assert_eq!(vendor.email.as_deref(), Some("v1@vendors.test"));
    assert!(queries::get_vendor_by_id(&conn, "v2").unwrap().is_none());
}

#[test]
fn test_update_vendor_tier() {
    let conn = setup_test_db();
    create_test_vendor(&conn, "v1", "STANDARD");

    assert!(queries::update_vendor_tier(&conn, "v1", "PREMIUM").unwrap());
    assert!(!queries::update_vendor_tier(&conn, "missing", "PREMIUM").unwrap());
    assert_eq!(
        queries::get_vendor_by_id(&conn, "v1").unwrap().unwrap().plan_tier,
        "PREMIUM"
    );
}

#[test]
fn test_product_roundtrip() {
    let conn = setup_test_db();
    create_test_product(&conn, "p1", "v1", 12.5, 30.0, true);
    create_test_product(&conn, "p2", "v1", 4.0, 9.0, false);

    let p1 = queries::get_product_by_id(&conn, "p1").unwrap().unwrap();
    assert!(p1.is_managed);
    assert_money(p1.wholesale_price, 12.5);
    assert_money(p1.suggested_retail_price, 30.0);

    let p2 = queries::get_product_by_id(&conn, "p2").unwrap().unwrap();
    assert!(!p2.is_managed);
}

#[test]
fn test_product_validation() {
    let conn = setup_test_db();
    let result = queries::create_product(
        &conn,
        &CreateProduct {
            id: "bad".into(),
            name: "Bad".into(),
            vendor_id: "v1".into(),
            wholesale_price: -1.0,
            suggested_retail_price: 10.0,
            is_managed: true,
        },
    );
    assert!(result.is_err());
    assert!(queries::get_product_by_id(&conn, "bad").unwrap().is_none());
}

#[test]
fn test_store_roundtrip() {
    let conn = setup_test_db();
    create_test_store(&conn, "s1", "owner1");

    let store = queries::get_store_by_id(&conn, "s1").unwrap().unwrap();
    assert_eq!(store.owner_id, "owner1");
}

#[test]
fn test_user_defaults() {
    let conn = setup_test_db();
    create_test_user(&conn, "u1", Some("r1"), false, 0);

    let user = queries::get_user_by_id(&conn, "u1").unwrap().unwrap();
    assert!(!user.has_access);
    assert!(user.access_granted_at.is_none());
    assert_eq!(user.referred_by.as_deref(), Some("r1"));
    assert!(user.billing_interval.is_none());
    assert_eq!(user.active_referral_count, 0);
    assert_money(user.total_referral_earnings, 0.0);
}

#[test]
fn test_grant_access_only_once() {
    let conn = setup_test_db();
    create_test_user(&conn, "u1", None, false, 0);

    assert!(queries::grant_access(&conn, "u1", "MERCHANT", BillingInterval::Yearly, 100).unwrap());
    assert!(!queries::grant_access(&conn, "u1", "SUPPLIER", BillingInterval::Monthly, 200).unwrap());

    let user = queries::get_user_by_id(&conn, "u1").unwrap().unwrap();
    assert_eq!(user.access_granted_at, Some(100));
    assert_eq!(user.plan_tier.as_deref(), Some("MERCHANT"));
    assert_eq!(user.billing_interval, Some(BillingInterval::Yearly));
}

#[test]
fn test_increment_referral_counters() {
    let conn = setup_test_db();
    create_test_user(&conn, "r1", None, true, 2);

    queries::increment_referral_counters(&conn, "r1", 1.5).unwrap();
    queries::increment_referral_counters(&conn, "r1", 0.25).unwrap();

    let referrer = queries::get_user_by_id(&conn, "r1").unwrap().unwrap();
    assert_eq!(referrer.active_referral_count, 4);
    assert_money(referrer.total_referral_earnings, 1.75);

    assert!(queries::increment_referral_counters(&conn, "missing", 1.0).is_err());
}

#[test]
fn test_order_reference_is_unique() {
    let conn = setup_test_db();
    let order = CreateOrder {
        id: "sm_ord_a".into(),
        store_id: "s1".into(),
        customer_email: None,
        shipping_address: None,
        payment_reference: "ref_dup".into(),
        total_amount: 10.0,
        currency: "USD".into(),
    };
    queries::create_order(&conn, &order, 1).unwrap();

    let clash = CreateOrder {
        id: "sm_ord_b".into(),
        ..order
    };
    assert!(queries::create_order(&conn, &clash, 2).is_err());
    assert_eq!(queries::count_orders(&conn).unwrap(), 1);
    assert!(queries::order_exists(&conn, "sm_ord_a").unwrap());
    assert!(!queries::order_exists(&conn, "sm_ord_b").unwrap());
}
