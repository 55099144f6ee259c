use chrono::Utc;
use rusqlite::{Connection, params};

use crate::error::{AppError, Result, msg};
use crate::id::EntityType;
use crate::models::*;

use super::from_row::{
    ALERT_COLS, ORDER_COLS, ORDER_ITEM_COLS, PAYOUT_COLS, PRODUCT_COLS, REVENUE_COLS,
    STORE_COLS, USER_COLS, VENDOR_COLS, WEBHOOK_LOG_COLS, query_all, query_one,
};

fn now() -> i64 {
    Utc::now().timestamp()
}

fn json_text(value: &Option<serde_json::Value>) -> Option<String> {
    value.as_ref().map(|v| v.to_string())
}

// ============ Catalog ============

pub fn create_vendor(conn: &Connection, input: &CreateVendor) -> Result<Vendor> {
    let now = now();
    conn.execute(
        "INSERT INTO vendors (id, name, email, plan_tier, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![&input.id, &input.name, &input.email, &input.plan_tier, now],
    )?;
    Ok(Vendor {
        id: input.id.clone(),
        name: input.name.clone(),
        email: input.email.clone(),
        plan_tier: input.plan_tier.clone(),
        created_at: now,
    })
}

pub fn get_vendor_by_id(conn: &Connection, id: &str) -> Result<Option<Vendor>> {
    query_one(
        conn,
        &format!("SELECT {} FROM vendors WHERE id = ?1", VENDOR_COLS),
        &[&id],
    )
}

pub fn update_vendor_tier(conn: &Connection, id: &str, plan_tier: &str) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE vendors SET plan_tier = ?1 WHERE id = ?2",
        params![plan_tier, id],
    )?;
    Ok(affected > 0)
}

pub fn create_product(conn: &Connection, input: &CreateProduct) -> Result<Product> {
    input.validate()?;
    let now = now();
    conn.execute(
        "INSERT INTO products (id, name, vendor_id, wholesale_price, suggested_retail_price, is_managed, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            &input.id,
            &input.name,
            &input.vendor_id,
            input.wholesale_price,
            input.suggested_retail_price,
            input.is_managed as i32,
            now,
        ],
    )?;
    Ok(Product {
        id: input.id.clone(),
        name: input.name.clone(),
        vendor_id: input.vendor_id.clone(),
        wholesale_price: input.wholesale_price,
        suggested_retail_price: input.suggested_retail_price,
        is_managed: input.is_managed,
        created_at: now,
    })
}

pub fn get_product_by_id(conn: &Connection, id: &str) -> Result<Option<Product>> {
    query_one(
        conn,
        &format!("SELECT {} FROM products WHERE id = ?1", PRODUCT_COLS),
        &[&id],
    )
}

pub fn create_store(conn: &Connection, input: &CreateStore) -> Result<Store> {
    let now = now();
    conn.execute(
        "INSERT INTO stores (id, owner_id, name, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![&input.id, &input.owner_id, &input.name, now],
    )?;
    Ok(Store {
        id: input.id.clone(),
        owner_id: input.owner_id.clone(),
        name: input.name.clone(),
        created_at: now,
    })
}

pub fn get_store_by_id(conn: &Connection, id: &str) -> Result<Option<Store>> {
    query_one(
        conn,
        &format!("SELECT {} FROM stores WHERE id = ?1", STORE_COLS),
        &[&id],
    )
}

// ============ Users & referral counters ============

pub fn create_user(conn: &Connection, input: &CreateUser) -> Result<User> {
    let now = now();
    let access_granted_at = input.has_access.then_some(now);
    conn.execute(
        "INSERT INTO users (id, email, name, has_access, access_granted_at, referred_by, active_referral_count, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            &input.id,
            &input.email,
            &input.name,
            input.has_access as i32,
            access_granted_at,
            &input.referred_by,
            input.active_referral_count,
            now,
        ],
    )?;
    Ok(User {
        id: input.id.clone(),
        email: input.email.clone(),
        name: input.name.clone(),
        has_access: input.has_access,
        access_granted_at,
        referred_by: input.referred_by.clone(),
        plan_tier: None,
        billing_interval: None,
        active_referral_count: input.active_referral_count,
        total_referral_earnings: 0.0,
        created_at: now,
    })
}

pub fn get_user_by_id(conn: &Connection, id: &str) -> Result<Option<User>> {
    query_one(
        conn,
        &format!("SELECT {} FROM users WHERE id = ?1", USER_COLS),
        &[&id],
    )
}

/// Marks a user as paid. Returns false if the user already had access, which
/// callers treat as a replayed activation.
pub fn grant_access(
    conn: &Connection,
    user_id: &str,
    plan_tier: &str,
    interval: BillingInterval,
    granted_at: i64,
) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE users SET has_access = 1, access_granted_at = ?1, plan_tier = ?2, billing_interval = ?3
         WHERE id = ?4 AND has_access = 0",
        params![granted_at, plan_tier, interval.as_ref(), user_id],
    )?;
    Ok(affected > 0)
}

/// Counts one activated referral and adds its reward to lifetime earnings.
pub fn increment_referral_counters(conn: &Connection, referrer_id: &str, reward: f64) -> Result<()> {
    let affected = conn.execute(
        "UPDATE users SET active_referral_count = active_referral_count + 1,
                          total_referral_earnings = total_referral_earnings + ?1
         WHERE id = ?2",
        params![reward, referrer_id],
    )?;
    if affected == 0 {
        return Err(AppError::not_found(msg::USER_NOT_FOUND, referrer_id));
    }
    Ok(())
}

// ============ Orders ============

pub fn order_exists(conn: &Connection, order_id: &str) -> Result<bool> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM orders WHERE id = ?1)",
        params![order_id],
        |row| row.get(0),
    )?;
    Ok(exists)
}

pub fn create_order(conn: &Connection, input: &CreateOrder, created_at: i64) -> Result<Order> {
    conn.execute(
        "INSERT INTO orders (id, store_id, status, customer_email, shipping_address, payment_reference, total_amount, currency, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            &input.id,
            &input.store_id,
            OrderStatus::Pending.as_ref(),
            &input.customer_email,
            json_text(&input.shipping_address),
            &input.payment_reference,
            input.total_amount,
            &input.currency,
            created_at,
        ],
    )?;
    Ok(Order {
        id: input.id.clone(),
        store_id: input.store_id.clone(),
        status: OrderStatus::Pending,
        customer_email: input.customer_email.clone(),
        shipping_address: input.shipping_address.clone(),
        payment_reference: input.payment_reference.clone(),
        total_amount: input.total_amount,
        currency: input.currency.clone(),
        created_at,
    })
}

pub fn get_order_by_id(conn: &Connection, id: &str) -> Result<Option<Order>> {
    query_one(
        conn,
        &format!("SELECT {} FROM orders WHERE id = ?1", ORDER_COLS),
        &[&id],
    )
}

pub fn get_order_by_reference(conn: &Connection, reference: &str) -> Result<Option<Order>> {
    query_one(
        conn,
        &format!("SELECT {} FROM orders WHERE payment_reference = ?1", ORDER_COLS),
        &[&reference],
    )
}

pub fn count_orders(conn: &Connection) -> Result<i64> {
    Ok(conn.query_row("SELECT COUNT(*) FROM orders", [], |row| row.get(0))?)
}

pub fn create_order_item(conn: &Connection, order_id: &str, input: &CreateOrderItem) -> Result<OrderItem> {
    let id = EntityType::OrderItem.gen_id();
    conn.execute(
        "INSERT INTO order_items (id, order_id, product_id, product_name, vendor_id, quantity, retail_price, wholesale_cost)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            &id,
            order_id,
            &input.product_id,
            &input.product_name,
            &input.vendor_id,
            input.quantity,
            input.retail_price,
            input.wholesale_cost,
        ],
    )?;
    Ok(OrderItem {
        id,
        order_id: order_id.to_string(),
        product_id: input.product_id.clone(),
        product_name: input.product_name.clone(),
        vendor_id: input.vendor_id.clone(),
        quantity: input.quantity,
        retail_price: input.retail_price,
        wholesale_cost: input.wholesale_cost,
    })
}

pub fn list_order_items(conn: &Connection, order_id: &str) -> Result<Vec<OrderItem>> {
    query_all(
        conn,
        &format!("SELECT {} FROM order_items WHERE order_id = ?1 ORDER BY rowid", ORDER_ITEM_COLS),
        &[&order_id],
    )
}

// ============ Payouts ============

/// Records a payout. Non-positive amounts are rejected here as well as by the
/// table constraint, so a bad split never reaches the withdrawal queue.
pub fn create_payout(
    conn: &Connection,
    input: &CreatePayout,
    order_id: Option<&str>,
    payment_reference: &str,
    currency: &str,
    created_at: i64,
) -> Result<PayoutPending> {
    if input.amount.is_nan() || input.amount <= 0.0 {
        return Err(AppError::Internal(format!(
            "Refusing non-positive payout of {} to {}",
            input.amount, input.recipient_id
        )));
    }
    let id = EntityType::Payout.gen_id();
    conn.execute(
        "INSERT INTO payouts_pending (id, recipient_id, recipient_kind, amount, currency, status, payout_type, order_id, payment_reference, referred_user_id, metadata, created_at, matures_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            &id,
            &input.recipient_id,
            input.recipient_kind.as_ref(),
            input.amount,
            currency,
            input.status.as_ref(),
            input.payout_type.as_ref(),
            order_id,
            payment_reference,
            &input.referred_user_id,
            json_text(&input.metadata),
            created_at,
            input.matures_at,
        ],
    )?;
    Ok(PayoutPending {
        id,
        recipient_id: input.recipient_id.clone(),
        recipient_kind: input.recipient_kind,
        amount: input.amount,
        currency: currency.to_string(),
        status: input.status,
        payout_type: input.payout_type,
        order_id: order_id.map(str::to_string),
        payment_reference: payment_reference.to_string(),
        referred_user_id: input.referred_user_id.clone(),
        metadata: input.metadata.clone(),
        created_at,
        matures_at: input.matures_at,
    })
}

pub fn list_payouts_for_reference(conn: &Connection, payment_reference: &str) -> Result<Vec<PayoutPending>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM payouts_pending WHERE payment_reference = ?1 ORDER BY rowid",
            PAYOUT_COLS
        ),
        &[&payment_reference],
    )
}

pub fn list_payouts_for_recipient(conn: &Connection, recipient_id: &str) -> Result<Vec<PayoutPending>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM payouts_pending WHERE recipient_id = ?1 ORDER BY created_at, rowid",
            PAYOUT_COLS
        ),
        &[&recipient_id],
    )
}

/// Held referral rewards whose maturity time has passed. This is the work
/// list of the external sweep that promotes them to `pending`.
pub fn list_matured_referral_rewards(conn: &Connection, as_of: i64) -> Result<Vec<PayoutPending>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM payouts_pending
             WHERE status = ?1 AND payout_type = ?2 AND matures_at <= ?3
             ORDER BY matures_at, rowid",
            PAYOUT_COLS
        ),
        &[
            &PayoutStatus::PendingMaturity.as_ref(),
            &PayoutType::ReferralReward.as_ref(),
            &as_of,
        ],
    )
}

// ============ Revenue ============

pub fn create_revenue_log(
    conn: &Connection,
    input: &CreateRevenueLog,
    payment_reference: &str,
    currency: &str,
    created_at: i64,
) -> Result<RevenueLogEntry> {
    let id = EntityType::RevenueLog.gen_id();
    conn.execute(
        "INSERT INTO revenue_logs (id, amount, currency, revenue_type, payment_reference, source_id, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            &id,
            input.amount,
            currency,
            input.revenue_type.as_ref(),
            payment_reference,
            &input.source_id,
            created_at,
        ],
    )?;
    Ok(RevenueLogEntry {
        id,
        amount: input.amount,
        currency: currency.to_string(),
        revenue_type: input.revenue_type,
        payment_reference: payment_reference.to_string(),
        source_id: input.source_id.clone(),
        created_at,
    })
}

/// True once a subscription charge with this reference has been recorded.
pub fn subscription_revenue_exists(conn: &Connection, payment_reference: &str) -> Result<bool> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM revenue_logs WHERE payment_reference = ?1 AND revenue_type = ?2)",
        params![payment_reference, RevenueType::Subscription.as_ref()],
        |row| row.get(0),
    )?;
    Ok(exists)
}

pub fn list_revenue_for_reference(conn: &Connection, payment_reference: &str) -> Result<Vec<RevenueLogEntry>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM revenue_logs WHERE payment_reference = ?1 ORDER BY rowid",
            REVENUE_COLS
        ),
        &[&payment_reference],
    )
}

// ============ Webhook logs (audit DB) ============

pub fn create_webhook_log(conn: &Connection, input: &CreateWebhookLog) -> Result<WebhookLogEntry> {
    let id = EntityType::WebhookLog.gen_id();
    let created_at = now();
    let status = input.disposition.status();
    conn.execute(
        "INSERT INTO webhook_logs (id, event_type, payment_reference, payload, status, disposition, error_message, ip_address, user_agent, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            &id,
            &input.event_type,
            &input.payment_reference,
            &input.payload,
            status.as_ref(),
            input.disposition.as_ref(),
            &input.error_message,
            &input.ip_address,
            &input.user_agent,
            created_at,
        ],
    )?;
    Ok(WebhookLogEntry {
        id,
        event_type: input.event_type.clone(),
        payment_reference: input.payment_reference.clone(),
        payload: input.payload.clone(),
        status,
        disposition: input.disposition,
        error_message: input.error_message.clone(),
        ip_address: input.ip_address.clone(),
        user_agent: input.user_agent.clone(),
        created_at,
    })
}

pub fn list_webhook_logs_for_reference(conn: &Connection, payment_reference: &str) -> Result<Vec<WebhookLogEntry>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM webhook_logs WHERE payment_reference = ?1 ORDER BY created_at, rowid",
            WEBHOOK_LOG_COLS
        ),
        &[&payment_reference],
    )
}

pub fn list_recent_webhook_logs(conn: &Connection, limit: i64) -> Result<Vec<WebhookLogEntry>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM webhook_logs ORDER BY created_at DESC, rowid DESC LIMIT ?1",
            WEBHOOK_LOG_COLS
        ),
        &[&limit],
    )
}

pub fn count_webhook_logs(conn: &Connection) -> Result<i64> {
    Ok(conn.query_row("SELECT COUNT(*) FROM webhook_logs", [], |row| row.get(0))?)
}

// ============ Alerts ============

pub fn create_alert(
    conn: &Connection,
    payment_reference: &str,
    event_type: &str,
    error_message: &str,
) -> Result<Alert> {
    let id = EntityType::Alert.gen_id();
    let created_at = now();
    conn.execute(
        "INSERT INTO failed_transactions (id, payment_reference, event_type, error_message, resolved, created_at)
         VALUES (?1, ?2, ?3, ?4, 0, ?5)",
        params![&id, payment_reference, event_type, error_message, created_at],
    )?;
    Ok(Alert {
        id,
        payment_reference: payment_reference.to_string(),
        event_type: event_type.to_string(),
        error_message: error_message.to_string(),
        resolved: false,
        created_at,
    })
}

pub fn list_unresolved_alerts(conn: &Connection) -> Result<Vec<Alert>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM failed_transactions WHERE resolved = 0 ORDER BY created_at, rowid",
            ALERT_COLS
        ),
        &[],
    )
}

/// Marks an alert handled. Errors if the id is unknown.
pub fn resolve_alert(conn: &Connection, id: &str) -> Result<()> {
    let affected = conn.execute(
        "UPDATE failed_transactions SET resolved = 1 WHERE id = ?1",
        params![id],
    )?;
    if affected == 0 {
        return Err(AppError::not_found(msg::ALERT_NOT_FOUND, id));
    }
    Ok(())
}
