//! Row mapping trait and helpers for reducing boilerplate in queries.
//!
//! Models implement `FromRow` to define how they are built from a row, and
//! the `query_one` / `query_all` helpers take care of the rusqlite plumbing.

use rusqlite::{Connection, OptionalExtension, Row, ToSql};

use crate::models::*;

/// Parse a string column into an enum type, converting parse errors to rusqlite errors.
///
/// A corrupted or hand-edited value surfaces as a column type error instead
/// of a panic.
fn parse_enum<T: std::str::FromStr>(row: &Row, col: usize, col_name: &str) -> rusqlite::Result<T> {
    row.get::<_, String>(col)?.parse::<T>().map_err(|_| {
        rusqlite::Error::InvalidColumnType(col, col_name.to_string(), rusqlite::types::Type::Text)
    })
}

/// Parse an optional JSON text column.
fn parse_json(row: &Row, col: usize) -> rusqlite::Result<Option<serde_json::Value>> {
    row.get::<_, Option<String>>(col)?
        .map(|s| {
            serde_json::from_str(&s).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(col, rusqlite::types::Type::Text, Box::new(e))
            })
        })
        .transpose()
}

/// Trait for constructing a type from a database row.
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> rusqlite::Result<Self>;
}

/// Query for a single optional result.
pub fn query_one<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Option<T>> {
    conn.query_row(sql, params, T::from_row)
        .optional()
        .map_err(Into::into)
}

/// Query for multiple results.
pub fn query_all<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, T::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ============ SQL SELECT Constants ============

pub const VENDOR_COLS: &str = "id, name, email, plan_tier, created_at";

pub const PRODUCT_COLS: &str =
    "id, name, vendor_id, wholesale_price, suggested_retail_price, is_managed, created_at";

pub const STORE_COLS: &str = "id, owner_id, name, created_at";

pub const USER_COLS: &str = "id, email, name, has_access, access_granted_at, referred_by, plan_tier, billing_interval, active_referral_count, total_referral_earnings, created_at";

pub const ORDER_COLS: &str = "id, store_id, status, customer_email, shipping_address, payment_reference, total_amount, currency, created_at";

pub const ORDER_ITEM_COLS: &str =
    "id, order_id, product_id, product_name, vendor_id, quantity, retail_price, wholesale_cost";

pub const PAYOUT_COLS: &str = "id, recipient_id, recipient_kind, amount, currency, status, payout_type, order_id, payment_reference, referred_user_id, metadata, created_at, matures_at";

pub const REVENUE_COLS: &str =
    "id, amount, currency, revenue_type, payment_reference, source_id, created_at";

pub const WEBHOOK_LOG_COLS: &str = "id, event_type, payment_reference, payload, status, disposition, error_message, ip_address, user_agent, created_at";

pub const ALERT_COLS: &str =
    "id, payment_reference, event_type, error_message, resolved, created_at";

// ============ FromRow Implementations ============

impl FromRow for Vendor {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Vendor {
            id: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            plan_tier: row.get(3)?,
            created_at: row.get(4)?,
        })
    }
}

impl FromRow for Product {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Product {
            id: row.get(0)?,
            name: row.get(1)?,
            vendor_id: row.get(2)?,
            wholesale_price: row.get(3)?,
            suggested_retail_price: row.get(4)?,
            is_managed: row.get::<_, i32>(5)? != 0,
            created_at: row.get(6)?,
        })
    }
}

impl FromRow for Store {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Store {
            id: row.get(0)?,
            owner_id: row.get(1)?,
            name: row.get(2)?,
            created_at: row.get(3)?,
        })
    }
}

impl FromRow for User {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        // billing_interval is only set once a plan is activated
        let billing_interval: Option<BillingInterval> = row
            .get::<_, Option<String>>(7)?
            .and_then(|s| s.parse().ok());
        Ok(User {
            id: row.get(0)?,
            email: row.get(1)?,
            name: row.get(2)?,
            has_access: row.get::<_, i32>(3)? != 0,
            access_granted_at: row.get(4)?,
            referred_by: row.get(5)?,
            plan_tier: row.get(6)?,
            billing_interval,
            active_referral_count: row.get(8)?,
            total_referral_earnings: row.get(9)?,
            created_at: row.get(10)?,
        })
    }
}

impl FromRow for Order {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Order {
            id: row.get(0)?,
            store_id: row.get(1)?,
            status: parse_enum(row, 2, "status")?,
            customer_email: row.get(3)?,
            shipping_address: parse_json(row, 4)?,
            payment_reference: row.get(5)?,
            total_amount: row.get(6)?,
            currency: row.get(7)?,
            created_at: row.get(8)?,
        })
    }
}

impl FromRow for OrderItem {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(OrderItem {
            id: row.get(0)?,
            order_id: row.get(1)?,
            product_id: row.get(2)?,
            product_name: row.get(3)?,
            vendor_id: row.get(4)?,
            quantity: row.get(5)?,
            retail_price: row.get(6)?,
            wholesale_cost: row.get(7)?,
        })
    }
}

impl FromRow for PayoutPending {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(PayoutPending {
            id: row.get(0)?,
            recipient_id: row.get(1)?,
            recipient_kind: parse_enum(row, 2, "recipient_kind")?,
            amount: row.get(3)?,
            currency: row.get(4)?,
            status: parse_enum(row, 5, "status")?,
            payout_type: parse_enum(row, 6, "payout_type")?,
            order_id: row.get(7)?,
            payment_reference: row.get(8)?,
            referred_user_id: row.get(9)?,
            metadata: parse_json(row, 10)?,
            created_at: row.get(11)?,
            matures_at: row.get(12)?,
        })
    }
}

impl FromRow for RevenueLogEntry {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(RevenueLogEntry {
            id: row.get(0)?,
            amount: row.get(1)?,
            currency: row.get(2)?,
            revenue_type: parse_enum(row, 3, "revenue_type")?,
            payment_reference: row.get(4)?,
            source_id: row.get(5)?,
            created_at: row.get(6)?,
        })
    }
}

impl FromRow for WebhookLogEntry {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(WebhookLogEntry {
            id: row.get(0)?,
            event_type: row.get(1)?,
            payment_reference: row.get(2)?,
            payload: row.get(3)?,
            status: parse_enum(row, 4, "status")?,
            disposition: parse_enum(row, 5, "disposition")?,
            error_message: row.get(6)?,
            ip_address: row.get(7)?,
            user_agent: row.get(8)?,
            created_at: row.get(9)?,
        })
    }
}

impl FromRow for Alert {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Alert {
            id: row.get(0)?,
            payment_reference: row.get(1)?,
            event_type: row.get(2)?,
            error_message: row.get(3)?,
            resolved: row.get::<_, i32>(4)? != 0,
            created_at: row.get(5)?,
        })
    }
}
