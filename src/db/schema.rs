use rusqlite::Connection;

/// Initialize the main database schema (catalog, ledger, alerts)
pub fn init_db(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA foreign_keys = ON;

        -- Users (storefront accounts; referral counters live here)
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL,
            name TEXT NOT NULL,
            has_access INTEGER NOT NULL DEFAULT 0,
            access_granted_at INTEGER,
            referred_by TEXT,
            plan_tier TEXT,
            billing_interval TEXT CHECK (billing_interval IS NULL OR billing_interval IN ('monthly', 'yearly')),
            active_referral_count INTEGER NOT NULL DEFAULT 0,
            total_referral_earnings REAL NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_users_referred_by ON users(referred_by);

        -- Vendors (suppliers; plan_tier drives the platform commission rate)
        CREATE TABLE IF NOT EXISTS vendors (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT,
            plan_tier TEXT NOT NULL,
            created_at INTEGER NOT NULL
        );

        -- Products (prices in currency units, not minor units)
        CREATE TABLE IF NOT EXISTS products (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            vendor_id TEXT NOT NULL,
            wholesale_price REAL NOT NULL,
            suggested_retail_price REAL NOT NULL,
            is_managed INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_products_vendor ON products(vendor_id);

        -- Stores (storefronts; owner receives order profit)
        CREATE TABLE IF NOT EXISTS stores (
            id TEXT PRIMARY KEY,
            owner_id TEXT NOT NULL,
            name TEXT NOT NULL,
            created_at INTEGER NOT NULL
        );

        -- Orders (one per payment reference; id derived from the reference)
        CREATE TABLE IF NOT EXISTS orders (
            id TEXT PRIMARY KEY,
            store_id TEXT NOT NULL,
            status TEXT NOT NULL CHECK (status IN ('pending', 'fulfilled', 'cancelled')),
            customer_email TEXT,
            shipping_address TEXT,
            payment_reference TEXT NOT NULL UNIQUE,
            total_amount REAL NOT NULL,
            currency TEXT NOT NULL,
            created_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_orders_store ON orders(store_id);

        CREATE TABLE IF NOT EXISTS order_items (
            id TEXT PRIMARY KEY,
            order_id TEXT NOT NULL REFERENCES orders(id) ON DELETE CASCADE,
            product_id TEXT NOT NULL,
            product_name TEXT NOT NULL,
            vendor_id TEXT NOT NULL,
            quantity INTEGER NOT NULL CHECK (quantity > 0),
            retail_price REAL NOT NULL,
            wholesale_cost REAL NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_order_items_order ON order_items(order_id);

        -- Pending payouts (withdrawal queue; amounts always positive)
        CREATE TABLE IF NOT EXISTS payouts_pending (
            id TEXT PRIMARY KEY,
            recipient_id TEXT NOT NULL,
            recipient_kind TEXT NOT NULL CHECK (recipient_kind IN ('vendor', 'store_owner', 'referrer')),
            amount REAL NOT NULL CHECK (amount > 0),
            currency TEXT NOT NULL,
            status TEXT NOT NULL CHECK (status IN ('pending', 'pending_maturity')),
            payout_type TEXT NOT NULL CHECK (payout_type IN ('sale_commission', 'referral_reward', 'store_profit')),
            order_id TEXT REFERENCES orders(id),
            payment_reference TEXT NOT NULL,
            referred_user_id TEXT,
            metadata TEXT,
            created_at INTEGER NOT NULL,
            matures_at INTEGER
        );
        CREATE INDEX IF NOT EXISTS idx_payouts_recipient ON payouts_pending(recipient_id);
        CREATE INDEX IF NOT EXISTS idx_payouts_reference ON payouts_pending(payment_reference);
        CREATE INDEX IF NOT EXISTS idx_payouts_maturity ON payouts_pending(status, matures_at);

        -- Platform revenue (append-only)
        CREATE TABLE IF NOT EXISTS revenue_logs (
            id TEXT PRIMARY KEY,
            amount REAL NOT NULL,
            currency TEXT NOT NULL,
            revenue_type TEXT NOT NULL CHECK (revenue_type IN ('TRANSACTION', 'SUBSCRIPTION')),
            payment_reference TEXT NOT NULL,
            source_id TEXT NOT NULL,
            created_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_revenue_reference ON revenue_logs(payment_reference);

        -- Failed settlements awaiting manual remediation
        CREATE TABLE IF NOT EXISTS failed_transactions (
            id TEXT PRIMARY KEY,
            payment_reference TEXT NOT NULL,
            event_type TEXT NOT NULL,
            error_message TEXT NOT NULL,
            resolved INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_failed_transactions_open ON failed_transactions(resolved, created_at);
        "#,
    )?;
    Ok(())
}

/// Initialize the webhook log database schema (separate DB file)
/// Optimized for append-only workload with WAL mode
pub fn init_audit_db(conn: &Connection) -> rusqlite::Result<()> {
    // WAL mode: writes are sequential appends
    // synchronous=NORMAL: safe with WAL, faster than FULL
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA wal_autocheckpoint = 1000;
        PRAGMA journal_size_limit = 67108864;

        CREATE TABLE IF NOT EXISTS webhook_logs (
            id TEXT PRIMARY KEY,
            event_type TEXT NOT NULL,
            payment_reference TEXT,
            payload TEXT NOT NULL,
            status TEXT NOT NULL CHECK (status IN ('success', 'failed')),
            disposition TEXT NOT NULL,
            error_message TEXT,
            ip_address TEXT,
            user_agent TEXT,
            created_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_webhook_logs_created ON webhook_logs(created_at);
        CREATE INDEX IF NOT EXISTS idx_webhook_logs_reference ON webhook_logs(payment_reference);
        "#,
    )?;
    Ok(())
}
