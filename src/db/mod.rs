mod from_row;
mod schema;
pub mod queries;

pub use from_row::FromRow;
pub use schema::{init_audit_db, init_db};

use std::sync::Arc;
use std::time::Duration;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::notify::Notifier;
use crate::settlement::PlanPricing;

pub type DbPool = Pool<SqliteConnectionManager>;

/// How long a connection waits on a locked database before giving up.
/// Concurrent settlements of the same reference queue on this.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Application state holding database pools and configuration
#[derive(Clone)]
pub struct AppState {
    /// Main database pool (catalog, orders, payouts, revenue, alerts)
    pub db: DbPool,
    /// Webhook log pool (separate file to isolate growth)
    pub audit: DbPool,
    /// Shared HMAC secret; `None` makes every webhook a 500
    pub webhook_secret: Option<String>,
    /// Vendor id of the platform's own inventory
    pub platform_vendor_id: String,
    /// Currency used when a charge does not name one
    pub default_currency: String,
    pub plan_pricing: PlanPricing,
    pub webhook_log_enabled: bool,
    pub notifier: Arc<Notifier>,
}

pub fn create_pool(database_path: &str) -> Result<DbPool, r2d2::Error> {
    let manager = SqliteConnectionManager::file(database_path).with_init(|conn| {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")
    });
    Pool::builder().max_size(10).build(manager)
}
