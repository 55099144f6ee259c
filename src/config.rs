use std::env;

use crate::settlement::PlanPricing;

/// Vendor id that identifies the platform's own inventory. Lines sold by this
/// vendor are never split.
pub const DEFAULT_PLATFORM_VENDOR_ID: &str = "admin";

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: String,
    pub audit_database_path: String,
    /// Shared HMAC secret for inbound payment webhooks. Checked per request.
    pub webhook_secret: Option<String>,
    pub platform_vendor_id: String,
    pub default_currency: String,
    pub plan_pricing: PlanPricing,
    pub notify_webhook_url: Option<String>,
    pub webhook_log_enabled: bool,
    pub dev_mode: bool,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let dev_mode = env::var("SOMA_ENV")
            .map(|v| v == "dev" || v == "development")
            .unwrap_or(false);

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port: u16 = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        let plan_pricing = match env::var("PLAN_PRICES") {
            Ok(raw) => PlanPricing::parse(&raw).unwrap_or_else(|e| {
                tracing::warn!("Ignoring PLAN_PRICES ({}), using defaults", e);
                PlanPricing::default()
            }),
            Err(_) => PlanPricing::default(),
        };

        Self {
            host,
            port,
            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "soma.db".to_string()),
            audit_database_path: env::var("AUDIT_DATABASE_PATH")
                .unwrap_or_else(|_| "soma_audit.db".to_string()),
            webhook_secret: env::var("PAYSTACK_SECRET_KEY")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            platform_vendor_id: env::var("PLATFORM_VENDOR_ID")
                .unwrap_or_else(|_| DEFAULT_PLATFORM_VENDOR_ID.to_string()),
            default_currency: env::var("DEFAULT_CURRENCY")
                .unwrap_or_else(|_| "USD".to_string()),
            plan_pricing,
            notify_webhook_url: env::var("NOTIFY_WEBHOOK_URL")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            webhook_log_enabled: env::var("WEBHOOK_LOG_ENABLED")
                .map(|v| v != "0" && v.to_lowercase() != "false")
                .unwrap_or(true),
            dev_mode,
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Settings that leave the service running in a degraded way.
    pub fn startup_warnings(&self) -> Vec<&'static str> {
        let mut warnings = Vec::new();
        if self.webhook_secret.is_none() {
            warnings.push("PAYSTACK_SECRET_KEY is not set: payment webhooks will return 500");
        }
        if !self.webhook_log_enabled {
            warnings.push("WEBHOOK_LOG_ENABLED is off: deliveries will not be written to the webhook log");
        }
        warnings
    }
}
