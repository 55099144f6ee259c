use clap::Parser;
use reqwest::Client;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use std::sync::Arc;

use soma_settlement::config::Config;
use soma_settlement::db::{AppState, create_pool, init_audit_db, init_db, queries};
use soma_settlement::error::Result;
use soma_settlement::handlers;
use soma_settlement::models::{
    CreateProduct, CreateStore, CreateUser, CreateVendor, PREMIUM_VENDOR_TIER,
};
use soma_settlement::notify::Notifier;

#[derive(Parser, Debug)]
#[command(name = "soma-settlement")]
#[command(about = "Payment settlement and commission ledger for the Soma marketplace")]
struct Cli {
    /// Seed the database with dev data (vendors, products, a store, referral users)
    #[arg(long)]
    seed: bool,

    /// Delete databases on exit (dev mode only, useful for fresh starts)
    #[arg(long)]
    ephemeral: bool,
}

fn seed_dev_data(state: &AppState) -> Result<()> {
    let conn = state.db.get()?;

    if queries::get_store_by_id(&conn, "store_dev")?.is_some() {
        tracing::info!("Database already has data, skipping seed");
        return Ok(());
    }

    tracing::info!("============================================");
    tracing::info!("SEEDING DEV DATA");
    tracing::info!("============================================");

    queries::create_vendor(
        &conn,
        &CreateVendor {
            id: state.platform_vendor_id.clone(),
            name: "Soma Platform".into(),
            email: None,
            plan_tier: PREMIUM_VENDOR_TIER.into(),
        },
    )?;
    queries::create_vendor(
        &conn,
        &CreateVendor {
            id: "vendor_dev_standard".into(),
            name: "Dev Supplier (standard)".into(),
            email: Some("supplier@soma.local".into()),
            plan_tier: "STANDARD".into(),
        },
    )?;
    queries::create_vendor(
        &conn,
        &CreateVendor {
            id: "vendor_dev_premium".into(),
            name: "Dev Supplier (premium)".into(),
            email: Some("premium@soma.local".into()),
            plan_tier: PREMIUM_VENDOR_TIER.into(),
        },
    )?;

    let products = [
        ("prod_dev_managed", "Managed Tee", "vendor_dev_standard", 100.0, 180.0, true),
        ("prod_dev_premium", "Premium Hoodie", "vendor_dev_premium", 40.0, 75.0, true),
        ("prod_dev_platform", "Platform Mug", state.platform_vendor_id.as_str(), 8.0, 15.0, true),
        ("prod_dev_private", "Private Stock Cap", "vendor_dev_standard", 12.0, 25.0, false),
    ];
    for (id, name, vendor_id, wholesale, retail, managed) in products {
        queries::create_product(
            &conn,
            &CreateProduct {
                id: id.into(),
                name: name.into(),
                vendor_id: vendor_id.into(),
                wholesale_price: wholesale,
                suggested_retail_price: retail,
                is_managed: managed,
            },
        )?;
    }

    queries::create_user(
        &conn,
        &CreateUser {
            id: "user_dev_owner".into(),
            email: "owner@soma.local".into(),
            name: "Dev Store Owner".into(),
            referred_by: None,
            has_access: true,
            active_referral_count: 0,
        },
    )?;
    queries::create_store(
        &conn,
        &CreateStore {
            id: "store_dev".into(),
            owner_id: "user_dev_owner".into(),
            name: "Dev Store".into(),
        },
    )?;
    queries::create_user(
        &conn,
        &CreateUser {
            id: "user_dev_referrer".into(),
            email: "ambassador@soma.local".into(),
            name: "Dev Ambassador".into(),
            referred_by: None,
            has_access: true,
            active_referral_count: 20,
        },
    )?;
    queries::create_user(
        &conn,
        &CreateUser {
            id: "user_dev_referred".into(),
            email: "newseller@soma.local".into(),
            name: "Dev Referred Seller".into(),
            referred_by: Some("user_dev_referrer".into()),
            has_access: false,
            active_referral_count: 0,
        },
    )?;

    tracing::info!("Seeded store 'store_dev' with 4 products");
    tracing::info!("Seeded referrer 'user_dev_referrer' (20 referrals) and 'user_dev_referred'");
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "soma_settlement=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();

    if config.dev_mode {
        tracing::info!("Running in DEVELOPMENT mode");
    }
    for warning in config.startup_warnings() {
        tracing::warn!("{}", warning);
    }

    // Create database connection pools
    let db_pool = create_pool(&config.database_path).expect("Failed to create database pool");
    let audit_pool =
        create_pool(&config.audit_database_path).expect("Failed to create audit database pool");

    // Initialize database schemas
    {
        let conn = db_pool.get().expect("Failed to get connection");
        init_db(&conn).expect("Failed to initialize database");
    }
    {
        let conn = audit_pool.get().expect("Failed to get audit connection");
        init_audit_db(&conn).expect("Failed to initialize audit database");
    }

    let notifier = Notifier::new(Client::new(), config.notify_webhook_url.clone());
    if notifier.is_enabled() {
        tracing::info!("Customer notifications enabled");
    }

    let state = AppState {
        db: db_pool,
        audit: audit_pool,
        webhook_secret: config.webhook_secret.clone(),
        platform_vendor_id: config.platform_vendor_id.clone(),
        default_currency: config.default_currency.clone(),
        plan_pricing: config.plan_pricing.clone(),
        webhook_log_enabled: config.webhook_log_enabled,
        notifier: Arc::new(notifier),
    };

    // Seed dev data if --seed flag is passed (only in dev mode)
    if cli.seed {
        if !config.dev_mode {
            tracing::warn!("--seed flag ignored: not in dev mode (set SOMA_ENV=dev)");
        } else if let Err(e) = seed_dev_data(&state) {
            tracing::error!("Failed to seed dev data: {}", e);
        }
    }

    let app = handlers::router()
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    let cleanup_on_exit = cli.ephemeral && config.dev_mode;
    let db_path = config.database_path.clone();
    let audit_path = config.audit_database_path.clone();

    if cleanup_on_exit {
        tracing::info!("EPHEMERAL MODE: databases will be deleted on exit");
    }

    tracing::info!("Settlement server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Failed to start server");

    if cleanup_on_exit {
        tracing::info!("Cleaning up ephemeral databases...");
        for path in [&db_path, &audit_path] {
            if let Err(e) = std::fs::remove_file(path) {
                tracing::warn!("Failed to remove {}: {}", path, e);
            } else {
                tracing::info!("Removed {}", path);
            }
            let _ = std::fs::remove_file(format!("{}-wal", path));
            let _ = std::fs::remove_file(format!("{}-shm", path));
        }
        tracing::info!("Ephemeral cleanup complete");
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install Ctrl+C handler: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, stopping server...");
}
