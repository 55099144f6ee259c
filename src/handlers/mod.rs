pub mod webhooks;

use axum::{Json, Router, routing::get};
use serde_json::{Value, json};

use crate::db::AppState;

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// All routes, without layers.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .merge(webhooks::router())
}
