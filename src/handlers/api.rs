//! Health check endpoint

use axum::{Json, extract::State};
use serde_json::{Value, json};
use std::sync::Arc;

use crate::state::AppState;

/// `GET /health` - liveness probe with the current session count.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "callstream",
        "version": env!("CARGO_PKG_VERSION"),
        "live_sessions": state.controller.store().len(),
    }))
}
