//! Route configuration
//!
//! # Endpoints
//!
//! - `GET /health` - liveness probe
//! - `GET /stream?callSid=...` - WebSocket upgrade for call audio

use axum::{Router, routing::get};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::handlers::{api, stream};
use crate::state::AppState;

pub fn create_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(api::health_check))
        .route("/stream", get(stream::stream_handler))
        .layer(TraceLayer::new_for_http())
}
