//! Inbound HTTP surface: the Telegram webhook plus a status page.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::Html,
    routing::{get, post},
    Json,
};
use futures::FutureExt;
use serde_json::{json, Value};
use tracing::{debug, error, warn};

use crate::router::Router;
use crate::update::InboundUpdate;

const INDEX_HTML: &str = include_str!("../static/index.html");

/// Build the axum app serving `webhook_path`, `/` and `/health`.
pub fn app(router: Arc<Router>, webhook_path: &str) -> axum::Router {
    axum::Router::new()
        .route("/", get(serve_index))
        .route("/health", get(health))
        .route(webhook_path, post(receive_update))
        .with_state(router)
}

async fn serve_index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn health() -> &'static str {
    "ok"
}

/// Parse one update and handle it to completion before answering Telegram.
pub async fn receive_update(
    State(router): State<Arc<Router>>,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    let update = match InboundUpdate::from_json(&body) {
        Ok(Some(update)) => update,
        Ok(None) => {
            debug!("Ignoring update without message or callback query");
            return ok();
        }
        Err(e) => {
            warn!("Rejecting webhook body: {}", e);
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"status": "error", "message": "Invalid JSON"})),
            );
        }
    };

    match AssertUnwindSafe(router.handle_update(update))
        .catch_unwind()
        .await
    {
        Ok(outcome) => {
            debug!("Update handled: {:?}", outcome);
            ok()
        }
        Err(_) => {
            error!("Update handler panicked");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"status": "error", "message": "Internal server error"})),
            )
        }
    }
}

fn ok() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({"status": "ok"})))
}
