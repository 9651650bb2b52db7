use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use futures::FutureExt;
use log::{error, warn};
use serde::Serialize;
use serde_json::{json, Value};

use crate::pipeline::types::{ProcessingResult, RawTransaction};
use crate::pipeline::EnrichmentPipeline;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<EnrichmentPipeline>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/webhook", post(handle_webhook))
        .route("/health", get(health))
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WebhookResponse {
    success: bool,
    processed: usize,
    results: Vec<ProcessingResult>,
    timestamp: String,
}

/// Accepts a JSON array of transactions, or a single object treated as a
/// one-element batch.
async fn handle_webhook(State(state): State<AppState>, Json(payload): Json<Value>) -> Response {
    let batch = match decode_batch(payload) {
        Ok(batch) => batch,
        Err(reason) => {
            warn!("rejected webhook payload: {reason}");
            return (StatusCode::BAD_REQUEST, Json(json!({ "error": reason }))).into_response();
        }
    };

    // A fault while processing one batch answers 500 without taking the
    // process down; per-item faults are already absorbed inside the pipeline.
    let outcome = AssertUnwindSafe(state.pipeline.process(batch))
        .catch_unwind()
        .await;

    match outcome {
        Ok(results) => {
            let response = WebhookResponse {
                success: true,
                processed: results.len(),
                results,
                timestamp: Utc::now().to_rfc3339(),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(_) => {
            error!("webhook batch processing panicked");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Internal server error",
                    "timestamp": Utc::now().to_rfc3339(),
                })),
            )
                .into_response()
        }
    }
}

fn decode_batch(payload: Value) -> Result<Vec<RawTransaction>, String> {
    let items = match payload {
        Value::Array(items) => items,
        object @ Value::Object(_) => vec![object],
        _ => return Err("expected a transaction object or array".to_string()),
    };

    let mut batch = Vec::with_capacity(items.len());
    for item in items {
        let tx: RawTransaction = serde_json::from_value(item)
            .map_err(|err| format!("malformed transaction payload: {err}"))?;
        batch.push(tx);
    }

    Ok(batch)
}
