//! Simulator-only endpoints, mounted when the hardware is simulated.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::error::ApiError;
use crate::api::router::AppState;

/// Raise a simulated motion edge.
pub async fn trigger_motion(State(state): State<AppState>) -> Json<Value> {
    state.ctx.motion().trigger();
    Json(json!({ "status": "motion" }))
}

#[derive(Deserialize)]
pub struct InjectCardRequest {
    /// Raw UID as a hex string, e.g. "04A3FF12".
    pub uid: String,
}

/// Present a simulated card to the reader.
pub async fn inject_card(
    State(state): State<AppState>,
    Json(payload): Json<InjectCardRequest>,
) -> Result<StatusCode, ApiError> {
    let sim = state
        .sim
        .as_ref()
        .ok_or_else(|| ApiError::BadRequest("simulator not enabled".to_string()))?;
    let raw = hex::decode(&payload.uid)
        .map_err(|e| ApiError::BadRequest(format!("invalid uid hex: {e}")))?;
    sim.inject(raw);
    Ok(StatusCode::ACCEPTED)
}
