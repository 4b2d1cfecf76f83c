//! Scan-session endpoints: poll the mailbox, clear it, and select the mode.

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use lbk_core::errors::CoreError;
use lbk_core::types::{now_ms, ScanMode};

use crate::api::error::ApiError;
use crate::api::router::AppState;

#[derive(Serialize)]
pub struct ScanResponse {
    pub uid: String,
    pub timestamp: u64,
    pub mode: ScanMode,
}

/// Poll the last captured card.
///
/// An empty mailbox (or an expired capture) reports an empty uid with a zero
/// timestamp rather than an error; the kiosk UI polls this continuously.
pub async fn get_scan(State(state): State<AppState>) -> Json<ScanResponse> {
    match state.ctx.read_capture(now_ms()).await {
        Some(capture) => Json(ScanResponse {
            uid: capture.uid.as_str().to_string(),
            timestamp: capture.captured_at_ms,
            mode: capture.mode,
        }),
        None => Json(ScanResponse {
            uid: String::new(),
            timestamp: 0,
            mode: ScanMode::Normal,
        }),
    }
}

/// Drop the last captured card.
pub async fn clear_card(State(state): State<AppState>) -> Json<Value> {
    state.ctx.clear_capture().await;
    Json(json!({ "status": "cleared" }))
}

#[derive(Deserialize)]
pub struct ModeQuery {
    pub mode: Option<String>,
}

/// Select the interpretation of the next capture. Registration modes open a
/// scan window immediately instead of waiting for motion. Any value other
/// than `user` or `book` selects normal.
pub async fn set_mode(
    State(state): State<AppState>,
    Query(query): Query<ModeQuery>,
) -> Result<Json<Value>, ApiError> {
    let raw = query
        .mode
        .ok_or(CoreError::MissingParameter("mode"))?;
    let mode = match raw.as_str() {
        "user" => ScanMode::RegisterUser,
        "book" => ScanMode::RegisterBook,
        _ => ScanMode::Normal,
    };

    let scanning = state.ctx.set_mode(mode, now_ms()).await || state.ctx.is_armed().await;
    Ok(Json(json!({ "mode": mode, "scanning": scanning })))
}
