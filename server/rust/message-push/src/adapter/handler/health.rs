use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use super::AppState;

/// GET /
pub async fn root(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "hello": state.app_name }))
}

/// GET /healthz
pub async fn healthz() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
