use axum::{extract::State, response::Json};
use serde_json::{json, Value};

use crate::state::AppState;

pub async fn root_handler() -> &'static str {
    "Hello, welcome to the server!"
}

pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "mail": state.mailer.is_enabled(),
        "intent": state.intent.is_enabled(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
