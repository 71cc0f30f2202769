use axum::{extract::State, Json};

use crate::dtos::chatbot_dtos::{ChatbotRequest, ChatbotResponse};
use crate::dtos::fields::text_form;
use crate::errors::Result;
use crate::middleware::body::JsonOrForm;
use crate::state::AppState;

// POST /api/chatbot
//
// The query is not validated. Non-string values are sent as their JSON text;
// an absent query reaches the intent service as empty text and fails there.
pub async fn chatbot_query(
    State(state): State<AppState>,
    JsonOrForm(req): JsonOrForm<ChatbotRequest>,
) -> Result<Json<ChatbotResponse>> {
    let query = req.query.as_ref().map(text_form).unwrap_or_default();
    let response = state.intent.detect_intent(&query).await?;

    Ok(Json(ChatbotResponse { response }))
}
