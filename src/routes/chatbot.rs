use axum::{routing::post, Router};

use crate::handlers::chatbot;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/chatbot", post(chatbot::chatbot_query))
}
