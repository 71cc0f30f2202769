use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Default, Deserialize)]
pub struct ChatbotRequest {
    pub query: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct ChatbotResponse {
    pub response: String,
}
