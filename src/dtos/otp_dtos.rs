use serde::{Deserialize, Serialize};
use serde_json::Value;

// Fields are loose JSON values so a missing or oddly-typed value maps to the
// route's own 400 message instead of an extractor rejection.
#[derive(Debug, Default, Deserialize)]
pub struct SendOtpRequest {
    pub email: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct VerifyOtpRequest {
    pub email: Option<Value>,
    pub otp: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}
