// src/errors.rs
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Email is required for OTP verification.")]
    EmailRequired,

    #[error("Email and OTP are required for verification.")]
    VerificationFieldsRequired,

    #[error("OTP not found for the provided email.")]
    OtpNotFound,

    #[error("Invalid OTP.")]
    InvalidOtp,

    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("Request body too large")]
    PayloadTooLarge,

    #[error("Intent service error: {0}")]
    IntentService(String),

    #[error("Mail error: {0}")]
    MailError(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("HTTP client error: {0}")]
    HttpClientError(String),
}

impl AppError {
    fn status_and_message(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::EmailRequired => (
                StatusCode::BAD_REQUEST,
                "Email is required for OTP verification.",
            ),
            AppError::VerificationFieldsRequired => (
                StatusCode::BAD_REQUEST,
                "Email and OTP are required for verification.",
            ),
            AppError::OtpNotFound => (
                StatusCode::BAD_REQUEST,
                "OTP not found for the provided email.",
            ),
            AppError::InvalidOtp => (StatusCode::BAD_REQUEST, "Invalid OTP."),
            AppError::InvalidBody(_) => (StatusCode::BAD_REQUEST, "Invalid request body."),
            AppError::PayloadTooLarge => {
                (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large.")
            }
            // Anything upstream of the chatbot route collapses to one opaque message.
            AppError::IntentService(_) | AppError::HttpClientError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "An error occurred while processing the user query.",
            ),
            AppError::MailError(_) | AppError::ConfigurationError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error.")
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = self.status_and_message();

        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }

        (status, Json(json!({ "error": error_message }))).into_response()
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::HttpClientError(format!("HTTP request failed: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidBody(format!("JSON parsing error: {}", err))
    }
}

impl From<lettre::error::Error> for AppError {
    fn from(err: lettre::error::Error) -> Self {
        AppError::MailError(format!("Failed to build email message: {}", err))
    }
}

impl From<lettre::transport::smtp::Error> for AppError {
    fn from(err: lettre::transport::smtp::Error) -> Self {
        AppError::MailError(format!("SMTP transport error: {}", err))
    }
}

// Helper conversion functions
impl AppError {
    pub fn intent(msg: impl Into<String>) -> Self {
        AppError::IntentService(msg.into())
    }

    pub fn mail(msg: impl Into<String>) -> Self {
        AppError::MailError(msg.into())
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        AppError::ConfigurationError(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
