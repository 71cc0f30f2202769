use axum::{extract::State, Json};

use crate::dtos::fields::{present, text_form};
use crate::dtos::otp_dtos::{MessageResponse, SendOtpRequest, VerifyOtpRequest};
use crate::errors::{AppError, Result};
use crate::middleware::body::JsonOrForm;
use crate::services::email_service::spawn_otp_email;
use crate::services::otp_service::{generate_otp, VerifyOutcome};
use crate::state::AppState;

// POST /api/send-otp
pub async fn send_otp(
    State(state): State<AppState>,
    JsonOrForm(req): JsonOrForm<SendOtpRequest>,
) -> Result<Json<MessageResponse>> {
    let email = present(&req.email)
        .map(text_form)
        .ok_or(AppError::EmailRequired)?;

    let otp = generate_otp();
    state.otp_store.put(&email, &otp).await;

    // Delivery is not awaited; the client is told "sent" before SMTP answers.
    spawn_otp_email(state.mailer.clone(), email.clone(), otp);
    tracing::info!(email = %email, "OTP issued");

    Ok(Json(MessageResponse::new("OTP sent successfully.")))
}

// POST /api/verify-otp
pub async fn verify_otp(
    State(state): State<AppState>,
    JsonOrForm(req): JsonOrForm<VerifyOtpRequest>,
) -> Result<Json<MessageResponse>> {
    let (email, otp) = match (present(&req.email), present(&req.otp)) {
        (Some(email), Some(otp)) => (text_form(email), otp),
        _ => return Err(AppError::VerificationFieldsRequired),
    };

    // Stored codes are strings, so a non-string otp can never match.
    let outcome = match otp.as_str() {
        Some(code) => state.otp_store.verify(&email, code).await,
        None => match state.otp_store.get(&email).await {
            Some(_) => VerifyOutcome::Mismatch,
            None => VerifyOutcome::NotFound,
        },
    };
    tracing::info!(email = %email, ?outcome, "OTP verification attempt");
    outcome.into_result()?;

    Ok(Json(MessageResponse::new("OTP verification successful.")))
}
