use axum::{routing::post, Router};

use crate::{handlers::otp, state::AppState};

pub fn otp_routes() -> Router<AppState> {
    Router::new()
        // Issue a code and mail it
        .route("/send-otp", post(otp::send_otp))
        // Check a code; consumed on success
        .route("/verify-otp", post(otp::verify_otp))
}
