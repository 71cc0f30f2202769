use std::sync::Arc;

use crate::services::email_service::OtpMailer;
use crate::services::intent_service::IntentDetector;
use crate::services::otp_service::OtpStore;

#[derive(Clone)]
pub struct AppState {
    pub otp_store: Arc<dyn OtpStore>,
    pub mailer: Arc<dyn OtpMailer>,
    pub intent: Arc<dyn IntentDetector>,
}

impl AppState {
    pub fn new(
        otp_store: Arc<dyn OtpStore>,
        mailer: Arc<dyn OtpMailer>,
        intent: Arc<dyn IntentDetector>,
    ) -> Self {
        AppState {
            otp_store,
            mailer,
            intent,
        }
    }

    pub fn with_intent(mut self, intent: Arc<dyn IntentDetector>) -> Self {
        self.intent = intent;
        self
    }
}
