pub mod email_service;
pub mod intent_service;
pub mod otp_service;
