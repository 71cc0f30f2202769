pub mod chatbot_dtos;
pub mod fields;
pub mod otp_dtos;
