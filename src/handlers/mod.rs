pub mod chatbot;
pub mod otp;
pub mod system;
