// config.rs
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::errors::{AppError, Result};

pub const SMTP_HOST: &str = "smtp-relay.sendinblue.com";
pub const SMTP_PORT: u16 = 587;
pub const MAX_BODY_BYTES: usize = 30 * 1024 * 1024;
pub const DEFAULT_DIALOGFLOW_API_BASE: &str = "https://dialogflow.googleapis.com";
pub const DEFAULT_LANGUAGE_CODE: &str = "en-US";

#[derive(Debug, Clone)]
pub struct MailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub sender_address: Option<String>,
}

#[derive(Debug, Clone)]
pub struct IntentConfig {
    pub project_id: Option<String>,
    pub service_key_path: Option<PathBuf>,
    /// Pre-minted bearer token; takes precedence over the key file.
    pub access_token: Option<String>,
    pub api_base: String,
    pub language_code: String,
    pub request_timeout: Option<Duration>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub mail: MailConfig,
    pub intent: IntentConfig,
    /// `None` keeps codes until they are verified.
    pub otp_ttl: Option<Duration>,
    pub otp_sweep_interval: Duration,
    pub port: u16,
    pub host: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mail = MailConfig {
            smtp_host: SMTP_HOST.to_string(),
            smtp_port: SMTP_PORT,
            smtp_username: get("SMTP_USERNAME"),
            smtp_password: get("SMTP_PASSWORD_OR_API_KEY"),
            sender_address: get("SENDER_EMAIL_ADDRESS"),
        };

        let intent = IntentConfig {
            project_id: get("PROJECT_ID"),
            service_key_path: get("SERVICE_KEY").map(PathBuf::from),
            access_token: get("INTENT_ACCESS_TOKEN"),
            api_base: get("DIALOGFLOW_API_BASE")
                .unwrap_or_else(|| DEFAULT_DIALOGFLOW_API_BASE.to_string()),
            language_code: DEFAULT_LANGUAGE_CODE.to_string(),
            request_timeout: parse_opt::<u64>("INTENT_TIMEOUT_SECONDS", get("INTENT_TIMEOUT_SECONDS"))?
                .map(Duration::from_secs),
        };

        let port = parse_opt::<u16>("PORT", get("PORT"))?.unwrap_or(5000);
        let otp_ttl = parse_opt::<u64>("OTP_TTL_SECONDS", get("OTP_TTL_SECONDS"))?
            .map(Duration::from_secs);
        let sweep_secs = parse_opt::<u64>(
            "OTP_SWEEP_INTERVAL_SECONDS",
            get("OTP_SWEEP_INTERVAL_SECONDS"),
        )?
        .unwrap_or(60);
        if sweep_secs == 0 {
            return Err(AppError::configuration(
                "OTP_SWEEP_INTERVAL_SECONDS must be greater than zero",
            ));
        }

        Ok(AppConfig {
            mail,
            intent,
            otp_ttl,
            otp_sweep_interval: Duration::from_secs(sweep_secs),
            port,
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn get_config_info(&self) -> serde_json::Value {
        serde_json::json!({
            "smtp_relay": format!("{}:{}", self.mail.smtp_host, self.mail.smtp_port),
            "smtp_credentials_set": self.mail.smtp_username.is_some() && self.mail.smtp_password.is_some(),
            "sender_address": self.mail.sender_address,
            "intent_project": self.intent.project_id,
            "intent_api_base": self.intent.api_base,
            "service_key_set": self.intent.service_key_path.is_some(),
            "static_token_set": self.intent.access_token.is_some(),
            "otp_ttl_seconds": self.otp_ttl.map(|d| d.as_secs()),
            "port": self.port,
            "host": self.host,
        })
    }
}

fn parse_opt<T: std::str::FromStr>(key: &str, raw: Option<String>) -> Result<Option<T>> {
    raw.map(|value| {
        value
            .trim()
            .parse::<T>()
            .map_err(|_| AppError::configuration(format!("{} must be a number, got {:?}", key, value)))
    })
    .transpose()
}
