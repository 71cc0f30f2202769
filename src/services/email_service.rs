use std::sync::Arc;

use async_trait::async_trait;
use lettre::message::{header, Mailbox, Message};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use tokio::task::JoinHandle;

use crate::config::MailConfig;
use crate::errors::{AppError, Result};

pub const OTP_SUBJECT: &str = "OTP Verification";

pub fn otp_body(code: &str) -> String {
    format!("Your OTP: {}", code)
}

#[async_trait]
pub trait OtpMailer: Send + Sync {
    async fn send_otp(&self, recipient: &str, code: &str) -> Result<()>;

    /// False when the mailer only logs instead of delivering.
    fn is_enabled(&self) -> bool {
        true
    }
}

/// SMTP relay sender. Runs in log-only mode when credentials or the sender
/// address are missing.
#[derive(Clone)]
pub struct EmailService {
    transport: Option<Arc<AsyncSmtpTransport<Tokio1Executor>>>,
    from: Option<Mailbox>,
}

impl EmailService {
    pub fn new(config: &MailConfig) -> Result<Self> {
        let (username, password, sender) = match (
            &config.smtp_username,
            &config.smtp_password,
            &config.sender_address,
        ) {
            (Some(username), Some(password), Some(sender)) => (username, password, sender),
            _ => {
                tracing::warn!("SMTP credentials or sender address not set; OTP emails will only be logged");
                return Ok(Self::disabled());
            }
        };

        let from = sender
            .parse::<Mailbox>()
            .map_err(|e| AppError::configuration(format!("Invalid SENDER_EMAIL_ADDRESS: {}", e)))?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .map_err(|e| AppError::configuration(format!("Failed to configure SMTP transport: {}", e)))?
            .port(config.smtp_port)
            .credentials(Credentials::new(username.to_string(), password.to_string()))
            .build();

        Ok(Self {
            transport: Some(Arc::new(transport)),
            from: Some(from),
        })
    }

    pub fn disabled() -> Self {
        Self {
            transport: None,
            from: None,
        }
    }

    pub fn build_otp_message(from: Mailbox, recipient: &str, code: &str) -> Result<Message> {
        let to = recipient
            .parse::<Mailbox>()
            .map_err(|e| AppError::mail(format!("Invalid recipient email address: {}", e)))?;

        let message = Message::builder()
            .from(from)
            .to(to)
            .subject(OTP_SUBJECT)
            .header(header::ContentType::TEXT_PLAIN)
            .body(otp_body(code))?;

        Ok(message)
    }
}

#[async_trait]
impl OtpMailer for EmailService {
    async fn send_otp(&self, recipient: &str, code: &str) -> Result<()> {
        let (transport, from) = match (&self.transport, &self.from) {
            (Some(transport), Some(from)) => (transport, from),
            _ => {
                tracing::info!(recipient, "Mail disabled; skipping OTP email");
                tracing::debug!(recipient, code, "Undelivered OTP");
                return Ok(());
            }
        };

        let message = Self::build_otp_message(from.clone(), recipient, code)?;
        let response = transport.send(message).await?;

        tracing::info!(
            recipient,
            "Email sent: {} {}",
            response.code(),
            response.message().collect::<Vec<_>>().join(" ")
        );
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        self.transport.is_some()
    }
}

/// Sends the OTP on a detached task. The outcome is only logged; callers have
/// already answered the request by the time delivery finishes.
pub fn spawn_otp_email(
    mailer: Arc<dyn OtpMailer>,
    recipient: String,
    code: String,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = mailer.send_otp(&recipient, &code).await {
            tracing::error!(recipient = %recipient, "Error sending email: {}", e);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FailingMailer {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl OtpMailer for FailingMailer {
        async fn send_otp(&self, _recipient: &str, _code: &str) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(AppError::mail("connection refused"))
        }
    }

    fn mail_config(username: Option<&str>, sender: Option<&str>) -> MailConfig {
        MailConfig {
            smtp_host: crate::config::SMTP_HOST.to_string(),
            smtp_port: crate::config::SMTP_PORT,
            smtp_username: username.map(str::to_string),
            smtp_password: username.map(|_| "secret".to_string()),
            sender_address: sender.map(str::to_string),
        }
    }

    #[test]
    fn otp_message_has_fixed_subject_and_code() {
        let from: Mailbox = "noreply@example.com".parse().unwrap();
        let message = EmailService::build_otp_message(from, "a@b.com", "012345").unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();

        assert!(raw.contains("Subject: OTP Verification"), "{raw}");
        assert!(raw.contains("To: a@b.com"), "{raw}");
        assert!(raw.contains("Your OTP: 012345"), "{raw}");
    }

    #[test]
    fn rejects_unparseable_recipient() {
        let from: Mailbox = "noreply@example.com".parse().unwrap();
        let err = EmailService::build_otp_message(from, "not an address", "012345").unwrap_err();
        assert!(matches!(err, AppError::MailError(_)));
    }

    #[test]
    fn missing_credentials_disable_delivery() {
        let service = EmailService::new(&mail_config(None, Some("noreply@example.com"))).unwrap();
        assert!(!service.is_enabled());

        let service = EmailService::new(&mail_config(Some("relay"), None)).unwrap();
        assert!(!service.is_enabled());
    }

    #[test]
    fn bad_sender_address_is_a_configuration_error() {
        let err = EmailService::new(&mail_config(Some("relay"), Some("nope"))).err();
        assert!(matches!(err, Some(AppError::ConfigurationError(_))));
    }

    #[tokio::test]
    async fn disabled_service_accepts_sends() {
        let service = EmailService::disabled();
        assert!(service.send_otp("a@b.com", "123456").await.is_ok());
    }

    #[tokio::test]
    async fn spawned_send_swallows_failures() {
        let mailer = Arc::new(FailingMailer {
            calls: AtomicUsize::new(0),
        });

        spawn_otp_email(mailer.clone(), "a@b.com".into(), "123456".into())
            .await
            .unwrap();

        assert_eq!(mailer.calls.load(Ordering::SeqCst), 1);
    }
}
