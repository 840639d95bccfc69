//! Outgoing SMTP mail for registration codes.

use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use thiserror::Error;

use crate::auth::otp::OTP_TTL;
use crate::config::{MailConfig, CONFIG};

const OTP_SUBJECT: &str = "Your LinkMy verification code";

#[derive(Error, Debug)]
pub enum MailError {
    #[error("SMTP is not configured")]
    NotConfigured,

    #[error("Invalid mail address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Failed to build message: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("SMTP delivery failed: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
}

/// Mail a registration code. Without SMTP settings a development server
/// logs the code instead.
pub async fn send_otp(to: &str, code: &str) -> Result<(), MailError> {
    let config = &CONFIG.mail;

    if !config.is_configured() {
        if CONFIG.is_development() {
            tracing::warn!(email = %to, code = %code, "SMTP not configured, OTP written to log");
            return Ok(());
        }
        return Err(MailError::NotConfigured);
    }

    let message = otp_message(config, to, code)?;
    let mailer = transport(config)?;
    mailer.send(message).await?;

    tracing::info!(email = %to, "OTP email sent");

    Ok(())
}

fn otp_message(config: &MailConfig, to: &str, code: &str) -> Result<Message, MailError> {
    let from = config
        .from
        .as_deref()
        .or(config.username.as_deref())
        .ok_or(MailError::NotConfigured)?;

    let body = format!(
        "Your LinkMy verification code is: {code}\n\n\
         The code expires in {} minutes. If you did not request it, ignore this email.\n",
        OTP_TTL.as_secs() / 60
    );

    let message = Message::builder()
        .from(from.parse::<Mailbox>()?)
        .to(to.parse::<Mailbox>()?)
        .subject(OTP_SUBJECT)
        .header(ContentType::TEXT_PLAIN)
        .body(body)?;

    Ok(message)
}

/// Port 465 speaks implicit TLS; every other port upgrades with STARTTLS.
fn transport(config: &MailConfig) -> Result<AsyncSmtpTransport<Tokio1Executor>, MailError> {
    let host = config.host.as_deref().ok_or(MailError::NotConfigured)?;
    let (Some(username), Some(password)) = (&config.username, &config.password) else {
        return Err(MailError::NotConfigured);
    };

    let builder = if config.port == 465 {
        AsyncSmtpTransport::<Tokio1Executor>::relay(host)?
    } else {
        AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)?
    };

    Ok(builder
        .port(config.port)
        .credentials(Credentials::new(username.clone(), password.clone()))
        .build())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mail_config() -> MailConfig {
        MailConfig {
            host: Some("smtp.example.com".into()),
            port: 587,
            username: Some("mailer@example.com".into()),
            password: Some("secret".into()),
            from: Some("LinkMy <no-reply@example.com>".into()),
        }
    }

    #[test]
    fn test_otp_message_contains_code() {
        let message = otp_message(&mail_config(), "alice@example.com", "042137").unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("042137"));
        assert!(raw.contains("alice@example.com"));
        assert!(raw.contains(OTP_SUBJECT));
    }

    #[test]
    fn test_from_falls_back_to_username() {
        let mut config = mail_config();
        config.from = None;
        let message = otp_message(&config, "alice@example.com", "123456").unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("From: mailer@example.com"));
    }

    #[test]
    fn test_invalid_recipient_is_address_error() {
        assert!(matches!(
            otp_message(&mail_config(), "not an email", "123456"),
            Err(MailError::Address(_))
        ));
    }

    #[test]
    fn test_transport_requires_credentials() {
        let mut config = mail_config();
        config.password = None;
        assert!(matches!(transport(&config), Err(MailError::NotConfigured)));
        config.host = None;
        assert!(matches!(transport(&config), Err(MailError::NotConfigured)));
    }
}
