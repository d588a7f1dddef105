//! Outgoing email: verification links and password reset links.

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox, Message},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Tokio1Executor,
};

use crate::{config::SmtpConfig, error::AppError};

/// A plain-text message ready to be handed to a [`Mailer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl Email {
    pub fn verification(to: &str, frontend_url: &str, token: &str) -> Self {
        let link = format!("{}/verify?token={}", frontend_url.trim_end_matches('/'), token);
        Self {
            to: to.to_string(),
            subject: "Confirm your email address".to_string(),
            body: format!(
                "Welcome!\n\nPlease confirm your email address by opening the link below:\n\n{}\n\n\
                 If you did not create an account, you can ignore this message.\n",
                link
            ),
        }
    }

    pub fn password_reset(to: &str, frontend_url: &str, token: &str) -> Self {
        let link = format!(
            "{}/password/reset?token={}",
            frontend_url.trim_end_matches('/'),
            token
        );
        Self {
            to: to.to_string(),
            subject: "Reset your password".to_string(),
            body: format!(
                "We received a request to reset your password.\n\n\
                 Open the link below to choose a new one:\n\n{}\n\n\
                 The link expires in 1 hour. \
                 If you did not ask for a reset, your password stays unchanged.\n",
                link
            ),
        }
    }
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &Email) -> Result<(), AppError>;
}

/// Writes messages to the log instead of sending them. Used when no SMTP host is configured.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &Email) -> Result<(), AppError> {
        log::info!(
            "SMTP disabled, not sending \"{}\" to {}:\n{}",
            email.subject,
            email.to,
            email.body
        );
        Ok(())
    }
}

/// Sends through an SMTP relay with STARTTLS.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig, from: &str) -> Result<Self, AppError> {
        let from: Mailbox = from
            .parse()
            .map_err(|e| AppError::InternalServerError(format!("Invalid MAIL_FROM: {}", e)))?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| {
                AppError::InternalServerError(format!("Failed to create SMTP transport: {}", e))
            })?
            .port(config.port);

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: &Email) -> Result<(), AppError> {
        let to: Mailbox = email
            .to
            .parse()
            .map_err(|e| AppError::InternalServerError(format!("Invalid recipient: {}", e)))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(email.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(email.body.clone())
            .map_err(|e| AppError::InternalServerError(format!("Failed to build email: {}", e)))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| AppError::InternalServerError(format!("SMTP send failed: {}", e)))?;

        log::info!("Sent \"{}\" to {}", email.subject, email.to);
        Ok(())
    }
}
