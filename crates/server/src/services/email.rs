//! Email service for verification codes and order confirmations.
//!
//! Uses SMTP via lettre for delivery with Askama HTML templates. When no
//! SMTP configuration is present the service runs in log-only mode and
//! writes each message to the tracing output instead, which keeps local
//! development and the simulated-gateway demo working without a relay.

use askama::Template;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use crate::config::SmtpConfig;
use crate::models::Order;

/// HTML template for verification code email.
#[derive(Template)]
#[template(path = "email/verification_code.html")]
struct VerificationCodeEmailHtml<'a> {
    name: &'a str,
    code: &'a str,
}

/// Plain text template for verification code email.
#[derive(Template)]
#[template(path = "email/verification_code.txt")]
struct VerificationCodeEmailText<'a> {
    name: &'a str,
    code: &'a str,
}

/// HTML template for order confirmation email.
#[derive(Template)]
#[template(path = "email/order_confirmation.html")]
struct OrderConfirmationEmailHtml<'a> {
    name: &'a str,
    order: &'a Order,
}

/// Plain text template for order confirmation email.
#[derive(Template)]
#[template(path = "email/order_confirmation.txt")]
struct OrderConfirmationEmailText<'a> {
    name: &'a str,
    order: &'a Order,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

enum Transport {
    Smtp {
        mailer: AsyncSmtpTransport<Tokio1Executor>,
        from_address: String,
    },
    /// Log-only mode for environments without an SMTP relay.
    Log,
}

/// Email service for sending transactional emails.
pub struct EmailService {
    transport: Transport,
}

impl EmailService {
    /// Create an email service. `None` selects log-only mode.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP relay configuration is invalid.
    pub fn new(config: Option<&SmtpConfig>) -> Result<Self, SmtpError> {
        let Some(config) = config else {
            return Ok(Self {
                transport: Transport::Log,
            });
        };

        let credentials = Credentials::new(
            config.username.clone(),
            config.password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
            .port(config.port)
            .credentials(credentials)
            .build();

        Ok(Self {
            transport: Transport::Smtp {
                mailer,
                from_address: config.from_address.clone(),
            },
        })
    }

    /// Send the six-digit account verification code.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_verification_code(
        &self,
        to: &str,
        name: &str,
        code: &str,
    ) -> Result<(), EmailError> {
        let html = VerificationCodeEmailHtml { name, code }.render()?;
        let text = VerificationCodeEmailText { name, code }.render()?;

        self.send_multipart_email(to, "Your LuxeMarket Verification Code", &text, &html)
            .await
    }

    /// Send an order confirmation after a verified payment.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_order_confirmation(
        &self,
        to: &str,
        name: &str,
        order: &Order,
    ) -> Result<(), EmailError> {
        let html = OrderConfirmationEmailHtml { name, order }.render()?;
        let text = OrderConfirmationEmailText { name, order }.render()?;

        self.send_multipart_email(to, "Your LuxeMarket Order Confirmation", &text, &html)
            .await
    }

    /// Send a multipart email with both plain text and HTML versions.
    async fn send_multipart_email(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), EmailError> {
        let Transport::Smtp {
            mailer,
            from_address,
        } = &self.transport
        else {
            tracing::info!(to, subject, body = text_body, "mock email (no SMTP relay)");
            return Ok(());
        };

        let email = Message::builder()
            .from(
                from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(from_address.clone()))?,
            )
            .to(to
                .parse()
                .map_err(|_| EmailError::InvalidAddress(to.to_string()))?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body.to_string()),
                    ),
            )?;

        mailer.send(email).await?;

        Ok(())
    }
}
