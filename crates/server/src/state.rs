//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::ServerConfig;
use crate::payment::{PaymentError, PaymentGateway};
use crate::services::email::EmailService;
use crate::services::token::TokenService;

/// Error building application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("payment gateway: {0}")]
    Gateway(#[from] PaymentError),
    #[error("smtp transport: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    pool: PgPool,
    tokens: TokenService,
    mailer: EmailService,
    gateway: PaymentGateway,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the payment gateway or SMTP transport cannot
    /// be constructed from configuration.
    pub fn new(config: ServerConfig, pool: PgPool) -> Result<Self, StateError> {
        let tokens = TokenService::new(&config.jwt_secret);
        let mailer = EmailService::new(config.smtp.as_ref())?;
        let gateway = PaymentGateway::from_config(&config.gateway)?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                tokens,
                mailer,
                gateway,
            }),
        })
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the token service.
    #[must_use]
    pub fn tokens(&self) -> &TokenService {
        &self.inner.tokens
    }

    /// Get a reference to the email service.
    #[must_use]
    pub fn mailer(&self) -> &EmailService {
        &self.inner.mailer
    }

    /// Get a reference to the payment gateway.
    #[must_use]
    pub fn gateway(&self) -> &PaymentGateway {
        &self.inner.gateway
    }
}
