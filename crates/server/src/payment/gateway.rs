//! Gateway order creation: remote HTTP provider or local simulation.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

use crate::config::{GatewayConfig, GatewayMode};

use super::PaymentError;

/// Artificial latency for the simulated gateway, so demo checkouts feel
/// like a network round trip.
const SIMULATED_DELAY: Duration = Duration::from_millis(400);

/// A gateway-side order created for a checkout attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayOrder {
    /// Gateway order reference, later covered by the payment signature.
    pub id: String,
    /// Amount in minor units.
    pub amount: i64,
    /// ISO 4217 currency code.
    pub currency: String,
}

/// The payment gateway selected at startup.
///
/// The simulated variant is an explicit offline-demo path; a remote gateway
/// that declines or errors never falls back to it.
pub enum PaymentGateway {
    Remote(RemoteGateway),
    Simulated(SimulatedGateway),
}

impl PaymentGateway {
    /// Build the configured gateway.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::Http` if the HTTP client fails to build.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, PaymentError> {
        match config.mode {
            GatewayMode::Remote => Ok(Self::Remote(RemoteGateway::new(config)?)),
            GatewayMode::Simulated => Ok(Self::Simulated(SimulatedGateway::new(&config.currency))),
        }
    }

    /// Create a gateway order for the given amount in minor units.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::Gateway` if the provider rejects the request,
    /// `PaymentError::Http` on transport failure.
    pub async fn create_order(&self, amount: i64, receipt: &str) -> Result<GatewayOrder, PaymentError> {
        match self {
            Self::Remote(gateway) => gateway.create_order(amount, receipt).await,
            Self::Simulated(gateway) => Ok(gateway.create_order(amount).await),
        }
    }

    /// Whether this gateway fabricates its own payment references.
    #[must_use]
    pub const fn is_simulated(&self) -> bool {
        matches!(self, Self::Simulated(_))
    }
}

#[derive(Serialize)]
struct CreateOrderRequest<'a> {
    amount: i64,
    currency: &'a str,
    receipt: &'a str,
}

#[derive(Deserialize)]
struct CreateOrderResponse {
    id: String,
    amount: i64,
    currency: String,
}

/// HTTP client for the hosted payment provider's orders API.
pub struct RemoteGateway {
    client: reqwest::Client,
    base_url: String,
    key_id: String,
    key_secret: SecretString,
    currency: String,
}

impl RemoteGateway {
    /// Create a new remote gateway client.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::Http` if the HTTP client fails to build.
    pub fn new(config: &GatewayConfig) -> Result<Self, PaymentError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            key_id: config.key_id.clone(),
            key_secret: config.key_secret.clone(),
            currency: config.currency.clone(),
        })
    }

    async fn create_order(&self, amount: i64, receipt: &str) -> Result<GatewayOrder, PaymentError> {
        let url = format!("{}/v1/orders", self.base_url);

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.key_id, Some(self.key_secret.expose_secret()))
            .json(&CreateOrderRequest {
                amount,
                currency: &self.currency,
                receipt,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(PaymentError::Gateway(format!("{status}: {message}")));
        }

        let order: CreateOrderResponse = response.json().await?;

        Ok(GatewayOrder {
            id: order.id,
            amount: order.amount,
            currency: order.currency,
        })
    }
}

/// Local stand-in gateway that fabricates synthetic references.
pub struct SimulatedGateway {
    currency: String,
}

impl SimulatedGateway {
    #[must_use]
    pub fn new(currency: &str) -> Self {
        Self {
            currency: currency.to_string(),
        }
    }

    async fn create_order(&self, amount: i64) -> GatewayOrder {
        tokio::time::sleep(SIMULATED_DELAY).await;

        GatewayOrder {
            id: format!("sim_order_{}", Uuid::new_v4().simple()),
            amount,
            currency: self.currency.clone(),
        }
    }

    /// Fabricate a payment reference, as a shopper-side gateway widget would.
    #[must_use]
    pub fn payment_reference() -> String {
        format!("sim_pay_{}", Uuid::new_v4().simple())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_simulated_order_has_synthetic_reference() {
        let gateway = SimulatedGateway::new("USD");
        let order = gateway.create_order(9999).await;
        assert!(order.id.starts_with("sim_order_"));
        assert_eq!(order.amount, 9999);
        assert_eq!(order.currency, "USD");
    }

    #[test]
    fn test_simulated_payment_references_are_unique() {
        let a = SimulatedGateway::payment_reference();
        let b = SimulatedGateway::payment_reference();
        assert!(a.starts_with("sim_pay_"));
        assert_ne!(a, b);
    }
}
