//! Payment gateway integration.
//!
//! Two halves: creating a gateway order for a checkout amount, and verifying
//! the HMAC-SHA256 signature the gateway hands back after the shopper pays.
//! The signature covers `"{order_reference}|{payment_reference}"` keyed with
//! the gateway's shared secret, hex-encoded, and is compared in constant
//! time. Which gateway runs (remote HTTP or local simulation) is fixed at
//! startup from configuration.
//!
//! Verification proves the confirmation signature is genuine; it does not
//! cross-check the paid amount against the order total, and a verify call
//! carries no idempotency key.

mod gateway;

pub use gateway::{GatewayOrder, PaymentGateway, RemoteGateway, SimulatedGateway};

use hmac::{Hmac, Mac};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;

/// Errors that can occur in the payment workflow.
#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    /// The gateway rejected or failed the order-creation request.
    #[error("gateway error: {0}")]
    Gateway(String),

    /// The confirmation signature did not match.
    #[error("payment signature verification failed")]
    InvalidSignature,

    /// The signing secret could not be used as an HMAC key.
    #[error("invalid signing key")]
    InvalidKey,

    /// The checkout amount cannot be represented in minor units.
    #[error("amount out of range: {0}")]
    AmountOutOfRange(Decimal),

    /// HTTP transport failure talking to the gateway.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Convert a decimal major-unit amount to integer minor units (cents).
///
/// The gateway API takes amounts in the currency's smallest unit, so
/// `99.99` becomes `9999`. Fractions beyond two places are rounded
/// half-up before conversion, so `99.985` becomes `9999`.
///
/// # Errors
///
/// Returns `PaymentError::AmountOutOfRange` if the scaled amount does not
/// fit in an `i64`.
pub fn to_minor_units(amount: Decimal) -> Result<i64, PaymentError> {
    let scaled = (amount * Decimal::from(100))
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    scaled
        .to_i64()
        .ok_or(PaymentError::AmountOutOfRange(amount))
}

/// Fabricate the shopper-side half of a simulated payment.
///
/// The simulated gateway has no client widget to collect payment, so the
/// server stands in for it: a synthetic payment reference plus the matching
/// confirmation signature, which the demo client submits to `verify`
/// unchanged. The settle path itself stays identical to remote mode.
///
/// # Errors
///
/// Returns `PaymentError::InvalidKey` if the secret cannot key the MAC.
pub fn simulated_settlement(
    secret: &SecretString,
    order_reference: &str,
) -> Result<(String, String), PaymentError> {
    let payment_reference = SimulatedGateway::payment_reference();
    let signature = expected_signature(secret, order_reference, &payment_reference)?;

    Ok((payment_reference, signature))
}

/// Compute the hex HMAC-SHA256 signature for a gateway payment.
///
/// # Errors
///
/// Returns `PaymentError::InvalidKey` if the secret cannot key the MAC.
pub fn expected_signature(
    secret: &SecretString,
    order_reference: &str,
    payment_reference: &str,
) -> Result<String, PaymentError> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.expose_secret().as_bytes())
        .map_err(|_| PaymentError::InvalidKey)?;
    mac.update(format!("{order_reference}|{payment_reference}").as_bytes());

    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Verify a gateway confirmation signature in constant time.
///
/// # Errors
///
/// Returns `PaymentError::InvalidSignature` if the signature is not valid
/// hex or does not match the expected MAC.
pub fn verify_signature(
    secret: &SecretString,
    order_reference: &str,
    payment_reference: &str,
    signature: &str,
) -> Result<(), PaymentError> {
    let provided = hex::decode(signature).map_err(|_| PaymentError::InvalidSignature)?;

    let mut mac = Hmac::<Sha256>::new_from_slice(secret.expose_secret().as_bytes())
        .map_err(|_| PaymentError::InvalidKey)?;
    mac.update(format!("{order_reference}|{payment_reference}").as_bytes());

    mac.verify_slice(&provided)
        .map_err(|_| PaymentError::InvalidSignature)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn secret() -> SecretString {
        SecretString::from("test-gateway-signing-secret")
    }

    #[test]
    fn test_to_minor_units() {
        assert_eq!(to_minor_units(Decimal::new(9999, 2)).unwrap(), 9999); // 99.99
        assert_eq!(to_minor_units(Decimal::from(100)).unwrap(), 10000);
        assert_eq!(to_minor_units(Decimal::ZERO).unwrap(), 0);
    }

    #[test]
    fn test_half_cent_rounds_up() {
        assert_eq!(to_minor_units(Decimal::new(99_985, 3)).unwrap(), 9999); // 99.985
        assert_eq!(to_minor_units(Decimal::new(99_975, 3)).unwrap(), 9998); // 99.975
        assert_eq!(to_minor_units(Decimal::new(5, 3)).unwrap(), 1); // 0.005
    }

    #[test]
    fn test_signature_roundtrip() {
        let sig = expected_signature(&secret(), "order_abc", "pay_xyz").unwrap();
        assert_eq!(sig.len(), 64);
        assert!(sig.chars().all(|c| c.is_ascii_hexdigit()));
        assert!(verify_signature(&secret(), "order_abc", "pay_xyz", &sig).is_ok());
    }

    #[test]
    fn test_signature_is_deterministic() {
        let a = expected_signature(&secret(), "order_abc", "pay_xyz").unwrap();
        let b = expected_signature(&secret(), "order_abc", "pay_xyz").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_mutated_signature_rejected() {
        let sig = expected_signature(&secret(), "order_abc", "pay_xyz").unwrap();
        let mut mutated = sig.clone();
        let flipped = if sig.starts_with('0') { '1' } else { '0' };
        mutated.replace_range(0..1, &flipped.to_string());
        assert!(matches!(
            verify_signature(&secret(), "order_abc", "pay_xyz", &mutated),
            Err(PaymentError::InvalidSignature)
        ));
    }

    #[test]
    fn test_wrong_references_rejected() {
        let sig = expected_signature(&secret(), "order_abc", "pay_xyz").unwrap();
        assert!(matches!(
            verify_signature(&secret(), "order_other", "pay_xyz", &sig),
            Err(PaymentError::InvalidSignature)
        ));
    }

    #[test]
    fn test_simulated_settlement_verifies() {
        let (payment_ref, sig) = simulated_settlement(&secret(), "sim_order_abc").unwrap();
        assert!(payment_ref.starts_with("sim_pay_"));
        assert!(verify_signature(&secret(), "sim_order_abc", &payment_ref, &sig).is_ok());
    }

    #[test]
    fn test_simulated_settlement_bound_to_order() {
        let (payment_ref, sig) = simulated_settlement(&secret(), "sim_order_abc").unwrap();
        assert!(matches!(
            verify_signature(&secret(), "sim_order_other", &payment_ref, &sig),
            Err(PaymentError::InvalidSignature)
        ));
    }

    #[test]
    fn test_non_hex_signature_rejected() {
        assert!(matches!(
            verify_signature(&secret(), "order_abc", "pay_xyz", "not-hex!"),
            Err(PaymentError::InvalidSignature)
        ));
    }
}
