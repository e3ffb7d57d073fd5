//! Core types for LuxeMarket.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod otp;

pub use email::{Email, EmailError};
pub use id::*;
pub use otp::{OTP_VALIDITY_MINUTES, OtpCode, OtpCodeError};
