//! Payment-code protocol primitives.
//!
//! Pure, non-blocking building blocks for payment-code channels:
//!
//! - [`derivation`] - Channel child keys and addresses from a payment code
//! - [`secret`] - ECDH secret points between channel counterparties
//! - [`mask`] - Keystream expansion and the blind/unblind transform
//! - [`notification`] - Notification payload embedding and extraction
//!
//! Everything here is a deterministic function of its inputs and safe to
//! compute outside any wallet lock.

pub mod derivation;
pub mod mask;
pub mod notification;
pub mod secret;

pub use mask::Keystream;
pub use secret::SecretPoint;
