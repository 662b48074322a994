//! Local key material for a payment-code wallet.
//!
//! [`PcClient`] owns the account-level extended private key and the payment
//! code derived from it. The designated keys that sign notification inputs
//! belong to the surrounding wallet's keystore, reached through the
//! [`KeyStore`] trait.

mod client;
mod keystore;

pub use client::PcClient;
pub use keystore::KeyStore;
