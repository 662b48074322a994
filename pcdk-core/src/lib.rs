//! Payment-code channel protocol kit.
//!
//! Two parties who know only each other's static payment code can derive an
//! unbounded sequence of one-time receiving addresses, bootstrapped by a
//! single on-chain notification transaction that carries the sender's code
//! blinded inside a data-carrier output.
//!
//! The kit covers the protocol core: payment-code parsing (via
//! [`pc_address`]), channel key derivation, ECDH secret points, the mask
//! transform, per-counterparty channel state and the notification workflow.
//! Transaction construction, signing and broadcast stay behind the
//! [`WalletEngine`] trait; persistence stays behind [`ChannelPersister`].

mod channel;
mod client;
mod engine;
mod error;
mod persist;
mod wallet;

pub mod constants;
pub mod protocol;

pub use bdk_coin_select::FeeRate;
pub use bitcoin;
pub use pc_address::{self, PaymentCode};

pub use channel::{
    Channel, ChannelEvent, ChannelStateStore, ChannelStatus, ChannelSubscriber, NotificationStatus,
};
pub use client::{KeyStore, PcClient};
pub use engine::{AssembledTx, CoinControl, Recipient, WalletEngine};
pub use error::{Error, Result};
pub use persist::{ChannelPersister, DummyPersister, JsonFilePersister};
pub use wallet::PcWallet;
