//! The wallet transaction engine seam.
//!
//! Coin selection, fee computation, signing and broadcast belong to the
//! surrounding wallet. This module defines the three operations the
//! payment-code workflow consumes from it, and nothing more.

mod engine;
mod structs;

pub use engine::WalletEngine;
pub use structs::{AssembledTx, CoinControl, Recipient};
