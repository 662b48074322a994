use anyhow::Result;
use bitcoin::secp256k1::PublicKey;
use bitcoin::{Transaction, TxIn, Txid};

use super::{AssembledTx, CoinControl, Recipient};

/// The transaction-construction operations consumed from the surrounding
/// wallet.
///
/// `assemble` may block on I/O (coin selection over the UTXO set).
/// Failures pass through to callers unchanged; in particular a
/// `bdk_coin_select::InsufficientFunds` inside the error chain is
/// recognized and surfaced as such.
pub trait WalletEngine {
    /// Choose inputs and build a transaction paying exactly `outputs`,
    /// plus change as needed.
    fn assemble(&self, outputs: &[Recipient], coin_control: &CoinControl)
        -> Result<AssembledTx>;

    /// Sign, commit and broadcast a previously assembled transaction.
    fn commit(&self, tx: &Transaction) -> Result<Txid>;

    /// The public key that will sign (or has signed) the given input,
    /// as implied by its unlocking script.
    fn signing_key_for(&self, input: &TxIn) -> Result<PublicKey>;
}
