//! Hierarchical channel key derivation.
//!
//! A payment code embeds the public half of an account-level extended key.
//! Channel addresses are the non-hardened BIP32 children of that key: index
//! 0 is the fixed notification key a counterparty publishes to receive
//! notification transactions, indices 0.. are the per-payment channel
//! addresses.

use bitcoin::bip32::{ChainCode, ChildNumber, Fingerprint, Xpub};
use bitcoin::secp256k1::Secp256k1;
use bitcoin::{Address, CompressedPublicKey, Network, NetworkKind};
use pc_address::PaymentCode;

use crate::constants::NOTIFICATION_INDEX;
use crate::error::{Error, Result};

/// Rebuild the extended public key embedded in a payment code.
///
/// The fingerprint and child number are not carried by the code; only the
/// key and chain code matter for child derivation.
pub fn xpub_for_code(code: &PaymentCode, network: Network) -> Xpub {
    Xpub {
        network: NetworkKind::from(network),
        depth: 3,
        parent_fingerprint: Fingerprint::default(),
        child_number: ChildNumber::Normal { index: 0 },
        public_key: code.get_public_key(),
        chain_code: ChainCode::from(code.get_chain_code()),
    }
}

/// Derive the channel public key at `index`.
///
/// Deterministic: the same extended key and index always produce the same
/// child. A degenerate tweak (negligible probability) is surfaced rather
/// than silently skipped; the channel index must stay in lockstep between
/// both parties, so no retry happens here.
pub fn derive_channel_pubkey(xpub: &Xpub, index: u32) -> Result<CompressedPublicKey> {
    let secp = Secp256k1::new();
    let child_number =
        ChildNumber::from_normal_idx(index).map_err(|_| Error::Derivation { index })?;
    let child = xpub
        .ckd_pub(&secp, child_number)
        .map_err(|_| Error::Derivation { index })?;

    Ok(child.to_pub())
}

/// Derive the single-key address for the channel key at `index`.
pub fn derive_channel_address(xpub: &Xpub, index: u32, network: Network) -> Result<Address> {
    let pubkey = derive_channel_pubkey(xpub, index)?;

    Ok(Address::p2pkh(&pubkey, network))
}

/// The fixed notification key of a payment code (channel index 0).
pub fn notification_pubkey(code: &PaymentCode) -> Result<CompressedPublicKey> {
    // network only affects address encoding, not key derivation
    derive_channel_pubkey(&xpub_for_code(code, Network::Bitcoin), NOTIFICATION_INDEX)
}

/// The fixed rendezvous address a counterparty watches for notification
/// transactions.
pub fn notification_address(code: &PaymentCode, network: Network) -> Result<Address> {
    let pubkey = notification_pubkey(code)?;

    Ok(Address::p2pkh(&pubkey, network))
}
