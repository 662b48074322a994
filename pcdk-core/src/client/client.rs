use bitcoin::bip32::{ChildNumber, Xpriv, Xpub};
use bitcoin::secp256k1::{Secp256k1, SecretKey};
use bitcoin::{Network, NetworkKind};
use pc_address::PaymentCode;
use serde::{Deserialize, Serialize};

use crate::constants::{NOTIFICATION_INDEX, PURPOSE};
use crate::error::{Error, Result};

/// Local half of a payment-code identity.
///
/// Holds the account-level extended private key at `m/47'/coin'/account'`
/// and the payment code published to counterparties. Channel private keys
/// (the receive side of the protocol) are its non-hardened children; the
/// notification private key is the child at index 0.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct PcClient {
    account_xpriv: Xpriv,
    payment_code: PaymentCode,
    network: Network,
}

impl PcClient {
    pub fn new_from_seed(seed: &[u8], account: u32, network: Network) -> Result<Self> {
        let secp = Secp256k1::new();
        let master_xpriv = Xpriv::new_master(network, seed).map_err(|_| Error::SeedDerivation)?;

        let coin_idx = if NetworkKind::from(network).is_mainnet() {
            0u32
        } else {
            1
        };
        let account_deriv = vec![
            ChildNumber::from_hardened_idx(PURPOSE).expect("47"),
            ChildNumber::from_hardened_idx(coin_idx).expect("0 or 1"),
            ChildNumber::from_hardened_idx(account)
                .map_err(|_| Error::KeyDerivation("account"))?,
        ];

        let account_xpriv = master_xpriv
            .derive_priv(&secp, &account_deriv)
            .map_err(|_| Error::KeyDerivation("account"))?;

        let account_xpub = Xpub::from_priv(&secp, &account_xpriv);
        let payment_code = PaymentCode::new(
            account_xpub.public_key,
            account_xpub.chain_code.to_bytes(),
            0x01,
        )?;

        Ok(Self {
            account_xpriv,
            payment_code,
            network,
        })
    }

    /// The payment code this wallet publishes to counterparties.
    pub fn payment_code(&self) -> &PaymentCode {
        &self.payment_code
    }

    pub fn network(&self) -> Network {
        self.network
    }

    /// Private key for the channel at `index`; the receive-side twin of the
    /// public derivation a sender performs from the payment code.
    pub fn channel_privkey(&self, index: u32) -> Result<SecretKey> {
        let secp = Secp256k1::new();
        let child_number =
            ChildNumber::from_normal_idx(index).map_err(|_| Error::Derivation { index })?;
        let child = self
            .account_xpriv
            .derive_priv(&secp, &[child_number])
            .map_err(|_| Error::Derivation { index })?;

        Ok(child.private_key)
    }

    /// Private key of the fixed notification address, needed to unblind
    /// incoming notification payloads.
    pub fn notification_privkey(&self) -> Result<SecretKey> {
        self.channel_privkey(NOTIFICATION_INDEX)
    }

    /// The account-level extended public key, as a counterparty would
    /// reconstruct it from the payment code.
    pub fn account_xpub(&self) -> Xpub {
        let secp = Secp256k1::new();
        Xpub::from_priv(&secp, &self.account_xpriv)
    }
}
