use bitcoin::secp256k1::{PublicKey, SecretKey};
use std::collections::HashMap;

/// Lookup of wallet-held private keys by public key.
///
/// The engine selects and signs notification inputs with ordinary wallet
/// keys; the workflow only needs the private half of the designated key to
/// compute the channel secret. Implementations decide where that key lives.
pub trait KeyStore {
    fn privkey_for(&self, public_key: &PublicKey) -> Option<SecretKey>;
}

impl KeyStore for HashMap<PublicKey, SecretKey> {
    fn privkey_for(&self, public_key: &PublicKey) -> Option<SecretKey> {
        self.get(public_key).copied()
    }
}
