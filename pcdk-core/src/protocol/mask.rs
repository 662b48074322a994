//! The mask transform hiding a payment code inside a notification output.
//!
//! A keystream is expanded from the ECDH secret and the designated input's
//! outpoint, then XORed over the leading payload bytes. Only the outpoint
//! and each party's designated key appear on chain; without one of the two
//! private keys the masked payload is indistinguishable from random bytes.

use bitcoin::hashes::Hash;
use bitcoin::OutPoint;
use hmac::{Hmac, Mac};
use pc_address::PAYLOAD_LENGTH;
use sha2::Sha512;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::constants::{BLINDED_PREFIX_LENGTH, KEYSTREAM_LENGTH};
use crate::protocol::secret::SecretPoint;

type HmacSha512 = Hmac<Sha512>;

/// A 64-byte pseudorandom stream, deterministic in (secret, outpoint).
/// Wiped when dropped.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct Keystream([u8; KEYSTREAM_LENGTH]);

impl Keystream {
    pub fn as_bytes(&self) -> &[u8; KEYSTREAM_LENGTH] {
        &self.0
    }
}

/// Serialize an outpoint as auxiliary keying material: txid bytes followed
/// by the output index, little-endian.
pub fn outpoint_bytes(outpoint: &OutPoint) -> [u8; 36] {
    let mut bytes = [0u8; 36];
    bytes[..32].copy_from_slice(&outpoint.txid.to_byte_array());
    bytes[32..].copy_from_slice(&outpoint.vout.to_le_bytes());

    bytes
}

/// Expand a shared secret and the designated input's outpoint into the mask
/// keystream: HMAC-SHA512 keyed by the secret over the serialized outpoint.
pub fn keystream(secret: &SecretPoint, outpoint: &OutPoint) -> Keystream {
    let mut mac =
        HmacSha512::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(&outpoint_bytes(outpoint));

    let mut stream = [0u8; KEYSTREAM_LENGTH];
    stream.copy_from_slice(&mac.finalize().into_bytes());

    Keystream(stream)
}

/// Apply the blind transform: XOR the leading payload bytes with the
/// keystream, leaving the reserved/checksum tail untouched.
///
/// Self-inverse: applying the same keystream twice restores the payload.
pub fn blind(payload: &[u8; PAYLOAD_LENGTH], keystream: &Keystream) -> [u8; PAYLOAD_LENGTH] {
    let mut masked = *payload;
    for (byte, mask) in masked[..BLINDED_PREFIX_LENGTH]
        .iter_mut()
        .zip(keystream.0.iter())
    {
        *byte ^= mask;
    }

    masked
}
