//! ECDH secret points.
//!
//! The cryptographic premise of the whole protocol: one party's private key
//! multiplied into the other party's public key yields the same curve point
//! as the reverse pairing, so both sides arrive at an identical secret from
//! asymmetric inputs without further communication.

use bitcoin::secp256k1::{PublicKey, Scalar, Secp256k1, SecretKey};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{Error, Result};

/// The x-coordinate of an ECDH scalar multiplication, reduced to canonical
/// 32-byte big-endian form.
///
/// Ephemeral by design: lives only for the duration of one notification
/// build and is wiped when dropped.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SecretPoint([u8; 32]);

impl SecretPoint {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    #[cfg(test)]
    pub(crate) fn from_raw(bytes: [u8; 32]) -> Self {
        SecretPoint(bytes)
    }
}

/// Compute the shared secret point between a private key and a counterpart
/// public key.
///
/// Symmetric: `secret_point(a, B) == secret_point(b, A)` for any two
/// keypairs `(a, A)` and `(b, B)` on the curve.
pub fn secret_point(secret_key: &SecretKey, public_key: &PublicKey) -> Result<SecretPoint> {
    let secp = Secp256k1::new();
    let point = public_key
        .mul_tweak(&secp, &Scalar::from(*secret_key))
        .map_err(|_| Error::Key)?;

    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&point.serialize()[1..]);

    Ok(SecretPoint(bytes))
}

/// As [`secret_point`], parsing raw key material first. Fails with
/// [`Error::Key`] if either side is malformed or off-curve.
pub fn secret_point_from_bytes(secret_key: &[u8], public_key: &[u8]) -> Result<SecretPoint> {
    let sk = SecretKey::from_slice(secret_key).map_err(|_| Error::Key)?;
    let pk = PublicKey::from_slice(public_key).map_err(|_| Error::Key)?;

    secret_point(&sk, &pk)
}

#[cfg(test)]
#[allow(non_upper_case_globals)]
mod tests {
    use super::*;

    // BIP47 reference test vectors: Alice's child key 0 against Bob's child
    // keys 0..2. Secret points are the x-coordinates only, which is how the
    // vectors were originally published.
    const ALICE_a0: &str = "8d6a8ecd8ee5e0042ad0cb56e3a971c760b5145c3917a8e7beaf0ed92d7a520c";
    const ALICE_A0: &str = "0353883a146a23f988e0f381a9507cbdb3e3130cd81b3ce26daf2af088724ce683";

    const BOB_b0: &str = "04448fd1be0c9c13a5ca0b530e464b619dc091b299b98c5cab9978b32b4a1b8b";
    const BOB_B0: &str = "024ce8e3b04ea205ff49f529950616c3db615b1e37753858cc60c1ce64d17e2ad8";
    const BOB_b1: &str = "6bfa917e4c44349bfdf46346d389bf73a18cec6bc544ce9f337e14721f06107b";
    const BOB_B1: &str = "03e092e58581cf950ff9c8fc64395471733e13f97dedac0044ebd7d60ccc1eea4d";
    const BOB_b2: &str = "46d32fbee043d8ee176fe85a18da92557ee00b189b533fce2340e4745c4b7b8c";
    const BOB_B2: &str = "029b5f290ef2f98a0462ec691f5cc3ae939325f7577fcaf06cfc3b8fc249402156";

    const SECRET_POINT_0: &str = "f5bb84706ee366052471e6139e6a9a969d586e5fe6471a9b96c3d8caefe86fef";
    const SECRET_POINT_1: &str = "adfb9b18ee1c4460852806a8780802096d67a8c1766222598dc801076beb0b4d";
    const SECRET_POINT_2: &str = "79e860c3eb885723bb5a1d54e5cecb7df5dc33b1d56802906762622fa3c18ee5";

    fn from_hex(hex: &str) -> Vec<u8> {
        (0..hex.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).unwrap())
            .collect()
    }

    #[test]
    fn reference_vectors_sender_side() {
        for (pk, expected) in [
            (BOB_B0, SECRET_POINT_0),
            (BOB_B1, SECRET_POINT_1),
            (BOB_B2, SECRET_POINT_2),
        ] {
            let point = secret_point_from_bytes(&from_hex(ALICE_a0), &from_hex(pk)).unwrap();
            assert_eq!(hex::encode(point.as_bytes()), expected);
        }
    }

    #[test]
    fn reference_vectors_receiver_side() {
        for (sk, expected) in [
            (BOB_b0, SECRET_POINT_0),
            (BOB_b1, SECRET_POINT_1),
            (BOB_b2, SECRET_POINT_2),
        ] {
            let point = secret_point_from_bytes(&from_hex(sk), &from_hex(ALICE_A0)).unwrap();
            assert_eq!(hex::encode(point.as_bytes()), expected);
        }
    }

    #[test]
    fn symmetry_for_arbitrary_keypairs() {
        let secp = Secp256k1::new();

        for (a_bytes, b_bytes) in [([0x11u8; 32], [0x22u8; 32]), ([0x5au8; 32], [0xc3u8; 32])] {
            let a = SecretKey::from_slice(&a_bytes).unwrap();
            let b = SecretKey::from_slice(&b_bytes).unwrap();
            let pub_a = PublicKey::from_secret_key(&secp, &a);
            let pub_b = PublicKey::from_secret_key(&secp, &b);

            let ab = secret_point(&a, &pub_b).unwrap();
            let ba = secret_point(&b, &pub_a).unwrap();

            assert_eq!(ab.as_bytes(), ba.as_bytes());
        }
    }

    #[test]
    fn malformed_material_is_a_key_error() {
        let valid_pk = from_hex(BOB_B0);

        // zero scalar is outside the valid range
        assert!(matches!(
            secret_point_from_bytes(&[0u8; 32], &valid_pk),
            Err(Error::Key)
        ));
        // truncated private key
        assert!(matches!(
            secret_point_from_bytes(&[1u8; 31], &valid_pk),
            Err(Error::Key)
        ));
        // invalid compression tag
        let mut bad_tag = valid_pk.clone();
        bad_tag[0] = 0x05;
        assert!(matches!(
            secret_point_from_bytes(&from_hex(ALICE_a0), &bad_tag),
            Err(Error::Key)
        ));
    }
}
