//! Embedding and recovering the blinded payload of a notification
//! transaction.
//!
//! The sender places its own payment code, masked with the channel
//! keystream, in a zero-value data-carrier output. The receiver finds the
//! designated public key exposed by the transaction's unlocking data,
//! reconstructs the same keystream with its notification private key, and
//! unmasks the payload.

use bitcoin::script::Instruction;
use bitcoin::secp256k1::{PublicKey, SecretKey};
use bitcoin::{OutPoint, ScriptBuf, Transaction};
use pc_address::{PaymentCode, PAYLOAD_LENGTH};

use crate::error::{Error, Result};
use crate::protocol::mask::{blind, keystream};
use crate::protocol::secret::secret_point;

// OP_RETURN OP_PUSHDATA1 0x50: an 80-byte push needs the explicit length
// form, which the push-bytes builder caps below.
const DATA_CARRIER_PREFIX: [u8; 3] = [0x6a, 0x4c, 0x50];

/// Build the zero-value data-carrier script holding a blinded payload.
pub fn data_carrier_script(blinded: &[u8; PAYLOAD_LENGTH]) -> ScriptBuf {
    let mut script_bytes = DATA_CARRIER_PREFIX.to_vec();
    script_bytes.extend_from_slice(blinded);

    ScriptBuf::from(script_bytes)
}

/// Find the designated public key and spent outpoint: the first input whose
/// scriptSig or witness exposes a parseable public key.
pub fn find_designated(tx: &Transaction) -> Option<(PublicKey, OutPoint)> {
    let from_script_sig = tx.input.iter().find_map(|tx_in| {
        tx_in
            .script_sig
            .instructions()
            .find_map(|instruction| match instruction {
                Ok(Instruction::PushBytes(bytes)) => PublicKey::from_slice(bytes.as_bytes()).ok(),
                _ => None,
            })
            .map(|pk| (pk, tx_in.previous_output))
    });

    from_script_sig.or_else(|| {
        tx.input.iter().find_map(|tx_in| {
            tx_in
                .witness
                .iter()
                .find_map(|item| PublicKey::from_slice(item).ok())
                .map(|pk| (pk, tx_in.previous_output))
        })
    })
}

/// Pull the 80-byte blinded payload out of a transaction's data-carrier
/// output, if present.
pub fn blinded_payload(tx: &Transaction) -> Option<[u8; PAYLOAD_LENGTH]> {
    tx.output.iter().find_map(|out| {
        if !out.script_pubkey.is_op_return() {
            return None;
        }

        match out.script_pubkey.instructions().nth(1) {
            Some(Ok(Instruction::PushBytes(data))) if data.len() == PAYLOAD_LENGTH => {
                let mut payload = [0u8; PAYLOAD_LENGTH];
                payload.copy_from_slice(data.as_bytes());
                Some(payload)
            }
            _ => None,
        }
    })
}

/// Recover the sender's payment code from a received notification
/// transaction, given the receiver's notification private key.
pub fn extract_payment_code(
    tx: &Transaction,
    notification_sk: &SecretKey,
) -> Result<PaymentCode> {
    if tx.input.is_empty() {
        return Err(Error::NoInputs);
    }

    let (designated, outpoint) = find_designated(tx).ok_or(Error::MissingDesignatedKey)?;
    let payload = blinded_payload(tx).ok_or(Error::MissingPayload)?;

    let secret = secret_point(notification_sk, &designated)?;
    let stream = keystream(&secret, &outpoint);
    let clear = blind(&payload, &stream);

    Ok(PaymentCode::from_payload(&clear)?)
}
