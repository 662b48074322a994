use bitcoin_hashes::{sha256d, Hash};
use secp256k1::PublicKey;
use std::convert::TryFrom;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Length of the binary payment code payload.
pub const PAYLOAD_LENGTH: usize = 80;
/// Number of payload bytes covered by the trailing checksum.
pub const CHECKSUM_OFFSET: usize = 76;

const RESERVED_LENGTH: usize = 10;
const VERSION_V1: u8 = 0x01;

/// Error types for payment code operations.
#[derive(Debug)]
pub enum Error {
    InvalidLength(usize),
    BadChecksum,
    UnsupportedVersion(u8),
    Base58(base58ck::Error),
    Secp256k1(secp256k1::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::InvalidLength(n) => {
                write!(f, "Wrong payload length, expected {}, got {}", PAYLOAD_LENGTH, n)
            }
            Error::BadChecksum => write!(f, "Payload checksum mismatch"),
            Error::UnsupportedVersion(v) => write!(f, "Unsupported version: {}", v),
            Error::Base58(e) => write!(f, "Base58 decode error: {}", e),
            Error::Secp256k1(e) => write!(f, "Secp256k1 error: {}", e),
        }
    }
}

impl std::error::Error for Error {}

impl From<base58ck::Error> for Error {
    fn from(e: base58ck::Error) -> Self {
        Error::Base58(e)
    }
}

impl From<secp256k1::Error> for Error {
    fn from(e: secp256k1::Error) -> Self {
        Error::Secp256k1(e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// A reusable payment code: a public identifier from which a counterparty
/// can derive an unbounded sequence of one-time payment addresses.
///
/// The binary payload is 80 bytes: a version byte, a 33-byte compressed
/// public key, a 32-byte chain code, reserved bytes, and a 4-byte
/// double-SHA256 checksum over everything before it. The text form is the
/// base58-check encoding of that payload.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct PaymentCode {
    version: u8,
    public_key: PublicKey,
    chain_code: [u8; 32],
    reserved: [u8; RESERVED_LENGTH],
}

#[cfg(feature = "serde")]
impl Serialize for PaymentCode {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let encoded: String = (*self).into();
        serializer.serialize_str(&encoded)
    }
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for PaymentCode {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let code_str: String = Deserialize::deserialize(deserializer)?;

        PaymentCode::try_from(code_str.as_str()).map_err(serde::de::Error::custom)
    }
}

impl PaymentCode {
    pub fn new(public_key: PublicKey, chain_code: [u8; 32], version: u8) -> Result<Self> {
        if version != VERSION_V1 {
            return Err(Error::UnsupportedVersion(version));
        }

        Ok(PaymentCode {
            version,
            public_key,
            chain_code,
            reserved: [0u8; RESERVED_LENGTH],
        })
    }

    /// Get the embedded public key.
    pub fn get_public_key(&self) -> PublicKey {
        self.public_key
    }

    /// Get the chain code.
    pub fn get_chain_code(&self) -> [u8; 32] {
        self.chain_code
    }

    /// Get the version byte.
    pub fn get_version(&self) -> u8 {
        self.version
    }

    /// Serialize to the 80-byte binary payload, checksum included.
    pub fn payload(&self) -> [u8; PAYLOAD_LENGTH] {
        let mut payload = [0u8; PAYLOAD_LENGTH];
        payload[0] = self.version;
        payload[1..34].copy_from_slice(&self.public_key.serialize()[..]);
        payload[34..66].copy_from_slice(&self.chain_code);
        payload[66..CHECKSUM_OFFSET].copy_from_slice(&self.reserved);

        let check = checksum(&payload[..CHECKSUM_OFFSET]);
        payload[CHECKSUM_OFFSET..].copy_from_slice(&check);

        payload
    }

    /// Parse an 80-byte binary payload, verifying the trailing checksum.
    pub fn from_payload(payload: &[u8]) -> Result<Self> {
        if payload.len() != PAYLOAD_LENGTH {
            return Err(Error::InvalidLength(payload.len()));
        }

        if checksum(&payload[..CHECKSUM_OFFSET]) != payload[CHECKSUM_OFFSET..] {
            return Err(Error::BadChecksum);
        }

        let version = payload[0];
        if version != VERSION_V1 {
            return Err(Error::UnsupportedVersion(version));
        }

        let public_key = PublicKey::from_slice(&payload[1..34])?;

        let mut chain_code = [0u8; 32];
        chain_code.copy_from_slice(&payload[34..66]);

        let mut reserved = [0u8; RESERVED_LENGTH];
        reserved.copy_from_slice(&payload[66..CHECKSUM_OFFSET]);

        Ok(PaymentCode {
            version,
            public_key,
            chain_code,
            reserved,
        })
    }
}

fn checksum(data: &[u8]) -> [u8; 4] {
    let hash = sha256d::Hash::hash(data);

    let mut check = [0u8; 4];
    check.copy_from_slice(&hash.to_byte_array()[..4]);
    check
}

impl fmt::Display for PaymentCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", <PaymentCode as Into<String>>::into(*self))
    }
}

impl TryFrom<&str> for PaymentCode {
    type Error = Error;

    fn try_from(code: &str) -> Result<Self> {
        let payload = base58ck::decode_check(code)?;

        PaymentCode::from_payload(&payload)
    }
}

impl TryFrom<String> for PaymentCode {
    type Error = Error;

    fn try_from(code: String) -> Result<Self> {
        code.as_str().try_into()
    }
}

impl From<PaymentCode> for String {
    fn from(val: PaymentCode) -> Self {
        base58ck::encode_check(&val.payload())
    }
}
