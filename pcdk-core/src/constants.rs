//! Protocol constants.

use bitcoin::Amount;

/// Fixed amount paid to the counterparty's notification address by a
/// notification transaction. Large enough to clear dust limits, small
/// enough to be a throwaway bounty.
pub const NOTIFICATION_BOUNTY: Amount = Amount::from_sat(500_000);

/// BIP32 purpose level for payment-code accounts (`m/47'/coin'/account'`).
pub const PURPOSE: u32 = 47;

/// Channel index of the fixed notification key.
pub const NOTIFICATION_INDEX: u32 = 0;

/// Byte length of the mask keystream.
pub const KEYSTREAM_LENGTH: usize = 64;

/// Number of leading payload bytes covered by the blind transform; the
/// reserved/checksum tail passes through unmodified.
pub const BLINDED_PREFIX_LENGTH: usize = 64;
