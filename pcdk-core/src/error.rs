use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    // Payment code validation
    #[error("invalid payment code: {0}")]
    InvalidFormat(#[from] pc_address::Error),

    // Client creation
    #[error("failed to generate master key from seed")]
    SeedDerivation,
    #[error("failed to derive {0} key")]
    KeyDerivation(&'static str),

    // Channel key derivation
    #[error("child key derivation failed at index {index}")]
    Derivation { index: u32 },

    // ECDH
    #[error("malformed key material for shared secret computation")]
    Key,

    // Notification workflow
    #[error("assembled transaction has no inputs")]
    NoInputs,
    #[error("designated input changed after adding the blinded output")]
    NotificationVerification,
    #[error("no designated public key exposed by the first input")]
    MissingDesignatedKey,
    #[error("no data-carrier output with a payment code payload")]
    MissingPayload,

    // Channel state
    #[error("no channel for payment code {0}")]
    UnknownChannel(String),
    #[error("notification transaction already sent for this channel")]
    AlreadyNotified,
    #[error("on-chain history does not extend the stored outgoing history")]
    HistoryMismatch,
    #[error("channel persistence failed: {0}")]
    Persistence(anyhow::Error),

    // Wrapped external errors
    #[error(transparent)]
    CoinSelection(#[from] bdk_coin_select::InsufficientFunds),
    #[error(transparent)]
    Bip32(#[from] bitcoin::bip32::Error),
    #[error(transparent)]
    Secp256k1(#[from] bitcoin::secp256k1::Error),

    // Engine pass-through: assembly and broadcast failures surface unchanged
    #[error("wallet engine error: {0}")]
    Engine(anyhow::Error),
}

impl Error {
    /// Wrap an engine failure, unboxing a coin-selection shortfall so callers
    /// can match on it directly.
    pub(crate) fn from_engine(e: anyhow::Error) -> Self {
        match e.downcast::<bdk_coin_select::InsufficientFunds>() {
            Ok(insufficient) => Error::CoinSelection(insufficient),
            Err(other) => Error::Engine(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
