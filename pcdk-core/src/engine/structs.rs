use bdk_coin_select::FeeRate;
use bitcoin::{Address, Amount, OutPoint, ScriptBuf};

/// One requested output of a transaction to assemble.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    pub script_pubkey: ScriptBuf,
    pub amount: Amount,
}

impl Recipient {
    pub fn to_address(address: &Address, amount: Amount) -> Self {
        Self {
            script_pubkey: address.script_pubkey(),
            amount,
        }
    }

    /// A zero-value, unspendable data-carrier output.
    pub fn data_carrier(script_pubkey: ScriptBuf) -> Self {
        Self {
            script_pubkey,
            amount: Amount::ZERO,
        }
    }
}

/// Coin-selection constraints handed through to the engine.
#[derive(Debug, Clone)]
pub struct CoinControl {
    pub fee_rate: FeeRate,
    /// Outpoints the engine must spend from, if any.
    pub selected: Vec<OutPoint>,
}

impl Default for CoinControl {
    fn default() -> Self {
        Self {
            fee_rate: FeeRate::from_sat_per_vb(1.0),
            selected: Vec::new(),
        }
    }
}

/// A transaction the engine has assembled but not yet committed.
#[derive(Debug, Clone)]
pub struct AssembledTx {
    pub tx: bitcoin::Transaction,
    pub fee: Amount,
    /// Position of the change output, if the engine added one.
    pub change_index: Option<usize>,
}
