//! The payment-code wallet context and notification workflow.
//!
//! [`PcWallet`] ties the pieces together: local key material, the external
//! transaction engine, the wallet keystore and the channel store. It owns
//! the two send paths, first contact (notification transaction with a
//! blinded payload) and established channel (plain payment to the next
//! channel address), and the state machine between them:
//!
//! ```text
//! Unestablished -> NotificationPending -> Established
//! ```
//!
//! All channel-affecting work for one wallet runs under a single coarse
//! lock, so no two sends (or a send and a balance poll) interleave.
//! `Established` is terminal for the notification dimension; the outgoing
//! index keeps advancing independently afterwards.

use std::convert::TryFrom;
use std::sync::{Mutex, MutexGuard};

use bitcoin::{Address, Amount, Transaction, Txid};
use pc_address::PaymentCode;

use crate::channel::{Channel, ChannelStateStore, ChannelStatus, ChannelSubscriber};
use crate::client::{KeyStore, PcClient};
use crate::constants::NOTIFICATION_BOUNTY;
use crate::engine::{CoinControl, Recipient, WalletEngine};
use crate::error::{Error, Result};
use crate::persist::ChannelPersister;
use crate::protocol::{derivation, mask, notification, secret};

pub struct PcWallet<E, K, P>
where
    E: WalletEngine,
    K: KeyStore,
    P: ChannelPersister,
{
    client: PcClient,
    engine: E,
    keys: K,
    coin_control: CoinControl,
    state: Mutex<ChannelStateStore<P>>,
}

impl<E, K, P> PcWallet<E, K, P>
where
    E: WalletEngine,
    K: KeyStore,
    P: ChannelPersister,
{
    pub fn new(client: PcClient, engine: E, keys: K, persister: P) -> Result<Self> {
        Ok(Self {
            client,
            engine,
            keys,
            coin_control: CoinControl::default(),
            state: Mutex::new(ChannelStateStore::load(persister)?),
        })
    }

    pub fn with_coin_control(mut self, coin_control: CoinControl) -> Self {
        self.coin_control = coin_control;
        self
    }

    /// The payment code this wallet publishes.
    pub fn payment_code(&self) -> &PaymentCode {
        self.client.payment_code()
    }

    /// Register a subscriber for channel mutation events.
    pub fn subscribe(&self, subscriber: ChannelSubscriber) {
        self.lock_state().subscribe(subscriber);
    }

    /// Send to a counterparty identified by its payment code.
    ///
    /// First contact broadcasts the notification transaction: a fixed
    /// bounty to the counterparty's notification address plus this
    /// wallet's own payment code, blinded, in a data-carrier output. The
    /// requested amount is delivered by the next send, once the channel is
    /// established and an address can be derived for it.
    pub fn send_to_payment_code(&self, code_text: &str, amount: Amount) -> Result<Txid> {
        // reject malformed codes before touching any state
        let code = PaymentCode::try_from(code_text)?;

        let mut state = self.lock_state();
        match state.status(&code) {
            ChannelStatus::Established { outgoing_index } => {
                self.send_established(&mut state, &code, amount, outgoing_index)
            }
            _ => self.send_notification(&mut state, &code),
        }
    }

    /// Current lifecycle position of the channel towards `code_text`.
    pub fn channel_status(&self, code_text: &str) -> Result<ChannelStatus> {
        let code = PaymentCode::try_from(code_text)?;

        Ok(self.lock_state().status(&code))
    }

    /// The channel address the next established-path send will pay.
    pub fn next_outgoing_address(&self, code_text: &str) -> Result<Address> {
        let code = PaymentCode::try_from(code_text)?;
        let index = match self.lock_state().status(&code) {
            ChannelStatus::Established { outgoing_index } => outgoing_index,
            _ => 0,
        };

        let xpub = derivation::xpub_for_code(&code, self.client.network());
        derivation::derive_channel_address(&xpub, index, self.client.network())
    }

    /// Snapshot of all known channels.
    pub fn channels(&self) -> Vec<Channel> {
        self.lock_state().channels().cloned().collect()
    }

    pub fn set_channel_label(&self, code_text: &str, label: &str) -> Result<()> {
        let code = PaymentCode::try_from(code_text)?;

        let mut state = self.lock_state();
        state.get_or_create(&code)?;
        state.set_label(&code, label)
    }

    /// Recover the sender's payment code from a received notification
    /// transaction.
    pub fn read_notification(&self, tx: &Transaction) -> Result<PaymentCode> {
        let notification_sk = self.client.notification_privkey()?;

        notification::extract_payment_code(tx, &notification_sk)
    }

    /// Reconcile a channel's outgoing history against chain data, after a
    /// crash between broadcast and persistence.
    pub fn restore_outgoing_history(
        &self,
        code_text: &str,
        addresses: Vec<String>,
    ) -> Result<()> {
        let code = PaymentCode::try_from(code_text)?;

        self.lock_state().restore_outgoing_history(&code, addresses)
    }

    /// Retry channel persistence after a failed synchronous persist.
    pub fn flush(&self) -> Result<()> {
        self.lock_state().flush()
    }

    fn lock_state(&self) -> MutexGuard<'_, ChannelStateStore<P>> {
        self.state.lock().expect("channel state lock poisoned")
    }

    /// First-contact path: build, verify and broadcast the notification
    /// transaction, then mark the channel sent.
    fn send_notification(
        &self,
        state: &mut ChannelStateStore<P>,
        code: &PaymentCode,
    ) -> Result<Txid> {
        state.get_or_create(code)?;

        let network = self.client.network();
        let notification_pk = derivation::notification_pubkey(code)?;
        let notification_addr = derivation::notification_address(code, network)?;
        log::info!("building notification transaction for {code}");

        let mut outputs = vec![Recipient::to_address(&notification_addr, NOTIFICATION_BOUNTY)];
        let draft = self
            .engine
            .assemble(&outputs, &self.coin_control)
            .map_err(Error::from_engine)?;

        // the first input's signing key doubles as the channel's designated
        // key; its private half must be ours
        let first = draft.tx.input.first().ok_or(Error::NoInputs)?;
        let designated_outpoint = first.previous_output;
        let designated_pk = self
            .engine
            .signing_key_for(first)
            .map_err(Error::from_engine)?;
        let designated_sk = self.keys.privkey_for(&designated_pk).ok_or(Error::Key)?;

        let shared = secret::secret_point(&designated_sk, &notification_pk.0)?;
        let stream = mask::keystream(&shared, &designated_outpoint);
        let blinded = mask::blind(&self.client.payment_code().payload(), &stream);
        log::debug!("blinded payload: {}", hex::encode(blinded));

        outputs.push(Recipient::data_carrier(notification::data_carrier_script(
            &blinded,
        )));

        // adding the output can change fees and input selection, so
        // assemble again and prove the designated input survived; a changed
        // key or outpoint would leave the payload blinded for nobody
        let rebuilt = self
            .engine
            .assemble(&outputs, &self.coin_control)
            .map_err(Error::from_engine)?;
        let first = rebuilt.tx.input.first().ok_or(Error::NoInputs)?;
        let resigned_pk = self
            .engine
            .signing_key_for(first)
            .map_err(Error::from_engine)?;
        if resigned_pk != designated_pk
            || first.previous_output != designated_outpoint
            || self.keys.privkey_for(&resigned_pk).is_none()
        {
            log::warn!("designated input changed during rebuild, discarding transaction");
            return Err(Error::NotificationVerification);
        }

        let txid = self
            .engine
            .commit(&rebuilt.tx)
            .map_err(Error::from_engine)?;

        // broadcast happened; from here the only obligation is persistence
        match state.mark_notification_sent(code, txid) {
            Ok(()) => {}
            Err(Error::AlreadyNotified) => {
                log::debug!("channel for {code} already marked sent");
            }
            Err(e) => return Err(e),
        }

        Ok(txid)
    }

    /// Established path: pay the channel address at the current index and
    /// advance the history.
    fn send_established(
        &self,
        state: &mut ChannelStateStore<P>,
        code: &PaymentCode,
        amount: Amount,
        index: u32,
    ) -> Result<Txid> {
        let network = self.client.network();
        let xpub = derivation::xpub_for_code(code, network);
        let address = derivation::derive_channel_address(&xpub, index, network)?;
        log::info!("paying channel address {index} of {code}");

        let outputs = vec![Recipient::to_address(&address, amount)];
        let assembled = self
            .engine
            .assemble(&outputs, &self.coin_control)
            .map_err(Error::from_engine)?;
        let txid = self
            .engine
            .commit(&assembled.tx)
            .map_err(Error::from_engine)?;

        // index advances only after the engine reports the commit
        state.record_outgoing_payment(code, &address.to_string())?;

        Ok(txid)
    }
}
