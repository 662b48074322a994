use std::collections::BTreeMap;

use bitcoin::Txid;
use pc_address::PaymentCode;

use crate::channel::{Channel, ChannelEvent, ChannelStatus, NotificationStatus};
use crate::error::{Error, Result};
use crate::persist::ChannelPersister;

pub type ChannelSubscriber = Box<dyn Fn(&ChannelEvent) + Send>;

/// Exclusive owner of all channel records, keyed by encoded payment code.
///
/// Every mutation is persisted synchronously before returning. If the
/// persister fails, the in-memory record keeps the new state and the error
/// surfaces as [`Error::Persistence`]; callers retry with [`flush`]
/// (`ChannelStateStore::flush`) rather than repeating the mutation.
pub struct ChannelStateStore<P: ChannelPersister> {
    channels: BTreeMap<String, Channel>,
    persister: P,
    subscribers: Vec<ChannelSubscriber>,
}

impl<P: ChannelPersister> ChannelStateStore<P> {
    /// Load existing channel records from the persister.
    pub fn load(mut persister: P) -> Result<Self> {
        let channels = persister.load().map_err(Error::Persistence)?;

        Ok(Self {
            channels,
            persister,
            subscribers: Vec::new(),
        })
    }

    /// Register a subscriber for channel mutation events.
    pub fn subscribe(&mut self, subscriber: ChannelSubscriber) {
        self.subscribers.push(subscriber);
    }

    pub fn channel(&self, code: &PaymentCode) -> Option<&Channel> {
        self.channels.get(&code.to_string())
    }

    pub fn channels(&self) -> impl Iterator<Item = &Channel> {
        self.channels.values()
    }

    pub fn status(&self, code: &PaymentCode) -> ChannelStatus {
        match self.channel(code) {
            None => ChannelStatus::Unestablished,
            Some(channel) => match channel.notification() {
                NotificationStatus::NotSent => ChannelStatus::NotificationPending,
                NotificationStatus::Sent { .. } => ChannelStatus::Established {
                    outgoing_index: channel.outgoing_index(),
                },
            },
        }
    }

    /// Return the channel for `code`, creating and persisting a fresh
    /// record on first reference.
    pub fn get_or_create(&mut self, code: &PaymentCode) -> Result<&Channel> {
        let key = code.to_string();
        if !self.channels.contains_key(&key) {
            self.channels.insert(key.clone(), Channel::new(key.clone()));
            self.persist()?;
            log::info!("created channel for payment code {key}");
            self.emit(ChannelEvent::Created {
                payment_code: key.clone(),
            });
        }

        Ok(self.channels.get(&key).expect("present or just inserted"))
    }

    /// Transition the channel to `Sent`, recording the notification txid.
    /// Must only be called after the engine reports a successful commit.
    pub fn mark_notification_sent(&mut self, code: &PaymentCode, txid: Txid) -> Result<()> {
        let key = code.to_string();
        let channel = self
            .channels
            .get_mut(&key)
            .ok_or_else(|| Error::UnknownChannel(key.clone()))?;
        channel.mark_sent(txid)?;
        self.persist()?;

        log::info!("notification for {key} sent in {txid}");
        self.emit(ChannelEvent::NotificationSent {
            payment_code: key,
            txid,
        });

        Ok(())
    }

    /// Append a paid address to the channel history and advance the index.
    /// Must only be called after the engine reports a successful commit, so
    /// the index never advances for a transaction that never broadcast.
    pub fn record_outgoing_payment(&mut self, code: &PaymentCode, address: &str) -> Result<()> {
        let key = code.to_string();
        let channel = self
            .channels
            .get_mut(&key)
            .ok_or_else(|| Error::UnknownChannel(key.clone()))?;
        channel.push_outgoing(address.to_string());
        let index = channel.outgoing_index() - 1;
        self.persist()?;

        self.emit(ChannelEvent::PaymentRecorded {
            payment_code: key,
            address: address.to_string(),
            index,
        });

        Ok(())
    }

    pub fn set_label(&mut self, code: &PaymentCode, label: &str) -> Result<()> {
        let key = code.to_string();
        let channel = self
            .channels
            .get_mut(&key)
            .ok_or_else(|| Error::UnknownChannel(key.clone()))?;
        channel.set_label(label.to_string());
        self.persist()?;

        self.emit(ChannelEvent::LabelChanged { payment_code: key });

        Ok(())
    }

    /// Reconcile the outgoing history against chain data after a crash
    /// between broadcast and persistence.
    ///
    /// `addresses` is the full ordered list of this wallet's payments to
    /// the channel as observed on chain. The stored history must be a
    /// prefix of it; the record is fast-forwarded so that the index equals
    /// the count of actually-broadcast payments.
    pub fn restore_outgoing_history(
        &mut self,
        code: &PaymentCode,
        addresses: Vec<String>,
    ) -> Result<()> {
        let key = code.to_string();
        let channel = self
            .channels
            .get_mut(&key)
            .ok_or_else(|| Error::UnknownChannel(key.clone()))?;

        if !addresses.starts_with(channel.outgoing_addresses()) {
            return Err(Error::HistoryMismatch);
        }

        let recovered = addresses.len() - channel.outgoing_addresses().len();
        channel.replace_outgoing(addresses);
        self.persist()?;

        if recovered > 0 {
            log::info!("recovered {recovered} outgoing payment(s) for {key}");
        }

        Ok(())
    }

    /// Retry persistence alone, after a mutation succeeded in memory but
    /// its synchronous persist failed.
    pub fn flush(&mut self) -> Result<()> {
        self.persist()
    }

    fn persist(&mut self) -> Result<()> {
        self.persister
            .persist(&self.channels)
            .map_err(Error::Persistence)
    }

    fn emit(&self, event: ChannelEvent) {
        for subscriber in &self.subscribers {
            subscriber(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::DummyPersister;
    use bitcoin::hashes::Hash;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Counts persist calls and fails on demand.
    #[derive(Default, Clone)]
    struct CountingPersister {
        persists: Arc<AtomicUsize>,
        fail: Arc<AtomicBool>,
    }

    impl ChannelPersister for CountingPersister {
        fn load(&mut self) -> anyhow::Result<BTreeMap<String, Channel>> {
            Ok(BTreeMap::new())
        }

        fn persist(&mut self, _channels: &BTreeMap<String, Channel>) -> anyhow::Result<()> {
            if self.fail.load(Ordering::Relaxed) {
                anyhow::bail!("disk unavailable");
            }
            self.persists.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }
    }

    fn test_code(seed_byte: u8) -> PaymentCode {
        use bitcoin::bip32::{Xpriv, Xpub};
        use bitcoin::secp256k1::Secp256k1;

        let secp = Secp256k1::new();
        let xpriv = Xpriv::new_master(bitcoin::Network::Regtest, &[seed_byte; 64]).unwrap();
        let xpub = Xpub::from_priv(&secp, &xpriv);

        PaymentCode::new(xpub.public_key, xpub.chain_code.to_bytes(), 0x01).unwrap()
    }

    fn txid(tag: u8) -> Txid {
        Txid::from_byte_array([tag; 32])
    }

    #[test]
    fn get_or_create_is_idempotent() {
        let mut store = ChannelStateStore::load(DummyPersister::new()).unwrap();
        let code = test_code(1);

        assert_eq!(store.status(&code), ChannelStatus::Unestablished);

        let created = store.get_or_create(&code).unwrap().clone();
        assert_eq!(created.payment_code(), code.to_string());
        assert_eq!(store.status(&code), ChannelStatus::NotificationPending);

        let again = store.get_or_create(&code).unwrap().clone();
        assert_eq!(created, again);
        assert_eq!(store.channels().count(), 1);
    }

    #[test]
    fn notification_transitions_exactly_once() {
        let mut store = ChannelStateStore::load(DummyPersister::new()).unwrap();
        let code = test_code(1);
        store.get_or_create(&code).unwrap();

        store.mark_notification_sent(&code, txid(7)).unwrap();
        assert_eq!(
            store.status(&code),
            ChannelStatus::Established { outgoing_index: 0 }
        );
        assert_eq!(store.channel(&code).unwrap().notification_txid(), Some(txid(7)));

        assert!(matches!(
            store.mark_notification_sent(&code, txid(8)),
            Err(Error::AlreadyNotified)
        ));
        // the first txid stays
        assert_eq!(store.channel(&code).unwrap().notification_txid(), Some(txid(7)));
    }

    #[test]
    fn unknown_channel_is_reported() {
        let mut store = ChannelStateStore::load(DummyPersister::new()).unwrap();
        let code = test_code(1);

        assert!(matches!(
            store.mark_notification_sent(&code, txid(1)),
            Err(Error::UnknownChannel(_))
        ));
        assert!(matches!(
            store.record_outgoing_payment(&code, "addr"),
            Err(Error::UnknownChannel(_))
        ));
    }

    #[test]
    fn outgoing_index_tracks_history() {
        let mut store = ChannelStateStore::load(DummyPersister::new()).unwrap();
        let code = test_code(1);
        store.get_or_create(&code).unwrap();
        store.mark_notification_sent(&code, txid(1)).unwrap();

        for n in 0..5u32 {
            store
                .record_outgoing_payment(&code, &format!("addr-{n}"))
                .unwrap();
        }

        let channel = store.channel(&code).unwrap();
        assert_eq!(channel.outgoing_index(), 5);
        assert_eq!(channel.outgoing_addresses().len(), 5);

        let mut unique = channel.outgoing_addresses().to_vec();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), 5);
    }

    #[test]
    fn every_mutation_persists() {
        let persister = CountingPersister::default();
        let persists = persister.persists.clone();
        let mut store = ChannelStateStore::load(persister).unwrap();
        let code = test_code(1);

        store.get_or_create(&code).unwrap();
        assert_eq!(persists.load(Ordering::Relaxed), 1);

        store.mark_notification_sent(&code, txid(1)).unwrap();
        assert_eq!(persists.load(Ordering::Relaxed), 2);

        store.record_outgoing_payment(&code, "addr-0").unwrap();
        assert_eq!(persists.load(Ordering::Relaxed), 3);

        store.set_label(&code, "alice").unwrap();
        assert_eq!(persists.load(Ordering::Relaxed), 4);

        // reads persist nothing
        store.status(&code);
        store.channel(&code);
        assert_eq!(persists.load(Ordering::Relaxed), 4);
    }

    #[test]
    fn persist_failure_keeps_memory_state_and_flush_retries() {
        let persister = CountingPersister::default();
        let fail = persister.fail.clone();
        let mut store = ChannelStateStore::load(persister).unwrap();
        let code = test_code(1);
        store.get_or_create(&code).unwrap();
        store.mark_notification_sent(&code, txid(1)).unwrap();

        fail.store(true, Ordering::Relaxed);
        assert!(matches!(
            store.record_outgoing_payment(&code, "addr-0"),
            Err(Error::Persistence(_))
        ));
        // memory already advanced; retry is persistence-only
        assert_eq!(store.channel(&code).unwrap().outgoing_index(), 1);

        fail.store(false, Ordering::Relaxed);
        store.flush().unwrap();
        assert_eq!(store.channel(&code).unwrap().outgoing_index(), 1);
    }

    #[test]
    fn restore_fast_forwards_a_stale_history() {
        let mut store = ChannelStateStore::load(DummyPersister::new()).unwrap();
        let code = test_code(1);
        store.get_or_create(&code).unwrap();
        store.mark_notification_sent(&code, txid(1)).unwrap();
        store.record_outgoing_payment(&code, "addr-0").unwrap();

        // chain shows one more payment than we managed to persist
        store
            .restore_outgoing_history(
                &code,
                vec!["addr-0".to_string(), "addr-1".to_string()],
            )
            .unwrap();

        let channel = store.channel(&code).unwrap();
        assert_eq!(channel.outgoing_index(), 2);
        assert_eq!(channel.outgoing_addresses(), ["addr-0", "addr-1"]);
    }

    #[test]
    fn restore_rejects_a_diverged_history() {
        let mut store = ChannelStateStore::load(DummyPersister::new()).unwrap();
        let code = test_code(1);
        store.get_or_create(&code).unwrap();
        store.mark_notification_sent(&code, txid(1)).unwrap();
        store.record_outgoing_payment(&code, "addr-0").unwrap();

        assert!(matches!(
            store.restore_outgoing_history(&code, vec!["other".to_string()]),
            Err(Error::HistoryMismatch)
        ));
        // record untouched
        assert_eq!(store.channel(&code).unwrap().outgoing_addresses(), ["addr-0"]);
    }

    #[test]
    fn subscribers_observe_mutations() {
        use std::sync::Mutex;

        let events: Arc<Mutex<Vec<ChannelEvent>>> = Arc::default();
        let sink = events.clone();

        let mut store = ChannelStateStore::load(DummyPersister::new()).unwrap();
        store.subscribe(Box::new(move |event| {
            sink.lock().unwrap().push(event.clone());
        }));

        let code = test_code(1);
        store.get_or_create(&code).unwrap();
        store.mark_notification_sent(&code, txid(3)).unwrap();
        store.record_outgoing_payment(&code, "addr-0").unwrap();

        let expected_txid = txid(3);
        let seen = events.lock().unwrap();
        assert_eq!(seen.len(), 3);
        assert!(matches!(seen[0], ChannelEvent::Created { .. }));
        assert!(
            matches!(seen[1], ChannelEvent::NotificationSent { txid, .. } if txid == expected_txid)
        );
        assert!(matches!(
            seen[2],
            ChannelEvent::PaymentRecorded { index: 0, .. }
        ));
    }
}
