use bitcoin::Txid;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Whether the one-time notification transaction for a channel has been
/// broadcast. `Sent` is terminal and carries the transaction id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationStatus {
    NotSent,
    Sent { txid: Txid },
}

impl NotificationStatus {
    pub fn is_sent(&self) -> bool {
        matches!(self, NotificationStatus::Sent { .. })
    }
}

/// Channel lifecycle as seen by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelStatus {
    /// No record exists for the counterparty yet.
    Unestablished,
    /// A record exists but the notification transaction has not gone out.
    NotificationPending,
    /// The notification is on chain; payments go to channel addresses.
    Established { outgoing_index: u32 },
}

/// One payment-code counterparty.
///
/// Mutated only through [`ChannelStateStore`](super::ChannelStateStore);
/// callers get short-lived borrows or clones, never long-lived aliases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    payment_code: String,
    label: String,
    notification: NotificationStatus,
    outgoing_index: u32,
    outgoing_addresses: Vec<String>,
}

impl Channel {
    pub(crate) fn new(payment_code: String) -> Self {
        Self {
            payment_code,
            label: String::new(),
            notification: NotificationStatus::NotSent,
            outgoing_index: 0,
            outgoing_addresses: Vec::new(),
        }
    }

    /// The counterparty's encoded payment code; the record's key.
    pub fn payment_code(&self) -> &str {
        &self.payment_code
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn notification(&self) -> NotificationStatus {
        self.notification
    }

    pub fn notification_txid(&self) -> Option<Txid> {
        match self.notification {
            NotificationStatus::NotSent => None,
            NotificationStatus::Sent { txid } => Some(txid),
        }
    }

    /// Next unused channel-address index; always equal to the length of
    /// the outgoing history.
    pub fn outgoing_index(&self) -> u32 {
        self.outgoing_index
    }

    /// Ordered history of addresses already paid on this channel.
    pub fn outgoing_addresses(&self) -> &[String] {
        &self.outgoing_addresses
    }

    pub(crate) fn set_label(&mut self, label: String) {
        self.label = label;
    }

    pub(crate) fn mark_sent(&mut self, txid: Txid) -> Result<()> {
        if self.notification.is_sent() {
            return Err(Error::AlreadyNotified);
        }
        self.notification = NotificationStatus::Sent { txid };

        Ok(())
    }

    /// Append an address and advance the index together, keeping the
    /// index == history-length invariant by construction.
    pub(crate) fn push_outgoing(&mut self, address: String) {
        self.outgoing_addresses.push(address);
        self.outgoing_index = self.outgoing_addresses.len() as u32;
    }

    pub(crate) fn replace_outgoing(&mut self, addresses: Vec<String>) {
        self.outgoing_index = addresses.len() as u32;
        self.outgoing_addresses = addresses;
    }
}

/// Channel mutation events for external subscribers (UI refresh, logging,
/// metrics). Emitted after the mutation has been applied and persisted.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    Created {
        payment_code: String,
    },
    NotificationSent {
        payment_code: String,
        txid: Txid,
    },
    PaymentRecorded {
        payment_code: String,
        address: String,
        index: u32,
    },
    LabelChanged {
        payment_code: String,
    },
}
