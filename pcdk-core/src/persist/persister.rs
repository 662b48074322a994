use std::collections::BTreeMap;

use crate::channel::Channel;

/// Trait for persisting channel records.
///
/// `persist` is called synchronously after every channel mutation and must
/// not return until the records are durable; a failure leaves the
/// in-memory state ahead of storage, which callers resolve by retrying
/// [`ChannelStateStore::flush`](crate::ChannelStateStore::flush).
pub trait ChannelPersister {
    /// Load all channel records from storage.
    fn load(&mut self) -> anyhow::Result<BTreeMap<String, Channel>>;

    /// Write the full channel map to storage.
    fn persist(&mut self, channels: &BTreeMap<String, Channel>) -> anyhow::Result<()>;
}
