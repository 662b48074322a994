use std::collections::BTreeMap;

use super::ChannelPersister;
use crate::channel::Channel;

/// Persister that stores nothing. For tests and ephemeral wallets.
#[derive(Default)]
pub struct DummyPersister;

impl DummyPersister {
    pub fn new() -> Self {
        Self
    }
}

impl ChannelPersister for DummyPersister {
    fn load(&mut self) -> anyhow::Result<BTreeMap<String, Channel>> {
        Ok(BTreeMap::new())
    }

    fn persist(&mut self, _channels: &BTreeMap<String, Channel>) -> anyhow::Result<()> {
        Ok(())
    }
}
