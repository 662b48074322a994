use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use super::ChannelPersister;
use crate::channel::Channel;

/// Persists the channel map as one pretty-printed JSON file.
///
/// Writes go to a sibling temp file first and land via rename, so a crash
/// mid-write leaves the previous snapshot intact.
pub struct JsonFilePersister {
    path: PathBuf,
}

impl JsonFilePersister {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ChannelPersister for JsonFilePersister {
    fn load(&mut self) -> anyhow::Result<BTreeMap<String, Channel>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let bytes = fs::read(&self.path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn persist(&mut self, channels: &BTreeMap<String, Channel>) -> anyhow::Result<()> {
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(channels)?)?;
        fs::rename(&tmp, &self.path)?;

        Ok(())
    }
}
