// Cloudsync - Sync Registry
// Configured syncs and backups, as known to the local client

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::types::{NodeHandle, SyncEntry, SyncType};

/// All configured syncs, in creation order
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SyncRegistry {
    #[serde(default)]
    syncs: Vec<SyncEntry>,
}

impl SyncRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[SyncEntry] {
        &self.syncs
    }

    /// Local root paths of all syncs of the given type
    pub fn local_folders(&self, sync_type: SyncType) -> Vec<PathBuf> {
        self.syncs
            .iter()
            .filter(|s| s.sync_type == sync_type)
            .map(|s| s.local_path.clone())
            .collect()
    }

    /// Number of syncs of the given type
    pub fn count(&self, sync_type: SyncType) -> usize {
        self.syncs.iter().filter(|s| s.sync_type == sync_type).count()
    }

    /// Whether the whole remote tree is already synced somewhere
    pub fn is_remote_root_synced(&self, root: NodeHandle) -> bool {
        root.is_valid()
            && self
                .syncs
                .iter()
                .any(|s| s.sync_type == SyncType::TwoWay && s.remote_handle == root)
    }

    pub fn find_by_path(&self, path: &Path) -> Option<&SyncEntry> {
        self.syncs.iter().find(|s| s.local_path == path)
    }

    /// Register a new sync. The local path must not already be registered.
    pub fn add(&mut self, entry: SyncEntry) -> Result<()> {
        if self.find_by_path(&entry.local_path).is_some() {
            return Err(Error::SyncExists(entry.local_path));
        }

        debug!(
            "Registered {} sync '{}' at {}",
            entry.sync_type,
            entry.name,
            entry.local_path.display()
        );
        self.syncs.push(entry);
        Ok(())
    }

    /// Remove a sync by its local path
    pub fn remove_by_path(&mut self, path: &Path) -> Result<SyncEntry> {
        let index = self
            .syncs
            .iter()
            .position(|s| s.local_path == path)
            .ok_or_else(|| Error::SyncNotFound(path.to_path_buf()))?;

        let entry = self.syncs.remove(index);
        debug!("Removed sync '{}' at {}", entry.name, path.display());
        Ok(entry)
    }
}
