//! Deployment persistence.
//!
//! Saves and loads named [`Deployment`] snapshots through any
//! [`StorageBackend`], tagging each with a format version.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::deployment::Deployment;
use crate::error::{Error, Result};
use crate::storage::backend::{make_key, prefixes, StorageBackend, TypedStore};
use crate::utils::constants::SNAPSHOT_VERSION;
use crate::utils::crypto::Hash;

/// Name used when the caller does not pick one
pub const DEFAULT_DEPLOYMENT: &str = "default";

/// Metadata stored next to each snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotMeta {
    /// Snapshot format version
    pub version: u32,
    /// State hash at save time
    pub state_hash: Hash,
}

/// Named deployment snapshots on top of a storage backend
#[derive(Debug)]
pub struct DeploymentStore<B: StorageBackend> {
    store: TypedStore<B>,
}

impl<B: StorageBackend> DeploymentStore<B> {
    /// Create a deployment store
    pub fn new(backend: B) -> Self {
        Self {
            store: TypedStore::new(backend),
        }
    }

    /// Save a deployment under `name` and flush
    pub fn save(&self, name: &str, deployment: &Deployment) -> Result<()> {
        let meta = SnapshotMeta {
            version: SNAPSHOT_VERSION,
            state_hash: deployment.state_hash(),
        };
        self.store
            .set(&make_key(prefixes::DEPLOYMENT, name.as_bytes()), deployment)?;
        self.store.set(&make_key(prefixes::META, name.as_bytes()), &meta)?;
        self.store.flush()?;
        debug!(name, hash = %meta.state_hash, "deployment saved");
        Ok(())
    }

    /// Load the deployment saved under `name`, if any
    pub fn load(&self, name: &str) -> Result<Option<Deployment>> {
        let deployment: Option<Deployment> = self
            .store
            .get(&make_key(prefixes::DEPLOYMENT, name.as_bytes()))?;
        let Some(deployment) = deployment else {
            return Ok(None);
        };

        if let Some(meta) = self.meta(name)? {
            if meta.version != SNAPSHOT_VERSION {
                return Err(Error::Deserialization(format!(
                    "snapshot version {} is not supported (expected {})",
                    meta.version, SNAPSHOT_VERSION
                )));
            }
            if meta.state_hash != deployment.state_hash() {
                return Err(Error::Storage(format!("snapshot {} failed its integrity check", name)));
            }
        }
        Ok(Some(deployment))
    }

    /// Metadata of the snapshot saved under `name`
    pub fn meta(&self, name: &str) -> Result<Option<SnapshotMeta>> {
        self.store.get(&make_key(prefixes::META, name.as_bytes()))
    }

    /// Remove a snapshot
    pub fn remove(&self, name: &str) -> Result<bool> {
        let existed = self
            .store
            .delete(&make_key(prefixes::DEPLOYMENT, name.as_bytes()))?;
        self.store.delete(&make_key(prefixes::META, name.as_bytes()))?;
        self.store.flush()?;
        Ok(existed)
    }

    /// Names of all saved snapshots
    pub fn names(&self) -> Result<Vec<String>> {
        self.store
            .list_prefix(prefixes::DEPLOYMENT)?
            .into_iter()
            .map(|key| {
                String::from_utf8(key[prefixes::DEPLOYMENT.len()..].to_vec())
                    .map_err(|e| Error::Storage(e.to_string()))
            })
            .collect()
    }
}
