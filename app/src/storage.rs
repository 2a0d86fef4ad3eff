//! Node metadata and certificate persistence.

use crate::keyring::Certificate;
use serde_derive::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Metadata encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// The announcement record a character publishes about itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeMetadata {
    pub account: String,
    pub role: String,
    pub rest_host: String,
    pub rest_port: u16,
    pub timestamp: u64,
    pub interface_signature: String,
}

/// Writes node metadata and peer certificates at the paths handed to it by
/// the filepath resolver. Performs no path derivation of its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeStorage {
    metadata_filepath: PathBuf,
    certificates_dir: PathBuf,
}

impl NodeStorage {
    pub fn new(metadata_filepath: PathBuf, certificates_dir: PathBuf) -> Self {
        Self {
            metadata_filepath,
            certificates_dir,
        }
    }

    pub fn metadata_filepath(&self) -> &Path {
        &self.metadata_filepath
    }

    pub fn certificates_dir(&self) -> &Path {
        &self.certificates_dir
    }

    pub fn write_node_metadata(&self, metadata: &NodeMetadata) -> Result<PathBuf, StorageError> {
        if let Some(parent) = self.metadata_filepath.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let encoded = serde_json::to_string_pretty(metadata)?;
        std::fs::write(&self.metadata_filepath, encoded)?;
        debug!(path = %self.metadata_filepath.display(), "Wrote node metadata");
        Ok(self.metadata_filepath.clone())
    }

    pub fn store_certificate(&self, certificate: &Certificate) -> Result<PathBuf, StorageError> {
        std::fs::create_dir_all(&self.certificates_dir)?;
        let path = self
            .certificates_dir
            .join(format!("{}.cert", certificate.common_name));
        std::fs::write(&path, certificate.encoded())?;
        debug!(path = %path.display(), "Stored certificate");
        Ok(path)
    }
}

/// The peer set a character carries, together with the certificate store its
/// peers' identity material lands in.
#[derive(Debug, Clone)]
pub struct KnownNodes {
    storage: NodeStorage,
    peers: HashMap<String, NodeMetadata>,
}

impl KnownNodes {
    pub fn new(storage: NodeStorage) -> Self {
        Self {
            storage,
            peers: HashMap::new(),
        }
    }

    pub fn storage(&self) -> &NodeStorage {
        &self.storage
    }

    pub fn record(&mut self, metadata: NodeMetadata) {
        self.peers.insert(metadata.account.clone(), metadata);
    }

    pub fn get(&self, account: &str) -> Option<&NodeMetadata> {
        self.peers.get(account)
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}

pub fn unix_timestamp() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
