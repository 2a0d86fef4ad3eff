//! Runtime file path resolution.
//!
//! Pure derivation from a configuration root; no directory or file is
//! created here. Variant-specific paths are unioned into the base set under
//! their own slots and never displace a base path.

use std::path::{Path, PathBuf};

/// The runtime paths a character configuration works against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeFilepaths {
    pub keyring_root: PathBuf,
    pub known_certificates_dir: PathBuf,
    pub node_metadata_filepath: PathBuf,
    /// Variant extension: the local datastore, set by server-operator
    /// configurations.
    pub db_filepath: Option<PathBuf>,
}

/// Paths owned by the base configuration.
pub fn generate_base_filepaths(config_root: &Path) -> RuntimeFilepaths {
    RuntimeFilepaths {
        keyring_root: config_root.join("keyring"),
        known_certificates_dir: config_root.join("known_certificates"),
        node_metadata_filepath: config_root.join("node_metadata.json"),
        db_filepath: None,
    }
}
