use crate::characters::CharacterError;
use crate::config::ConfigError;
use crate::keyring::KeyringError;
use crate::storage::StorageError;
use thiserror::Error;

/// Failures before any character material is touched: credential store,
/// configuration and file layout problems.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("Keyring error: {0}")]
    Keyring(#[from] KeyringError),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Production failures. No retries anywhere; either a fully constructed,
/// metadata-persisted character is returned or production fails before
/// returning.
#[derive(Debug, Error)]
pub enum ProductionError {
    #[error("Character setup failed: {0}")]
    Setup(#[from] SetupError),
    #[error("Ledger provisioning failed: {0}")]
    Provisioning(#[from] ledger::Error),
    #[error("Character construction failed: {0}")]
    Construction(#[from] CharacterError),
}

impl From<KeyringError> for ProductionError {
    fn from(e: KeyringError) -> Self {
        ProductionError::Setup(SetupError::Keyring(e))
    }
}

impl From<StorageError> for ProductionError {
    fn from(e: StorageError) -> Self {
        ProductionError::Setup(SetupError::Storage(e))
    }
}
