//! The base character configuration shared by every variant.
//!
//! Static identity fields are fixed at assembly; only runtime material (the
//! certificate and the memoized staking agent) is populated lazily. Every
//! mutating entry point takes `&mut self`, so concurrent production on one
//! configuration instance is ruled out by the borrow checker rather than by
//! an internal lock.

use crate::config::filepaths::generate_base_filepaths;
use crate::config::{ConfigError, Validate};
use crate::error::SetupError;
use crate::keyring::{Certificate, InterfaceSignature, Keyring, PassphraseSource, TlsCurve};
use crate::metrics::{KEYRING_UNLOCKS, PROVISIONING_RUNS};
use crate::network::RestMiddleware;
use crate::storage::{unix_timestamp, KnownNodes, NodeMetadata, NodeStorage};
use ledger::{CompatLayer, LedgerClient, StakingAgent, TokenAgent};
use serde_derive::Serialize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing::info;

/// Immutable construction defaults a variant hands to assembly.
#[derive(Debug, Clone)]
pub struct CharacterDefaults {
    pub rest_host: String,
    pub rest_port: u16,
    pub dev_rest_port: u16,
    pub tls_curve: TlsCurve,
    pub provider_uri: String,
}

impl Default for CharacterDefaults {
    fn default() -> Self {
        Self {
            rest_host: "127.0.0.1".to_string(),
            rest_port: 9151,
            dev_rest_port: 10151,
            tls_curve: TlsCurve::Secp384R1,
            provider_uri: "http://localhost:8545".to_string(),
        }
    }
}

/// Assembly-time options; unset fields fall back to the variant defaults.
#[derive(Debug, Clone, Default)]
pub struct CharacterOptions {
    pub account: Option<String>,
    pub config_root: Option<PathBuf>,
    pub rest_host: Option<String>,
    pub rest_port: Option<u16>,
    pub tls_curve: Option<TlsCurve>,
    pub certificate: Option<Certificate>,
    pub provider_uri: Option<String>,
    pub registry_filepath: Option<PathBuf>,
    pub passphrase_source: Option<PassphraseSource>,
    pub federated_only: bool,
    pub poa: bool,
    pub temp: bool,
}

/// Everything needed to reconstruct a configuration from persisted form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StaticPayload {
    pub account: String,
    pub config_root: PathBuf,
    pub keyring_root: PathBuf,
    pub rest_host: String,
    pub rest_port: u16,
    pub certificate_filepath: PathBuf,
    pub registry_filepath: PathBuf,
    pub provider_uri: String,
    pub tls_curve: TlsCurve,
    pub federated_only: bool,
    pub poa: bool,
    pub temp: bool,
}

/// Live material regenerated on every production call; never persisted.
#[derive(Debug, Clone)]
pub struct DynamicPayload {
    pub network_middleware: RestMiddleware,
    pub tls_curve: TlsCurve,
    pub certificate: Option<Certificate>,
    pub interface_signature: Option<InterfaceSignature>,
    pub timestamp: u64,
    pub known_nodes: Arc<RwLock<KnownNodes>>,
    pub staking_agent: Option<Arc<StakingAgent>>,
}

#[derive(Debug, Clone)]
pub struct CharacterConfiguration {
    pub account: String,
    pub config_root: PathBuf,
    pub rest_host: String,
    pub rest_port: u16,
    pub tls_curve: TlsCurve,
    pub provider_uri: String,
    pub registry_filepath: PathBuf,
    pub passphrase_source: PassphraseSource,
    pub federated_only: bool,
    pub poa: bool,
    pub temp: bool,
    certificate: Option<Certificate>,
    keyring: Keyring,
    network_middleware: RestMiddleware,
    known_nodes: Arc<RwLock<KnownNodes>>,
    staking_agent: Option<Arc<StakingAgent>>,
}

impl CharacterConfiguration {
    pub const DEFAULT_ROOT_DIR: &'static str = "etc/data/umbra";
    pub const DEFAULT_ACCOUNT: &'static str = "operator";
    pub const DEFAULT_REGISTRY_NAME: &'static str = "contract_registry.json";

    pub fn assemble(
        options: CharacterOptions,
        defaults: &CharacterDefaults,
    ) -> Result<Self, ConfigError> {
        let temp = options.temp;
        let account = options
            .account
            .unwrap_or_else(|| Self::DEFAULT_ACCOUNT.to_string());
        let config_root = options.config_root.unwrap_or_else(|| {
            if temp {
                std::env::temp_dir().join("umbra-dev")
            } else {
                PathBuf::from(Self::DEFAULT_ROOT_DIR)
            }
        });
        let rest_port = options.rest_port.unwrap_or(if temp {
            defaults.dev_rest_port
        } else {
            defaults.rest_port
        });

        let registry_filepath = options
            .registry_filepath
            .unwrap_or_else(|| config_root.join(Self::DEFAULT_REGISTRY_NAME));
        let filepaths = generate_base_filepaths(&config_root);
        let keyring = Keyring::attach(filepaths.keyring_root, account.clone());
        let storage = NodeStorage::new(
            filepaths.node_metadata_filepath,
            filepaths.known_certificates_dir,
        );

        let configuration = Self {
            account,
            config_root,
            rest_host: options
                .rest_host
                .unwrap_or_else(|| defaults.rest_host.clone()),
            rest_port,
            tls_curve: options.tls_curve.unwrap_or(defaults.tls_curve),
            provider_uri: options
                .provider_uri
                .unwrap_or_else(|| defaults.provider_uri.clone()),
            registry_filepath,
            passphrase_source: options.passphrase_source.unwrap_or_default(),
            federated_only: options.federated_only,
            poa: options.poa,
            temp,
            certificate: options.certificate,
            keyring,
            network_middleware: RestMiddleware::new(),
            known_nodes: Arc::new(RwLock::new(KnownNodes::new(storage))),
            staking_agent: None,
        };
        configuration.validate()?;
        Ok(configuration)
    }

    pub fn static_payload(&self) -> StaticPayload {
        StaticPayload {
            account: self.account.clone(),
            config_root: self.config_root.clone(),
            keyring_root: self.keyring.root().to_path_buf(),
            rest_host: self.rest_host.clone(),
            rest_port: self.rest_port,
            certificate_filepath: self.certificate_filepath(),
            registry_filepath: self.registry_filepath.clone(),
            provider_uri: self.provider_uri.clone(),
            tls_curve: self.tls_curve,
            federated_only: self.federated_only,
            poa: self.poa,
            temp: self.temp,
        }
    }

    pub fn dynamic_payload(&self) -> DynamicPayload {
        DynamicPayload {
            network_middleware: self.network_middleware.clone(),
            // The live identity material governs the curve once present.
            tls_curve: self
                .certificate
                .as_ref()
                .map(|certificate| certificate.curve)
                .unwrap_or(self.tls_curve),
            certificate: self.certificate.clone(),
            interface_signature: self
                .keyring
                .sign_interface(&self.rest_host, self.rest_port)
                .ok(),
            timestamp: unix_timestamp(),
            known_nodes: self.known_nodes.clone(),
            staking_agent: self.staking_agent.clone(),
        }
    }

    /// Where this node's own certificate lands on disk.
    pub fn certificate_filepath(&self) -> PathBuf {
        self.known_nodes
            .read()
            .unwrap()
            .storage()
            .certificates_dir()
            .join(format!("{}.cert", self.rest_host))
    }

    pub fn certificate(&self) -> Option<&Certificate> {
        self.certificate.as_ref()
    }

    pub fn assign_certificate(&mut self, certificate: Certificate) {
        self.certificate = Some(certificate);
    }

    pub fn known_nodes(&self) -> Arc<RwLock<KnownNodes>> {
        self.known_nodes.clone()
    }

    pub fn keyring(&self) -> &Keyring {
        &self.keyring
    }

    pub fn staking_agent(&self) -> Option<Arc<StakingAgent>> {
        self.staking_agent.clone()
    }

    /// Re-attach the keyring under a different account, e.g. the worker
    /// account in ledger mode.
    pub(crate) fn attach_keyring(&mut self, account: String) {
        self.keyring = Keyring::attach(self.keyring.root().to_path_buf(), account);
    }

    /// Create the runtime directory layout and fresh keyring material.
    pub fn write_defaults(&mut self, passphrase: &str) -> Result<(), SetupError> {
        std::fs::create_dir_all(&self.config_root).map_err(crate::storage::StorageError::from)?;
        {
            let known_nodes = self.known_nodes.read().unwrap();
            std::fs::create_dir_all(known_nodes.storage().certificates_dir())
                .map_err(crate::storage::StorageError::from)?;
        }
        self.keyring = Keyring::generate(
            self.keyring.root().to_path_buf(),
            self.keyring.account().to_string(),
            passphrase,
            &self.rest_host,
            self.tls_curve,
        )?;
        info!(root = %self.config_root.display(), "Wrote configuration defaults");
        Ok(())
    }

    /// Production step 1: resolve the passphrase, unlock the keyring, and
    /// populate the certificate if it has not been assigned yet. Temporary
    /// configurations bootstrap their keyring material on first use.
    pub(crate) fn unlock_keyring(&mut self) -> Result<(), SetupError> {
        let passphrase = self.passphrase_source.resolve()?;
        if self.temp && !self.keyring.is_initialized() {
            self.write_defaults(&passphrase)?;
        }
        match self.keyring.unlock(&passphrase) {
            Ok(()) => KEYRING_UNLOCKS.with_label_values(&["ok"]).inc(),
            Err(err) => {
                KEYRING_UNLOCKS.with_label_values(&["failed"]).inc();
                return Err(err.into());
            }
        }
        if self.certificate.is_none() {
            self.certificate =
                Some(self.keyring.derive_certificate(&self.rest_host, self.tls_curve)?);
        }
        Ok(())
    }

    /// Production step 3: establish ledger connectivity and memoize the
    /// staking agent. Repeated calls on the same instance return the
    /// memoized handle without touching the ledger again.
    pub(crate) fn connect_to_ledger(&mut self) -> Result<Arc<StakingAgent>, ledger::Error> {
        if let Some(agent) = &self.staking_agent {
            return Ok(agent.clone());
        }

        info!(endpoint = self.provider_uri, "Provisioning ledger agents");
        let mut client = LedgerClient::connect(&self.provider_uri, &self.registry_filepath)?;
        if self.poa {
            client.inject_middleware(CompatLayer::ProofOfAuthority, LedgerClient::INNERMOST_LAYER)?;
        }
        let client = Arc::new(client);
        let token_agent = TokenAgent::new(client)?;
        let staking_agent = Arc::new(StakingAgent::from_token_agent(&token_agent)?);

        self.staking_agent = Some(staking_agent.clone());
        PROVISIONING_RUNS.inc();
        Ok(staking_agent)
    }

    /// Production step 5: write the announcement metadata and drop the
    /// certificate into the known-nodes certificate store.
    pub(crate) fn persist_node_artifacts(
        &self,
        metadata: &NodeMetadata,
        certificate: &Certificate,
    ) -> Result<(), crate::storage::StorageError> {
        let known_nodes = self.known_nodes.read().unwrap();
        known_nodes.storage().write_node_metadata(metadata)?;
        known_nodes.storage().store_certificate(certificate)?;
        Ok(())
    }

    pub fn keyring_root(&self) -> &Path {
        self.keyring.root()
    }
}

impl Validate for CharacterConfiguration {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.rest_port == 0 {
            return Err(ConfigError::ValidationError {
                field: "rest_port".to_string(),
                reason: "REST port must be nonzero".to_string(),
            });
        }
        if self.poa && self.federated_only {
            return Err(ConfigError::ValidationError {
                field: "poa".to_string(),
                reason: "PoA compatibility requires ledger mode".to_string(),
            });
        }
        if !self.federated_only && self.provider_uri.is_empty() {
            return Err(ConfigError::ValidationError {
                field: "provider_uri".to_string(),
                reason: "Ledger mode requires a provider URI".to_string(),
            });
        }
        Ok(())
    }
}
