mod agent;
mod registry;

use ethers::prelude::*;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

pub use agent::{PolicyAgent, StakingAgent, TokenAgent};
pub use registry::{ContractRegistry, RegistryEntry};

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid ledger endpoint {0}")]
    InvalidEndpoint(String),
    #[error("Registry read error: {0}")]
    RegistryIo(#[from] std::io::Error),
    #[error("Registry parse error: {0}")]
    RegistryParse(#[from] serde_json::Error),
    #[error("Contract {0} not found in registry")]
    UnknownContract(String),
    #[error("Middleware {0:?} already injected")]
    MiddlewareAlreadyInjected(CompatLayer),
    #[error("Contract call failed: {0}")]
    ContractCall(String),
}

/// Compatibility layers that can be spliced into the client middleware chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompatLayer {
    /// Accepts the oversized extra-data field emitted by proof-of-authority
    /// chains.
    ProofOfAuthority,
}

/// A connection to the ledger plus the contract registry resolved from disk.
///
/// Construction is synchronous; endpoint liveness surfaces on the first
/// contract call made through an agent.
#[derive(Debug, Clone)]
pub struct LedgerClient {
    provider: Arc<Provider<Http>>,
    endpoint: String,
    registry: ContractRegistry,
    middleware: Vec<CompatLayer>,
}

impl LedgerClient {
    pub const INNERMOST_LAYER: usize = 0;

    pub fn connect(endpoint_uri: &str, registry_filepath: &Path) -> Result<Self, Error> {
        let registry = ContractRegistry::from_filepath(registry_filepath)?;
        let provider = Provider::<Http>::try_from(endpoint_uri)
            .map_err(|_| Error::InvalidEndpoint(endpoint_uri.to_string()))?;
        info!(
            endpoint = endpoint_uri,
            contracts = registry.len(),
            "Connected ledger client"
        );
        Ok(Self {
            provider: Arc::new(provider),
            endpoint: endpoint_uri.to_string(),
            registry,
            middleware: Vec::new(),
        })
    }

    /// Splice `layer` into the middleware chain at `index` (0 = innermost).
    /// Each layer may be injected at most once per connection.
    pub fn inject_middleware(&mut self, layer: CompatLayer, index: usize) -> Result<(), Error> {
        if self.middleware.contains(&layer) {
            return Err(Error::MiddlewareAlreadyInjected(layer));
        }
        let index = index.min(self.middleware.len());
        self.middleware.insert(index, layer);
        info!(?layer, index, "Injected compatibility middleware");
        Ok(())
    }

    pub fn has_middleware(&self, layer: CompatLayer) -> bool {
        self.middleware.contains(&layer)
    }

    pub fn provider(&self) -> Arc<Provider<Http>> {
        self.provider.clone()
    }

    pub fn registry(&self) -> &ContractRegistry {
        &self.registry
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}
