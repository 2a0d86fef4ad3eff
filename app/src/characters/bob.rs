//! The recipient character: consumes re-encrypted material. Carries nothing
//! beyond the base configuration material.

use crate::characters::CharacterError;
use crate::keyring::{Certificate, InterfaceSignature, TlsCurve};
use crate::network::RestMiddleware;
use crate::storage::{KnownNodes, NodeMetadata};
use ledger::StakingAgent;
use std::sync::{Arc, RwLock};

/// The merged parameter set a Bob is constructed from.
#[derive(Debug, Clone)]
pub struct BobParameters {
    pub account: String,
    pub rest_host: String,
    pub rest_port: u16,
    pub tls_curve: TlsCurve,
    pub certificate: Option<Certificate>,
    pub interface_signature: Option<InterfaceSignature>,
    pub timestamp: u64,
    pub network_middleware: RestMiddleware,
    pub known_nodes: Arc<RwLock<KnownNodes>>,
    pub staking_agent: Option<Arc<StakingAgent>>,
    pub federated_only: bool,
}

#[derive(Debug)]
pub struct Bob {
    account: String,
    rest_host: String,
    rest_port: u16,
    tls_curve: TlsCurve,
    certificate: Certificate,
    interface_signature: InterfaceSignature,
    timestamp: u64,
    network_middleware: RestMiddleware,
    known_nodes: Arc<RwLock<KnownNodes>>,
    staking_agent: Option<Arc<StakingAgent>>,
    federated_only: bool,
}

impl Bob {
    pub const ROLE: &'static str = "bob";

    pub fn new(parameters: BobParameters) -> Result<Self, CharacterError> {
        let certificate = parameters
            .certificate
            .ok_or(CharacterError::MissingParameter("certificate"))?;
        let interface_signature = parameters
            .interface_signature
            .ok_or(CharacterError::MissingParameter("interface_signature"))?;

        Ok(Self {
            account: parameters.account,
            rest_host: parameters.rest_host,
            rest_port: parameters.rest_port,
            tls_curve: parameters.tls_curve,
            certificate,
            interface_signature,
            timestamp: parameters.timestamp,
            network_middleware: parameters.network_middleware,
            known_nodes: parameters.known_nodes,
            staking_agent: parameters.staking_agent,
            federated_only: parameters.federated_only,
        })
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    pub fn tls_curve(&self) -> TlsCurve {
        self.tls_curve
    }

    pub fn certificate(&self) -> &Certificate {
        &self.certificate
    }

    pub fn known_nodes(&self) -> Arc<RwLock<KnownNodes>> {
        self.known_nodes.clone()
    }

    pub fn network_middleware(&self) -> &RestMiddleware {
        &self.network_middleware
    }

    pub fn staking_agent(&self) -> Option<Arc<StakingAgent>> {
        self.staking_agent.clone()
    }

    pub fn is_federated(&self) -> bool {
        self.federated_only
    }

    pub fn metadata(&self) -> NodeMetadata {
        NodeMetadata {
            account: self.account.clone(),
            role: Self::ROLE.to_string(),
            rest_host: self.rest_host.clone(),
            rest_port: self.rest_port,
            timestamp: self.timestamp,
            interface_signature: self.interface_signature.to_string(),
        }
    }
}
