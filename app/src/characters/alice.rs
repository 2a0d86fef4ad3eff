//! The delegator character: authors policies against the policy contract.

use crate::characters::CharacterError;
use crate::keyring::{Certificate, InterfaceSignature, TlsCurve};
use crate::network::RestMiddleware;
use crate::storage::{KnownNodes, NodeMetadata};
use ledger::{PolicyAgent, StakingAgent};
use std::sync::{Arc, RwLock};

/// The merged parameter set an Alice is constructed from.
#[derive(Debug, Clone)]
pub struct AliceParameters {
    pub account: String,
    pub rest_host: String,
    pub rest_port: u16,
    pub m: u16,
    pub n: u16,
    pub rate: Option<u64>,
    pub lock_periods: Option<u64>,
    pub first_period_reward: Option<u64>,
    pub tls_curve: TlsCurve,
    pub certificate: Option<Certificate>,
    pub interface_signature: Option<InterfaceSignature>,
    pub timestamp: u64,
    pub network_middleware: RestMiddleware,
    pub known_nodes: Arc<RwLock<KnownNodes>>,
    pub staking_agent: Option<Arc<StakingAgent>>,
    pub policy_agent: Option<Arc<PolicyAgent>>,
    pub federated_only: bool,
}

#[derive(Debug)]
pub struct Alice {
    account: String,
    rest_host: String,
    rest_port: u16,
    m: u16,
    n: u16,
    rate: Option<u64>,
    lock_periods: Option<u64>,
    first_period_reward: Option<u64>,
    tls_curve: TlsCurve,
    certificate: Certificate,
    interface_signature: InterfaceSignature,
    timestamp: u64,
    network_middleware: RestMiddleware,
    known_nodes: Arc<RwLock<KnownNodes>>,
    staking_agent: Option<Arc<StakingAgent>>,
    policy_agent: Option<Arc<PolicyAgent>>,
    federated_only: bool,
}

impl Alice {
    pub const ROLE: &'static str = "alice";

    pub fn new(parameters: AliceParameters) -> Result<Self, CharacterError> {
        let certificate = parameters
            .certificate
            .ok_or(CharacterError::MissingParameter("certificate"))?;
        let interface_signature = parameters
            .interface_signature
            .ok_or(CharacterError::MissingParameter("interface_signature"))?;
        if parameters.m > parameters.n {
            return Err(CharacterError::InvalidPolicyThreshold {
                m: parameters.m,
                n: parameters.n,
            });
        }
        if !parameters.federated_only && parameters.staking_agent.is_none() {
            return Err(CharacterError::MissingParameter("staking_agent"));
        }

        Ok(Self {
            account: parameters.account,
            rest_host: parameters.rest_host,
            rest_port: parameters.rest_port,
            m: parameters.m,
            n: parameters.n,
            rate: parameters.rate,
            lock_periods: parameters.lock_periods,
            first_period_reward: parameters.first_period_reward,
            tls_curve: parameters.tls_curve,
            certificate,
            interface_signature,
            timestamp: parameters.timestamp,
            network_middleware: parameters.network_middleware,
            known_nodes: parameters.known_nodes,
            staking_agent: parameters.staking_agent,
            policy_agent: parameters.policy_agent,
            federated_only: parameters.federated_only,
        })
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    /// Redundancy parameters for newly authored policies.
    pub fn policy_shape(&self) -> (u16, u16) {
        (self.m, self.n)
    }

    pub fn rate(&self) -> Option<u64> {
        self.rate
    }

    pub fn lock_periods(&self) -> Option<u64> {
        self.lock_periods
    }

    pub fn first_period_reward(&self) -> Option<u64> {
        self.first_period_reward
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

    pub fn policy_agent(&self) -> Option<Arc<PolicyAgent>> {
        self.policy_agent.clone()
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
