//! The server-operator character: runs the REST node and owns the local
//! datastore.

use crate::characters::CharacterError;
use crate::executor::{Dispatch, TaskExecutor, ThreadPoolExecutor, WorkItem};
use crate::keyring::{Certificate, InterfaceSignature, TlsCurve};
use crate::network::RestMiddleware;
use crate::storage::{KnownNodes, NodeMetadata};
use ledger::StakingAgent;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing::debug;

/// The merged parameter set an Ursula is constructed from.
#[derive(Debug, Clone)]
pub struct UrsulaParameters {
    pub account: String,
    pub rest_host: String,
    pub rest_port: u16,
    pub db_filepath: PathBuf,
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
pub struct Ursula {
    account: String,
    rest_host: String,
    rest_port: u16,
    db_filepath: PathBuf,
    tls_curve: TlsCurve,
    certificate: Certificate,
    interface_signature: InterfaceSignature,
    timestamp: u64,
    network_middleware: RestMiddleware,
    known_nodes: Arc<RwLock<KnownNodes>>,
    staking_agent: Option<Arc<StakingAgent>>,
    federated_only: bool,
    datastore_executor: Box<dyn TaskExecutor>,
}

impl Ursula {
    pub const ROLE: &'static str = "ursula";

    pub fn new(parameters: UrsulaParameters) -> Result<Self, CharacterError> {
        let certificate = parameters
            .certificate
            .ok_or(CharacterError::MissingParameter("certificate"))?;
        let interface_signature = parameters
            .interface_signature
            .ok_or(CharacterError::MissingParameter("interface_signature"))?;
        if !parameters.federated_only && parameters.staking_agent.is_none() {
            return Err(CharacterError::MissingParameter("staking_agent"));
        }

        Ok(Self {
            account: parameters.account,
            rest_host: parameters.rest_host,
            rest_port: parameters.rest_port,
            db_filepath: parameters.db_filepath,
            tls_curve: parameters.tls_curve,
            certificate,
            interface_signature,
            timestamp: parameters.timestamp,
            network_middleware: parameters.network_middleware,
            known_nodes: parameters.known_nodes,
            staking_agent: parameters.staking_agent,
            federated_only: parameters.federated_only,
            datastore_executor: Box::new(ThreadPoolExecutor::default()),
        })
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    pub fn rest_interface(&self) -> (&str, u16) {
        (&self.rest_host, self.rest_port)
    }

    pub fn db_filepath(&self) -> &Path {
        &self.db_filepath
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

    /// Swap the datastore work dispatcher, tearing the previous one down.
    pub fn replace_task_executor(&mut self, executor: Box<dyn TaskExecutor>) {
        debug!("Replacing datastore executor");
        self.datastore_executor = executor;
    }

    /// Append a record to the local datastore through the executor seam.
    pub fn commit_to_datastore(&self, record: String) -> Dispatch {
        let path = self.db_filepath.clone();
        let work: WorkItem = Box::new(move || {
            use std::io::Write;
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let mut file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            writeln!(file, "{record}")
        });
        self.datastore_executor.submit(work)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::InlineExecutor;
    use crate::storage::NodeStorage;

    fn parameters(dir: &Path) -> UrsulaParameters {
        let storage = NodeStorage::new(
            dir.join("node_metadata.json"),
            dir.join("known_certificates"),
        );
        UrsulaParameters {
            account: "operator".to_string(),
            rest_host: "127.0.0.1".to_string(),
            rest_port: 9151,
            db_filepath: dir.join("ursula.9151.db"),
            tls_curve: TlsCurve::Secp384R1,
            certificate: Some(Certificate {
                common_name: "127.0.0.1".to_string(),
                curve: TlsCurve::Secp384R1,
                der: vec![7; 32],
            }),
            interface_signature: Some(InterfaceSignature([9; 32])),
            timestamp: 1_700_000_000,
            network_middleware: RestMiddleware::new(),
            known_nodes: Arc::new(RwLock::new(KnownNodes::new(storage))),
            staking_agent: None,
            federated_only: true,
        }
    }

    #[test]
    fn missing_certificate_fails_construction() {
        let dir = tempfile::tempdir().unwrap();
        let mut params = parameters(dir.path());
        params.certificate = None;

        assert!(matches!(
            Ursula::new(params),
            Err(CharacterError::MissingParameter("certificate"))
        ));
    }

    #[test]
    fn ledger_mode_requires_a_staking_agent() {
        let dir = tempfile::tempdir().unwrap();
        let mut params = parameters(dir.path());
        params.federated_only = false;

        assert!(matches!(
            Ursula::new(params),
            Err(CharacterError::MissingParameter("staking_agent"))
        ));
    }

    #[test]
    fn inline_executor_commits_synchronously() {
        let dir = tempfile::tempdir().unwrap();
        let mut ursula = Ursula::new(parameters(dir.path())).unwrap();
        ursula.replace_task_executor(Box::new(InlineExecutor));

        let dispatch = ursula.commit_to_datastore("policy-arrangement".to_string());
        assert!(matches!(dispatch, Dispatch::Completed(Ok(()))));

        let raw = std::fs::read_to_string(ursula.db_filepath()).unwrap();
        assert_eq!(raw, "policy-arrangement\n");
    }

    #[test]
    fn metadata_reflects_the_rest_interface() {
        let dir = tempfile::tempdir().unwrap();
        let ursula = Ursula::new(parameters(dir.path())).unwrap();

        let metadata = ursula.metadata();
        assert_eq!(metadata.role, "ursula");
        assert_eq!(metadata.rest_port, 9151);
        assert_eq!(metadata.interface_signature, hex::encode([9u8; 32]));
    }
}
