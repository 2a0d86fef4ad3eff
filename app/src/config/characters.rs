//! Character configuration variants and their production entry points.
//!
//! Each variant composes its payloads on top of the base configuration by
//! embedding the base payload struct, so inherited fields cannot be dropped
//! by a bad merge direction. Merged parameters follow one precedence rule
//! everywhere: overrides beat dynamic values, dynamic values beat static
//! values.

use crate::characters::{Alice, AliceParameters, Bob, BobParameters, Ursula, UrsulaParameters};
use crate::config::filepaths::{generate_base_filepaths, RuntimeFilepaths};
use crate::config::node::{
    CharacterConfiguration, CharacterDefaults, CharacterOptions, DynamicPayload, StaticPayload,
};
use crate::config::ConfigError;
use crate::error::ProductionError;
use crate::executor::InlineExecutor;
use crate::keyring::{Certificate, TlsCurve};
use crate::metrics::CHARACTERS_PRODUCED;
use crate::network::RestMiddleware;
use ledger::{PolicyAgent, StakingAgent};
use serde_derive::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

// --- Ursula: the server operator ---------------------------------------

#[derive(Debug, Clone, Default)]
pub struct UrsulaOptions {
    pub character: CharacterOptions,
    pub db_filepath: Option<PathBuf>,
    pub worker_address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UrsulaStaticPayload {
    #[serde(flatten)]
    pub base: StaticPayload,
    pub db_filepath: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worker_address: Option<String>,
}

/// Production-time field forcing; rightmost source in the merge.
#[derive(Debug, Default)]
pub struct UrsulaOverrides {
    pub account: Option<String>,
    pub rest_host: Option<String>,
    pub rest_port: Option<u16>,
    pub db_filepath: Option<PathBuf>,
    pub tls_curve: Option<TlsCurve>,
    pub certificate: Option<Certificate>,
    pub timestamp: Option<u64>,
    pub network_middleware: Option<RestMiddleware>,
    pub staking_agent: Option<Arc<StakingAgent>>,
}

#[derive(Debug, Clone)]
pub struct UrsulaConfiguration {
    pub base: CharacterConfiguration,
    pub db_filepath: PathBuf,
    pub worker_address: Option<String>,
}

impl UrsulaConfiguration {
    pub const NAME: &'static str = "ursula";
    pub const DEFAULT_REST_PORT: u16 = 9151;
    pub const DEFAULT_DEVELOPMENT_REST_PORT: u16 = 10151;

    pub fn defaults() -> CharacterDefaults {
        CharacterDefaults {
            rest_port: Self::DEFAULT_REST_PORT,
            dev_rest_port: Self::DEFAULT_DEVELOPMENT_REST_PORT,
            ..CharacterDefaults::default()
        }
    }

    pub fn assemble(options: UrsulaOptions) -> Result<Self, ConfigError> {
        let mut base = CharacterConfiguration::assemble(options.character, &Self::defaults())?;
        // In ledger mode the keyring belongs to the worker account.
        if !base.federated_only {
            if let Some(worker_address) = &options.worker_address {
                base.attach_keyring(worker_address.clone());
            }
        }
        let filepaths = Self::generate_runtime_filepaths(&base.config_root, base.rest_port);
        let db_filepath = options.db_filepath.unwrap_or_else(|| {
            filepaths
                .db_filepath
                .expect("server-operator filepaths include a datastore")
        });
        Ok(Self {
            base,
            db_filepath,
            worker_address: options.worker_address,
        })
    }

    /// Base paths plus the datastore path, named `ursula.{port}.db`.
    pub fn generate_runtime_filepaths(config_root: &Path, rest_port: u16) -> RuntimeFilepaths {
        let mut filepaths = generate_base_filepaths(config_root);
        filepaths.db_filepath =
            Some(config_root.join(format!("{}.{rest_port}.db", Self::NAME)));
        filepaths
    }

    pub fn static_payload(&self) -> UrsulaStaticPayload {
        UrsulaStaticPayload {
            base: self.base.static_payload(),
            db_filepath: self.db_filepath.clone(),
            worker_address: self.worker_address.clone(),
        }
    }

    pub fn dynamic_payload(&self) -> DynamicPayload {
        self.base.dynamic_payload()
    }

    pub fn generate_parameters(&self, overrides: UrsulaOverrides) -> UrsulaParameters {
        let statics = self.static_payload();
        let dynamics = self.dynamic_payload();
        UrsulaParameters {
            account: overrides.account.unwrap_or(statics.base.account),
            rest_host: overrides.rest_host.unwrap_or(statics.base.rest_host),
            rest_port: overrides.rest_port.unwrap_or(statics.base.rest_port),
            db_filepath: overrides.db_filepath.unwrap_or(statics.db_filepath),
            tls_curve: overrides.tls_curve.unwrap_or(dynamics.tls_curve),
            certificate: overrides.certificate.or(dynamics.certificate),
            interface_signature: dynamics.interface_signature,
            timestamp: overrides.timestamp.unwrap_or(dynamics.timestamp),
            network_middleware: overrides
                .network_middleware
                .unwrap_or(dynamics.network_middleware),
            known_nodes: dynamics.known_nodes,
            staking_agent: overrides.staking_agent.or(dynamics.staking_agent),
            federated_only: statics.base.federated_only,
        }
    }

    /// Produce a new Ursula from this configuration.
    pub fn produce(&mut self, overrides: UrsulaOverrides) -> Result<Ursula, ProductionError> {
        self.base.unlock_keyring()?;
        let mut parameters = self.generate_parameters(overrides);

        if !self.base.federated_only && self.base.staking_agent().is_none() {
            parameters.staking_agent = Some(self.base.connect_to_ledger()?);
        }

        let mut ursula = Ursula::new(parameters)?;
        self.base
            .persist_node_artifacts(&ursula.metadata(), ursula.certificate())?;

        if self.base.temp {
            ursula.replace_task_executor(Box::new(InlineExecutor));
        }

        CHARACTERS_PRODUCED.with_label_values(&[Ursula::ROLE]).inc();
        info!(
            account = ursula.account(),
            port = self.base.rest_port,
            federated = self.base.federated_only,
            "Produced Ursula"
        );
        Ok(ursula)
    }
}

// --- Alice: the delegator -----------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct AliceOptions {
    pub character: CharacterOptions,
    pub m: Option<u16>,
    pub n: Option<u16>,
    pub rate: Option<u64>,
    pub lock_periods: Option<u64>,
    pub first_period_reward: Option<u64>,
    pub policy_agent: Option<Arc<PolicyAgent>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AliceStaticPayload {
    #[serde(flatten)]
    pub base: StaticPayload,
    pub m: u16,
    pub n: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lock_periods: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_period_reward: Option<u64>,
}

/// Alice's dynamic payload: the base material plus the policy agent handle.
#[derive(Debug, Clone)]
pub struct AliceDynamicPayload {
    pub base: DynamicPayload,
    pub policy_agent: Option<Arc<PolicyAgent>>,
}

#[derive(Debug, Default)]
pub struct AliceOverrides {
    pub account: Option<String>,
    pub rest_host: Option<String>,
    pub rest_port: Option<u16>,
    pub m: Option<u16>,
    pub n: Option<u16>,
    pub rate: Option<u64>,
    pub lock_periods: Option<u64>,
    pub first_period_reward: Option<u64>,
    pub tls_curve: Option<TlsCurve>,
    pub certificate: Option<Certificate>,
    pub timestamp: Option<u64>,
    pub network_middleware: Option<RestMiddleware>,
    pub staking_agent: Option<Arc<StakingAgent>>,
    pub policy_agent: Option<Arc<PolicyAgent>>,
}

#[derive(Debug, Clone)]
pub struct AliceConfiguration {
    pub base: CharacterConfiguration,
    pub m: u16,
    pub n: u16,
    pub rate: Option<u64>,
    pub lock_periods: Option<u64>,
    pub first_period_reward: Option<u64>,
    policy_agent: Option<Arc<PolicyAgent>>,
}

impl AliceConfiguration {
    pub const NAME: &'static str = "alice";
    pub const DEFAULT_CONTROLLER_PORT: u16 = 8151;
    pub const DEFAULT_M: u16 = 2;
    pub const DEFAULT_N: u16 = 3;
    pub const DEFAULT_FIRST_PERIOD_REWARD: u64 = 0;

    pub fn defaults() -> CharacterDefaults {
        CharacterDefaults {
            rest_port: Self::DEFAULT_CONTROLLER_PORT,
            dev_rest_port: Self::DEFAULT_CONTROLLER_PORT,
            ..CharacterDefaults::default()
        }
    }

    pub fn assemble(options: AliceOptions) -> Result<Self, ConfigError> {
        let base = CharacterConfiguration::assemble(options.character, &Self::defaults())?;
        let federated_only = base.federated_only;
        Ok(Self {
            base,
            m: options.m.unwrap_or(Self::DEFAULT_M),
            n: options.n.unwrap_or(Self::DEFAULT_N),
            // Policy economics only exist in ledger mode.
            rate: (!federated_only).then_some(options.rate).flatten(),
            lock_periods: (!federated_only).then_some(options.lock_periods).flatten(),
            first_period_reward: (!federated_only)
                .then_some(options.first_period_reward.or(Some(Self::DEFAULT_FIRST_PERIOD_REWARD)))
                .flatten(),
            policy_agent: options.policy_agent,
        })
    }

    pub fn static_payload(&self) -> AliceStaticPayload {
        AliceStaticPayload {
            base: self.base.static_payload(),
            m: self.m,
            n: self.n,
            rate: self.rate,
            lock_periods: self.lock_periods,
            first_period_reward: self.first_period_reward,
        }
    }

    pub fn dynamic_payload(&self) -> AliceDynamicPayload {
        AliceDynamicPayload {
            base: self.base.dynamic_payload(),
            policy_agent: self.policy_agent.clone(),
        }
    }

    pub fn generate_parameters(&self, overrides: AliceOverrides) -> AliceParameters {
        let statics = self.static_payload();
        let dynamics = self.dynamic_payload();
        AliceParameters {
            account: overrides.account.unwrap_or(statics.base.account),
            rest_host: overrides.rest_host.unwrap_or(statics.base.rest_host),
            rest_port: overrides.rest_port.unwrap_or(statics.base.rest_port),
            m: overrides.m.unwrap_or(statics.m),
            n: overrides.n.unwrap_or(statics.n),
            rate: overrides.rate.or(statics.rate),
            lock_periods: overrides.lock_periods.or(statics.lock_periods),
            first_period_reward: overrides.first_period_reward.or(statics.first_period_reward),
            tls_curve: overrides.tls_curve.unwrap_or(dynamics.base.tls_curve),
            certificate: overrides.certificate.or(dynamics.base.certificate),
            interface_signature: dynamics.base.interface_signature,
            timestamp: overrides.timestamp.unwrap_or(dynamics.base.timestamp),
            network_middleware: overrides
                .network_middleware
                .unwrap_or(dynamics.base.network_middleware),
            known_nodes: dynamics.base.known_nodes,
            staking_agent: overrides.staking_agent.or(dynamics.base.staking_agent),
            policy_agent: overrides.policy_agent.or(dynamics.policy_agent),
            federated_only: statics.base.federated_only,
        }
    }

    /// Produce a new Alice from this configuration.
    pub fn produce(&mut self, overrides: AliceOverrides) -> Result<Alice, ProductionError> {
        self.base.unlock_keyring()?;
        let mut parameters = self.generate_parameters(overrides);

        if !self.base.federated_only && self.base.staking_agent().is_none() {
            parameters.staking_agent = Some(self.base.connect_to_ledger()?);
        }

        let alice = Alice::new(parameters)?;
        self.base
            .persist_node_artifacts(&alice.metadata(), alice.certificate())?;

        CHARACTERS_PRODUCED.with_label_values(&[Alice::ROLE]).inc();
        info!(account = alice.account(), "Produced Alice");
        Ok(alice)
    }
}

// --- Bob: the recipient -------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct BobOptions {
    pub character: CharacterOptions,
}

#[derive(Debug, Default)]
pub struct BobOverrides {
    pub account: Option<String>,
    pub rest_host: Option<String>,
    pub rest_port: Option<u16>,
    pub tls_curve: Option<TlsCurve>,
    pub certificate: Option<Certificate>,
    pub timestamp: Option<u64>,
    pub network_middleware: Option<RestMiddleware>,
    pub staking_agent: Option<Arc<StakingAgent>>,
}

#[derive(Debug, Clone)]
pub struct BobConfiguration {
    pub base: CharacterConfiguration,
}

impl BobConfiguration {
    pub const NAME: &'static str = "bob";
    pub const DEFAULT_CONTROLLER_PORT: u16 = 7151;

    pub fn defaults() -> CharacterDefaults {
        CharacterDefaults {
            rest_port: Self::DEFAULT_CONTROLLER_PORT,
            dev_rest_port: Self::DEFAULT_CONTROLLER_PORT,
            ..CharacterDefaults::default()
        }
    }

    pub fn assemble(options: BobOptions) -> Result<Self, ConfigError> {
        let base = CharacterConfiguration::assemble(options.character, &Self::defaults())?;
        Ok(Self { base })
    }

    // Bob adds nothing: his payloads are the base payloads.
    pub fn static_payload(&self) -> StaticPayload {
        self.base.static_payload()
    }

    pub fn dynamic_payload(&self) -> DynamicPayload {
        self.base.dynamic_payload()
    }

    pub fn generate_parameters(&self, overrides: BobOverrides) -> BobParameters {
        let statics = self.static_payload();
        let dynamics = self.dynamic_payload();
        BobParameters {
            account: overrides.account.unwrap_or(statics.account),
            rest_host: overrides.rest_host.unwrap_or(statics.rest_host),
            rest_port: overrides.rest_port.unwrap_or(statics.rest_port),
            tls_curve: overrides.tls_curve.unwrap_or(dynamics.tls_curve),
            certificate: overrides.certificate.or(dynamics.certificate),
            interface_signature: dynamics.interface_signature,
            timestamp: overrides.timestamp.unwrap_or(dynamics.timestamp),
            network_middleware: overrides
                .network_middleware
                .unwrap_or(dynamics.network_middleware),
            known_nodes: dynamics.known_nodes,
            staking_agent: overrides.staking_agent.or(dynamics.staking_agent),
            federated_only: statics.federated_only,
        }
    }

    /// Produce a new Bob from this configuration.
    pub fn produce(&mut self, overrides: BobOverrides) -> Result<Bob, ProductionError> {
        self.base.unlock_keyring()?;
        let mut parameters = self.generate_parameters(overrides);

        if !self.base.federated_only && self.base.staking_agent().is_none() {
            parameters.staking_agent = Some(self.base.connect_to_ledger()?);
        }

        let bob = Bob::new(parameters)?;
        self.base
            .persist_node_artifacts(&bob.metadata(), bob.certificate())?;

        CHARACTERS_PRODUCED.with_label_values(&[Bob::ROLE]).inc();
        info!(account = bob.account(), "Produced Bob");
        Ok(bob)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::Dispatch;
    use crate::keyring::PassphraseSource;
    use ledger::CompatLayer;
    use std::io::Write;

    const TOKEN_ABI: &str = r#"[
        {"constant":true,"inputs":[],"name":"totalSupply","outputs":[{"name":"","type":"uint256"}],"payable":false,"stateMutability":"view","type":"function"}
    ]"#;

    fn write_registry(dir: &Path) -> PathBuf {
        let raw = format!(
            r#"[
                {{"name":"UmbraToken","address":"0x0000000000000000000000000000000000000101","abi":{TOKEN_ABI}}},
                {{"name":"StakingEscrow","address":"0x0000000000000000000000000000000000000102","abi":{TOKEN_ABI}}}
            ]"#
        );
        let path = dir.join("contract_registry.json");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, "{raw}").unwrap();
        path
    }

    fn federated_options(dir: &Path) -> CharacterOptions {
        CharacterOptions {
            config_root: Some(dir.to_path_buf()),
            passphrase_source: Some(PassphraseSource::Explicit("test".to_string())),
            federated_only: true,
            temp: true,
            ..Default::default()
        }
    }

    fn ledger_options(dir: &Path) -> CharacterOptions {
        CharacterOptions {
            registry_filepath: Some(write_registry(dir)),
            federated_only: false,
            ..federated_options(dir)
        }
    }

    fn payload_keys(value: serde_json::Value) -> Vec<String> {
        value
            .as_object()
            .expect("payload serializes to an object")
            .keys()
            .cloned()
            .collect()
    }

    #[test]
    fn ursula_static_payload_is_a_key_superset_of_base() {
        let dir = tempfile::tempdir().unwrap();
        let config = UrsulaConfiguration::assemble(UrsulaOptions {
            character: federated_options(dir.path()),
            ..Default::default()
        })
        .unwrap();

        let base_keys = payload_keys(serde_json::to_value(config.base.static_payload()).unwrap());
        let ursula_keys = payload_keys(serde_json::to_value(config.static_payload()).unwrap());

        for key in &base_keys {
            assert!(ursula_keys.contains(key), "dropped inherited key {key}");
        }
        assert!(ursula_keys.contains(&"db_filepath".to_string()));
    }

    #[test]
    fn alice_static_payload_retains_base_keys_alongside_policy_keys() {
        // Regression: a merge returning the base mapping silently discards
        // the delegator's additions.
        let dir = tempfile::tempdir().unwrap();
        let config = AliceConfiguration::assemble(AliceOptions {
            character: federated_options(dir.path()),
            ..Default::default()
        })
        .unwrap();

        let base_keys = payload_keys(serde_json::to_value(config.base.static_payload()).unwrap());
        let alice_keys = payload_keys(serde_json::to_value(config.static_payload()).unwrap());

        for key in &base_keys {
            assert!(alice_keys.contains(key), "dropped inherited key {key}");
        }
        assert!(alice_keys.contains(&"m".to_string()));
        assert!(alice_keys.contains(&"n".to_string()));
    }

    #[test]
    fn alice_policy_economics_only_exist_in_ledger_mode() {
        let dir = tempfile::tempdir().unwrap();
        let config = AliceConfiguration::assemble(AliceOptions {
            character: federated_options(dir.path()),
            rate: Some(14),
            lock_periods: Some(30),
            ..Default::default()
        })
        .unwrap();

        let keys = payload_keys(serde_json::to_value(config.static_payload()).unwrap());
        assert!(!keys.contains(&"rate".to_string()));
        assert!(!keys.contains(&"lock_periods".to_string()));
        assert!(!keys.contains(&"first_period_reward".to_string()));
    }

    #[test]
    fn bob_inherits_the_base_payload_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let config = BobConfiguration::assemble(BobOptions {
            character: federated_options(dir.path()),
        })
        .unwrap();

        assert_eq!(config.static_payload(), config.base.static_payload());
    }

    #[test]
    fn override_beats_dynamic_value() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = UrsulaConfiguration::assemble(UrsulaOptions {
            character: federated_options(dir.path()),
            ..Default::default()
        })
        .unwrap();
        config.base.assign_certificate(Certificate {
            common_name: "127.0.0.1".to_string(),
            curve: TlsCurve::Secp384R1,
            der: vec![1; 32],
        });

        let forced = Certificate {
            common_name: "10.0.0.9".to_string(),
            curve: TlsCurve::Secp384R1,
            der: vec![2; 32],
        };
        let parameters = config.generate_parameters(UrsulaOverrides {
            certificate: Some(forced.clone()),
            timestamp: Some(42),
            ..Default::default()
        });

        assert_eq!(parameters.certificate, Some(forced));
        assert_eq!(parameters.timestamp, 42);
    }

    #[test]
    fn dynamic_value_beats_static_value() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = UrsulaConfiguration::assemble(UrsulaOptions {
            character: CharacterOptions {
                tls_curve: Some(TlsCurve::Secp256R1),
                ..federated_options(dir.path())
            },
            ..Default::default()
        })
        .unwrap();
        // The live certificate carries a different curve than the configured
        // static selection.
        config.base.assign_certificate(Certificate {
            common_name: "127.0.0.1".to_string(),
            curve: TlsCurve::Secp384R1,
            der: vec![1; 32],
        });

        assert_eq!(config.static_payload().base.tls_curve, TlsCurve::Secp256R1);
        let parameters = config.generate_parameters(UrsulaOverrides::default());
        assert_eq!(parameters.tls_curve, TlsCurve::Secp384R1);
    }

    #[test]
    fn federated_production_never_provisions() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = UrsulaConfiguration::assemble(UrsulaOptions {
            character: federated_options(dir.path()),
            ..Default::default()
        })
        .unwrap();

        let ursula = config.produce(UrsulaOverrides::default()).unwrap();
        assert!(ursula.staking_agent().is_none());
        assert!(config.base.staking_agent().is_none());
    }

    #[test]
    fn provisioning_runs_once_and_is_memoized() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = UrsulaConfiguration::assemble(UrsulaOptions {
            character: ledger_options(dir.path()),
            ..Default::default()
        })
        .unwrap();

        let first = config.produce(UrsulaOverrides::default()).unwrap();
        let memoized = config.base.staking_agent().expect("memoized agent");
        assert!(Arc::ptr_eq(&first.staking_agent().unwrap(), &memoized));

        let second = config.produce(UrsulaOverrides::default()).unwrap();
        assert!(Arc::ptr_eq(&second.staking_agent().unwrap(), &memoized));
    }

    #[test]
    fn poa_compatibility_is_injected_into_the_client() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = UrsulaConfiguration::assemble(UrsulaOptions {
            character: CharacterOptions {
                poa: true,
                ..ledger_options(dir.path())
            },
            ..Default::default()
        })
        .unwrap();

        let ursula = config.produce(UrsulaOverrides::default()).unwrap();
        let agent = ursula.staking_agent().unwrap();
        assert!(agent.client().has_middleware(CompatLayer::ProofOfAuthority));
    }

    #[test]
    fn runtime_filepaths_name_the_datastore_by_port() {
        let filepaths =
            UrsulaConfiguration::generate_runtime_filepaths(Path::new("/var/lib/umbra"), 9151);
        assert_eq!(
            filepaths.db_filepath,
            Some(PathBuf::from("/var/lib/umbra/ursula.9151.db"))
        );
        // Variant paths never displace the base set.
        assert_eq!(
            filepaths.node_metadata_filepath,
            PathBuf::from("/var/lib/umbra/node_metadata.json")
        );
    }

    #[test]
    fn federated_temporary_production_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = UrsulaConfiguration::assemble(UrsulaOptions {
            character: CharacterOptions {
                rest_port: Some(9151),
                ..federated_options(dir.path())
            },
            ..Default::default()
        })
        .unwrap();

        let ursula = config.produce(UrsulaOverrides::default()).unwrap();

        assert!(ursula.db_filepath().ends_with("ursula.9151.db"));
        assert!(ursula.staking_agent().is_none());

        // Ephemeral instances execute datastore work inline.
        let dispatch = ursula.commit_to_datastore("arrangement".to_string());
        assert!(matches!(dispatch, Dispatch::Completed(Ok(()))));

        // Announcement metadata and certificate are persisted on every call.
        assert!(dir.path().join("node_metadata.json").is_file());
        assert!(dir
            .path()
            .join("known_certificates/127.0.0.1.cert")
            .is_file());
    }

    #[test]
    fn alice_production_carries_policy_parameters() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AliceConfiguration::assemble(AliceOptions {
            character: federated_options(dir.path()),
            m: Some(3),
            n: Some(5),
            ..Default::default()
        })
        .unwrap();

        let alice = config.produce(AliceOverrides::default()).unwrap();
        assert_eq!(alice.policy_shape(), (3, 5));
        assert!(alice.policy_agent().is_none());
    }

    #[test]
    fn bob_production_succeeds_with_base_material_only() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = BobConfiguration::assemble(BobOptions {
            character: federated_options(dir.path()),
        })
        .unwrap();

        let bob = config.produce(BobOverrides::default()).unwrap();
        assert_eq!(bob.metadata().rest_port, BobConfiguration::DEFAULT_CONTROLLER_PORT);
    }
}
