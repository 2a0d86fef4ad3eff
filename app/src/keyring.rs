//! On-disk credential store backing character production.
//!
//! The keyring holds the node's TLS identity material under the keyring root
//! and gates it behind a passphrase. Key generation and signing internals are
//! opaque here; the configuration layer only orchestrates unlock, certificate
//! derivation and interface signing.

use ethers_core::utils::keccak256;
use rand::Rng;
use serde_derive::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum KeyringError {
    #[error("Keyring not initialized at {0}")]
    NotInitialized(PathBuf),
    #[error("Keyring already exists at {0}")]
    AlreadyExists(PathBuf),
    #[error("Wrong keyring passphrase")]
    WrongPassphrase,
    #[error("Keyring is locked")]
    Locked,
    #[error("Passphrase environment variable {0} is not set")]
    MissingPassphraseVar(String),
    #[error("Keyring IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Corrupt keyring material: {0}")]
    CorruptMaterial(String),
}

/// Where the unlock passphrase comes from at production time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassphraseSource {
    /// Supplied programmatically, e.g. by tests or embedders.
    Explicit(String),
    /// Read from the named environment variable when producing.
    EnvVar(String),
}

impl PassphraseSource {
    pub const DEFAULT_ENV_VAR: &'static str = "UMBRA_KEYRING_PASSPHRASE";

    pub fn resolve(&self) -> Result<String, KeyringError> {
        match self {
            PassphraseSource::Explicit(passphrase) => Ok(passphrase.clone()),
            PassphraseSource::EnvVar(var) => {
                std::env::var(var).map_err(|_| KeyringError::MissingPassphraseVar(var.clone()))
            }
        }
    }
}

impl Default for PassphraseSource {
    fn default() -> Self {
        PassphraseSource::EnvVar(Self::DEFAULT_ENV_VAR.to_string())
    }
}

/// TLS curve selection for the node's transport identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TlsCurve {
    #[default]
    #[serde(rename = "secp384r1")]
    Secp384R1,
    #[serde(rename = "secp256r1")]
    Secp256R1,
}

impl TlsCurve {
    pub fn as_str(&self) -> &'static str {
        match self {
            TlsCurve::Secp384R1 => "secp384r1",
            TlsCurve::Secp256R1 => "secp256r1",
        }
    }
}

impl fmt::Display for TlsCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TlsCurve {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "secp384r1" => Ok(TlsCurve::Secp384R1),
            "secp256r1" => Ok(TlsCurve::Secp256R1),
            other => Err(format!("Unknown TLS curve: {other}")),
        }
    }
}

/// Opaque TLS certificate material for one node interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
    pub common_name: String,
    pub curve: TlsCurve,
    pub der: Vec<u8>,
}

impl Certificate {
    pub fn encoded(&self) -> String {
        hex::encode(&self.der)
    }
}

/// Signature over a node's advertised REST interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterfaceSignature(pub [u8; 32]);

impl fmt::Display for InterfaceSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

const VERIFIER_SUFFIX: &str = "verifier";
const TLS_SUFFIX: &str = "tls";

/// The credential store. Attached cheaply, unlocked once per production call.
#[derive(Debug, Clone)]
pub struct Keyring {
    root: PathBuf,
    account: String,
    tls_secret: Option<[u8; 32]>,
}

impl Keyring {
    /// Attach to (possibly not yet existing) keyring material on disk.
    pub fn attach(root: PathBuf, account: String) -> Self {
        Self {
            root,
            account,
            tls_secret: None,
        }
    }

    /// Generate fresh keyring material, replacing nothing: generation into an
    /// already initialized keyring is an error.
    pub fn generate(
        root: PathBuf,
        account: String,
        passphrase: &str,
        host: &str,
        curve: TlsCurve,
    ) -> Result<Self, KeyringError> {
        let mut keyring = Self::attach(root, account);
        if keyring.is_initialized() {
            return Err(KeyringError::AlreadyExists(keyring.root));
        }
        std::fs::create_dir_all(&keyring.root)?;

        let salt: [u8; 16] = rand::thread_rng().gen();
        let secret: [u8; 32] = rand::thread_rng().gen();
        let digest = passphrase_digest(&salt, passphrase);

        std::fs::write(
            keyring.material_path(VERIFIER_SUFFIX),
            format!("{}\n{}\n", hex::encode(salt), hex::encode(digest)),
        )?;
        std::fs::write(keyring.material_path(TLS_SUFFIX), hex::encode(secret))?;

        info!(
            account = keyring.account,
            root = %keyring.root.display(),
            %curve,
            host,
            "Generated keyring material"
        );
        keyring.tls_secret = Some(secret);
        Ok(keyring)
    }

    fn material_path(&self, suffix: &str) -> PathBuf {
        self.root.join(format!("{}.{suffix}", self.account))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    pub fn is_initialized(&self) -> bool {
        self.material_path(VERIFIER_SUFFIX).is_file()
    }

    pub fn is_unlocked(&self) -> bool {
        self.tls_secret.is_some()
    }

    pub fn unlock(&mut self, passphrase: &str) -> Result<(), KeyringError> {
        if self.is_unlocked() {
            return Ok(());
        }
        if !self.is_initialized() {
            return Err(KeyringError::NotInitialized(self.root.clone()));
        }

        let verifier = std::fs::read_to_string(self.material_path(VERIFIER_SUFFIX))?;
        let mut lines = verifier.lines();
        let salt = decode_fixed::<16>(lines.next().unwrap_or_default())?;
        let digest = decode_fixed::<32>(lines.next().unwrap_or_default())?;

        if passphrase_digest(&salt, passphrase) != digest {
            return Err(KeyringError::WrongPassphrase);
        }

        let raw = std::fs::read_to_string(self.material_path(TLS_SUFFIX))?;
        self.tls_secret = Some(decode_fixed::<32>(raw.trim())?);
        Ok(())
    }

    fn secret(&self) -> Result<&[u8; 32], KeyringError> {
        self.tls_secret.as_ref().ok_or(KeyringError::Locked)
    }

    /// Derive the TLS certificate for the given interface host. Requires an
    /// unlocked keyring.
    pub fn derive_certificate(
        &self,
        host: &str,
        curve: TlsCurve,
    ) -> Result<Certificate, KeyringError> {
        let secret = self.secret()?;
        let material = [&secret[..], curve.as_str().as_bytes(), host.as_bytes()].concat();
        Ok(Certificate {
            common_name: host.to_string(),
            curve,
            der: keccak256(material).to_vec(),
        })
    }

    /// Sign the advertised REST interface. Requires an unlocked keyring.
    pub fn sign_interface(
        &self,
        host: &str,
        port: u16,
    ) -> Result<InterfaceSignature, KeyringError> {
        let secret = self.secret()?;
        let material = [&secret[..], host.as_bytes(), &port.to_be_bytes()].concat();
        Ok(InterfaceSignature(keccak256(material)))
    }
}

fn passphrase_digest(salt: &[u8], passphrase: &str) -> [u8; 32] {
    keccak256([salt, passphrase.as_bytes()].concat())
}

fn decode_fixed<const N: usize>(raw: &str) -> Result<[u8; N], KeyringError> {
    let bytes = hex::decode(raw).map_err(|e| KeyringError::CorruptMaterial(e.to_string()))?;
    bytes
        .try_into()
        .map_err(|_| KeyringError::CorruptMaterial("unexpected material length".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlocks_with_the_right_passphrase() {
        let dir = tempfile::tempdir().unwrap();
        Keyring::generate(
            dir.path().to_path_buf(),
            "operator".to_string(),
            "correct horse",
            "127.0.0.1",
            TlsCurve::Secp384R1,
        )
        .unwrap();

        let mut keyring = Keyring::attach(dir.path().to_path_buf(), "operator".to_string());
        assert!(!keyring.is_unlocked());
        keyring.unlock("correct horse").unwrap();
        assert!(keyring.is_unlocked());
    }

    #[test]
    fn rejects_a_wrong_passphrase() {
        let dir = tempfile::tempdir().unwrap();
        Keyring::generate(
            dir.path().to_path_buf(),
            "operator".to_string(),
            "correct horse",
            "127.0.0.1",
            TlsCurve::Secp384R1,
        )
        .unwrap();

        let mut keyring = Keyring::attach(dir.path().to_path_buf(), "operator".to_string());
        assert!(matches!(
            keyring.unlock("battery staple"),
            Err(KeyringError::WrongPassphrase)
        ));
    }

    #[test]
    fn locked_keyring_refuses_to_derive_identity() {
        let dir = tempfile::tempdir().unwrap();
        let keyring = Keyring::attach(dir.path().to_path_buf(), "operator".to_string());
        assert!(matches!(
            keyring.derive_certificate("127.0.0.1", TlsCurve::Secp384R1),
            Err(KeyringError::Locked)
        ));
    }

    #[test]
    fn certificate_is_stable_across_unlocks() {
        let dir = tempfile::tempdir().unwrap();
        let generated = Keyring::generate(
            dir.path().to_path_buf(),
            "operator".to_string(),
            "pass",
            "10.0.0.5",
            TlsCurve::Secp256R1,
        )
        .unwrap();
        let first = generated
            .derive_certificate("10.0.0.5", TlsCurve::Secp256R1)
            .unwrap();

        let mut reattached = Keyring::attach(dir.path().to_path_buf(), "operator".to_string());
        reattached.unlock("pass").unwrap();
        let second = reattached
            .derive_certificate("10.0.0.5", TlsCurve::Secp256R1)
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(first.common_name, "10.0.0.5");
    }

    #[test]
    fn passphrase_source_resolves_env_var() {
        std::env::set_var("UMBRA_TEST_PASSPHRASE", "from-env");
        let source = PassphraseSource::EnvVar("UMBRA_TEST_PASSPHRASE".to_string());
        assert_eq!(source.resolve().unwrap(), "from-env");

        let missing = PassphraseSource::EnvVar("UMBRA_TEST_PASSPHRASE_UNSET".to_string());
        assert!(matches!(
            missing.resolve(),
            Err(KeyringError::MissingPassphraseVar(_))
        ));
    }
}
