use crate::Error;
use ethers::abi::Abi;
use ethers::types::Address;
use serde_derive::Deserialize;
use std::path::Path;

/// One deployed contract as recorded in the registry file.
#[derive(Clone, Debug, Deserialize)]
pub struct RegistryEntry {
    pub name: String,
    pub address: Address,
    pub abi: Abi,
}

/// The set of deployed contracts this node knows how to bind to, loaded from
/// a JSON registry file.
#[derive(Clone, Debug, Default)]
pub struct ContractRegistry {
    entries: Vec<RegistryEntry>,
}

impl ContractRegistry {
    pub fn from_filepath(path: &Path) -> Result<Self, Error> {
        let raw = std::fs::read_to_string(path)?;
        let entries: Vec<RegistryEntry> = serde_json::from_str(&raw)?;
        Ok(Self { entries })
    }

    pub fn resolve(&self, name: &str) -> Result<&RegistryEntry, Error> {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .ok_or_else(|| Error::UnknownContract(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
