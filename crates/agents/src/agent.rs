use crate::{Error, LedgerClient};
use ethers::contract::Contract;
use ethers::providers::{Http, Provider};
use ethers::types::{Address, U256};
use std::sync::Arc;
use tracing::debug;

fn bind_contract(
    client: &LedgerClient,
    name: &str,
) -> Result<(Contract<Provider<Http>>, Address), Error> {
    let entry = client.registry().resolve(name)?;
    let contract = Contract::new(entry.address, entry.abi.clone(), client.provider());
    debug!(contract = name, address = ?entry.address, "Bound contract");
    Ok((contract, entry.address))
}

/// Binding to the network token contract.
#[derive(Clone, Debug)]
pub struct TokenAgent {
    client: Arc<LedgerClient>,
    contract: Contract<Provider<Http>>,
    address: Address,
}

impl TokenAgent {
    pub const CONTRACT_NAME: &'static str = "UmbraToken";

    pub fn new(client: Arc<LedgerClient>) -> Result<Self, Error> {
        let (contract, address) = bind_contract(&client, Self::CONTRACT_NAME)?;
        Ok(Self {
            client,
            contract,
            address,
        })
    }

    pub fn contract_address(&self) -> Address {
        self.address
    }

    pub fn client(&self) -> Arc<LedgerClient> {
        self.client.clone()
    }

    pub async fn total_supply(&self) -> Result<U256, Error> {
        self.contract
            .method::<_, U256>("totalSupply", ())
            .map_err(|e| Error::ContractCall(e.to_string()))?
            .call()
            .await
            .map_err(|e| Error::ContractCall(e.to_string()))
    }

    pub async fn balance_of(&self, owner: Address) -> Result<U256, Error> {
        self.contract
            .method::<_, U256>("balanceOf", owner)
            .map_err(|e| Error::ContractCall(e.to_string()))?
            .call()
            .await
            .map_err(|e| Error::ContractCall(e.to_string()))
    }
}

/// Binding to the staking escrow contract, derived from the token binding so
/// both agents share one client.
#[derive(Clone, Debug)]
pub struct StakingAgent {
    client: Arc<LedgerClient>,
    contract: Contract<Provider<Http>>,
    address: Address,
    token_address: Address,
}

impl StakingAgent {
    pub const CONTRACT_NAME: &'static str = "StakingEscrow";

    pub fn from_token_agent(token_agent: &TokenAgent) -> Result<Self, Error> {
        let client = token_agent.client();
        let (contract, address) = bind_contract(&client, Self::CONTRACT_NAME)?;
        Ok(Self {
            client,
            contract,
            address,
            token_address: token_agent.contract_address(),
        })
    }

    pub fn contract_address(&self) -> Address {
        self.address
    }

    pub fn token_address(&self) -> Address {
        self.token_address
    }

    pub fn client(&self) -> Arc<LedgerClient> {
        self.client.clone()
    }

    pub async fn locked_tokens(&self, staker: Address) -> Result<U256, Error> {
        self.contract
            .method::<_, U256>("getLockedTokens", staker)
            .map_err(|e| Error::ContractCall(e.to_string()))?
            .call()
            .await
            .map_err(|e| Error::ContractCall(e.to_string()))
    }
}

/// Binding to the policy manager contract, used by delegator characters.
#[derive(Clone, Debug)]
pub struct PolicyAgent {
    contract: Contract<Provider<Http>>,
    address: Address,
}

impl PolicyAgent {
    pub const CONTRACT_NAME: &'static str = "PolicyManager";

    pub fn new(client: Arc<LedgerClient>) -> Result<Self, Error> {
        let (contract, address) = bind_contract(&client, Self::CONTRACT_NAME)?;
        Ok(Self { contract, address })
    }

    pub fn contract_address(&self) -> Address {
        self.address
    }

    pub async fn fee_rate(&self) -> Result<U256, Error> {
        self.contract
            .method::<_, U256>("feeRate", ())
            .map_err(|e| Error::ContractCall(e.to_string()))?
            .call()
            .await
            .map_err(|e| Error::ContractCall(e.to_string()))
    }
}
