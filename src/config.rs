use std::fmt::Display;
use std::str::FromStr;

use alloy::primitives::Address;
use anyhow::Context;
use url::Url;

/// Deployment environment the client targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Network {
    /// In-process voting book, no chain required
    Development,
    Testnet,
    Mainnet,
}

impl FromStr for Network {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "development" | "dev" | "local" => Ok(Network::Development),
            "testnet" => Ok(Network::Testnet),
            "mainnet" => Ok(Network::Mainnet),
            other => Err(anyhow::anyhow!("unknown network: {other}")),
        }
    }
}

impl Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Network::Development => "development",
            Network::Testnet => "testnet",
            Network::Mainnet => "mainnet",
        };
        write!(f, "{name}")
    }
}

/// Where the client talks to, resolved once at startup.
#[derive(Clone, Debug)]
pub struct NetworkConfig {
    pub network: Network,
    pub rpc_url: Url,
    pub contract_address: Option<Address>,
}

impl NetworkConfig {
    /// Environment usage:
    /// - `DEVOTE_NETWORK`: development (default), testnet or mainnet
    /// - `DEVOTE_RPC_URL`: required outside development, defaults to the
    ///   local node otherwise
    /// - `DEVOTE_CONTRACT_ADDRESS`: required outside development
    pub fn from_env() -> anyhow::Result<Self> {
        let network: Network = std::env::var("DEVOTE_NETWORK")
            .unwrap_or_else(|_| "development".to_string())
            .parse()?;

        let rpc_url = match std::env::var("DEVOTE_RPC_URL") {
            Ok(raw) => raw
                .parse::<Url>()
                .context(format!("Failed to parse rpc url: {raw}"))?,
            Err(_) if network == Network::Development => Url::parse("http://localhost:8545")?,
            Err(_) => anyhow::bail!("DEVOTE_RPC_URL is not set"),
        };

        let contract_address = match std::env::var("DEVOTE_CONTRACT_ADDRESS") {
            Ok(raw) => Some(
                Address::from_str(&raw)
                    .context(format!("Failed to parse contract address: {raw}"))?,
            ),
            Err(_) if network == Network::Development => None,
            Err(_) => anyhow::bail!("DEVOTE_CONTRACT_ADDRESS is not set"),
        };

        Ok(Self {
            network,
            rpc_url,
            contract_address,
        })
    }
}
