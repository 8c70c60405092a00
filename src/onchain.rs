use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use alloy::primitives::Address;
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::sol;
use anyhow::{Context, Result};
use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::chain::Chain;

sol! {
    #[allow(missing_docs)]
    #[sol(rpc)]
    contract IStrategy {
        function strategist() external view returns (address);
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LookupError {
    #[error("unsupported chain: {0}")]
    UnsupportedChain(String),
    #[error("no RPC endpoint configured for {0}")]
    NoEndpoint(Chain),
    #[error("invalid contract address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },
    #[error("strategist() call failed: {0}")]
    Call(String),
}

/// Resolves the strategist configured on a vault's strategy contract.
#[async_trait]
pub trait StrategistSource: Send + Sync {
    async fn strategist(&self, chain: Chain, contract: &str) -> Result<String, LookupError>;
}

/// RPC settings for one chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainEndpoint {
    pub url: String,
    pub call_timeout_secs: u64,
}

struct ChainProvider {
    provider: DynProvider,
    call_timeout: Duration,
}

pub struct RpcStrategistSource {
    providers: HashMap<Chain, ChainProvider>,
}

impl RpcStrategistSource {
    pub fn connect(endpoints: &BTreeMap<Chain, ChainEndpoint>) -> Result<Self> {
        let mut providers = HashMap::new();
        for (chain, endpoint) in endpoints {
            let url = &endpoint.url;
            let provider = ProviderBuilder::new()
                .connect_http(
                    url.parse()
                        .with_context(|| format!("invalid RPC url for {chain}: {url}"))?,
                )
                .erased();
            debug!(
                "configured RPC endpoint for {chain}: {url} (timeout {}s)",
                endpoint.call_timeout_secs
            );
            providers.insert(
                *chain,
                ChainProvider {
                    provider,
                    call_timeout: Duration::from_secs(endpoint.call_timeout_secs.max(1)),
                },
            );
        }
        Ok(Self { providers })
    }

    pub fn call_timeout(&self, chain: Chain) -> Option<Duration> {
        self.providers.get(&chain).map(|p| p.call_timeout)
    }

    pub fn chains(&self) -> Vec<Chain> {
        let mut chains: Vec<_> = self.providers.keys().copied().collect();
        chains.sort();
        chains
    }
}

#[async_trait]
impl StrategistSource for RpcStrategistSource {
    async fn strategist(&self, chain: Chain, contract: &str) -> Result<String, LookupError> {
        let entry = self
            .providers
            .get(&chain)
            .ok_or(LookupError::NoEndpoint(chain))?;
        let address = parse_address(contract)?;
        let strategy = IStrategy::new(address, &entry.provider);
        match tokio::time::timeout(entry.call_timeout, strategy.strategist().call()).await {
            Ok(Ok(strategist)) => Ok(strategist.to_checksum(None)),
            Ok(Err(err)) => Err(LookupError::Call(err.to_string())),
            Err(_) => Err(LookupError::Call(format!(
                "timeout ({}s)",
                entry.call_timeout.as_secs()
            ))),
        }
    }
}

pub fn parse_address(raw: &str) -> Result<Address, LookupError> {
    raw.trim()
        .parse::<Address>()
        .map_err(|err| LookupError::InvalidAddress {
            address: raw.to_string(),
            reason: err.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::time::Duration;

    use super::{parse_address, ChainEndpoint, LookupError, RpcStrategistSource, StrategistSource};
    use crate::chain::Chain;

    #[test]
    fn rejects_malformed_contract_addresses() {
        assert!(matches!(
            parse_address("0x1234"),
            Err(LookupError::InvalidAddress { .. })
        ));
        assert!(parse_address("0xc75E1B127E288f1a33606a52AB5C91BBe64EaAfe").is_ok());
    }

    fn endpoint(url: &str, call_timeout_secs: u64) -> ChainEndpoint {
        ChainEndpoint {
            url: url.to_string(),
            call_timeout_secs,
        }
    }

    #[tokio::test]
    async fn chain_without_endpoint_fails_without_network() {
        let mut endpoints = BTreeMap::new();
        endpoints.insert(Chain::Moonbeam, endpoint("http://127.0.0.1:9", 1));
        let source = RpcStrategistSource::connect(&endpoints).expect("connect");
        assert_eq!(source.chains(), vec![Chain::Moonbeam]);
        let result = source
            .strategist(Chain::Bsc, "0xc75E1B127E288f1a33606a52AB5C91BBe64EaAfe")
            .await;
        assert_eq!(result, Err(LookupError::NoEndpoint(Chain::Bsc)));
    }

    #[test]
    fn each_chain_keeps_its_own_call_timeout() {
        let mut endpoints = BTreeMap::new();
        endpoints.insert(Chain::Bsc, endpoint("http://127.0.0.1:9", 5));
        endpoints.insert(Chain::Polygon, endpoint("http://127.0.0.1:9", 20));
        endpoints.insert(Chain::Avax, endpoint("http://127.0.0.1:9", 0));
        let source = RpcStrategistSource::connect(&endpoints).expect("connect");

        assert_eq!(source.call_timeout(Chain::Bsc), Some(Duration::from_secs(5)));
        assert_eq!(source.call_timeout(Chain::Polygon), Some(Duration::from_secs(20)));
        assert_eq!(source.call_timeout(Chain::Avax), Some(Duration::from_secs(1)));
        assert_eq!(source.call_timeout(Chain::Moonbeam), None);
    }
}
