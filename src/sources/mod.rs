pub mod http;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use crate::tables::{ApyTable, TvlTable};
use crate::vault::Vault;

/// Upstream reference datasets, fetched once per run.
#[async_trait]
pub trait ReferenceSource: Send + Sync {
    async fn fetch_vaults(&self) -> Result<Vec<Vault>>;
    async fn fetch_apy(&self) -> Result<ApyTable>;
    async fn fetch_tvl(&self) -> Result<TvlTable>;
}

#[derive(Debug, Clone)]
pub struct BeefyClient {
    client: Client,
    base_url: String,
}

impl BeefyClient {
    pub fn new(base_url: impl Into<String>, timeout_secs: u64) -> Result<Self> {
        Ok(Self {
            client: http::build_client(timeout_secs)?,
            base_url: base_url.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        http::join_url(&self.base_url, path)
    }
}

#[async_trait]
impl ReferenceSource for BeefyClient {
    async fn fetch_vaults(&self) -> Result<Vec<Vault>> {
        let payload = http::fetch_json(&self.client, &self.url("vaults")).await?;
        Ok(parse_vault_list(&payload))
    }

    async fn fetch_apy(&self) -> Result<ApyTable> {
        let payload = http::fetch_json(&self.client, &self.url("apy/breakdown")).await?;
        Ok(ApyTable::from_json(&payload))
    }

    async fn fetch_tvl(&self) -> Result<TvlTable> {
        let payload = http::fetch_json(&self.client, &self.url("tvl")).await?;
        Ok(TvlTable::from_json(&payload))
    }
}

/// Parse the vault list, dropping entries that do not look like vaults.
pub fn parse_vault_list(payload: &Value) -> Vec<Vault> {
    let Some(entries) = payload.as_array() else {
        warn!("vault list response is not an array");
        return Vec::new();
    };
    let mut out = Vec::with_capacity(entries.len());
    for entry in entries {
        match serde_json::from_value::<Vault>(entry.clone()) {
            Ok(vault) => out.push(vault),
            Err(err) => {
                let id = entry.get("id").and_then(Value::as_str).unwrap_or("<no id>");
                warn!("skipping malformed vault entry {id}: {err}");
            }
        }
    }
    debug!("parsed {} of {} vault entries", out.len(), entries.len());
    out
}
