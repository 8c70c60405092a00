use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::chain::Chain;
use crate::enrich::STRATEGIST_FEE_RATE;
use crate::onchain::ChainEndpoint;
use crate::ownership::AddressMatch;
use crate::pipeline::SourcePolicy;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub strategist: StrategistConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default = "default_chains")]
    pub chains: BTreeMap<String, ChainConfig>,
    #[serde(default)]
    pub income: IncomeConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StrategistConfig {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub address_match: AddressMatch,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub source_policy: SourcePolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    pub rpc_url: String,
    #[serde(default = "default_timeout_secs")]
    pub call_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomeConfig {
    #[serde(default = "default_fee_rate")]
    pub fee_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_snapshot_dir")]
    pub snapshot_dir: String,
    #[serde(default)]
    pub abi_path: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub strategist: Option<String>,
    pub snapshot_dir: Option<String>,
    pub case_insensitive: bool,
}

impl Config {
    pub fn default_path() -> PathBuf {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        home.join(".config/strategist-income/config.toml")
    }

    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path
            .map(|p| p.to_path_buf())
            .unwrap_or_else(Self::default_path);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = fs::read_to_string(&path)
            .with_context(|| format!("failed reading config: {}", path.display()))?;
        Self::from_toml(&data)
            .with_context(|| format!("failed parsing TOML config: {}", path.display()))
    }

    pub fn from_toml(data: &str) -> Result<Self> {
        Ok(toml::from_str(data)?)
    }

    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(strategist) = overrides.strategist {
            self.strategist.address = strategist;
        }
        if let Some(dir) = overrides.snapshot_dir {
            self.storage.snapshot_dir = dir;
        }
        if overrides.case_insensitive {
            self.strategist.address_match = AddressMatch::CaseInsensitive;
        }
    }

    /// Checks the settings every pipeline run depends on.
    pub fn validate(&self) -> Result<()> {
        if self.strategist.address.trim().is_empty() {
            return Err(anyhow!(
                "no target strategist configured; set [strategist] address or pass --strategist"
            ));
        }
        if !self.income.fee_rate.is_finite() || self.income.fee_rate < 0.0 {
            return Err(anyhow!("invalid fee rate: {}", self.income.fee_rate));
        }
        Ok(())
    }

    pub fn rpc_endpoints(&self) -> Result<BTreeMap<Chain, ChainEndpoint>> {
        let mut endpoints = BTreeMap::new();
        for (slug, cfg) in &self.chains {
            let chain: Chain = slug
                .parse()
                .with_context(|| format!("invalid [chains.{slug}] section"))?;
            endpoints.insert(
                chain,
                ChainEndpoint {
                    url: cfg.rpc_url.clone(),
                    call_timeout_secs: cfg.call_timeout_secs,
                },
            );
        }
        Ok(endpoints)
    }

    pub fn write_template(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed creating config directory: {}", parent.display())
            })?;
        }
        fs::write(path, Self::default_template())
            .with_context(|| format!("failed writing config template: {}", path.display()))
    }

    pub fn resolved_snapshot_dir(&self) -> PathBuf {
        expand_tilde(&self.storage.snapshot_dir)
    }

    pub fn resolved_abi_path(&self) -> Option<PathBuf> {
        self.storage.abi_path.as_deref().map(expand_tilde)
    }

    pub fn default_template() -> String {
        let template = r#"[strategist]
address = "0xYourStrategistAddress"
# "exact" or "case_insensitive"
address_match = "exact"

[api]
base_url = "https://api.beefy.finance/"
timeout_secs = 20
# "strict" aborts when a reference dataset cannot be fetched, "lenient" reports on empty data
source_policy = "strict"

[chains.moonbeam]
rpc_url = "https://rpc.api.moonbeam.network"
# seconds allowed for each strategist() call on this chain
call_timeout_secs = 20

# [chains.polygon]
# rpc_url = "https://polygon-rpc.com"
#
# [chains.avax]
# rpc_url = "https://api.avax.network/ext/bc/C/rpc"
#
# [chains.bsc]
# rpc_url = "https://bsc-dataseed.binance.org"

[income]
fee_rate = 0.005

[storage]
snapshot_dir = "~/.local/share/strategist-income"
# abi_path = "~/.config/strategist-income/ABI.json"
"#;
        template.to_string()
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            strategist: StrategistConfig::default(),
            api: ApiConfig::default(),
            chains: default_chains(),
            income: IncomeConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            source_policy: SourcePolicy::default(),
        }
    }
}

impl Default for IncomeConfig {
    fn default() -> Self {
        Self {
            fee_rate: default_fee_rate(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            snapshot_dir: default_snapshot_dir(),
            abi_path: None,
        }
    }
}

fn default_chains() -> BTreeMap<String, ChainConfig> {
    let mut chains = BTreeMap::new();
    chains.insert(
        Chain::Moonbeam.as_slug().to_string(),
        ChainConfig {
            rpc_url: Chain::Moonbeam.default_rpc_url().to_string(),
            call_timeout_secs: default_timeout_secs(),
        },
    );
    chains
}

fn default_base_url() -> String {
    "https://api.beefy.finance/".to_string()
}

fn default_timeout_secs() -> u64 {
    20
}

fn default_fee_rate() -> f64 {
    STRATEGIST_FEE_RATE
}

fn default_snapshot_dir() -> String {
    "~/.local/share/strategist-income".to_string()
}

#[cfg(test)]
mod tests {
    use super::{Config, ConfigOverrides};
    use crate::chain::Chain;
    use crate::ownership::AddressMatch;
    use crate::pipeline::SourcePolicy;

    #[test]
    fn template_parses_with_moonbeam_endpoint() {
        let config = Config::from_toml(&Config::default_template()).expect("template parses");
        let endpoints = config.rpc_endpoints().expect("endpoints");
        assert_eq!(endpoints.len(), 1);
        assert!(endpoints.contains_key(&Chain::Moonbeam));
        assert_eq!(config.strategist.address_match, AddressMatch::Exact);
        assert_eq!(config.api.source_policy, SourcePolicy::Strict);
        assert!((config.income.fee_rate - 0.005).abs() < 1e-12);
    }

    #[test]
    fn empty_file_falls_back_to_defaults() {
        let config = Config::from_toml("").expect("empty parses");
        assert_eq!(config.api.base_url, "https://api.beefy.finance/");
        assert!(config.validate().is_err());
    }

    #[test]
    fn parses_multiple_chains_and_lenient_policy() {
        let config = Config::from_toml(
            r#"
[strategist]
address = "0xc75E1B127E288f1a33606a52AB5C91BBe64EaAfe"
address_match = "case_insensitive"

[api]
source_policy = "lenient"

[chains.bsc]
rpc_url = "https://bsc-dataseed.binance.org"
call_timeout_secs = 5

[chains.polygon]
rpc_url = "https://polygon-rpc.com"
"#,
        )
        .expect("config parses");
        let endpoints = config.rpc_endpoints().expect("endpoints");
        assert_eq!(endpoints.keys().copied().collect::<Vec<_>>(), vec![Chain::Polygon, Chain::Bsc]);
        assert_eq!(endpoints[&Chain::Bsc].call_timeout_secs, 5);
        assert_eq!(endpoints[&Chain::Polygon].call_timeout_secs, 20);
        assert_eq!(config.api.source_policy, SourcePolicy::Lenient);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn unknown_chain_section_is_rejected() {
        let config = Config::from_toml(
            r#"
[chains.fantom]
rpc_url = "https://rpc.ftm.tools"
"#,
        )
        .expect("config parses");
        assert!(config.rpc_endpoints().is_err());
    }

    #[test]
    fn overrides_replace_loaded_values() {
        let mut config = Config::default();
        config.apply_overrides(ConfigOverrides {
            strategist: Some("0xabc".to_string()),
            snapshot_dir: Some("/tmp/income".to_string()),
            case_insensitive: true,
        });
        assert_eq!(config.strategist.address, "0xabc");
        assert_eq!(config.resolved_snapshot_dir().to_str(), Some("/tmp/income"));
        assert_eq!(config.strategist.address_match, AddressMatch::CaseInsensitive);
    }
}
