use serde::{Deserialize, Serialize};

use crate::chain::Chain;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VaultStatus {
    Active,
    #[serde(other)]
    Other,
}

/// A vault as listed by the finance API, plus the fields the pipeline fills in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Vault {
    pub id: String,
    pub chain: String,
    #[serde(default)]
    pub strategy: String,
    pub status: VaultStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategist: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apy: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tvl: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub income: Option<f64>,
}

impl Vault {
    pub fn new(
        id: impl Into<String>,
        chain: impl Into<String>,
        strategy: impl Into<String>,
        status: VaultStatus,
    ) -> Self {
        Self {
            id: id.into(),
            chain: chain.into(),
            strategy: strategy.into(),
            status,
            strategist: None,
            apy: None,
            tvl: None,
            income: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == VaultStatus::Active
    }

    /// `None` when the upstream chain is outside the supported set.
    pub fn supported_chain(&self) -> Option<Chain> {
        self.chain.parse().ok()
    }
}

/// A vault left out of a stage, with the reason it was dropped.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SkippedVault {
    pub id: String,
    pub reason: String,
}

impl SkippedVault {
    pub fn new(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            reason: reason.into(),
        }
    }
}

/// Keep only vaults whose upstream status is `active`.
pub fn active_vaults(vaults: Vec<Vault>) -> Vec<Vault> {
    vaults.into_iter().filter(Vault::is_active).collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{active_vaults, Vault, VaultStatus};
    use crate::chain::Chain;

    #[test]
    fn deserializes_upstream_vault_and_ignores_extra_fields() {
        let payload = json!({
            "id": "stellaswap-glmr-usdc",
            "name": "GLMR-USDC LP",
            "chain": "moonbeam",
            "strategy": "0x00000000000000000000000000000000000000AA",
            "status": "eol",
            "platformId": "stellaswap"
        });
        let vault: Vault = serde_json::from_value(payload).expect("vault should parse");
        assert_eq!(vault.status, VaultStatus::Other);
        assert_eq!(vault.supported_chain(), Some(Chain::Moonbeam));
        assert!(vault.income.is_none());
    }

    #[test]
    fn unsupported_chain_has_no_chain_enum() {
        let vault = Vault::new("v", "fantom", "0x01", VaultStatus::Active);
        assert!(vault.supported_chain().is_none());
    }

    #[test]
    fn active_filter_drops_other_statuses() {
        let vaults = vec![
            Vault::new("a", "moonbeam", "0x01", VaultStatus::Active),
            Vault::new("b", "moonbeam", "0x02", VaultStatus::Other),
            Vault::new("c", "bsc", "0x03", VaultStatus::Active),
        ];
        let ids: Vec<_> = active_vaults(vaults).into_iter().map(|v| v.id).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }
}
