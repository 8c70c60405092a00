use serde::{Deserialize, Serialize};

use crate::chain::Chain;
use crate::vault::{SkippedVault, Vault};

pub const DAYS_PER_YEAR: f64 = 365.0;
pub const WEEKS_PER_YEAR: f64 = 52.0;
pub const MONTHS_PER_YEAR: f64 = 12.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Earnings {
    pub daily: f64,
    pub weekly: f64,
    pub monthly: f64,
    pub yearly: f64,
}

impl Earnings {
    pub fn from_yearly(yearly: f64) -> Self {
        Self {
            daily: yearly / DAYS_PER_YEAR,
            weekly: yearly / WEEKS_PER_YEAR,
            monthly: yearly / MONTHS_PER_YEAR,
            yearly,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChainBucket {
    pub chain: Chain,
    pub vaults: Vec<Vault>,
}

impl ChainBucket {
    pub fn new(chain: Chain) -> Self {
        Self {
            chain,
            vaults: Vec::new(),
        }
    }

    pub fn income_total(&self) -> f64 {
        self.vaults.iter().filter_map(|v| v.income).sum()
    }

    pub fn tvl_total(&self) -> f64 {
        self.vaults.iter().filter_map(|v| v.tvl).sum()
    }

    pub fn earnings(&self) -> Earnings {
        Earnings::from_yearly(self.income_total())
    }

    pub fn is_empty(&self) -> bool {
        self.vaults.is_empty()
    }
}

/// Income grouped by chain. Totals are always recomputed from the vaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct IncomeReport {
    pub chains: Vec<ChainBucket>,
    #[serde(default)]
    pub skipped: Vec<SkippedVault>,
}

impl IncomeReport {
    pub fn bucket(&self, chain: Chain) -> Option<&ChainBucket> {
        self.chains.iter().find(|b| b.chain == chain)
    }

    pub fn grand_income(&self) -> f64 {
        self.chains.iter().map(ChainBucket::income_total).sum()
    }

    pub fn grand_tvl(&self) -> f64 {
        self.chains.iter().map(ChainBucket::tvl_total).sum()
    }

    pub fn earnings(&self) -> Earnings {
        Earnings::from_yearly(self.grand_income())
    }

    pub fn vault_count(&self) -> usize {
        self.chains.iter().map(|b| b.vaults.len()).sum()
    }
}
