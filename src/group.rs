use tracing::debug;

use crate::chain::Chain;
use crate::report::{ChainBucket, IncomeReport};
use crate::vault::{SkippedVault, Vault};

/// Partition enriched vaults into one bucket per supported chain.
///
/// Buckets follow `Chain::ALL` order and keep input order within a chain.
/// Vaults on other chains are dropped; vaults without income are listed as
/// skipped so they never reach a total.
pub fn group_by_chain(vaults: &[Vault]) -> IncomeReport {
    let mut chains: Vec<ChainBucket> = Chain::ALL.iter().copied().map(ChainBucket::new).collect();
    let mut skipped = Vec::new();

    for vault in vaults {
        let Some(chain) = vault.supported_chain() else {
            debug!("dropping {} on unsupported chain {}", vault.id, vault.chain);
            continue;
        };
        if vault.income.is_none() {
            skipped.push(SkippedVault::new(&vault.id, "no income (APY unavailable)"));
            continue;
        }
        if let Some(bucket) = chains.iter_mut().find(|b| b.chain == chain) {
            bucket.vaults.push(vault.clone());
        }
    }

    IncomeReport { chains, skipped }
}
