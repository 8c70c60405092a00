use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::tables::{ApyTable, Lookup, TvlTable};
use crate::vault::Vault;

/// Share of yearly yield paid to the strategist (0.5%).
pub const STRATEGIST_FEE_RATE: f64 = 0.005;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    ApyMissing,
    ApyMalformed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EnrichmentIssue {
    pub vault_id: String,
    pub kind: IssueKind,
    pub detail: String,
}

#[derive(Debug, Clone, Default)]
pub struct Enrichment {
    pub vaults: Vec<Vault>,
    pub issues: Vec<EnrichmentIssue>,
}

pub fn lookup_apy(table: &ApyTable, id: &str) -> Lookup<f64> {
    match table.get(id) {
        Lookup::Found(breakdown) if breakdown.vault_apr.is_finite() => {
            Lookup::Found(breakdown.vault_apr)
        }
        Lookup::Found(breakdown) => {
            Lookup::Failed(format!("non-finite vaultApr {} for {id}", breakdown.vault_apr))
        }
        Lookup::Miss => Lookup::Miss,
        Lookup::Failed(reason) => Lookup::Failed(reason),
    }
}

/// First TVL found scanning batches in order; `0.0` when no batch has the vault.
pub fn lookup_tvl(table: &TvlTable, id: &str) -> f64 {
    table
        .batches()
        .find_map(|(_, batch)| batch.get(id).copied())
        .unwrap_or(0.0)
}

pub fn compute_income(apy: f64, tvl: f64, fee_rate: f64) -> f64 {
    round2(apy * tvl * fee_rate)
}

/// Round to cents, ties to even.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

/// Attach TVL, APY and income to every vault.
///
/// TVL is always set. A vault without a usable APY ends with `apy` and
/// `income` unset, even if a cached record carried older values, and gets an
/// issue entry instead.
pub fn enrich(vaults: Vec<Vault>, apy: &ApyTable, tvl: &TvlTable, fee_rate: f64) -> Enrichment {
    let mut out = Enrichment::default();
    for mut vault in vaults {
        vault.apy = None;
        vault.income = None;
        let vault_tvl = lookup_tvl(tvl, &vault.id);
        vault.tvl = Some(vault_tvl);
        match lookup_apy(apy, &vault.id) {
            Lookup::Found(rate) => {
                vault.apy = Some(rate);
                vault.income = Some(compute_income(rate, vault_tvl, fee_rate));
            }
            Lookup::Miss => {
                warn!("no APY entry for {}", vault.id);
                out.issues.push(EnrichmentIssue {
                    vault_id: vault.id.clone(),
                    kind: IssueKind::ApyMissing,
                    detail: "vault not present in APY data".to_string(),
                });
            }
            Lookup::Failed(reason) => {
                warn!("unusable APY entry for {}: {reason}", vault.id);
                out.issues.push(EnrichmentIssue {
                    vault_id: vault.id.clone(),
                    kind: IssueKind::ApyMalformed,
                    detail: reason,
                });
            }
        }
        out.vaults.push(vault);
    }
    out
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{
        compute_income, enrich, lookup_apy, lookup_tvl, round2, IssueKind, STRATEGIST_FEE_RATE,
    };
    use crate::tables::{ApyTable, Lookup, TvlTable};
    use crate::vault::{Vault, VaultStatus};

    #[test]
    fn tvl_lookup_scans_batches_and_defaults_to_zero() {
        let mut table = TvlTable::default();
        table.insert("56", "bsc-vault", 250.0);
        table.insert("1284", "glmr-vault", 100_000.0);
        assert!((lookup_tvl(&table, "glmr-vault") - 100_000.0).abs() < 1e-9);
        assert!((lookup_tvl(&table, "bsc-vault") - 250.0).abs() < 1e-9);
        assert_eq!(lookup_tvl(&table, "nowhere"), 0.0);
    }

    #[test]
    fn tvl_lookup_prefers_first_batch_in_key_order() {
        let table = TvlTable::from_json(&json!({
            "b": { "dup": 2.0 },
            "a": { "dup": 1.0 }
        }));
        for _ in 0..3 {
            assert_eq!(lookup_tvl(&table, "dup"), 1.0);
        }
    }

    #[test]
    fn income_is_rounded_to_cents() {
        assert!((compute_income(0.10, 100_000.0, STRATEGIST_FEE_RATE) - 50.0).abs() < 1e-9);
        assert!((compute_income(0.1234, 3_333.0, STRATEGIST_FEE_RATE) - 2.06).abs() < 1e-9);
    }

    #[test]
    fn half_cent_income_rounds_to_even() {
        assert_eq!(compute_income(1.0, 25.0, STRATEGIST_FEE_RATE), 0.12);
        assert_eq!(compute_income(1.0, 75.0, STRATEGIST_FEE_RATE), 0.38);
        assert_eq!(round2(-0.125), -0.12);
    }

    #[test]
    fn apy_lookup_rejects_non_finite_rates() {
        let mut table = ApyTable::default();
        table.insert("inf", f64::INFINITY);
        assert!(matches!(lookup_apy(&table, "inf"), Lookup::Failed(_)));
        assert_eq!(lookup_apy(&table, "missing"), Lookup::Miss);
    }

    #[test]
    fn missing_apy_leaves_income_unset() {
        let mut apy = ApyTable::default();
        apy.insert("priced", 0.2);
        let mut tvl = TvlTable::default();
        tvl.insert("1284", "priced", 1_000.0);
        tvl.insert("1284", "unpriced", 5_000.0);
        let vaults = vec![
            Vault::new("priced", "moonbeam", "0x01", VaultStatus::Active),
            Vault::new("unpriced", "moonbeam", "0x02", VaultStatus::Active),
        ];

        let result = enrich(vaults, &apy, &tvl, STRATEGIST_FEE_RATE);

        assert_eq!(result.vaults.len(), 2);
        assert_eq!(result.vaults[0].income, Some(1.0));
        assert_eq!(result.vaults[1].tvl, Some(5_000.0));
        assert!(result.vaults[1].income.is_none());
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.issues[0].kind, IssueKind::ApyMissing);
    }
}
