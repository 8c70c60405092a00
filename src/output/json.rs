use anyhow::Result;
use serde::Serialize;

use crate::chain::Chain;
use crate::report::{Earnings, IncomeReport};
use crate::vault::{SkippedVault, Vault};

pub fn render_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

#[derive(Debug, Serialize)]
struct ChainView<'a> {
    chain: Chain,
    vaults: &'a [Vault],
    tvl_usd: f64,
    earnings: Earnings,
}

#[derive(Debug, Serialize)]
struct ReportView<'a> {
    chains: Vec<ChainView<'a>>,
    skipped: &'a [SkippedVault],
    tvl_usd: f64,
    earnings: Earnings,
}

/// JSON form of the report with the derived totals filled in.
pub fn render_report_json(report: &IncomeReport) -> Result<String> {
    let view = ReportView {
        chains: report
            .chains
            .iter()
            .map(|bucket| ChainView {
                chain: bucket.chain,
                vaults: &bucket.vaults,
                tvl_usd: bucket.tvl_total(),
                earnings: bucket.earnings(),
            })
            .collect(),
        skipped: &report.skipped,
        tvl_usd: report.grand_tvl(),
        earnings: report.earnings(),
    };
    render_json(&view)
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::render_report_json;
    use crate::group::group_by_chain;
    use crate::vault::{Vault, VaultStatus};

    #[test]
    fn includes_chain_and_grand_totals() {
        let mut vault = Vault::new("v1", "avax", "0xAA", VaultStatus::Active);
        vault.income = Some(120.0);
        vault.tvl = Some(1_000.0);
        let json = render_report_json(&group_by_chain(&[vault])).expect("json");
        let value: Value = serde_json::from_str(&json).expect("valid json");

        assert_eq!(value["earnings"]["yearly"], 120.0);
        assert_eq!(value["earnings"]["monthly"], 10.0);
        assert_eq!(value["chains"][2]["chain"], "avax");
        assert_eq!(value["chains"][2]["tvl_usd"], 1_000.0);
    }
}
