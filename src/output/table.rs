use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, Color, ContentArrangement, Row, Table};

use crate::report::{ChainBucket, Earnings, IncomeReport};
use crate::vault::SkippedVault;

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn usd(value: f64) -> String {
    format!("{value:.2}$")
}

fn kilo_usd(value: f64) -> String {
    format!("{:.2}k$", value / 1000.0)
}

fn percent(rate: f64) -> String {
    format!("{:.2}%", rate * 100.0)
}

fn money_cells(earnings: &Earnings) -> Vec<Cell> {
    [earnings.daily, earnings.weekly, earnings.monthly, earnings.yearly]
        .into_iter()
        .map(|v| Cell::new(usd(v)).set_alignment(CellAlignment::Right))
        .collect()
}

pub fn render_chain_table(bucket: &ChainBucket) -> String {
    let mut table = new_table();
    table.set_header(vec![
        "Vault", "TVL", "APR", "$/day", "$/week", "$/month", "$/year",
    ]);

    for vault in &bucket.vaults {
        let earnings = Earnings::from_yearly(vault.income.unwrap_or(0.0));
        let mut cells = vec![
            Cell::new(&vault.id),
            Cell::new(kilo_usd(vault.tvl.unwrap_or(0.0))).set_alignment(CellAlignment::Right),
            Cell::new(vault.apy.map(percent).unwrap_or_else(|| "-".to_string()))
                .set_alignment(CellAlignment::Right),
        ];
        cells.extend(money_cells(&earnings));
        table.add_row(Row::from(cells));
    }

    let mut total = vec![
        Cell::new(format!("total {}", bucket.chain)).fg(Color::Green),
        Cell::new(kilo_usd(bucket.tvl_total())).set_alignment(CellAlignment::Right),
        Cell::new(""),
    ];
    total.extend(money_cells(&bucket.earnings()));
    table.add_row(Row::from(total));
    table.to_string()
}

pub fn render_totals_table(report: &IncomeReport) -> String {
    let mut table = new_table();
    table.set_header(vec![
        "Chain", "Vaults", "TVL", "$/day", "$/week", "$/month", "$/year",
    ]);
    for bucket in &report.chains {
        let mut cells = vec![
            Cell::new(bucket.chain.to_string()),
            Cell::new(bucket.vaults.len()).set_alignment(CellAlignment::Right),
            Cell::new(kilo_usd(bucket.tvl_total())).set_alignment(CellAlignment::Right),
        ];
        cells.extend(money_cells(&bucket.earnings()));
        table.add_row(Row::from(cells));
    }
    let mut total = vec![
        Cell::new("All chains").fg(Color::Green),
        Cell::new(report.vault_count()).set_alignment(CellAlignment::Right),
        Cell::new(kilo_usd(report.grand_tvl())).set_alignment(CellAlignment::Right),
    ];
    total.extend(money_cells(&report.earnings()));
    table.add_row(Row::from(total));
    table.to_string()
}

pub fn render_skipped_table(skipped: &[SkippedVault]) -> String {
    let mut table = new_table();
    table.set_header(vec!["Vault", "Reason"]);
    for item in skipped {
        table.add_row(vec![
            Cell::new(&item.id),
            Cell::new(&item.reason).fg(Color::Yellow),
        ]);
    }
    table.to_string()
}

/// Full console report: one section per chain, then the totals.
pub fn render_report(report: &IncomeReport) -> String {
    let mut out = String::new();
    for bucket in &report.chains {
        out.push_str(&format!("{}:\n", bucket.chain));
        if bucket.is_empty() {
            out.push_str("  no vaults\n\n");
            continue;
        }
        out.push_str(&render_chain_table(bucket));
        out.push_str("\n\n");
    }
    out.push_str("Totals:\n");
    out.push_str(&render_totals_table(report));
    if !report.skipped.is_empty() {
        out.push_str("\n\nLeft out of totals:\n");
        out.push_str(&render_skipped_table(&report.skipped));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{kilo_usd, percent, render_report};
    use crate::group::group_by_chain;
    use crate::vault::{Vault, VaultStatus};

    #[test]
    fn formats_units_like_the_console_report() {
        assert_eq!(kilo_usd(100_000.0), "100.00k$");
        assert_eq!(percent(0.1), "10.00%");
    }

    #[test]
    fn report_lists_every_chain_and_grand_total() {
        let mut vault = Vault::new("glmr-usdc", "moonbeam", "0xAA", VaultStatus::Active);
        vault.apy = Some(0.1);
        vault.tvl = Some(100_000.0);
        vault.income = Some(50.0);
        let rendered = render_report(&group_by_chain(&[vault]));

        assert!(rendered.contains("Moonbeam:"));
        assert!(rendered.contains("glmr-usdc"));
        assert!(rendered.contains("50.00$"));
        assert!(rendered.contains("Polygon:\n  no vaults"));
        assert!(rendered.contains("All chains"));
        assert!(!rendered.contains("Left out of totals"));
    }
}
