use anyhow::Result;

use crate::report::{Earnings, IncomeReport};

pub fn report_to_csv(report: &IncomeReport) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record([
        "chain",
        "vault",
        "strategist",
        "tvl_usd",
        "apr",
        "daily_usd",
        "weekly_usd",
        "monthly_usd",
        "yearly_usd",
    ])?;
    for bucket in &report.chains {
        for vault in &bucket.vaults {
            let earnings = Earnings::from_yearly(vault.income.unwrap_or(0.0));
            writer.write_record([
                bucket.chain.as_slug().to_string(),
                vault.id.clone(),
                vault.strategist.clone().unwrap_or_default(),
                format!("{:.2}", vault.tvl.unwrap_or(0.0)),
                vault.apy.map(|a| format!("{a:.6}")).unwrap_or_default(),
                format!("{:.2}", earnings.daily),
                format!("{:.2}", earnings.weekly),
                format!("{:.2}", earnings.monthly),
                format!("{:.2}", earnings.yearly),
            ])?;
        }
    }
    let data = writer.into_inner()?;
    Ok(String::from_utf8_lossy(&data).to_string())
}
