use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::enrich::{enrich, EnrichmentIssue};
use crate::group::group_by_chain;
use crate::onchain::StrategistSource;
use crate::ownership::{filter_by_strategist, AddressMatch};
use crate::report::IncomeReport;
use crate::snapshot::store::SnapshotStore;
use crate::sources::ReferenceSource;
use crate::vault::{active_vaults, SkippedVault, Vault};

/// What to do when a whole reference dataset cannot be fetched.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SourcePolicy {
    /// Abort the run.
    #[default]
    Strict,
    /// Continue with an empty dataset.
    Lenient,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Fetch the vault list and run the ownership filter.
    Fresh,
    /// Reuse the vaults saved by the last fresh run.
    Cached,
}

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub strategist: String,
    pub address_match: AddressMatch,
    pub fee_rate: f64,
    pub source_policy: SourcePolicy,
}

#[derive(Debug, Clone, Default)]
pub struct PipelineOutput {
    pub report: IncomeReport,
    pub issues: Vec<EnrichmentIssue>,
    /// Vaults whose strategist lookup failed; empty for cached runs. They are
    /// also listed in `report.skipped`.
    pub unresolved: Vec<SkippedVault>,
}

pub struct Pipeline<'a> {
    pub reference: &'a dyn ReferenceSource,
    pub strategists: &'a dyn StrategistSource,
    pub store: &'a SnapshotStore,
    pub settings: PipelineSettings,
}

impl Pipeline<'_> {
    pub async fn run(&self, mode: RunMode) -> Result<PipelineOutput> {
        let policy = self.settings.source_policy;
        let apy = resolve_source("APY data", policy, self.reference.fetch_apy().await)?;
        let tvl = resolve_source("TVL data", policy, self.reference.fetch_tvl().await)?;
        info!("loaded {} APY entries and {} TVL batches", apy.len(), tvl.batch_count());

        let (vaults, unresolved) = match mode {
            RunMode::Fresh => self.owned_vaults().await?,
            RunMode::Cached => (self.cached_vaults()?, Vec::new()),
        };

        let enrichment = enrich(vaults, &apy, &tvl, self.settings.fee_rate);
        let mut report = group_by_chain(&enrichment.vaults);
        report.skipped.extend(unresolved.iter().map(|skipped| {
            SkippedVault::new(&skipped.id, format!("strategist unresolved: {}", skipped.reason))
        }));

        if let Err(err) =
            self.store
                .save_report(&self.settings.strategist, self.settings.fee_rate, &report)
        {
            warn!("could not save report snapshot: {err}");
        }

        Ok(PipelineOutput {
            report,
            issues: enrichment.issues,
            unresolved,
        })
    }

    async fn owned_vaults(&self) -> Result<(Vec<Vault>, Vec<SkippedVault>)> {
        let listed = resolve_source(
            "vault list",
            self.settings.source_policy,
            self.reference.fetch_vaults().await,
        )?;
        let total = listed.len();
        let active = active_vaults(listed);
        info!("{} of {total} vaults are active", active.len());

        let outcome = filter_by_strategist(
            active,
            self.strategists,
            &self.settings.strategist,
            self.settings.address_match,
        )
        .await;

        if let Err(err) = self
            .store
            .save_vaults(&self.settings.strategist, &outcome.matched)
        {
            warn!("could not save vault snapshot: {err}");
        }
        Ok((outcome.matched, outcome.skipped))
    }

    fn cached_vaults(&self) -> Result<Vec<Vault>> {
        let snapshot = self
            .store
            .load_vaults(&self.settings.strategist, self.settings.address_match)?
            .ok_or_else(|| {
                anyhow!(
                    "no cached vaults at {}; run once without --cached",
                    self.store.vaults_path().display()
                )
            })?;
        info!(
            "using {} cached vaults saved at {}",
            snapshot.vaults.len(),
            snapshot.saved_at.to_rfc3339()
        );
        Ok(snapshot.vaults)
    }
}

fn resolve_source<T: Default>(name: &str, policy: SourcePolicy, fetched: Result<T>) -> Result<T> {
    match fetched {
        Ok(value) => Ok(value),
        Err(err) => match policy {
            SourcePolicy::Strict => Err(err.context(format!("failed fetching {name}"))),
            SourcePolicy::Lenient => {
                warn!("failed fetching {name}, continuing with no data: {err:#}");
                Ok(T::default())
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;

    use super::{resolve_source, SourcePolicy};

    #[test]
    fn strict_policy_propagates_and_lenient_defaults() {
        let strict: anyhow::Result<Vec<u8>> =
            resolve_source("vault list", SourcePolicy::Strict, Err(anyhow!("503")));
        let err = strict.expect_err("strict must fail");
        assert!(format!("{err:#}").contains("failed fetching vault list"));

        let lenient: Vec<u8> =
            resolve_source("vault list", SourcePolicy::Lenient, Err(anyhow!("503")))
                .expect("lenient must succeed");
        assert!(lenient.is_empty());
    }
}
