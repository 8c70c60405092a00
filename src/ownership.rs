use std::str::FromStr;

use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::onchain::{LookupError, StrategistSource};
use crate::vault::{SkippedVault, Vault};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AddressMatch {
    #[default]
    Exact,
    CaseInsensitive,
}

impl AddressMatch {
    pub fn matches(self, resolved: &str, target: &str) -> bool {
        match self {
            Self::Exact => resolved == target,
            Self::CaseInsensitive => resolved.eq_ignore_ascii_case(target),
        }
    }
}

#[derive(Debug, Error)]
#[error("unknown address match mode: {0}")]
pub struct AddressMatchParseError(pub String);

impl FromStr for AddressMatch {
    type Err = AddressMatchParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "exact" => Ok(Self::Exact),
            "case_insensitive" | "ci" => Ok(Self::CaseInsensitive),
            _ => Err(AddressMatchParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct OwnershipOutcome {
    /// Vaults whose strategist equals the target, with `strategist` attached.
    pub matched: Vec<Vault>,
    /// Vaults resolved to some other strategist.
    pub mismatched: Vec<Vault>,
    /// Vaults whose strategist lookup failed.
    pub skipped: Vec<SkippedVault>,
    /// Vaults on chains this tool has no RPC support for; never looked up.
    pub unsupported: Vec<SkippedVault>,
}

/// Resolve each vault's strategist and keep those owned by `target`.
///
/// Lookups run one at a time. A failed lookup only drops that vault and is
/// logged at warn level; vaults on unsupported chains are dropped quietly.
pub async fn filter_by_strategist(
    vaults: Vec<Vault>,
    source: &dyn StrategistSource,
    target: &str,
    mode: AddressMatch,
) -> OwnershipOutcome {
    let progress = progress_bar(vaults.len() as u64);
    let mut outcome = OwnershipOutcome::default();

    for mut vault in vaults {
        progress.inc(1);
        let Some(chain) = vault.supported_chain() else {
            let err = LookupError::UnsupportedChain(vault.chain.clone());
            debug!("skipping {}: {err}", vault.id);
            outcome.unsupported.push(SkippedVault::new(&vault.id, err.to_string()));
            continue;
        };
        let strategist = match source.strategist(chain, &vault.strategy).await {
            Ok(address) => address,
            Err(err) => {
                warn!("skipping {}: {err}", vault.id);
                outcome.skipped.push(SkippedVault::new(&vault.id, err.to_string()));
                continue;
            }
        };

        let is_match = mode.matches(&strategist, target);
        if !is_match && strategist.eq_ignore_ascii_case(target) {
            warn!(
                "{}: strategist {strategist} differs from target only by case; \
                 set strategist.address_match = \"case_insensitive\" to include it",
                vault.id
            );
        }
        vault.strategist = Some(strategist);
        if is_match {
            outcome.matched.push(vault);
        } else {
            outcome.mismatched.push(vault);
        }
    }

    progress.finish_and_clear();
    info!(
        "ownership filter: {} matched, {} other strategist, {} unresolved, {} on unsupported chains",
        outcome.matched.len(),
        outcome.mismatched.len(),
        outcome.skipped.len(),
        outcome.unsupported.len()
    );
    outcome
}

fn progress_bar(len: u64) -> ProgressBar {
    let bar = ProgressBar::new(len);
    if let Ok(style) = ProgressStyle::default_bar().template("  strategists [{bar:40}] {pos}/{len}") {
        bar.set_style(style);
    }
    bar
}
