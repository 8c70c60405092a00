use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::ownership::AddressMatch;
use crate::report::IncomeReport;
use crate::vault::Vault;

const VAULTS_FILE: &str = "vaults.json";
const REPORT_FILE: &str = "report.json";

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("snapshot {path} is not valid JSON: {source}")]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("vault snapshot was saved for strategist {saved}, not {target}; run once without --cached")]
    StrategistMismatch { saved: String, target: String },
}

/// Filtered vaults saved after the ownership filter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VaultSnapshot {
    pub saved_at: DateTime<Utc>,
    pub strategist: String,
    pub vaults: Vec<Vault>,
}

/// Final report, kept for offline replay.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportSnapshot {
    pub saved_at: DateTime<Utc>,
    pub strategist: String,
    pub fee_rate: f64,
    pub report: IncomeReport,
}

pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn open(dir: &Path) -> Result<Self, SnapshotError> {
        fs::create_dir_all(dir).map_err(|source| SnapshotError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    pub fn vaults_path(&self) -> PathBuf {
        self.dir.join(VAULTS_FILE)
    }

    pub fn report_path(&self) -> PathBuf {
        self.dir.join(REPORT_FILE)
    }

    pub fn save_vaults(&self, strategist: &str, vaults: &[Vault]) -> Result<(), SnapshotError> {
        let snapshot = VaultSnapshot {
            saved_at: Utc::now(),
            strategist: strategist.to_string(),
            vaults: vaults.to_vec(),
        };
        write_json(&self.vaults_path(), &snapshot)?;
        info!("saved {} vaults to {}", vaults.len(), self.vaults_path().display());
        Ok(())
    }

    /// `Ok(None)` when no snapshot has been written yet. A snapshot saved for
    /// another strategist is an error, compared with the same `mode` the
    /// ownership filter uses.
    pub fn load_vaults(
        &self,
        strategist: &str,
        mode: AddressMatch,
    ) -> Result<Option<VaultSnapshot>, SnapshotError> {
        let Some(snapshot) = read_json::<VaultSnapshot>(&self.vaults_path())? else {
            return Ok(None);
        };
        if !mode.matches(&snapshot.strategist, strategist) {
            return Err(SnapshotError::StrategistMismatch {
                saved: snapshot.strategist,
                target: strategist.to_string(),
            });
        }
        Ok(Some(snapshot))
    }

    pub fn save_report(
        &self,
        strategist: &str,
        fee_rate: f64,
        report: &IncomeReport,
    ) -> Result<(), SnapshotError> {
        let snapshot = ReportSnapshot {
            saved_at: Utc::now(),
            strategist: strategist.to_string(),
            fee_rate,
            report: report.clone(),
        };
        write_json(&self.report_path(), &snapshot)
    }

    pub fn load_report(&self) -> Result<Option<ReportSnapshot>, SnapshotError> {
        read_json(&self.report_path())
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), SnapshotError> {
    let data = serde_json::to_vec_pretty(value).map_err(|source| SnapshotError::Format {
        path: path.to_path_buf(),
        source,
    })?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, data)
        .and_then(|()| fs::rename(&tmp, path))
        .map_err(|source| SnapshotError::Io {
            path: path.to_path_buf(),
            source,
        })
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, SnapshotError> {
    let data = match fs::read(path) {
        Ok(data) => data,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(SnapshotError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    serde_json::from_slice(&data)
        .map(Some)
        .map_err(|source| SnapshotError::Format {
            path: path.to_path_buf(),
            source,
        })
}
