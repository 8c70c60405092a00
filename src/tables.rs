use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outcome of a single keyed lookup against reference data.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    Found(T),
    Miss,
    Failed(String),
}

impl<T> Lookup<T> {
    pub fn found(self) -> Option<T> {
        match self {
            Lookup::Found(value) => Some(value),
            Lookup::Miss | Lookup::Failed(_) => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApyBreakdown {
    pub vault_apr: f64,
}

/// Vault id to APY breakdown. Entries that did not parse are kept as `None` so a
/// lookup can tell "malformed" apart from "absent".
#[derive(Debug, Clone, Default)]
pub struct ApyTable {
    entries: HashMap<String, Option<ApyBreakdown>>,
}

impl ApyTable {
    pub fn from_json(value: &Value) -> Self {
        let mut entries = HashMap::new();
        if let Some(object) = value.as_object() {
            for (id, raw) in object {
                let parsed = serde_json::from_value::<ApyBreakdown>(raw.clone()).ok();
                entries.insert(id.clone(), parsed);
            }
        }
        Self { entries }
    }

    pub fn insert(&mut self, id: impl Into<String>, vault_apr: f64) {
        self.entries
            .insert(id.into(), Some(ApyBreakdown { vault_apr }));
    }

    pub fn get(&self, id: &str) -> Lookup<&ApyBreakdown> {
        match self.entries.get(id) {
            Some(Some(breakdown)) => Lookup::Found(breakdown),
            Some(None) => Lookup::Failed(format!("malformed APY entry for {id}")),
            None => Lookup::Miss,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Batch key to (vault id to TVL in USD). Batches iterate in key order.
#[derive(Debug, Clone, Default)]
pub struct TvlTable {
    batches: BTreeMap<String, BTreeMap<String, f64>>,
}

impl TvlTable {
    pub fn from_json(value: &Value) -> Self {
        let mut batches = BTreeMap::new();
        let Some(object) = value.as_object() else {
            return Self { batches };
        };
        for (key, batch) in object {
            let Some(batch) = batch.as_object() else {
                continue;
            };
            let values = batch
                .iter()
                .filter_map(|(id, v)| v.as_f64().map(|tvl| (id.clone(), tvl)))
                .collect::<BTreeMap<_, _>>();
            batches.insert(key.clone(), values);
        }
        Self { batches }
    }

    pub fn insert(&mut self, batch: impl Into<String>, id: impl Into<String>, tvl: f64) {
        self.batches
            .entry(batch.into())
            .or_default()
            .insert(id.into(), tvl);
    }

    pub fn batches(&self) -> impl Iterator<Item = (&String, &BTreeMap<String, f64>)> {
        self.batches.iter()
    }

    pub fn batch_count(&self) -> usize {
        self.batches.len()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{ApyBreakdown, ApyTable, Lookup, TvlTable};

    #[test]
    fn apy_table_separates_miss_from_malformed() {
        let table = ApyTable::from_json(&json!({
            "good": { "vaultApr": 0.12, "totalApy": 0.127 },
            "broken": { "totalApy": "n/a" }
        }));
        assert_eq!(table.len(), 2);
        assert!(matches!(table.get("good"), Lookup::Found(b) if (b.vault_apr - 0.12).abs() < 1e-12));
        assert!(matches!(table.get("broken"), Lookup::Failed(_)));
        assert_eq!(table.get("absent"), Lookup::Miss);
    }

    #[test]
    fn breakdown_keeps_only_vault_apr() {
        let table = ApyTable::from_json(&json!({
            "full": {
                "vaultApr": 0.3,
                "compoundingsPerYear": 2190,
                "beefyPerformanceFee": 0.045,
                "vaultApy": 0.349,
                "totalApy": 0.349
            }
        }));
        assert_eq!(table.get("full"), Lookup::Found(&ApyBreakdown { vault_apr: 0.3 }));
    }

    #[test]
    fn tvl_table_skips_non_numeric_values_and_non_object_batches() {
        let table = TvlTable::from_json(&json!({
            "1284": { "v1": 1000.5, "v2": null },
            "56": "oops",
            "137": { "v3": 42 }
        }));
        assert_eq!(table.batch_count(), 2);
        let keys: Vec<_> = table.batches().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["1284", "137"]);
    }
}
