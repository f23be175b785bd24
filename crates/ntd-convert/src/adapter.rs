//! Raw file adapters and their registry
//!
//! Vendor formats stay behind this trait: an adapter owns all parsing for
//! its extensions and hands back the canonical record. The registry
//! dispatches by extension unless a source entry names an adapter
//! explicitly.

use ntd_core::{Matrix, MetaMap, NtdError, NtdResult, RawSignalRecord, UnitLabel};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Per-format parser producing the canonical signal record
pub trait RawAdapter: Send + Sync {
    /// Adapter identifier, usable as a per-source override
    fn name(&self) -> &str;

    /// File extensions (lowercase, no dot) this adapter claims
    fn extensions(&self) -> &[&str];

    /// Parse one file. Blocking; called once per distinct path per
    /// conversion.
    fn parse(&self, path: &Path) -> NtdResult<RawSignalRecord>;
}

/// Adapter collection with extension-based dispatch
pub struct AdapterRegistry {
    adapters: Vec<Box<dyn RawAdapter>>,
}

impl AdapterRegistry {
    /// Empty registry
    pub fn new() -> Self {
        AdapterRegistry { adapters: Vec::new() }
    }

    /// Registry with the built-in adapters
    pub fn with_defaults() -> Self {
        let mut registry = AdapterRegistry::new();
        registry.register(Box::new(JsonAdapter));
        registry
    }

    pub fn register(&mut self, adapter: Box<dyn RawAdapter>) {
        self.adapters.push(adapter);
    }

    /// Look up an adapter by its name
    pub fn by_name(&self, name: &str) -> Option<&dyn RawAdapter> {
        self.adapters
            .iter()
            .find(|a| a.name() == name)
            .map(|a| a.as_ref())
    }

    /// Dispatch by file extension
    pub fn for_path(&self, path: &Path) -> NtdResult<&dyn RawAdapter> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        self.adapters
            .iter()
            .find(|a| a.extensions().contains(&extension.as_str()))
            .map(|a| a.as_ref())
            .ok_or_else(|| NtdError::FileFormat {
                path: path.display().to_string(),
                reason: format!("No adapter registered for extension {:?}", extension),
            })
    }
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Built-in adapter for canonical records stored as JSON.
///
/// File schema mirrors the record: `duration` (optional), `sample_rate`,
/// `data` as either `{"dense": [[row], ...]}` or
/// `{"spike_times": [[t, ...], ...]}`, `labels` as either
/// `{"names": [...]}` or `{"units": [{"channel": c, "unit": u}, ...]}`,
/// and an optional `metadata` object.
pub struct JsonAdapter;

#[derive(Deserialize)]
#[serde(rename_all = "snake_case")]
enum FileData {
    Dense(Vec<Vec<f64>>),
    SpikeTimes(Vec<Vec<f64>>),
}

#[derive(Deserialize)]
#[serde(rename_all = "snake_case")]
enum FileLabels {
    Names(Vec<String>),
    Units(Vec<UnitLabel>),
}

#[derive(Deserialize)]
struct RecordFile {
    duration: Option<f64>,
    sample_rate: f64,
    data: FileData,
    labels: FileLabels,
    #[serde(default)]
    metadata: MetaMap,
}

impl JsonAdapter {
    fn build_record(path: &Path, file: RecordFile) -> NtdResult<RawSignalRecord> {
        let record = match (file.data, file.labels) {
            (FileData::Dense(rows), FileLabels::Names(names)) => {
                let matrix = dense_matrix(path, rows)?;
                RawSignalRecord::dense(file.duration, file.sample_rate, matrix, names, file.metadata)
            }
            (FileData::SpikeTimes(trains), FileLabels::Units(units)) => {
                RawSignalRecord::spikes(file.duration, file.sample_rate, trains, units, file.metadata)
            }
            _ => Err(NtdError::InvalidSignalData {
                reason: "Label kind doesn't match data kind".to_string(),
            }),
        };

        record.map_err(|e| NtdError::Parse {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }
}

fn dense_matrix(path: &Path, rows: Vec<Vec<f64>>) -> NtdResult<Matrix> {
    let cols = rows.first().map_or(0, |r| r.len());
    for (i, row) in rows.iter().enumerate() {
        if row.len() != cols {
            return Err(NtdError::Parse {
                path: path.display().to_string(),
                reason: format!("Row {} has {} values, expected {}", i, row.len(), cols),
            });
        }
    }
    let n_rows = rows.len();
    Matrix::new(n_rows, cols, rows.into_iter().flatten().collect())
}

impl RawAdapter for JsonAdapter {
    fn name(&self) -> &str {
        "json"
    }

    fn extensions(&self) -> &[&str] {
        &["json"]
    }

    fn parse(&self, path: &Path) -> NtdResult<RawSignalRecord> {
        let text = fs::read_to_string(path).map_err(|e| NtdError::Parse {
            path: path.display().to_string(),
            reason: format!("Read failed: {}", e),
        })?;

        let file: RecordFile = serde_json::from_str(&text).map_err(|e| NtdError::Parse {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        Self::build_record(path, file)
    }
}
