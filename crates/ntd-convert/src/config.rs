//! Conversion configuration and the thin JSON front end
//!
//! Every knob the pipeline consults lives here with a documented default.
//! Nothing in the pipeline reads module-level state.

use chrono::{DateTime, Utc};
use ntd_core::{LabelSelector, NtdError, NtdResult, SignalKind, SignalSpec};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Sort code conventionally assigned to unsortable noise
pub const NOISE_UNIT: u8 = 255;

/// EMG conditioning chain parameters: band-pass, rectify, envelope low-pass,
/// then decimation to the bin grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmgConditioning {
    /// Band-pass low corner (Hz)
    pub band_low: f64,
    /// Band-pass high corner (Hz)
    pub band_high: f64,
    /// Envelope low-pass cutoff applied after rectification (Hz)
    pub envelope_cutoff: f64,
    /// Butterworth order for each stage
    pub order: usize,
}

impl Default for EmgConditioning {
    fn default() -> Self {
        EmgConditioning {
            band_low: 20.0,
            band_high: 450.0,
            envelope_cutoff: 10.0,
            order: 4,
        }
    }
}

/// Parameters for one conversion call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionParams {
    /// Common bin width in seconds. Every time-indexed signal lands on this
    /// grid.
    pub bin_size: f64,
    /// Sort codes dropped from every spike source
    pub exclude_units: BTreeSet<u8>,
    /// Collapse all sort codes on a channel into one unit
    pub strip_sort: bool,
    /// Rising-edge threshold for trigger channels
    pub trigger_threshold: f64,
    /// EMG conditioning chain
    pub emg: EmgConditioning,
}

impl Default for ConversionParams {
    fn default() -> Self {
        ConversionParams {
            bin_size: 0.01,
            exclude_units: BTreeSet::from([NOISE_UNIT]),
            strip_sort: false,
            trigger_threshold: 1.0,
            emg: EmgConditioning::default(),
        }
    }
}

impl ConversionParams {
    /// Validate before any file is touched
    pub fn validate(&self) -> NtdResult<()> {
        if self.bin_size <= 0.0 {
            return Err(NtdError::InvalidConfig {
                reason: format!("Bin size must be positive, got {}", self.bin_size),
            });
        }
        if self.emg.band_low >= self.emg.band_high {
            return Err(NtdError::InvalidConfig {
                reason: format!(
                    "EMG band-pass corners inverted: {} >= {}",
                    self.emg.band_low, self.emg.band_high
                ),
            });
        }
        if self.emg.envelope_cutoff <= 0.0 {
            return Err(NtdError::InvalidConfig {
                reason: "EMG envelope cutoff must be positive".to_string(),
            });
        }
        if self.emg.order < 2 {
            return Err(NtdError::InvalidConfig {
                reason: format!("EMG filter order must be at least 2, got {}", self.emg.order),
            });
        }
        Ok(())
    }
}

/// Provenance record echoed back with every conversion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionSummary {
    pub bin_size: f64,
    pub exclude_units: BTreeSet<u8>,
    pub strip_sort: bool,
    pub trigger_threshold: f64,
    /// When the conversion ran
    pub timestamp: DateTime<Utc>,
}

impl ConversionSummary {
    pub fn from_params(params: &ConversionParams) -> Self {
        ConversionSummary {
            bin_size: params.bin_size,
            exclude_units: params.exclude_units.clone(),
            strip_sort: params.strip_sort,
            trigger_threshold: params.trigger_threshold,
            timestamp: Utc::now(),
        }
    }
}

/// JSON form of one signal request. Transforms are code, not config, so
/// they have no JSON representation; attach them after `resolve`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalSpecDef {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    /// Channel selection: absent = all, array of strings = by label,
    /// array of numbers = by zero-based index. Mixed arrays are rejected.
    #[serde(default)]
    pub channels: Option<serde_json::Value>,
}

impl SignalSpecDef {
    pub fn resolve(&self) -> NtdResult<SignalSpec> {
        let kind: SignalKind = self.kind.parse()?;
        let mut spec = SignalSpec::new(&self.name, kind);
        if let Some(value) = &self.channels {
            spec.selector = parse_selector(&self.name, value)?;
        }
        Ok(spec)
    }
}

/// JSON form of one source file entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceFileDef {
    pub path: PathBuf,
    /// Adapter name override; absent = dispatch by file extension
    #[serde(default)]
    pub adapter: Option<String>,
    pub signals: Vec<SignalSpecDef>,
}

impl SourceFileDef {
    pub fn resolve(&self) -> NtdResult<crate::pipeline::SourceFileSpec> {
        let signals = self
            .signals
            .iter()
            .map(SignalSpecDef::resolve)
            .collect::<NtdResult<Vec<_>>>()?;
        Ok(crate::pipeline::SourceFileSpec {
            path: self.path.clone(),
            adapter: self.adapter.clone(),
            signals,
        })
    }
}

/// Interpret a JSON channel selector. A list must be all strings or all
/// non-negative integers; anything else cannot be read one way.
pub fn parse_selector(signal: &str, value: &serde_json::Value) -> NtdResult<LabelSelector> {
    let items = match value {
        serde_json::Value::Null => return Ok(LabelSelector::All),
        serde_json::Value::Array(items) => items,
        other => {
            return Err(NtdError::AmbiguousSelector {
                signal: signal.to_string(),
                reason: format!("Expected an array of channels, got {}", other),
            })
        }
    };

    if items.is_empty() {
        return Ok(LabelSelector::All);
    }

    let all_strings = items.iter().all(|v| v.is_string());
    let all_numbers = items.iter().all(|v| v.is_u64());

    if all_strings {
        Ok(LabelSelector::Names(
            items
                .iter()
                .map(|v| v.as_str().unwrap_or_default().to_string())
                .collect(),
        ))
    } else if all_numbers {
        Ok(LabelSelector::Indices(
            items
                .iter()
                .map(|v| v.as_u64().unwrap_or_default() as usize)
                .collect(),
        ))
    } else {
        Err(NtdError::AmbiguousSelector {
            signal: signal.to_string(),
            reason: "Selector mixes labels and indices".to_string(),
        })
    }
}
