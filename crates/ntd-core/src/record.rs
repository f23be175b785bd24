//! Canonical raw signal record: the one shape every file adapter produces
//!
//! A record is consumed read-only by the extractor for every signal spec
//! that references its file, so it is built once per source file and never
//! mutated afterwards.

use crate::error::{NtdError, NtdResult};
use crate::matrix::Matrix;
use crate::meta::MetaMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One sorted unit on one recording channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitLabel {
    /// Recording channel number
    pub channel: u16,
    /// Sort code; 255 conventionally marks unsortable noise
    pub unit: u8,
}

impl UnitLabel {
    pub fn new(channel: u16, unit: u8) -> Self {
        UnitLabel { channel, unit }
    }
}

/// Channel identifiers for a record. String names address dense columns;
/// (channel, unit) pairs address spike-source unit rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ChannelLabels {
    Names(Vec<String>),
    Units(Vec<UnitLabel>),
}

impl ChannelLabels {
    pub fn len(&self) -> usize {
        match self {
            ChannelLabels::Names(names) => names.len(),
            ChannelLabels::Units(units) => units.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Payload of a raw record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RecordData {
    /// Continuous samples: rows = samples, cols = channels
    Dense(Matrix),
    /// Spike timestamps in seconds, one ascending list per sorted unit
    SpikeTimes(Vec<Vec<f64>>),
}

/// Adapter output for one source file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawSignalRecord {
    /// Identity of this parse, for provenance in logs
    pub id: Uuid,
    /// Recording length in seconds. May be absent in event-only files and
    /// is then inferred as the max of all known durations in the call.
    pub duration: Option<f64>,
    /// Native sample rate in Hz. For spike sources this is the acquisition
    /// clock the timestamps were measured against.
    pub sample_rate: f64,
    /// Sample payload
    pub data: RecordData,
    /// Channel identifiers, parallel to the data
    pub labels: ChannelLabels,
    /// Open mapping of scalar session facts
    pub metadata: MetaMap,
}

impl RawSignalRecord {
    /// Create a record, validating that labels and data agree in arity
    pub fn new(
        duration: Option<f64>,
        sample_rate: f64,
        data: RecordData,
        labels: ChannelLabels,
        metadata: MetaMap,
    ) -> NtdResult<Self> {
        if sample_rate <= 0.0 {
            return Err(NtdError::InvalidSignalData {
                reason: format!("Sample rate must be positive, got {}", sample_rate),
            });
        }
        if let Some(d) = duration {
            if d <= 0.0 {
                return Err(NtdError::InvalidSignalData {
                    reason: format!("Duration must be positive, got {}", d),
                });
            }
        }

        match (&data, &labels) {
            (RecordData::Dense(matrix), ChannelLabels::Names(names)) => {
                if matrix.cols() != names.len() {
                    return Err(NtdError::InvalidSignalData {
                        reason: format!(
                            "{} channel names for a {}-column matrix",
                            names.len(),
                            matrix.cols()
                        ),
                    });
                }
            }
            (RecordData::SpikeTimes(trains), ChannelLabels::Units(units)) => {
                if trains.len() != units.len() {
                    return Err(NtdError::InvalidSignalData {
                        reason: format!(
                            "{} unit labels for {} spike trains",
                            units.len(),
                            trains.len()
                        ),
                    });
                }
            }
            (RecordData::Dense(_), ChannelLabels::Units(_)) => {
                return Err(NtdError::InvalidSignalData {
                    reason: "Dense data requires string channel names".to_string(),
                });
            }
            (RecordData::SpikeTimes(_), ChannelLabels::Names(_)) => {
                return Err(NtdError::InvalidSignalData {
                    reason: "Spike trains require (channel, unit) labels".to_string(),
                });
            }
        }

        Ok(RawSignalRecord {
            id: Uuid::new_v4(),
            duration,
            sample_rate,
            data,
            labels,
            metadata,
        })
    }

    /// Convenience constructor for continuous records
    pub fn dense(
        duration: Option<f64>,
        sample_rate: f64,
        matrix: Matrix,
        names: Vec<String>,
        metadata: MetaMap,
    ) -> NtdResult<Self> {
        Self::new(
            duration,
            sample_rate,
            RecordData::Dense(matrix),
            ChannelLabels::Names(names),
            metadata,
        )
    }

    /// Convenience constructor for spike-sorted records
    pub fn spikes(
        duration: Option<f64>,
        sample_rate: f64,
        trains: Vec<Vec<f64>>,
        units: Vec<UnitLabel>,
        metadata: MetaMap,
    ) -> NtdResult<Self> {
        Self::new(
            duration,
            sample_rate,
            RecordData::SpikeTimes(trains),
            ChannelLabels::Units(units),
            metadata,
        )
    }

    /// Number of channels (dense) or sorted units (spikes)
    pub fn channel_count(&self) -> usize {
        self.labels.len()
    }

    /// Duration from the dense sample count where the file did not state
    /// one. Spike sources stay unresolved here; their duration can only be
    /// inferred from the rest of the call.
    pub fn effective_duration(&self) -> Option<f64> {
        if self.duration.is_some() {
            return self.duration;
        }
        match &self.data {
            RecordData::Dense(matrix) if matrix.rows() > 0 => {
                Some(matrix.rows() as f64 / self.sample_rate)
            }
            _ => None,
        }
    }
}
