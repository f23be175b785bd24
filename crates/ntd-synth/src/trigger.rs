//! Synthetic analog trigger channels

use ntd_core::{MetaMap, Matrix, NtdError, NtdResult, RawSignalRecord};
use serde::{Deserialize, Serialize};

/// Configuration for a square pulse channel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerConfig {
    /// Sampling rate in Hz
    pub sample_rate: f64,
    /// Channel name in the output record
    pub name: String,
    /// Pulse onset times in seconds
    pub pulse_times: Vec<f64>,
    /// Pulse width in seconds
    pub pulse_width: f64,
    /// High level of the pulse (low level is 0)
    pub high_level: f64,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        TriggerConfig {
            sample_rate: 1000.0,
            name: "sync".to_string(),
            pulse_times: vec![],
            pulse_width: 0.002,
            high_level: 3.3,
        }
    }
}

/// Render a trigger record with a square pulse at each configured onset
pub fn generate_trigger(
    config: &TriggerConfig,
    duration: f64,
    metadata: MetaMap,
) -> NtdResult<RawSignalRecord> {
    if config.pulse_width <= 0.0 {
        return Err(NtdError::InvalidConfig {
            reason: format!("Pulse width must be positive, got {}", config.pulse_width),
        });
    }

    let samples = (duration * config.sample_rate) as usize;
    let mut channel = vec![0.0; samples];
    for &onset in &config.pulse_times {
        let start = (onset * config.sample_rate) as usize;
        let end = ((onset + config.pulse_width) * config.sample_rate) as usize;
        for value in channel.iter_mut().take(end.min(samples)).skip(start) {
            *value = config.high_level;
        }
    }

    RawSignalRecord::dense(
        Some(duration),
        config.sample_rate,
        Matrix::from_column(channel),
        vec![config.name.clone()],
        metadata,
    )
}
