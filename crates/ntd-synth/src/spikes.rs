//! Synthetic spike-sorted records with Poisson firing

use ntd_core::{MetaMap, NtdError, NtdResult, RawSignalRecord, UnitLabel};
use rand::SeedableRng;
use rand_distr::{Distribution, Exp};
use serde::{Deserialize, Serialize};

/// Configuration for spike train synthesis. One train per (unit, rate)
/// entry, firing as a homogeneous Poisson process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpikeConfig {
    /// Acquisition sample rate recorded in the output (spike timestamps
    /// themselves are continuous)
    pub sample_rate: f64,
    /// Sorted units and their mean firing rates in Hz
    pub units: Vec<(UnitLabel, f64)>,
    /// Random seed for reproducibility
    pub seed: u64,
}

impl Default for SpikeConfig {
    fn default() -> Self {
        SpikeConfig {
            sample_rate: 30000.0,
            units: vec![
                (UnitLabel::new(1, 1), 20.0),
                (UnitLabel::new(1, 2), 8.0),
                (UnitLabel::new(2, 1), 35.0),
            ],
            seed: 0,
        }
    }
}

/// Seeded Poisson spike generator
pub struct SpikeSynth {
    config: SpikeConfig,
    rng: rand::rngs::StdRng,
}

impl SpikeSynth {
    pub fn new(config: SpikeConfig) -> NtdResult<Self> {
        if config.units.is_empty() {
            return Err(NtdError::InvalidConfig {
                reason: "Spike synthesis needs at least one unit".to_string(),
            });
        }
        for (unit, rate) in &config.units {
            if *rate <= 0.0 {
                return Err(NtdError::InvalidConfig {
                    reason: format!("Firing rate for {:?} must be positive, got {}", unit, rate),
                });
            }
        }
        let rng = rand::rngs::StdRng::seed_from_u64(config.seed);
        Ok(SpikeSynth { config, rng })
    }

    /// Generate a spike record of the given duration
    pub fn generate(&mut self, duration: f64, metadata: MetaMap) -> NtdResult<RawSignalRecord> {
        let mut trains = Vec::with_capacity(self.config.units.len());
        let mut labels = Vec::with_capacity(self.config.units.len());

        for (unit, rate) in &self.config.units {
            let exp = Exp::new(*rate).map_err(|e| NtdError::InvalidConfig {
                reason: format!("Bad firing rate {}: {}", rate, e),
            })?;

            let mut train = Vec::new();
            let mut t = exp.sample(&mut self.rng);
            while t < duration {
                train.push(t);
                t += exp.sample(&mut self.rng);
            }
            trains.push(train);
            labels.push(*unit);
        }

        RawSignalRecord::spikes(Some(duration), self.config.sample_rate, trains, labels, metadata)
    }
}
