//! Synthetic surface EMG records with configurable activation patterns

use crate::pattern::ActivationPattern;
use ntd_core::{MetaMap, Matrix, NtdError, NtdResult, RawSignalRecord};
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

/// Configuration for EMG synthesis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmgConfig {
    /// Sampling rate in Hz
    pub sample_rate: f64,
    /// Channel names, one synthetic channel per name
    pub channel_names: Vec<String>,
    /// Activation envelope driving the signal
    pub pattern: ActivationPattern,
    /// Gaussian noise standard deviation
    pub noise_std: f64,
    /// Power line interference frequency, if simulated
    pub powerline_freq: Option<f64>,
    /// Random seed for reproducibility
    pub seed: u64,
}

impl Default for EmgConfig {
    fn default() -> Self {
        EmgConfig {
            sample_rate: 2000.0,
            channel_names: vec!["bicep".to_string(), "tricep".to_string()],
            pattern: ActivationPattern::default(),
            noise_std: 0.05,
            powerline_freq: Some(50.0),
            seed: 0,
        }
    }
}

/// Seeded EMG generator
pub struct EmgSynth {
    config: EmgConfig,
    rng: rand::rngs::StdRng,
    noise: Normal<f64>,
}

impl EmgSynth {
    pub fn new(config: EmgConfig) -> NtdResult<Self> {
        if config.sample_rate <= 0.0 {
            return Err(NtdError::InvalidConfig {
                reason: format!("Sample rate must be positive, got {}", config.sample_rate),
            });
        }
        if config.channel_names.is_empty() {
            return Err(NtdError::InvalidConfig {
                reason: "EMG synthesis needs at least one channel".to_string(),
            });
        }
        let noise = Normal::new(0.0, config.noise_std).map_err(|e| NtdError::InvalidConfig {
            reason: format!("Bad noise configuration: {}", e),
        })?;

        let rng = rand::rngs::StdRng::seed_from_u64(config.seed);
        Ok(EmgSynth { config, rng, noise })
    }

    /// Generate a dense record of the given duration
    pub fn generate(&mut self, duration: f64, metadata: MetaMap) -> NtdResult<RawSignalRecord> {
        let samples = (duration * self.config.sample_rate) as usize;
        let channels = self.config.channel_names.len();
        let dt = 1.0 / self.config.sample_rate;

        let mut data = Vec::with_capacity(samples * channels);
        for i in 0..samples {
            let t = i as f64 * dt;
            let activation = self.config.pattern.activation_at(t);

            for channel in 0..channels {
                let mut value = self.sample_at(t, channel, activation);
                value += self.noise.sample(&mut self.rng);
                if let Some(freq) = self.config.powerline_freq {
                    value += 0.02 * (2.0 * std::f64::consts::PI * freq * t).sin();
                }
                data.push(value.clamp(-5.0, 5.0));
            }
        }

        let matrix = Matrix::new(samples, channels, data)?;
        RawSignalRecord::dense(
            Some(duration),
            self.config.sample_rate,
            matrix,
            self.config.channel_names.clone(),
            metadata,
        )
    }

    fn sample_at(&mut self, t: f64, channel: usize, activation: f64) -> f64 {
        // Carrier frequency varies a little per channel
        let base = 80.0 + channel as f64 * 10.0;
        let amplitude = activation * 2.0;

        let mut value = amplitude * (2.0 * std::f64::consts::PI * base * t).sin();
        value += amplitude * 0.3 * (2.0 * std::f64::consts::PI * base * 2.0 * t).sin();
        value += amplitude * 0.1 * (2.0 * std::f64::consts::PI * base * 3.0 * t).sin();

        // Fiber recruitment jitter scales with activation
        value + activation * self.rng.gen_range(-0.2..0.2)
    }
}
