//! Activation envelopes driving synthetic EMG

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Muscle activation envelope as a function of time
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivationPattern {
    /// Constant activation level
    Constant { level: f64 },
    /// Sinusoidal contraction cycle
    Sinusoidal { frequency: f64, amplitude: f64, baseline: f64 },
    /// On/off contraction bursts
    Burst { on_duration: f64, off_duration: f64, amplitude: f64 },
    /// Steady contraction with physiological tremor
    Tremor { base: f64, tremor_frequency: f64, tremor_amplitude: f64 },
}

impl ActivationPattern {
    /// Activation level in [0, 1] at the given time
    pub fn activation_at(&self, time: f64) -> f64 {
        match self {
            ActivationPattern::Constant { level } => *level,
            ActivationPattern::Sinusoidal { frequency, amplitude, baseline } => {
                baseline + amplitude * (2.0 * PI * frequency * time).sin()
            }
            ActivationPattern::Burst { on_duration, off_duration, amplitude } => {
                let phase = time % (on_duration + off_duration);
                if phase < *on_duration {
                    *amplitude
                } else {
                    0.0
                }
            }
            ActivationPattern::Tremor { base, tremor_frequency, tremor_amplitude } => {
                let tremor = tremor_amplitude * (2.0 * PI * tremor_frequency * time).sin();
                (base + tremor).clamp(0.0, 1.0)
            }
        }
    }
}

impl Default for ActivationPattern {
    fn default() -> Self {
        ActivationPattern::Tremor { base: 0.4, tremor_frequency: 8.0, tremor_amplitude: 0.05 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_burst_cycles() {
        let pattern =
            ActivationPattern::Burst { on_duration: 2.0, off_duration: 1.0, amplitude: 0.8 };

        assert_eq!(pattern.activation_at(0.5), 0.8);
        assert_eq!(pattern.activation_at(2.5), 0.0);
        assert_eq!(pattern.activation_at(3.5), 0.8);
    }

    #[test]
    fn test_tremor_stays_in_range() {
        let pattern = ActivationPattern::Tremor {
            base: 0.98,
            tremor_frequency: 8.0,
            tremor_amplitude: 0.1,
        };
        for i in 0..100 {
            let a = pattern.activation_at(i as f64 * 0.01);
            assert!((0.0..=1.0).contains(&a));
        }
    }
}
