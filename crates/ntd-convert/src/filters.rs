//! Offline digital filters for continuous-channel conditioning
//!
//! Butterworth stages are cascaded 2nd-order biquad sections. Filtering
//! here is batch: state starts at zero for every call, one whole channel
//! in, one whole channel out.

use crate::config::EmgConditioning;
use ntd_core::{NtdError, NtdResult};

/// Single biquad section (2nd order),
/// y[n] = b0*x[n] + b1*x[n-1] + b2*x[n-2] - a1*y[n-1] - a2*y[n-2]
#[derive(Debug, Clone, Copy)]
pub struct Biquad {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
}

impl Biquad {
    /// 2nd-order Butterworth lowpass via bilinear transform
    pub fn lowpass(cutoff: f64, sample_rate: f64) -> NtdResult<Self> {
        let k = prewarp(cutoff, sample_rate)?;

        let sqrt2 = std::f64::consts::SQRT_2;
        let k2 = k * k;
        let norm = k2 + sqrt2 * k + 1.0;

        let b0 = k2 / norm;
        Ok(Biquad {
            b0,
            b1: 2.0 * b0,
            b2: b0,
            a1: (2.0 * (k2 - 1.0)) / norm,
            a2: (k2 - sqrt2 * k + 1.0) / norm,
        })
    }

    /// 2nd-order Butterworth highpass via bilinear transform
    pub fn highpass(cutoff: f64, sample_rate: f64) -> NtdResult<Self> {
        let k = prewarp(cutoff, sample_rate)?;

        let sqrt2 = std::f64::consts::SQRT_2;
        let k2 = k * k;
        let norm = k2 + sqrt2 * k + 1.0;

        let b0 = 1.0 / norm;
        Ok(Biquad {
            b0,
            b1: -2.0 * b0,
            b2: b0,
            a1: (2.0 * (k2 - 1.0)) / norm,
            a2: (k2 - sqrt2 * k + 1.0) / norm,
        })
    }

    /// Run the section over a whole channel, direct form I, zero initial
    /// state
    pub fn filter(&self, input: &[f64]) -> Vec<f64> {
        let mut output = Vec::with_capacity(input.len());
        let (mut x1, mut x2, mut y1, mut y2) = (0.0, 0.0, 0.0, 0.0);

        for &x in input {
            let y = self.b0 * x + self.b1 * x1 + self.b2 * x2 - self.a1 * y1 - self.a2 * y2;
            x2 = x1;
            x1 = x;
            y2 = y1;
            y1 = y;
            output.push(y);
        }
        output
    }
}

fn prewarp(cutoff: f64, sample_rate: f64) -> NtdResult<f64> {
    if cutoff <= 0.0 {
        return Err(NtdError::InvalidConfig {
            reason: format!("Filter cutoff must be positive, got {}Hz", cutoff),
        });
    }
    if cutoff >= sample_rate / 2.0 {
        return Err(NtdError::InvalidConfig {
            reason: format!(
                "Cutoff {}Hz must be below the Nyquist frequency {}Hz",
                cutoff,
                sample_rate / 2.0
            ),
        });
    }
    let omega_c = 2.0 * std::f64::consts::PI * cutoff / sample_rate;
    Ok((omega_c / 2.0).tan())
}

/// Cascade of identical biquad sections approximating the requested order
fn cascade(section: Biquad, order: usize, input: &[f64]) -> Vec<f64> {
    let sections = (order / 2).max(1);
    let mut current = section.filter(input);
    for _ in 1..sections {
        current = section.filter(&current);
    }
    current
}

/// Full-wave rectification
pub fn rectify(input: &[f64]) -> Vec<f64> {
    input.iter().map(|x| x.abs()).collect()
}

/// Downsample by an integer factor, keeping every factor-th sample starting
/// at the first. Factor below 1 is treated as 1.
pub fn downsample(input: &[f64], factor: usize) -> Vec<f64> {
    let factor = factor.max(1);
    input.iter().step_by(factor).copied().collect()
}

/// EMG conditioning chain for one channel: band-pass (highpass + lowpass
/// stages), rectify, envelope low-pass, then downsample to the bin grid.
pub fn condition_emg(
    channel: &[f64],
    sample_rate: f64,
    config: &EmgConditioning,
    factor: usize,
) -> NtdResult<Vec<f64>> {
    let highpass = Biquad::highpass(config.band_low, sample_rate)?;
    let lowpass = Biquad::lowpass(config.band_high.min(sample_rate / 2.0 * 0.99), sample_rate)?;
    let envelope = Biquad::lowpass(config.envelope_cutoff, sample_rate)?;

    let banded = cascade(lowpass, config.order, &cascade(highpass, config.order, channel));
    let envelope_out = cascade(envelope, config.order, &rectify(&banded));
    Ok(downsample(&envelope_out, factor))
}
