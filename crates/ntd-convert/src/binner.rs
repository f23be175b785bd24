//! Type-specific binning onto the common time grid
//!
//! Every time-indexed signal lands on the same uniform grid: bin k covers
//! [k*bin_size, (k+1)*bin_size). The stored time axis holds the left edge
//! of each bin, so a signal's value rows and its axis always have equal
//! length. Spike histograms get one extra trailing edge past the recording
//! end so a spike exactly at the final sample is kept.

use crate::config::ConversionParams;
use crate::filters;
use ntd_core::{
    ChannelLabels, Matrix, MetaMap, NtdError, NtdResult, RecordData, SignalKind,
};

use crate::extract::ExtractedSignal;

/// Values of one binned signal
#[derive(Debug, Clone, PartialEq)]
pub enum BinnedValues {
    /// rows = bins, cols = channels/units
    Matrix(Matrix),
    /// Precomputed event positions (Event kind only)
    Indices(Vec<usize>),
    /// Scalar carrier (Meta kind only)
    Meta(MetaMap),
}

/// One signal on the common grid, ready for aggregation
#[derive(Debug, Clone)]
pub struct BinnedSignal {
    pub name: String,
    pub kind: SignalKind,
    /// Left bin edges; absent for non-time-indexed kinds
    pub time_axis: Option<Vec<f64>>,
    pub values: BinnedValues,
    /// Channel names or unit labels carried through for aggregation
    pub labels: ChannelLabels,
    /// Source record metadata, merged later
    pub metadata: MetaMap,
}

/// Left bin edges of the uniform grid over [0, duration]. The final bin
/// opens at `duration` itself, so a timestamp exactly at the recording end
/// still has a bin to land in.
fn bin_grid(duration: f64, bin_size: f64) -> Vec<f64> {
    // Small tolerance so duration = k*bin_size lands on k+1 axis points
    let last = (duration / bin_size + 1e-9).floor() as usize;
    (0..=last).map(|i| i as f64 * bin_size).collect()
}

/// Histogram timestamps into the uniform grid. A timestamp exactly on an
/// edge counts toward the bin it opens.
fn histogram(timestamps: &[f64], bin_size: f64, n_bins: usize) -> Vec<f64> {
    let mut counts = vec![0.0; n_bins];
    for &t in timestamps {
        if t < 0.0 {
            continue;
        }
        let bin = (t / bin_size + 1e-9).floor() as usize;
        if bin < n_bins {
            counts[bin] += 1.0;
        }
    }
    counts
}

/// Rising-edge sample indices: fires at i when data[i] crosses above the
/// threshold from at-or-below. The first sample never fires.
pub fn rising_edges(channel: &[f64], threshold: f64) -> Vec<usize> {
    let mut edges = Vec::new();
    for i in 1..channel.len() {
        if channel[i] > threshold && channel[i - 1] <= threshold {
            edges.push(i);
        }
    }
    edges
}

/// Convert one extracted signal into a binned signal. `duration` is the
/// resolved recording length (deferred resolution has already happened).
pub fn bin_signal(
    signal: &ExtractedSignal,
    params: &ConversionParams,
    duration: f64,
) -> NtdResult<BinnedSignal> {
    let bin_size = params.bin_size;

    let (time_axis, values) = match signal.kind {
        SignalKind::Spikes => bin_spikes(signal, bin_size, duration)?,
        SignalKind::Emg => bin_emg(signal, params)?,
        SignalKind::Trigger => bin_trigger(signal, params, duration)?,
        SignalKind::Generic => bin_generic(signal, params)?,
        SignalKind::Event => (None, bin_event(signal)?),
        SignalKind::Meta => (None, BinnedValues::Meta(signal.metadata.clone())),
        SignalKind::Lfp => {
            return Err(NtdError::UnsupportedSignalType {
                kind: SignalKind::Lfp.to_string(),
                signal: signal.name.clone(),
            })
        }
    };

    Ok(BinnedSignal {
        name: signal.name.clone(),
        kind: signal.kind,
        time_axis,
        values,
        labels: signal.labels.clone(),
        metadata: signal.metadata.clone(),
    })
}

fn bin_spikes(
    signal: &ExtractedSignal,
    bin_size: f64,
    duration: f64,
) -> NtdResult<(Option<Vec<f64>>, BinnedValues)> {
    let trains = match &signal.data {
        RecordData::SpikeTimes(trains) => trains,
        _ => {
            return Err(NtdError::InvalidSignalData {
                reason: format!("Spike signal '{}' lost its trains", signal.name),
            })
        }
    };

    let axis = bin_grid(duration, bin_size);
    let n_bins = axis.len();

    // One counts column per unit: rows = bins, cols = units. A source
    // whose units were all excluded keeps its full row count so alignment
    // truncates it like every other time-indexed field.
    let matrix = if trains.is_empty() {
        Matrix::new(n_bins, 0, Vec::new())?
    } else {
        let columns: Vec<Vec<f64>> = trains
            .iter()
            .map(|train| histogram(train, bin_size, n_bins))
            .collect();
        Matrix::from_columns(&columns)?
    };

    Ok((Some(axis), BinnedValues::Matrix(matrix)))
}

fn bin_emg(
    signal: &ExtractedSignal,
    params: &ConversionParams,
) -> NtdResult<(Option<Vec<f64>>, BinnedValues)> {
    let matrix = dense_data(signal)?;
    let factor = decimation_factor(params.bin_size, signal.sample_rate);

    let columns = matrix
        .columns()
        .iter()
        .map(|channel| filters::condition_emg(channel, signal.sample_rate, &params.emg, factor))
        .collect::<NtdResult<Vec<_>>>()?;

    let binned = Matrix::from_columns(&columns)?;
    let axis = axis_for_rows(binned.rows(), params.bin_size);
    Ok((Some(axis), BinnedValues::Matrix(binned)))
}

fn bin_trigger(
    signal: &ExtractedSignal,
    params: &ConversionParams,
    duration: f64,
) -> NtdResult<(Option<Vec<f64>>, BinnedValues)> {
    let matrix = dense_data(signal)?;
    // Trigger detection runs on the first selected channel
    let channel = matrix.column(0)?;

    let edges = rising_edges(&channel, params.trigger_threshold);
    let timestamps: Vec<f64> = edges
        .iter()
        .map(|&i| i as f64 / signal.sample_rate)
        .collect();

    let axis = bin_grid(duration, params.bin_size);
    let counts = histogram(&timestamps, params.bin_size, axis.len());
    let matrix = Matrix::from_column(counts);
    Ok((Some(axis), BinnedValues::Matrix(matrix)))
}

fn bin_generic(
    signal: &ExtractedSignal,
    params: &ConversionParams,
) -> NtdResult<(Option<Vec<f64>>, BinnedValues)> {
    let matrix = dense_data(signal)?;
    let factor = decimation_factor(params.bin_size, signal.sample_rate);

    let columns: Vec<Vec<f64>> = matrix
        .columns()
        .iter()
        .map(|channel| filters::downsample(channel, factor))
        .collect();

    let binned = Matrix::from_columns(&columns)?;
    let axis = axis_for_rows(binned.rows(), params.bin_size);
    Ok((Some(axis), BinnedValues::Matrix(binned)))
}

fn bin_event(signal: &ExtractedSignal) -> NtdResult<BinnedValues> {
    let matrix = dense_data(signal)?;
    if matrix.cols() > 1 {
        return Err(NtdError::InvalidSignalData {
            reason: format!(
                "Event signal '{}' must select exactly one channel, got {}",
                signal.name,
                matrix.cols()
            ),
        });
    }
    let column = matrix.column(0)?;

    let mut indices = Vec::with_capacity(column.len());
    for &value in &column {
        if !value.is_finite() || value < 0.0 {
            return Err(NtdError::InvalidSignalData {
                reason: format!(
                    "Event signal '{}' holds non-index value {}",
                    signal.name, value
                ),
            });
        }
        indices.push(value.round() as usize);
    }
    Ok(BinnedValues::Indices(indices))
}

fn dense_data(signal: &ExtractedSignal) -> NtdResult<&Matrix> {
    match &signal.data {
        RecordData::Dense(matrix) => Ok(matrix),
        _ => Err(NtdError::InvalidSignalData {
            reason: format!("Signal '{}' requires dense samples", signal.name),
        }),
    }
}

fn decimation_factor(bin_size: f64, sample_rate: f64) -> usize {
    ((bin_size * sample_rate).round() as usize).max(1)
}

fn axis_for_rows(rows: usize, bin_size: f64) -> Vec<f64> {
    (0..rows).map(|i| i as f64 * bin_size).collect()
}
