//! Aggregation: grouping binned signals into named trial fields
//!
//! Same-typed signals merge here. EMG columns concatenate across files in
//! encounter order; each spike source keeps its own field triple; trigger
//! counts stay dense until alignment so their index conversion happens in
//! post-alignment bin coordinates.

use crate::binner::{BinnedSignal, BinnedValues};
use ntd_core::{
    ChannelLabels, Matrix, NtdError, NtdResult, SignalKind, TrialData, TrialField,
};

/// Aggregation result: the trial under construction plus the trigger
/// fields awaiting post-alignment index conversion
#[derive(Debug)]
pub struct Aggregated {
    pub trial: TrialData,
    pub trigger_names: Vec<String>,
}

/// Fold binned signals into trial fields, in processing order
pub fn aggregate(binned: &[BinnedSignal]) -> NtdResult<Aggregated> {
    // Group-level feature gap check, independent of the binner's
    if let Some(lfp) = binned.iter().find(|s| s.kind == SignalKind::Lfp) {
        return Err(NtdError::UnsupportedSignalType {
            kind: SignalKind::Lfp.to_string(),
            signal: lfp.name.clone(),
        });
    }

    let mut trial = TrialData::new();
    let mut trigger_names = Vec::new();

    // EMG accumulates across signals before it lands in the trial
    let mut emg_block: Option<Matrix> = None;
    let mut emg_names: Vec<String> = Vec::new();
    let mut emg_axis: Option<Vec<f64>> = None;

    for signal in binned {
        match signal.kind {
            SignalKind::Spikes => aggregate_spikes(&mut trial, signal)?,
            SignalKind::Emg => {
                aggregate_emg(signal, &mut emg_block, &mut emg_names, &mut emg_axis)?
            }
            SignalKind::Trigger => {
                insert_timed(&mut trial, &signal.name, signal)?;
                trigger_names.push(signal.name.clone());
            }
            SignalKind::Generic => insert_timed(&mut trial, &signal.name, signal)?,
            SignalKind::Event => {
                if let BinnedValues::Indices(indices) = &signal.values {
                    trial.insert(
                        &format!("idx_{}", signal.name),
                        TrialField::Indices(indices.clone()),
                    );
                }
            }
            SignalKind::Meta => {
                if let BinnedValues::Meta(map) = &signal.values {
                    // Last writer wins, silently, in processing order
                    for (key, value) in map {
                        trial.insert(key, TrialField::Scalar(value.clone()));
                    }
                }
            }
            SignalKind::Lfp => unreachable!("checked above"),
        }
    }

    if let Some(block) = emg_block {
        trial.insert("emg", TrialField::Matrix(block));
        trial.insert("emg_names", TrialField::Names(emg_names));
        if let Some(axis) = emg_axis {
            trial.insert("emg_t", TrialField::Matrix(Matrix::from_column(axis)));
        }
    }

    Ok(Aggregated { trial, trigger_names })
}

fn aggregate_spikes(trial: &mut TrialData, signal: &BinnedSignal) -> NtdResult<()> {
    let spikes_field = format!("{}_spikes", signal.name);
    if trial.contains(&spikes_field) {
        return Err(NtdError::DuplicateSpikeSource {
            name: signal.name.clone(),
        });
    }

    let matrix = timed_matrix(signal)?;
    let units = match &signal.labels {
        ChannelLabels::Units(units) => units.clone(),
        ChannelLabels::Names(_) => {
            return Err(NtdError::InvalidSignalData {
                reason: format!("Spike source '{}' lost its unit guide", signal.name),
            })
        }
    };
    let axis = signal.time_axis.clone().ok_or_else(|| missing_axis(&signal.name))?;

    trial.insert(&spikes_field, TrialField::Matrix(matrix));
    trial.insert(
        &format!("{}_unit_guide", signal.name),
        TrialField::UnitGuide(units),
    );
    trial.insert(
        &format!("{}_spikes_t", signal.name),
        TrialField::Matrix(Matrix::from_column(axis)),
    );
    Ok(())
}

fn aggregate_emg(
    signal: &BinnedSignal,
    block: &mut Option<Matrix>,
    names: &mut Vec<String>,
    axis: &mut Option<Vec<f64>>,
) -> NtdResult<()> {
    let matrix = timed_matrix(signal)?;

    match block {
        None => {
            *block = Some(matrix);
            *axis = signal.time_axis.clone();
        }
        Some(existing) => {
            if existing.rows() != matrix.rows() {
                return Err(NtdError::MisalignedTimeAxis {
                    signal: signal.name.clone(),
                    expected: existing.rows(),
                    found: matrix.rows(),
                });
            }
            existing.append_columns(&matrix)?;
        }
    }

    match &signal.labels {
        // Single-channel selections keep the signal name; multichannel
        // selections keep their channel labels
        ChannelLabels::Names(labels) if labels.len() > 1 => {
            names.extend(labels.iter().cloned())
        }
        _ => names.push(signal.name.clone()),
    }
    Ok(())
}

fn insert_timed(trial: &mut TrialData, name: &str, signal: &BinnedSignal) -> NtdResult<()> {
    let matrix = timed_matrix(signal)?;
    let axis = signal.time_axis.clone().ok_or_else(|| missing_axis(name))?;

    trial.insert(name, TrialField::Matrix(matrix));
    trial.insert(
        &format!("{}{}", name, ntd_core::TIME_AXIS_SUFFIX),
        TrialField::Matrix(Matrix::from_column(axis)),
    );
    Ok(())
}

fn timed_matrix(signal: &BinnedSignal) -> NtdResult<Matrix> {
    match &signal.values {
        BinnedValues::Matrix(m) => Ok(m.clone()),
        _ => Err(NtdError::InvalidSignalData {
            reason: format!("Signal '{}' has no binned matrix", signal.name),
        }),
    }
}

fn missing_axis(name: &str) -> NtdError {
    NtdError::InvalidSignalData {
        reason: format!("Time-indexed signal '{}' has no time axis", name),
    }
}
