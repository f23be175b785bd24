//! Signal extraction: narrowing a raw record to one requested signal
//!
//! Resolves the spec's channel selection against the record's labels,
//! applies spike-sorting policy (excluded sort codes, sort stripping) and
//! the optional caller transform. The source record is read-only; the
//! extractor always copies out.

use crate::config::ConversionParams;
use ntd_core::{
    ChannelLabels, LabelSelector, Matrix, MetaMap, NtdError, NtdResult, RawSignalRecord,
    RecordData, SignalKind, SignalSpec, UnitLabel,
};

/// One signal narrowed out of its source record, not yet binned
#[derive(Debug, Clone)]
pub struct ExtractedSignal {
    pub name: String,
    pub kind: SignalKind,
    pub sample_rate: f64,
    /// Known duration in seconds; resolved later from the rest of the call
    /// when absent
    pub duration: Option<f64>,
    pub data: RecordData,
    pub labels: ChannelLabels,
    pub metadata: MetaMap,
}

/// Extract the channels a spec asks for from its source record
pub fn extract(
    record: &RawSignalRecord,
    spec: &SignalSpec,
    params: &ConversionParams,
) -> NtdResult<ExtractedSignal> {
    check_kind_matches_data(record, spec)?;

    let indices = resolve_indices(record, spec)?;
    let (mut data, mut labels) = narrow(record, &indices)?;

    if spec.kind == SignalKind::Spikes {
        apply_sort_policy(&mut data, &mut labels, params);
    }

    if let Some(transform) = &spec.transform {
        data = apply_transform(&spec.name, data, transform.as_ref())?;
    }

    Ok(ExtractedSignal {
        name: spec.name.clone(),
        kind: spec.kind,
        sample_rate: record.sample_rate,
        duration: record.effective_duration(),
        data,
        labels,
        metadata: record.metadata.clone(),
    })
}

fn check_kind_matches_data(record: &RawSignalRecord, spec: &SignalSpec) -> NtdResult<()> {
    match (&record.data, spec.kind) {
        (RecordData::SpikeTimes(_), SignalKind::Spikes) => Ok(()),
        (RecordData::Dense(_), SignalKind::Spikes) => Err(NtdError::InvalidSignalData {
            reason: format!(
                "Signal '{}' is typed as spikes but its source holds dense samples",
                spec.name
            ),
        }),
        (RecordData::SpikeTimes(_), kind) => Err(NtdError::InvalidSignalData {
            reason: format!(
                "Signal '{}' is typed as {} but its source holds spike trains",
                spec.name, kind
            ),
        }),
        (RecordData::Dense(_), _) => Ok(()),
    }
}

/// Resolve the selector to a zero-based index set over columns (dense) or
/// unit rows (spikes)
fn resolve_indices(record: &RawSignalRecord, spec: &SignalSpec) -> NtdResult<Vec<usize>> {
    let count = record.channel_count();

    match &spec.selector {
        LabelSelector::All => Ok((0..count).collect()),
        LabelSelector::Indices(indices) => {
            for &idx in indices {
                if idx >= count {
                    return Err(NtdError::LabelNotFound {
                        label: idx.to_string(),
                        signal: spec.name.clone(),
                    });
                }
            }
            Ok(indices.clone())
        }
        LabelSelector::Names(names) => match &record.labels {
            ChannelLabels::Names(available) => {
                let mut resolved = Vec::with_capacity(names.len());
                for name in names {
                    match available.iter().position(|l| l == name) {
                        Some(idx) => resolved.push(idx),
                        None => {
                            return Err(NtdError::LabelNotFound {
                                label: name.clone(),
                                signal: spec.name.clone(),
                            })
                        }
                    }
                }
                Ok(resolved)
            }
            ChannelLabels::Units(_) => Err(NtdError::AmbiguousSelector {
                signal: spec.name.clone(),
                reason: "String labels cannot address (channel, unit) pairs; select units by index"
                    .to_string(),
            }),
        },
    }
}

fn narrow(
    record: &RawSignalRecord,
    indices: &[usize],
) -> NtdResult<(RecordData, ChannelLabels)> {
    match (&record.data, &record.labels) {
        (RecordData::Dense(matrix), ChannelLabels::Names(names)) => {
            let data = matrix.select_columns(indices)?;
            let labels = indices.iter().map(|&i| names[i].clone()).collect();
            Ok((RecordData::Dense(data), ChannelLabels::Names(labels)))
        }
        (RecordData::SpikeTimes(trains), ChannelLabels::Units(units)) => {
            let data = indices.iter().map(|&i| trains[i].clone()).collect();
            let labels = indices.iter().map(|&i| units[i]).collect();
            Ok((RecordData::SpikeTimes(data), ChannelLabels::Units(labels)))
        }
        // RawSignalRecord::new rejects mismatched pairings
        _ => Err(NtdError::InvalidSignalData {
            reason: "Record labels don't match its data kind".to_string(),
        }),
    }
}

/// Drop excluded sort codes, then optionally collapse each channel's
/// remaining units into one merged train (unit 0)
fn apply_sort_policy(data: &mut RecordData, labels: &mut ChannelLabels, params: &ConversionParams) {
    let (trains, units) = match (data, labels) {
        (RecordData::SpikeTimes(trains), ChannelLabels::Units(units)) => (trains, units),
        _ => return,
    };

    let mut kept_trains = Vec::with_capacity(trains.len());
    let mut kept_units = Vec::with_capacity(units.len());
    for (train, unit) in trains.iter().zip(units.iter()) {
        if !params.exclude_units.contains(&unit.unit) {
            kept_trains.push(train.clone());
            kept_units.push(*unit);
        }
    }

    if params.strip_sort {
        let mut merged_trains: Vec<Vec<f64>> = Vec::new();
        let mut merged_units: Vec<UnitLabel> = Vec::new();
        for (train, unit) in kept_trains.iter().zip(kept_units.iter()) {
            match merged_units.iter().position(|u| u.channel == unit.channel) {
                Some(idx) => merged_trains[idx].extend_from_slice(train),
                None => {
                    merged_trains.push(train.clone());
                    merged_units.push(UnitLabel::new(unit.channel, 0));
                }
            }
        }
        for train in &mut merged_trains {
            train.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        }
        kept_trains = merged_trains;
        kept_units = merged_units;
    }

    *trains = kept_trains;
    *units = kept_units;
}

/// Run the caller transform channels-major and rebuild the data. Channel
/// count must survive; channel lengths must agree with each other.
fn apply_transform(
    signal: &str,
    data: RecordData,
    transform: &dyn ntd_core::ChannelTransform,
) -> NtdResult<RecordData> {
    match data {
        RecordData::Dense(matrix) => {
            let before = matrix.cols();
            let transformed = transform.apply(matrix.columns());
            if transformed.len() != before {
                return Err(NtdError::InvalidSignalData {
                    reason: format!(
                        "Transform for '{}' changed channel count from {} to {}",
                        signal,
                        before,
                        transformed.len()
                    ),
                });
            }
            Ok(RecordData::Dense(Matrix::from_columns(&transformed)?))
        }
        RecordData::SpikeTimes(trains) => {
            let before = trains.len();
            let transformed = transform.apply(trains);
            if transformed.len() != before {
                return Err(NtdError::InvalidSignalData {
                    reason: format!(
                        "Transform for '{}' changed unit count from {} to {}",
                        signal,
                        before,
                        transformed.len()
                    ),
                });
            }
            Ok(RecordData::SpikeTimes(transformed))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn dense_record() -> RawSignalRecord {
        let matrix = Matrix::from_columns(&[
            vec![1.0, 2.0, 3.0],
            vec![4.0, 5.0, 6.0],
            vec![7.0, 8.0, 9.0],
        ])
        .unwrap();
        RawSignalRecord::dense(
            Some(0.003),
            1000.0,
            matrix,
            vec!["ch1".to_string(), "ch2".to_string(), "ch3".to_string()],
            BTreeMap::new(),
        )
        .unwrap()
    }

    fn spike_record() -> RawSignalRecord {
        RawSignalRecord::spikes(
            Some(1.0),
            30000.0,
            vec![vec![0.1, 0.4], vec![0.2], vec![0.3, 0.9], vec![0.05]],
            vec![
                UnitLabel::new(1, 1),
                UnitLabel::new(1, 2),
                UnitLabel::new(2, 1),
                UnitLabel::new(2, 255),
            ],
            BTreeMap::new(),
        )
        .unwrap()
    }

    #[test]
    fn test_label_selection() {
        let record = dense_record();
        let spec = SignalSpec::new("pair", SignalKind::Generic)
            .with_labels(vec!["ch3", "ch1"]);
        let extracted = extract(&record, &spec, &ConversionParams::default()).unwrap();

        match extracted.data {
            RecordData::Dense(m) => {
                assert_eq!(m.cols(), 2);
                assert_eq!(m.column(0).unwrap(), vec![7.0, 8.0, 9.0]);
                assert_eq!(m.column(1).unwrap(), vec![1.0, 2.0, 3.0]);
            }
            _ => panic!("expected dense data"),
        }
        assert_eq!(
            extracted.labels,
            ChannelLabels::Names(vec!["ch3".to_string(), "ch1".to_string()])
        );
    }

    #[test]
    fn test_missing_label_fails() {
        let record = dense_record();
        let spec = SignalSpec::new("bad", SignalKind::Generic)
            .with_labels(vec!["nonexistent"]);
        let err = extract(&record, &spec, &ConversionParams::default()).unwrap_err();

        assert_eq!(
            err,
            NtdError::LabelNotFound {
                label: "nonexistent".to_string(),
                signal: "bad".to_string(),
            }
        );
    }

    #[test]
    fn test_index_selection_bounds() {
        let record = dense_record();
        let spec = SignalSpec::new("idx", SignalKind::Generic).with_indices(vec![0, 2]);
        assert!(extract(&record, &spec, &ConversionParams::default()).is_ok());

        let bad = SignalSpec::new("idx", SignalKind::Generic).with_indices(vec![3]);
        assert!(matches!(
            extract(&record, &bad, &ConversionParams::default()).unwrap_err(),
            NtdError::LabelNotFound { .. }
        ));
    }

    #[test]
    fn test_name_selector_on_spikes_is_ambiguous() {
        let record = spike_record();
        let spec = SignalSpec::new("m1", SignalKind::Spikes).with_labels(vec!["ch1"]);
        assert!(matches!(
            extract(&record, &spec, &ConversionParams::default()).unwrap_err(),
            NtdError::AmbiguousSelector { .. }
        ));
    }

    #[test]
    fn test_excluded_units_dropped() {
        let record = spike_record();
        let spec = SignalSpec::new("m1", SignalKind::Spikes);
        let extracted = extract(&record, &spec, &ConversionParams::default()).unwrap();

        // Unit with sort code 255 is gone
        match &extracted.labels {
            ChannelLabels::Units(units) => {
                assert_eq!(units.len(), 3);
                assert!(units.iter().all(|u| u.unit != 255));
            }
            _ => panic!("expected unit labels"),
        }
    }

    #[test]
    fn test_strip_sort_merges_channels() {
        let record = spike_record();
        let spec = SignalSpec::new("m1", SignalKind::Spikes);
        let params = ConversionParams { strip_sort: true, ..Default::default() };
        let extracted = extract(&record, &spec, &params).unwrap();

        match (&extracted.data, &extracted.labels) {
            (RecordData::SpikeTimes(trains), ChannelLabels::Units(units)) => {
                // Channels 1 and 2, each collapsed to unit 0
                assert_eq!(units, &vec![UnitLabel::new(1, 0), UnitLabel::new(2, 0)]);
                // Channel 1: units (1,1) and (1,2) merged and sorted
                assert_eq!(trains[0], vec![0.1, 0.2, 0.4]);
                // Channel 2: sort code 255 was already excluded
                assert_eq!(trains[1], vec![0.3, 0.9]);
            }
            _ => panic!("expected spike trains"),
        }
    }

    #[test]
    fn test_kind_data_mismatch() {
        let record = dense_record();
        let spec = SignalSpec::new("m1", SignalKind::Spikes);
        assert!(extract(&record, &spec, &ConversionParams::default()).is_err());
    }

    #[test]
    fn test_transform_applied_channels_major() {
        let record = dense_record();
        let spec = SignalSpec::new("scaled", SignalKind::Generic)
            .with_indices(vec![0])
            .with_transform(Arc::new(|channels: Vec<Vec<f64>>| {
                channels
                    .into_iter()
                    .map(|c| c.into_iter().map(|x| x * 10.0).collect())
                    .collect()
            }));

        let extracted = extract(&record, &spec, &ConversionParams::default()).unwrap();
        match extracted.data {
            RecordData::Dense(m) => {
                assert_eq!(m.column(0).unwrap(), vec![10.0, 20.0, 30.0]);
            }
            _ => panic!("expected dense data"),
        }
        // Source record untouched
        match &record.data {
            RecordData::Dense(m) => assert_eq!(m.get(0, 0), Some(1.0)),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_transform_channel_count_enforced() {
        let record = dense_record();
        let spec = SignalSpec::new("bad", SignalKind::Generic)
            .with_indices(vec![0, 1])
            .with_transform(Arc::new(|mut channels: Vec<Vec<f64>>| {
                channels.pop();
                channels
            }));

        assert!(extract(&record, &spec, &ConversionParams::default()).is_err());
    }
}
