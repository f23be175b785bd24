//! Metadata merging into scalar trial fields

use crate::config::ConversionParams;
use ntd_core::{MetaMap, TrialData, TrialField};

/// Fold per-signal metadata (in processing order), then caller-supplied
/// global metadata, into scalar fields. Later writers win, so global
/// metadata overrides any per-signal key of the same name. The bin size
/// lands last so the output always records the grid it was built on.
pub fn merge_metadata(
    trial: &mut TrialData,
    signal_metadata: &[MetaMap],
    global_metadata: &MetaMap,
    params: &ConversionParams,
) {
    for map in signal_metadata {
        for (key, value) in map {
            trial.insert(key, TrialField::Scalar(value.clone()));
        }
    }
    for (key, value) in global_metadata {
        trial.insert(key, TrialField::Scalar(value.clone()));
    }
    trial.insert("bin_size", TrialField::Scalar(params.bin_size.into()));
}
