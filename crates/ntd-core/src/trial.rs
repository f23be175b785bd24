//! The unified trial-data output structure
//!
//! A flat mapping from field name to array, label list, index list, or
//! scalar. Field names follow the conversion convention: `{name}` for
//! generic signals, `{name}_spikes` / `{name}_unit_guide` / `{name}_spikes_t`
//! per spike source, `emg` / `emg_names` / `emg_t` for the merged EMG block,
//! `idx_{name}` for event and trigger index lists, scalar metadata fields,
//! and `bin_size`. The BTreeMap makes field order total and stable, so two
//! conversions of identical inputs compare equal.

use crate::matrix::Matrix;
use crate::meta::MetaValue;
use crate::record::UnitLabel;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Suffix marking a time-axis field, removed once alignment completes
pub const TIME_AXIS_SUFFIX: &str = "_t";

/// One trial field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TrialField {
    /// 2-D numeric array, rows = bins
    Matrix(Matrix),
    /// Ordered channel names (not time-indexed)
    Names(Vec<String>),
    /// Ordered (channel, unit) pairs for one spike source
    UnitGuide(Vec<UnitLabel>),
    /// Sparse event positions in post-alignment bin coordinates
    Indices(Vec<usize>),
    /// Scalar metadatum
    Scalar(MetaValue),
}

impl TrialField {
    /// Row count of the leading time dimension, where one exists.
    /// Label lists, index lists, and scalars carry no time dimension.
    pub fn row_count(&self) -> Option<usize> {
        match self {
            TrialField::Matrix(m) => Some(m.rows()),
            _ => None,
        }
    }
}

/// Collection of time-aligned signal arrays plus metadata and event markers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrialData {
    fields: BTreeMap<String, TrialField>,
}

impl TrialData {
    pub fn new() -> Self {
        TrialData { fields: BTreeMap::new() }
    }

    /// Insert a field, silently overwriting any existing field of the same
    /// name (last writer wins, per the metadata merge contract).
    pub fn insert(&mut self, name: &str, field: TrialField) {
        self.fields.insert(name.to_string(), field);
    }

    pub fn remove(&mut self, name: &str) -> Option<TrialField> {
        self.fields.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&TrialField> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Field names in canonical (sorted) order
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.keys().map(String::as_str).collect()
    }

    /// Iterate fields in canonical order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TrialField)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Mutable iteration, used by alignment to truncate in place
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut TrialField)> {
        self.fields.iter_mut().map(|(k, v)| (k.as_str(), v))
    }

    /// Matrix view of a field, if it is one
    pub fn matrix(&self, name: &str) -> Option<&Matrix> {
        match self.fields.get(name) {
            Some(TrialField::Matrix(m)) => Some(m),
            _ => None,
        }
    }

    /// Scalar view of a field, if it is one
    pub fn scalar(&self, name: &str) -> Option<&MetaValue> {
        match self.fields.get(name) {
            Some(TrialField::Scalar(v)) => Some(v),
            _ => None,
        }
    }

    /// Index-list view of a field, if it is one
    pub fn indices(&self, name: &str) -> Option<&[usize]> {
        match self.fields.get(name) {
            Some(TrialField::Indices(v)) => Some(v),
            _ => None,
        }
    }

    /// Names of all time-axis fields currently present
    pub fn time_axis_names(&self) -> Vec<String> {
        self.fields
            .keys()
            .filter(|k| k.ends_with(TIME_AXIS_SUFFIX))
            .cloned()
            .collect()
    }
}
