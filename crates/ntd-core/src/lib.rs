//! NTD-Core: Foundation types for trial-data conversion
//!
//! Canonical signal records, signal specs, the dense sample matrix, and the
//! unified trial-data output structure.

pub mod error;
pub mod matrix;
pub mod meta;
pub mod record;
pub mod signal;
pub mod trial;

pub use error::{NtdError, NtdResult};
pub use matrix::Matrix;
pub use meta::{MetaMap, MetaValue};
pub use record::{ChannelLabels, RawSignalRecord, RecordData, UnitLabel};
pub use signal::{ChannelTransform, LabelSelector, SignalKind, SignalSpec};
pub use trial::{TrialData, TrialField, TIME_AXIS_SUFFIX};
