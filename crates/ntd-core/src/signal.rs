//! Signal classification and per-signal requests
//!
//! A `SignalSpec` is the caller's declarative request for one named output
//! signal: what kind it is, which channels of its source record it draws
//! from, and an optional conditioning transform.

use crate::error::NtdError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Semantic type of a requested signal. Dispatch in the binner is entirely
/// driven by this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalKind {
    /// Spike-sorted unit event trains, binned into counts
    Spikes,
    /// Continuous EMG, conditioned and decimated
    Emg,
    /// Local field potential - recognized but unimplemented
    Lfp,
    /// Analog pulse channel whose threshold crossings mark events
    Trigger,
    /// Precomputed discrete event indices, passed through
    Event,
    /// Scalar/record carrier, not a time series
    Meta,
    /// Any other continuous channel, decimated without filtering
    Generic,
}

impl SignalKind {
    /// Whether binning produces a time axis for this kind
    pub fn is_time_indexed(&self) -> bool {
        matches!(
            self,
            SignalKind::Spikes
                | SignalKind::Emg
                | SignalKind::Trigger
                | SignalKind::Generic
        )
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SignalKind::Spikes => "spikes",
            SignalKind::Emg => "emg",
            SignalKind::Lfp => "lfp",
            SignalKind::Trigger => "trigger",
            SignalKind::Event => "event",
            SignalKind::Meta => "meta",
            SignalKind::Generic => "generic",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for SignalKind {
    type Err = NtdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "spikes" => Ok(SignalKind::Spikes),
            "emg" => Ok(SignalKind::Emg),
            "lfp" => Ok(SignalKind::Lfp),
            "trigger" => Ok(SignalKind::Trigger),
            "event" => Ok(SignalKind::Event),
            "meta" => Ok(SignalKind::Meta),
            "generic" => Ok(SignalKind::Generic),
            other => Err(NtdError::UnknownSignalType {
                kind: other.to_string(),
            }),
        }
    }
}

/// Which channels of the source record a signal draws from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LabelSelector {
    /// Every channel (or every sorted unit) in the record
    All,
    /// Channels resolved by exact label lookup
    Names(Vec<String>),
    /// Zero-based column indices (unit rows for spike sources)
    Indices(Vec<usize>),
}

impl Default for LabelSelector {
    fn default() -> Self {
        LabelSelector::All
    }
}

/// Caller-supplied conditioning hook, applied channels-major.
///
/// The input is one vector per selected channel; the output must be one
/// vector per channel with all channels the same length. The sample count
/// may change (a transform is allowed to resample), the channel count may
/// not. Implementations must be pure: the source record is never handed
/// over mutably.
pub trait ChannelTransform: Send + Sync {
    fn apply(&self, channels: Vec<Vec<f64>>) -> Vec<Vec<f64>>;
}

/// Blanket impl so plain closures work as transforms
impl<F> ChannelTransform for F
where
    F: Fn(Vec<Vec<f64>>) -> Vec<Vec<f64>> + Send + Sync,
{
    fn apply(&self, channels: Vec<Vec<f64>>) -> Vec<Vec<f64>> {
        self(channels)
    }
}

/// Declarative request for one named output signal. Immutable once built.
#[derive(Clone)]
pub struct SignalSpec {
    /// Output name; drives trial field naming
    pub name: String,
    /// Semantic type
    pub kind: SignalKind,
    /// Channel selection in the source record
    pub selector: LabelSelector,
    /// Optional conditioning transform
    pub transform: Option<Arc<dyn ChannelTransform>>,
}

impl SignalSpec {
    /// Request all channels of a source, untransformed
    pub fn new(name: &str, kind: SignalKind) -> Self {
        SignalSpec {
            name: name.to_string(),
            kind,
            selector: LabelSelector::All,
            transform: None,
        }
    }

    /// Select channels by exact label
    pub fn with_labels<S: Into<String>>(mut self, labels: Vec<S>) -> Self {
        self.selector = LabelSelector::Names(labels.into_iter().map(Into::into).collect());
        self
    }

    /// Select channels by zero-based index
    pub fn with_indices(mut self, indices: Vec<usize>) -> Self {
        self.selector = LabelSelector::Indices(indices);
        self
    }

    /// Attach a conditioning transform
    pub fn with_transform(mut self, transform: Arc<dyn ChannelTransform>) -> Self {
        self.transform = Some(transform);
        self
    }
}

impl fmt::Debug for SignalSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalSpec")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("selector", &self.selector)
            .field("transform", &self.transform.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trip() {
        for kind in [
            SignalKind::Spikes,
            SignalKind::Emg,
            SignalKind::Lfp,
            SignalKind::Trigger,
            SignalKind::Event,
            SignalKind::Meta,
            SignalKind::Generic,
        ] {
            assert_eq!(kind.to_string().parse::<SignalKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_unknown_kind_fails() {
        let err = "wideband".parse::<SignalKind>().unwrap_err();
        assert_eq!(
            err,
            NtdError::UnknownSignalType { kind: "wideband".to_string() }
        );
    }

    #[test]
    fn test_time_indexed_kinds() {
        assert!(SignalKind::Spikes.is_time_indexed());
        assert!(SignalKind::Generic.is_time_indexed());
        assert!(!SignalKind::Event.is_time_indexed());
        assert!(!SignalKind::Meta.is_time_indexed());
    }

    #[test]
    fn test_spec_builder() {
        let spec = SignalSpec::new("bicep", SignalKind::Emg).with_labels(vec!["EMG_01"]);
        assert_eq!(spec.name, "bicep");
        assert_eq!(
            spec.selector,
            LabelSelector::Names(vec!["EMG_01".to_string()])
        );
        assert!(spec.transform.is_none());
    }

    #[test]
    fn test_closure_transform() {
        let spec = SignalSpec::new("g", SignalKind::Generic).with_transform(Arc::new(
            |channels: Vec<Vec<f64>>| {
                channels
                    .into_iter()
                    .map(|c| c.into_iter().map(|x| x * 2.0).collect())
                    .collect()
            },
        ));

        let out = spec.transform.unwrap().apply(vec![vec![1.0, 2.0]]);
        assert_eq!(out, vec![vec![2.0, 4.0]]);
    }
}
