//! Error handling for the NTD workspace
//!
//! One error type covers every conversion failure. Conversion is
//! all-or-nothing: no component retries or returns partial results, so
//! every variant here propagates straight to the `convert` caller.

use core::fmt;

/// Result type alias for NTD operations
pub type NtdResult<T> = Result<T, NtdError>;

/// Error type for all trial-data conversion operations
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum NtdError {
    /// File extension not claimed by any registered adapter
    FileFormat {
        /// Path that could not be dispatched
        path: String,
        /// Description of the format problem
        reason: String,
    },

    /// Adapter recognized the file but could not parse its content
    Parse {
        /// Path that failed to parse
        path: String,
        /// Description of the parse failure
        reason: String,
    },

    /// Requested channel label absent from the source record
    LabelNotFound {
        /// Label (or index, rendered) that was requested
        label: String,
        /// Signal name whose selector failed
        signal: String,
    },

    /// Selector cannot be interpreted one way
    AmbiguousSelector {
        /// Signal name whose selector was rejected
        signal: String,
        /// Description of the ambiguity
        reason: String,
    },

    /// Signal kind recognized but not implemented (LFP)
    UnsupportedSignalType {
        /// Kind that is not supported
        kind: String,
        /// Signal name that carried it
        signal: String,
    },

    /// Signal kind string not recognized at all
    UnknownSignalType {
        /// The unrecognized kind string
        kind: String,
    },

    /// Invalid conversion configuration
    InvalidConfig {
        /// Description of the configuration error
        reason: String,
    },

    /// Signal data inconsistent with its own declared shape
    InvalidSignalData {
        /// Description of the shape problem
        reason: String,
    },

    /// Two spike sources share one output name
    DuplicateSpikeSource {
        /// The colliding source name
        name: String,
    },

    /// Same-typed signals disagree on bin count where one grid is assumed
    MisalignedTimeAxis {
        /// Signal name that disagrees
        signal: String,
        /// Bin count of the first signal in the group
        expected: usize,
        /// Bin count actually found
        found: usize,
    },

    /// No signal in the whole call carries a resolvable duration
    MissingDuration {
        /// Signal name that could not be binned
        signal: String,
    },
}

impl fmt::Display for NtdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NtdError::FileFormat { path, reason } => {
                write!(f, "Unrecognized file format for {}: {}", path, reason)
            }
            NtdError::Parse { path, reason } => {
                write!(f, "Failed to parse {}: {}", path, reason)
            }
            NtdError::LabelNotFound { label, signal } => {
                write!(f, "Label {:?} not found for signal '{}'", label, signal)
            }
            NtdError::AmbiguousSelector { signal, reason } => {
                write!(f, "Ambiguous selector for signal '{}': {}", signal, reason)
            }
            NtdError::UnsupportedSignalType { kind, signal } => {
                write!(f, "Signal type {} is not supported (signal '{}')", kind, signal)
            }
            NtdError::UnknownSignalType { kind } => {
                write!(f, "Unknown signal type: {:?}", kind)
            }
            NtdError::InvalidConfig { reason } => {
                write!(f, "Invalid conversion configuration: {}", reason)
            }
            NtdError::InvalidSignalData { reason } => {
                write!(f, "Invalid signal data: {}", reason)
            }
            NtdError::DuplicateSpikeSource { name } => {
                write!(f, "Multiple spike sources share the name '{}'", name)
            }
            NtdError::MisalignedTimeAxis { signal, expected, found } => {
                write!(
                    f,
                    "Signal '{}' has {} bins where {} were expected on the shared axis",
                    signal, found, expected
                )
            }
            NtdError::MissingDuration { signal } => {
                write!(
                    f,
                    "Cannot bin signal '{}': no source in this call has a known duration",
                    signal
                )
            }
        }
    }
}

impl std::error::Error for NtdError {}
