//! NTD-Convert: Conversion of raw neurophysiology recordings to trial data
//!
//! Extracts signals from heterogeneous source files through narrow adapter
//! interfaces and fuses them into one time-aligned trial structure on a
//! common bin grid.

pub mod adapter;
pub mod aggregate;
pub mod align;
pub mod binner;
pub mod config;
pub mod extract;
pub mod filters;
pub mod merge;
pub mod pipeline;

pub use adapter::{AdapterRegistry, JsonAdapter, RawAdapter};
pub use binner::{bin_signal, rising_edges, BinnedSignal, BinnedValues};
pub use config::{
    ConversionParams, ConversionSummary, EmgConditioning, SignalSpecDef, SourceFileDef,
    NOISE_UNIT,
};
pub use extract::{extract, ExtractedSignal};
pub use filters::{condition_emg, Biquad};
pub use pipeline::{Converter, SourceFileSpec};
