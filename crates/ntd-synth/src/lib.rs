//! NTD-Synth: Synthetic recording generation for testing and development
//!
//! Produces seeded, reproducible raw records of every supported source
//! shape: dense EMG with configurable activation patterns, Poisson spike
//! trains, and analog trigger pulses.

pub mod emg;
pub mod pattern;
pub mod spikes;
pub mod trigger;

pub use emg::{EmgConfig, EmgSynth};
pub use pattern::ActivationPattern;
pub use spikes::{SpikeConfig, SpikeSynth};
pub use trigger::{generate_trigger, TriggerConfig};
