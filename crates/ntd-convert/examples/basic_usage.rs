//! Basic conversion walkthrough
//!
//! Generates a synthetic session (spike-sorted units, two EMG channels,
//! a sync pulse line), writes it out as JSON source files, then runs the
//! full conversion and prints the resulting trial fields.

use anyhow::Context;
use ntd_convert::{ConversionParams, Converter, SourceFileSpec};
use ntd_core::{ChannelLabels, MetaValue, RawSignalRecord, RecordData, SignalKind, SignalSpec};
use ntd_synth::{EmgConfig, EmgSynth, SpikeConfig, SpikeSynth, TriggerConfig};
use serde_json::json;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    println!("=== NTD-Convert Basic Usage ===\n");

    let dir = std::env::temp_dir().join("ntd-basic-usage");
    fs::create_dir_all(&dir).context("creating scratch directory")?;

    let sources = write_session(&dir)?;
    println!("1. Wrote {} synthetic source files under {}\n", sources.len(), dir.display());

    let converter = Converter::new(ConversionParams::default())?;
    let global = BTreeMap::from([
        ("monkey".to_string(), MetaValue::from("Jango")),
        ("task".to_string(), MetaValue::from("WF")),
    ]);

    let (trial, summary) = converter.convert(&sources, &global)?;

    println!("2. Conversion finished at {}", summary.timestamp);
    println!("   bin size: {} s\n", summary.bin_size);

    println!("3. Trial fields:");
    for (name, field) in trial.iter() {
        match field.row_count() {
            Some(rows) => println!("   {:20} matrix, {} rows", name, rows),
            None => println!("   {:20} {:?}", name, field),
        }
    }

    println!("\n=== Done ===");
    Ok(())
}

/// Synthesize one session and write it in the JSON source schema
fn write_session(dir: &Path) -> anyhow::Result<Vec<SourceFileSpec>> {
    let duration = 5.0;

    let mut spikes = SpikeSynth::new(SpikeConfig::default())?;
    let spike_record = spikes.generate(duration, BTreeMap::new())?;
    let spike_path = write_record(dir, "m1.json", &spike_record)?;

    let mut emg = EmgSynth::new(EmgConfig::default())?;
    let emg_record = emg.generate(duration, BTreeMap::new())?;
    let emg_path = write_record(dir, "emg.json", &emg_record)?;

    let trigger_config = TriggerConfig {
        pulse_times: vec![0.5, 1.5, 2.5, 3.5, 4.5],
        ..Default::default()
    };
    let trigger_record = ntd_synth::generate_trigger(&trigger_config, duration, BTreeMap::new())?;
    let trigger_path = write_record(dir, "sync.json", &trigger_record)?;

    Ok(vec![
        SourceFileSpec::new(spike_path, vec![SignalSpec::new("m1", SignalKind::Spikes)]),
        SourceFileSpec::new(emg_path, vec![SignalSpec::new("emg", SignalKind::Emg)]),
        SourceFileSpec::new(trigger_path, vec![SignalSpec::new("sync", SignalKind::Trigger)]),
    ])
}

fn write_record(dir: &Path, name: &str, record: &RawSignalRecord) -> anyhow::Result<PathBuf> {
    let data = match &record.data {
        RecordData::Dense(matrix) => {
            let rows: Vec<Vec<f64>> = (0..matrix.rows())
                .filter_map(|r| matrix.row(r))
                .map(|r| r.to_vec())
                .collect();
            json!({ "dense": rows })
        }
        RecordData::SpikeTimes(trains) => json!({ "spike_times": trains }),
    };
    let labels = match &record.labels {
        ChannelLabels::Names(names) => json!({ "names": names }),
        ChannelLabels::Units(units) => json!({ "units": units }),
    };
    let file = json!({
        "duration": record.duration,
        "sample_rate": record.sample_rate,
        "data": data,
        "labels": labels,
        "metadata": record.metadata,
    });

    let path = dir.join(name);
    fs::write(&path, file.to_string()).with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}
