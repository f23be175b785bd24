//! End-to-end conversion pipeline
//!
//! `Converter` drives the whole chain: parse each source file once, extract
//! the requested signals, bin them on the common grid, aggregate into trial
//! fields, align to the shortest time axis, resolve trigger indices, and
//! merge metadata.

use crate::adapter::AdapterRegistry;
use crate::aggregate;
use crate::align;
use crate::binner;
use crate::config::{ConversionParams, ConversionSummary};
use crate::extract::{self, ExtractedSignal};
use crate::merge;
use ntd_core::{MetaMap, NtdError, NtdResult, RawSignalRecord, SignalKind, SignalSpec, TrialData};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{debug, info};

/// One source file and the signals to pull out of it
pub struct SourceFileSpec {
    pub path: PathBuf,
    /// Adapter name override; by file extension when absent
    pub adapter: Option<String>,
    pub signals: Vec<SignalSpec>,
}

impl SourceFileSpec {
    pub fn new(path: impl Into<PathBuf>, signals: Vec<SignalSpec>) -> Self {
        SourceFileSpec { path: path.into(), adapter: None, signals }
    }

    pub fn with_adapter(mut self, adapter: &str) -> Self {
        self.adapter = Some(adapter.to_string());
        self
    }
}

pub struct Converter {
    registry: AdapterRegistry,
    params: ConversionParams,
}

impl Converter {
    pub fn new(params: ConversionParams) -> NtdResult<Self> {
        Self::with_registry(params, AdapterRegistry::with_defaults())
    }

    pub fn with_registry(params: ConversionParams, registry: AdapterRegistry) -> NtdResult<Self> {
        params.validate()?;
        Ok(Converter { registry, params })
    }

    pub fn params(&self) -> &ConversionParams {
        &self.params
    }

    /// Run the full conversion over a set of source files. Signals are
    /// processed in the order given, which fixes EMG column order and
    /// metadata precedence among signals.
    pub fn convert(
        &self,
        sources: &[SourceFileSpec],
        global_metadata: &MetaMap,
    ) -> NtdResult<(TrialData, ConversionSummary)> {
        info!(sources = sources.len(), bin_size = self.params.bin_size, "starting conversion");

        let extracted = self.extract_all(sources)?;
        let binned = self.bin_all(&extracted)?;

        let aggregate::Aggregated { mut trial, trigger_names } = aggregate::aggregate(&binned)?;

        let t_min = align::align(&mut trial)?;
        debug!(?t_min, "aligned");
        align::resolve_triggers(&mut trial, &trigger_names)?;

        let signal_metadata: Vec<MetaMap> =
            extracted.iter().map(|s| s.metadata.clone()).collect();
        merge::merge_metadata(&mut trial, &signal_metadata, global_metadata, &self.params);

        info!(fields = trial.len(), "conversion complete");
        Ok((trial, ConversionSummary::from_params(&self.params)))
    }

    fn extract_all(&self, sources: &[SourceFileSpec]) -> NtdResult<Vec<ExtractedSignal>> {
        let mut cache: HashMap<PathBuf, RawSignalRecord> = HashMap::new();
        let mut extracted = Vec::new();

        for source in sources {
            if !cache.contains_key(&source.path) {
                let adapter = match &source.adapter {
                    Some(name) => {
                        self.registry.by_name(name).ok_or_else(|| NtdError::FileFormat {
                            path: source.path.display().to_string(),
                            reason: format!("No adapter named '{}'", name),
                        })?
                    }
                    None => self.registry.for_path(&source.path)?,
                };
                debug!(path = %source.path.display(), adapter = adapter.name(), "parsing");
                let record = adapter.parse(&source.path)?;
                cache.insert(source.path.clone(), record);
            }
            let record = &cache[&source.path];

            for spec in &source.signals {
                debug!(signal = %spec.name, kind = %spec.kind, "extracting");
                extracted.push(extract::extract(record, spec, &self.params)?);
            }
        }

        Ok(extracted)
    }

    fn bin_all(&self, extracted: &[ExtractedSignal]) -> NtdResult<Vec<binner::BinnedSignal>> {
        // Signals without a duration of their own inherit the longest known
        // one, so spike sources stored as bare timestamp lists still bin
        // over the full recording.
        let fallback = extracted
            .iter()
            .filter_map(|s| s.duration)
            .fold(None, |acc: Option<f64>, d| Some(acc.map_or(d, |a| a.max(d))));

        let mut binned = Vec::with_capacity(extracted.len());
        for signal in extracted {
            let duration = match signal.duration.or(fallback) {
                Some(d) => d,
                None if needs_duration(signal.kind) => {
                    return Err(NtdError::MissingDuration { signal: signal.name.clone() })
                }
                None => 0.0,
            };
            binned.push(binner::bin_signal(signal, &self.params, duration)?);
        }
        Ok(binned)
    }
}

/// Kinds whose bin grid is built from the recording length rather than
/// from their own sample count
fn needs_duration(kind: SignalKind) -> bool {
    matches!(kind, SignalKind::Spikes | SignalKind::Trigger)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ntd_core::{MetaValue, TrialField, UnitLabel};
    use std::collections::BTreeMap;
    use std::fs;
    use std::path::Path;

    fn write_json(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn spike_file(dir: &Path) -> PathBuf {
        write_json(
            dir,
            "m1.json",
            r#"{
                "duration": 0.03,
                "sample_rate": 30000.0,
                "data": {"spike_times": [[0.0, 0.011, 0.025]]},
                "labels": {"units": [{"channel": 1, "unit": 1}]},
                "metadata": {"monkey": "Jango"}
            }"#,
        )
    }

    fn emg_file(dir: &Path) -> PathBuf {
        // 2000 samples at 1 kHz, two channels
        let rows: Vec<String> = (0..2000)
            .map(|i| {
                let t = i as f64 / 1000.0;
                format!("[{}, {}]", (50.0 * t).sin(), (80.0 * t).sin())
            })
            .collect();
        write_json(
            dir,
            "emg.json",
            &format!(
                r#"{{
                    "duration": null,
                    "sample_rate": 1000.0,
                    "data": {{"dense": [{}]}},
                    "labels": {{"names": ["bicep", "tricep"]}}
                }}"#,
                rows.join(", ")
            ),
        )
    }

    fn converter() -> Converter {
        Converter::new(ConversionParams::default()).unwrap()
    }

    #[test]
    fn test_spike_conversion_counts() {
        let dir = tempfile::tempdir().unwrap();
        let sources = vec![SourceFileSpec::new(
            spike_file(dir.path()),
            vec![SignalSpec::new("m1", SignalKind::Spikes)],
        )];

        let (trial, _) = converter().convert(&sources, &BTreeMap::new()).unwrap();

        let spikes = trial.matrix("m1_spikes").unwrap();
        assert_eq!(spikes.column(0).unwrap(), vec![1.0, 1.0, 1.0, 0.0]);
        match trial.get("m1_unit_guide").unwrap() {
            TrialField::UnitGuide(units) => assert_eq!(units, &vec![UnitLabel::new(1, 1)]),
            _ => panic!("expected unit guide"),
        }
        // Axis fields are gone after alignment
        assert!(trial.time_axis_names().is_empty());
    }

    #[test]
    fn test_emg_block_and_names() {
        let dir = tempfile::tempdir().unwrap();
        let sources = vec![SourceFileSpec::new(
            emg_file(dir.path()),
            vec![SignalSpec::new("emg", SignalKind::Emg)],
        )];

        let (trial, _) = converter().convert(&sources, &BTreeMap::new()).unwrap();

        let emg = trial.matrix("emg").unwrap();
        assert_eq!(emg.cols(), 2);
        assert_eq!(emg.rows(), 200);
        match trial.get("emg_names").unwrap() {
            TrialField::Names(names) => {
                assert_eq!(names, &vec!["bicep".to_string(), "tricep".to_string()])
            }
            _ => panic!("expected names"),
        }
    }

    #[test]
    fn test_alignment_truncates_to_shortest() {
        let dir = tempfile::tempdir().unwrap();
        let sources = vec![
            SourceFileSpec::new(
                spike_file(dir.path()),
                vec![SignalSpec::new("m1", SignalKind::Spikes)],
            ),
            SourceFileSpec::new(
                emg_file(dir.path()),
                vec![SignalSpec::new("emg", SignalKind::Emg)],
            ),
        ];

        let (trial, _) = converter().convert(&sources, &BTreeMap::new()).unwrap();

        // Spike source runs 0.03 s (4 bins), EMG 2 s (200 bins)
        assert_eq!(trial.matrix("m1_spikes").unwrap().rows(), 4);
        assert_eq!(trial.matrix("emg").unwrap().rows(), 4);
    }

    #[test]
    fn test_all_noise_spike_source_truncates_with_the_rest() {
        // A source whose only unit carries the noise sort code loses all
        // its trains to exclusion but must still end at the common row
        // count after alignment
        let dir = tempfile::tempdir().unwrap();
        let noise_path = write_json(
            dir.path(),
            "pm.json",
            r#"{
                "duration": 0.05,
                "sample_rate": 30000.0,
                "data": {"spike_times": [[0.005, 0.021]]},
                "labels": {"units": [{"channel": 3, "unit": 255}]}
            }"#,
        );
        let sources = vec![
            SourceFileSpec::new(
                spike_file(dir.path()),
                vec![SignalSpec::new("m1", SignalKind::Spikes)],
            ),
            SourceFileSpec::new(
                noise_path,
                vec![SignalSpec::new("pm", SignalKind::Spikes)],
            ),
        ];

        let (trial, _) = converter().convert(&sources, &BTreeMap::new()).unwrap();

        let m1 = trial.matrix("m1_spikes").unwrap();
        let pm = trial.matrix("pm_spikes").unwrap();
        assert_eq!(m1.rows(), 4);
        assert_eq!(pm.rows(), m1.rows());
        assert_eq!(pm.cols(), 0);
        match trial.get("pm_unit_guide").unwrap() {
            TrialField::UnitGuide(units) => assert!(units.is_empty()),
            _ => panic!("expected unit guide"),
        }
    }

    #[test]
    fn test_global_metadata_overrides_signal_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let sources = vec![SourceFileSpec::new(
            spike_file(dir.path()),
            vec![SignalSpec::new("m1", SignalKind::Spikes)],
        )];
        let global = BTreeMap::from([("monkey".to_string(), MetaValue::from("Spike"))]);

        let (trial, _) = converter().convert(&sources, &global).unwrap();

        assert_eq!(trial.scalar("monkey"), Some(&MetaValue::from("Spike")));
        assert_eq!(trial.scalar("bin_size"), Some(&MetaValue::Float(0.01)));
    }

    #[test]
    fn test_conversion_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        let sources = vec![
            SourceFileSpec::new(
                spike_file(dir.path()),
                vec![SignalSpec::new("m1", SignalKind::Spikes)],
            ),
            SourceFileSpec::new(
                emg_file(dir.path()),
                vec![SignalSpec::new("emg", SignalKind::Emg)],
            ),
        ];

        let c = converter();
        let (first, _) = c.convert(&sources, &BTreeMap::new()).unwrap();
        let (second, _) = c.convert(&sources, &BTreeMap::new()).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_trigger_indices_in_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_json(
            dir.path(),
            "sync.json",
            r#"{
                "duration": 0.08,
                "sample_rate": 100.0,
                "data": {"dense": [[0.0], [0.0], [2.0], [2.0], [0.0], [0.0], [2.0], [2.0]]},
                "labels": {"names": ["sync"]}
            }"#,
        );
        let sources =
            vec![SourceFileSpec::new(path, vec![SignalSpec::new("sync", SignalKind::Trigger)])];

        let (trial, _) = converter().convert(&sources, &BTreeMap::new()).unwrap();

        assert_eq!(trial.indices("idx_sync").unwrap(), &[2, 6]);
        assert!(!trial.contains("sync"));
    }

    #[test]
    fn test_missing_duration_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_json(
            dir.path(),
            "m1.json",
            r#"{
                "duration": null,
                "sample_rate": 30000.0,
                "data": {"spike_times": [[0.01, 0.02]]},
                "labels": {"units": [{"channel": 1, "unit": 1}]}
            }"#,
        );
        let sources =
            vec![SourceFileSpec::new(path, vec![SignalSpec::new("m1", SignalKind::Spikes)])];

        let err = converter().convert(&sources, &BTreeMap::new()).unwrap_err();
        assert!(matches!(err, NtdError::MissingDuration { .. }));
    }

    #[test]
    fn test_unknown_adapter_name() {
        let sources = vec![SourceFileSpec::new(
            "session.json",
            vec![SignalSpec::new("m1", SignalKind::Spikes)],
        )
        .with_adapter("nev")];

        let err = converter().convert(&sources, &BTreeMap::new()).unwrap_err();
        assert!(matches!(err, NtdError::FileFormat { .. }));
    }

    #[test]
    fn test_source_file_parsed_once() {
        // Two signal specs against the same path share one parse; the
        // cheap way to observe that is that a file deleted between specs
        // would still convert, but here we just assert both extractions
        // land in the output.
        let dir = tempfile::tempdir().unwrap();
        let path = emg_file(dir.path());
        let sources = vec![SourceFileSpec::new(
            path,
            vec![
                SignalSpec::new("bicep", SignalKind::Emg).with_labels(vec!["bicep"]),
                SignalSpec::new("tricep", SignalKind::Emg).with_labels(vec!["tricep"]),
            ],
        )];

        let (trial, _) = converter().convert(&sources, &BTreeMap::new()).unwrap();

        let emg = trial.matrix("emg").unwrap();
        assert_eq!(emg.cols(), 2);
        match trial.get("emg_names").unwrap() {
            TrialField::Names(names) => {
                assert_eq!(names, &vec!["bicep".to_string(), "tricep".to_string()])
            }
            _ => panic!("expected names"),
        }
    }
}
