//! Binning and conditioning benchmarks
//!
//! The spike histogram and the EMG filter chain dominate conversion time
//! on real sessions, so both are tracked across realistic input sizes.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ntd_convert::{condition_emg, ConversionParams, EmgConditioning};
use ntd_convert::binner::{bin_signal, BinnedValues};
use ntd_convert::extract::ExtractedSignal;
use ntd_core::{ChannelLabels, Matrix, RecordData, SignalKind, UnitLabel};
use std::collections::BTreeMap;

fn spike_signal(units: usize, rate_hz: f64, duration: f64) -> ExtractedSignal {
    let trains: Vec<Vec<f64>> = (0..units)
        .map(|u| {
            let step = 1.0 / (rate_hz + u as f64);
            let mut t = 0.0;
            let mut train = Vec::new();
            while t < duration {
                train.push(t);
                t += step;
            }
            train
        })
        .collect();
    let labels = (0..units).map(|u| UnitLabel::new(u as u16, 1)).collect();

    ExtractedSignal {
        name: "m1".to_string(),
        kind: SignalKind::Spikes,
        sample_rate: 30000.0,
        duration: Some(duration),
        data: RecordData::SpikeTimes(trains),
        labels: ChannelLabels::Units(labels),
        metadata: BTreeMap::new(),
    }
}

fn bench_spike_binning(c: &mut Criterion) {
    let mut group = c.benchmark_group("spike_binning");
    let params = ConversionParams::default();

    for &units in &[16, 64, 256] {
        let signal = spike_signal(units, 20.0, 60.0);
        group.bench_with_input(
            BenchmarkId::new("units", units),
            &signal,
            |b, signal| {
                b.iter(|| {
                    let binned = bin_signal(black_box(signal), &params, 60.0).unwrap();
                    match &binned.values {
                        BinnedValues::Matrix(m) => black_box(m.rows()),
                        _ => unreachable!(),
                    }
                });
            },
        );
    }

    group.finish();
}

fn bench_emg_conditioning(c: &mut Criterion) {
    let mut group = c.benchmark_group("emg_conditioning");
    let conditioning = EmgConditioning::default();

    for &seconds in &[1usize, 10, 60] {
        let samples = seconds * 2000;
        let channel: Vec<f64> =
            (0..samples).map(|i| (i as f64 * 0.37).sin() + (i as f64 * 2.11).sin()).collect();

        group.bench_with_input(
            BenchmarkId::new("seconds", seconds),
            &channel,
            |b, channel| {
                b.iter(|| {
                    let out = condition_emg(black_box(channel), 2000.0, &conditioning, 20).unwrap();
                    black_box(out.len())
                });
            },
        );
    }

    group.finish();
}

fn bench_dense_decimation(c: &mut Criterion) {
    let rows = 120_000;
    let cols = 8;
    let data: Vec<f64> = (0..rows * cols).map(|i| (i as f64 * 0.01).sin()).collect();
    let matrix = Matrix::new(rows, cols, data).unwrap();
    let names = (0..cols).map(|i| format!("ch_{}", i)).collect::<Vec<_>>();
    let params = ConversionParams::default();

    let signal = ExtractedSignal {
        name: "cursor".to_string(),
        kind: SignalKind::Generic,
        sample_rate: 2000.0,
        duration: Some(60.0),
        data: RecordData::Dense(matrix),
        labels: ChannelLabels::Names(names),
        metadata: BTreeMap::new(),
    };

    c.bench_function("generic_decimation_8ch_60s", |b| {
        b.iter(|| {
            let binned = bin_signal(black_box(&signal), &params, 60.0).unwrap();
            black_box(binned.name.len())
        });
    });
}

criterion_group!(
    benches,
    bench_spike_binning,
    bench_emg_conditioning,
    bench_dense_decimation
);
criterion_main!(benches);
