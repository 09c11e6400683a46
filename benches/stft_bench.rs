use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

use stft_block::prelude::*;
use stft_block::window;

fn sine_mix(num_samples: usize, sample_rate: f32) -> Vec<f32> {
    (0..num_samples)
        .map(|i| {
            let t = i as f32 / sample_rate;
            0.3 * (2.0 * std::f32::consts::PI * 440.0 * t).sin()
                + 0.2 * (2.0 * std::f32::consts::PI * 880.0 * t).sin()
                + 0.1 * (2.0 * std::f32::consts::PI * 1320.0 * t).sin()
        })
        .collect()
}

pub fn batch_analysis_bench(c: &mut Criterion) {
    let sample_rate = 44100;
    let audio = sine_mix(sample_rate * 10, sample_rate as f32);

    let config = StftConfig::<f32>::new(4096)
        .with_hop(1024)
        .with_analysis_window(window::hann(4096));
    let mut stft = Stft::new(config).unwrap();

    c.bench_function("batch_analysis_10s", |b| {
        b.iter(|| {
            stft.analysis(black_box(&audio)).unwrap();
        })
    });
}

pub fn streaming_hop_bench(c: &mut Criterion) {
    let hop = 1024;
    let block = sine_mix(hop, 44100.0);

    let config = StftConfig::<f32>::new(4096)
        .with_hop(hop)
        .with_analysis_window(window::hann(4096))
        .with_streaming(true)
        .with_frame_count(FrameCountPolicy::Fixed(0));
    let mut stft = Stft::new(config).unwrap();

    c.bench_function("streaming_hop", |b| {
        b.iter(|| {
            stft.analysis(black_box(&block)).unwrap();
            black_box(stft.synthesis(None).unwrap());
        })
    });
}

pub fn streaming_filtered_hop_bench(c: &mut Criterion) {
    let frame_size = 1024;
    let block = sine_mix(frame_size, 44100.0);
    let taps: Vec<f32> = (0..64).map(|i| ((i as f32) * 0.1).sin() / 64.0).collect();

    let config = StftConfig::<f32>::new(frame_size)
        .with_hop(frame_size)
        .with_streaming(true)
        .with_frame_count(FrameCountPolicy::Fixed(0));
    let mut stft = Stft::new(config).unwrap();
    stft.set_filter(&taps, Some(taps.len() - 1), None).unwrap();

    c.bench_function("streaming_filtered_hop", |b| {
        b.iter(|| {
            stft.analysis(black_box(&block)).unwrap();
            stft.process(None).unwrap();
            black_box(stft.synthesis(None).unwrap());
        })
    });
}

criterion_group!(
    benches,
    batch_analysis_bench,
    streaming_hop_bench,
    streaming_filtered_hop_bench
);
criterion_main!(benches);
