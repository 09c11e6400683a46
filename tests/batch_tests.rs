mod common;

use stft_block::prelude::*;
use stft_block::window;

#[test]
fn test_batch_frame_count_inferred() {
    let config = StftConfig::<f32>::new(1024).with_hop(512);
    let mut stft = Stft::new(config).unwrap();

    let spec = stft.analysis(&vec![0.0; 2560]).unwrap();
    assert_eq!(spec.num_frames(), 4);
    assert_eq!(spec.num_bins(), 513);
    assert_eq!(stft.num_frames(), 4);
}

#[test]
fn test_batch_short_input_single_frame() {
    let config = StftConfig::<f32>::new(1024).with_hop(512);
    let mut stft = Stft::new(config).unwrap();

    // less than one frame of input is padded up to exactly one frame
    let spec = stft.analysis(&vec![0.5; 700]).unwrap();
    assert_eq!(spec.num_frames(), 1);
}

#[test]
fn test_batch_hann_steady_state_identity() {
    let frame_size = 512;
    let hop = 256;
    let config = StftConfig::<f32>::new(frame_size)
        .with_hop(hop)
        .with_analysis_window(window::hann(frame_size));
    let mut stft = Stft::new(config).unwrap();

    let num_frames = 16;
    let signal = common::sine_mix((num_frames - 1) * hop + frame_size, 16000.0);
    stft.analysis(&signal).unwrap();
    let reconstructed = stft.synthesis(None).unwrap();
    assert_eq!(reconstructed.len(), num_frames * hop);

    // the first hop only sees one window flank; everything after is exact
    let snr = common::calculate_snr(&signal[hop..num_frames * hop], &reconstructed[hop..]);
    println!("Batch Hann steady-state SNR: {:.2} dB", snr);
    assert!(snr > 100.0, "SNR too low: {:.2} dB", snr);
}

#[test]
fn test_batch_rect_no_overlap_identity() {
    let frame_size = 512;
    let config = StftConfig::<f32>::new(frame_size).with_hop(frame_size);
    let mut stft = Stft::new(config).unwrap();

    let signal = common::sine_mix(8 * frame_size, 16000.0);
    stft.analysis(&signal).unwrap();
    let reconstructed = stft.synthesis(None).unwrap();

    let snr = common::calculate_snr(&signal, &reconstructed);
    println!("Batch no-overlap SNR: {:.2} dB", snr);
    assert!(snr > 100.0, "SNR too low: {:.2} dB", snr);
}

#[test]
fn test_batch_matches_streaming_one_frame_later() {
    // with hop == frame_size / 2, streaming frame k+1 sees the same samples
    // as batch frame k once the carried state has filled
    let frame_size = 256;
    let hop = 128;
    let signal = common::sine_mix(2048, 8000.0);

    let config = StftConfig::<f32>::new(frame_size)
        .with_hop(hop)
        .with_analysis_window(window::hamming(frame_size));
    let mut batch = Stft::new(config.clone()).unwrap();
    let batch_data: Vec<_> = batch.analysis(&signal).unwrap().data().to_vec();
    let batch_frames = batch.num_frames();
    let nbin = batch.nbin();

    let mut streaming = Stft::new(config.with_streaming(true)).unwrap();
    let stream_spec = streaming.analysis(&signal).unwrap();

    for f in 0..batch_frames.min(stream_spec.num_frames() - 1) {
        for bin in 0..nbin {
            let b = batch_data[f * nbin + bin];
            let s = stream_spec.at(f + 1, bin, 0);
            assert!(
                (b - s).norm() < 1e-3,
                "frame {} bin {}: {} vs {}",
                f,
                bin,
                b,
                s
            );
        }
    }
}

#[test]
fn test_batch_fixed_length_mismatch() {
    let config = StftConfig::<f32>::new(1024)
        .with_hop(512)
        .with_frame_count(FrameCountPolicy::Fixed(4));
    let mut stft = Stft::new(config).unwrap();

    // 4 batch frames need (4 - 1) * 512 + 1024 samples
    let err = stft.analysis(&vec![0.0; 2048]).unwrap_err();
    assert_eq!(
        err,
        StftError::LengthMismatch {
            expected: 2560,
            got: 2048
        }
    );
    assert!(stft.analysis(&vec![0.0; 2560]).is_ok());
}

#[test]
fn test_batch_call_independence() {
    // batch calls reset carried state, so repeating the same input repeats
    // the same frames
    let config = StftConfig::<f32>::new(256).with_hop(128);
    let mut stft = Stft::new(config).unwrap();
    let signal = common::sine_mix(1024, 8000.0);

    let first: Vec<_> = stft.analysis(&signal).unwrap().data().to_vec();
    let second: Vec<_> = stft.analysis(&signal).unwrap().data().to_vec();
    for (a, b) in first.iter().zip(&second) {
        assert_eq!(a, b);
    }
}
