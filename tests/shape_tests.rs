use stft_block::prelude::*;
use stft_block::Complex;

fn engine(frame_count: FrameCountPolicy) -> Stft<f32> {
    let config = StftConfig::<f32>::new(64)
        .with_hop(32)
        .with_frame_count(frame_count);
    Stft::new(config).unwrap()
}

#[test]
fn test_external_spectrum_bin_count_mismatch() {
    let mut stft = engine(FrameCountPolicy::Inferred);
    let spec = Spectrum::<f32>::new(2, 17, 1);
    let err = stft.synthesis(Some(&spec)).unwrap_err();
    assert_eq!(
        err,
        StftError::BinCountMismatch {
            expected: 33,
            got: 17
        }
    );
}

#[test]
fn test_external_spectrum_channel_mismatch() {
    let mut stft = engine(FrameCountPolicy::Inferred);
    let spec = Spectrum::<f32>::new(2, 33, 2);
    let err = stft.synthesis(Some(&spec)).unwrap_err();
    assert_eq!(
        err,
        StftError::ChannelMismatch {
            expected: 1,
            got: 2
        }
    );
}

#[test]
fn test_external_spectrum_fixed_frame_count_mismatch() {
    let mut stft = engine(FrameCountPolicy::Fixed(4));
    let spec = Spectrum::<f32>::new(3, 33, 1);
    let err = stft.synthesis(Some(&spec)).unwrap_err();
    assert_eq!(
        err,
        StftError::FrameCountMismatch {
            expected: 4,
            got: 3
        }
    );
}

#[test]
fn test_external_spectrum_adopted_when_inferred() {
    let mut stft = engine(FrameCountPolicy::Inferred);
    let spec = Spectrum::<f32>::new(3, 33, 1);
    let out = stft.synthesis(Some(&spec)).unwrap();
    assert_eq!(out.len(), 3 * 32);
    assert_eq!(stft.num_frames(), 3);
}

#[test]
fn test_external_spectrum_process_and_synthesize() {
    // a DC-only frame inverse-transforms to a constant block
    let mut stft = engine(FrameCountPolicy::Inferred);
    let mut spec = Spectrum::<f32>::new(1, 33, 1);
    spec.set(0, 0, 0, Complex::new(64.0, 0.0));

    let out = stft.synthesis(Some(&spec)).unwrap();
    assert_eq!(out.len(), 32);
    for &v in &out {
        assert!((v - 1.0).abs() < 1e-5, "expected 1.0, got {}", v);
    }
}

#[test]
fn test_spectrum_from_data_validates_length() {
    let data = vec![Complex::new(0.0f32, 0.0); 10];
    assert!(Spectrum::from_data(2, 5, 1, data.clone()).is_ok());
    assert!(Spectrum::from_data(3, 5, 1, data).is_err());
}

#[test]
fn test_spectrum_indexing_layout() {
    // layout is frame-major, then channel, then bin
    let mut spec = Spectrum::<f32>::new(2, 3, 2);
    spec.set(1, 2, 1, Complex::new(7.0, 0.0));
    assert_eq!(spec.data()[(1 * 2 + 1) * 3 + 2], Complex::new(7.0, 0.0));
    assert_eq!(spec.at(1, 2, 1), Complex::new(7.0, 0.0));
}
