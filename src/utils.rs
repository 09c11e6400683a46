//! Stateless one-shot STFT helpers and channel-layout utilities.
//!
//! These functions carry no inter-call state; for continuous streams use the
//! [`Stft`](crate::Stft) engine instead.

use num_traits::Float;
use rustfft::num_complex::Complex;

use crate::transform::{self, bin_count};
use crate::{Backend, Sample, Spectrum, StftError};

/// One-shot STFT of a mono signal: frames of `frame_size` samples every
/// `hop` samples, each zero-padded to `frame_size + zp_front + zp_back`,
/// windowed and forward-transformed. Trailing samples that do not fill a
/// whole frame are dropped.
pub fn analysis<T: Sample>(
    x: &[T],
    frame_size: usize,
    hop: usize,
    win: Option<&[T]>,
    zp_back: usize,
    zp_front: usize,
    backend: Backend,
) -> Result<Spectrum<T>, StftError> {
    if hop == 0 || hop > frame_size {
        return Err(StftError::InvalidHopSize { hop, frame_size });
    }
    let nfft = frame_size + zp_back + zp_front;
    if let Some(w) = win {
        if w.len() != nfft {
            return Err(StftError::InvalidWindowLength {
                expected: nfft,
                got: w.len(),
            });
        }
    }

    let num_frames = if x.len() >= frame_size {
        (x.len() - frame_size) / hop + 1
    } else {
        0
    };
    let mut spec = Spectrum::new(num_frames, bin_count(nfft), 1);
    let mut transform = transform::make_transform::<T>(nfft, backend);
    let mut buf = vec![T::zero(); nfft];
    for f in 0..num_frames {
        let frame = &x[f * hop..f * hop + frame_size];
        match win {
            // pad regions stay zero, so only the active span is windowed
            Some(w) => {
                for i in 0..frame_size {
                    buf[zp_front + i] = frame[i] * w[zp_front + i];
                }
            }
            None => buf[zp_front..zp_front + frame_size].copy_from_slice(frame),
        }
        transform.forward(&buf, spec.frame_mut(f));
    }
    Ok(spec)
}

/// One-shot inverse STFT of mono frames with full-length overlap-add.
///
/// Output length is `num_frames * hop + (frame_size - hop) + zp_back +
/// zp_front`, covering every sample any frame contributes to.
pub fn synthesis<T: Sample>(
    spec: &Spectrum<T>,
    frame_size: usize,
    hop: usize,
    win: Option<&[T]>,
    zp_back: usize,
    zp_front: usize,
    backend: Backend,
) -> Result<Vec<T>, StftError> {
    if hop == 0 || hop > frame_size {
        return Err(StftError::InvalidHopSize { hop, frame_size });
    }
    let nfft = frame_size + zp_back + zp_front;
    if spec.num_channels() != 1 {
        return Err(StftError::ChannelMismatch {
            expected: 1,
            got: spec.num_channels(),
        });
    }
    if spec.num_bins() != bin_count(nfft) {
        return Err(StftError::BinCountMismatch {
            expected: bin_count(nfft),
            got: spec.num_bins(),
        });
    }
    if let Some(w) = win {
        if w.len() != nfft {
            return Err(StftError::InvalidWindowLength {
                expected: nfft,
                got: w.len(),
            });
        }
    }

    let num_frames = spec.num_frames();
    let out_len = if num_frames == 0 {
        0
    } else {
        (num_frames - 1) * hop + nfft
    };
    let mut out = vec![T::zero(); out_len];
    let mut transform = transform::make_transform::<T>(nfft, backend);
    let mut time = vec![T::zero(); nfft];
    let scale = T::one() / T::from(nfft).unwrap();
    for f in 0..num_frames {
        transform.inverse(spec.frame(f), &mut time);
        for (i, &t) in time.iter().enumerate() {
            let v = match win {
                Some(w) => t * scale * w[i],
                None => t * scale,
            };
            out[f * hop + i] = out[f * hop + i] + v;
        }
    }
    Ok(out)
}

/// Convolve two sequences by the overlap-add block method, splitting the
/// longer input into blocks of `block_len` samples and filtering each at
/// transform length `block_len + m - 1` (m = shorter length). Returns the
/// full linear convolution, `x.len() + m - 1` samples.
pub fn overlap_add<T: Sample>(in1: &[T], in2: &[T], block_len: usize) -> Vec<T> {
    assert!(block_len > 0, "block_len must be positive");
    assert!(
        !in1.is_empty() && !in2.is_empty(),
        "inputs must be non-empty"
    );

    // treat the shorter sequence as the filter
    let (x, h) = if in1.len() >= in2.len() {
        (in1, in2)
    } else {
        (in2, in1)
    };
    let m = h.len();
    let n = block_len + m - 1;

    let backend = Backend::default();
    let hf = transform::real_spectrum(h, n, backend);
    let mut transform = transform::make_transform::<T>(n, backend);

    let mut y = vec![T::zero(); x.len().div_ceil(block_len) * block_len + m - 1];
    let mut block = vec![T::zero(); n];
    let mut freq = vec![Complex::new(T::zero(), T::zero()); bin_count(n)];
    let mut time = vec![T::zero(); n];
    let scale = T::one() / T::from(n).unwrap();

    let mut i = 0;
    while i < x.len() {
        let l = block_len.min(x.len() - i);
        block[..l].copy_from_slice(&x[i..i + l]);
        block[l..].fill(T::zero());
        transform.forward(&block, &mut freq);
        for (f, &hv) in freq.iter_mut().zip(&hf) {
            *f = *f * hv;
        }
        transform.inverse(&freq, &mut time);
        for (j, &t) in time.iter().enumerate() {
            y[i + j] = y[i + j] + t * scale;
        }
        i += block_len;
    }

    y.truncate(x.len() + m - 1);
    y
}

/// Deinterleave multi-channel data (`[L,R,L,R,...]` for stereo) into
/// separate channels.
///
/// # Panics
///
/// Panics if `num_channels` is 0 or `data.len()` is not divisible by it.
///
/// # Example
///
/// ```
/// use stft_block::deinterleave;
///
/// let interleaved = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
/// let channels = deinterleave(&interleaved, 2);
/// assert_eq!(channels[0], vec![1.0, 3.0, 5.0]);
/// assert_eq!(channels[1], vec![2.0, 4.0, 6.0]);
/// ```
pub fn deinterleave<T: Float>(data: &[T], num_channels: usize) -> Vec<Vec<T>> {
    assert!(num_channels > 0, "num_channels must be greater than 0");
    assert_eq!(
        data.len() % num_channels,
        0,
        "data length ({}) must be divisible by num_channels ({})",
        data.len(),
        num_channels
    );

    let samples_per_channel = data.len() / num_channels;
    let mut channels = vec![Vec::with_capacity(samples_per_channel); num_channels];
    for (i, &sample) in data.iter().enumerate() {
        channels[i % num_channels].push(sample);
    }
    channels
}

/// Interleave separate channels into a single `[L,R,L,R,...]` buffer.
///
/// # Panics
///
/// Panics if `channels` is empty or the channels have different lengths.
///
/// # Example
///
/// ```
/// use stft_block::interleave;
///
/// let left = vec![1.0, 3.0, 5.0];
/// let right = vec![2.0, 4.0, 6.0];
/// assert_eq!(interleave(&[left, right]), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
/// ```
pub fn interleave<T: Float>(channels: &[Vec<T>]) -> Vec<T> {
    assert!(!channels.is_empty(), "channels must not be empty");
    let samples_per_channel = channels[0].len();
    for (i, channel) in channels.iter().enumerate() {
        assert_eq!(
            channel.len(),
            samples_per_channel,
            "channel {} has length {}, expected {}",
            i,
            channel.len(),
            samples_per_channel
        );
    }

    let mut interleaved = Vec::with_capacity(samples_per_channel * channels.len());
    for sample_idx in 0..samples_per_channel {
        for channel in channels {
            interleaved.push(channel[sample_idx]);
        }
    }
    interleaved
}
