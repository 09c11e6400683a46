/*MIT License

Copyright (c) 2025 stft-block developers

Permission is hereby granted, free of charge, to any person obtaining a copy
of this software and associated documentation files (the "Software"), to deal
in the Software without restriction, including without limitation the rights
to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in all
copies or substantial portions of the Software.

THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
SOFTWARE.
*/

//! Block-based STFT analysis, frequency-domain filtering, and overlap-add
//! synthesis for streaming and batch multi-channel signals.
//!
//! The central type is [`Stft`], a stateful frame-processing engine. Each
//! call to [`Stft::analysis`] windows and transforms one or more frames;
//! [`Stft::process`] multiplies frames by a configured filter spectrum;
//! [`Stft::synthesis`] inverse-transforms and reconstructs a continuous
//! output by overlap-add. In streaming mode the engine carries input state
//! and an output tail between calls, so consecutive hop-sized blocks stitch
//! into one continuous signal. In batch mode a whole multi-frame signal is
//! handled in a single call.
//!
//! ```
//! use stft_block::prelude::*;
//! use stft_block::window;
//!
//! let config = StftConfig::<f32>::new(512)
//!     .with_hop(256)
//!     .with_streaming(true)
//!     .with_analysis_window(window::hann(512));
//! let mut stft = Stft::new(config).unwrap();
//!
//! let block = vec![0.0f32; 256]; // one hop of new samples
//! let spectrum = stft.analysis(&block).unwrap();
//! assert_eq!(spectrum.num_frames(), 1);
//! assert_eq!(spectrum.num_bins(), 257);
//! ```

use std::fmt;

use log::warn;
use num_traits::{Float, FromPrimitive};

pub mod transform;
pub mod utils;
pub mod window;

pub use rustfft::num_complex::Complex;
pub use transform::{Backend, Dft};
pub use utils::{deinterleave, interleave};

pub mod prelude {
    pub use crate::{Backend, FrameCountPolicy, Sample, Spectrum, Stft, StftConfig, StftError};
}

/// Sample types the engine can transform.
pub trait Sample: Float + FromPrimitive + rustfft::FftNum {}

impl Sample for f32 {}
impl Sample for f64 {}

/// Errors raised synchronously by configuration and per-call validation.
///
/// Three families: configuration (hop/frame relationship, window and filter
/// lengths, zero-padding), shape mismatches on frequency-domain input, and
/// length mismatches on time-domain input under a fixed-size contract.
/// Recoverable conditions (short input in non-fixed mode, missing filter)
/// are handled leniently with a `log` warning instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StftError {
    InvalidFrameSize,
    InvalidChannelCount,
    InvalidHopSize { hop: usize, frame_size: usize },
    InvalidWindowLength { expected: usize, got: usize },
    InsufficientZeroPadding { nfft: usize, required: usize },
    InvalidFilterLength { expected: usize, got: usize },
    ChannelMismatch { expected: usize, got: usize },
    FrameCountMismatch { expected: usize, got: usize },
    BinCountMismatch { expected: usize, got: usize },
    LengthMismatch { expected: usize, got: usize },
    RaggedInput { len: usize, channels: usize },
}

impl fmt::Display for StftError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StftError::InvalidFrameSize => write!(f, "frame size must be positive"),
            StftError::InvalidChannelCount => write!(f, "channel count must be positive"),
            StftError::InvalidHopSize { hop, frame_size } => {
                write!(f, "invalid hop size {} for frame size {}", hop, frame_size)
            }
            StftError::InvalidWindowLength { expected, got } => {
                write!(f, "window must have {} samples, got {}", expected, got)
            }
            StftError::InsufficientZeroPadding { nfft, required } => {
                write!(
                    f,
                    "insufficient zero-padding: transform length {} is below the {} \
                     required for alias-free filtering (frame size + filter length - 1)",
                    nfft, required
                )
            }
            StftError::InvalidFilterLength { expected, got } => {
                write!(
                    f,
                    "frequency-domain filter must have {} bins, got {}",
                    expected, got
                )
            }
            StftError::ChannelMismatch { expected, got } => {
                write!(f, "expected {} channels, got {}", expected, got)
            }
            StftError::FrameCountMismatch { expected, got } => {
                write!(f, "expected {} frames, got {}", expected, got)
            }
            StftError::BinCountMismatch { expected, got } => {
                write!(f, "expected {} frequency bins, got {}", expected, got)
            }
            StftError::LengthMismatch { expected, got } => {
                write!(
                    f,
                    "input must be {} samples per channel, received {}",
                    expected, got
                )
            }
            StftError::RaggedInput { len, channels } => {
                write!(
                    f,
                    "interleaved input length {} is not divisible by channel count {}",
                    len, channels
                )
            }
        }
    }
}

impl std::error::Error for StftError {}

/// Whether the number of frames per call is pinned at construction.
///
/// `Fixed(n)` preallocates all frame buffers once and strictly enforces the
/// matching input length on every call; `Fixed(0)` means one hop of new
/// samples per call (the real-time contract). `Inferred` accepts variable
/// input lengths and re-targets internal buffers as the frame count changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameCountPolicy {
    #[default]
    Inferred,
    Fixed(usize),
}

/// Construction parameters for [`Stft`].
#[derive(Clone)]
pub struct StftConfig<T: Sample> {
    pub frame_size: usize,
    pub hop_size: usize,
    pub channels: usize,
    pub analysis_window: Option<Vec<T>>,
    pub synthesis_window: Option<Vec<T>>,
    pub backend: Backend,
    pub streaming: bool,
    pub frame_count: FrameCountPolicy,
}

impl<T: Sample> StftConfig<T> {
    /// Defaults: hop equal to the frame size, one channel, no windows,
    /// non-streaming, inferred frame count.
    pub fn new(frame_size: usize) -> Self {
        Self {
            frame_size,
            hop_size: frame_size,
            channels: 1,
            analysis_window: None,
            synthesis_window: None,
            backend: Backend::default(),
            streaming: false,
            frame_count: FrameCountPolicy::default(),
        }
    }

    pub fn with_hop(mut self, hop_size: usize) -> Self {
        self.hop_size = hop_size;
        self
    }

    pub fn with_channels(mut self, channels: usize) -> Self {
        self.channels = channels;
        self
    }

    pub fn with_analysis_window(mut self, window: Vec<T>) -> Self {
        self.analysis_window = Some(window);
        self
    }

    pub fn with_synthesis_window(mut self, window: Vec<T>) -> Self {
        self.synthesis_window = Some(window);
        self
    }

    pub fn with_backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_streaming(mut self, streaming: bool) -> Self {
        self.streaming = streaming;
        self
    }

    pub fn with_frame_count(mut self, frame_count: FrameCountPolicy) -> Self {
        self.frame_count = frame_count;
        self
    }
}

/// Frequency-domain frames: `num_frames` frames of `num_bins` bins per
/// channel, stored frame-major with planar channels within each frame.
#[derive(Debug, Clone)]
pub struct Spectrum<T: Sample> {
    num_frames: usize,
    num_bins: usize,
    num_channels: usize,
    data: Vec<Complex<T>>,
}

impl<T: Sample> Spectrum<T> {
    pub fn new(num_frames: usize, num_bins: usize, num_channels: usize) -> Self {
        Self {
            num_frames,
            num_bins,
            num_channels,
            data: vec![Complex::new(T::zero(), T::zero()); num_frames * num_bins * num_channels],
        }
    }

    /// Wrap existing frame data. `data` is frame-major with planar channels,
    /// `num_frames * num_channels * num_bins` values in total.
    pub fn from_data(
        num_frames: usize,
        num_bins: usize,
        num_channels: usize,
        data: Vec<Complex<T>>,
    ) -> Result<Self, StftError> {
        let expected = num_frames * num_bins * num_channels;
        if data.len() != expected {
            return Err(StftError::LengthMismatch {
                expected,
                got: data.len(),
            });
        }
        Ok(Self {
            num_frames,
            num_bins,
            num_channels,
            data,
        })
    }

    pub fn num_frames(&self) -> usize {
        self.num_frames
    }

    pub fn num_bins(&self) -> usize {
        self.num_bins
    }

    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    #[inline]
    fn index(&self, frame: usize, bin: usize, channel: usize) -> usize {
        (frame * self.num_channels + channel) * self.num_bins + bin
    }

    #[inline]
    pub fn at(&self, frame: usize, bin: usize, channel: usize) -> Complex<T> {
        self.data[self.index(frame, bin, channel)]
    }

    #[inline]
    pub fn set(&mut self, frame: usize, bin: usize, channel: usize, value: Complex<T>) {
        let idx = self.index(frame, bin, channel);
        self.data[idx] = value;
    }

    /// One frame as planar channel blocks of `num_bins` bins.
    pub fn frame(&self, frame: usize) -> &[Complex<T>] {
        let stride = self.num_channels * self.num_bins;
        &self.data[frame * stride..(frame + 1) * stride]
    }

    pub fn frame_mut(&mut self, frame: usize) -> &mut [Complex<T>] {
        let stride = self.num_channels * self.num_bins;
        &mut self.data[frame * stride..(frame + 1) * stride]
    }

    pub fn data(&self) -> &[Complex<T>] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [Complex<T>] {
        &mut self.data
    }

    fn fill_zero(&mut self) {
        self.data.fill(Complex::new(T::zero(), T::zero()));
    }
}

/// Stateful block STFT engine.
///
/// Owns every buffer exclusively; instances are not thread-safe and calls
/// must be externally serialized. Time-domain blocks are interleaved
/// `[samples, channels]`; frequency-domain frames travel as [`Spectrum`]
/// values.
pub struct Stft<T: Sample> {
    frame_size: usize,
    hop: usize,
    channels: usize,
    analysis_window_base: Option<Vec<T>>,
    synthesis_window_base: Option<Vec<T>>,
    analysis_window: Option<Vec<T>>,
    synthesis_window: Option<Vec<T>>,
    backend: Backend,
    streaming: bool,
    fixed_frames: Option<usize>,
    zf: usize,
    zb: usize,
    nfft: usize,
    nbin: usize,
    n_state: usize,
    n_state_out: usize,
    num_frames: usize,
    dft: Dft<T>,
    dft_frames: Option<Dft<T>>,
    /// One contiguous transform-length buffer per channel. Within each
    /// channel the active regions are index ranges: carried state at
    /// `zf..zf + n_state`, fresh samples at `zf + n_state..zf + frame_size`,
    /// and the next call's state ("old" samples) at
    /// `zf + hop..zf + hop + n_state`. Fresh and old overlap on purpose.
    fft_in_buffer: Vec<T>,
    /// Snapshot of the old-samples region, taken before fresh samples land.
    x_p: Vec<T>,
    /// Synthesized tail extending past the current hop, carried forward.
    y_p: Vec<T>,
    /// One hop of reconstructed output per channel.
    out: Vec<T>,
    /// Scratch copy of the inverse transform of one frame.
    x_r: Vec<T>,
    spectrum: Spectrum<T>,
    filter: Option<Vec<Complex<T>>>,
}

impl<T: Sample> fmt::Debug for Stft<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stft")
            .field("frame_size", &self.frame_size)
            .field("hop", &self.hop)
            .field("channels", &self.channels)
            .field("backend", &self.backend)
            .field("streaming", &self.streaming)
            .field("fixed_frames", &self.fixed_frames)
            .field("zf", &self.zf)
            .field("zb", &self.zb)
            .field("nfft", &self.nfft)
            .field("nbin", &self.nbin)
            .field("num_frames", &self.num_frames)
            .finish_non_exhaustive()
    }
}

impl<T: Sample> Stft<T> {
    pub fn new(config: StftConfig<T>) -> Result<Self, StftError> {
        if config.frame_size == 0 {
            return Err(StftError::InvalidFrameSize);
        }
        if config.channels == 0 {
            return Err(StftError::InvalidChannelCount);
        }
        if config.hop_size == 0 || config.hop_size > config.frame_size {
            return Err(StftError::InvalidHopSize {
                hop: config.hop_size,
                frame_size: config.frame_size,
            });
        }
        for win in [&config.analysis_window, &config.synthesis_window]
            .into_iter()
            .flatten()
        {
            if win.len() != config.frame_size {
                return Err(StftError::InvalidWindowLength {
                    expected: config.frame_size,
                    got: win.len(),
                });
            }
        }

        let fixed_frames = match config.frame_count {
            FrameCountPolicy::Fixed(n) => Some(n),
            FrameCountPolicy::Inferred => None,
        };
        // Fixed(0) is the one-hop-per-call contract: a single frame in flight
        let num_frames = fixed_frames.map_or(0, |n| n.max(1));

        let mut stft = Self {
            frame_size: config.frame_size,
            hop: config.hop_size,
            channels: config.channels,
            analysis_window_base: config.analysis_window,
            synthesis_window_base: config.synthesis_window,
            analysis_window: None,
            synthesis_window: None,
            backend: config.backend,
            streaming: config.streaming,
            fixed_frames,
            zf: 0,
            zb: 0,
            nfft: 0,
            nbin: 0,
            n_state: 0,
            n_state_out: 0,
            num_frames,
            dft: Dft::new(config.frame_size, config.channels, None, None, config.backend)?,
            dft_frames: None,
            fft_in_buffer: Vec::new(),
            x_p: Vec::new(),
            y_p: Vec::new(),
            out: Vec::new(),
            x_r: Vec::new(),
            spectrum: Spectrum::new(0, 0, 0),
            filter: None,
        };
        stft.update_transform_size();
        stft.make_buffers()?;
        Ok(stft)
    }

    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    pub fn hop_size(&self) -> usize {
        self.hop
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Transform length: frame size plus front and back zero-padding.
    pub fn nfft(&self) -> usize {
        self.nfft
    }

    /// Number of non-negative frequency bins (`nfft / 2 + 1`).
    pub fn nbin(&self) -> usize {
        self.nbin
    }

    /// Frame count of the most recent call (or the fixed count).
    pub fn num_frames(&self) -> usize {
        self.num_frames
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming
    }

    pub fn front_padding(&self) -> usize {
        self.zf
    }

    pub fn back_padding(&self) -> usize {
        self.zb
    }

    /// Streaming output is delayed by this many samples per channel.
    pub fn latency(&self) -> usize {
        self.n_state
    }

    fn resolved_fixed(&self) -> Option<usize> {
        self.fixed_frames.map(|n| n.max(1))
    }

    fn update_transform_size(&mut self) {
        self.nfft = self.frame_size + self.zf + self.zb;
        self.nbin = self.nfft / 2 + 1;
    }

    /// Reallocate every buffer and state vector for the current frame size,
    /// hop, channel count, zero-padding, and frame-count policy. Zeroes all
    /// state as a side effect.
    fn make_buffers(&mut self) -> Result<(), StftError> {
        self.n_state = self.frame_size - self.hop;
        self.n_state_out = self.nfft - self.hop;

        self.analysis_window = self
            .analysis_window_base
            .as_ref()
            .map(|w| zero_extend_window(w, self.zf, self.zb));
        self.synthesis_window = self
            .synthesis_window_base
            .as_ref()
            .map(|w| zero_extend_window(w, self.zf, self.zb));

        self.dft = Dft::new(
            self.nfft,
            self.channels,
            self.analysis_window.as_deref(),
            self.synthesis_window.as_deref(),
            self.backend,
        )?;
        self.dft_frames = None;

        let d = self.channels;
        self.fft_in_buffer = vec![T::zero(); d * self.nfft];
        self.x_p = vec![T::zero(); d * self.n_state];
        self.y_p = vec![T::zero(); d * self.n_state_out];
        self.out = vec![T::zero(); d * self.hop];
        self.x_r = vec![T::zero(); d * self.nfft];

        let alloc_frames = self.resolved_fixed().unwrap_or(0);
        self.spectrum = Spectrum::new(alloc_frames, self.nbin, d);
        if alloc_frames > 1 {
            self.dft_frames = Some(Dft::new(
                self.nfft,
                alloc_frames,
                self.analysis_window.as_deref(),
                self.synthesis_window.as_deref(),
                self.backend,
            )?);
        }

        // a filter computed at a previous transform length is unusable
        if self.filter.as_ref().is_some_and(|h| h.len() != self.nbin) {
            warn!("zero-padding change invalidated the configured filter; clearing it");
            self.filter = None;
        }
        Ok(())
    }

    /// Zero every buffer and state vector. Required after changing
    /// zero-padding or the filter mid-stream (the setters reallocate, which
    /// zeroes implicitly).
    pub fn reset(&mut self) {
        self.fft_in_buffer.fill(T::zero());
        self.x_p.fill(T::zero());
        self.y_p.fill(T::zero());
        self.out.fill(T::zero());
        self.x_r.fill(T::zero());
        self.spectrum.fill_zero();
    }

    /// Set zero-padding at the beginning of each frame. Recomputes the
    /// transform length, extends the windows with leading zeros, and
    /// reallocates all buffers.
    pub fn zero_pad_front(&mut self, zf: usize) -> Result<(), StftError> {
        self.zf = zf;
        self.update_transform_size();
        self.make_buffers()
    }

    /// Set zero-padding at the end of each frame. Recomputes the transform
    /// length, extends the windows with trailing zeros, and reallocates all
    /// buffers.
    pub fn zero_pad_back(&mut self, zb: usize) -> Result<(), StftError> {
        self.zb = zb;
        self.update_transform_size();
        self.make_buffers()
    }

    /// Set a time-domain FIR filter, optionally applying back/front
    /// zero-padding first. The filter's real spectrum is computed at the
    /// current transform length; fails unless
    /// `nfft >= frame_size + coeff.len() - 1` (the circular-convolution
    /// aliasing bound).
    pub fn set_filter(
        &mut self,
        coeff: &[T],
        zb: Option<usize>,
        zf: Option<usize>,
    ) -> Result<(), StftError> {
        if let Some(zb) = zb {
            self.zero_pad_back(zb)?;
        }
        if let Some(zf) = zf {
            self.zero_pad_front(zf)?;
        }
        let required = self.frame_size + coeff.len() - 1;
        if self.nfft < required {
            return Err(StftError::InsufficientZeroPadding {
                nfft: self.nfft,
                required,
            });
        }
        self.filter = Some(transform::real_spectrum(coeff, self.nfft, self.backend));
        Ok(())
    }

    /// Set a filter directly from frequency-domain coefficients; the length
    /// must equal the current bin count exactly.
    pub fn set_frequency_filter(&mut self, coeff: &[Complex<T>]) -> Result<(), StftError> {
        if coeff.len() != self.nbin {
            return Err(StftError::InvalidFilterLength {
                expected: self.nbin,
                got: coeff.len(),
            });
        }
        self.filter = Some(coeff.to_vec());
        Ok(())
    }

    /// Transform a block of interleaved `[samples, channels]` input into
    /// frequency-domain frames.
    ///
    /// Streaming mode consumes a whole number of hops (exactly
    /// `num_frames * hop` under a fixed frame count) and glues frames to the
    /// previous call through the carried state. Batch mode consumes
    /// `(num_frames - 1) * hop + frame_size` samples, resetting state first.
    /// In both modes, short input without a fixed frame count is zero-padded
    /// with a warning rather than rejected.
    pub fn analysis(&mut self, x: &[T]) -> Result<&Spectrum<T>, StftError> {
        if x.len() % self.channels != 0 {
            return Err(StftError::RaggedInput {
                len: x.len(),
                channels: self.channels,
            });
        }
        let samples = x.len() / self.channels;

        let mut owned: Option<Vec<T>> = None;
        if self.streaming {
            match self.resolved_fixed() {
                Some(frames) => {
                    let expected = frames * self.hop;
                    if samples != expected {
                        return Err(StftError::LengthMismatch {
                            expected,
                            got: samples,
                        });
                    }
                    self.num_frames = frames;
                }
                None => {
                    self.num_frames = samples.div_ceil(self.hop);
                    let extra = self.num_frames * self.hop - samples;
                    if extra > 0 {
                        warn!(
                            "received {} samples; appending {} zeros for a whole number of hops",
                            samples, extra
                        );
                        owned = Some(zero_extend(x, extra * self.channels));
                    }
                }
            }
        } else {
            match self.resolved_fixed() {
                Some(frames) => {
                    let expected = (frames - 1) * self.hop + self.frame_size;
                    if samples != expected {
                        return Err(StftError::LengthMismatch {
                            expected,
                            got: samples,
                        });
                    }
                    self.num_frames = frames;
                }
                None => {
                    if samples < self.frame_size {
                        let extra = self.frame_size - samples;
                        warn!(
                            "received {} samples; appending {} zeros for one full frame",
                            samples, extra
                        );
                        owned = Some(zero_extend(x, extra * self.channels));
                        self.num_frames = 1;
                    } else {
                        self.num_frames = (samples - self.frame_size).div_ceil(self.hop) + 1;
                        let extra = (self.num_frames - 1) * self.hop + self.frame_size - samples;
                        if extra > 0 {
                            warn!(
                                "received {} samples; appending {} zeros for a whole number of hops",
                                samples, extra
                            );
                            owned = Some(zero_extend(x, extra * self.channels));
                        }
                    }
                }
            }
        }

        self.retarget_spectrum();
        let data = owned.as_deref().unwrap_or(x);
        if self.streaming {
            self.analysis_streaming(data);
        } else {
            self.reset();
            self.analysis_batch(data)?;
        }
        Ok(&self.spectrum)
    }

    /// Multiply every frame by the configured filter spectrum, in place.
    ///
    /// `x` supplies external frames to operate on (validated and adopted,
    /// see [`Stft::synthesis`]); `None` operates on the frames produced by
    /// the last call. Without a configured filter this warns and leaves the
    /// frames untouched.
    pub fn process(&mut self, x: Option<&Spectrum<T>>) -> Result<&Spectrum<T>, StftError> {
        if let Some(s) = x {
            self.adopt_spectrum(s)?;
        }
        match &self.filter {
            None => warn!("no filter has been set; spectrum left untouched"),
            Some(h) => {
                for chunk in self.spectrum.data.chunks_mut(h.len()) {
                    for (v, &hv) in chunk.iter_mut().zip(h) {
                        *v = *v * hv;
                    }
                }
            }
        }
        Ok(&self.spectrum)
    }

    /// Inverse-transform frames and reconstruct interleaved time-domain
    /// output by overlap-add, one hop per frame.
    ///
    /// `x` supplies external frames: the bin and channel counts must match,
    /// and under a fixed frame count the frame count must match exactly;
    /// otherwise the engine adopts the incoming frame count. `None` consumes
    /// the engine's own frames. In streaming use the carried output tail
    /// cancels frame-boundary discontinuities across calls.
    pub fn synthesis(&mut self, x: Option<&Spectrum<T>>) -> Result<Vec<T>, StftError> {
        if let Some(s) = x {
            self.adopt_spectrum(s)?;
        }
        let d = self.channels;
        let mut out = vec![T::zero(); self.num_frames * self.hop * d];
        for f in 0..self.num_frames {
            let time = self.dft.synthesis(self.spectrum.frame(f));
            self.x_r.copy_from_slice(time);
            let dst = &mut out[f * self.hop * d..(f + 1) * self.hop * d];
            self.overlap_and_add(dst);
        }
        Ok(out)
    }

    /// Streaming assembly: per hop, write fresh samples, snapshot the old
    /// region before it is clobbered, transform, then slide the snapshot
    /// back into the state region.
    fn analysis_streaming(&mut self, x: &[T]) {
        let d = self.channels;
        for k in 0..self.num_frames {
            let n = k * self.hop;
            for c in 0..d {
                let base = c * self.nfft + self.zf;
                for i in 0..self.hop {
                    self.fft_in_buffer[base + self.n_state + i] = x[(n + i) * d + c];
                }
                self.x_p[c * self.n_state..(c + 1) * self.n_state].copy_from_slice(
                    &self.fft_in_buffer[base + self.hop..base + self.hop + self.n_state],
                );
            }
            let spec = self.dft.analysis(&self.fft_in_buffer);
            self.spectrum.frame_mut(k).copy_from_slice(spec);
            for c in 0..d {
                let base = c * self.nfft + self.zf;
                self.fft_in_buffer[base..base + self.n_state]
                    .copy_from_slice(&self.x_p[c * self.n_state..(c + 1) * self.n_state]);
            }
        }
    }

    /// Batch assembly: copy the strided frame view per channel and transform
    /// all frames at once along the batch axis.
    fn analysis_batch(&mut self, x: &[T]) -> Result<(), StftError> {
        self.ensure_dft_frames()?;
        let frames = self.num_frames;
        let d = self.channels;
        let n = self.frame_size;
        let mut buf = vec![T::zero(); frames * self.nfft];
        for c in 0..d {
            for f in 0..frames {
                let dst = &mut buf[f * self.nfft + self.zf..f * self.nfft + self.zf + n];
                for (i, v) in dst.iter_mut().enumerate() {
                    *v = x[(f * self.hop + i) * d + c];
                }
            }
            let dft_frames = self
                .dft_frames
                .as_mut()
                .expect("batch transform allocated above");
            let spec = dft_frames.analysis(&buf);
            for f in 0..frames {
                self.spectrum.frame_mut(f)[c * self.nbin..(c + 1) * self.nbin]
                    .copy_from_slice(&spec[f * self.nbin..(f + 1) * self.nbin]);
            }
        }
        Ok(())
    }

    /// Reconstruct one hop from the synthesized frame in `x_r`, consuming
    /// and refilling the carried output tail.
    fn overlap_and_add(&mut self, dst: &mut [T]) {
        let d = self.channels;
        for c in 0..d {
            let frame = &self.x_r[c * self.nfft..(c + 1) * self.nfft];
            let out = &mut self.out[c * self.hop..(c + 1) * self.hop];
            out.copy_from_slice(&frame[..self.hop]);
            if self.n_state_out > 0 {
                let tail = &mut self.y_p[c * self.n_state_out..(c + 1) * self.n_state_out];
                let m = self.hop.min(self.n_state_out);
                for i in 0..m {
                    out[i] = out[i] + tail[i];
                }
                // emit the first hop of the tail, then accumulate this
                // frame's overhang for future calls
                if self.hop < self.n_state_out {
                    tail.copy_within(self.hop.., 0);
                    tail[self.n_state_out - self.hop..].fill(T::zero());
                } else {
                    tail.fill(T::zero());
                }
                for (t, &v) in tail.iter_mut().zip(&frame[self.nfft - self.n_state_out..]) {
                    *t = *t + v;
                }
            }
        }
        for i in 0..self.hop {
            for c in 0..d {
                dst[i * d + c] = self.out[c * self.hop + i];
            }
        }
    }

    /// Validate externally supplied frames and copy them in. Bin and channel
    /// counts must match; the frame count must match under a fixed policy
    /// and is adopted otherwise.
    fn adopt_spectrum(&mut self, s: &Spectrum<T>) -> Result<(), StftError> {
        if s.num_bins != self.nbin {
            return Err(StftError::BinCountMismatch {
                expected: self.nbin,
                got: s.num_bins,
            });
        }
        if s.num_channels != self.channels {
            return Err(StftError::ChannelMismatch {
                expected: self.channels,
                got: s.num_channels,
            });
        }
        if self.fixed_frames.is_some() {
            if s.num_frames != self.num_frames {
                return Err(StftError::FrameCountMismatch {
                    expected: self.num_frames,
                    got: s.num_frames,
                });
            }
            self.spectrum.data.copy_from_slice(&s.data);
        } else {
            self.num_frames = s.num_frames;
            if self.spectrum.num_frames == s.num_frames {
                self.spectrum.data.copy_from_slice(&s.data);
            } else {
                self.spectrum = s.clone();
            }
        }
        Ok(())
    }

    fn retarget_spectrum(&mut self) {
        if self.spectrum.num_frames != self.num_frames {
            self.spectrum = Spectrum::new(self.num_frames, self.nbin, self.channels);
        }
    }

    fn ensure_dft_frames(&mut self) -> Result<(), StftError> {
        let needed = self.num_frames;
        let ok = self
            .dft_frames
            .as_ref()
            .is_some_and(|d| d.batch_len() == needed);
        if !ok {
            self.dft_frames = Some(Dft::new(
                self.nfft,
                needed,
                self.analysis_window.as_deref(),
                self.synthesis_window.as_deref(),
                self.backend,
            )?);
        }
        Ok(())
    }
}

fn zero_extend<T: Sample>(x: &[T], extra: usize) -> Vec<T> {
    let mut padded = vec![T::zero(); x.len() + extra];
    padded[..x.len()].copy_from_slice(x);
    padded
}

fn zero_extend_window<T: Sample>(win: &[T], zf: usize, zb: usize) -> Vec<T> {
    let mut padded = vec![T::zero(); zf + win.len() + zb];
    padded[zf..zf + win.len()].copy_from_slice(win);
    padded
}
