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

//! Real-input transform engine behind the STFT block.
//!
//! This module provides a unified interface over two interchangeable FFT
//! providers:
//! - `realfft`: real-to-complex plans, skips the redundant negative half (default)
//! - `rustfft`: complex plans with conjugate symmetry reconstructed on inverse
//!
//! Both produce identical spectra; they differ only in performance. The
//! [`Dft`] type wraps a provider together with optional analysis/synthesis
//! windows and a batch axis (channels or frames), which is the contract the
//! core engine programs against.

use std::sync::Arc;

use realfft::{ComplexToReal, RealFftPlanner, RealToComplex};
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use crate::{Sample, StftError};

/// Selects which FFT provider performs the forward/inverse transforms.
///
/// Providers are behavior-identical; pick whichever performs best for the
/// transform lengths in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    /// Real-to-complex plans from `realfft`.
    #[default]
    RealFft,
    /// Complex plans from `rustfft`, with the spectrum truncated to the
    /// non-negative bins and conjugate symmetry rebuilt on inverse.
    RustFft,
}

/// One forward/inverse real transform pair of a fixed length.
pub(crate) trait RealTransform<T: Sample>: Send {
    /// Forward real-to-complex transform of one length-`nfft` block into
    /// `nfft/2 + 1` bins.
    fn forward(&mut self, time: &[T], freq: &mut [Complex<T>]);

    /// Inverse complex-to-real transform. Unnormalized: the caller applies
    /// the `1/nfft` factor.
    fn inverse(&mut self, freq: &[Complex<T>], time: &mut [T]);

    fn len(&self) -> usize;
}

/// Number of non-negative frequency bins for a real input of length `nfft`.
#[inline]
pub(crate) fn bin_count(nfft: usize) -> usize {
    nfft / 2 + 1
}

pub(crate) fn make_transform<T: Sample>(
    nfft: usize,
    backend: Backend,
) -> Box<dyn RealTransform<T>> {
    match backend {
        Backend::RealFft => Box::new(RealFftTransform::new(nfft)),
        Backend::RustFft => Box::new(RustFftTransform::new(nfft)),
    }
}

struct RealFftTransform<T: Sample> {
    nfft: usize,
    fwd: Arc<dyn RealToComplex<T>>,
    inv: Arc<dyn ComplexToReal<T>>,
    time_scratch: Vec<T>,
    freq_scratch: Vec<Complex<T>>,
}

impl<T: Sample> RealFftTransform<T> {
    fn new(nfft: usize) -> Self {
        let mut planner = RealFftPlanner::<T>::new();
        let fwd = planner.plan_fft_forward(nfft);
        let inv = planner.plan_fft_inverse(nfft);
        Self {
            nfft,
            fwd,
            inv,
            time_scratch: vec![T::zero(); nfft],
            freq_scratch: vec![Complex::new(T::zero(), T::zero()); bin_count(nfft)],
        }
    }
}

impl<T: Sample> RealTransform<T> for RealFftTransform<T> {
    fn forward(&mut self, time: &[T], freq: &mut [Complex<T>]) {
        // realfft mutates its input, so go through a scratch copy
        self.time_scratch.copy_from_slice(time);
        self.fwd
            .process(&mut self.time_scratch, freq)
            .expect("forward real FFT failed");
    }

    fn inverse(&mut self, freq: &[Complex<T>], time: &mut [T]) {
        self.freq_scratch.copy_from_slice(freq);
        // realfft rejects non-zero imaginary parts on DC (and Nyquist for
        // even lengths); a real output cannot carry them anyway
        self.freq_scratch[0].im = T::zero();
        if self.nfft % 2 == 0 {
            let last = self.freq_scratch.len() - 1;
            self.freq_scratch[last].im = T::zero();
        }
        self.inv
            .process(&mut self.freq_scratch, time)
            .expect("inverse real FFT failed");
    }

    fn len(&self) -> usize {
        self.nfft
    }
}

struct RustFftTransform<T: Sample> {
    nfft: usize,
    fwd: Arc<dyn Fft<T>>,
    inv: Arc<dyn Fft<T>>,
    buf: Vec<Complex<T>>,
}

impl<T: Sample> RustFftTransform<T> {
    fn new(nfft: usize) -> Self {
        let mut planner = FftPlanner::new();
        let fwd = planner.plan_fft_forward(nfft);
        let inv = planner.plan_fft_inverse(nfft);
        Self {
            nfft,
            fwd,
            inv,
            buf: vec![Complex::new(T::zero(), T::zero()); nfft],
        }
    }
}

impl<T: Sample> RealTransform<T> for RustFftTransform<T> {
    fn forward(&mut self, time: &[T], freq: &mut [Complex<T>]) {
        for (b, &t) in self.buf.iter_mut().zip(time.iter()) {
            *b = Complex::new(t, T::zero());
        }
        self.fwd.process(&mut self.buf);
        freq.copy_from_slice(&self.buf[..bin_count(self.nfft)]);
    }

    fn inverse(&mut self, freq: &[Complex<T>], time: &mut [T]) {
        let nbin = bin_count(self.nfft);
        self.buf[..nbin].copy_from_slice(freq);
        self.buf[0].im = T::zero();
        if self.nfft % 2 == 0 {
            self.buf[nbin - 1].im = T::zero();
        }
        // negative frequencies mirror the positive half (DC and, for even
        // lengths, Nyquist are their own mirrors)
        for bin in 1..(self.nfft + 1) / 2 {
            self.buf[self.nfft - bin] = self.buf[bin].conj();
        }
        self.inv.process(&mut self.buf);
        for (t, b) in time.iter_mut().zip(self.buf.iter()) {
            *t = b.re;
        }
    }

    fn len(&self) -> usize {
        self.nfft
    }
}

/// Real spectrum of `coeff` zero-padded to length `nfft`.
pub(crate) fn real_spectrum<T: Sample>(
    coeff: &[T],
    nfft: usize,
    backend: Backend,
) -> Vec<Complex<T>> {
    let mut transform = make_transform::<T>(nfft, backend);
    let mut padded = vec![T::zero(); nfft];
    padded[..coeff.len()].copy_from_slice(coeff);
    let mut freq = vec![Complex::new(T::zero(), T::zero()); bin_count(nfft)];
    transform.forward(&padded, &mut freq);
    freq
}

/// Windowed forward/inverse transform over a batch axis.
///
/// `d` is the number of planar length-`nfft` blocks handled per call: the
/// engine uses channels for per-hop work and frames for batch analysis.
pub struct Dft<T: Sample> {
    nfft: usize,
    nbin: usize,
    d: usize,
    analysis_window: Option<Vec<T>>,
    synthesis_window: Option<Vec<T>>,
    transform: Box<dyn RealTransform<T>>,
    windowed: Vec<T>,
    freq: Vec<Complex<T>>,
    time: Vec<T>,
}

impl<T: Sample> std::fmt::Debug for Dft<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dft")
            .field("nfft", &self.nfft)
            .field("nbin", &self.nbin)
            .field("d", &self.d)
            .finish_non_exhaustive()
    }
}

impl<T: Sample> Dft<T> {
    /// Build a transform pair of length `nfft` over a batch axis of `d`
    /// blocks. Window vectors, when present, must match `nfft` exactly.
    pub fn new(
        nfft: usize,
        d: usize,
        analysis_window: Option<&[T]>,
        synthesis_window: Option<&[T]>,
        backend: Backend,
    ) -> Result<Self, StftError> {
        for win in [analysis_window, synthesis_window].into_iter().flatten() {
            if win.len() != nfft {
                return Err(StftError::InvalidWindowLength {
                    expected: nfft,
                    got: win.len(),
                });
            }
        }
        let nbin = bin_count(nfft);
        Ok(Self {
            nfft,
            nbin,
            d,
            analysis_window: analysis_window.map(<[T]>::to_vec),
            synthesis_window: synthesis_window.map(<[T]>::to_vec),
            transform: make_transform(nfft, backend),
            windowed: vec![T::zero(); nfft],
            freq: vec![Complex::new(T::zero(), T::zero()); d * nbin],
            time: vec![T::zero(); d * nfft],
        })
    }

    pub fn nfft(&self) -> usize {
        self.nfft
    }

    pub fn nbin(&self) -> usize {
        self.nbin
    }

    pub fn batch_len(&self) -> usize {
        self.d
    }

    /// Apply the analysis window and forward-transform `d` planar blocks of
    /// `nfft` samples. Returns `d` planar blocks of `nbin` bins, valid until
    /// the next call.
    pub fn analysis(&mut self, x: &[T]) -> &[Complex<T>] {
        debug_assert_eq!(x.len(), self.d * self.nfft);
        for c in 0..self.d {
            let block = &x[c * self.nfft..(c + 1) * self.nfft];
            let freq = &mut self.freq[c * self.nbin..(c + 1) * self.nbin];
            match &self.analysis_window {
                Some(win) => {
                    for ((w, &s), &v) in self.windowed.iter_mut().zip(block).zip(win) {
                        *w = s * v;
                    }
                    self.transform.forward(&self.windowed, freq);
                }
                None => self.transform.forward(block, freq),
            }
        }
        &self.freq
    }

    /// Inverse-transform `d` planar blocks of `nbin` bins, normalize by
    /// `1/nfft`, and apply the synthesis window. Returns `d` planar blocks of
    /// `nfft` samples, valid until the next call.
    pub fn synthesis(&mut self, x: &[Complex<T>]) -> &[T] {
        debug_assert_eq!(x.len(), self.d * self.nbin);
        let scale = T::one() / T::from(self.nfft).unwrap();
        for c in 0..self.d {
            let freq = &x[c * self.nbin..(c + 1) * self.nbin];
            let time = &mut self.time[c * self.nfft..(c + 1) * self.nfft];
            self.transform.inverse(freq, time);
            match &self.synthesis_window {
                Some(win) => {
                    for (t, &v) in time.iter_mut().zip(win) {
                        *t = *t * scale * v;
                    }
                }
                None => {
                    for t in time.iter_mut() {
                        *t = *t * scale;
                    }
                }
            }
        }
        &self.time
    }
}
