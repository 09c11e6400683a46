//! Window function generation.
//!
//! All windows are periodic (denominator `size`, not `size - 1`), which is
//! the form whose shifted sums are constant at integer-divisor hops. The
//! engine itself never generates windows; it consumes whatever vector the
//! caller supplies.

use num_traits::{Float, FromPrimitive};

/// Periodic Hann window. Satisfies constant overlap-add at hops of
/// `size / 2^k` when used as an analysis-only window.
pub fn hann<T: Float + FromPrimitive>(size: usize) -> Vec<T> {
    let two_pi = T::from_f64(2.0 * std::f64::consts::PI).unwrap();
    let half = T::from_f64(0.5).unwrap();
    let n = T::from_usize(size).unwrap();
    (0..size)
        .map(|i| half * (T::one() - (two_pi * T::from_usize(i).unwrap() / n).cos()))
        .collect()
}

/// Square root of the periodic Hann window, for matched analysis/synthesis
/// pairs at 50% overlap.
pub fn sqrt_hann<T: Float + FromPrimitive>(size: usize) -> Vec<T> {
    hann::<T>(size).into_iter().map(|w| w.sqrt()).collect()
}

/// Periodic Hamming window.
pub fn hamming<T: Float + FromPrimitive>(size: usize) -> Vec<T> {
    let two_pi = T::from_f64(2.0 * std::f64::consts::PI).unwrap();
    let a = T::from_f64(0.54).unwrap();
    let b = T::from_f64(0.46).unwrap();
    let n = T::from_usize(size).unwrap();
    (0..size)
        .map(|i| a - b * (two_pi * T::from_usize(i).unwrap() / n).cos())
        .collect()
}

/// Periodic Blackman window.
pub fn blackman<T: Float + FromPrimitive>(size: usize) -> Vec<T> {
    let two_pi = T::from_f64(2.0 * std::f64::consts::PI).unwrap();
    let a0 = T::from_f64(0.42).unwrap();
    let a1 = T::from_f64(0.5).unwrap();
    let a2 = T::from_f64(0.08).unwrap();
    let two = T::from_f64(2.0).unwrap();
    let n = T::from_usize(size).unwrap();
    (0..size)
        .map(|i| {
            let angle = two_pi * T::from_usize(i).unwrap() / n;
            a0 - a1 * angle.cos() + a2 * (two * angle).cos()
        })
        .collect()
}

/// All-ones window.
pub fn rect<T: Float + FromPrimitive>(size: usize) -> Vec<T> {
    vec![T::one(); size]
}
