//! Spectral estimation
//!
//! Welch's averaged periodogram over a uniformly resampled-as-is series:
//! overlapping segments, periodic Hann window, per-segment mean removal,
//! one-sided power spectral density.

use num_complex::Complex64;
use rustfft::FftPlanner;
use std::f64::consts::PI;

use crate::stats::trapezoid;

/// Power spectral density estimate
#[derive(Debug, Clone, PartialEq)]
pub struct Periodogram {
    /// Bin centre frequencies (Hz), ascending from 0
    pub frequencies: Vec<f64>,
    /// Power density per bin (units²/Hz)
    pub power: Vec<f64>,
}

impl Periodogram {
    /// Integrate power over `[low, high]` Hz (inclusive) with the trapezoidal rule
    pub fn band_power(&self, low: f64, high: f64) -> f64 {
        let (f, p): (Vec<f64>, Vec<f64>) = self
            .frequencies
            .iter()
            .zip(self.power.iter())
            .filter(|(f, _)| **f >= low && **f <= high)
            .map(|(f, p)| (*f, *p))
            .unzip();
        trapezoid(&p, &f)
    }
}

/// Periodic Hann window of `size` points
pub fn hann_window(size: usize) -> Vec<f64> {
    (0..size)
        .map(|i| 0.5 - 0.5 * ((2.0 * PI * i as f64) / size as f64).cos())
        .collect()
}

/// Estimate the PSD of `signal` sampled at `fs` Hz with Welch's method.
///
/// Segment length is `min(max_segment_length, signal.len())` with 50% overlap.
/// Returns `None` when not even one two-sample segment can be formed or the
/// sampling frequency is not a positive finite number.
pub fn welch(signal: &[f64], fs: f64, max_segment_length: usize) -> Option<Periodogram> {
    let n = signal.len();
    let segment_length = max_segment_length.min(n);
    if segment_length < 2 || !fs.is_finite() || fs <= 0.0 {
        return None;
    }

    let overlap = segment_length / 2;
    let step = segment_length - overlap;
    let segment_count = (n - overlap) / step;

    let window = hann_window(segment_length);
    let window_energy: f64 = window.iter().map(|w| w * w).sum();
    let scale = 1.0 / (fs * window_energy);

    let bins = segment_length / 2 + 1;
    let mut planner = FftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(segment_length);

    let mut accumulated = vec![0.0; bins];
    let mut buffer: Vec<Complex64> = Vec::with_capacity(segment_length);

    for index in 0..segment_count {
        let start = index * step;
        let segment = &signal[start..start + segment_length];
        let segment_mean = segment.iter().sum::<f64>() / segment_length as f64;

        buffer.clear();
        buffer.extend(
            segment
                .iter()
                .zip(window.iter())
                .map(|(x, w)| Complex64::new((x - segment_mean) * w, 0.0)),
        );
        fft.process(&mut buffer);

        for (acc, c) in accumulated.iter_mut().zip(buffer.iter().take(bins)) {
            *acc += c.norm_sqr() * scale;
        }
    }

    // One-sided spectrum: fold negative frequencies in, except DC and
    // (for even lengths) the Nyquist bin.
    let fold_end = if segment_length % 2 == 0 { bins - 1 } else { bins };
    for p in accumulated.iter_mut().take(fold_end).skip(1) {
        *p *= 2.0;
    }

    let power = accumulated
        .into_iter()
        .map(|p| p / segment_count as f64)
        .collect();
    let frequencies = (0..bins)
        .map(|k| k as f64 * fs / segment_length as f64)
        .collect();

    Some(Periodogram { frequencies, power })
}
