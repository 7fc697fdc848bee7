//! Frequency-domain HRV: even resampling of the RR tachogram and Welch power
//! spectral density.

use std::f64::consts::PI;

/// Resampling rate of the tachogram, Hz
pub const RESAMPLE_HZ: f64 = 4.0;

/// Welch segment length cap
pub const SEGMENT_LEN: usize = 256;

pub const LF_BAND: (f64, f64) = (0.04, 0.15);
pub const HF_BAND: (f64, f64) = (0.15, 0.4);

/// Natural cubic spline through strictly increasing knots.
pub struct CubicSpline {
    x: Vec<f64>,
    y: Vec<f64>,
    /// Second derivatives at the knots
    m: Vec<f64>,
}

impl CubicSpline {
    /// `None` with fewer than two knots or non-increasing abscissae.
    pub fn natural(x: &[f64], y: &[f64]) -> Option<Self> {
        let n = x.len();
        if n < 2 || n != y.len() || x.windows(2).any(|w| w[1] <= w[0]) {
            return None;
        }

        // Tridiagonal system for interior second derivatives (Thomas algorithm)
        let mut m = vec![0.0; n];
        if n > 2 {
            let h: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();
            let size = n - 2;
            let mut diag = vec![0.0; size];
            let mut upper = vec![0.0; size];
            let mut rhs = vec![0.0; size];
            for i in 0..size {
                diag[i] = 2.0 * (h[i] + h[i + 1]);
                upper[i] = h[i + 1];
                rhs[i] = 6.0 * ((y[i + 2] - y[i + 1]) / h[i + 1] - (y[i + 1] - y[i]) / h[i]);
            }
            for i in 1..size {
                let w = h[i] / diag[i - 1];
                diag[i] -= w * upper[i - 1];
                rhs[i] -= w * rhs[i - 1];
            }
            m[size] = rhs[size - 1] / diag[size - 1];
            for i in (0..size - 1).rev() {
                m[i + 1] = (rhs[i] - upper[i] * m[i + 2]) / diag[i];
            }
        }

        Some(Self {
            x: x.to_vec(),
            y: y.to_vec(),
            m,
        })
    }

    pub fn eval(&self, t: f64) -> f64 {
        let last = self.x.len() - 2;
        let i = self.x.partition_point(|&k| k <= t).saturating_sub(1).min(last);
        let h = self.x[i + 1] - self.x[i];
        let a = (self.x[i + 1] - t) / h;
        let b = (t - self.x[i]) / h;
        a * self.y[i]
            + b * self.y[i + 1]
            + ((a.powi(3) - a) * self.m[i] + (b.powi(3) - b) * self.m[i + 1]) * h * h / 6.0
    }
}

/// Evenly resample an RR series (ms) on its cumulative time axis.
///
/// Returns RR in ms sampled every `1 / RESAMPLE_HZ` s from the first beat up
/// to, not including, the last one. Spectral power is therefore in ms².
pub fn resample_tachogram(rr_ms: &[f64]) -> Option<Vec<f64>> {
    let mut elapsed = 0.0;
    let t: Vec<f64> = rr_ms
        .iter()
        .map(|rr| {
            elapsed += rr / 1000.0;
            elapsed
        })
        .collect();
    let spline = CubicSpline::natural(&t, rr_ms)?;

    let (start, end) = (t[0], t[t.len() - 1]);
    let step = 1.0 / RESAMPLE_HZ;
    let count = ((end - start) / step).ceil() as usize;
    Some((0..count).map(|k| spline.eval(start + k as f64 * step)).collect())
}

/// Periodic Hann window
fn hann(len: usize) -> Vec<f64> {
    (0..len)
        .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f64 / len as f64).cos())
        .collect()
}

/// `cos` / `sin` of `-2πj / len` for `j < len`, indexed modulo `len`
struct Twiddles {
    cos: Vec<f64>,
    sin: Vec<f64>,
}

impl Twiddles {
    fn new(len: usize) -> Self {
        let (cos, sin) = (0..len)
            .map(|j| {
                let angle = -2.0 * PI * j as f64 / len as f64;
                (angle.cos(), angle.sin())
            })
            .unzip();
        Self { cos, sin }
    }

    #[inline]
    fn at(&self, j: usize) -> (f64, f64) {
        let j = j % self.cos.len();
        (self.cos[j], self.sin[j])
    }
}

/// One-sided power spectral density by Welch's method: Hann window, 50%
/// overlap, per-segment mean removal, density scaling.
///
/// Returns `(frequencies, psd)`; empty when the signal is empty.
pub fn welch(signal: &[f64], fs: f64) -> (Vec<f64>, Vec<f64>) {
    let seg = SEGMENT_LEN.min(signal.len());
    if seg == 0 {
        return (Vec::new(), Vec::new());
    }
    let step = seg - seg / 2;
    let window = hann(seg);
    let scale = 1.0 / (fs * window.iter().map(|w| w * w).sum::<f64>());
    let bins = seg / 2 + 1;
    let twiddles = Twiddles::new(seg);

    let mut psd = vec![0.0; bins];
    let mut segments = 0usize;
    let mut start = 0;
    while start + seg <= signal.len() {
        let chunk = &signal[start..start + seg];
        let avg = chunk.iter().sum::<f64>() / seg as f64;
        let tapered: Vec<f64> = chunk
            .iter()
            .zip(&window)
            .map(|(v, w)| (v - avg) * w)
            .collect();

        for (k, p) in psd.iter_mut().enumerate() {
            let (mut re, mut im) = (0.0, 0.0);
            for (n, v) in tapered.iter().enumerate() {
                let (c, s) = twiddles.at(k * n);
                re += v * c;
                im += v * s;
            }
            let mut power = (re * re + im * im) * scale;
            let nyquist = seg % 2 == 0 && k == seg / 2;
            if k != 0 && !nyquist {
                power *= 2.0;
            }
            *p += power;
        }
        segments += 1;
        start += step;
    }

    for p in &mut psd {
        *p /= segments as f64;
    }
    let freqs = (0..bins).map(|k| k as f64 * fs / seg as f64).collect();
    (freqs, psd)
}

/// Trapezoidal integral of `psd` over `lo <= f <= hi`
pub fn band_power(freqs: &[f64], psd: &[f64], (lo, hi): (f64, f64)) -> f64 {
    let band: Vec<(f64, f64)> = freqs
        .iter()
        .zip(psd)
        .filter(|(f, _)| **f >= lo && **f <= hi)
        .map(|(f, p)| (*f, *p))
        .collect();
    band.windows(2)
        .map(|w| (w[1].0 - w[0].0) * (w[0].1 + w[1].1) / 2.0)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spline_interpolates_knots() {
        let x = [0.0, 1.0, 2.5, 4.0];
        let y = [1.0, 3.0, 2.0, 5.0];
        let s = CubicSpline::natural(&x, &y).unwrap();
        for (xi, yi) in x.iter().zip(&y) {
            assert!((s.eval(*xi) - yi).abs() < 1e-12);
        }
    }

    #[test]
    fn test_spline_reproduces_lines() {
        let x = [0.0, 1.0, 3.0, 4.0, 7.0];
        let y: Vec<f64> = x.iter().map(|v| 2.0 * v + 1.0).collect();
        let s = CubicSpline::natural(&x, &y).unwrap();
        assert!((s.eval(5.5) - 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_spline_rejects_bad_knots() {
        assert!(CubicSpline::natural(&[0.0], &[1.0]).is_none());
        assert!(CubicSpline::natural(&[0.0, 0.0], &[1.0, 2.0]).is_none());
    }

    #[test]
    fn test_resample_length() {
        // 10 beats of 1 s: t = 1..=10, samples every 0.25 s on [1, 10)
        let rr = vec![1000.0; 10];
        let samples = resample_tachogram(&rr).unwrap();
        assert_eq!(samples.len(), 36);
        assert!(samples.iter().all(|v| (v - 1000.0).abs() < 1e-9));
    }

    #[test]
    fn test_welch_locates_sine_peak() {
        let fs = 4.0;
        let signal: Vec<f64> = (0..1024)
            .map(|i| (2.0 * PI * 0.25 * i as f64 / fs).sin())
            .collect();
        let (freqs, psd) = welch(&signal, fs);
        assert_eq!(freqs.len(), 129);
        let peak = psd
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| freqs[i])
            .unwrap();
        assert!((peak - 0.25).abs() < 1e-9);
        assert!(band_power(&freqs, &psd, HF_BAND) > 100.0 * band_power(&freqs, &psd, LF_BAND));
    }

    #[test]
    fn test_welch_alternating_signal_at_nyquist() {
        let fs = 4.0;
        let signal: Vec<f64> = (0..256).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        let (freqs, psd) = welch(&signal, fs);
        let df = freqs[1] - freqs[0];
        let total: f64 = psd.iter().sum::<f64>() * df;
        // Hann leakage reaches only the neighbouring bin
        assert!(total > 0.0);
        assert!(psd[..psd.len() - 2].iter().all(|p| *p < 1e-9));
    }

    #[test]
    fn test_welch_single_segment_matches_direct_dft() {
        let fs = 2.0;
        let signal: Vec<f64> = (0..50)
            .map(|i| ((i * 7 % 11) as f64) - 0.3 * i as f64)
            .collect();
        let (freqs, psd) = welch(&signal, fs);
        assert_eq!(freqs.len(), 26);

        let seg = signal.len();
        let window = hann(seg);
        let avg = signal.iter().sum::<f64>() / seg as f64;
        let scale = 1.0 / (fs * window.iter().map(|w| w * w).sum::<f64>());
        for (k, p) in psd.iter().enumerate() {
            let (mut re, mut im) = (0.0, 0.0);
            for (n, (v, w)) in signal.iter().zip(&window).enumerate() {
                let angle = -2.0 * PI * (k * n) as f64 / seg as f64;
                re += (v - avg) * w * angle.cos();
                im += (v - avg) * w * angle.sin();
            }
            let factor = if k == 0 || k == seg / 2 { 1.0 } else { 2.0 };
            let expected = (re * re + im * im) * scale * factor;
            assert!((p - expected).abs() <= 1e-9 * expected.abs().max(1.0), "bin {k}");
        }
    }

    #[test]
    fn test_band_power_trapezoid() {
        let freqs = [0.0, 0.05, 0.1, 0.15, 0.2];
        let psd = [9.0, 1.0, 1.0, 1.0, 9.0];
        assert!((band_power(&freqs, &psd, LF_BAND) - 0.1).abs() < 1e-12);
        assert_eq!(band_power(&freqs, &psd, (0.3, 0.4)), 0.0);
    }
}
