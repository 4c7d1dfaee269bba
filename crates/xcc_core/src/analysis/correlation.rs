//! Cross-correlation of correlation functions against a reference.
//!
//! Uses FFT-based linear cross-correlation:
//! corr(ref, win) = IFFT(FFT(ref) * conj(FFT(win)))
//! with zero padding so no circular wrap-around leaks into the result.

use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

/// Reusable FFT cross-correlator for functions of one fixed length.
///
/// Output index `k` holds the correlation at shift `s = k - center`:
/// `c[k] = Σ_n ref[n + s] · win[n]`, normalized by `sqrt(Σref² · Σwin²)`.
pub struct CrossCorrelator {
    len: usize,
    center: usize,
    fft_len: usize,
    fft: Arc<dyn Fft<f64>>,
    ifft: Arc<dyn Fft<f64>>,
}

impl CrossCorrelator {
    /// Plan a correlator for functions of `len` samples with zero lag at `center`.
    pub fn new(len: usize, center: usize) -> Self {
        // Pad to power of 2 that holds the full linear correlation (2*len - 1)
        let fft_len = (2 * len.max(1)).next_power_of_two();

        let mut planner = FftPlanner::<f64>::new();
        let fft = planner.plan_fft_forward(fft_len);
        let ifft = planner.plan_fft_inverse(fft_len);

        Self {
            len,
            center,
            fft_len,
            fft,
            ifft,
        }
    }

    /// Length of the functions this correlator accepts.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the correlator was planned for empty functions.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Index of zero shift in the output.
    pub fn center(&self) -> usize {
        self.center
    }

    /// Normalized cross-correlation of `window` against `reference`.
    ///
    /// Returns `None` if either input has the wrong length or zero energy.
    pub fn correlate(&self, reference: &[f64], window: &[f64]) -> Option<Vec<f64>> {
        if reference.len() != self.len || window.len() != self.len || self.len == 0 {
            return None;
        }

        let ref_energy: f64 = reference.iter().map(|x| x * x).sum();
        let win_energy: f64 = window.iter().map(|x| x * x).sum();
        let norm_factor = (ref_energy * win_energy).sqrt();
        if !(norm_factor > 1e-15) {
            return None;
        }

        let mut ref_complex = self.padded(reference);
        let mut win_complex = self.padded(window);

        self.fft.process(&mut ref_complex);
        self.fft.process(&mut win_complex);

        let mut product: Vec<Complex<f64>> = ref_complex
            .iter()
            .zip(win_complex.iter())
            .map(|(a, b)| a * b.conj())
            .collect();

        self.ifft.process(&mut product);

        // rustfft leaves the inverse unscaled
        let scale = 1.0 / (self.fft_len as f64 * norm_factor);

        // Negative shifts wrap to the end of the FFT buffer
        let correlation = (0..self.len)
            .map(|k| {
                let shift = k as isize - self.center as isize;
                let idx = shift.rem_euclid(self.fft_len as isize) as usize;
                product[idx].re * scale
            })
            .collect();

        Some(correlation)
    }

    fn padded(&self, samples: &[f64]) -> Vec<Complex<f64>> {
        let mut buffer: Vec<Complex<f64>> =
            samples.iter().map(|&x| Complex::new(x, 0.0)).collect();
        buffer.resize(self.fft_len, Complex::new(0.0, 0.0));
        buffer
    }
}

/// Find the maximum of a correlation array.
///
/// Ties resolve to the lowest index. NaN values are ignored.
/// Returns `None` if there is no finite value.
pub fn find_peak(correlation: &[f64]) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;

    for (i, &v) in correlation.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        match best {
            Some((_, best_val)) if v <= best_val => {}
            _ => best = Some((i, v)),
        }
    }

    best
}

/// Index of the lag sample closest to zero (first one on ties).
pub fn zero_lag_index(lag: &[f64]) -> usize {
    lag.iter()
        .enumerate()
        .fold((0, f64::INFINITY), |(best_i, best_abs), (i, &v)| {
            if v.abs() < best_abs {
                (i, v.abs())
            } else {
                (best_i, best_abs)
            }
        })
        .0
}

/// Pearson correlation coefficient of two equal-length sequences.
///
/// Returns NaN if lengths differ or either sequence is constant.
pub fn pearson(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return f64::NAN;
    }

    let n = a.len() as f64;
    let a_mean = a.iter().sum::<f64>() / n;
    let b_mean = b.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut a_var = 0.0;
    let mut b_var = 0.0;
    for (x, y) in a.iter().zip(b.iter()) {
        let dx = x - a_mean;
        let dy = y - b_mean;
        cov += dx * dy;
        a_var += dx * dx;
        b_var += dy * dy;
    }

    let denom = (a_var * b_var).sqrt();
    if denom < 1e-15 {
        return f64::NAN;
    }
    cov / denom
}

/// Shift a function by `shift` samples, zeroing the samples shifted in.
///
/// Positive shifts move samples towards higher indices.
pub fn shift_samples(row: &[f64], shift: isize) -> Vec<f64> {
    let len = row.len() as isize;
    (0..len)
        .map(|i| {
            let src = i - shift;
            if (0..len).contains(&src) {
                row[src as usize]
            } else {
                0.0
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pulse(len: usize, center: f64) -> Vec<f64> {
        (0..len)
            .map(|i| {
                let d = i as f64 - center;
                (-d * d / 8.0).exp()
            })
            .collect()
    }

    fn direct(reference: &[f64], window: &[f64], center: usize) -> Vec<f64> {
        let n = reference.len() as isize;
        let norm = (reference.iter().map(|x| x * x).sum::<f64>()
            * window.iter().map(|x| x * x).sum::<f64>())
        .sqrt();
        (0..n)
            .map(|k| {
                let s = k - center as isize;
                (0..n)
                    .filter(|&i| (0..n).contains(&(i + s)))
                    .map(|i| reference[(i + s) as usize] * window[i as usize])
                    .sum::<f64>()
                    / norm
            })
            .collect()
    }

    #[test]
    fn identical_functions_peak_at_zero_shift() {
        let f = pulse(41, 20.0);
        let correlator = CrossCorrelator::new(41, 20);
        let c = correlator.correlate(&f, &f).unwrap();

        let (idx, val) = find_peak(&c).unwrap();
        assert_eq!(idx, 20);
        assert!((val - 1.0).abs() < 1e-9, "peak {}", val);
    }

    #[test]
    fn fft_matches_direct_correlation() {
        let reference = pulse(31, 15.0);
        let window = pulse(31, 18.0);
        let correlator = CrossCorrelator::new(31, 15);

        let fast = correlator.correlate(&reference, &window).unwrap();
        let slow = direct(&reference, &window, 15);
        for (a, b) in fast.iter().zip(slow.iter()) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn delayed_window_peaks_at_negative_shift() {
        // Window peak 3 samples later than reference
        let reference = pulse(41, 20.0);
        let window = pulse(41, 23.0);
        let correlator = CrossCorrelator::new(41, 20);

        let c = correlator.correlate(&reference, &window).unwrap();
        let (idx, _) = find_peak(&c).unwrap();
        assert_eq!(idx as isize - 20, -3);
    }

    #[test]
    fn zero_energy_window_has_no_correlation() {
        let correlator = CrossCorrelator::new(5, 2);
        assert!(correlator
            .correlate(&[1.0, 2.0, 3.0, 2.0, 1.0], &[0.0; 5])
            .is_none());
    }

    #[test]
    fn wrong_length_has_no_correlation() {
        let correlator = CrossCorrelator::new(5, 2);
        assert!(correlator.correlate(&[1.0; 4], &[1.0; 5]).is_none());
    }

    #[test]
    fn find_peak_prefers_lowest_index_on_tie() {
        assert_eq!(find_peak(&[0.1, 0.9, 0.3, 0.9]), Some((1, 0.9)));
    }

    #[test]
    fn find_peak_skips_nan() {
        assert_eq!(find_peak(&[f64::NAN, 0.2, 0.1]), Some((1, 0.2)));
        assert_eq!(find_peak(&[f64::NAN]), None);
        assert_eq!(find_peak(&[]), None);
    }

    #[test]
    fn zero_lag_index_finds_center() {
        assert_eq!(zero_lag_index(&[-2.0, -1.0, 0.0, 1.0, 2.0]), 2);
        assert_eq!(zero_lag_index(&[-1.5, -0.5, 0.5, 1.5]), 1);
    }

    #[test]
    fn pearson_of_scaled_copy_is_one() {
        let a = [1.0, 2.0, 3.0, 4.0];
        let b = [2.0, 4.0, 6.0, 8.0];
        assert!((pearson(&a, &b) - 1.0).abs() < 1e-12);
        assert!(pearson(&a, &[1.0; 4]).is_nan());
    }

    #[test]
    fn shift_samples_zeroes_shifted_in() {
        let row = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(shift_samples(&row, 1), vec![0.0, 1.0, 2.0, 3.0]);
        assert_eq!(shift_samples(&row, -2), vec![3.0, 4.0, 0.0, 0.0]);
        assert_eq!(shift_samples(&row, 0), row.to_vec());
    }
}
