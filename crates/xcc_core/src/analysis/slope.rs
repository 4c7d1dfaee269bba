//! Local slope feature of a correction series.
//!
//! The slope is the finite-difference derivative of correction with
//! respect to time, median filtered to suppress single-sample spikes.

/// Median filter window used for slope smoothing.
pub const SLOPE_MEDIAN_WINDOW: usize = 5;

/// Smoothed local slope of `values` over `times`.
pub fn local_slope(times: &[f64], values: &[f64]) -> Vec<f64> {
    median_filter(&gradient(times, values), SLOPE_MEDIAN_WINDOW)
}

/// Finite-difference derivative.
///
/// Central differences inside, one-sided differences at the ends.
/// A zero time spacing yields slope 0.
pub fn gradient(times: &[f64], values: &[f64]) -> Vec<f64> {
    let n = times.len().min(values.len());
    if n < 2 {
        return vec![0.0; n];
    }

    let diff = |i: usize, j: usize| {
        let dt = times[j] - times[i];
        if dt == 0.0 {
            0.0
        } else {
            (values[j] - values[i]) / dt
        }
    };

    (0..n)
        .map(|i| match i {
            0 => diff(0, 1),
            _ if i == n - 1 => diff(n - 2, n - 1),
            _ => diff(i - 1, i + 1),
        })
        .collect()
}

/// Median filter with zero padding at both ends.
///
/// `window` is rounded up to the next odd size.
pub fn median_filter(values: &[f64], window: usize) -> Vec<f64> {
    let window = if window % 2 == 0 { window + 1 } else { window };
    let half = (window / 2) as isize;
    let n = values.len() as isize;

    (0..n)
        .map(|i| {
            let mut neighbourhood: Vec<f64> = (i - half..=i + half)
                .map(|j| {
                    if (0..n).contains(&j) {
                        values[j as usize]
                    } else {
                        0.0
                    }
                })
                .collect();
            neighbourhood.sort_by(|a, b| a.total_cmp(b));
            neighbourhood[neighbourhood.len() / 2]
        })
        .collect()
}
