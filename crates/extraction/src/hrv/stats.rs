//! Time-domain statistics. Empty input yields NaN, never a panic.

/// Histogram bin width for the triangular index, in ms
pub const TRIANGULAR_BIN_MS: f64 = 7.0;

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation
pub fn std_dev(values: &[f64]) -> f64 {
    let m = mean(values);
    mean(&values.iter().map(|v| (v - m).powi(2)).collect::<Vec<_>>()).sqrt()
}

/// Median; average of the two middle values for even lengths
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

pub fn min(values: &[f64]) -> f64 {
    values.iter().copied().reduce(f64::min).unwrap_or(f64::NAN)
}

pub fn max(values: &[f64]) -> f64 {
    values.iter().copied().reduce(f64::max).unwrap_or(f64::NAN)
}

/// Root mean square of successive differences, in ms
pub fn rmssd(rr_ms: &[f64]) -> f64 {
    let squares: Vec<f64> = rr_ms
        .windows(2)
        .map(|w| ((w[1] - w[0]) / 1000.0).powi(2))
        .collect();
    mean(&squares).sqrt() * 1000.0
}

/// Sample count over the tallest bin of a 7 ms histogram.
///
/// Bin edges start at the minimum and step by 7 ms up to `max + 8`
/// (exclusive); the last bin is closed on the right.
pub fn triangular_index(rr_ms: &[f64]) -> f64 {
    let (lo, hi) = (min(rr_ms), max(rr_ms));
    if !(lo.is_finite() && hi.is_finite()) {
        return f64::NAN;
    }
    let edges = ((hi + 8.0 - lo) / TRIANGULAR_BIN_MS).ceil() as usize;
    let bins = edges.saturating_sub(1).max(1);
    let mut hist = vec![0usize; bins];
    for v in rr_ms {
        let idx = (((v - lo) / TRIANGULAR_BIN_MS).floor() as usize).min(bins - 1);
        hist[idx] += 1;
    }
    match hist.iter().max() {
        Some(&peak) if peak > 0 => rr_ms.len() as f64 / peak as f64,
        _ => f64::NAN,
    }
}

/// Keep RR samples recorded while the wearer was still.
///
/// The movement series is truncated or zero-padded to the RR length; a
/// sample is kept when its movement is below `median + threshold`.
pub fn rest_filter(rr_ms: &[f64], movement: &[f64], threshold: f64) -> Vec<f64> {
    let mut movement = movement.to_vec();
    movement.resize(rr_ms.len(), 0.0);
    let limit = median(&movement) + threshold;
    rr_ms
        .iter()
        .zip(&movement)
        .filter(|(_, m)| **m < limit)
        .map(|(rr, _)| *rr)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_stats() {
        let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_eq!(mean(&v), 5.0);
        assert_eq!(std_dev(&v), 2.0);
        assert_eq!(median(&v), 4.5);
        assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
        assert_eq!(min(&v), 2.0);
        assert_eq!(max(&v), 9.0);
        assert!(mean(&[]).is_nan());
    }

    #[test]
    fn test_rmssd() {
        // successive differences 10, -10, 10 ms
        let r = rmssd(&[800.0, 810.0, 800.0, 810.0]);
        assert!((r - 10.0).abs() < 1e-9);
        assert!(rmssd(&[800.0]).is_nan());
    }

    #[test]
    fn test_triangular_index() {
        // edges 800, 807, 814; bins [800,807) [807,814]
        let r = triangular_index(&[800.0, 801.0, 806.0, 810.0]);
        assert_eq!(r, 4.0 / 3.0);
        assert_eq!(triangular_index(&[800.0, 800.0]), 1.0);
        assert!(triangular_index(&[]).is_nan());
    }

    #[test]
    fn test_rest_filter_drops_movement() {
        let rr = [800.0, 810.0, 820.0, 830.0];
        let acc = [1.0, 1.0, 100.0, 1.0];
        assert_eq!(rest_filter(&rr, &acc, 20.0), vec![800.0, 810.0, 830.0]);
    }

    #[test]
    fn test_rest_filter_pads_short_movement() {
        let rr = [800.0, 810.0, 820.0];
        assert_eq!(rest_filter(&rr, &[5.0], 20.0), rr.to_vec());
        assert_eq!(rest_filter(&rr, &[1.0, 1.0, 1.0, 500.0], 20.0), rr.to_vec());
    }
}
