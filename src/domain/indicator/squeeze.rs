//! Volatility squeeze detection over the band-width series.
//!
//! A squeeze marks a bar whose band width is compressed relative to its
//! own trailing history. Two rules are supported:
//!
//! - `Percentile`: width strictly below the q-quantile (linear
//!   interpolation) of the trailing `lookback` widths, current bar
//!   included.
//! - `RollingMin`: width below 1.1 × the trailing rolling minimum.
//!
//! A window containing any undefined width yields no squeeze.

const ROLLING_MIN_SLACK: f64 = 1.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqueezeRule {
    Percentile,
    RollingMin,
}

pub fn detect_squeeze(
    band_width: &[Option<f64>],
    lookback: usize,
    threshold: f64,
    rule: SqueezeRule,
) -> Vec<bool> {
    let n = band_width.len();
    let mut out = vec![false; n];
    if lookback == 0 || n < lookback {
        return out;
    }

    for i in (lookback - 1)..n {
        let Some(width) = band_width[i] else {
            continue;
        };
        let window: Vec<f64> = match band_width[i + 1 - lookback..=i]
            .iter()
            .copied()
            .collect::<Option<Vec<f64>>>()
        {
            Some(w) => w,
            None => continue,
        };

        out[i] = match rule {
            SqueezeRule::Percentile => {
                let mut sorted = window;
                sorted.sort_by(|a, b| a.total_cmp(b));
                width < quantile(&sorted, threshold)
            }
            SqueezeRule::RollingMin => {
                let min = window.iter().copied().fold(f64::INFINITY, f64::min);
                width < ROLLING_MIN_SLACK * min
            }
        };
    }

    out
}

/// Linear-interpolation quantile of a sorted, non-empty slice.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let h = (sorted.len() - 1) as f64 * q;
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn widths(values: &[f64]) -> Vec<Option<f64>> {
        values.iter().map(|&v| Some(v)).collect()
    }

    #[test]
    fn quantile_interpolates() {
        let sorted = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_relative_eq!(quantile(&sorted, 0.0), 1.0);
        assert_relative_eq!(quantile(&sorted, 0.5), 3.0);
        assert_relative_eq!(quantile(&sorted, 1.0), 5.0);
        // h = 4 * 0.2 = 0.8 → 1.0 + 0.8 * (2.0 - 1.0)
        assert_relative_eq!(quantile(&sorted, 0.2), 1.8);
    }

    #[test]
    fn percentile_flags_compressed_width() {
        // last width 0.5 sits far below the 20th percentile of its window
        let series = widths(&[5.0, 6.0, 5.5, 6.5, 0.5]);
        let out = detect_squeeze(&series, 5, 0.2, SqueezeRule::Percentile);
        assert!(out[4]);
    }

    #[test]
    fn percentile_does_not_flag_wide_band() {
        let series = widths(&[5.0, 6.0, 5.5, 6.5, 7.0]);
        let out = detect_squeeze(&series, 5, 0.2, SqueezeRule::Percentile);
        assert!(!out[4]);
    }

    #[test]
    fn window_with_undefined_width_never_flags() {
        let mut series = widths(&[5.0, 6.0, 5.5, 6.5, 0.5]);
        series[1] = None;
        let out = detect_squeeze(&series, 5, 0.2, SqueezeRule::Percentile);
        assert!(out.iter().all(|&s| !s));
    }

    #[test]
    fn rolling_min_flags_near_minimum() {
        // min of window is 1.0; 1.05 < 1.1 × 1.0
        let series = widths(&[1.0, 2.0, 3.0, 2.5, 1.05]);
        let out = detect_squeeze(&series, 5, 0.2, SqueezeRule::RollingMin);
        assert!(out[4]);
    }

    #[test]
    fn rolling_min_does_not_flag_above_slack() {
        let series = widths(&[1.0, 2.0, 3.0, 2.5, 1.2]);
        let out = detect_squeeze(&series, 5, 0.2, SqueezeRule::RollingMin);
        assert!(!out[4]);
    }

    #[test]
    fn short_series_never_flags() {
        let series = widths(&[1.0, 2.0]);
        let out = detect_squeeze(&series, 5, 0.2, SqueezeRule::Percentile);
        assert!(out.iter().all(|&s| !s));
    }
}
