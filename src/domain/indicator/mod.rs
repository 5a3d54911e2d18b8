//! Indicator engine: bar series → indicator rows.
//!
//! One [`IndicatorRow`] per input bar. Derived fields are `Option` so a
//! warm-up row can never trigger a signal; the boolean signal columns are
//! filled in afterwards by [`crate::domain::strategy::apply_signals`].

pub mod bollinger;
pub mod rsi;
pub mod squeeze;

use crate::domain::ohlcv::Bar;
use crate::domain::strategy::StrategyParams;
use bollinger::{rolling_mean, rolling_std};
use chrono::NaiveDate;
use rsi::rolling_rsi;
use squeeze::detect_squeeze;

/// Volume confirmation window (bars).
const VOLUME_MEAN_PERIOD: usize = 20;

/// Band width and BB position are undefined when their denominator is
/// this close to zero.
const DENOM_EPSILON: f64 = 1e-12;

#[derive(Debug, Clone)]
pub struct IndicatorRow {
    pub date: NaiveDate,
    pub close: f64,
    pub volume: Option<f64>,
    pub sma: Option<f64>,
    pub std_dev: Option<f64>,
    pub upper: Option<f64>,
    pub lower: Option<f64>,
    pub band_width: Option<f64>,
    pub squeeze: bool,
    /// (close - lower) / (upper - lower). Deliberately unclamped: values
    /// outside [0, 1] mark closes beyond the bands.
    pub bb_position: Option<f64>,
    pub rsi: Option<f64>,
    pub volume_ratio: Option<f64>,
    pub buy: bool,
    pub sell_half: bool,
    pub sell_all: bool,
}

impl IndicatorRow {
    fn raw(bar: &Bar) -> Self {
        IndicatorRow {
            date: bar.date,
            close: bar.close,
            volume: bar.volume,
            sma: None,
            std_dev: None,
            upper: None,
            lower: None,
            band_width: None,
            squeeze: false,
            bb_position: None,
            rsi: None,
            volume_ratio: None,
            buy: false,
            sell_half: false,
            sell_all: false,
        }
    }
}

/// Compute all derived series for a bar history.
///
/// Histories shorter than [`StrategyParams::min_bars`] come back as raw
/// rows with every derived field `None`; callers are expected to detect
/// and skip such assets rather than trade on them.
pub fn compute_indicators(bars: &[Bar], params: &StrategyParams) -> Vec<IndicatorRow> {
    let mut rows: Vec<IndicatorRow> = bars.iter().map(IndicatorRow::raw).collect();
    if bars.len() < params.min_bars() {
        return rows;
    }

    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();

    let sma = rolling_mean(&closes, params.bb_period);
    let std_dev = rolling_std(&closes, params.bb_period);
    let rsi = rolling_rsi(&closes, params.rsi_period);

    let mut band_width: Vec<Option<f64>> = vec![None; rows.len()];
    for i in 0..rows.len() {
        rows[i].sma = sma[i];
        rows[i].std_dev = std_dev[i];
        rows[i].rsi = rsi[i];

        if let (Some(m), Some(s)) = (sma[i], std_dev[i]) {
            let upper = m + params.bb_mult * s;
            let lower = m - params.bb_mult * s;
            rows[i].upper = Some(upper);
            rows[i].lower = Some(lower);

            if m.abs() > DENOM_EPSILON {
                band_width[i] = Some((upper - lower) / m);
            }
            if (upper - lower).abs() > DENOM_EPSILON {
                rows[i].bb_position = Some((rows[i].close - lower) / (upper - lower));
            }
        }
        rows[i].band_width = band_width[i];
    }

    let squeeze = detect_squeeze(
        &band_width,
        params.volatility_lookback,
        params.volatility_threshold,
        params.squeeze_rule,
    );
    for (row, flag) in rows.iter_mut().zip(squeeze) {
        row.squeeze = flag;
    }

    let volume_ratio = compute_volume_ratio(bars);
    for (row, ratio) in rows.iter_mut().zip(volume_ratio) {
        row.volume_ratio = ratio;
    }

    rows
}

/// Volume over its trailing 20-bar mean. `None` whenever any volume in
/// the window is missing or the mean is zero.
fn compute_volume_ratio(bars: &[Bar]) -> Vec<Option<f64>> {
    let n = bars.len();
    let mut out = vec![None; n];
    if n < VOLUME_MEAN_PERIOD {
        return out;
    }
    for i in (VOLUME_MEAN_PERIOD - 1)..n {
        let window: Option<Vec<f64>> = bars[i + 1 - VOLUME_MEAN_PERIOD..=i]
            .iter()
            .map(|b| b.volume)
            .collect();
        let (Some(window), Some(v)) = (window, bars[i].volume) else {
            continue;
        };
        let mean = window.iter().sum::<f64>() / VOLUME_MEAN_PERIOD as f64;
        if mean > DENOM_EPSILON {
            out[i] = Some(v / mean);
        }
    }
    out
}
