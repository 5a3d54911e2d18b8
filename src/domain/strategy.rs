//! Strategy parameters and signal evaluation.
//!
//! A trading mode only moves thresholds; the signal shape never changes.
//! The squeeze profile is the base rule set, the breakout profile layers
//! band-break and volume confirmation on top of it.

use crate::domain::indicator::squeeze::SqueezeRule;
use crate::domain::indicator::IndicatorRow;

/// RSI floor below which the breakout profile force-exits.
const BREAKOUT_RSI_EXIT: f64 = 30.0;

/// Half-exit also fires when BB position is within this distance of the
/// band midpoint.
const MIDBAND_TOLERANCE: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradingMode {
    Conservative,
    Balanced,
    Aggressive,
}

impl TradingMode {
    pub fn parse(s: &str) -> Option<TradingMode> {
        match s.to_lowercase().as_str() {
            "conservative" => Some(TradingMode::Conservative),
            "balanced" => Some(TradingMode::Balanced),
            "aggressive" => Some(TradingMode::Aggressive),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalProfile {
    /// RSI strength inside a volatility squeeze.
    Squeeze,
    /// Squeeze plus band break, volume surge and an RSI ceiling.
    Breakout,
}

impl SignalProfile {
    pub fn parse(s: &str) -> Option<SignalProfile> {
        match s.to_lowercase().as_str() {
            "squeeze" => Some(SignalProfile::Squeeze),
            "breakout" => Some(SignalProfile::Breakout),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StrategyParams {
    pub bb_period: usize,
    pub bb_mult: f64,
    pub rsi_period: usize,
    pub volatility_lookback: usize,
    pub volatility_threshold: f64,
    pub squeeze_rule: SqueezeRule,
    pub profile: SignalProfile,
    pub rsi_high: f64,
    pub rsi_low: f64,
    pub sell_half_threshold: f64,
    pub sell_all_threshold: f64,
    pub volume_ratio_threshold: f64,
}

impl Default for StrategyParams {
    fn default() -> Self {
        StrategyParams::for_mode(TradingMode::Balanced)
    }
}

impl StrategyParams {
    pub fn for_mode(mode: TradingMode) -> Self {
        let (rsi_high, sell_half_threshold, sell_all_threshold) = match mode {
            TradingMode::Conservative => (70.0, 0.8, 0.1),
            TradingMode::Balanced => (65.0, 0.75, 0.15),
            TradingMode::Aggressive => (60.0, 0.7, 0.2),
        };
        StrategyParams {
            bb_period: 20,
            bb_mult: 2.0,
            rsi_period: 14,
            volatility_lookback: 50,
            volatility_threshold: 0.2,
            squeeze_rule: SqueezeRule::Percentile,
            profile: SignalProfile::Squeeze,
            rsi_high,
            rsi_low: 50.0,
            sell_half_threshold,
            sell_all_threshold,
            volume_ratio_threshold: 1.5,
        }
    }

    /// Bars required before any derived field is defined.
    pub fn min_bars(&self) -> usize {
        self.bb_period
            .max(self.rsi_period)
            .max(self.volatility_lookback)
    }
}

/// Fill the boolean signal columns in place. Rows with undefined RSI or
/// BB position never signal.
pub fn apply_signals(rows: &mut [IndicatorRow], params: &StrategyParams) {
    for row in rows.iter_mut() {
        let (Some(rsi), Some(bb_pos)) = (row.rsi, row.bb_position) else {
            row.buy = false;
            row.sell_half = false;
            row.sell_all = false;
            continue;
        };

        let rsi_strong = rsi > params.rsi_high;
        row.buy = match params.profile {
            SignalProfile::Squeeze => row.squeeze && rsi_strong,
            SignalProfile::Breakout => {
                let band_break = match row.upper {
                    Some(upper) => row.close > upper,
                    None => false,
                };
                // missing volume data passes confirmation
                let volume_ok = match row.volume_ratio {
                    Some(ratio) => ratio >= params.volume_ratio_threshold,
                    None => row.volume.is_none(),
                };
                row.squeeze
                    && band_break
                    && volume_ok
                    && rsi >= params.rsi_low
                    && rsi <= params.rsi_high
            }
        };

        row.sell_half = bb_pos >= params.sell_half_threshold
            || (bb_pos - 0.5).abs() <= MIDBAND_TOLERANCE;

        row.sell_all = match params.profile {
            SignalProfile::Squeeze => bb_pos <= params.sell_all_threshold,
            SignalProfile::Breakout => {
                bb_pos <= params.sell_all_threshold || rsi < BREAKOUT_RSI_EXIT
            }
        };
    }
}
