//! Single-asset position simulator.
//!
//! Three-state machine over signal rows. Exactly one transition may fire
//! per bar, checked in fixed priority order:
//!
//! 1. FLAT + buy       → FULL  (invest all cash at the close)
//! 2. FULL + sell_half → HALF  (sell exactly half the shares)
//! 3. held + sell_all  → FLAT  (sell everything)
//!
//! The final bar force-liquidates any open position into cash without
//! logging a trade, so the final value is always fully realized.

use crate::domain::error::VolsqueezeError;
use crate::domain::indicator::IndicatorRow;
use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Flat,
    Half,
    Full,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeAction {
    Buy,
    SellHalf,
    SellAll,
}

impl std::fmt::Display for TradeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradeAction::Buy => write!(f, "BUY"),
            TradeAction::SellHalf => write!(f, "SELL_HALF"),
            TradeAction::SellAll => write!(f, "SELL_ALL"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Trade {
    pub date: NaiveDate,
    pub symbol: String,
    pub action: TradeAction,
    pub price: f64,
    pub shares: f64,
    pub notional: f64,
}

#[derive(Debug, Clone)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub cash: f64,
    pub position_value: f64,
    pub total: f64,
}

#[derive(Debug, Clone)]
pub struct SimulationResult {
    pub symbol: String,
    pub initial_capital: f64,
    pub final_value: f64,
    pub total_return_pct: f64,
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<EquityPoint>,
}

/// Run the position machine over a signal series.
pub fn simulate(
    symbol: &str,
    rows: &[IndicatorRow],
    initial_capital: f64,
) -> Result<SimulationResult, VolsqueezeError> {
    if rows.is_empty() {
        return Err(VolsqueezeError::NoData {
            symbol: symbol.to_string(),
        });
    }

    let mut cash = initial_capital;
    let mut shares = 0.0_f64;
    let mut position = Position::Flat;
    let mut trades = Vec::new();
    let mut equity_curve = Vec::with_capacity(rows.len());

    for row in rows {
        let price = row.close;

        if position == Position::Flat && row.buy && cash > 0.0 && price > 0.0 {
            shares = cash / price;
            trades.push(Trade {
                date: row.date,
                symbol: symbol.to_string(),
                action: TradeAction::Buy,
                price,
                shares,
                notional: cash,
            });
            cash = 0.0;
            position = Position::Full;
        } else if position == Position::Full && row.sell_half {
            let sold = shares / 2.0;
            let proceeds = sold * price;
            shares -= sold;
            cash += proceeds;
            trades.push(Trade {
                date: row.date,
                symbol: symbol.to_string(),
                action: TradeAction::SellHalf,
                price,
                shares: sold,
                notional: proceeds,
            });
            position = Position::Half;
        } else if position != Position::Flat && row.sell_all {
            let proceeds = shares * price;
            trades.push(Trade {
                date: row.date,
                symbol: symbol.to_string(),
                action: TradeAction::SellAll,
                price,
                shares,
                notional: proceeds,
            });
            cash += proceeds;
            shares = 0.0;
            position = Position::Flat;
        }

        let position_value = shares * price;
        equity_curve.push(EquityPoint {
            date: row.date,
            cash,
            position_value,
            total: cash + position_value,
        });
    }

    // end-of-period liquidation, not a logged trade
    if shares > 0.0 {
        let last_price = rows[rows.len() - 1].close;
        cash += shares * last_price;
    }

    let final_value = cash;
    let total_return_pct = if initial_capital > 0.0 {
        (final_value - initial_capital) / initial_capital * 100.0
    } else {
        0.0
    };

    Ok(SimulationResult {
        symbol: symbol.to_string(),
        initial_capital,
        final_value,
        total_return_pct,
        trades,
        equity_curve,
    })
}
