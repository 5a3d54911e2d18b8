//! Shared-cash portfolio allocator.
//!
//! One cash pool across the whole universe, restricted to the dates every
//! asset can price. Each day runs a sell pass before the buy pass so that
//! freed slots and cash are available the same day. Buy candidates are
//! admitted in descending RSI order into the remaining capacity.

use crate::domain::asset::{build_common_timeline, AssetSeries};
use crate::domain::analyzer::{max_drawdown_pct, volatility_and_sharpe};
use crate::domain::error::VolsqueezeError;
use crate::domain::simulator::{Trade, TradeAction};
use chrono::NaiveDate;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct AllocatorOptions {
    pub initial_capital: f64,
    /// Capacity K: most positions held at once.
    pub max_positions: usize,
    /// Fraction of current cash per new position, capped at 1/K.
    pub position_sizing: f64,
    /// Orders below this notional are not placed.
    pub min_trade_amount: f64,
}

impl Default for AllocatorOptions {
    fn default() -> Self {
        AllocatorOptions {
            initial_capital: 100_000.0,
            max_positions: 10,
            position_sizing: 0.2,
            min_trade_amount: 1_000.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PortfolioEquityPoint {
    pub date: NaiveDate,
    pub cash: f64,
    pub holdings_value: f64,
    pub total: f64,
    pub positions_held: usize,
}

#[derive(Debug, Clone)]
pub struct PortfolioStats {
    pub buy_trades: usize,
    pub sell_trades: usize,
    pub avg_positions: f64,
    pub max_positions_held: usize,
    pub avg_daily_return_pct: f64,
    pub max_drawdown_pct: f64,
    pub volatility_pct: f64,
    pub sharpe_ratio: f64,
}

#[derive(Debug, Clone)]
pub struct PortfolioResult {
    pub initial_capital: f64,
    pub final_value: f64,
    pub total_return_pct: f64,
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<PortfolioEquityPoint>,
    pub stats: PortfolioStats,
}

/// Run the allocator over a validated universe.
pub fn run_portfolio(
    assets: &[AssetSeries],
    options: &AllocatorOptions,
) -> Result<PortfolioResult, VolsqueezeError> {
    if assets.is_empty() {
        return Err(VolsqueezeError::AllAssetsFailed { attempted: 0 });
    }
    let timeline = build_common_timeline(assets);
    if timeline.is_empty() {
        return Err(VolsqueezeError::DataQuality {
            symbol: "portfolio".into(),
            reason: "no common trading dates across the universe".into(),
        });
    }

    let mut cash = options.initial_capital;
    let mut holdings: HashMap<String, f64> = HashMap::new();
    let mut trades: Vec<Trade> = Vec::new();
    let mut equity_curve: Vec<PortfolioEquityPoint> = Vec::with_capacity(timeline.len());

    let sizing_fraction = options
        .position_sizing
        .min(1.0 / options.max_positions as f64);

    for &date in &timeline {
        // sell pass first so freed capacity is usable today
        for asset in assets {
            let Some(shares) = holdings.get(&asset.symbol).copied() else {
                continue;
            };
            let Some(row) = asset.row_on(date) else {
                continue;
            };
            // half-exit outranks the full exit, as in the single-asset machine
            if row.sell_half {
                let sold = shares / 2.0;
                let proceeds = sold * row.close;
                cash += proceeds;
                holdings.insert(asset.symbol.clone(), shares - sold);
                trades.push(Trade {
                    date,
                    symbol: asset.symbol.clone(),
                    action: TradeAction::SellHalf,
                    price: row.close,
                    shares: sold,
                    notional: proceeds,
                });
            } else if row.sell_all {
                let proceeds = shares * row.close;
                cash += proceeds;
                holdings.remove(&asset.symbol);
                trades.push(Trade {
                    date,
                    symbol: asset.symbol.clone(),
                    action: TradeAction::SellAll,
                    price: row.close,
                    shares,
                    notional: proceeds,
                });
            }
        }

        // buy pass: unheld buy signals ranked by RSI, strongest first;
        // sort_by on the index keeps ties in input order
        let mut candidates: Vec<(usize, f64)> = assets
            .iter()
            .enumerate()
            .filter(|(_, a)| !holdings.contains_key(&a.symbol))
            .filter_map(|(i, a)| {
                let row = a.row_on(date)?;
                if row.buy { row.rsi.map(|rsi| (i, rsi)) } else { None }
            })
            .collect();
        candidates.sort_by(|a, b| b.1.total_cmp(&a.1));

        let mut slots = options.max_positions.saturating_sub(holdings.len());
        for (idx, _) in candidates {
            if slots == 0 || cash < options.min_trade_amount {
                break;
            }
            let amount = sizing_fraction * cash;
            if amount < options.min_trade_amount {
                break;
            }
            let asset = &assets[idx];
            let Some(row) = asset.row_on(date) else {
                continue;
            };
            if row.close <= 0.0 {
                continue;
            }
            let shares = amount / row.close;
            cash -= amount;
            holdings.insert(asset.symbol.clone(), shares);
            trades.push(Trade {
                date,
                symbol: asset.symbol.clone(),
                action: TradeAction::Buy,
                price: row.close,
                shares,
                notional: amount,
            });
            slots -= 1;
        }

        // valuation at today's closes
        let holdings_value: f64 = assets
            .iter()
            .filter_map(|a| {
                let shares = holdings.get(&a.symbol)?;
                let row = a.row_on(date)?;
                Some(shares * row.close)
            })
            .sum();
        equity_curve.push(PortfolioEquityPoint {
            date,
            cash,
            holdings_value,
            total: cash + holdings_value,
            positions_held: holdings.len(),
        });
    }

    // end-of-period liquidation at the last common date, not logged
    let last_date = timeline[timeline.len() - 1];
    for asset in assets {
        if let (Some(shares), Some(row)) = (holdings.remove(&asset.symbol), asset.row_on(last_date))
        {
            cash += shares * row.close;
        }
    }

    let final_value = cash;
    let total_return_pct = if options.initial_capital > 0.0 {
        (final_value - options.initial_capital) / options.initial_capital * 100.0
    } else {
        0.0
    };

    let stats = compute_stats(&trades, &equity_curve);

    Ok(PortfolioResult {
        initial_capital: options.initial_capital,
        final_value,
        total_return_pct,
        trades,
        equity_curve,
        stats,
    })
}

fn compute_stats(trades: &[Trade], equity_curve: &[PortfolioEquityPoint]) -> PortfolioStats {
    let buy_trades = trades
        .iter()
        .filter(|t| t.action == TradeAction::Buy)
        .count();
    let sell_trades = trades.len() - buy_trades;

    let avg_positions = if equity_curve.is_empty() {
        0.0
    } else {
        equity_curve.iter().map(|p| p.positions_held as f64).sum::<f64>()
            / equity_curve.len() as f64
    };
    let max_positions_held = equity_curve
        .iter()
        .map(|p| p.positions_held)
        .max()
        .unwrap_or(0);

    let totals: Vec<f64> = equity_curve.iter().map(|p| p.total).collect();
    let daily_returns: Vec<f64> = totals
        .windows(2)
        .filter(|w| w[0] > 0.0)
        .map(|w| (w[1] - w[0]) / w[0] * 100.0)
        .collect();
    let avg_daily_return_pct = if daily_returns.is_empty() {
        0.0
    } else {
        daily_returns.iter().sum::<f64>() / daily_returns.len() as f64
    };

    let (volatility_pct, sharpe_ratio) = volatility_and_sharpe(&totals);

    PortfolioStats {
        buy_trades,
        sell_trades,
        avg_positions,
        max_positions_held,
        avg_daily_return_pct,
        max_drawdown_pct: max_drawdown_pct(&totals),
        volatility_pct,
        sharpe_ratio,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::IndicatorRow;
    use approx::assert_relative_eq;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn make_row(day: u32, close: f64, rsi: f64) -> IndicatorRow {
        IndicatorRow {
            date: date(day),
            close,
            volume: Some(1000.0),
            sma: Some(close),
            std_dev: Some(1.0),
            upper: Some(close + 2.0),
            lower: Some(close - 2.0),
            band_width: Some(0.04),
            squeeze: false,
            bb_position: Some(0.5),
            rsi: Some(rsi),
            volume_ratio: Some(1.0),
            buy: false,
            sell_half: false,
            sell_all: false,
        }
    }

    fn asset(symbol: &str, rows: Vec<IndicatorRow>) -> AssetSeries {
        AssetSeries::new(symbol.into(), rows)
    }

    fn options(max_positions: usize) -> AllocatorOptions {
        AllocatorOptions {
            initial_capital: 100_000.0,
            max_positions,
            position_sizing: 0.2,
            min_trade_amount: 1_000.0,
        }
    }

    #[test]
    fn empty_universe_fails() {
        let err = run_portfolio(&[], &options(10)).unwrap_err();
        assert!(matches!(err, VolsqueezeError::AllAssetsFailed { .. }));
    }

    #[test]
    fn disjoint_dates_fail() {
        let a = asset("A", vec![make_row(1, 100.0, 50.0)]);
        let b = asset("B", vec![make_row(2, 100.0, 50.0)]);
        let err = run_portfolio(&[a, b], &options(10)).unwrap_err();
        assert!(matches!(err, VolsqueezeError::DataQuality { .. }));
    }

    #[test]
    fn single_slot_goes_to_highest_rsi() {
        let mut a_rows = vec![make_row(1, 100.0, 60.0), make_row(2, 100.0, 60.0)];
        let mut b_rows = vec![make_row(1, 50.0, 75.0), make_row(2, 50.0, 75.0)];
        a_rows[0].buy = true;
        b_rows[0].buy = true;
        let assets = vec![asset("A", a_rows), asset("B", b_rows)];

        let result = run_portfolio(&assets, &options(1)).unwrap();
        let buys: Vec<&Trade> = result
            .trades
            .iter()
            .filter(|t| t.action == TradeAction::Buy)
            .collect();
        assert_eq!(buys.len(), 1);
        assert_eq!(buys[0].symbol, "B");
    }

    #[test]
    fn capacity_is_never_exceeded() {
        let symbols = ["A", "B", "C", "D"];
        let assets: Vec<AssetSeries> = symbols
            .iter()
            .map(|s| {
                let mut rows = vec![make_row(1, 100.0, 70.0), make_row(2, 100.0, 70.0)];
                rows[0].buy = true;
                rows[1].buy = true;
                asset(s, rows)
            })
            .collect();

        let result = run_portfolio(&assets, &options(2)).unwrap();
        assert!(result.equity_curve.iter().all(|p| p.positions_held <= 2));
        let buys = result
            .trades
            .iter()
            .filter(|t| t.action == TradeAction::Buy)
            .count();
        assert_eq!(buys, 2);
    }

    #[test]
    fn sizing_is_capped_by_capacity_fraction() {
        // position_sizing 0.5 but K=10 → 1/10 of cash per entry
        let mut rows = vec![make_row(1, 100.0, 70.0), make_row(2, 100.0, 70.0)];
        rows[0].buy = true;
        let assets = vec![asset("A", rows)];
        let opts = AllocatorOptions {
            position_sizing: 0.5,
            ..options(10)
        };

        let result = run_portfolio(&assets, &opts).unwrap();
        let buy = &result.trades[0];
        assert_relative_eq!(buy.notional, 10_000.0);
    }

    #[test]
    fn small_cash_blocks_entries() {
        let mut rows = vec![make_row(1, 100.0, 70.0), make_row(2, 100.0, 70.0)];
        rows[0].buy = true;
        let assets = vec![asset("A", rows)];
        let opts = AllocatorOptions {
            initial_capital: 4_000.0, // 20% of it is below the minimum order
            ..options(10)
        };

        let result = run_portfolio(&assets, &opts).unwrap();
        assert!(result.trades.is_empty());
        assert_relative_eq!(result.final_value, 4_000.0);
    }

    #[test]
    fn sell_frees_a_slot_for_the_same_day() {
        // A held, signals full exit on day 2; B signals buy on day 2
        let mut a_rows = vec![make_row(1, 100.0, 70.0), make_row(2, 100.0, 70.0)];
        a_rows[0].buy = true;
        a_rows[1].sell_all = true;
        let mut b_rows = vec![make_row(1, 50.0, 40.0), make_row(2, 50.0, 75.0)];
        b_rows[1].buy = true;
        let assets = vec![asset("A", a_rows), asset("B", b_rows)];

        let result = run_portfolio(&assets, &options(1)).unwrap();
        let day2: Vec<&Trade> = result.trades.iter().filter(|t| t.date == date(2)).collect();
        assert_eq!(day2.len(), 2);
        assert_eq!(day2[0].action, TradeAction::SellAll);
        assert_eq!(day2[0].symbol, "A");
        assert_eq!(day2[1].action, TradeAction::Buy);
        assert_eq!(day2[1].symbol, "B");
    }

    #[test]
    fn sell_half_keeps_the_slot() {
        let mut rows = vec![
            make_row(1, 100.0, 70.0),
            make_row(2, 100.0, 70.0),
            make_row(3, 100.0, 70.0),
        ];
        rows[0].buy = true;
        rows[1].sell_half = true;
        let assets = vec![asset("A", rows)];

        let result = run_portfolio(&assets, &options(10)).unwrap();
        assert_eq!(result.equity_curve[1].positions_held, 1);
        let halves = result
            .trades
            .iter()
            .filter(|t| t.action == TradeAction::SellHalf)
            .count();
        assert_eq!(halves, 1);
    }

    #[test]
    fn simultaneous_sell_signals_take_the_half_exit() {
        // both exits flagged on day 2; the half-exit wins and the slot stays taken
        let mut rows = vec![
            make_row(1, 100.0, 70.0),
            make_row(2, 100.0, 70.0),
            make_row(3, 100.0, 70.0),
        ];
        rows[0].buy = true;
        rows[1].sell_half = true;
        rows[1].sell_all = true;
        let assets = vec![asset("A", rows)];

        let result = run_portfolio(&assets, &options(10)).unwrap();
        let day2: Vec<&Trade> = result.trades.iter().filter(|t| t.date == date(2)).collect();
        assert_eq!(day2.len(), 1);
        assert_eq!(day2[0].action, TradeAction::SellHalf);
        assert_eq!(result.equity_curve[1].positions_held, 1);
    }

    #[test]
    fn final_liquidation_realizes_holdings() {
        let mut rows = vec![make_row(1, 100.0, 70.0), make_row(2, 110.0, 70.0)];
        rows[0].buy = true;
        let assets = vec![asset("A", rows)];

        let result = run_portfolio(&assets, &options(10)).unwrap();
        // bought 10k at 100 → 100 shares, worth 11k at the close of day 2
        assert_relative_eq!(result.final_value, 101_000.0);
        assert_relative_eq!(result.total_return_pct, 1.0);
        // liquidation is not a logged trade
        assert_eq!(result.trades.len(), 1);
    }

    #[test]
    fn stats_count_trades_and_positions() {
        let mut a_rows = vec![
            make_row(1, 100.0, 70.0),
            make_row(2, 100.0, 70.0),
            make_row(3, 100.0, 70.0),
        ];
        a_rows[0].buy = true;
        a_rows[2].sell_all = true;
        let assets = vec![asset("A", a_rows)];

        let result = run_portfolio(&assets, &options(10)).unwrap();
        assert_eq!(result.stats.buy_trades, 1);
        assert_eq!(result.stats.sell_trades, 1);
        assert_eq!(result.stats.max_positions_held, 1);
        assert_relative_eq!(result.stats.avg_positions, 2.0 / 3.0);
    }
}
