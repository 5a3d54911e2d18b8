//! Performance analysis: trade pairing, equity-curve metrics and the
//! cross-asset risk summary.

use crate::domain::simulator::{EquityPoint, Trade, TradeAction};
use chrono::{Datelike, NaiveDate};

const TRADING_DAYS_PER_YEAR: f64 = 252.0;
const DAYS_PER_YEAR: f64 = 365.25;

/// One scored exit leg. A BUY opens an entry; every subsequent sell leg
/// (half or full) scores against that entry price. Only SELL_ALL clears
/// the entry, so a half exit and the later full exit both produce a
/// completed trade against the same BUY.
#[derive(Debug, Clone)]
pub struct CompletedTrade {
    pub symbol: String,
    pub entry_date: NaiveDate,
    pub exit_date: NaiveDate,
    pub entry_price: f64,
    pub exit_price: f64,
    pub profit_pct: f64,
}

impl CompletedTrade {
    pub fn winning(&self) -> bool {
        self.profit_pct > 0.0
    }
}

/// Pair sell legs with their opening BUY.
pub fn pair_trades(trades: &[Trade]) -> Vec<CompletedTrade> {
    let mut completed = Vec::new();
    let mut open: Option<&Trade> = None;

    for trade in trades {
        match trade.action {
            TradeAction::Buy => {
                open = Some(trade);
            }
            TradeAction::SellHalf | TradeAction::SellAll => {
                if let Some(entry) = open {
                    let profit_pct = if entry.price > 0.0 {
                        (trade.price - entry.price) / entry.price * 100.0
                    } else {
                        0.0
                    };
                    completed.push(CompletedTrade {
                        symbol: trade.symbol.clone(),
                        entry_date: entry.date,
                        exit_date: trade.date,
                        entry_price: entry.price,
                        exit_price: trade.price,
                        profit_pct,
                    });
                    if trade.action == TradeAction::SellAll {
                        open = None;
                    }
                }
            }
        }
    }

    completed
}

#[derive(Debug, Clone)]
pub struct Metrics {
    pub total_trades: usize,
    pub winning_trades: usize,
    /// Percent of scored trades with positive profit.
    pub win_rate: f64,
    /// |avg winning % / avg losing %|; infinite when nothing lost.
    pub profit_factor: f64,
    pub avg_win_pct: f64,
    pub avg_loss_pct: f64,
    pub total_return_pct: f64,
    pub annualized_return_pct: f64,
    pub max_drawdown_pct: f64,
    pub volatility_pct: f64,
    pub sharpe_ratio: f64,
}

impl Metrics {
    pub fn compute(
        completed: &[CompletedTrade],
        equity_curve: &[EquityPoint],
        initial_capital: f64,
        final_value: f64,
    ) -> Metrics {
        let wins: Vec<f64> = completed
            .iter()
            .filter(|t| t.winning())
            .map(|t| t.profit_pct)
            .collect();
        let losses: Vec<f64> = completed
            .iter()
            .filter(|t| !t.winning())
            .map(|t| t.profit_pct)
            .collect();

        let total_trades = completed.len();
        let win_rate = if total_trades > 0 {
            wins.len() as f64 / total_trades as f64 * 100.0
        } else {
            0.0
        };

        let avg_win_pct = mean(&wins).unwrap_or(0.0);
        let avg_loss_pct = mean(&losses).unwrap_or(0.0);
        // zero average loss (no losing trades, or none at all) reads as infinite
        let profit_factor = if avg_loss_pct == 0.0 {
            f64::INFINITY
        } else {
            (avg_win_pct / avg_loss_pct).abs()
        };

        let total_return_pct = if initial_capital > 0.0 {
            (final_value - initial_capital) / initial_capital * 100.0
        } else {
            0.0
        };

        let totals: Vec<f64> = equity_curve.iter().map(|p| p.total).collect();
        let (volatility_pct, sharpe_ratio) = volatility_and_sharpe(&totals);

        Metrics {
            total_trades,
            winning_trades: wins.len(),
            win_rate,
            profit_factor,
            avg_win_pct,
            avg_loss_pct,
            total_return_pct,
            annualized_return_pct: annualized_return_pct(
                equity_curve,
                initial_capital,
                final_value,
            ),
            max_drawdown_pct: max_drawdown_pct(&totals),
            volatility_pct,
            sharpe_ratio,
        }
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Largest peak-to-trough decline, in percent of the running peak.
pub fn max_drawdown_pct(totals: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut max_dd = 0.0_f64;
    for &v in totals {
        if v > peak {
            peak = v;
        } else if peak > 0.0 {
            let dd = (peak - v) / peak * 100.0;
            if dd > max_dd {
                max_dd = dd;
            }
        }
    }
    max_dd
}

/// Calendar-day compounding: (final/initial)^(365.25/days) - 1, percent.
/// Zero when the span is empty or either side is non-positive.
pub fn annualized_return_pct(
    equity_curve: &[EquityPoint],
    initial_capital: f64,
    final_value: f64,
) -> f64 {
    let (Some(first), Some(last)) = (equity_curve.first(), equity_curve.last()) else {
        return 0.0;
    };
    let days = (last.date - first.date).num_days();
    if days <= 0 || initial_capital <= 0.0 || final_value <= 0.0 {
        return 0.0;
    }
    let ratio = final_value / initial_capital;
    (ratio.powf(DAYS_PER_YEAR / days as f64) - 1.0) * 100.0
}

/// Population std of day-over-day percent returns, and the annualized
/// Sharpe ratio mean×252 / (std×√252). Both zero on flat or short curves.
pub fn volatility_and_sharpe(totals: &[f64]) -> (f64, f64) {
    let returns: Vec<f64> = totals
        .windows(2)
        .filter(|w| w[0] > 0.0)
        .map(|w| (w[1] - w[0]) / w[0] * 100.0)
        .collect();
    if returns.is_empty() {
        return (0.0, 0.0);
    }

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let volatility = variance.sqrt();

    let sharpe = if volatility > 0.0 {
        mean * TRADING_DAYS_PER_YEAR / (volatility * TRADING_DAYS_PER_YEAR.sqrt())
    } else {
        0.0
    };

    (volatility, sharpe)
}

#[derive(Debug, Clone, PartialEq)]
pub struct YearlyReturn {
    pub year: i32,
    pub return_pct: f64,
}

/// Per-calendar-year return from the first to the last equity point of
/// each year. Years with fewer than two points are skipped.
pub fn yearly_returns(equity_curve: &[EquityPoint]) -> Vec<YearlyReturn> {
    let mut out = Vec::new();
    let mut i = 0;
    while i < equity_curve.len() {
        let year = equity_curve[i].date.year();
        let mut j = i;
        while j + 1 < equity_curve.len() && equity_curve[j + 1].date.year() == year {
            j += 1;
        }
        if j > i && equity_curve[i].total > 0.0 {
            let first = equity_curve[i].total;
            let last = equity_curve[j].total;
            out.push(YearlyReturn {
                year,
                return_pct: (last - first) / first * 100.0,
            });
        }
        i = j + 1;
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskGrade {
    Low,
    Moderate,
    High,
}

impl std::fmt::Display for RiskGrade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskGrade::Low => write!(f, "low"),
            RiskGrade::Moderate => write!(f, "moderate"),
            RiskGrade::High => write!(f, "high"),
        }
    }
}

/// Dispersion of per-asset total returns across a universe run.
#[derive(Debug, Clone)]
pub struct RiskSummary {
    pub count: usize,
    pub mean_return_pct: f64,
    pub std_return_pct: f64,
    /// mean / std, 0 on zero dispersion.
    pub risk_adjusted: f64,
    /// 5th percentile of returns (95% VaR), linear interpolation.
    pub var_95_pct: f64,
    pub worst_return_pct: f64,
    /// Percent of assets with a positive return.
    pub success_rate_pct: f64,
}

impl RiskSummary {
    pub fn from_returns(returns: &[f64]) -> Option<RiskSummary> {
        if returns.is_empty() {
            return None;
        }
        let n = returns.len() as f64;
        let mean = returns.iter().sum::<f64>() / n;
        let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
        let std = variance.sqrt();

        let mut sorted = returns.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let h = (sorted.len() - 1) as f64 * 0.05;
        let lo = h.floor() as usize;
        let hi = h.ceil() as usize;
        let var_95 = if lo == hi {
            sorted[lo]
        } else {
            sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo])
        };

        let positive = returns.iter().filter(|&&r| r > 0.0).count();

        Some(RiskSummary {
            count: returns.len(),
            mean_return_pct: mean,
            std_return_pct: std,
            risk_adjusted: if std > 0.0 { mean / std } else { 0.0 },
            var_95_pct: var_95,
            worst_return_pct: sorted[0],
            success_rate_pct: positive as f64 / n * 100.0,
        })
    }

    pub fn grade(&self) -> RiskGrade {
        if self.std_return_pct <= 10.0 {
            RiskGrade::Low
        } else if self.std_return_pct <= 20.0 {
            RiskGrade::Moderate
        } else {
            RiskGrade::High
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn make_trade(day: u32, action: TradeAction, price: f64) -> Trade {
        Trade {
            date: date(2024, 1, day),
            symbol: "AAPL".into(),
            action,
            price,
            shares: 10.0,
            notional: price * 10.0,
        }
    }

    fn make_curve(totals: &[f64]) -> Vec<EquityPoint> {
        totals
            .iter()
            .enumerate()
            .map(|(i, &total)| EquityPoint {
                date: date(2024, 1, 1) + chrono::Duration::days(i as i64),
                cash: total,
                position_value: 0.0,
                total,
            })
            .collect()
    }

    #[test]
    fn pairing_scores_both_sell_legs() {
        let trades = vec![
            make_trade(1, TradeAction::Buy, 100.0),
            make_trade(5, TradeAction::SellHalf, 110.0),
            make_trade(9, TradeAction::SellAll, 90.0),
        ];
        let completed = pair_trades(&trades);

        assert_eq!(completed.len(), 2);
        assert_relative_eq!(completed[0].profit_pct, 10.0);
        assert!(completed[0].winning());
        assert_relative_eq!(completed[1].profit_pct, -10.0);
        assert_eq!(completed[1].entry_date, date(2024, 1, 1));
    }

    #[test]
    fn sell_all_clears_the_entry() {
        let trades = vec![
            make_trade(1, TradeAction::Buy, 100.0),
            make_trade(3, TradeAction::SellAll, 105.0),
            make_trade(5, TradeAction::SellAll, 90.0), // no open entry
        ];
        let completed = pair_trades(&trades);
        assert_eq!(completed.len(), 1);
    }

    #[test]
    fn reentry_scores_against_new_buy() {
        let trades = vec![
            make_trade(1, TradeAction::Buy, 100.0),
            make_trade(3, TradeAction::SellAll, 110.0),
            make_trade(5, TradeAction::Buy, 200.0),
            make_trade(7, TradeAction::SellAll, 220.0),
        ];
        let completed = pair_trades(&trades);
        assert_eq!(completed.len(), 2);
        assert_relative_eq!(completed[1].entry_price, 200.0);
        assert_relative_eq!(completed[1].profit_pct, 10.0);
    }

    #[test]
    fn sell_without_entry_is_dropped() {
        let trades = vec![make_trade(1, TradeAction::SellHalf, 100.0)];
        assert!(pair_trades(&trades).is_empty());
    }

    #[test]
    fn win_rate_is_percent() {
        let trades = vec![
            make_trade(1, TradeAction::Buy, 100.0),
            make_trade(2, TradeAction::SellHalf, 110.0),
            make_trade(3, TradeAction::SellAll, 95.0),
        ];
        let completed = pair_trades(&trades);
        let metrics = Metrics::compute(&completed, &make_curve(&[100.0, 101.0]), 100.0, 101.0);
        assert_relative_eq!(metrics.win_rate, 50.0);
        assert_eq!(metrics.total_trades, 2);
        assert_eq!(metrics.winning_trades, 1);
    }

    #[test]
    fn profit_factor_infinite_without_losses() {
        let trades = vec![
            make_trade(1, TradeAction::Buy, 100.0),
            make_trade(2, TradeAction::SellAll, 110.0),
        ];
        let completed = pair_trades(&trades);
        let metrics = Metrics::compute(&completed, &make_curve(&[100.0, 110.0]), 100.0, 110.0);
        assert!(metrics.profit_factor.is_infinite());
    }

    #[test]
    fn profit_factor_ratio_of_averages() {
        let trades = vec![
            make_trade(1, TradeAction::Buy, 100.0),
            make_trade(2, TradeAction::SellHalf, 120.0), // +20%
            make_trade(3, TradeAction::SellAll, 90.0),   // -10%
        ];
        let completed = pair_trades(&trades);
        let metrics = Metrics::compute(&completed, &make_curve(&[100.0, 101.0]), 100.0, 101.0);
        assert_relative_eq!(metrics.profit_factor, 2.0);
    }

    #[test]
    fn no_trades_zeroes_counts_but_profit_factor_is_infinite() {
        let metrics = Metrics::compute(&[], &make_curve(&[100.0, 110.0]), 100.0, 110.0);
        assert_eq!(metrics.total_trades, 0);
        assert_relative_eq!(metrics.win_rate, 0.0);
        // no losses at all, so the ratio degenerates upward
        assert!(metrics.profit_factor.is_infinite());
        assert_relative_eq!(metrics.total_return_pct, 10.0);
    }

    #[test]
    fn drawdown_from_running_peak() {
        // peak 110, trough 80
        let dd = max_drawdown_pct(&[100.0, 110.0, 90.0, 95.0, 80.0, 100.0]);
        assert_relative_eq!(dd, (110.0 - 80.0) / 110.0 * 100.0);
    }

    #[test]
    fn monotone_curve_has_zero_drawdown() {
        assert_relative_eq!(max_drawdown_pct(&[1.0, 2.0, 3.0]), 0.0);
        assert_relative_eq!(max_drawdown_pct(&[]), 0.0);
    }

    #[test]
    fn annualized_uses_calendar_days() {
        let curve = vec![
            EquityPoint { date: date(2023, 1, 1), cash: 100.0, position_value: 0.0, total: 100.0 },
            EquityPoint { date: date(2024, 1, 1), cash: 121.0, position_value: 0.0, total: 121.0 },
        ];
        let ann = annualized_return_pct(&curve, 100.0, 121.0);
        // 365 days: (1.21)^(365.25/365) - 1, a touch above 21%
        let expected = (1.21_f64.powf(365.25 / 365.0) - 1.0) * 100.0;
        assert_relative_eq!(ann, expected, max_relative = 1e-12);
    }

    #[test]
    fn annualized_zero_on_degenerate_input() {
        assert_relative_eq!(annualized_return_pct(&[], 100.0, 110.0), 0.0);
        let curve = make_curve(&[100.0]);
        assert_relative_eq!(annualized_return_pct(&curve, 100.0, 110.0), 0.0);
        let curve = make_curve(&[100.0, 0.0]);
        assert_relative_eq!(annualized_return_pct(&curve, 100.0, 0.0), 0.0);
    }

    #[test]
    fn volatility_is_population_std() {
        // 100→110 is +10%, 110→99 is -10%
        let (vol, _) = volatility_and_sharpe(&[100.0, 110.0, 99.0]);
        let mean = 0.0;
        let expected = ((10.0_f64 - mean).powi(2) + (-10.0_f64 - mean).powi(2)) / 2.0;
        assert_relative_eq!(vol, expected.sqrt());
    }

    #[test]
    fn flat_curve_has_zero_sharpe() {
        let (vol, sharpe) = volatility_and_sharpe(&[100.0, 100.0, 100.0]);
        assert_relative_eq!(vol, 0.0);
        assert_relative_eq!(sharpe, 0.0);
    }

    #[test]
    fn yearly_returns_split_on_calendar_years() {
        let curve = vec![
            EquityPoint { date: date(2023, 1, 2), cash: 0.0, position_value: 0.0, total: 100.0 },
            EquityPoint { date: date(2023, 6, 1), cash: 0.0, position_value: 0.0, total: 105.0 },
            EquityPoint { date: date(2023, 12, 29), cash: 0.0, position_value: 0.0, total: 110.0 },
            EquityPoint { date: date(2024, 1, 2), cash: 0.0, position_value: 0.0, total: 110.0 },
            EquityPoint { date: date(2024, 12, 30), cash: 0.0, position_value: 0.0, total: 99.0 },
        ];
        let yearly = yearly_returns(&curve);
        assert_eq!(yearly.len(), 2);
        assert_eq!(yearly[0].year, 2023);
        assert_relative_eq!(yearly[0].return_pct, 10.0);
        assert_eq!(yearly[1].year, 2024);
        assert_relative_eq!(yearly[1].return_pct, -10.0);
    }

    #[test]
    fn yearly_returns_skip_single_point_years() {
        let curve = vec![
            EquityPoint { date: date(2023, 12, 29), cash: 0.0, position_value: 0.0, total: 100.0 },
            EquityPoint { date: date(2024, 1, 2), cash: 0.0, position_value: 0.0, total: 101.0 },
            EquityPoint { date: date(2024, 1, 3), cash: 0.0, position_value: 0.0, total: 102.0 },
        ];
        let yearly = yearly_returns(&curve);
        assert_eq!(yearly.len(), 1);
        assert_eq!(yearly[0].year, 2024);
    }

    #[test]
    fn risk_summary_statistics() {
        let returns = vec![10.0, -5.0, 20.0, 0.0, 15.0];
        let summary = RiskSummary::from_returns(&returns).unwrap();
        assert_eq!(summary.count, 5);
        assert_relative_eq!(summary.mean_return_pct, 8.0);
        assert_relative_eq!(summary.worst_return_pct, -5.0);
        // 3 of 5 strictly positive
        assert_relative_eq!(summary.success_rate_pct, 60.0);
        // h = 4 * 0.05 = 0.2 → -5 + 0.2 * (0 - (-5)) = -4
        assert_relative_eq!(summary.var_95_pct, -4.0);
    }

    #[test]
    fn risk_summary_empty_is_none() {
        assert!(RiskSummary::from_returns(&[]).is_none());
    }

    #[test]
    fn risk_grades_band_on_dispersion() {
        let tight = RiskSummary::from_returns(&[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(tight.grade(), RiskGrade::Low);
        let medium = RiskSummary::from_returns(&[-15.0, 0.0, 15.0]).unwrap();
        assert_eq!(medium.grade(), RiskGrade::Moderate);
        let wide = RiskSummary::from_returns(&[-40.0, 0.0, 40.0]).unwrap();
        assert_eq!(wide.grade(), RiskGrade::High);
    }
}
