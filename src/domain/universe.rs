//! Universe parsing and per-asset data quality gates.
//!
//! Every asset must clear the gates before simulation: enough bars for
//! the longest indicator window, mostly-present closes, and an average
//! price inside a sane band. Failures skip the asset with a warning; an
//! empty survivor set aborts the run.

use crate::domain::error::VolsqueezeError;
use crate::domain::indicator::IndicatorRow;
use crate::domain::ohlcv::Bar;
use crate::domain::strategy::StrategyParams;
use crate::ports::data_port::MarketDataPort;
use chrono::NaiveDate;
use std::collections::HashSet;

/// At most this share of closes may be missing or non-positive.
const MAX_MISSING_CLOSE_FRACTION: f64 = 0.10;

/// Average close must land inside this band.
const PRICE_BAND: (f64, f64) = (1.0, 10_000.0);

#[derive(Debug, Clone, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in symbol list")]
    EmptyToken,

    #[error("duplicate symbol: {0}")]
    DuplicateSymbol(String),
}

pub fn parse_symbols(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut symbols = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let symbol = trimmed.to_uppercase();
        if seen.contains(&symbol) {
            return Err(UniverseError::DuplicateSymbol(symbol));
        }
        seen.insert(symbol.clone());
        symbols.push(symbol);
    }

    Ok(symbols)
}

#[derive(Debug, Clone)]
pub struct SkippedAsset {
    pub symbol: String,
    pub reason: String,
}

#[derive(Debug)]
pub struct ValidatedUniverse {
    pub assets: Vec<(String, Vec<Bar>)>,
    pub skipped: Vec<SkippedAsset>,
}

/// Fetch and gate each symbol. Individual failures are isolated; only a
/// fully-failed universe is an error.
pub fn validate_universe(
    data_port: &dyn MarketDataPort,
    symbols: &[String],
    start_date: NaiveDate,
    end_date: NaiveDate,
    params: &StrategyParams,
) -> Result<ValidatedUniverse, VolsqueezeError> {
    let mut assets = Vec::new();
    let mut skipped = Vec::new();
    let attempted = symbols.len();

    for symbol in symbols {
        let bars = match data_port.fetch(symbol, start_date, end_date) {
            Ok(bars) => bars,
            Err(e) => {
                eprintln!("warning: skipping {} ({})", symbol, e);
                skipped.push(SkippedAsset {
                    symbol: symbol.clone(),
                    reason: e.to_string(),
                });
                continue;
            }
        };

        match check_bars(symbol, &bars, params) {
            Ok(()) => {
                eprintln!("  {}: {} bars [OK]", symbol, bars.len());
                assets.push((symbol.clone(), bars));
            }
            Err(e) => {
                eprintln!("warning: skipping {} ({})", symbol, e);
                skipped.push(SkippedAsset {
                    symbol: symbol.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    if assets.is_empty() {
        return Err(VolsqueezeError::AllAssetsFailed { attempted });
    }

    if !skipped.is_empty() {
        eprintln!("Proceeding with {} of {} symbols", assets.len(), attempted);
    }

    Ok(ValidatedUniverse { assets, skipped })
}

/// Raw-bar gates: history length, close coverage, price band.
pub fn check_bars(
    symbol: &str,
    bars: &[Bar],
    params: &StrategyParams,
) -> Result<(), VolsqueezeError> {
    if bars.is_empty() {
        return Err(VolsqueezeError::NoData {
            symbol: symbol.to_string(),
        });
    }

    let minimum = params.min_bars();
    if bars.len() < minimum {
        return Err(VolsqueezeError::InsufficientData {
            symbol: symbol.to_string(),
            bars: bars.len(),
            minimum,
        });
    }

    let missing = bars.iter().filter(|b| !b.has_valid_close()).count();
    let missing_fraction = missing as f64 / bars.len() as f64;
    if missing_fraction > MAX_MISSING_CLOSE_FRACTION {
        return Err(VolsqueezeError::DataQuality {
            symbol: symbol.to_string(),
            reason: format!(
                "{:.1}% of closes missing or invalid",
                missing_fraction * 100.0
            ),
        });
    }

    let valid_closes: Vec<f64> = bars
        .iter()
        .filter(|b| b.has_valid_close())
        .map(|b| b.close)
        .collect();
    let avg = valid_closes.iter().sum::<f64>() / valid_closes.len() as f64;
    if avg < PRICE_BAND.0 || avg > PRICE_BAND.1 {
        return Err(VolsqueezeError::DataQuality {
            symbol: symbol.to_string(),
            reason: format!("average close {:.4} outside [{}, {}]", avg, PRICE_BAND.0, PRICE_BAND.1),
        });
    }

    Ok(())
}

/// Post-indicator gate: an asset whose RSI or SMA never resolved cannot
/// be simulated.
pub fn check_indicators(symbol: &str, rows: &[IndicatorRow]) -> Result<(), VolsqueezeError> {
    if rows.iter().all(|r| r.rsi.is_none()) {
        return Err(VolsqueezeError::IndicatorDegenerate {
            symbol: symbol.to_string(),
            reason: "RSI never defined".into(),
        });
    }
    if rows.iter().all(|r| r.sma.is_none()) {
        return Err(VolsqueezeError::IndicatorDegenerate {
            symbol: symbol.to_string(),
            reason: "SMA never defined".into(),
        });
    }
    Ok(())
}
