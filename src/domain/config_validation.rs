//! Configuration validation.
//!
//! Validates all config fields before any simulation runs.

use crate::domain::error::VolsqueezeError;
use crate::domain::strategy::{SignalProfile, TradingMode};
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), VolsqueezeError> {
    validate_initial_capital(config)?;
    validate_dates(config)?;
    validate_symbols(config)?;
    validate_data_path(config)?;
    Ok(())
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), VolsqueezeError> {
    validate_mode(config)?;
    validate_profile(config)?;
    validate_windows(config)?;
    validate_thresholds(config)?;
    Ok(())
}

pub fn validate_portfolio_config(config: &dyn ConfigPort) -> Result<(), VolsqueezeError> {
    let max_positions = config.get_int("portfolio", "max_positions", 10);
    if max_positions < 1 {
        return Err(invalid("portfolio", "max_positions", "must be at least 1"));
    }
    let sizing = config.get_double("portfolio", "position_sizing", 0.2);
    if sizing <= 0.0 || sizing > 1.0 {
        return Err(invalid("portfolio", "position_sizing", "must be in (0, 1]"));
    }
    let min_trade = config.get_double("portfolio", "min_trade_amount", 1_000.0);
    if min_trade < 0.0 {
        return Err(invalid("portfolio", "min_trade_amount", "must be non-negative"));
    }
    Ok(())
}

fn invalid(section: &str, key: &str, reason: &str) -> VolsqueezeError {
    VolsqueezeError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn missing(section: &str, key: &str) -> VolsqueezeError {
    VolsqueezeError::ConfigMissing {
        section: section.to_string(),
        key: key.to_string(),
    }
}

fn validate_initial_capital(config: &dyn ConfigPort) -> Result<(), VolsqueezeError> {
    let value = config.get_double("backtest", "initial_capital", 0.0);
    if value <= 0.0 {
        return Err(invalid("backtest", "initial_capital", "must be positive"));
    }
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), VolsqueezeError> {
    let start = parse_date(config.get_string("backtest", "start_date").as_deref(), "start_date")?;
    let end = parse_date(config.get_string("backtest", "end_date").as_deref(), "end_date")?;
    if start >= end {
        return Err(invalid("backtest", "start_date", "start_date must be before end_date"));
    }
    Ok(())
}

fn parse_date(value: Option<&str>, field: &str) -> Result<NaiveDate, VolsqueezeError> {
    match value {
        None => Err(missing("backtest", field)),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| {
            invalid(
                "backtest",
                field,
                &format!("invalid {} format, expected YYYY-MM-DD", field),
            )
        }),
    }
}

fn validate_symbols(config: &dyn ConfigPort) -> Result<(), VolsqueezeError> {
    match config.get_string("backtest", "symbols") {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(missing("backtest", "symbols")),
    }
}

fn validate_data_path(config: &dyn ConfigPort) -> Result<(), VolsqueezeError> {
    match config.get_string("data", "path") {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(missing("data", "path")),
    }
}

fn validate_mode(config: &dyn ConfigPort) -> Result<(), VolsqueezeError> {
    if let Some(mode) = config.get_string("strategy", "mode") {
        if TradingMode::parse(&mode).is_none() {
            return Err(invalid(
                "strategy",
                "mode",
                "expected conservative, balanced or aggressive",
            ));
        }
    }
    Ok(())
}

fn validate_profile(config: &dyn ConfigPort) -> Result<(), VolsqueezeError> {
    if let Some(profile) = config.get_string("strategy", "profile") {
        if SignalProfile::parse(&profile).is_none() {
            return Err(invalid("strategy", "profile", "expected squeeze or breakout"));
        }
    }
    Ok(())
}

fn validate_windows(config: &dyn ConfigPort) -> Result<(), VolsqueezeError> {
    let bb_period = config.get_int("strategy", "bb_period", 20);
    if bb_period < 2 {
        return Err(invalid("strategy", "bb_period", "must be at least 2"));
    }
    let rsi_period = config.get_int("strategy", "rsi_period", 14);
    if rsi_period < 2 {
        return Err(invalid("strategy", "rsi_period", "must be at least 2"));
    }
    let lookback = config.get_int("strategy", "volatility_lookback", 50);
    if lookback < 2 {
        return Err(invalid("strategy", "volatility_lookback", "must be at least 2"));
    }
    let bb_mult = config.get_double("strategy", "bb_mult", 2.0);
    if bb_mult <= 0.0 {
        return Err(invalid("strategy", "bb_mult", "must be positive"));
    }
    Ok(())
}

fn validate_thresholds(config: &dyn ConfigPort) -> Result<(), VolsqueezeError> {
    let vol_threshold = config.get_double("strategy", "volatility_threshold", 0.2);
    if vol_threshold <= 0.0 || vol_threshold >= 1.0 {
        return Err(invalid("strategy", "volatility_threshold", "must be in (0, 1)"));
    }
    let rsi_high = config.get_double("strategy", "rsi_high", 65.0);
    if !(0.0..=100.0).contains(&rsi_high) {
        return Err(invalid("strategy", "rsi_high", "must be in [0, 100]"));
    }
    let rsi_low = config.get_double("strategy", "rsi_low", 50.0);
    if !(0.0..=100.0).contains(&rsi_low) || rsi_low > rsi_high {
        return Err(invalid("strategy", "rsi_low", "must be in [0, 100] and below rsi_high"));
    }
    let sell_half = config.get_double("strategy", "sell_half_threshold", 0.75);
    let sell_all = config.get_double("strategy", "sell_all_threshold", 0.15);
    if sell_all >= sell_half {
        return Err(invalid(
            "strategy",
            "sell_all_threshold",
            "must be below sell_half_threshold",
        ));
    }
    let volume_ratio = config.get_double("strategy", "volume_ratio_threshold", 1.5);
    if volume_ratio <= 0.0 {
        return Err(invalid("strategy", "volume_ratio_threshold", "must be positive"));
    }
    Ok(())
}
