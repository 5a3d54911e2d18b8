//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::adapters::console_notifier::ConsoleNotifier;
use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::analyzer::{pair_trades, yearly_returns, Metrics, RiskSummary};
use crate::domain::asset::AssetSeries;
use crate::domain::config_validation::{
    validate_backtest_config, validate_portfolio_config, validate_strategy_config,
};
use crate::domain::error::VolsqueezeError;
use crate::domain::indicator::compute_indicators;
use crate::domain::indicator::squeeze::SqueezeRule;
use crate::domain::monitor::{
    latest_snapshot, process_signals, AlertThrottle, DEFAULT_COOLDOWN_SECS,
};
use crate::domain::portfolio::{run_portfolio, AllocatorOptions};
use crate::domain::simulator::{simulate, EquityPoint};
use crate::domain::strategy::{apply_signals, SignalProfile, StrategyParams, TradingMode};
use crate::domain::universe::{check_indicators, parse_symbols, validate_universe};
use crate::ports::config_port::ConfigPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "volsqueeze", about = "Volatility-squeeze breakout backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Backtest each symbol independently
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Restrict the run to one symbol
        #[arg(long)]
        symbol: Option<String>,
        /// Directory for trade and equity CSV exports
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Run the shared-cash portfolio allocator over the universe
    Portfolio {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print current signal alerts for the universe
    Scan {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            symbol,
            output,
        } => run_backtest(&config, symbol.as_deref(), output.as_ref()),
        Command::Portfolio { config, output } => run_portfolio_cmd(&config, output.as_ref()),
        Command::Scan { config } => run_scan(&config),
        Command::Validate { config } => run_validate(&config),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        eprintln!("error: {e}");
        (&e).into()
    })
}

/// Backtest window and universe, resolved from the [backtest] and [data]
/// sections after validation.
struct RunSettings {
    start_date: NaiveDate,
    end_date: NaiveDate,
    initial_capital: f64,
    symbols: Vec<String>,
    data_path: PathBuf,
}

fn build_run_settings(
    config: &dyn ConfigPort,
    symbol_override: Option<&str>,
) -> Result<RunSettings, VolsqueezeError> {
    let start_str =
        config
            .get_string("backtest", "start_date")
            .ok_or_else(|| VolsqueezeError::ConfigMissing {
                section: "backtest".into(),
                key: "start_date".into(),
            })?;
    let end_str =
        config
            .get_string("backtest", "end_date")
            .ok_or_else(|| VolsqueezeError::ConfigMissing {
                section: "backtest".into(),
                key: "end_date".into(),
            })?;
    let start_date = NaiveDate::parse_from_str(&start_str, "%Y-%m-%d").map_err(|_| {
        VolsqueezeError::ConfigInvalid {
            section: "backtest".into(),
            key: "start_date".into(),
            reason: "invalid date format (expected YYYY-MM-DD)".into(),
        }
    })?;
    let end_date = NaiveDate::parse_from_str(&end_str, "%Y-%m-%d").map_err(|_| {
        VolsqueezeError::ConfigInvalid {
            section: "backtest".into(),
            key: "end_date".into(),
            reason: "invalid date format (expected YYYY-MM-DD)".into(),
        }
    })?;

    let symbols = match symbol_override {
        Some(s) => vec![s.trim().to_uppercase()],
        None => {
            let raw = config.get_string("backtest", "symbols").ok_or_else(|| {
                VolsqueezeError::ConfigMissing {
                    section: "backtest".into(),
                    key: "symbols".into(),
                }
            })?;
            parse_symbols(&raw).map_err(|e| VolsqueezeError::ConfigInvalid {
                section: "backtest".into(),
                key: "symbols".into(),
                reason: e.to_string(),
            })?
        }
    };

    let data_path = config
        .get_string("data", "path")
        .ok_or_else(|| VolsqueezeError::ConfigMissing {
            section: "data".into(),
            key: "path".into(),
        })?;

    Ok(RunSettings {
        start_date,
        end_date,
        initial_capital: config.get_double("backtest", "initial_capital", 100_000.0),
        symbols,
        data_path: PathBuf::from(data_path),
    })
}

/// Mode preset first, then per-key overrides from the [strategy] section.
pub fn build_strategy_params(config: &dyn ConfigPort) -> StrategyParams {
    let mode = config
        .get_string("strategy", "mode")
        .and_then(|s| TradingMode::parse(&s))
        .unwrap_or(TradingMode::Balanced);
    let mut params = StrategyParams::for_mode(mode);

    params.bb_period = config.get_int("strategy", "bb_period", params.bb_period as i64) as usize;
    params.bb_mult = config.get_double("strategy", "bb_mult", params.bb_mult);
    params.rsi_period = config.get_int("strategy", "rsi_period", params.rsi_period as i64) as usize;
    params.volatility_lookback = config.get_int(
        "strategy",
        "volatility_lookback",
        params.volatility_lookback as i64,
    ) as usize;
    params.volatility_threshold = config.get_double(
        "strategy",
        "volatility_threshold",
        params.volatility_threshold,
    );
    params.rsi_high = config.get_double("strategy", "rsi_high", params.rsi_high);
    params.rsi_low = config.get_double("strategy", "rsi_low", params.rsi_low);
    params.sell_half_threshold =
        config.get_double("strategy", "sell_half_threshold", params.sell_half_threshold);
    params.sell_all_threshold =
        config.get_double("strategy", "sell_all_threshold", params.sell_all_threshold);
    params.volume_ratio_threshold = config.get_double(
        "strategy",
        "volume_ratio_threshold",
        params.volume_ratio_threshold,
    );

    if let Some(profile) = config
        .get_string("strategy", "profile")
        .and_then(|s| SignalProfile::parse(&s))
    {
        params.profile = profile;
    }
    if let Some(rule) = config.get_string("strategy", "squeeze_rule") {
        match rule.to_lowercase().as_str() {
            "percentile" => params.squeeze_rule = SqueezeRule::Percentile,
            "rolling_min" => params.squeeze_rule = SqueezeRule::RollingMin,
            _ => {}
        }
    }

    params
}

fn validated_config(config_path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = load_config(config_path)?;

    if let Err(e) = validate_backtest_config(&adapter) {
        eprintln!("error: {e}");
        return Err((&e).into());
    }
    if let Err(e) = validate_strategy_config(&adapter) {
        eprintln!("error: {e}");
        return Err((&e).into());
    }
    Ok(adapter)
}

fn run_backtest(
    config_path: &PathBuf,
    symbol_override: Option<&str>,
    output_path: Option<&PathBuf>,
) -> ExitCode {
    let adapter = match validated_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let settings = match build_run_settings(&adapter, symbol_override) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let params = build_strategy_params(&adapter);

    eprintln!(
        "Validating {} symbols from {}...",
        settings.symbols.len(),
        settings.data_path.display()
    );
    let data_port = CsvAdapter::new(settings.data_path.clone());
    let universe = match validate_universe(
        &data_port,
        &settings.symbols,
        settings.start_date,
        settings.end_date,
        &params,
    ) {
        Ok(u) => u,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    if let Some(dir) = output_path {
        if let Err(e) = fs::create_dir_all(dir) {
            eprintln!("error: failed to create {}: {}", dir.display(), e);
            return ExitCode::from(1);
        }
    }

    let reporter = CsvReportAdapter::new();
    let attempted = universe.assets.len();
    let mut asset_returns = Vec::new();

    for (symbol, bars) in &universe.assets {
        let mut rows = compute_indicators(bars, &params);
        apply_signals(&mut rows, &params);
        if let Err(e) = check_indicators(symbol, &rows) {
            eprintln!("warning: skipping {} ({})", symbol, e);
            continue;
        }

        let result = match simulate(symbol, &rows, settings.initial_capital) {
            Ok(r) => r,
            Err(e) => {
                eprintln!("warning: skipping {} ({})", symbol, e);
                continue;
            }
        };

        let completed = pair_trades(&result.trades);
        let metrics = Metrics::compute(
            &completed,
            &result.equity_curve,
            result.initial_capital,
            result.final_value,
        );

        eprintln!("\n=== {} ===", symbol);
        eprintln!("Total Return:     {:.2}%", metrics.total_return_pct);
        eprintln!("Annualized:       {:.2}%", metrics.annualized_return_pct);
        eprintln!("Max Drawdown:     -{:.1}%", metrics.max_drawdown_pct);
        eprintln!("Volatility:       {:.2}%", metrics.volatility_pct);
        eprintln!("Sharpe Ratio:     {:.2}", metrics.sharpe_ratio);
        eprintln!(
            "Trades:           {} ({} wins, {:.1}% win rate)",
            metrics.total_trades, metrics.winning_trades, metrics.win_rate
        );
        eprintln!("Profit Factor:    {:.2}", metrics.profit_factor);

        let by_year = yearly_returns(&result.equity_curve);
        if !by_year.is_empty() {
            eprintln!("By year:");
            for yr in &by_year {
                eprintln!("  {}: {:+.2}%", yr.year, yr.return_pct);
            }
        }

        if let Some(dir) = output_path {
            let trades_path = dir.join(format!("{}_trades.csv", symbol));
            let equity_path = dir.join(format!("{}_equity.csv", symbol));
            if let Err(e) = reporter.write_trades(&result.trades, &trades_path) {
                eprintln!("error: failed to write {}: {}", trades_path.display(), e);
                return (&e).into();
            }
            if let Err(e) = reporter.write_equity(&result.equity_curve, &equity_path) {
                eprintln!("error: failed to write {}: {}", equity_path.display(), e);
                return (&e).into();
            }
            eprintln!("Exported trades and equity to {}", dir.display());
        }

        asset_returns.push(result.total_return_pct);
    }

    if asset_returns.is_empty() {
        let err = VolsqueezeError::AllAssetsFailed { attempted };
        eprintln!("error: {err}");
        return (&err).into();
    }

    if let Some(summary) = RiskSummary::from_returns(&asset_returns) {
        if summary.count > 1 {
            eprintln!("\n=== Universe Risk ===");
            eprintln!("Assets:           {}", summary.count);
            eprintln!("Mean Return:      {:.2}%", summary.mean_return_pct);
            eprintln!("Std Dev:          {:.2}%", summary.std_return_pct);
            eprintln!("Risk-Adjusted:    {:.2}", summary.risk_adjusted);
            eprintln!("VaR (95%):        {:.2}%", summary.var_95_pct);
            eprintln!("Worst:            {:.2}%", summary.worst_return_pct);
            eprintln!("Success Rate:     {:.1}%", summary.success_rate_pct);
            eprintln!("Risk Grade:       {}", summary.grade());
        }
    }

    ExitCode::SUCCESS
}

fn run_portfolio_cmd(config_path: &PathBuf, output_path: Option<&PathBuf>) -> ExitCode {
    let adapter = match validated_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    if let Err(e) = validate_portfolio_config(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    let settings = match build_run_settings(&adapter, None) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let params = build_strategy_params(&adapter);
    let options = AllocatorOptions {
        initial_capital: settings.initial_capital,
        max_positions: adapter.get_int("portfolio", "max_positions", 10) as usize,
        position_sizing: adapter.get_double("portfolio", "position_sizing", 0.2),
        min_trade_amount: adapter.get_double("portfolio", "min_trade_amount", 1_000.0),
    };

    eprintln!(
        "Validating {} symbols from {}...",
        settings.symbols.len(),
        settings.data_path.display()
    );
    let data_port = CsvAdapter::new(settings.data_path.clone());
    let universe = match validate_universe(
        &data_port,
        &settings.symbols,
        settings.start_date,
        settings.end_date,
        &params,
    ) {
        Ok(u) => u,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let mut assets = Vec::with_capacity(universe.assets.len());
    for (symbol, bars) in &universe.assets {
        let mut rows = compute_indicators(bars, &params);
        apply_signals(&mut rows, &params);
        if let Err(e) = check_indicators(symbol, &rows) {
            eprintln!("warning: skipping {} ({})", symbol, e);
            continue;
        }
        assets.push(AssetSeries::new(symbol.clone(), rows));
    }

    eprintln!(
        "Running portfolio: {} assets, {} to {}",
        assets.len(),
        settings.start_date,
        settings.end_date,
    );

    let result = match run_portfolio(&assets, &options) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    eprintln!("\n=== Portfolio Results ===");
    eprintln!("Total Return:     {:.2}%", result.total_return_pct);
    eprintln!("Final Value:      {:.2}", result.final_value);
    eprintln!(
        "Trades:           {} buys, {} sells",
        result.stats.buy_trades, result.stats.sell_trades
    );
    eprintln!(
        "Positions:        avg {:.1}, max {}",
        result.stats.avg_positions, result.stats.max_positions_held
    );
    eprintln!(
        "Avg Daily Return: {:.4}%",
        result.stats.avg_daily_return_pct
    );
    eprintln!("Max Drawdown:     -{:.1}%", result.stats.max_drawdown_pct);
    eprintln!("Volatility:       {:.2}%", result.stats.volatility_pct);
    eprintln!("Sharpe Ratio:     {:.2}", result.stats.sharpe_ratio);

    if let Some(dir) = output_path {
        if let Err(e) = fs::create_dir_all(dir) {
            eprintln!("error: failed to create {}: {}", dir.display(), e);
            return ExitCode::from(1);
        }
        let reporter = CsvReportAdapter::new();
        let equity: Vec<EquityPoint> = result
            .equity_curve
            .iter()
            .map(|p| EquityPoint {
                date: p.date,
                cash: p.cash,
                position_value: p.holdings_value,
                total: p.total,
            })
            .collect();
        let trades_path = dir.join("portfolio_trades.csv");
        let equity_path = dir.join("portfolio_equity.csv");
        let write_result = reporter
            .write_trades(&result.trades, &trades_path)
            .and_then(|()| reporter.write_equity(&equity, &equity_path));
        if let Err(e) = write_result {
            eprintln!("error: failed to write exports: {e}");
            return (&e).into();
        }
        eprintln!("Exported trades and equity to {}", dir.display());
    }

    ExitCode::SUCCESS
}

fn run_scan(config_path: &PathBuf) -> ExitCode {
    let adapter = match validated_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let settings = match build_run_settings(&adapter, None) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let params = build_strategy_params(&adapter);

    let data_port = CsvAdapter::new(settings.data_path.clone());
    let universe = match validate_universe(
        &data_port,
        &settings.symbols,
        settings.start_date,
        settings.end_date,
        &params,
    ) {
        Ok(u) => u,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let cooldown = adapter.get_int("monitor", "cooldown_secs", DEFAULT_COOLDOWN_SECS);
    let mut throttle = AlertThrottle::new(cooldown);
    let notifier = ConsoleNotifier;
    let now = match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs() as i64,
        Err(_) => 0,
    };

    let mut alerts = 0;
    for (symbol, bars) in &universe.assets {
        let mut rows = compute_indicators(bars, &params);
        apply_signals(&mut rows, &params);
        match latest_snapshot(symbol, &rows) {
            Some(snapshot) => {
                alerts += process_signals(&snapshot, &mut throttle, &notifier, now);
            }
            None => eprintln!("warning: {} has no resolved signal row", symbol),
        }
    }

    eprintln!(
        "Scan complete: {} alerts across {} symbols",
        alerts,
        universe.assets.len()
    );
    ExitCode::SUCCESS
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    for check in [
        validate_backtest_config,
        validate_strategy_config,
        validate_portfolio_config,
    ] {
        if let Err(e) = check(&adapter) {
            eprintln!("error: {e}");
            return (&e).into();
        }
    }

    eprintln!("Configuration is valid");
    ExitCode::SUCCESS
}
