//! CLI definition and dispatch.
//!
//! Progress and warnings go to stderr, results to stdout, and every failure
//! maps to a stable exit code through the error enum.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_data_adapter::{JsonDataAdapter, SESSION_DATE_FORMAT};
use crate::adapters::json_report_adapter::JsonReportAdapter;
use crate::domain::bar::BarSeries;
use crate::domain::error::RsitraderError;
use crate::domain::execution::ExecutionConfig;
use crate::domain::grid::{
    run_grid_search, ThresholdGrid, DEFAULT_OVERBOUGHT_RANGE, DEFAULT_OVERSOLD_RANGE,
};
use crate::domain::rsi::{compute_rsi, RsiSeries, DEFAULT_PERIOD};
use crate::domain::simulator::{
    run_simulation, SimulationParams, SimulationResult, DEFAULT_INITIAL_CAPITAL,
};
use crate::domain::summary::{BatchSummary, RsiDistribution};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::{SessionDataPort, PRIOR_SESSION_LOOKBACK_DAYS};
use crate::ports::report_port::ReportPort;

// Single-run thresholds mirror the looser standalone defaults; the grid
// sweeps its own tighter bands.
const DEFAULT_SINGLE_OVERSOLD: f64 = 40.0;
const DEFAULT_SINGLE_OVERBOUGHT: f64 = 60.0;

#[derive(Parser, Debug)]
#[command(name = "rsitrader", about = "Intraday RSI trading simulator")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compute the RSI series for one instrument-session
    Rsi {
        #[arg(long)]
        code: String,
        /// Session date, YYYYMMDD or YYYY-MM-DD
        #[arg(long)]
        date: String,
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        data_dir: Option<PathBuf>,
        #[arg(long)]
        period: Option<usize>,
        /// Skip prior-session stitching
        #[arg(long)]
        no_prior: bool,
    },
    /// Run one buy-low/sell-high simulation
    Simulate {
        #[arg(long)]
        code: String,
        #[arg(long)]
        date: String,
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        data_dir: Option<PathBuf>,
        #[arg(long)]
        oversold: Option<f64>,
        #[arg(long)]
        overbought: Option<f64>,
        #[arg(long)]
        capital: Option<f64>,
        /// Report file; .csv gets a trade log, anything else JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Sweep an (oversold, overbought) threshold grid
    Grid {
        #[arg(long)]
        code: String,
        #[arg(long)]
        date: String,
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        data_dir: Option<PathBuf>,
        #[arg(long)]
        oversold_min: Option<u32>,
        #[arg(long)]
        oversold_max: Option<u32>,
        #[arg(long)]
        overbought_min: Option<u32>,
        #[arg(long)]
        overbought_max: Option<u32>,
        #[arg(long)]
        capital: Option<f64>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List instruments with data for a session date
    Info {
        #[arg(long)]
        date: String,
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Rsi {
            code,
            date,
            config,
            data_dir,
            period,
            no_prior,
        } => run_rsi(&code, &date, config.as_ref(), data_dir, period, no_prior),
        Command::Simulate {
            code,
            date,
            config,
            data_dir,
            oversold,
            overbought,
            capital,
            output,
        } => run_simulate(
            &code,
            &date,
            config.as_ref(),
            data_dir,
            oversold,
            overbought,
            capital,
            output.as_deref(),
        ),
        Command::Grid {
            code,
            date,
            config,
            data_dir,
            oversold_min,
            oversold_max,
            overbought_min,
            overbought_max,
            capital,
            output,
        } => run_grid(
            &code,
            &date,
            config.as_ref(),
            data_dir,
            (oversold_min, oversold_max),
            (overbought_min, overbought_max),
            capital,
            output.as_deref(),
        ),
        Command::Info {
            date,
            config,
            data_dir,
        } => run_info(&date, config.as_ref(), data_dir),
    }
}

fn fail(err: &RsitraderError) -> ExitCode {
    eprintln!("error: {err}");
    err.into()
}

fn load_config(path: Option<&PathBuf>) -> Result<FileConfigAdapter, RsitraderError> {
    match path {
        Some(p) => {
            eprintln!("Loading config from {}", p.display());
            FileConfigAdapter::from_file(p)
        }
        None => Ok(FileConfigAdapter::empty()),
    }
}

pub fn parse_session_date(raw: &str) -> Result<NaiveDate, RsitraderError> {
    NaiveDate::parse_from_str(raw, SESSION_DATE_FORMAT)
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
        .map_err(|_| RsitraderError::ConfigInvalid {
            section: "cli".into(),
            key: "date".into(),
            reason: format!("invalid date '{}' (expected YYYYMMDD or YYYY-MM-DD)", raw),
        })
}

fn resolve_data_dir(flag: Option<PathBuf>, config: &dyn ConfigPort) -> PathBuf {
    flag.or_else(|| config.get_str("data", "base_path").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("data"))
}

/// Fetch the session plus its stitching prefix and compute RSI. The third
/// element is the combined sample count (prefix + session).
fn load_session_rsi(
    data: &JsonDataAdapter,
    code: &str,
    date: NaiveDate,
    period: usize,
    with_prior: bool,
) -> Result<(BarSeries, RsiSeries, usize), RsitraderError> {
    let session = data.fetch_session(code, date)?;
    eprintln!("Loaded {} bars for {} on {}", session.len(), code, date);

    let prior = if with_prior {
        data.fetch_prior_session(code, date, PRIOR_SESSION_LOOKBACK_DAYS)?
    } else {
        None
    };
    match &prior {
        Some(p) => eprintln!("Stitching prior session {} ({} bars)", p.date, p.len()),
        None if with_prior => eprintln!(
            "No prior session within {} days; warmup uses today's bars only",
            PRIOR_SESSION_LOOKBACK_DAYS
        ),
        None => {}
    }

    let rsi = compute_rsi(&session, prior.as_ref(), period);
    let samples = prior.as_ref().map(|p| p.len()).unwrap_or(0) + session.len();
    if rsi.insufficient_data {
        eprintln!(
            "warning: {} combined samples, need {}; every RSI value is undefined",
            samples,
            period + 1
        );
    }
    Ok((session, rsi, samples))
}

fn insufficient(code: &str, date: NaiveDate, rsi: &RsiSeries, samples: usize) -> RsitraderError {
    RsitraderError::InsufficientData {
        code: code.to_string(),
        date: date.format(SESSION_DATE_FORMAT).to_string(),
        samples,
        minimum: rsi.period + 1,
    }
}

fn config_period(config: &dyn ConfigPort, flag: Option<usize>) -> usize {
    flag.unwrap_or_else(|| {
        config.get_i64("simulation", "period", DEFAULT_PERIOD as i64) as usize
    })
}

fn config_capital(config: &dyn ConfigPort, flag: Option<f64>) -> f64 {
    flag.unwrap_or_else(|| {
        config.get_f64("simulation", "initial_capital", DEFAULT_INITIAL_CAPITAL)
    })
}

fn run_rsi(
    code: &str,
    date_str: &str,
    config_path: Option<&PathBuf>,
    data_dir: Option<PathBuf>,
    period: Option<usize>,
    no_prior: bool,
) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };
    let date = match parse_session_date(date_str) {
        Ok(d) => d,
        Err(e) => return fail(&e),
    };

    let data = JsonDataAdapter::new(resolve_data_dir(data_dir, &config));
    let period = config_period(&config, period);

    let (_session, rsi, _samples) = match load_session_rsi(&data, code, date, period, !no_prior) {
        Ok(loaded) => loaded,
        Err(e) => return fail(&e),
    };

    for point in &rsi.points {
        match point.value {
            Some(v) => println!("{}  {:.2}", point.timestamp.format("%H:%M:%S"), v),
            None => println!("{}  -", point.timestamp.format("%H:%M:%S")),
        }
    }

    match RsiDistribution::analyze(&rsi) {
        Some(dist) => {
            eprintln!("\n=== RSI Distribution ===");
            eprintln!("Defined:       {} of {}", dist.valid_count, rsi.points.len());
            eprintln!("Range:         {:.2} to {:.2}", dist.min, dist.max);
            eprintln!("Mean / Median: {:.2} / {:.2}", dist.mean, dist.median);
            eprintln!("Std Dev:       {:.2}", dist.std_dev);
            eprintln!(
                "Oversold / Neutral / Overbought: {} / {} / {}",
                dist.oversold_count, dist.neutral_count, dist.overbought_count
            );
        }
        None => eprintln!("\nNo defined RSI values to summarize"),
    }

    ExitCode::SUCCESS
}

#[allow(clippy::too_many_arguments)]
fn run_simulate(
    code: &str,
    date_str: &str,
    config_path: Option<&PathBuf>,
    data_dir: Option<PathBuf>,
    oversold: Option<f64>,
    overbought: Option<f64>,
    capital: Option<f64>,
    output: Option<&std::path::Path>,
) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };
    let date = match parse_session_date(date_str) {
        Ok(d) => d,
        Err(e) => return fail(&e),
    };
    let execution = match ExecutionConfig::from_config(&config) {
        Ok(e) => e,
        Err(e) => return fail(&e),
    };

    let params = SimulationParams {
        oversold: oversold
            .unwrap_or_else(|| config.get_f64("simulation", "oversold", DEFAULT_SINGLE_OVERSOLD)),
        overbought: overbought.unwrap_or_else(|| {
            config.get_f64("simulation", "overbought", DEFAULT_SINGLE_OVERBOUGHT)
        }),
        initial_capital: config_capital(&config, capital),
    };

    let data = JsonDataAdapter::new(resolve_data_dir(data_dir, &config));
    let period = config_period(&config, None);

    let (session, rsi, samples) = match load_session_rsi(&data, code, date, period, true) {
        Ok(loaded) => loaded,
        Err(e) => return fail(&e),
    };
    if rsi.insufficient_data {
        return fail(&insufficient(code, date, &rsi, samples));
    }

    eprintln!(
        "Simulating {}: oversold {} / overbought {}, capital {:.0}",
        code, params.oversold, params.overbought, params.initial_capital
    );

    let result = match run_simulation(&session, &rsi, &params, &execution) {
        Ok(r) => r,
        Err(e) => return fail(&e),
    };

    print_simulation_summary(&result);

    if let Some(path) = output {
        if let Err(e) = report_adapter(path).write_simulation(&result, path) {
            return fail(&e);
        }
        eprintln!("\nReport written to: {}", path.display());
    }

    ExitCode::SUCCESS
}

#[allow(clippy::too_many_arguments)]
fn run_grid(
    code: &str,
    date_str: &str,
    config_path: Option<&PathBuf>,
    data_dir: Option<PathBuf>,
    oversold_bounds: (Option<u32>, Option<u32>),
    overbought_bounds: (Option<u32>, Option<u32>),
    capital: Option<f64>,
    output: Option<&std::path::Path>,
) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };
    let date = match parse_session_date(date_str) {
        Ok(d) => d,
        Err(e) => return fail(&e),
    };
    let execution = match ExecutionConfig::from_config(&config) {
        Ok(e) => e,
        Err(e) => return fail(&e),
    };

    let grid = match build_grid(&config, oversold_bounds, overbought_bounds) {
        Ok(g) => g,
        Err(e) => return fail(&e),
    };
    let initial_capital = config_capital(&config, capital);

    let data = JsonDataAdapter::new(resolve_data_dir(data_dir, &config));
    let period = config_period(&config, None);

    let (session, rsi, samples) = match load_session_rsi(&data, code, date, period, true) {
        Ok(loaded) => loaded,
        Err(e) => return fail(&e),
    };
    if rsi.insufficient_data {
        return fail(&insufficient(code, date, &rsi, samples));
    }

    eprintln!(
        "Sweeping {} cells: oversold {}..={}, overbought {}..={}",
        grid.cell_count(),
        grid.oversold.start(),
        grid.oversold.end(),
        grid.overbought.start(),
        grid.overbought.end()
    );

    let result = run_grid_search(&session, &rsi, &grid, initial_capital, &execution);

    for cell in &result.failed {
        eprintln!(
            "warning: cell ({}, {}) failed: {}",
            cell.oversold, cell.overbought, cell.reason
        );
    }

    println!("rank  oversold  overbought  profit_rate  buys  sells");
    for (rank, run) in result.ranked.iter().take(10).enumerate() {
        println!(
            "{:>4}  {:>8.0}  {:>10.0}  {:>10.4}%  {:>4}  {:>5}",
            rank + 1,
            run.params.oversold,
            run.params.overbought,
            run.profit_rate,
            run.buy_count,
            run.sell_count
        );
    }

    let summary = BatchSummary::summarize(&result.ranked);
    eprintln!("\n=== Grid Summary ===");
    eprintln!("Cells:        {} ok, {} failed", result.succeeded, result.failed.len());
    eprintln!(
        "Profit rate:  min {:.4}%, mean {:.4}%, max {:.4}%",
        summary.min_profit_rate, summary.mean_profit_rate, summary.max_profit_rate
    );
    eprintln!(
        "Buckets:      <=-5%: {}, (-5,0): {}, 0: {}, (0,5]: {}, >5%: {}",
        summary.buckets.steep_loss,
        summary.buckets.loss,
        summary.buckets.flat,
        summary.buckets.gain,
        summary.buckets.steep_gain
    );
    if let Some(best) = result.best() {
        eprintln!(
            "Best:         oversold {:.0} / overbought {:.0} at {:.4}%",
            best.params.oversold, best.params.overbought, best.profit_rate
        );
    }

    if let Some(path) = output {
        if let Err(e) = report_adapter(path).write_grid(&result, path) {
            return fail(&e);
        }
        eprintln!("\nReport written to: {}", path.display());
    }

    ExitCode::SUCCESS
}

fn run_info(
    date_str: &str,
    config_path: Option<&PathBuf>,
    data_dir: Option<PathBuf>,
) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };
    let date = match parse_session_date(date_str) {
        Ok(d) => d,
        Err(e) => return fail(&e),
    };

    let data = JsonDataAdapter::new(resolve_data_dir(data_dir, &config));
    let codes = match data.list_codes(date) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };

    if codes.is_empty() {
        eprintln!("No session files for {}", date);
        return ExitCode::SUCCESS;
    }

    for code in &codes {
        match data.fetch_session(code, date) {
            Ok(session) => {
                let first = session.bars.first().map(|b| b.timestamp.format("%H:%M"));
                let last = session.bars.last().map(|b| b.timestamp.format("%H:%M"));
                match (first, last) {
                    (Some(first), Some(last)) => {
                        println!("{}: {} bars, {} to {}", code, session.len(), first, last)
                    }
                    _ => println!("{}: 0 bars", code),
                }
            }
            Err(e) => eprintln!("warning: skipping {} ({})", code, e),
        }
    }
    eprintln!("{} instruments on {}", codes.len(), date);

    ExitCode::SUCCESS
}

pub fn build_grid(
    config: &dyn ConfigPort,
    (oversold_min, oversold_max): (Option<u32>, Option<u32>),
    (overbought_min, overbought_max): (Option<u32>, Option<u32>),
) -> Result<ThresholdGrid, RsitraderError> {
    let bound = |flag: Option<u32>, key: &str, default: u32| -> u32 {
        flag.unwrap_or_else(|| config.get_i64("simulation", key, i64::from(default)) as u32)
    };

    let oversold = bound(oversold_min, "oversold_min", *DEFAULT_OVERSOLD_RANGE.start())
        ..=bound(oversold_max, "oversold_max", *DEFAULT_OVERSOLD_RANGE.end());
    let overbought = bound(
        overbought_min,
        "overbought_min",
        *DEFAULT_OVERBOUGHT_RANGE.start(),
    )
        ..=bound(
            overbought_max,
            "overbought_max",
            *DEFAULT_OVERBOUGHT_RANGE.end(),
        );

    if oversold.is_empty() || overbought.is_empty() {
        return Err(RsitraderError::ConfigInvalid {
            section: "simulation".into(),
            key: "thresholds".into(),
            reason: "empty threshold range".into(),
        });
    }
    Ok(ThresholdGrid {
        oversold,
        overbought,
    })
}

fn report_adapter(path: &std::path::Path) -> Box<dyn ReportPort> {
    let is_csv = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        .unwrap_or(false);
    if is_csv {
        Box::new(CsvReportAdapter::new())
    } else {
        Box::new(JsonReportAdapter::new())
    }
}

fn print_simulation_summary(result: &SimulationResult) {
    println!("=== Simulation Result ===");
    println!("Code:          {}", result.code);
    println!(
        "Thresholds:    oversold {:.0} / overbought {:.0}",
        result.params.oversold, result.params.overbought
    );
    println!("Final cash:    {:.2}", result.final_cash);
    println!(
        "Profit:        {:.2} ({:.4}%)",
        result.profit, result.profit_rate
    );
    println!(
        "Trades:        {} buys, {} sells",
        result.buy_count, result.sell_count
    );
    if result.buy_count > 0 {
        println!(
            "Avg prices:    buy {:.2}, sell {:.2}",
            result.avg_buy_price, result.avg_sell_price
        );
    }
    println!(
        "Equity range:  {:.2} to {:.2} ({:+.4}% / {:+.4}%)",
        result.min_equity, result.max_equity, result.max_loss_rate, result.max_gain_rate
    );

    for trade in &result.trades {
        let rsi = trade
            .rsi
            .map(|v| format!("{:.2}", v))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {} {:<10} {:>10.2} x {:<6} rsi {}",
            trade.timestamp.format("%H:%M:%S"),
            trade.action.to_string(),
            trade.price,
            trade.shares,
            rsi
        );
    }
}
