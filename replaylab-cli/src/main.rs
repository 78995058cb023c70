//! ReplayLab CLI: fetch, run and strategies commands.
//!
//! Commands:
//! - `fetch`: download klines from Binance and save them as CSV
//! - `run`: execute a backtest from a TOML config file
//! - `strategies`: list the bundled strategy classes

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use replaylab_core::data::{write_bars_csv, BarRequest, BinanceSource, Broker, Interval};
use replaylab_core::strategy::BuiltinHost;
use replaylab_runner::{run_from_config, save_artifacts, BacktestConfig, RunReport};

#[derive(Parser)]
#[command(
    name = "replaylab",
    about = "ReplayLab CLI: candle-replay backtesting engine"
)]
struct Cli {
    /// Log at debug level (overridden by RUST_LOG).
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download klines from Binance and write them to a CSV file.
    Fetch {
        /// Trading pair (e.g., BTCUSDT).
        symbol: String,

        /// Candle interval (1m, 5m, 1h, 4h, 1d, ...).
        #[arg(long, default_value = "1h")]
        interval: String,

        /// Number of bars (clamped to 1000).
        #[arg(long)]
        limit: Option<usize>,

        /// Window start: Unix ms or YYYY-MM-DD.
        #[arg(long)]
        start: Option<String>,

        /// Window end: Unix ms or YYYY-MM-DD.
        #[arg(long)]
        end: Option<String>,

        /// Output CSV path. Defaults to data/<SYMBOL>_<interval>.csv.
        #[arg(long)]
        out: Option<PathBuf>,

        /// Override the REST base URL.
        #[arg(long)]
        base_url: Option<String>,
    },
    /// Execute a backtest from a TOML config file.
    Run {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// Output directory for run artifacts.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,

        /// Print the summary without writing artifacts.
        #[arg(long, default_value_t = false)]
        no_save: bool,
    },
    /// List the bundled strategy classes.
    Strategies,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Fetch {
            symbol,
            interval,
            limit,
            start,
            end,
            out,
            base_url,
        } => run_fetch(symbol, interval, limit, start, end, out, base_url),
        Commands::Run {
            config,
            output_dir,
            no_save,
        } => run_backtest_cmd(config, output_dir, no_save),
        Commands::Strategies => run_strategies(),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[allow(clippy::too_many_arguments)]
fn run_fetch(
    symbol: String,
    interval: String,
    limit: Option<usize>,
    start: Option<String>,
    end: Option<String>,
    out: Option<PathBuf>,
    base_url: Option<String>,
) -> Result<()> {
    let interval = Interval::normalize(&interval);
    let mut request = BarRequest::new(symbol.to_uppercase(), interval);
    if let Some(limit) = limit {
        request = request.limit(limit);
    }
    if let Some(start) = start.as_deref() {
        request = request.start_time(parse_time(start)?);
    }
    if let Some(end) = end.as_deref() {
        request = request.end_time(parse_time(end)?);
    }
    if let (Some(s), Some(e)) = (request.start_time, request.end_time) {
        if s > e {
            bail!("--start is after --end");
        }
    }

    tracing::info!(symbol = %request.symbol, %interval, limit = ?request.limit, "fetching klines");
    let source = match base_url {
        Some(url) => BinanceSource::with_base_url(url)?,
        None => BinanceSource::new()?,
    };
    let bars = source
        .fetch(&request)
        .with_context(|| format!("Failed to fetch {} {}", request.symbol, interval))?;
    if bars.is_empty() {
        bail!("no bars returned for {} {}", request.symbol, interval);
    }

    let out = out.unwrap_or_else(|| {
        PathBuf::from("data").join(format!("{}_{}.csv", request.symbol, interval))
    });
    write_bars_csv(&out, &bars)
        .with_context(|| format!("Failed to write {}", out.display()))?;

    println!("Saved {} bars to {}", bars.len(), out.display());
    Ok(())
}

fn run_backtest_cmd(config_path: PathBuf, output_dir: PathBuf, no_save: bool) -> Result<()> {
    let config = BacktestConfig::from_file(&config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;
    let host = BuiltinHost::with_builtins();

    let report = run_from_config(&config, &host)?;
    print_summary(&report);

    if !no_save {
        let run_dir = save_artifacts(&report, &output_dir)?;
        println!("Artifacts saved to: {}", run_dir.display());
    }
    Ok(())
}

fn run_strategies() -> Result<()> {
    let host = BuiltinHost::with_builtins();
    println!("Built-in strategies:");
    for name in host.class_names() {
        println!("  {name}");
    }
    Ok(())
}

/// Unix milliseconds, or a `YYYY-MM-DD` date taken as midnight UTC.
fn parse_time(raw: &str) -> Result<i64> {
    if let Ok(ms) = raw.parse::<i64>() {
        return Ok(ms);
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("'{raw}' is neither Unix ms nor YYYY-MM-DD"))?;
    match date.and_hms_opt(0, 0, 0) {
        Some(midnight) => Ok(midnight.and_utc().timestamp_millis()),
        None => bail!("invalid date '{raw}'"),
    }
}

fn print_summary(report: &RunReport) {
    let config = &report.config;
    let result = &report.result;
    let metrics = &result.metrics;

    println!();
    println!("=== Backtest Result ===");
    println!("Run:            {}", report.run_id);
    println!("Symbol:         {}", config.backtest.symbol);
    println!("Interval:       {}", config.interval());
    println!("Strategy:       {}", config.strategy.class);
    println!("Bars:           {}", result.bar_count);
    println!(
        "Trades:         {} ({} won, {} lost)",
        result.total_trades, result.winning_trades, result.losing_trades
    );
    println!();
    println!("--- Performance ---");
    println!("Initial:        {:.2}", result.initial_capital);
    println!("Final:          {:.2}", result.final_capital);
    println!("Total Return:   {:.2}%", metrics.total_return * 100.0);
    println!("Sharpe:         {:.3}", metrics.sharpe_ratio);
    println!("Max Drawdown:   {:.2}%", metrics.max_drawdown * 100.0);
    println!("Win Rate:       {:.1}%", metrics.win_rate * 100.0);
    println!("Avg Win:        {:.2}", metrics.avg_win);
    println!("Avg Loss:       {:.2}", metrics.avg_loss);
    println!("Profit Factor:  {:.2}", metrics.profit_factor);

    if !result.no_fills.is_empty() {
        println!();
        println!("--- Unfilled Orders ---");
        for (reason, count) in &result.no_fills {
            println!("{:<22}{count}", format!("{reason:?}:"));
        }
    }
}
