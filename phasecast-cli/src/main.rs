//! PhaseCast CLI — synthetic data, analysis cycles, backtests and optimization.
//!
//! Commands:
//! - `generate-data` — write synthetic OHLCV series as CSV files
//! - `analyze` — run one engine analysis cycle and print the payload
//! - `backtest` — walk-forward signals over history, replayed against the bars
//! - `optimize` — search parameters against the backtest baseline, optionally apply

mod obs;

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};

use phasecast_core::data::{MarketDataSource, SyntheticSource, Timeframe};
use phasecast_core::domain::{ParameterStore, PriceBar};
use phasecast_core::rng::SeedHierarchy;
use phasecast_core::signal::SignalGenerator;
use phasecast_runner::data_loader::{file_name, write_bars_csv, CsvSource};
use phasecast_runner::export::{export_report_json, save_artifacts};
use phasecast_runner::optimizer::{collect_performance, outcomes_from_backtest, SearchSpace};
use phasecast_runner::{
    BacktestResult, BacktestScorer, Backtester, Engine, EngineConfig, JsonLinesSink,
    SignalOptimizer, SignalSink,
};

use obs::LogFormat;

#[derive(Parser)]
#[command(
    name = "phasecast",
    about = "PhaseCast CLI — cycle-based signal generation, backtesting and tuning"
)]
struct Cli {
    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    /// Default log level when PHASECAST_LOG is unset.
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every command that reads market data.
#[derive(Args)]
struct SourceArgs {
    /// Path to a TOML engine config. Defaults apply for missing fields.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory of SYMBOL_TIMEFRAME.csv files. Synthetic data when omitted.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Override the configured timeframe (M1, M5, M15, M30, H1, H4, D1).
    #[arg(long)]
    timeframe: Option<Timeframe>,

    /// Override the configured symbols.
    #[arg(long, num_args = 1..)]
    symbols: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write synthetic OHLCV series as CSV.
    GenerateData {
        /// Symbols to generate.
        #[arg(long, num_args = 1.., default_values_t = vec!["EURUSD".to_string(), "GBPUSD".to_string()])]
        symbols: Vec<String>,

        /// Bars per symbol.
        #[arg(long, default_value_t = 1000)]
        bars: usize,

        #[arg(long, default_value = "H1")]
        timeframe: Timeframe,

        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Output directory. Defaults to ./data.
        #[arg(long, default_value = "data")]
        out_dir: PathBuf,
    },
    /// Run one analysis cycle over the configured symbols.
    Analyze {
        #[command(flatten)]
        source: SourceArgs,

        /// Keep at most this many signals, highest confidence first.
        #[arg(long)]
        max_signals: Option<usize>,

        /// Append delivered signals as JSON lines to this file.
        #[arg(long)]
        deliver_to: Option<PathBuf>,
    },
    /// Backtest walk-forward signals against stored history.
    Backtest {
        #[command(flatten)]
        source: SourceArgs,

        /// History length per symbol.
        #[arg(long, default_value_t = 1000)]
        bars: usize,

        /// Bars between consecutive signal as-of points.
        #[arg(long, default_value_t = 5)]
        step: usize,

        /// Output directory for artifacts.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,

        /// Artifact subdirectory name. Defaults to the parameter fingerprint.
        #[arg(long)]
        name: Option<String>,
    },
    /// Search parameters against the backtest baseline.
    Optimize {
        #[command(flatten)]
        source: SourceArgs,

        #[arg(long, default_value_t = 1000)]
        bars: usize,

        #[arg(long, default_value_t = 5)]
        step: usize,

        /// Evaluate a seeded random subset of the grid.
        #[arg(long)]
        max_candidates: Option<usize>,

        /// Candidates with fewer backtested trades score zero.
        #[arg(long, default_value_t = 5)]
        min_trades: usize,

        /// Activate the winning parameters.
        #[arg(long, default_value_t = false)]
        apply: bool,

        /// Write the config with the active parameters to this TOML file.
        #[arg(long)]
        write_config: Option<PathBuf>,

        /// Write the optimization report as JSON.
        #[arg(long)]
        report: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    obs::init_tracing(&cli.log_level, cli.log_format)?;

    match cli.command {
        Commands::GenerateData {
            symbols,
            bars,
            timeframe,
            seed,
            out_dir,
        } => run_generate(&symbols, bars, timeframe, seed, &out_dir),
        Commands::Analyze {
            source,
            max_signals,
            deliver_to,
        } => run_analyze(&source, max_signals, deliver_to.as_deref()),
        Commands::Backtest {
            source,
            bars,
            step,
            output_dir,
            name,
        } => run_backtest(&source, bars, step, &output_dir, name),
        Commands::Optimize {
            source,
            bars,
            step,
            max_candidates,
            min_trades,
            apply,
            write_config,
            report,
        } => run_optimize(
            &source,
            OptimizeOptions {
                bars,
                step,
                max_candidates,
                min_trades,
                apply,
                write_config,
                report,
            },
        ),
    }
}

fn load_config(args: &SourceArgs) -> Result<EngineConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            toml::from_str::<EngineConfig>(&text)
                .with_context(|| format!("failed to parse config {}", path.display()))?
        }
        None => EngineConfig::default(),
    };
    if let Some(timeframe) = args.timeframe {
        config.timeframe = timeframe;
    }
    if !args.symbols.is_empty() {
        config.symbols = args.symbols.clone();
    }
    config.validate()?;
    Ok(config)
}

fn build_source(args: &SourceArgs, config: &EngineConfig) -> Arc<dyn MarketDataSource> {
    match &args.data_dir {
        Some(dir) => Arc::new(CsvSource::new(dir)),
        None => {
            info!(seed = config.seed, "no data directory given, using synthetic data");
            Arc::new(SyntheticSource::new(SeedHierarchy::new(config.seed)))
        }
    }
}

/// Fetch `bars` of history per symbol, skipping symbols that fail.
fn fetch_history(
    source: &dyn MarketDataSource,
    config: &EngineConfig,
    bars: usize,
) -> Result<HashMap<String, Vec<PriceBar>>> {
    let mut history = HashMap::new();
    for symbol in &config.symbols {
        match source.get_series(symbol, config.timeframe, bars) {
            Ok(series) => {
                history.insert(symbol.clone(), series);
            }
            Err(e) => warn!(symbol = %symbol, error = %e, "skipping symbol"),
        }
    }
    if history.is_empty() {
        bail!("no history available for any configured symbol");
    }
    Ok(history)
}

fn build_scorer(
    source: &dyn MarketDataSource,
    config: &EngineConfig,
    bars: usize,
    step: usize,
) -> Result<BacktestScorer> {
    let history = fetch_history(source, config, bars)?;
    let backtester = Backtester::new(config.backtest_config())?;
    let generator = SignalGenerator::new(SeedHierarchy::new(config.seed));
    Ok(BacktestScorer::new(generator, backtester, history).with_step(step))
}

fn run_generate(
    symbols: &[String],
    bars: usize,
    timeframe: Timeframe,
    seed: u64,
    out_dir: &Path,
) -> Result<()> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;
    let source = SyntheticSource::new(SeedHierarchy::new(seed));
    for symbol in symbols {
        let series = source.get_series(symbol, timeframe, bars)?;
        let path = out_dir.join(file_name(symbol, timeframe));
        write_bars_csv(&path, &series)?;
        println!("{symbol}: {} bars -> {}", series.len(), path.display());
    }
    Ok(())
}

fn run_analyze(args: &SourceArgs, max_signals: Option<usize>, deliver_to: Option<&Path>) -> Result<()> {
    let config = load_config(args)?;
    let timeframe = config.timeframe;
    let source = build_source(args, &config);
    let mut engine = Engine::new(config, source)?;
    if let Some(path) = deliver_to {
        let file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        engine = engine.with_sink(Arc::new(JsonLinesSink::new(file)) as Arc<dyn SignalSink>);
    }

    engine.start();
    let validation = engine.validate_system();
    if !validation.all_ok() {
        warn!(?validation, "system validation reported problems");
    }
    let cycle = engine.run_analysis_cycle(timeframe, max_signals)?;
    engine.stop();

    println!("{}", serde_json::to_string_pretty(&cycle)?);
    Ok(())
}

fn run_backtest(
    args: &SourceArgs,
    bars: usize,
    step: usize,
    output_dir: &Path,
    name: Option<String>,
) -> Result<()> {
    let config = load_config(args)?;
    let source = build_source(args, &config);
    let scorer = build_scorer(source.as_ref(), &config, bars, step)?;

    let (signals, result) = scorer.backtest(&config.params)?;
    print_summary(signals.len(), &result);

    let name = name.unwrap_or_else(|| config.params.fingerprint()[..12].to_string());
    let run_dir = save_artifacts(&result, output_dir, &name)?;
    println!("Artifacts saved to: {}", run_dir.display());
    Ok(())
}

struct OptimizeOptions {
    bars: usize,
    step: usize,
    max_candidates: Option<usize>,
    min_trades: usize,
    apply: bool,
    write_config: Option<PathBuf>,
    report: Option<PathBuf>,
}

fn run_optimize(args: &SourceArgs, opts: OptimizeOptions) -> Result<()> {
    let mut config = load_config(args)?;
    let source = build_source(args, &config);
    let scorer = build_scorer(source.as_ref(), &config, opts.bars, opts.step)?
        .with_min_trades(opts.min_trades);

    let (signals, baseline_run) = scorer.backtest(&config.params)?;
    let baseline = collect_performance(&outcomes_from_backtest(&signals, &baseline_run));

    let store = Arc::new(ParameterStore::new(config.params.clone())?);
    let optimizer = SignalOptimizer::new(Arc::clone(&store));
    let space = SearchSpace {
        max_candidates: opts.max_candidates,
        seed: config.seed,
        ..Default::default()
    };
    let result = optimizer.optimize(&baseline, &space, &scorer, None);
    let report = optimizer.report(&baseline, &result);

    println!();
    println!("=== Optimization ===");
    println!("Baseline win rate:  {:.1}% ({} trades)", baseline.win_rate * 100.0, baseline.total);
    println!("Expected win rate:  {:.1}%", result.expected_win_rate * 100.0);
    println!(
        "Candidates:         {} evaluated, {} improved",
        result.candidates_evaluated, result.candidates_found
    );
    let p = &result.optimized_params;
    println!(
        "Best parameters:    qubits={} shots={} threshold={:.2}",
        p.num_measurement_qubits, p.shots, p.confidence_threshold
    );
    for line in &report.recommendations {
        println!("  - {line}");
    }

    if let Some(path) = &opts.report {
        fs::write(path, export_report_json(&report)?)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("Report saved to: {}", path.display());
    }

    if opts.apply {
        if !result.improved() {
            println!("No improvement found; active parameters unchanged.");
        } else {
            let version = optimizer.try_apply(&result.optimized_params)?;
            println!("Applied optimized parameters (version {version}).");
        }
    }

    if let Some(path) = &opts.write_config {
        config.params = store.snapshot().params.clone();
        let text = toml::to_string_pretty(&config).context("failed to serialize config")?;
        fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))?;
        println!("Config saved to: {}", path.display());
    }
    Ok(())
}

fn print_summary(signal_count: usize, result: &BacktestResult) {
    println!();
    println!("=== Backtest Result ===");
    println!("Signals:        {signal_count}");
    println!(
        "Trades:         {} ({} skipped)",
        result.total_trades, result.skipped_signals
    );
    println!();
    println!("--- Performance ---");
    println!("Win Rate:       {:.1}%", result.win_rate * 100.0);
    println!("Total Profit:   {:.2}", result.total_profit);
    println!("Total Return:   {:.2}%", result.total_return_pct);
    println!("Avg Win:        {:.2}", result.avg_win);
    println!("Avg Loss:       {:.2}", result.avg_loss);
    println!("Profit Factor:  {:.2}", result.profit_factor);
    println!("Max Drawdown:   {:.2}%", result.max_drawdown * 100.0);
    println!("Sharpe:         {:.3}", result.sharpe_ratio);
    println!(
        "Balance:        {:.2} -> {:.2}",
        result.initial_balance, result.final_balance
    );
    println!();
}
