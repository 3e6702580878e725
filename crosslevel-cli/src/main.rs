//! Crosslevel CLI: trend signals, support/resistance levels and strategy intents.
//!
//! Commands:
//! - `analyze`: full report for one or more instruments
//! - `signals`: semaphores, recent crossover verdict, composite score and trend
//! - `pivots`: support/resistance levels from clustered pivot markers
//! - `strategy`: entry/exit intents for an external execution engine
//! - `returns`: month-over-month close returns as a year × month grid
//! - `features`: indicator feature table as CSV or JSON

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::{debug, error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crosslevel_core::signals::Signal;
use crosslevel_runner::{
    AnalysisConfig, AnalysisReport, Analyzer, BarSource, CsvBarSource, FileCache, NoCache,
    ResultCache, SyntheticSource,
};

#[derive(Parser)]
#[command(
    name = "crosslevel",
    about = "Crosslevel CLI: EMA crossover signals and support/resistance levels"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Debug-level logging (overridden by RUST_LOG).
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    /// Emit logs as JSON lines on stderr.
    #[arg(long, global = true, default_value_t = false)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Full analysis report for one or more instruments.
    Analyze {
        #[command(flatten)]
        target: Target,

        /// Print the report as JSON instead of a summary.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Semaphores, recent crossover verdict, composite score and trend.
    Signals {
        #[command(flatten)]
        target: Target,
    },
    /// Support/resistance levels from clustered pivots.
    Pivots {
        #[command(flatten)]
        target: Target,
    },
    /// Entry/exit intents from the crossover/oscillator strategy.
    Strategy {
        #[command(flatten)]
        target: Target,
    },
    /// Month-over-month close returns by year.
    Returns {
        #[command(flatten)]
        target: Target,
    },
    /// Indicator feature table for model training.
    Features {
        #[command(flatten)]
        target: Target,

        #[arg(long, value_enum, default_value_t = FeatureFormat::Csv)]
        format: FeatureFormat,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum FeatureFormat {
    Csv,
    Json,
}

/// Where the bars come from and which range to analyze.
#[derive(Args)]
struct Target {
    /// Path to a TOML analysis config.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Instrument symbol. Overrides the config; repeat for `analyze` to run several in parallel.
    #[arg(long)]
    instrument: Vec<String>,

    /// Start date (YYYY-MM-DD). Defaults to two years before the end date.
    #[arg(long)]
    start: Option<String>,

    /// End date (YYYY-MM-DD). Defaults to today.
    #[arg(long)]
    end: Option<String>,

    /// Directory of `<INSTRUMENT>.csv` files. Defaults to ./data.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Use seeded synthetic bars instead of CSV data.
    #[arg(long, default_value_t = false)]
    synthetic: bool,

    /// Fail when fewer bars than this are available.
    #[arg(long, default_value_t = 1)]
    min_bars: usize,

    /// Directory for cached results, one JSON file per entry.
    #[arg(long, default_value = ".crosslevel/cache")]
    cache_dir: PathBuf,

    /// Recompute without reading or writing cached results.
    #[arg(long, default_value_t = false)]
    no_cache: bool,

    /// Write output to this file instead of stdout.
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_json);

    match cli.command {
        Commands::Analyze { target, json } => run_analyze(&target, json),
        Commands::Signals { target } => {
            let config = target.single_config()?;
            emit_json(&target.analyzer()?.signals(&config)?, target.output.as_deref())
        }
        Commands::Pivots { target } => {
            let config = target.single_config()?;
            emit_json(&target.analyzer()?.pivots(&config)?, target.output.as_deref())
        }
        Commands::Strategy { target } => {
            let config = target.single_config()?;
            emit_json(&target.analyzer()?.strategy(&config)?, target.output.as_deref())
        }
        Commands::Returns { target } => {
            let config = target.single_config()?;
            emit_json(&target.analyzer()?.monthly_returns(&config)?, target.output.as_deref())
        }
        Commands::Features { target, format } => run_features(&target, format),
    }
}

fn init_logging(verbose: bool, json: bool) {
    let default = if verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // stdout carries command output; logs go to stderr.
    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_target(true).with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
}

impl Target {
    /// One config per requested instrument, all sharing the same settings.
    fn configs(&self) -> Result<Vec<AnalysisConfig>> {
        let start = parse_date(self.start.as_deref())?;
        let end = parse_date(self.end.as_deref())?;

        let mut base = match &self.config {
            Some(path) => AnalysisConfig::from_file(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => {
                let Some(first) = self.instrument.first() else {
                    bail!("one of --config or --instrument is required");
                };
                let end = end.unwrap_or_else(|| chrono::Local::now().date_naive());
                let start = start.unwrap_or(end - chrono::Duration::days(730));
                AnalysisConfig::new(first.clone(), start, end)
            }
        };
        if let Some(start) = start {
            base.analysis.start_date = start;
        }
        if let Some(end) = end {
            base.analysis.end_date = end;
        }

        let instruments = if self.instrument.is_empty() {
            vec![base.analysis.instrument.clone()]
        } else {
            self.instrument.clone()
        };

        instruments
            .into_iter()
            .map(|instrument| -> Result<AnalysisConfig> {
                let mut config = base.clone();
                config.analysis.instrument = instrument;
                config.validate()?;
                Ok(config)
            })
            .collect()
    }

    fn single_config(&self) -> Result<AnalysisConfig> {
        let mut configs = self.configs()?;
        if configs.len() != 1 {
            bail!("this command takes a single --instrument, got {}", configs.len());
        }
        Ok(configs.remove(0))
    }

    fn analyzer(&self) -> Result<Analyzer> {
        if self.synthetic && self.data_dir.is_some() {
            bail!("--synthetic and --data-dir are mutually exclusive");
        }
        let source: Arc<dyn BarSource> = if self.synthetic {
            Arc::new(SyntheticSource::new())
        } else {
            let dir = self.data_dir.clone().unwrap_or_else(|| PathBuf::from("data"));
            if !dir.is_dir() {
                bail!("data directory does not exist: {}", dir.display());
            }
            Arc::new(CsvBarSource::new(dir))
        };
        let cache: Arc<dyn ResultCache> = if self.no_cache {
            Arc::new(NoCache)
        } else {
            let cache = FileCache::new(&self.cache_dir);
            let purged = cache.purge_expired();
            if purged > 0 {
                debug!(purged, dir = %self.cache_dir.display(), "removed expired cache entries");
            }
            Arc::new(cache)
        };
        Ok(Analyzer::new(source, cache).with_min_history(self.min_bars))
    }
}

fn parse_date(value: Option<&str>) -> Result<Option<NaiveDate>> {
    value
        .map(|s| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .with_context(|| format!("invalid date '{s}', expected YYYY-MM-DD"))
        })
        .transpose()
}

fn run_analyze(target: &Target, json: bool) -> Result<()> {
    let configs = target.configs()?;
    let analyzer = target.analyzer()?;

    if let [config] = configs.as_slice() {
        let report = analyzer.analyze(config)?;
        if json || target.output.is_some() {
            return emit_json(&report, target.output.as_deref());
        }
        print_summary(&report);
        return Ok(());
    }

    info!(instruments = configs.len(), "analyzing in parallel");
    let mut reports = Vec::new();
    let mut failed = 0usize;
    for (config, result) in configs.iter().zip(analyzer.analyze_many(&configs)) {
        match result {
            Ok(report) => reports.push(report),
            Err(e) => {
                failed += 1;
                error!(instrument = %config.analysis.instrument, error = %e, "analysis failed");
            }
        }
    }

    if json || target.output.is_some() {
        emit_json(&reports, target.output.as_deref())?;
    } else {
        for report in &reports {
            print_summary(report);
        }
    }
    if failed > 0 {
        bail!("{failed} of {} instrument(s) failed", configs.len());
    }
    Ok(())
}

fn run_features(target: &Target, format: FeatureFormat) -> Result<()> {
    let config = target.single_config()?;
    let table = target.analyzer()?.features(&config)?;

    match format {
        FeatureFormat::Json => emit_json(&table, target.output.as_deref()),
        FeatureFormat::Csv => {
            match &target.output {
                Some(path) => {
                    let file = std::fs::File::create(path)
                        .with_context(|| format!("failed to create {}", path.display()))?;
                    table.write_csv(file)?;
                    println!("Features saved to: {}", path.display());
                }
                None => table.write_csv(std::io::stdout().lock())?,
            }
            Ok(())
        }
    }
}

fn emit_json<T: Serialize>(value: &T, output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    match output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Saved to: {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{json}")?;
        }
    }
    Ok(())
}

fn signal_label(signal: Signal) -> &'static str {
    match signal {
        Signal::Bullish => "bullish",
        Signal::Bearish => "bearish",
        Signal::Neutral => "neutral",
    }
}

fn print_summary(report: &AnalysisReport) {
    println!();
    println!("=== {} ===", report.instrument);
    println!(
        "Range:          {} to {} ({} bars)",
        report.start_date, report.end_date, report.bar_count
    );
    println!("Source:         {}", report.source);
    if report.synthetic {
        println!("WARNING:        synthetic data, not market prices");
    }

    println!();
    println!("--- Semaphores ---");
    for s in &report.signals.semaphores {
        println!(
            "{:<8} EMA{:>3}/{:<3} {}",
            s.name,
            s.short_span,
            s.long_span,
            signal_label(s.signal)
        );
    }

    println!();
    println!("--- Signals ---");
    println!(
        "Crossovers:     {:?} {:?}",
        report.signals.crossover_setup, report.signals.verdict
    );
    match &report.signals.composite {
        Some(c) => println!("Composite:      {:.1} (raw {:+.2})", c.score, c.raw),
        None => println!("Composite:      n/a"),
    }
    println!("Trend:          {:?}", report.signals.trend);
    if let Some(chart) = &report.signals.chart {
        println!("Chart:          {} candles (JSON output)", chart.candles.len());
    }
    match report.signals.latest_rsi {
        Some(rsi) => println!("RSI:            {rsi:.1}"),
        None => println!("RSI:            n/a"),
    }

    println!();
    println!("--- Pivots ---");
    println!(
        "Window:         {} bars, {} markers, tolerance {:.4}{}",
        report.pivots.window_bars,
        report.pivots.markers,
        report.pivots.limit,
        if report.pivots.limit_fallback { " (fallback)" } else { "" }
    );
    for level in &report.pivots.levels {
        println!(
            "{:<10} {:>12.4}  {}",
            format!("{:?}", level.kind),
            level.level,
            level.timestamp.date()
        );
    }

    println!();
    println!("--- Strategy ---");
    println!(
        "Entries/exits:  {}/{}",
        report.strategy.entries, report.strategy.exits
    );
    println!("Final state:    {:?}", report.strategy.final_state);
}
