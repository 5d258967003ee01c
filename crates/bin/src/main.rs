//! Lastro CLI binary.
//!
//! Resolves proxies, backtests portfolios and produces the structural
//! analysis and report for a proposal document.

mod cache_manager;
mod config;
mod logging;
mod render;

use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use lastro::{Proposal, holdings_from_path};
use lastro_analytics::{ExportFormat, Exporter, LiquidityTable, ReportBuilder, analyze};
use lastro_backtest::{Backtester, Window};
use lastro_data::{
    FixedPriceSource, FixedRateSource, GatewayConfig, MarketDataGateway, NoopCache, SeriesCache,
    SqliteCache,
};
use lastro_holdings::resolve;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Parser)]
#[command(name = "lastro")]
#[command(about = "Lastro: portfolio analytics and backtests for proposals", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Gateway config file (JSON); defaults to <config dir>/lastro/config.json
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More logging (-v info, -vv debug, -vvv trace); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Args, Debug, Clone)]
struct DataArgs {
    /// Disable caching (always fetch fresh data)
    #[arg(long)]
    no_cache: bool,

    /// Force refresh cached data
    #[arg(long)]
    refresh: bool,

    /// Never touch the network: synthetic CDI and category fallbacks only
    #[arg(long)]
    offline: bool,

    /// Windows in months, comma separated (6,12,24,36,60); all by default
    #[arg(long, value_delimiter = ',')]
    windows: Vec<Window>,

    /// Reference date (YYYY-MM-DD); today by default
    #[arg(long)]
    as_of: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Json,
    Text,
}

/// A single table of the structural analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Table {
    Allocation,
    Concentration,
    Classification,
    Liquidity,
    Maturity,
    Tax,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
enum CacheAction {
    /// Show the cache location and size
    Info,
    /// Delete entries older than the configured TTL
    Purge,
    /// Delete every entry
    Clear,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the return proxy chosen for each holding
    Resolve {
        /// JSON list of holding records
        holdings: PathBuf,

        /// Output format (json or text)
        #[arg(long, value_enum, default_value_t = Format::Json)]
        format: Format,
    },

    /// Backtest a single portfolio
    Backtest {
        /// JSON list of holding records
        holdings: PathBuf,

        #[command(flatten)]
        data: DataArgs,

        /// Output format (json or text)
        #[arg(long, value_enum, default_value_t = Format::Json)]
        format: Format,
    },

    /// Backtest the current and proposed portfolios of a proposal
    Compare {
        /// Proposal document
        proposal: PathBuf,

        #[command(flatten)]
        data: DataArgs,

        /// Output format (json or text)
        #[arg(long, value_enum, default_value_t = Format::Json)]
        format: Format,
    },

    /// Structural analysis of a proposal (no market data)
    Analyze {
        /// Proposal document
        proposal: PathBuf,

        /// Fund liquidity table (CSV)
        #[arg(long)]
        liquidity: Option<PathBuf>,

        /// Reference date (YYYY-MM-DD); today by default
        #[arg(long)]
        as_of: Option<NaiveDate>,

        /// Export one table instead of the whole analysis
        #[arg(long, value_enum)]
        table: Option<Table>,

        /// Export format (json, pretty or csv)
        #[arg(long, default_value = "pretty")]
        export: ExportFormat,

        /// Write to a file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Full report: structural analysis plus backtest comparison
    Report {
        /// Proposal document
        proposal: PathBuf,

        #[command(flatten)]
        data: DataArgs,

        /// Fund liquidity table (CSV)
        #[arg(long)]
        liquidity: Option<PathBuf>,

        /// Skip the backtest comparison
        #[arg(long)]
        skip_backtest: bool,

        /// Export format (json or pretty)
        #[arg(long, default_value = "pretty")]
        export: ExportFormat,

        /// Write to a file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Inspect or maintain the market data cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    let gateway_config = config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Resolve { holdings, format } => {
            resolve_proxies(&holdings, format)?;
        }
        Commands::Backtest {
            holdings,
            data,
            format,
        } => {
            let holdings = holdings_from_path(&holdings)?;
            let gateway = gateway(gateway_config, &data)?;
            let pb = spinner(format!("Backtesting {} holdings...", holdings.len()));
            let outcome = Backtester::new(&gateway)
                .run(&holdings, &data.windows, as_of(data.as_of))
                .await;
            pb.finish_and_clear();
            match format {
                Format::Json => println!("{}", serde_json::to_string_pretty(&outcome)?),
                Format::Text => print!("{}", render::backtest("PORTFOLIO BACKTEST", &outcome)?),
            }
        }
        Commands::Compare {
            proposal,
            data,
            format,
        } => {
            let proposal = Proposal::from_path(&proposal)?;
            let gateway = gateway(gateway_config, &data)?;
            let pb = spinner("Backtesting current and proposed portfolios...".to_string());
            let comparison = Backtester::new(&gateway)
                .compare(
                    &proposal.current,
                    &proposal.proposed,
                    &data.windows,
                    as_of(data.as_of),
                )
                .await;
            pb.finish_and_clear();
            match format {
                Format::Json => println!("{}", serde_json::to_string_pretty(&comparison)?),
                Format::Text => print!("{}", render::comparison(&comparison)?),
            }
        }
        Commands::Analyze {
            proposal,
            liquidity,
            as_of: date,
            table,
            export,
            output,
        } => {
            let proposal = Proposal::from_path(&proposal)?;
            let table_data = liquidity_table(liquidity.as_deref())?;
            let analysis = analyze(
                &proposal.current,
                &proposal.proposed,
                proposal.model.as_deref(),
                &table_data,
                as_of(date),
            );
            let target: &dyn Exporter = match table {
                None => &analysis,
                Some(Table::Allocation) => &analysis.allocation,
                Some(Table::Concentration) => &analysis.concentration,
                Some(Table::Classification) => &analysis.classification,
                Some(Table::Liquidity) => &analysis.liquidity,
                Some(Table::Maturity) => &analysis.maturity,
                Some(Table::Tax) => &analysis.tax,
            };
            emit(target, export, output.as_deref())?;
        }
        Commands::Report {
            proposal,
            data,
            liquidity,
            skip_backtest,
            export,
            output,
        } => {
            let proposal = Proposal::from_path(&proposal)?;
            let date = as_of(data.as_of);
            let mut builder = ReportBuilder::new()
                .as_of(date)
                .liquidity_table(liquidity_table(liquidity.as_deref())?);
            if let Some(client) = &proposal.client {
                builder = builder.client(client.clone());
            }
            if let Some(model) = &proposal.model {
                builder = builder.model(model.clone());
            }
            if !skip_backtest {
                let gateway = gateway(gateway_config, &data)?;
                let pb = spinner("Backtesting current and proposed portfolios...".to_string());
                let comparison = Backtester::new(&gateway)
                    .compare(&proposal.current, &proposal.proposed, &data.windows, date)
                    .await;
                pb.finish_and_clear();
                builder = builder.comparison(comparison);
            }
            let report = builder
                .current(proposal.current)
                .proposed(proposal.proposed)
                .build()?;
            emit(&report, export, output.as_deref())?;
        }
        Commands::Cache { action } => {
            let cache = SqliteCache::new(cache_manager::default_cache_path())?
                .with_ttl_secs(gateway_config.cache_ttl_secs);
            match action {
                CacheAction::Info => {}
                CacheAction::Purge => {
                    eprintln!("Purged {} expired entries", cache.purge_expired()?);
                }
                CacheAction::Clear => {
                    cache.clear()?;
                    eprintln!("Cache cleared");
                }
            }
            println!("{}", cache_manager::describe(&cache));
        }
    }

    Ok(())
}

fn resolve_proxies(path: &Path, format: Format) -> Result<(), Box<dyn std::error::Error>> {
    let holdings = holdings_from_path(path)?;
    let resolved: Vec<_> = holdings.iter().map(|h| (h, resolve(h))).collect();
    match format {
        Format::Json => {
            let rows: Vec<_> = resolved
                .iter()
                .map(|(h, r)| json!({"name": h.name, "proxy": r.proxy, "rule": r.rule}))
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        Format::Text => print!("{}", render::proxies(&resolved)?),
    }
    Ok(())
}

/// Gateway on the live sources, or on empty in-memory ones with `--offline`.
fn gateway(
    config: GatewayConfig,
    data: &DataArgs,
) -> Result<MarketDataGateway, Box<dyn std::error::Error>> {
    let cache: Arc<dyn SeriesCache> = if data.no_cache {
        eprintln!("Cache: Disabled");
        Arc::new(NoopCache)
    } else {
        let cache = cache_manager::open_cache(config.cache_ttl_secs)?;
        if data.refresh {
            cache.clear()?;
            info!("cache cleared");
        }
        eprintln!("{}", cache_manager::describe(&cache));
        Arc::new(cache)
    };

    if data.offline {
        return Ok(MarketDataGateway::new(
            Arc::new(FixedRateSource::default()),
            Arc::new(FixedPriceSource::new()),
            cache,
            config,
        ));
    }
    Ok(MarketDataGateway::connect(config, cache)?)
}

fn liquidity_table(path: Option<&Path>) -> Result<LiquidityTable, Box<dyn std::error::Error>> {
    let Some(path) = path else {
        return Ok(LiquidityTable::default());
    };
    let table = LiquidityTable::from_path(path)?;
    info!(path = %path.display(), funds = table.len(), "loaded liquidity table");
    Ok(table)
}

fn emit(
    target: &dyn Exporter,
    format: ExportFormat,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    match output {
        Some(path) => {
            target.export_to_file(path, format)?;
            eprintln!("Wrote {}", path.display());
        }
        None => println!("{}", target.export_to_string(format)?),
    }
    Ok(())
}

fn as_of(date: Option<NaiveDate>) -> NaiveDate {
    date.unwrap_or_else(|| Local::now().date_naive())
}

fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(message);
    pb
}
