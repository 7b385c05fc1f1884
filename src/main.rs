mod config;
mod error;
mod export;
mod loader;
mod models;
mod pipeline;
mod prompt;
mod sources;
mod transform;
mod utils;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::AppConfig;
use crate::error::EtlError;
use crate::loader::{group_by_symbol, load_finance_csv, symbol_stats};
use crate::models::{DateRange, DomainReport, ExportSummary, Interval};
use crate::pipeline::{ExportRequest, FinanceRequest, Pipeline, PipelineSettings};
use crate::sources::{AlphaVantageClient, FallbackPolicy, FinanceSource, OpenWeatherClient};
use crate::transform::parse_range_bound;
use crate::utils::{clean_list, clean_symbols};

#[derive(Parser)]
#[command(name = "wx-fin-etl", about = "Weather and stock time-series CSV export", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Report failed or unauthenticated fetches instead of substituting synthetic data
    #[arg(long, global = true, env = "ETL_STRICT")]
    strict: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Export current weather for a list of cities
    Weather {
        /// Comma-separated city names
        #[arg(short, long, value_delimiter = ',', required = true)]
        cities: Vec<String>,

        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Export daily or intraday price bars for a list of symbols
    Finance {
        /// Comma-separated ticker symbols
        #[arg(short, long, value_delimiter = ',', required = true)]
        symbols: Vec<String>,

        #[command(flatten)]
        range: FinanceArgs,

        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Export both weather and finance data
    Both {
        #[arg(short, long, value_delimiter = ',', required = true)]
        cities: Vec<String>,

        #[arg(short, long, value_delimiter = ',', required = true)]
        symbols: Vec<String>,

        #[command(flatten)]
        range: FinanceArgs,

        #[arg(long)]
        weather_out: Option<PathBuf>,

        #[arg(long)]
        finance_out: Option<PathBuf>,
    },

    /// Ask for the export interactively
    Prompt,

    /// Summarise an exported finance CSV per symbol
    Inspect {
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

#[derive(Args)]
struct FinanceArgs {
    #[arg(short, long, value_enum, default_value_t = Interval::Daily)]
    interval: Interval,

    /// Inclusive lower bound, YYYY-MM-DD
    #[arg(long, value_parser = parse_date_arg)]
    start: Option<chrono::NaiveDateTime>,

    /// Inclusive upper bound, YYYY-MM-DD
    #[arg(long, value_parser = parse_date_arg)]
    end: Option<chrono::NaiveDateTime>,
}

impl FinanceArgs {
    fn request(&self) -> FinanceRequest {
        FinanceRequest {
            interval: self.interval,
            range: DateRange { start: self.start, end: self.end },
        }
    }
}

fn parse_date_arg(s: &str) -> std::result::Result<chrono::NaiveDateTime, EtlError> {
    parse_range_bound(s)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "wx_fin_etl=info,warn",
        1 => "wx_fin_etl=debug,info",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().compact().with_target(false))
        .with(EnvFilter::new(filter))
        .init();

    let config = AppConfig::load()?;

    let request = match cli.command {
        Command::Weather { cities, out } => ExportRequest::Weather {
            cities: clean_list(&cities),
            out: out.unwrap_or_else(|| config.export.weather_path.clone()),
        },

        Command::Finance { symbols, range, out } => ExportRequest::Finance {
            symbols: clean_symbols(&symbols),
            request: range.request(),
            out: out.unwrap_or_else(|| config.export.finance_path.clone()),
        },

        Command::Both { cities, symbols, range, weather_out, finance_out } => ExportRequest::Both {
            cities: clean_list(&cities),
            symbols: clean_symbols(&symbols),
            request: range.request(),
            weather_out: weather_out.unwrap_or_else(|| config.export.weather_path.clone()),
            finance_out: finance_out.unwrap_or_else(|| config.export.finance_path.clone()),
        },

        Command::Prompt => {
            let stdin = std::io::stdin();
            let mut input = stdin.lock();
            let mut output = std::io::stdout();
            match prompt::read_request(&mut input, &mut output, &config.export) {
                Ok(request) => request,
                Err(e) => {
                    error!("{:#}", e);
                    return Ok(());
                }
            }
        }

        Command::Inspect { file } => {
            let path = file.unwrap_or_else(|| config.export.finance_path.clone());
            inspect(&path)?;
            return Ok(());
        }
    };

    let policy = FallbackPolicy::from_flag(config.fallback.synthetic && !cli.strict);
    let weather = OpenWeatherClient::new(&config.weather, policy)?;
    let finance = if config.finance.api_key.is_some() || policy == FallbackPolicy::Synthetic {
        Some(AlphaVantageClient::new(&config.finance, policy)?)
    } else {
        None
    };
    if !weather.has_credential() {
        info!("No OpenWeatherMap key configured");
    }
    if finance.as_ref().is_some_and(|f| !f.has_credential()) {
        info!("No Alpha Vantage key configured");
    }

    let pipeline = Pipeline::new(
        &weather,
        finance.as_ref().map(|f| f as &dyn FinanceSource),
        PipelineSettings::from_config(&config),
    );
    let summary = pipeline.run(&request).await?;
    print_summary(&summary);

    Ok(())
}

fn print_summary(summary: &ExportSummary) {
    let line = |label: &str, report: &Option<DomainReport>| match report {
        Some(r) => println!(
            "  {:<8}: {} rows ({} of {} items failed, {} synthetic)",
            label,
            utils::fmt_number(r.rows_written as i64),
            r.items_failed,
            r.items_requested,
            r.items_synthetic
        ),
        None => println!("  {:<8}: -", label),
    };

    println!("─────────────────────────────────");
    println!("  Export summary");
    println!("─────────────────────────────────");
    line("Weather", &summary.weather);
    line("Finance", &summary.finance);
    println!("─────────────────────────────────");
}

fn inspect(path: &std::path::Path) -> Result<()> {
    let groups = group_by_symbol(load_finance_csv(path)?);
    if groups.is_empty() {
        println!("No bars in {:?}; run `wx-fin-etl finance` first.", path);
        return Ok(());
    }

    println!("{} symbols:", groups.len());
    for (symbol, series) in &groups {
        if let Some(s) = symbol_stats(series) {
            println!(
                "  {:<6} {:>6} bars  {} → {}  last close {:.2}",
                symbol,
                utils::fmt_number(s.bars as i64),
                s.first,
                s.last,
                s.last_close
            );
        }
    }
    Ok(())
}
