//! Thanos Resource Calculator CLI
//!
//! Sizes a Thanos ingestion and query pipeline from a workload description.
//! Calculations run in-process by default, or against a calculator service
//! when an API URL is configured.

mod client;
mod commands;
mod config;
mod output;

use anyhow::{Context, Result};
use calculator_lib::{
    CollectorProfile, PerformanceMode, QueryComplexity, SizingConfig, StorageProfile,
    WorkloadProfile,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use commands::{calibration, plan, storage, Backend};
use std::path::PathBuf;

/// Thanos Resource Calculator CLI
#[derive(Parser)]
#[command(name = "trc")]
#[command(author, version, about = "CLI for the Thanos Resource Calculator", long_about = None)]
pub struct Cli {
    /// Calculator API URL; calculations run locally when unset
    #[arg(long, env = "TRC_API_URL")]
    pub api_url: Option<String>,

    /// JSON calibration override for local calculations
    #[arg(long, env = "TRC_CALIBRATION")]
    pub calibration: Option<PathBuf>,

    /// Output format
    #[arg(long, short)]
    pub format: Option<output::OutputFormat>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Size every component of the pipeline
    Plan(WorkloadArgs),

    /// Size the receive, compact, store and query pool without the collector
    Pool(WorkloadArgs),

    /// Size the collector alone
    Collector {
        #[command(flatten)]
        ingest: IngestArgs,

        #[command(flatten)]
        performance: PerformanceArgs,
    },

    /// Estimate long-term object storage
    Storage {
        /// Active series
        #[arg(long, short)]
        series: u64,

        #[command(flatten)]
        retention: RetentionArgs,
    },

    /// Show the calibration in effect
    Calibration,
}

#[derive(Args, Debug, Clone)]
pub struct IngestArgs {
    /// Active series
    #[arg(long, short)]
    pub series: u64,

    /// Scrape interval in seconds
    #[arg(long, short, default_value_t = 30)]
    pub interval: u32,
}

#[derive(Args, Debug, Clone)]
pub struct PerformanceArgs {
    /// Performance mode preset
    #[arg(long, default_value = "balanced", conflicts_with = "perf_factor")]
    pub mode: PerformanceMode,

    /// Explicit performance factor in [1.0, 2.0], overrides --mode
    #[arg(long)]
    pub perf_factor: Option<f64>,
}

impl PerformanceArgs {
    fn factor(&self) -> f64 {
        self.perf_factor.unwrap_or_else(|| self.mode.factor())
    }
}

#[derive(Args, Debug, Clone)]
pub struct RetentionArgs {
    /// Raw block retention in days
    #[arg(long = "ret-raw-days", default_value_t = 14)]
    pub raw_days: u32,

    /// 5m downsampled retention in days
    #[arg(long = "ret-5m-days", default_value_t = 30)]
    pub downsample_5m_days: u32,

    /// 1h downsampled retention in days
    #[arg(long = "ret-1h-days", default_value_t = 90)]
    pub downsample_1h_days: u32,
}

#[derive(Args, Debug, Clone)]
pub struct WorkloadArgs {
    #[command(flatten)]
    pub ingest: IngestArgs,

    /// Query rate in queries per second
    #[arg(long, default_value_t = 10.0)]
    pub qps: f64,

    #[command(flatten)]
    pub performance: PerformanceArgs,

    /// Query complexity preset
    #[arg(long, default_value = "medium", conflicts_with = "complexity_bytes")]
    pub complexity: QueryComplexity,

    /// Explicit per-query memory in bytes, overrides --complexity
    #[arg(long)]
    pub complexity_bytes: Option<u64>,

    /// Local retention on the ingestors in hours
    #[arg(long, default_value_t = 6)]
    pub local_hours: u32,

    #[command(flatten)]
    pub retention: RetentionArgs,
}

impl WorkloadArgs {
    fn profile(&self) -> WorkloadProfile {
        WorkloadProfile {
            active_series: self.ingest.series,
            scrape_interval_secs: self.ingest.interval,
            query_rate: self.qps,
            performance_factor: self.performance.factor(),
            query_complexity_bytes: self
                .complexity_bytes
                .unwrap_or_else(|| self.complexity.bytes()),
            local_retention_hours: self.local_hours,
            raw_retention_days: self.retention.raw_days,
            downsample_5m_retention_days: self.retention.downsample_5m_days,
            downsample_1h_retention_days: self.retention.downsample_1h_days,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let file_config = config::Config::load()?;

    let format = match cli.format {
        Some(format) => format,
        None => file_config
            .default_format
            .as_deref()
            .map(|name| output::OutputFormat::from_str(name, true))
            .transpose()
            .map_err(|e| anyhow::anyhow!("Invalid default_format in config: {}", e))?
            .unwrap_or_default(),
    };

    let api_url = cli.api_url.or(file_config.api_url);
    let calibration_file = cli.calibration.or(file_config.calibration_file);

    let backend = match api_url {
        Some(url) => {
            if calibration_file.is_some() {
                output::print_warning("Calibration file is ignored when an API URL is set");
            }
            Backend::Remote(client::ApiClient::new(&url)?)
        }
        None => {
            let sizing = match &calibration_file {
                Some(path) => SizingConfig::from_json_file(path).with_context(|| {
                    format!("Could not load calibration {}", path.display())
                })?,
                None => SizingConfig::default(),
            };
            Backend::Local(Box::new(sizing))
        }
    };

    match cli.command {
        Commands::Plan(args) => {
            plan::run_plan(&backend, &args.profile(), format).await?;
        }
        Commands::Pool(args) => {
            plan::run_pool(&backend, &args.profile(), format).await?;
        }
        Commands::Collector {
            ingest,
            performance,
        } => {
            let profile = CollectorProfile {
                active_series: ingest.series,
                scrape_interval_secs: ingest.interval,
                performance_factor: performance.factor(),
            };
            plan::run_collector(&backend, &profile, format).await?;
        }
        Commands::Storage { series, retention } => {
            let profile = StorageProfile {
                active_series: series,
                raw_retention_days: retention.raw_days,
                downsample_5m_retention_days: retention.downsample_5m_days,
                downsample_1h_retention_days: retention.downsample_1h_days,
            };
            storage::run_storage(&backend, &profile, format).await?;
        }
        Commands::Calibration => {
            calibration::show_calibration(&backend, format).await?;
        }
    }

    Ok(())
}
