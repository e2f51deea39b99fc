//! prasterblaster
//!
//! Reproject a GeoTIFF into another projection using several ranks that
//! write the output in parallel.

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use prasterblaster::{run_rank, RunRequest, ThreadGroup};
use reproject::{CoordinationError, PartitionStrategy, ReprojectConfig, Resampler};

/// Parallel raster reprojection
#[derive(Parser, Debug)]
#[command(name = "prasterblaster")]
#[command(about = "Reproject a GeoTIFF in parallel")]
struct Args {
    /// Input raster
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output raster
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Output projection (PROJ string or WKT)
    #[arg(long = "t_srs")]
    t_srs: String,

    /// Input projection, when the input file carries none or a wrong one
    #[arg(long = "s_srs")]
    s_srs: Option<String>,

    /// How the output is split: count, size, tile or quadtree
    #[arg(long)]
    partition_strategy: Option<PartitionStrategy>,

    /// Number of row bands for the count strategy (0: one per process)
    #[arg(long)]
    partition_count: Option<usize>,

    /// Pixels per partition for the size, tile and quadtree strategies
    #[arg(long)]
    partition_size: Option<u64>,

    /// Tile edge in pixels for the tile strategy
    #[arg(long)]
    tile_size: Option<u64>,

    /// Resampler: nearest, min, max or mean
    #[arg(long)]
    resampler: Option<Resampler>,

    /// Value written where no input pixel maps
    #[arg(long)]
    fill_value: Option<f64>,

    /// Output pixel size in target units
    #[arg(long)]
    pixel_size: Option<f64>,

    /// Number of ranks
    #[arg(short = 'n', long)]
    processes: Option<usize>,

    /// Log level
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Write a JSON run report here
    #[arg(long)]
    report: Option<PathBuf>,
}

impl Args {
    /// Environment configuration with command-line overrides applied.
    fn config(&self) -> Result<ReprojectConfig> {
        let mut config =
            ReprojectConfig::from_env().context("invalid environment configuration")?;
        if let Some(strategy) = self.partition_strategy {
            config.partition_strategy = strategy;
        }
        if let Some(count) = self.partition_count {
            config.partition_count = count;
        }
        if let Some(size) = self.partition_size {
            config.partition_size = size;
        }
        if let Some(size) = self.tile_size {
            config.tile_size = size;
        }
        if let Some(resampler) = self.resampler {
            config.resampler = resampler;
        }
        if let Some(fill) = self.fill_value {
            config.fill_value = fill;
        }
        if let Some(size) = self.pixel_size {
            config.pixel_size = Some(size);
        }
        if let Some(processes) = self.processes {
            config.processes = processes;
        }
        config.validate().map_err(|e| anyhow!(e)).context("invalid configuration")?;
        Ok(config)
    }
}

fn is_abort(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        matches!(
            cause.downcast_ref::<CoordinationError>(),
            Some(CoordinationError::Aborted(_))
        )
    })
}

fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    let subscriber = fmt().with_env_filter(filter).with_target(true).with_level(true);
    if args.json_logs {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    let config = args.config()?;
    info!(
        input = %args.input.display(),
        output = %args.output.display(),
        processes = config.processes,
        strategy = %config.partition_strategy,
        resampler = %config.resampler,
        "Starting prasterblaster"
    );

    let request = RunRequest {
        input: args.input.clone(),
        output: args.output.clone(),
        source_srs: args.s_srs.clone(),
        target_srs: args.t_srs.clone(),
        config,
    };

    let mut report = None;
    let mut failures = Vec::new();
    for (rank, outcome) in ThreadGroup::run(request.config.processes, |c| run_rank(&request, c))
        .into_iter()
        .enumerate()
    {
        match outcome {
            Ok(Ok(Some(r))) => report = Some(r),
            Ok(Ok(None)) => {}
            Ok(Err(err)) => failures.push((is_abort(&err), format!("rank {rank}: {err:#}"))),
            Err(_) => failures.push((false, format!("rank {rank} panicked"))),
        }
    }
    // Ranks that only saw the abort sort after the one that caused it.
    failures.sort_by_key(|(aborted, _)| *aborted);
    if let Some((_, cause)) = failures.into_iter().next() {
        return Err(anyhow!(cause));
    }

    let report = report.ok_or_else(|| anyhow!("root rank produced no report"))?;
    if let Some(path) = &args.report {
        report
            .write_json(path)
            .with_context(|| format!("failed to write report {}", path.display()))?;
        info!(path = %path.display(), "Report written");
    }
    Ok(())
}
