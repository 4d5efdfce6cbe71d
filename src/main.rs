//! Stability Harness binary entry point.
//!
//! Runs a workload against a simulated backend and prints the report.
//! All logs go to stderr; stdout is reserved for the report.
//!
//! Exit codes: 0 for PASS, 2 for WARNING, 1 for FAIL or any error.

// Enable the coverage attribute when running with nightly for llvm-cov exclusions
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use stability_harness::backends::{simulated_client, BackendKind, SimulationProfile};
use stability_harness::config::{load_threshold_overrides, validate_config, Config};
use stability_harness::driver::{DriverConfig, WorkloadDriver};
use stability_harness::error::AppError;
use stability_harness::evaluator::{StabilityEvaluator, ThresholdOverrides};
use stability_harness::metrics::MetricsCollector;
use stability_harness::report::{reporter_for, write_report_file, OutputFormat};

#[derive(Parser)]
#[command(name = "stability-harness", version)]
#[command(about = "Measure and grade backend stability under a synthetic workload", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a workload and report the verdict
    Run(RunArgs),
    /// Print the effective threshold table as JSON
    Thresholds {
        /// Backend preset
        #[arg(long)]
        backend: Option<BackendKind>,
        /// JSON overrides file merged onto the preset
        #[arg(long)]
        thresholds: Option<PathBuf>,
    },
}

/// Flags for `run`; each one overrides its `HARNESS_*` variable.
#[derive(Args, Default)]
struct RunArgs {
    /// Backend flavor (redis or kafka)
    #[arg(long)]
    backend: Option<BackendKind>,
    /// Backend host
    #[arg(long)]
    host: Option<String>,
    /// Backend port
    #[arg(long)]
    port: Option<u16>,
    /// Run duration in seconds
    #[arg(long)]
    duration: Option<u64>,
    /// Operation budget
    #[arg(long)]
    operations: Option<u64>,
    /// Report format (text, json or markdown)
    #[arg(long)]
    format: Option<OutputFormat>,
    /// Write the report to this file instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
    /// JSON threshold overrides file
    #[arg(long)]
    thresholds: Option<PathBuf>,
    /// Fail every Nth operation with a network error
    #[arg(long, value_name = "N")]
    fault_every: Option<u64>,
    /// Acknowledge but drop every Nth write
    #[arg(long, value_name = "N")]
    drop_every: Option<u64>,
    /// Simulated latency per operation in milliseconds
    #[arg(long, value_name = "MS")]
    latency_ms: Option<u64>,
}

impl RunArgs {
    /// Apply flags on top of the environment configuration.
    fn apply(&self, mut config: Config) -> Result<Config, AppError> {
        if let Some(backend) = self.backend {
            if backend != config.backend && std::env::var("HARNESS_PORT").is_err() {
                config.port = backend.default_port();
            }
            config.backend = backend;
        }
        if let Some(host) = &self.host {
            config.host.clone_from(host);
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(duration) = self.duration {
            config.duration_secs = duration;
        }
        if let Some(operations) = self.operations {
            config.operations = operations;
        }
        if let Some(format) = self.format {
            config.output_format = format;
        }
        if self.output.is_some() {
            config.output_path.clone_from(&self.output);
        }
        if self.thresholds.is_some() {
            config.thresholds_path.clone_from(&self.thresholds);
        }
        validate_config(&config)?;
        Ok(config)
    }

    fn profile(&self) -> SimulationProfile {
        let mut profile = SimulationProfile::default()
            .with_fail_every(self.fault_every.unwrap_or(0))
            .with_drop_every(self.drop_every.unwrap_or(0));
        if let Some(ms) = self.latency_ms {
            profile = profile.with_latency(Duration::from_millis(ms));
        }
        profile
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();
    let code = match cli.command {
        Commands::Run(args) => run(&args).await,
        Commands::Thresholds {
            backend,
            thresholds,
        } => print_thresholds(backend, thresholds.as_deref()),
    };

    match code {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            tracing::error!("{e}");
            std::process::exit(1);
        }
    }
}

/// Initialize logging to stderr only (stdout is for the report).
fn init_tracing() {
    let filter = std::env::var("LOG_LEVEL")
        .unwrap_or_else(|_| "info".to_string())
        .parse()
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run(args: &RunArgs) -> Result<i32, AppError> {
    let config = args.apply(Config::from_env()?)?;
    tracing::info!(
        backend = %config.backend,
        endpoint = %config.endpoint(),
        duration_secs = config.duration_secs,
        operations = config.operations,
        "Configuration loaded"
    );

    let overrides = match &config.thresholds_path {
        Some(path) => load_threshold_overrides(path)?,
        None => ThresholdOverrides::default(),
    };
    let evaluator = StabilityEvaluator::for_backend(config.backend, &overrides)?;

    let driver = WorkloadDriver::new(DriverConfig::new(
        config.backend,
        config.duration(),
        config.operations,
    ))?;
    let client = simulated_client(
        config.backend,
        config.endpoint(),
        args.profile(),
        config.password.clone(),
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, stopping workload");
            let _ = shutdown_tx.send(true);
        }
    });

    let collector = MetricsCollector::new();
    let summary = driver.run(client.as_ref(), &collector, shutdown_rx).await?;
    let evaluation = evaluator.evaluate_for(config.backend, &summary.metrics);

    tracing::info!(
        stop_reason = %summary.stop_reason,
        score = evaluation.score,
        grade = %evaluation.grade,
        status = %evaluation.status,
        "Evaluation complete"
    );

    let reporter = reporter_for(config.output_format);
    match &config.output_path {
        Some(path) => write_report_file(reporter.as_ref(), &summary.metrics, &evaluation, path)?,
        None => {
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            reporter.generate_report(&summary.metrics, &evaluation, &mut out)?;
            out.flush().map_err(stability_harness::error::ReportError::from)?;
        }
    }

    Ok(evaluation.status.exit_code())
}

fn print_thresholds(
    backend: Option<BackendKind>,
    path: Option<&std::path::Path>,
) -> Result<i32, AppError> {
    let backend = backend.unwrap_or_default();
    let overrides = match path {
        Some(path) => load_threshold_overrides(path)?,
        None => ThresholdOverrides::default(),
    };
    let evaluator = StabilityEvaluator::for_backend(backend, &overrides)?;

    let table = serde_json::to_string_pretty(&evaluator.thresholds().to_overrides())
        .map_err(stability_harness::error::ReportError::from)?;
    println!("{table}");
    Ok(0)
}
