//! Drive Health Advisor
//!
//! Assess the drives of this host once from the command line, or serve the
//! REST API with periodic assessment passes.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use drive_health_advisor::{
    service::assess_parallel, ApiServer, ApiServerConfig, AssessmentEngine, AssessmentMetrics,
    AssessorConfig, DiagnosticSource, DiagnosticSourceRef, EngineConfig, Error, FileSource,
    HostAssessor, HostReport, PredictionMode, Result, SmartctlNormalizer, SmartctlSource,
};

// =============================================================================
// CLI Arguments
// =============================================================================

/// Drive Health Advisor - risk tiers and replacement timelines for host drives
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Engine configuration file (YAML)
    #[arg(long, env = "DRIVE_HEALTH_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Prediction mode (conservative, aggressive); overrides the config file
    #[arg(long, env = "PREDICTION_MODE", global = true)]
    mode: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info", global = true)]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON", global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Assess devices once and print the report
    Assess {
        /// Normalized records (JSON or YAML); runs smartctl when omitted
        file: Option<PathBuf>,

        /// Treat FILE as raw `smartctl -a -j` output for a single device
        #[arg(long)]
        smartctl_json: bool,

        /// Output format
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Serve the REST API with periodic assessment
    Serve {
        /// REST API bind address
        #[arg(long, env = "API_ADDR", default_value = "0.0.0.0:8090")]
        api_addr: String,

        /// Normalized records file to assess instead of running smartctl
        #[arg(long, env = "RECORDS_FILE")]
        records: Option<PathBuf>,

        /// smartctl binary
        #[arg(long, env = "SMARTCTL_BIN", default_value = "smartctl")]
        smartctl: String,

        /// Seconds between assessment passes
        #[arg(long, env = "ASSESS_INTERVAL", default_value = "300")]
        interval_secs: u64,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Table,
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args);

    let engine_config = load_engine_config(&args)?;

    match args.command {
        Command::Assess {
            file,
            smartctl_json,
            format,
        } => run_assess(engine_config, file, smartctl_json, format).await,
        Command::Serve {
            api_addr,
            records,
            smartctl,
            interval_secs,
        } => run_serve(engine_config, api_addr, records, smartctl, interval_secs).await,
    }
}

fn load_engine_config(args: &Args) -> Result<EngineConfig> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    if let Some(mode) = &args.mode {
        config = config.with_mode(mode.parse::<PredictionMode>()?);
    }
    Ok(config)
}

async fn run_assess(
    config: EngineConfig,
    file: Option<PathBuf>,
    smartctl_json: bool,
    format: OutputFormat,
) -> Result<()> {
    let (source_name, records) = match file {
        Some(path) if smartctl_json => {
            let contents = tokio::fs::read_to_string(&path).await?;
            let json: serde_json::Value = serde_json::from_str(&contents)?;
            (
                format!("smartctl:{}", path.display()),
                vec![SmartctlNormalizer::normalize(&json)?],
            )
        }
        Some(path) => {
            let source = FileSource::new(&path);
            (source.name().to_string(), source.collect().await?)
        }
        None if smartctl_json => {
            return Err(Error::Configuration(
                "--smartctl-json requires a FILE argument".into(),
            ))
        }
        None => {
            let source = SmartctlSource::new();
            (source.name().to_string(), source.collect().await?)
        }
    };

    let devices = assess_parallel(AssessmentEngine::new(config), records).await?;
    let report = HostReport::new(source_name, config.mode, devices);

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Table => print_table(&report),
    }
    Ok(())
}

async fn run_serve(
    config: EngineConfig,
    api_addr: String,
    records: Option<PathBuf>,
    smartctl: String,
    interval_secs: u64,
) -> Result<()> {
    info!("Starting Drive Health Advisor");
    info!("  Version: {}", drive_health_advisor::VERSION);
    info!("  Mode: {}", config.mode);
    info!("  Thresholds: {:?}", config.thresholds.hours());

    let source: DiagnosticSourceRef = match records {
        Some(path) => Arc::new(FileSource::new(path)),
        None => Arc::new(SmartctlSource::with_binary(smartctl)),
    };

    let metrics = Arc::new(AssessmentMetrics::new()?);
    let assessor = HostAssessor::new(
        AssessorConfig {
            engine: config,
            interval_secs,
        },
        source,
        metrics,
    );

    let api_config = ApiServerConfig {
        rest_addr: api_addr
            .parse()
            .map_err(|e| Error::Configuration(format!("Invalid REST API address: {}", e)))?,
        ..Default::default()
    };
    let api_server = ApiServer::new(api_config, assessor);

    let shutdown_tx = api_server.shutdown_handle();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received interrupt, shutting down");
                let _ = shutdown_tx.send(());
            }
            Err(e) => error!("Failed to listen for interrupt: {}", e),
        }
    });

    api_server.run().await?;

    info!("Advisor shutdown complete");
    Ok(())
}

// =============================================================================
// Output
// =============================================================================

fn print_table(report: &HostReport) {
    println!(
        "{:<16} {:<10} {:>8} {:<14} {:<14} {:<10} WARNINGS",
        "DEVICE", "FAMILY", "HOURS", "TIER", "REPLACE", "CONFIDENCE"
    );
    for device in &report.devices {
        let hours = device
            .power_on_hours
            .map_or_else(|| "-".to_string(), |h| h.to_string());
        let tier = device.tier.map_or("insufficient", |t| t.as_str());
        let warnings = device
            .warnings
            .iter()
            .map(|w| format!("{}:{}", w.severity, w.attribute))
            .collect::<Vec<_>>()
            .join(",");
        println!(
            "{:<16} {:<10} {:>8} {:<14} {:<14} {:<10} {}",
            device.device_path,
            device.device_family.to_string(),
            hours,
            tier,
            device.estimate.timeline_label,
            device.estimate.confidence.to_string(),
            warnings
        );
    }

    let s = &report.summary;
    println!();
    println!(
        "{} devices ({} mode): {} minimal, {} low, {} moderate, {} elevated, {} high, {} insufficient data",
        s.total, report.mode, s.minimal, s.low, s.moderate, s.elevated, s.high, s.insufficient_data
    );
    if s.replace_now > 0 {
        println!("{} device(s) should be replaced now", s.replace_now);
    }
}

// =============================================================================
// Logging Setup
// =============================================================================

fn init_logging(args: &Args) {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let mut filter = EnvFilter::from_default_env().add_directive(level.into());
    for directive in ["hyper=warn", "tower=warn", "tower_http=info", "axum=info"] {
        if let Ok(directive) = directive.parse() {
            filter = filter.add_directive(directive);
        }
    }

    // stdout carries the report in `assess`
    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}
