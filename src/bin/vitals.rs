//! Vitals CLI - Command-line interface for Synheart Vitals
//!
//! Commands:
//! - compute: Compute one metric from a raw vendor payload
//! - report: Compute several metrics for a date from a fixture directory
//! - doctor: Diagnose configuration and fixture layout

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use synheart_vitals::types::Vendor;
use synheart_vitals::{
    DataScope, DirectoryRetriever, MetricResponseBuilder, MetricsConfig, VitalsProcessor,
    PRODUCER_NAME, VITALS_VERSION,
};

/// Vitals - Metric-derivation engine for wearable vitals
#[derive(Parser)]
#[command(name = "vitals")]
#[command(author = "Synheart AI Inc")]
#[command(version = VITALS_VERSION)]
#[command(about = "Derive health metrics from wearable vendor payloads", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute one metric from a raw vendor payload
    Compute {
        /// Metric category of the payload
        #[arg(short, long, value_enum)]
        metric: ScopeArg,

        /// Query date (YYYY-MM-DD)
        #[arg(short, long)]
        date: String,

        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Engine configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Override the expected daily RR interval count
        #[arg(long)]
        expected_intervals: Option<f64>,

        /// Output format
        #[arg(long, default_value = "json")]
        output_format: OutputFormat,
    },

    /// Compute several metrics for a date from <data-dir>/<date>/<scope>.json
    Report {
        /// Fixture directory
        #[arg(long)]
        data_dir: PathBuf,

        /// Query date (YYYY-MM-DD)
        #[arg(short, long)]
        date: String,

        /// Scopes to include (repeatable, defaults to all)
        #[arg(short, long, value_enum)]
        scope: Vec<ScopeArg>,

        /// Engine configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output format
        #[arg(long, default_value = "json-pretty")]
        output_format: OutputFormat,
    },

    /// Diagnose configuration and fixture layout
    Doctor {
        /// Check a configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Check a fixture directory
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ScopeArg {
    UserInfo,
    Sleep,
    HeartRate,
    Hrv,
    BreathingRate,
    Spo2,
    Activity,
}

impl From<ScopeArg> for DataScope {
    fn from(arg: ScopeArg) -> Self {
        match arg {
            ScopeArg::UserInfo => DataScope::UserInfo,
            ScopeArg::Sleep => DataScope::Sleep,
            ScopeArg::HeartRate => DataScope::HeartRate,
            ScopeArg::Hrv => DataScope::Hrv,
            ScopeArg::BreathingRate => DataScope::BreathingRate,
            ScopeArg::Spo2 => DataScope::Spo2,
            ScopeArg::Activity => DataScope::Activity,
        }
    }
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), VitalsCliError> {
    match cli.command {
        Commands::Compute {
            metric,
            date,
            input,
            config,
            expected_intervals,
            output_format,
        } => cmd_compute(
            metric.into(),
            &date,
            &input,
            config.as_deref(),
            expected_intervals,
            &output_format,
        ),

        Commands::Report {
            data_dir,
            date,
            scope,
            config,
            output_format,
        } => {
            let scopes: Vec<DataScope> = if scope.is_empty() {
                DataScope::ALL.to_vec()
            } else {
                scope.into_iter().map(DataScope::from).collect()
            };
            cmd_report(data_dir, &date, &scopes, config.as_deref(), &output_format)
        }

        Commands::Doctor {
            config,
            data_dir,
            json,
        } => cmd_doctor(config.as_deref(), data_dir.as_deref(), json),
    }
}

fn cmd_compute(
    scope: DataScope,
    date: &str,
    input: &Path,
    config: Option<&Path>,
    expected_intervals: Option<f64>,
    output_format: &OutputFormat,
) -> Result<(), VitalsCliError> {
    let raw_json = if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        fs::read_to_string(input)?
    };

    let mut metrics_config = load_config(config)?;
    if let Some(expected) = expected_intervals {
        metrics_config.hrv.expected_daily_intervals = expected;
        metrics_config.validate()?;
    }

    let builder = MetricResponseBuilder::with_config(metrics_config);
    let response = builder.build(scope, date, &raw_json);

    println!("{}", format_output(&response.body, output_format)?);

    match response.error_message() {
        Some(message) => Err(VitalsCliError::MetricFailed {
            status: response.status,
            message: message.to_string(),
        }),
        None => Ok(()),
    }
}

fn cmd_report(
    data_dir: PathBuf,
    date: &str,
    scopes: &[DataScope],
    config: Option<&Path>,
    output_format: &OutputFormat,
) -> Result<(), VitalsCliError> {
    let builder = MetricResponseBuilder::with_config(load_config(config)?);
    let retriever = DirectoryRetriever::new(Vendor::Fitbit, data_dir);
    let processor = VitalsProcessor::with_builder(retriever, builder);

    let report = processor.report(scopes, date, None);
    println!("{}", format_output(&report, output_format)?);

    let failed = report.failed_scopes();
    if failed.len() == scopes.len() && !scopes.is_empty() {
        return Err(VitalsCliError::NoMetrics);
    }
    Ok(())
}

fn cmd_doctor(
    config: Option<&Path>,
    data_dir: Option<&Path>,
    json: bool,
) -> Result<(), VitalsCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "vitals_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Vitals version {}", VITALS_VERSION),
    });

    if let Some(config_path) = config {
        checks.push(match MetricsConfig::from_path(config_path) {
            Ok(loaded) => DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Ok,
                message: format!(
                    "Config valid (expected {} intervals/day, segment cap {})",
                    loaded.hrv.expected_daily_intervals, loaded.hrv.max_segment_length
                ),
            },
            Err(e) => DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Error,
                message: e.to_string(),
            },
        });
    }

    if let Some(dir) = data_dir {
        checks.push(check_data_dir(dir));
    }

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: VITALS_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Vitals Doctor Report");
        println!("====================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report
        .checks
        .iter()
        .any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(VitalsCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

fn check_data_dir(dir: &Path) -> DoctorCheck {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            return DoctorCheck {
                name: "data_dir".to_string(),
                status: CheckStatus::Error,
                message: format!("Cannot read {}: {}", dir.display(), e),
            }
        }
    };

    let mut dates = 0;
    let mut payloads = 0;
    for day in entries.flatten().filter(|e| e.path().is_dir()) {
        dates += 1;
        payloads += DataScope::ALL
            .iter()
            .filter(|scope| day.path().join(format!("{}.json", scope.as_str())).is_file())
            .count();
    }

    if payloads == 0 {
        DoctorCheck {
            name: "data_dir".to_string(),
            status: CheckStatus::Warning,
            message: format!("No <date>/<scope>.json payloads under {}", dir.display()),
        }
    } else {
        DoctorCheck {
            name: "data_dir".to_string(),
            status: CheckStatus::Ok,
            message: format!("{} payloads across {} dates", payloads, dates),
        }
    }
}

// Helper functions

fn load_config(path: Option<&Path>) -> Result<MetricsConfig, VitalsCliError> {
    match path {
        Some(p) => Ok(MetricsConfig::from_path(p)?),
        None => Ok(MetricsConfig::default()),
    }
}

fn format_output<T: serde::Serialize>(
    value: &T,
    format: &OutputFormat,
) -> Result<String, VitalsCliError> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string(value)?),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(value)?),
    }
}

// Error types

#[derive(Debug)]
enum VitalsCliError {
    Io(io::Error),
    Compute(synheart_vitals::ComputeError),
    Json(serde_json::Error),
    MetricFailed { status: u16, message: String },
    NoMetrics,
    DoctorFailed,
}

impl From<io::Error> for VitalsCliError {
    fn from(e: io::Error) -> Self {
        VitalsCliError::Io(e)
    }
}

impl From<synheart_vitals::ComputeError> for VitalsCliError {
    fn from(e: synheart_vitals::ComputeError) -> Self {
        VitalsCliError::Compute(e)
    }
}

impl From<serde_json::Error> for VitalsCliError {
    fn from(e: serde_json::Error) -> Self {
        VitalsCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<VitalsCliError> for CliError {
    fn from(e: VitalsCliError) -> Self {
        match e {
            VitalsCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            VitalsCliError::Compute(e) => CliError {
                code: "COMPUTE_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check the configuration file".to_string()),
            },
            VitalsCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: None,
            },
            VitalsCliError::MetricFailed { status, message } => CliError {
                code: format!("METRIC_FAILED_{}", status),
                message,
                hint: Some("Ensure the payload matches the selected metric".to_string()),
            },
            VitalsCliError::NoMetrics => CliError {
                code: "NO_METRICS".to_string(),
                message: "Every requested metric failed".to_string(),
                hint: Some("Run 'vitals doctor --data-dir <dir>' to check the layout".to_string()),
            },
            VitalsCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
