//! Somni CLI - Command-line interface for Somni Drift
//!
//! Commands:
//! - analyze: Run the deviation analysis on a sleep export
//! - validate: Check records for range and count problems
//! - doctor: Diagnose configuration and environment
//! - schema: Print input/output schema information

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use tracing::info;
use tracing_subscriber::EnvFilter;

use somni_drift::adapters::{parse_export, parse_with_format, ExportFormat};
use somni_drift::config::AnalysisConfig;
use somni_drift::types::{SleepAnalysisResult, SleepRecord};
use somni_drift::validation::{validate_records, ValidationReport};
use somni_drift::{AnalysisError, SleepAnalyzer, PRODUCER_NAME, SOMNI_VERSION};

/// Somni - Personal sleep-deviation engine
#[derive(Parser)]
#[command(name = "somni")]
#[command(author = "Somni Health")]
#[command(version = SOMNI_VERSION)]
#[command(about = "Detect drift from your personal sleep baseline", long_about = None)]
struct Cli {
    /// Log filter used when RUST_LOG is unset (e.g. "debug", "somni_drift=trace")
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a sleep export
    Analyze {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "auto")]
        format: InputFormat,

        /// Analysis configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Pretty-print the result
        #[arg(long)]
        pretty: bool,
    },

    /// Validate a sleep export without analyzing it
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "auto")]
        format: InputFormat,

        /// Analysis configuration file (JSON); sets the minimum record count
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Diagnose configuration and environment
    Doctor {
        /// Check an analysis configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print schema information
    Schema {
        /// Schema to print (input or output)
        #[arg(value_enum)]
        schema_type: SchemaType,

        /// Output as JSON schema
        #[arg(long)]
        json_schema: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum InputFormat {
    /// Detect from file name and content
    Auto,
    /// JSON array of nightly records
    Json,
    /// Fitbit sleep CSV export
    Fitbit,
    /// Oura sleep CSV export
    Oura,
    /// Apple Health export.xml
    Apple,
}

impl InputFormat {
    fn export_format(self) -> Option<ExportFormat> {
        match self {
            InputFormat::Auto => None,
            InputFormat::Json => Some(ExportFormat::Json),
            InputFormat::Fitbit => Some(ExportFormat::FitbitCsv),
            InputFormat::Oura => Some(ExportFormat::OuraCsv),
            InputFormat::Apple => Some(ExportFormat::AppleHealthXml),
        }
    }
}

#[derive(Clone, ValueEnum)]
enum SchemaType {
    /// Input schema (nightly sleep records)
    Input,
    /// Output schema (sleep analysis result)
    Output,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e)).unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn init_logging(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), SomniCliError> {
    match cli.command {
        Commands::Analyze {
            input,
            format,
            config,
            output,
            pretty,
        } => cmd_analyze(&input, format, config.as_deref(), &output, pretty),

        Commands::Validate {
            input,
            format,
            config,
            json,
        } => cmd_validate(&input, format, config.as_deref(), json),

        Commands::Doctor { config, json } => cmd_doctor(config.as_deref(), json),

        Commands::Schema { schema_type, json_schema } => cmd_schema(schema_type, json_schema),
    }
}

fn cmd_analyze(
    input: &Path,
    format: InputFormat,
    config: Option<&Path>,
    output: &Path,
    pretty: bool,
) -> Result<(), SomniCliError> {
    let analyzer = load_analyzer(config)?;

    let records = read_records(input, format)?;
    let report = validate_records(&records, analyzer.config().windows.min_records);
    if !report.valid {
        return Err(SomniCliError::ValidationFailed(
            report.error_message.unwrap_or_default(),
        ));
    }

    let result = analyzer.analyze(&records)?;
    info!(
        days = result.days_analyzed,
        shdi = result.shdi.score,
        category = result.shdi.category.as_str(),
        "analysis finished"
    );

    let output_data = format_result(&result, pretty)?;
    if is_stdio(output) {
        println!("{}", output_data);
    } else {
        fs::write(output, output_data + "\n")?;
    }

    Ok(())
}

fn cmd_validate(
    input: &Path,
    format: InputFormat,
    config: Option<&Path>,
    json: bool,
) -> Result<(), SomniCliError> {
    let analyzer = load_analyzer(config)?;
    let records = read_records(input, format)?;
    let report = validate_records(&records, analyzer.config().windows.min_records);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_validation_report(&report);
    }

    if report.valid {
        Ok(())
    } else {
        Err(SomniCliError::ValidationFailed(
            report.error_message.unwrap_or_default(),
        ))
    }
}

fn print_validation_report(report: &ValidationReport) {
    println!("Validation Report");
    println!("=================");
    println!("Records: {}", report.num_records);
    if let Some((start, end)) = report.date_range {
        println!("Range:   {} to {}", start, end);
    }
    match &report.error_message {
        None => println!("Status:  valid"),
        Some(message) => println!("Status:  invalid ({})", message),
    }
}

fn cmd_doctor(config: Option<&Path>, json: bool) -> Result<(), SomniCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "somni_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Somni version {}", SOMNI_VERSION),
    });

    // Check the built-in configuration
    checks.push(match AnalysisConfig::default().validate() {
        Ok(()) => DoctorCheck {
            name: "default_config".to_string(),
            status: CheckStatus::Ok,
            message: "Built-in weights and thresholds are consistent".to_string(),
        },
        Err(e) => DoctorCheck {
            name: "default_config".to_string(),
            status: CheckStatus::Error,
            message: e.to_string(),
        },
    });

    // Check configuration file if provided
    if let Some(config_path) = config {
        checks.push(check_config_file(config_path));
    }

    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (pass --input <file>)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (--input - ready)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: SOMNI_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Somni Doctor Report");
        println!("===================");
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

    let has_errors = report.checks.iter().any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(SomniCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

fn check_config_file(path: &Path) -> DoctorCheck {
    let name = "config".to_string();
    if !path.exists() {
        return DoctorCheck {
            name,
            status: CheckStatus::Warning,
            message: "Config file does not exist".to_string(),
        };
    }

    match fs::read_to_string(path) {
        Ok(content) => match AnalysisConfig::from_json(&content) {
            Ok(config) => DoctorCheck {
                name,
                status: CheckStatus::Ok,
                message: format!(
                    "Config valid (baseline {} days, recent {} days, minimum {} records)",
                    config.windows.baseline_days, config.windows.recent_days, config.windows.min_records
                ),
            },
            Err(e) => DoctorCheck {
                name,
                status: CheckStatus::Error,
                message: format!("Invalid config: {}", e),
            },
        },
        Err(e) => DoctorCheck {
            name,
            status: CheckStatus::Error,
            message: format!("Cannot read config file: {}", e),
        },
    }
}

fn cmd_schema(schema_type: SchemaType, json_schema: bool) -> Result<(), SomniCliError> {
    match schema_type {
        SchemaType::Input => {
            if json_schema {
                println!("{}", get_input_json_schema());
            } else {
                println!("Input: JSON array of nightly sleep records");
                println!();
                println!("- date: YYYY-MM-DD");
                println!("- total_sleep_min: 0-720");
                println!("- sleep_efficiency: 0-100 (percent)");
                println!("- deep_sleep_min: 0-360");
                println!("- rem_sleep_min: 0-360");
                println!("- awakenings: 0-50");
                println!();
                println!("At least {} records are required.", somni_drift::config::MIN_RECORDS);
                println!("Fitbit and Oura CSV and Apple Health XML exports are converted automatically.");
            }
        }
        SchemaType::Output => {
            if json_schema {
                println!("{}", get_output_json_schema());
            } else {
                println!("Output: sleep analysis result");
                println!();
                println!("- days_analyzed, start_date, end_date");
                println!("- baseline: {{ mean/std per metric, rmssd }}");
                println!("- z_scores: {{ efficiency, deep_sleep, rem_sleep, awakenings }}");
                println!("- trends: {{ slopes, efficiency_pvalue, has_significant_trend }}");
                println!("- svi: sleep variability index (0-100)");
                println!("- shdi: {{ score (0-100), category, confidence }}");
                println!("- phenotype: {{ primary_pattern, confidence, associated_domains, evidence_strength }}");
            }
        }
    }

    Ok(())
}

// Helper functions

fn load_analyzer(config: Option<&Path>) -> Result<SleepAnalyzer, SomniCliError> {
    match config {
        Some(path) => {
            let config = AnalysisConfig::from_json(&fs::read_to_string(path)?)?;
            Ok(SleepAnalyzer::with_config(config)?)
        }
        None => Ok(SleepAnalyzer::new()),
    }
}

fn is_stdio(path: &Path) -> bool {
    path.to_string_lossy() == "-"
}

fn read_records(input: &Path, format: InputFormat) -> Result<Vec<SleepRecord>, SomniCliError> {
    let content = if is_stdio(input) {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        fs::read_to_string(input)?
    };

    let records = match format.export_format() {
        Some(export_format) => parse_with_format(&content, export_format)?,
        None => parse_export(&content, &input.to_string_lossy())?,
    };
    Ok(records)
}

fn format_result(result: &SleepAnalysisResult, pretty: bool) -> Result<String, SomniCliError> {
    if pretty {
        Ok(result.to_json_pretty()?)
    } else {
        Ok(result.to_json()?)
    }
}

fn get_input_json_schema() -> String {
    let bounded = |kind: &str, max: u32| serde_json::json!({ "type": kind, "minimum": 0, "maximum": max });
    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "somni.sleep_records.v1",
        "description": "Nightly sleep records",
        "type": "array",
        "minItems": somni_drift::config::MIN_RECORDS,
        "items": {
            "type": "object",
            "required": [
                "date", "total_sleep_min", "sleep_efficiency",
                "deep_sleep_min", "rem_sleep_min", "awakenings"
            ],
            "properties": {
                "date": { "type": "string", "format": "date" },
                "total_sleep_min": bounded("integer", 720),
                "sleep_efficiency": bounded("number", 100),
                "deep_sleep_min": bounded("integer", 360),
                "rem_sleep_min": bounded("integer", 360),
                "awakenings": bounded("integer", 50)
            }
        }
    })
    .to_string()
}

fn get_output_json_schema() -> String {
    let numbers = |fields: &[&str]| {
        serde_json::Value::Object(
            fields
                .iter()
                .map(|f| (f.to_string(), serde_json::json!({ "type": "number" })))
                .collect(),
        )
    };
    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "somni.sleep_analysis.v1",
        "description": "Sleep deviation analysis result",
        "type": "object",
        "required": [
            "days_analyzed", "start_date", "end_date", "baseline",
            "z_scores", "trends", "svi", "shdi", "phenotype"
        ],
        "properties": {
            "days_analyzed": { "type": "integer", "minimum": somni_drift::config::MIN_RECORDS },
            "start_date": { "type": "string", "format": "date" },
            "end_date": { "type": "string", "format": "date" },
            "baseline": {
                "type": "object",
                "properties": numbers(&[
                    "mean_total_sleep", "std_total_sleep", "mean_efficiency", "std_efficiency",
                    "mean_deep", "std_deep", "mean_rem", "std_rem",
                    "mean_awakenings", "std_awakenings", "rmssd"
                ])
            },
            "z_scores": {
                "type": "object",
                "properties": numbers(&["efficiency", "deep_sleep", "rem_sleep", "awakenings"])
            },
            "trends": {
                "type": "object",
                "properties": {
                    "efficiency_slope": { "type": "number" },
                    "deep_slope": { "type": "number" },
                    "rem_slope": { "type": "number" },
                    "awakenings_slope": { "type": "number" },
                    "efficiency_pvalue": { "type": "number", "minimum": 0, "maximum": 1 },
                    "has_significant_trend": { "type": "boolean" }
                }
            },
            "svi": { "type": "number", "minimum": 0, "maximum": 100 },
            "shdi": {
                "type": "object",
                "properties": {
                    "score": { "type": "number", "minimum": 0, "maximum": 100 },
                    "category": { "enum": ["stable", "moderate_drift", "significant_drift"] },
                    "confidence": { "type": "number", "minimum": 0, "maximum": 1 }
                }
            },
            "phenotype": {
                "type": "object",
                "properties": {
                    "primary_pattern": {
                        "enum": [
                            "fragmentation_dominant", "deep_sleep_reduction",
                            "rem_instability", "efficiency_instability"
                        ]
                    },
                    "confidence": { "type": "number", "minimum": 0.2, "maximum": 1 },
                    "associated_domains": { "type": "array", "items": { "type": "string" } },
                    "evidence_strength": { "enum": ["strong", "moderate", "emerging"] }
                }
            }
        }
    })
    .to_string()
}

// Error types

#[derive(Debug)]
enum SomniCliError {
    Io(io::Error),
    Analysis(AnalysisError),
    Json(serde_json::Error),
    ValidationFailed(String),
    DoctorFailed,
}

impl From<io::Error> for SomniCliError {
    fn from(e: io::Error) -> Self {
        SomniCliError::Io(e)
    }
}

impl From<AnalysisError> for SomniCliError {
    fn from(e: AnalysisError) -> Self {
        SomniCliError::Analysis(e)
    }
}

impl From<serde_json::Error> for SomniCliError {
    fn from(e: serde_json::Error) -> Self {
        SomniCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<SomniCliError> for CliError {
    fn from(e: SomniCliError) -> Self {
        match e {
            SomniCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            SomniCliError::Analysis(e) => {
                let hint = match &e {
                    AnalysisError::InsufficientData { required, .. } => {
                        format!("Provide at least {} nights of sleep data", required)
                    }
                    AnalysisError::UnsupportedFormat(_) => {
                        "Use a .json, Apple Health .xml, Fitbit .csv or Oura .csv export, or pass --format".to_string()
                    }
                    AnalysisError::InvalidConfig(_) => "Run 'somni doctor --config <file>'".to_string(),
                    _ => "Run 'somni schema input' for the expected format".to_string(),
                };
                CliError {
                    code: e.code().to_string(),
                    message: e.to_string(),
                    hint: Some(hint),
                }
            }
            SomniCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            SomniCliError::ValidationFailed(message) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message,
                hint: Some("Run 'somni validate' for details".to_string()),
            },
            SomniCliError::DoctorFailed => CliError {
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

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn write_temp(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("somni-{}-{name}", std::process::id()));
        fs::write(&path, content).unwrap();
        path
    }

    fn records_json(days: i64) -> String {
        let records: Vec<SleepRecord> = (0..days)
            .map(|d| SleepRecord {
                date: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap() + Duration::days(d),
                total_sleep_min: 450,
                sleep_efficiency: 90.0,
                deep_sleep_min: 90,
                rem_sleep_min: 100,
                awakenings: 2,
            })
            .collect();
        serde_json::to_string(&records).unwrap()
    }

    #[test]
    fn test_validate_honors_config_min_records() {
        let input = write_temp("records.json", &records_json(16));
        let config = write_temp("config.json", r#"{"windows": {"min_records": 20}}"#);

        assert!(cmd_validate(&input, InputFormat::Auto, None, true).is_ok());
        assert!(matches!(
            cmd_validate(&input, InputFormat::Auto, Some(&config), true),
            Err(SomniCliError::ValidationFailed(_))
        ));

        fs::remove_file(input).ok();
        fs::remove_file(config).ok();
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = write_temp("bad-config.json", r#"{"windows": {"min_records": 0}}"#);
        assert!(matches!(
            load_analyzer(Some(&config)),
            Err(SomniCliError::Analysis(AnalysisError::InvalidConfig(_)))
        ));
        fs::remove_file(config).ok();
    }
}
