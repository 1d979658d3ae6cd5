//! Mechanostat CLI - Command-line interface for the Mechanostat model
//!
//! Commands:
//! - predict: Single-point bone formation rate prediction
//! - synthesize: Generate and export a synthetic dataset
//! - curve: Sweep one loading input and print the response curve
//! - params: Print effective model parameters and sampling ranges
//! - schema: Print the dataset record schema
//! - doctor: Diagnose configuration

use clap::{Parser, Subcommand, ValueEnum};
use log::info;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use mechanostat::curve::{sweep, SweepAxis};
use mechanostat::export::{display_table, encode, ExportEnvelope, OutputFormat};
use mechanostat::{
    BoneRegion, LoadingCondition, MechanoProcessor, ModelError, ModelParams, SamplingRanges,
    DEFAULT_DATASET_SIZE, MODEL_VERSION, PRODUCER_NAME,
};

/// Mechanostat - Bone formation response to mechanical loading
#[derive(Parser)]
#[command(name = "mechanostat")]
#[command(version = MODEL_VERSION)]
#[command(about = "Predict bone formation rate from mechanical loading", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Predict bone formation rate for one loading condition
    #[command(allow_negative_numbers = true)]
    Predict {
        /// Strain amplitude (microstrain)
        #[arg(short, long)]
        amplitude: f64,

        /// Loading frequency (Hz)
        #[arg(short, long)]
        frequency: f64,

        /// Loading duration (weeks)
        #[arg(short, long)]
        duration: f64,

        /// Bone region (tibia, ulna, vertebra, femur, humerus, or any label)
        #[arg(short, long, default_value = "tibia")]
        region: String,

        /// Model parameters JSON file
        #[arg(long)]
        params: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate a synthetic dataset
    Synthesize {
        /// Number of records
        #[arg(short, long, default_value_t = DEFAULT_DATASET_SIZE)]
        count: usize,

        /// Random seed for a reproducible dataset
        #[arg(short, long)]
        seed: Option<u64>,

        /// Output format (defaults to table on a terminal, ndjson otherwise)
        #[arg(long)]
        format: Option<DatasetFormat>,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Wrap records in an export envelope with producer, params and ranges
        #[arg(long)]
        envelope: bool,

        /// Model parameters JSON file
        #[arg(long)]
        params: Option<PathBuf>,

        /// Sampling ranges JSON file
        #[arg(long)]
        ranges: Option<PathBuf>,
    },

    /// Sweep one input and print the response curve
    #[command(allow_negative_numbers = true)]
    Curve {
        /// Input to sweep
        #[arg(long, value_enum)]
        axis: Axis,

        /// First swept value (defaults per axis)
        #[arg(long)]
        start: Option<f64>,

        /// Last swept value (defaults per axis)
        #[arg(long)]
        end: Option<f64>,

        /// Number of points
        #[arg(long, default_value = "36")]
        steps: usize,

        /// Fixed strain amplitude (microstrain)
        #[arg(long, default_value = "1500")]
        amplitude: f64,

        /// Fixed frequency (Hz)
        #[arg(long, default_value = "5")]
        frequency: f64,

        /// Fixed duration (weeks)
        #[arg(long, default_value = "2")]
        duration: f64,

        /// Model parameters JSON file
        #[arg(long)]
        params: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print effective model parameters and sampling ranges
    Params {
        /// Model parameters JSON file
        #[arg(long)]
        params: Option<PathBuf>,

        /// Sampling ranges JSON file
        #[arg(long)]
        ranges: Option<PathBuf>,
    },

    /// Print the dataset record schema
    Schema {
        /// Output as JSON schema
        #[arg(long)]
        json_schema: bool,
    },

    /// Diagnose configuration
    Doctor {
        /// Model parameters JSON file to check
        #[arg(long)]
        params: Option<PathBuf>,

        /// Sampling ranges JSON file to check
        #[arg(long)]
        ranges: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum DatasetFormat {
    /// Newline-delimited JSON (one record per line)
    Ndjson,
    /// JSON array of records
    Json,
    /// Pretty-printed JSON
    JsonPretty,
    /// Comma-separated values with header
    Csv,
    /// Rounded, human-readable table
    Table,
}

#[derive(Clone, Copy, ValueEnum)]
enum Axis {
    Amplitude,
    Frequency,
    Duration,
}

impl From<Axis> for SweepAxis {
    fn from(axis: Axis) -> Self {
        match axis {
            Axis::Amplitude => SweepAxis::Amplitude,
            Axis::Frequency => SweepAxis::Frequency,
            Axis::Duration => SweepAxis::Duration,
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

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

fn run(cli: Cli) -> Result<(), MechanoCliError> {
    match cli.command {
        Commands::Predict {
            amplitude,
            frequency,
            duration,
            region,
            params,
            json,
        } => cmd_predict(amplitude, frequency, duration, &region, params.as_deref(), json),

        Commands::Synthesize {
            count,
            seed,
            format,
            output,
            envelope,
            params,
            ranges,
        } => cmd_synthesize(
            count,
            seed,
            format,
            &output,
            envelope,
            params.as_deref(),
            ranges.as_deref(),
        ),

        Commands::Curve {
            axis,
            start,
            end,
            steps,
            amplitude,
            frequency,
            duration,
            params,
            json,
        } => cmd_curve(
            axis.into(),
            start,
            end,
            steps,
            LoadingCondition::new(BoneRegion::default(), frequency, amplitude, duration),
            params.as_deref(),
            json,
        ),

        Commands::Params { params, ranges } => cmd_params(params.as_deref(), ranges.as_deref()),

        Commands::Schema { json_schema } => cmd_schema(json_schema),

        Commands::Doctor {
            params,
            ranges,
            json,
        } => cmd_doctor(params.as_deref(), ranges.as_deref(), json),
    }
}

fn load_processor(
    params: Option<&Path>,
    ranges: Option<&Path>,
) -> Result<MechanoProcessor, MechanoCliError> {
    let params = match params {
        Some(path) => ModelParams::from_json(&fs::read_to_string(path)?)?,
        None => ModelParams::default(),
    };
    let ranges = match ranges {
        Some(path) => SamplingRanges::from_json(&fs::read_to_string(path)?)?,
        None => SamplingRanges::default(),
    };
    Ok(MechanoProcessor::with_params(params, ranges)?)
}

fn loading_condition(region: &str, amplitude: f64, frequency: f64, duration: f64) -> LoadingCondition {
    LoadingCondition::new(BoneRegion::from(region), frequency, amplitude, duration)
}

fn cmd_predict(
    amplitude: f64,
    frequency: f64,
    duration: f64,
    region: &str,
    params: Option<&Path>,
    json: bool,
) -> Result<(), MechanoCliError> {
    let processor = load_processor(params, None)?;
    let condition = loading_condition(region, amplitude, frequency, duration);
    let result = processor.predict(&condition);
    let interpretation = processor.interpret(&condition);

    if json {
        let report = PredictReport {
            condition: &condition,
            bfr: result.bfr,
            advisories: &result.advisories,
            effects: &result.effects,
            interpretation: interpretation.code(),
            interpretation_message: interpretation.message(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "Predicted bone formation rate for the {}: {:.2} (arbitrary units)",
            condition.bone_region, result.bfr
        );
        println!(
            "  amplitude effect {:.3}, frequency effect {:.3}, duration factor {:.3}",
            result.effects.amplitude_effect,
            result.effects.frequency_effect,
            result.effects.duration_factor
        );
        println!();
        println!("{}", interpretation);

        if !result.advisories.is_empty() {
            println!("\nAdvisories:");
            for advisory in &result.advisories {
                println!("  [{}] {}", advisory.code(), advisory.message());
            }
        }
    }

    Ok(())
}

fn cmd_synthesize(
    count: usize,
    seed: Option<u64>,
    format: Option<DatasetFormat>,
    output: &Path,
    envelope: bool,
    params: Option<&Path>,
    ranges: Option<&Path>,
) -> Result<(), MechanoCliError> {
    let mut processor = load_processor(params, ranges)?;
    let dataset = processor.dataset(count, seed);
    info!("synthesized {} records (seed {:?})", dataset.len(), seed);

    let to_stdout = output.to_string_lossy() == "-";

    let output_data = if envelope {
        ExportEnvelope::new(&dataset, processor.params(), processor.ranges()).to_json()?
    } else {
        let format = format.unwrap_or(if to_stdout && atty::is(atty::Stream::Stdout) {
            DatasetFormat::Table
        } else {
            DatasetFormat::Ndjson
        });

        match format {
            DatasetFormat::Ndjson => encode(&dataset, OutputFormat::Ndjson)?,
            DatasetFormat::Json => encode(&dataset, OutputFormat::Json)?,
            DatasetFormat::JsonPretty => encode(&dataset, OutputFormat::JsonPretty)?,
            DatasetFormat::Csv => encode(&dataset, OutputFormat::Csv)?,
            DatasetFormat::Table => format_table(&dataset),
        }
    };

    if to_stdout {
        print!("{}", output_data);
    } else {
        fs::write(output, output_data)?;
    }

    Ok(())
}

fn format_table(dataset: &mechanostat::SyntheticDataset) -> String {
    let mut out = format!(
        "{:<10} {:>10} {:>15} {:>10} {:>6}\n",
        "Region", "Freq (Hz)", "Amplitude (µε)", "Weeks", "BFR"
    );
    for row in display_table(dataset) {
        out.push_str(&format!(
            "{:<10} {:>10.2} {:>15.0} {:>10.2} {:>6.2}\n",
            row.bone_region,
            row.frequency_hz,
            row.strain_amplitude_microstrain,
            row.duration_weeks,
            row.bfr
        ));
    }
    out
}

fn cmd_curve(
    axis: SweepAxis,
    start: Option<f64>,
    end: Option<f64>,
    steps: usize,
    base: LoadingCondition,
    params: Option<&Path>,
    json: bool,
) -> Result<(), MechanoCliError> {
    let processor = load_processor(params, None)?;
    let (default_start, default_end) = axis.default_bounds();
    let points = sweep(
        processor.model(),
        axis,
        start.unwrap_or(default_start),
        end.unwrap_or(default_end),
        steps,
        &base,
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&points)?);
    } else {
        println!("{:>22} {:>8} {:>8}", axis.label(), "Effect", "BFR");
        for point in &points {
            println!("{:>22.2} {:>8.3} {:>8.3}", point.input, point.effect, point.bfr);
        }
    }

    Ok(())
}

fn cmd_params(params: Option<&Path>, ranges: Option<&Path>) -> Result<(), MechanoCliError> {
    let processor = load_processor(params, ranges)?;
    let report = serde_json::json!({
        "params": processor.params(),
        "ranges": processor.ranges(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn cmd_schema(json_schema: bool) -> Result<(), MechanoCliError> {
    if json_schema {
        println!("{}", get_record_json_schema());
    } else {
        println!("Dataset record ({} {})", PRODUCER_NAME, MODEL_VERSION);
        println!();
        println!("- bone_region: tibia, ulna, vertebra, femur, humerus, or any label");
        println!("- frequency_hz: loading frequency (Hz)");
        println!("- strain_amplitude_microstrain: peak strain (µε)");
        println!("- duration_weeks: program length (weeks)");
        println!("- bfr: predicted bone formation rate (1.0 = baseline)");
        println!("- advisories: [{{ code, message }}]");
        println!("- effects: {{ amplitude_effect, frequency_effect, duration_factor }}");
    }
    Ok(())
}

fn cmd_doctor(
    params: Option<&Path>,
    ranges: Option<&Path>,
    json: bool,
) -> Result<(), MechanoCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Mechanostat version {}", MODEL_VERSION),
    });

    if let Some(path) = params {
        checks.push(check_config_file("params", path, |s| {
            ModelParams::from_json(s).map(|_| ())
        }));
    }

    if let Some(path) = ranges {
        checks.push(check_config_file("ranges", path, |s| {
            SamplingRanges::from_json(s).map(|_| ())
        }));
    }

    let stdout_check = if atty::is(atty::Stream::Stdout) {
        DoctorCheck {
            name: "stdout".to_string(),
            status: CheckStatus::Ok,
            message: "stdout is a TTY (synthesize defaults to table output)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdout".to_string(),
            status: CheckStatus::Ok,
            message: "stdout is a pipe (synthesize defaults to ndjson output)".to_string(),
        }
    };
    checks.push(stdout_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: MODEL_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Mechanostat Doctor Report");
        println!("=========================");
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
        Err(MechanoCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

fn check_config_file(
    name: &str,
    path: &Path,
    validate: impl Fn(&str) -> Result<(), ModelError>,
) -> DoctorCheck {
    if !path.exists() {
        return DoctorCheck {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: format!("{} does not exist", path.display()),
        };
    }

    match fs::read_to_string(path) {
        Ok(content) => match validate(&content) {
            Ok(()) => DoctorCheck {
                name: name.to_string(),
                status: CheckStatus::Ok,
                message: format!("{} is valid", path.display()),
            },
            Err(e) => DoctorCheck {
                name: name.to_string(),
                status: CheckStatus::Error,
                message: e.to_string(),
            },
        },
        Err(e) => DoctorCheck {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: format!("Cannot read {}: {}", path.display(), e),
        },
    }
}

fn get_record_json_schema() -> String {
    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "mechanostat.dataset_record.v1",
        "description": "Synthetic loading condition with its predicted bone formation rate",
        "type": "object",
        "required": [
            "bone_region",
            "frequency_hz",
            "strain_amplitude_microstrain",
            "duration_weeks",
            "bfr",
            "advisories",
            "effects"
        ],
        "properties": {
            "bone_region": { "type": "string" },
            "frequency_hz": { "type": "number", "minimum": 0 },
            "strain_amplitude_microstrain": { "type": "number", "minimum": 0 },
            "duration_weeks": { "type": "number", "minimum": 0 },
            "bfr": { "type": "number", "minimum": 1 },
            "advisories": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["code"],
                    "properties": {
                        "code": {
                            "type": "string",
                            "enum": [
                                "below_activation_threshold",
                                "exceeds_safe_strain",
                                "high_frequency",
                                "prolonged_duration"
                            ]
                        },
                        "message": { "type": "string" }
                    }
                }
            },
            "effects": {
                "type": "object",
                "properties": {
                    "amplitude_effect": { "type": "number" },
                    "frequency_effect": { "type": "number" },
                    "duration_factor": { "type": "number" }
                }
            }
        }
    })
    .to_string()
}

// Error types

#[derive(Debug)]
enum MechanoCliError {
    Io(io::Error),
    Model(ModelError),
    Json(serde_json::Error),
    DoctorFailed,
}

impl From<io::Error> for MechanoCliError {
    fn from(e: io::Error) -> Self {
        MechanoCliError::Io(e)
    }
}

impl From<ModelError> for MechanoCliError {
    fn from(e: ModelError) -> Self {
        MechanoCliError::Model(e)
    }
}

impl From<serde_json::Error> for MechanoCliError {
    fn from(e: serde_json::Error) -> Self {
        MechanoCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<MechanoCliError> for CliError {
    fn from(e: MechanoCliError) -> Self {
        match e {
            MechanoCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            MechanoCliError::Model(e @ ModelError::InvalidParams(_))
            | MechanoCliError::Model(e @ ModelError::InvalidRange(_)) => CliError {
                code: "CONFIG_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Run 'mechanostat params' to see the defaults".to_string()),
            },
            MechanoCliError::Model(e) => CliError {
                code: "MODEL_ERROR".to_string(),
                message: e.to_string(),
                hint: None,
            },
            MechanoCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            MechanoCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct PredictReport<'a> {
    condition: &'a LoadingCondition,
    bfr: f64,
    advisories: &'a [mechanostat::Advisory],
    effects: &'a mechanostat::EffectBreakdown,
    interpretation: &'static str,
    interpretation_message: &'static str,
}

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
    use mechanostat::Advisory;

    #[test]
    fn test_predict_accepts_negative_inputs() {
        let cli = Cli::try_parse_from([
            "mechanostat", "predict", "--amplitude", "-5", "--frequency", "5", "--duration", "2",
        ])
        .unwrap();

        let Commands::Predict {
            amplitude,
            frequency,
            duration,
            region,
            ..
        } = cli.command
        else {
            panic!("expected predict command");
        };
        assert_eq!(amplitude, -5.0);

        let condition = loading_condition(&region, amplitude, frequency, duration);
        let result = load_processor(None, None).unwrap().predict(&condition);
        assert_eq!(result.bfr, 1.0);
        assert_eq!(result.advisories, vec![Advisory::BelowActivationThreshold]);
    }

    #[test]
    fn test_predict_short_flags_accept_negative_values() {
        let cli = Cli::try_parse_from(["mechanostat", "predict", "-a", "1500", "-f", "-1", "-d", "-3"])
            .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Predict { frequency, duration, .. } if frequency == -1.0 && duration == -3.0
        ));
    }

    #[test]
    fn test_curve_accepts_negative_start() {
        let cli = Cli::try_parse_from([
            "mechanostat", "curve", "--axis", "amplitude", "--start", "-100", "--end", "3500",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Curve { start: Some(start), end: Some(end), .. } if start == -100.0 && end == 3500.0
        ));
    }

    #[test]
    fn test_predict_requires_inputs() {
        assert!(Cli::try_parse_from(["mechanostat", "predict", "--amplitude", "1500"]).is_err());
    }
}
