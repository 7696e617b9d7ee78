//! Moodcast CLI - Command-line interface for Moodcast
//!
//! Commands:
//! - predict: Score one request and print the wire JSON (also the bare form)
//! - train: Fit the survey pipeline from a lifestyle CSV
//! - fuse: Build the merged multi-source dataset and fit the delta model
//! - serve: Run the HTTP prediction endpoint (feature `http`)
//! - doctor: Check that the serving artifacts load and predict

use clap::{Parser, Subcommand};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use moodcast::error::PipelineError;
use moodcast::merge::MergeOptions;
use moodcast::model::artifact::{
    load_artifact, ARTIFACT_VERSION, PIPELINE_KIND, TARGET_SCALER_KIND,
};
use moodcast::model::{MinMaxScaler, ModelPipeline};
use moodcast::predict::{
    artifact_paths_from_env, parse_request, run_prediction, MoodPredictor, PredictionRequest,
    PredictionSource,
};
use moodcast::trainer::{
    train_fusion_model, train_survey_model, DEFAULT_SEED, FUSION_HOLDOUT, SURVEY_HOLDOUT,
};
use moodcast::{MOODCAST_VERSION, PRODUCER_NAME};

/// Moodcast - well-being prediction from lifestyle signals
#[derive(Parser)]
#[command(name = "moodcast")]
#[command(author = "Moodcast Labs")]
#[command(version = MOODCAST_VERSION)]
#[command(about = "Predict a 0-5 well-being score from lifestyle inputs", long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    /// JSON request, path to a .json file, or - for stdin
    input: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Score one request and print the wire JSON
    Predict {
        /// JSON request, path to a .json file, or - for stdin
        input: Option<String>,
    },

    /// Fit the survey pipeline from a lifestyle CSV
    Train {
        /// Survey CSV with the six input columns and the target score
        #[arg(long)]
        survey: PathBuf,

        /// Directory the artifacts are written to
        #[arg(long, default_value = "models")]
        out: PathBuf,

        /// Seed for the train/test shuffle
        #[arg(long, default_value_t = DEFAULT_SEED)]
        seed: u64,

        /// Held-out fraction of rows
        #[arg(long, default_value_t = SURVEY_HOLDOUT)]
        holdout: f64,
    },

    /// Build the merged multi-source dataset and fit the delta model
    Fuse {
        /// Directory holding Mood/, Activity/ and Sleep/ per-user logs
        #[arg(long)]
        data_dir: PathBuf,

        /// Directory the artifact is written to
        #[arg(long, default_value = "models")]
        out: PathBuf,

        /// Seed for the train/test shuffle
        #[arg(long, default_value_t = DEFAULT_SEED)]
        seed: u64,

        /// Held-out fraction of rows
        #[arg(long, default_value_t = FUSION_HOLDOUT)]
        holdout: f64,

        /// Drop nearest-time matches farther apart than this many seconds
        #[arg(long)]
        max_gap_secs: Option<i64>,
    },

    /// Run the HTTP prediction endpoint
    #[cfg(feature = "http")]
    Serve {
        /// Listen address (overrides MOODCAST_ADDR)
        #[arg(long)]
        addr: Option<String>,
    },

    /// Check that the serving artifacts load and predict
    Doctor {
        /// Fitted pipeline artifact (defaults to MOODCAST_MODEL_PATH)
        #[arg(long)]
        model: Option<PathBuf>,

        /// Target scaler artifact (defaults to MOODCAST_SCALER_PATH)
        #[arg(long)]
        scaler: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let payload = ErrorPayload {
                error: CliError::from(e),
            };
            eprintln!(
                "{}",
                serde_json::to_string(&payload).unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), MoodcastCliError> {
    match cli.command {
        Some(Commands::Predict { input }) => cmd_predict(input.as_deref()),

        Some(Commands::Train {
            survey,
            out,
            seed,
            holdout,
        }) => cmd_train(&survey, &out, seed, holdout),

        Some(Commands::Fuse {
            data_dir,
            out,
            seed,
            holdout,
            max_gap_secs,
        }) => cmd_fuse(&data_dir, &out, seed, holdout, max_gap_secs),

        #[cfg(feature = "http")]
        Some(Commands::Serve { addr }) => cmd_serve(addr.as_deref()),

        Some(Commands::Doctor { model, scaler }) => cmd_doctor(model, scaler),

        // Bare form: `moodcast <INPUT>` scores a request directly
        None => cmd_predict(cli.input.as_deref()),
    }
}

fn cmd_predict(input: Option<&str>) -> Result<(), MoodcastCliError> {
    let (model, scaler) = artifact_paths_from_env();
    let value = predict_value(input, &model, &scaler);
    // The JSON on stdout is the whole contract, error payloads included;
    // the caller reads it rather than the exit code.
    println!("{}", serde_json::to_string(&value)?);
    Ok(())
}

/// Scores one request and shapes the outcome as the wire JSON
fn predict_value(input: Option<&str>, model: &Path, scaler: &Path) -> Value {
    let raw = match gather_request_text(input) {
        Ok(raw) => raw,
        Err(message) => return json!({ "error": message }),
    };
    match parse_request(&raw) {
        Ok(request) => {
            let prediction = run_prediction(&request, model, scaler);
            serde_json::to_value(prediction).unwrap_or_else(|e| json!({ "error": e.to_string() }))
        }
        Err(e) => json!({ "error": e.to_string() }),
    }
}

/// Resolves the predict argument to raw request text.
///
/// An argument ending in `.json` names a file; `-` reads stdin, as does a
/// piped stdin with no argument at all. Anything else is taken as the JSON
/// itself. Failures are worded exactly as the wire contract prints them.
fn gather_request_text(input: Option<&str>) -> Result<String, String> {
    match input {
        Some("-") => read_stdin(),
        Some(arg) if arg.ends_with(".json") => read_json_file(Path::new(arg)),
        Some(arg) => Ok(arg.to_string()),
        None => {
            if atty::is(atty::Stream::Stdin) {
                Err("No input data provided".to_string())
            } else {
                read_stdin()
            }
        }
    }
}

fn read_stdin() -> Result<String, String> {
    let mut buffer = String::new();
    io::stdin()
        .read_to_string(&mut buffer)
        .map_err(|e| format!("Error reading input: {e}"))?;
    if buffer.trim().is_empty() {
        return Err("No input data provided".to_string());
    }
    Ok(buffer)
}

fn read_json_file(path: &Path) -> Result<String, String> {
    let text = fs::read_to_string(path).map_err(|e| format!("Error reading file: {e}"))?;
    // A named .json file that fails to parse is a file problem, not an
    // "Invalid JSON input"
    if let Err(e) = serde_json::from_str::<Value>(&text) {
        return Err(format!("Error reading file: {e}"));
    }
    Ok(text)
}

fn cmd_train(survey: &Path, out: &Path, seed: u64, holdout: f64) -> Result<(), MoodcastCliError> {
    let report = train_survey_model(survey, out, seed, holdout)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn cmd_fuse(
    data_dir: &Path,
    out: &Path,
    seed: u64,
    holdout: f64,
    max_gap_secs: Option<i64>,
) -> Result<(), MoodcastCliError> {
    let options = MergeOptions {
        max_gap: max_gap_secs.map(chrono::Duration::seconds),
    };
    let report = train_fusion_model(data_dir, out, seed, holdout, &options)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

#[cfg(feature = "http")]
fn cmd_serve(addr: Option<&str>) -> Result<(), MoodcastCliError> {
    use moodcast::server::{self, ServerConfig};

    server::init_tracing();

    let mut config = ServerConfig::from_env()?;
    if let Some(addr) = addr {
        config.addr = addr
            .parse()
            .map_err(|_| MoodcastCliError::BadAddress(addr.to_string()))?;
    }

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(server::serve(config))?;
    Ok(())
}

fn cmd_doctor(model: Option<PathBuf>, scaler: Option<PathBuf>) -> Result<(), MoodcastCliError> {
    let (default_model, default_scaler) = artifact_paths_from_env();
    let model = model.unwrap_or(default_model);
    let scaler = scaler.unwrap_or(default_scaler);

    let mut checks = vec![
        DoctorCheck {
            name: "moodcast_version".to_string(),
            status: CheckStatus::Ok,
            message: format!("moodcast version {}", MOODCAST_VERSION),
        },
        DoctorCheck {
            name: "artifact_format".to_string(),
            status: CheckStatus::Ok,
            message: format!("artifact format v{}", ARTIFACT_VERSION),
        },
    ];

    checks.push(artifact_check::<ModelPipeline>(
        "pipeline_artifact",
        &model,
        PIPELINE_KIND,
    ));
    checks.push(artifact_check::<MinMaxScaler>(
        "target_scaler_artifact",
        &scaler,
        TARGET_SCALER_KIND,
    ));
    checks.push(prediction_check(&model, &scaler));

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: MOODCAST_VERSION.to_string(),
        checks,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);

    let has_errors = report
        .checks
        .iter()
        .any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(MoodcastCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

fn artifact_check<T: DeserializeOwned>(name: &str, path: &Path, kind: &str) -> DoctorCheck {
    if !path.exists() {
        return DoctorCheck {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: format!("{} does not exist", path.display()),
        };
    }
    match load_artifact::<T>(path, kind) {
        Ok((_, info)) => DoctorCheck {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: format!(
                "{} loads (run {}, trained {})",
                path.display(),
                info.run_id,
                info.trained_at.to_rfc3339()
            ),
        },
        Err(e) => DoctorCheck {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: e.to_string(),
        },
    }
}

/// Runs the serving pair against a fixed request end to end
fn prediction_check(model: &Path, scaler: &Path) -> DoctorCheck {
    let name = "canned_prediction".to_string();
    let predictor = match MoodPredictor::load(model, scaler) {
        Ok(predictor) => predictor,
        Err(e) => {
            return DoctorCheck {
                name,
                status: CheckStatus::Error,
                message: format!("artifacts did not load together: {e}"),
            };
        }
    };

    let prediction = predictor.predict(&canned_request());
    match prediction.source {
        PredictionSource::Modeled if prediction.prediction.is_finite() => DoctorCheck {
            name,
            status: CheckStatus::Ok,
            message: format!("canned request scored {:.2}", prediction.prediction),
        },
        PredictionSource::Modeled => DoctorCheck {
            name,
            status: CheckStatus::Error,
            message: "model produced a non-finite score".to_string(),
        },
        PredictionSource::Heuristic => DoctorCheck {
            name,
            status: CheckStatus::Error,
            message: "modeled path failed; the canned request fell back to the heuristic"
                .to_string(),
        },
    }
}

fn canned_request() -> PredictionRequest {
    PredictionRequest {
        daily_stress: 5.0,
        flow: 2.0,
        todo_completed: 3.0,
        sleep_hours: 7.0,
        gender: "Male".to_string(),
        age: 29.0,
    }
}

// Error types

#[derive(Debug)]
enum MoodcastCliError {
    Io(io::Error),
    Pipeline(PipelineError),
    Json(serde_json::Error),
    #[cfg(feature = "http")]
    BadAddress(String),
    DoctorFailed,
}

impl From<io::Error> for MoodcastCliError {
    fn from(e: io::Error) -> Self {
        MoodcastCliError::Io(e)
    }
}

impl From<PipelineError> for MoodcastCliError {
    fn from(e: PipelineError) -> Self {
        MoodcastCliError::Pipeline(e)
    }
}

impl From<serde_json::Error> for MoodcastCliError {
    fn from(e: serde_json::Error) -> Self {
        MoodcastCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct ErrorPayload {
    error: CliError,
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<MoodcastCliError> for CliError {
    fn from(e: MoodcastCliError) -> Self {
        match e {
            MoodcastCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            MoodcastCliError::Pipeline(e) => CliError {
                code: "PIPELINE_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check the input data and artifact paths".to_string()),
            },
            MoodcastCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            #[cfg(feature = "http")]
            MoodcastCliError::BadAddress(addr) => CliError {
                code: "BAD_ADDRESS".to_string(),
                message: format!("'{addr}' is not a socket address"),
                hint: Some("Use HOST:PORT, e.g. 0.0.0.0:8080".to_string()),
            },
            MoodcastCliError::DoctorFailed => CliError {
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
    Error,
}
