//! Focus CLI - Command-line interface for the focus engine
//!
//! Commands:
//! - analyze: Distraction analysis over recent activities
//! - summarize: Summarize a task list
//! - plan: Build a daily focus plan
//! - predict / batch-predict: Task duration predictions
//! - suggest: Ranked productivity suggestions
//! - config: Print the effective engine configuration

use clap::{Parser, Subcommand};
use serde_json::Value;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use focus_engine::adapter::parse_timestamp;
use focus_engine::{EngineConfig, EngineError, FocusEngine, ENGINE_VERSION, PRODUCER_NAME};

/// Focus - productivity analytics over activity, task and session records
#[derive(Parser)]
#[command(name = "focus")]
#[command(author = "Synheart AI Inc")]
#[command(version = ENGINE_VERSION)]
#[command(about = "Score distractions, plan focus time and predict task durations", long_about = None)]
struct Cli {
    /// Engine configuration overrides (JSON file)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Evaluate against a fixed time instead of the system clock (ISO-8601)
    #[arg(long, global = true)]
    now: Option<String>,

    /// Emit compact single-line JSON
    #[arg(long, global = true)]
    compact: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze recent activities for distraction patterns
    Analyze {
        #[command(flatten)]
        io: IoArgs,

        /// Analysis window in hours (overrides the request)
        #[arg(long)]
        hours: Option<u32>,
    },

    /// Summarize a task list
    Summarize {
        #[command(flatten)]
        io: IoArgs,
    },

    /// Build a daily focus plan
    Plan {
        #[command(flatten)]
        io: IoArgs,

        /// Focus hours available today (overrides the request)
        #[arg(long)]
        available_hours: Option<u32>,
    },

    /// Predict the duration of one task
    Predict {
        #[command(flatten)]
        io: IoArgs,
    },

    /// Predict durations for several tasks
    BatchPredict {
        #[command(flatten)]
        io: IoArgs,
    },

    /// Generate ranked productivity suggestions
    Suggest {
        #[command(flatten)]
        io: IoArgs,

        /// User the suggestions are for (overrides the request)
        #[arg(long)]
        user_id: Option<String>,
    },

    /// Print the effective engine configuration
    Config,
}

#[derive(clap::Args)]
struct IoArgs {
    /// Input file path (use - for stdin)
    #[arg(short, long, default_value = "-")]
    input: PathBuf,

    /// Output file path (use - for stdout)
    #[arg(short, long, default_value = "-")]
    output: PathBuf,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

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

fn run(cli: Cli) -> Result<(), FocusCliError> {
    let config = match &cli.config {
        Some(path) => EngineConfig::from_json(&fs::read_to_string(path)?)?,
        None => EngineConfig::default(),
    };

    let mut engine = FocusEngine::with_config(config);
    if let Some(now) = &cli.now {
        engine = engine.with_fixed_clock(parse_timestamp(now)?);
    }

    log::debug!("{} {} starting", PRODUCER_NAME, ENGINE_VERSION);

    let compact = cli.compact;
    match cli.command {
        Commands::Analyze { io, hours } => {
            let request = read_request(&io.input, "activities")?;
            let request = with_override(request, "time_window_hours", hours.map(Value::from));
            let output = engine.analyze_activity_patterns_json(&request.to_string())?;
            write_output(&io.output, &output, compact)
        }

        Commands::Summarize { io } => {
            let request = read_request(&io.input, "tasks")?;
            let output = engine.summarize_tasks_json(&request.to_string())?;
            write_output(&io.output, &output, compact)
        }

        Commands::Plan {
            io,
            available_hours,
        } => {
            let request = read_request(&io.input, "tasks")?;
            let request = with_override(
                request,
                "available_hours",
                available_hours.map(Value::from),
            );
            let output = engine.generate_focus_plan_json(&request.to_string())?;
            write_output(&io.output, &output, compact)
        }

        Commands::Predict { io } => {
            let request = read_request(&io.input, "task")?;
            let output = engine.predict_task_duration_json(&request.to_string())?;
            write_output(&io.output, &output, compact)
        }

        Commands::BatchPredict { io } => {
            let request = read_request(&io.input, "tasks")?;
            let output = engine.batch_predict_json(&request.to_string())?;
            write_output(&io.output, &output, compact)
        }

        Commands::Suggest { io, user_id } => {
            let request = read_request(&io.input, "tasks")?;
            let request = with_override(request, "user_id", user_id.map(Value::from));
            let output = engine.generate_suggestions_json(&request.to_string())?;
            write_output(&io.output, &output, compact)
        }

        Commands::Config => {
            let output = engine.config().to_json()?;
            write_output(Path::new("-"), &output, compact)
        }
    }
}

/// Read a request; a bare JSON array is wrapped under `list_key`
fn read_request(input: &Path, list_key: &str) -> Result<Value, FocusCliError> {
    let raw = if input.to_string_lossy() == "-" {
        if atty::is(atty::Stream::Stdin) {
            return Err(FocusCliError::NoInput);
        }
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        fs::read_to_string(input)?
    };

    if raw.trim().is_empty() {
        return Err(FocusCliError::NoInput);
    }

    let request: Value = serde_json::from_str(&raw)?;
    Ok(match request {
        Value::Array(_) => {
            let mut wrapped = serde_json::Map::new();
            wrapped.insert(list_key.to_string(), request);
            Value::Object(wrapped)
        }
        other => other,
    })
}

fn with_override(mut request: Value, key: &str, value: Option<Value>) -> Value {
    if let (Some(value), Some(object)) = (value, request.as_object_mut()) {
        object.insert(key.to_string(), value);
    }
    request
}

fn write_output(output: &Path, json: &str, compact: bool) -> Result<(), FocusCliError> {
    let data = if compact {
        serde_json::to_string(&serde_json::from_str::<Value>(json)?)?
    } else {
        json.to_string()
    };

    if output.to_string_lossy() == "-" {
        println!("{}", data);
    } else {
        fs::write(output, format!("{}\n", data))?;
    }
    Ok(())
}

// Error types

#[derive(Debug)]
enum FocusCliError {
    Io(io::Error),
    Engine(EngineError),
    Json(serde_json::Error),
    NoInput,
}

impl From<io::Error> for FocusCliError {
    fn from(e: io::Error) -> Self {
        FocusCliError::Io(e)
    }
}

impl From<EngineError> for FocusCliError {
    fn from(e: EngineError) -> Self {
        FocusCliError::Engine(e)
    }
}

impl From<serde_json::Error> for FocusCliError {
    fn from(e: serde_json::Error) -> Self {
        FocusCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn new(code: &str, message: String, hint: &str) -> Self {
        Self {
            code: code.to_string(),
            message,
            hint: Some(hint.to_string()),
        }
    }
}

impl From<FocusCliError> for CliError {
    fn from(e: FocusCliError) -> Self {
        match e {
            FocusCliError::Io(e) => {
                CliError::new("IO_ERROR", e.to_string(), "Check file paths and permissions")
            }
            FocusCliError::Json(e) => CliError::new("JSON_ERROR", e.to_string(), "Check JSON syntax"),
            FocusCliError::NoInput => CliError::new(
                "NO_INPUT",
                "No request received".to_string(),
                "Pipe a JSON request on stdin or pass --input <file>",
            ),
            FocusCliError::Engine(e) => {
                let message = e.to_string();
                match e {
                    EngineError::ParseError(_) => {
                        CliError::new("PARSE_ERROR", message, "Check the request shape")
                    }
                    EngineError::JsonError(_) => {
                        CliError::new("JSON_ERROR", message, "Check JSON syntax")
                    }
                    EngineError::MissingField(_) => {
                        CliError::new("MISSING_FIELD", message, "Add the named field to the request")
                    }
                    EngineError::InvalidTimestamp { .. } => CliError::new(
                        "INVALID_TIMESTAMP",
                        message,
                        "Use ISO-8601, e.g. 2024-01-15T09:30:00Z",
                    ),
                    EngineError::InvalidArgument(_) => {
                        CliError::new("INVALID_ARGUMENT", message, "Check numeric arguments")
                    }
                    EngineError::SummarizerError(_) => {
                        CliError::new("SUMMARIZER_ERROR", message, "Retry without a summarizer backend")
                    }
                    EngineError::ConfigError(_) => {
                        CliError::new("CONFIG_ERROR", message, "Check the --config file")
                    }
                }
            }
        }
    }
}
