//! Prefire Monitor Core - Command Line Interface
//!
//! The main entry point for pf-core, handling:
//! - Running the monitoring job over an event file
//! - Classifying single accept histories
//! - Configuration inspection and validation
//! - JSON schemas of the data formats

use clap::{Args, CommandFactory, Parser, Subcommand};
use pf_common::{AcceptRecord, OutputFormat, StructuredError, SCHEMA_VERSION};
use pf_core::config::{load_config, ConfigError, ConfigOptions, LoadedConfig};
use pf_core::exit_codes::ExitCode;
use pf_core::job::MonitoringJob;
use pf_core::logging::{event_names, init_logging, LogConfig, LogFormat, Stage};
use pf_core::prefire::{classify, AcceptHistory, Classification};
use pf_core::schema::{available_schemas, generate_all_schemas, generate_schema};
use pf_core::source::JsonlEventReader;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tracing::{error, info_span};

/// Prefire Monitor Core - trigger prefiring monitoring and harvesting
#[derive(Parser)]
#[command(name = "pf-core")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Path to monitor.json
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Configuration preset applied before the file (online, emulator)
    #[arg(long, global = true, env = "PF_MONITOR_PRESET")]
    preset: Option<String>,

    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "json")]
    format: OutputFormat,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log format on stderr (human, jsonl)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,
}

#[derive(Subcommand)]
enum Commands {
    /// Process an event file, harvest ratios and print the job report
    Run(RunArgs),

    /// Classify one accept history
    Classify(ClassifyArgs),

    /// Load and validate the configuration
    Check,

    /// Configuration management
    Config(ConfigArgs),

    /// Print JSON schemas of the data formats
    Schema(SchemaArgs),

    /// Generate shell completions
    Completions {
        /// Target shell
        shell: clap_complete::Shell,
    },

    /// Print version information
    Version,
}

// ============================================================================
// Command argument structs
// ============================================================================

#[derive(Args, Debug)]
struct RunArgs {
    /// Event file in JSON Lines, or '-' for stdin
    #[arg(long)]
    events: PathBuf,

    /// Write the report to a file instead of stdout
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Include every published histogram in the report
    #[arg(long)]
    histograms: bool,
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct ClassifyArgs {
    /// Distances to previous accepts in bunch crossings, most recent first
    #[arg(long, value_delimiter = ',')]
    history: Option<Vec<u64>>,

    /// Accept record as JSON
    #[arg(long)]
    record: Option<String>,
}

#[derive(Args, Debug)]
struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Show the effective configuration
    Show,
    /// Print the JSON schema of monitor.json
    Schema,
}

#[derive(Args, Debug)]
struct SchemaArgs {
    /// Type to print the schema of
    type_name: Option<String>,

    /// List available types
    #[arg(long)]
    list: bool,

    /// Print every schema
    #[arg(long, conflicts_with = "type_name")]
    all: bool,
}

// ============================================================================
// Main entry point
// ============================================================================

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() {
                ExitCode::ArgsError
            } else {
                ExitCode::Clean
            };
            let _ = e.print();
            std::process::exit(code.as_i32());
        }
    };

    let mut log_config = LogConfig::from_env(None, cli.global.log_format);
    log_config.level = log_config
        .level
        .adjusted(cli.global.verbose, cli.global.quiet);
    init_logging(&log_config);

    let exit_code = match cli.command {
        None => {
            let _ = Cli::command().print_help();
            ExitCode::Clean
        }
        Some(Commands::Run(args)) => run_job(&cli.global, &args),
        Some(Commands::Classify(args)) => run_classify(&cli.global, &args),
        Some(Commands::Check) => run_check(&cli.global),
        Some(Commands::Config(args)) => run_config(&cli.global, &args),
        Some(Commands::Schema(args)) => run_schema(&cli.global, &args),
        Some(Commands::Completions { shell }) => {
            clap_complete::generate(shell, &mut Cli::command(), "pf-core", &mut std::io::stdout());
            ExitCode::Clean
        }
        Some(Commands::Version) => {
            print_version(&cli.global);
            ExitCode::Clean
        }
    };

    std::process::exit(exit_code.as_i32());
}

// ============================================================================
// Command implementations
// ============================================================================

fn config_options(global: &GlobalOpts) -> ConfigOptions {
    ConfigOptions {
        path: global.config.clone(),
        preset: global.preset.clone(),
    }
}

fn run_job(global: &GlobalOpts, args: &RunArgs) -> ExitCode {
    let loaded = match load_config(&config_options(global)) {
        Ok(loaded) => loaded,
        Err(e) => return output_config_error(global, &e),
    };

    let mut reader = match JsonlEventReader::open(&args.events) {
        Ok(reader) => reader,
        Err(e) => return output_error(global, "run", ExitCode::InputError, &e),
    };

    let mut job = match MonitoringJob::initialize(&loaded.config) {
        Ok(job) => job,
        Err(e) => return output_error(global, "run", ExitCode::InternalError, &e),
    };

    for item in reader.by_ref() {
        let event = match item {
            Ok(event) => event,
            Err(e) => return output_error(global, "run", ExitCode::InputError, &e),
        };
        if let Err(e) = job.on_event(&event) {
            return output_error(global, "run", ExitCode::InternalError, &e);
        }
    }

    let report = match job.finalize() {
        Ok(report) => report,
        Err(e) => return output_error(global, "run", ExitCode::InternalError, &e),
    };

    let _span = info_span!("output", run_id = %report.run_id, stage = %Stage::Output).entered();

    let anomalies = report.stats.has_anomalies() || reader.malformed() > 0;
    let mut response = json!({
        "schema_version": SCHEMA_VERSION,
        "run_id": report.run_id,
        "generated_at": report.generated_at.to_rfc3339(),
        "status": if anomalies { "anomalies" } else { "clean" },
        "config": loaded.snapshot,
        "input": {
            "path": args.events.display().to_string(),
            "lines": reader.lines_read(),
            "malformed": reader.malformed(),
        },
        "stats": report.stats,
        "harvest": report.harvest,
        "ratios": report.ratios,
    });
    if args.histograms {
        response["histograms"] = json!(report.store);
    }

    let exit = if anomalies {
        ExitCode::Anomalies
    } else {
        ExitCode::Clean
    };

    if let Some(path) = &args.output {
        return match write_json(path, &response) {
            Ok(()) => {
                if global.format == OutputFormat::Summary {
                    println!(
                        "[{}] run: {} events, report written to {}",
                        report.run_id,
                        report.stats.events,
                        path.display()
                    );
                }
                exit
            }
            Err(e) => output_error(global, "run", ExitCode::IoError, &e),
        };
    }

    match global.format {
        OutputFormat::Json => print_json(&response),
        OutputFormat::Summary => println!(
            "[{}] run: {} events ({} unprefirable, {} prefirable, {} unclassified), {} lumi blocks, {}",
            report.run_id,
            report.stats.events,
            report.stats.unprefirable,
            report.stats.prefirable,
            report.stats.unclassified,
            report.stats.luminosity_blocks,
            if anomalies { "ANOMALIES" } else { "CLEAN" }
        ),
        OutputFormat::Exitcode => {}
    }

    exit
}

fn run_classify(global: &GlobalOpts, args: &ClassifyArgs) -> ExitCode {
    let (distances, verdict): (Vec<u64>, Classification) = match (&args.history, &args.record) {
        (Some(history), _) => {
            let history = AcceptHistory::from_distances(history.clone());
            (history.distances().to_vec(), classify(&history))
        }
        (None, Some(raw)) => match serde_json::from_str::<AcceptRecord>(raw) {
            Ok(record) => {
                let history = AcceptHistory::from_record(&record);
                (history.distances().to_vec(), classify(&history))
            }
            Err(e) => {
                return output_error(
                    global,
                    "classify",
                    ExitCode::ArgsError,
                    &pf_common::Error::InvalidEvent(e.to_string()),
                )
            }
        },
        (None, None) => {
            return output_error(
                global,
                "classify",
                ExitCode::ArgsError,
                &pf_common::Error::InvalidEvent("no history given".to_string()),
            )
        }
    };

    match global.format {
        OutputFormat::Json => print_json(&json!({
            "schema_version": SCHEMA_VERSION,
            "generated_at": chrono::Utc::now().to_rfc3339(),
            "distances": distances,
            "classification": verdict,
        })),
        OutputFormat::Summary => {
            let outcome = match verdict.fired_rule {
                Some(rule) => format!("unprefirable ({})", rule),
                None => "prefirable".to_string(),
            };
            println!(
                "classify: {}, {} diagnostic(s)",
                outcome,
                verdict.diagnostics.len()
            );
        }
        OutputFormat::Exitcode => {}
    }

    if verdict.has_diagnostics() {
        ExitCode::Anomalies
    } else {
        ExitCode::Clean
    }
}

fn run_check(global: &GlobalOpts) -> ExitCode {
    let loaded = match load_config(&config_options(global)) {
        Ok(loaded) => loaded,
        Err(e) => return output_config_error(global, &e),
    };

    let job = match MonitoringJob::initialize(&loaded.config) {
        Ok(job) => job,
        Err(e) => return output_error(global, "check", ExitCode::ConfigError, &e),
    };

    match global.format {
        OutputFormat::Json => print_json(&json!({
            "schema_version": SCHEMA_VERSION,
            "generated_at": chrono::Utc::now().to_rfc3339(),
            "status": "ok",
            "source": loaded.paths.monitor_source.to_string(),
            "using_defaults": loaded.paths.monitor.is_none(),
            "snapshot": loaded.snapshot,
            "monitors": job.monitor_names(),
        })),
        OutputFormat::Summary => println!(
            "check: OK ({}, {})",
            loaded.paths.monitor_source,
            loaded.snapshot.short_id()
        ),
        OutputFormat::Exitcode => {}
    }

    ExitCode::Clean
}

fn run_config(global: &GlobalOpts, args: &ConfigArgs) -> ExitCode {
    match &args.command {
        ConfigCommands::Show => match load_config(&config_options(global)) {
            Ok(loaded) => {
                print_config(global, &loaded);
                ExitCode::Clean
            }
            Err(e) => output_config_error(global, &e),
        },
        ConfigCommands::Schema => print_schema(global, "MonitorConfig"),
    }
}

fn print_config(global: &GlobalOpts, loaded: &LoadedConfig) {
    match global.format {
        OutputFormat::Json => print_json(&json!({
            "schema_version": SCHEMA_VERSION,
            "generated_at": chrono::Utc::now().to_rfc3339(),
            "source": loaded.paths.monitor_source.to_string(),
            "path": loaded.paths.monitor.as_ref().map(|p| p.display().to_string()),
            "hash": loaded.snapshot.hash,
            "config": loaded.config,
        })),
        OutputFormat::Summary => println!(
            "config: {} (menu '{}', {} algorithms)",
            loaded.paths.monitor_source,
            loaded.config.trigger_menu.name,
            loaded.config.trigger_menu.size()
        ),
        OutputFormat::Exitcode => {}
    }
}

fn run_schema(global: &GlobalOpts, args: &SchemaArgs) -> ExitCode {
    if args.list {
        match global.format {
            OutputFormat::Json => {
                let types: Vec<Value> = available_schemas()
                    .into_iter()
                    .map(|(name, description)| json!({"name": name, "description": description}))
                    .collect();
                print_json(&json!({ "schemas": types }));
            }
            OutputFormat::Summary => {
                for (name, description) in available_schemas() {
                    println!("{:<16} {}", name, description);
                }
            }
            OutputFormat::Exitcode => {}
        }
        return ExitCode::Clean;
    }

    if args.all {
        if global.format.is_machine_readable() {
            print_json(&json!(generate_all_schemas()));
        }
        return ExitCode::Clean;
    }

    match &args.type_name {
        Some(name) => print_schema(global, name),
        None => {
            eprintln!("Specify a type name, --list or --all");
            ExitCode::ArgsError
        }
    }
}

fn print_schema(global: &GlobalOpts, name: &str) -> ExitCode {
    match generate_schema(name) {
        Some(schema) => {
            if global.format != OutputFormat::Exitcode {
                print_json(&schema);
            }
            ExitCode::Clean
        }
        None => {
            let known: Vec<&str> = available_schemas().into_iter().map(|(n, _)| n).collect();
            eprintln!("Unknown type '{}'. Available: {}", name, known.join(", "));
            ExitCode::ArgsError
        }
    }
}

fn print_version(global: &GlobalOpts) {
    let version_info = json!({
        "schema_version": SCHEMA_VERSION,
        "pf_core_version": env!("CARGO_PKG_VERSION"),
        "config_schema_version": pf_config::CONFIG_SCHEMA_VERSION,
    });

    match global.format {
        OutputFormat::Json => print_json(&version_info),
        OutputFormat::Exitcode => {}
        OutputFormat::Summary => {
            println!("pf-core {}", env!("CARGO_PKG_VERSION"));
            println!("schema version: {}", SCHEMA_VERSION);
        }
    }
}

// ============================================================================
// Output helpers
// ============================================================================

fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{}", text),
        Err(e) => eprintln!("failed to serialize output: {}", e),
    }
}

fn write_json(path: &Path, value: &Value) -> pf_common::Result<()> {
    let text = serde_json::to_string_pretty(value)?;
    std::fs::write(path, text)?;
    Ok(())
}

/// Output a config error in the appropriate format.
fn output_config_error(global: &GlobalOpts, error: &ConfigError) -> ExitCode {
    let exit_code = match error {
        ConfigError::IoError { .. } => ExitCode::IoError,
        ConfigError::Preset(_) => ExitCode::ArgsError,
        ConfigError::NotFound { .. }
        | ConfigError::ParseError { .. }
        | ConfigError::ValidationError(_) => ExitCode::ConfigError,
    };

    error!(target: event_names::CONFIG_ERROR, code = error.code(), "{}", error);

    let response = json!({
        "schema_version": SCHEMA_VERSION,
        "generated_at": chrono::Utc::now().to_rfc3339(),
        "status": "error",
        "error": {
            "code": error.code(),
            "exit_code": exit_code.code_name(),
            "message": error.to_string(),
        }
    });

    match global.format {
        OutputFormat::Json => match serde_json::to_string_pretty(&response) {
            Ok(text) => eprintln!("{}", text),
            Err(_) => eprintln!("config error: {}", error),
        },
        OutputFormat::Summary => eprintln!("config error: {}", error),
        OutputFormat::Exitcode => {}
    }

    exit_code
}

/// Output a runtime error in the appropriate format.
fn output_error(
    global: &GlobalOpts,
    command: &str,
    exit_code: ExitCode,
    error: &pf_common::Error,
) -> ExitCode {
    if exit_code.is_internal_error() {
        error!(target: event_names::INTERNAL_ERROR, command, "{}", error);
    }

    let response = json!({
        "schema_version": SCHEMA_VERSION,
        "generated_at": chrono::Utc::now().to_rfc3339(),
        "status": "error",
        "command": command,
        "exit_code": exit_code.code_name(),
        "error": StructuredError::from(error),
    });

    match global.format {
        OutputFormat::Json => match serde_json::to_string_pretty(&response) {
            Ok(text) => eprintln!("{}", text),
            Err(_) => eprintln!("{} error: {}", command, error),
        },
        OutputFormat::Summary => eprintln!("{} error: {}", command, error),
        OutputFormat::Exitcode => {}
    }

    exit_code
}
