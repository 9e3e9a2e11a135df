#![doc = include_str!("../README.md")]
#![allow(unused_assignments)] // thiserror/miette derive macros trigger false positives

use std::path::PathBuf;
use std::process::ExitCode;

use bpaf::Bpaf;
use jsonschema_form::{PreprocessError, RestoreError};
use tracing_subscriber::prelude::*;

mod commands;
mod document;

const LOG_ENV: &str = "JSONSCHEMA_FORM_LOG";

/// Levels accepted by `--log-level`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::EnumString, strum::IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// Filter directive used when `JSONSCHEMA_FORM_LOG` is not set.
fn log_directive(level: Option<LogLevel>, verbose: bool) -> &'static str {
    match level {
        Some(level) => level.into(),
        None if verbose => "info",
        None => "warn",
    }
}

/// Global options applied to all commands
#[derive(Debug, Clone, Bpaf)]
pub struct CliOptions {
    /// Log progress at info level
    #[bpaf(short('v'), long("verbose"), switch, fallback(false))]
    pub verbose: bool,

    /// Minimum level to log: debug, info, warn or error. Overrides `--verbose`
    /// and is ignored when JSONSCHEMA_FORM_LOG is set.
    #[bpaf(long("log-level"), argument("LEVEL"))]
    pub log_level: Option<LogLevel>,
}

#[derive(Debug, Clone, Bpaf)]
pub struct PreprocessArgs {
    /// Dotted path of a subtree to remove, e.g. `properties.internal` (repeatable)
    #[bpaf(long("remove"), argument("PATH"))]
    pub remove: Vec<String>,

    /// Keep object and array defaults as written
    #[bpaf(long("no-clean-defaults"), switch)]
    pub no_clean_defaults: bool,

    /// Compile the result with a JSON Schema validator before writing it
    #[bpaf(long("check"), switch)]
    pub check: bool,

    /// Write to FILE instead of stdout (`.yaml`/`.yml` writes YAML)
    #[bpaf(short('o'), long("output"), argument("FILE"))]
    pub output: Option<PathBuf>,

    /// Schema to preprocess (JSON or YAML)
    #[bpaf(positional("SCHEMA"))]
    pub schema: PathBuf,
}

#[derive(Debug, Clone, Bpaf)]
pub struct FormDataArgs {
    /// Write to FILE instead of stdout (`.yaml`/`.yml` writes YAML)
    #[bpaf(short('o'), long("output"), argument("FILE"))]
    pub output: Option<PathBuf>,

    /// Original (not preprocessed) schema
    #[bpaf(positional("SCHEMA"))]
    pub schema: PathBuf,

    /// Values in the original shape
    #[bpaf(positional("VALUES"))]
    pub values: PathBuf,
}

#[derive(Debug, Clone, Bpaf)]
pub struct RestoreArgs {
    /// Drop empty and null values from the restored data
    #[bpaf(long("clean"), switch)]
    pub clean: bool,

    /// Write to FILE instead of stdout (`.yaml`/`.yml` writes YAML)
    #[bpaf(short('o'), long("output"), argument("FILE"))]
    pub output: Option<PathBuf>,

    /// Original (not preprocessed) schema
    #[bpaf(positional("SCHEMA"))]
    pub schema: PathBuf,

    /// Data submitted by a form generated from the preprocessed schema
    #[bpaf(positional("FORM_DATA"))]
    pub values: PathBuf,
}

#[derive(Debug, Clone, Bpaf)]
#[bpaf(options, version, fallback_to_usage, generate(cli))]
#[allow(clippy::upper_case_acronyms)]
/// Prepare JSON Schemas for form renderers and map form data back
struct CLI {
    #[bpaf(external(cli_options), hide_usage)]
    options: CliOptions,

    #[bpaf(external(commands))]
    command: Commands,
}

#[derive(Debug, Clone, Bpaf)]
enum Commands {
    #[bpaf(command("preprocess"))]
    /// Rewrite a schema into a shape form renderers can edit
    Preprocess(#[bpaf(external(preprocess_args))] PreprocessArgs),

    #[bpaf(command("form-data"))]
    /// Reshape existing values to prefill a form
    FormData(#[bpaf(external(form_data_args))] FormDataArgs),

    #[bpaf(command("restore"))]
    /// Map submitted form data back to the original shape
    Restore(#[bpaf(external(restore_args))] RestoreArgs),

    #[bpaf(command("config-schema"))]
    /// Print the JSON Schema of jsonschema-form.toml
    ConfigSchema,

    #[bpaf(command("version"))]
    /// Print version information
    Version,
}

fn init_tracing(options: &CliOptions) {
    // Verbose entry/exit is only enabled when JSONSCHEMA_FORM_LOG is set.
    let (filter, explicit) = match tracing_subscriber::EnvFilter::try_from_env(LOG_ENV) {
        Ok(f) => (f, true),
        Err(_) => (
            tracing_subscriber::EnvFilter::new(log_directive(options.log_level, options.verbose)),
            false,
        ),
    };
    tracing_subscriber::registry()
        .with(
            tracing_tree::HierarchicalLayer::new(2)
                .with_targets(true)
                .with_bracketed_fields(true)
                .with_indent_lines(true)
                .with_verbose_exit(explicit)
                .with_verbose_entry(explicit)
                .with_timer(tracing_tree::time::Uptime::default())
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

/// Print an error, rendering library and parse errors as diagnostics.
fn report(error: anyhow::Error) {
    let error = match error.downcast::<document::ParseDiagnostic>() {
        Ok(diagnostic) => {
            eprintln!("{:?}", miette::Report::new(diagnostic));
            return;
        }
        Err(error) => error,
    };
    let error = match error.downcast::<PreprocessError>() {
        Ok(diagnostic) => {
            eprintln!("{:?}", miette::Report::new(diagnostic));
            return;
        }
        Err(error) => error,
    };
    match error.downcast::<RestoreError>() {
        Ok(diagnostic) => eprintln!("{:?}", miette::Report::new(diagnostic)),
        Err(error) => eprintln!("Error: {error:#}"),
    }
}

fn main() -> ExitCode {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .context_lines(2)
                .build(),
        )
    }))
    .ok();

    let cli = cli().run();
    init_tracing(&cli.options);

    let result = match cli.command {
        Commands::Preprocess(args) => commands::preprocess::run(&args),
        Commands::FormData(args) => commands::form_data::run(&args),
        Commands::Restore(args) => commands::restore::run(&args),
        Commands::ConfigSchema => document::write(&jsonschema_form_config::schema(), None),
        Commands::Version => {
            println!("jsonschema-form {}", env!("CARGO_PKG_VERSION"));
            return ExitCode::SUCCESS;
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report(e);
            ExitCode::from(1)
        }
    }
}
