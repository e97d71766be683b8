// rollcall CLI - reorder daily time reports by class roster

mod exit_codes;
mod reorder;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use rollcall_recon::{InputRole, ReconError, SchemaError};

use exit_codes::{recon_exit_code, EXIT_IO, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "rollcall")]
#[command(about = "Reorder a daily time report to match a class roster")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Log adapter decisions to stderr (same as RUST_LOG=debug)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the report's times in roster order
    #[command(after_help = "\
Examples:
  rollcall reorder daily.csv roster.xlsx
  rollcall reorder daily.csv roster.txt -o monday.xlsx
  rollcall reorder daily.xlsx roster.xlsx --preserve-columns
  rollcall reorder daily.csv roster.csv --roster-column Email --to csv -o -
  rollcall reorder daily.csv roster.xlsx --config classroom.recon.toml --json")]
    Reorder(reorder::ReorderArgs),

    /// Load and validate both inputs without writing output
    #[command(after_help = "\
Examples:
  rollcall check daily.csv roster.xlsx
  rollcall check daily.csv roster.xlsx --strict --json")]
    Check(reorder::CheckArgs),

    /// Print the effective configuration as TOML
    #[command(after_help = "\
Examples:
  rollcall config > classroom.recon.toml
  rollcall config --config classroom.recon.toml")]
    Config {
        /// Config file to merge over the defaults
        #[arg(long, value_name = "FILE")]
        config: Option<std::path::PathBuf>,
    },
}

fn long_version() -> &'static str {
    if cfg!(debug_assertions) {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nengine:  rollcall-recon ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   debug",
            "\ntarget:  ", env!("TARGET"),
        )
    } else {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nengine:  rollcall-recon ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   release",
            "\ntarget:  ", env!("TARGET"),
        )
    }
}

/// `RUST_LOG` wins; otherwise `warn`, or `debug` with `--verbose`.
/// Records print as `warning: ...` so engine warnings read like CLI output.
fn init_logging(verbose: bool) {
    use std::io::Write;

    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format(|buf, record| {
            let level = match record.level() {
                log::Level::Error => "error",
                log::Level::Warn => "warning",
                log::Level::Info => "info",
                log::Level::Debug => "debug",
                log::Level::Trace => "trace",
            };
            writeln!(buf, "{level}: {}", record.args())
        })
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Reorder(args) => reorder::cmd_reorder(args),
        Commands::Check(args) => reorder::cmd_check(args),
        Commands::Config { config } => reorder::cmd_config(config),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_IO, message: msg.into(), hint: None }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<ReconError> for CliError {
    fn from(err: ReconError) -> Self {
        let code = recon_exit_code(&err);
        let hint = match &err {
            ReconError::Schema(SchemaError::MissingColumns { input: InputRole::Report, .. }) => Some(
                "name the report's columns with --key-column/--time-column, or skip preamble rows with --skip-before-header",
            ),
            ReconError::Schema(SchemaError::MissingColumns { input: InputRole::Roster, .. }) => {
                Some("--roster-column must match a roster header exactly")
            }
            ReconError::Schema(SchemaError::TooFewColumns { .. }) => Some(
                "identifiers are read from column B; use --roster-column 0 or --roster-format lines for a one-column list",
            ),
            ReconError::ConfigParse(_) | ReconError::ConfigValidation(_) => {
                Some("run `rollcall config` to print a valid starting config")
            }
            _ => None,
        };
        Self { code, message: err.to_string(), hint: hint.map(String::from) }
    }
}
