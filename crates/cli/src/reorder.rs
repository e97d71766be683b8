//! `rollcall reorder`, `check` and `config`.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::{Args, ValueEnum};
use serde::Serialize;

use rollcall_io::{spreadsheet, text, OutputFormat, DEFAULT_OUTPUT_FILE};
use rollcall_recon::load::{load_canonical_csv, load_canonical_lines, load_source_csv};
use rollcall_recon::model::{ReconMeta, ReconSummary};
use rollcall_recon::{
    reconcile, CanonicalFormat, CanonicalSequence, ColumnRef, EmptyKeyPolicy, ReconConfig,
    ReconResult, ReconWarning, SourceFormat, SourceTable,
};

use crate::exit_codes::EXIT_STRICT_WARNINGS;
use crate::CliError;

const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];

#[derive(Clone, Copy, ValueEnum)]
pub enum ReportFormat {
    Csv,
    Spreadsheet,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum RosterFormat {
    Csv,
    Spreadsheet,
    /// One identifier per line
    Lines,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OutFormat {
    Xlsx,
    Csv,
    Json,
}

impl From<ReportFormat> for SourceFormat {
    fn from(f: ReportFormat) -> Self {
        match f {
            ReportFormat::Csv => SourceFormat::Csv,
            ReportFormat::Spreadsheet => SourceFormat::Spreadsheet,
        }
    }
}

impl From<RosterFormat> for CanonicalFormat {
    fn from(f: RosterFormat) -> Self {
        match f {
            RosterFormat::Csv => CanonicalFormat::Csv,
            RosterFormat::Spreadsheet => CanonicalFormat::Spreadsheet,
            RosterFormat::Lines => CanonicalFormat::Lines,
        }
    }
}

impl From<OutFormat> for OutputFormat {
    fn from(f: OutFormat) -> Self {
        match f {
            OutFormat::Xlsx => OutputFormat::Xlsx,
            OutFormat::Csv => OutputFormat::Csv,
            OutFormat::Json => OutputFormat::Json,
        }
    }
}

/// Options shared by `reorder` and `check`. Flags override the config file.
#[derive(Args)]
pub struct InputArgs {
    /// Daily report (.csv, .xlsx, .xls, .ods)
    pub report: PathBuf,

    /// Class roster (.xlsx/.ods with ids in column B, .csv, or .txt with one id per line)
    pub roster: PathBuf,

    /// Report format (default: from extension)
    #[arg(long)]
    pub report_format: Option<ReportFormat>,

    /// Roster format (default: from extension)
    #[arg(long)]
    pub roster_format: Option<RosterFormat>,

    /// Rows to skip above the report header
    #[arg(long, value_name = "N")]
    pub skip_before_header: Option<usize>,

    /// Rows to skip directly below the report header
    #[arg(long, value_name = "N")]
    pub skip_after_header: Option<usize>,

    /// Report column holding student identifiers [default: Username]
    #[arg(long, value_name = "NAME")]
    pub key_column: Option<String>,

    /// Report column holding the time value [default: Total time]
    #[arg(long, value_name = "NAME")]
    pub time_column: Option<String>,

    /// Roster identifier column: zero-based index or header name [default: 1]
    #[arg(long, value_name = "INDEX|NAME")]
    pub roster_column: Option<ColumnRef>,

    /// Rows to skip at the top of the roster
    #[arg(long, value_name = "N")]
    pub roster_skip: Option<usize>,

    /// Roster has no header row
    #[arg(long)]
    pub no_roster_header: bool,

    /// Keep roster rows with an empty identifier
    #[arg(long)]
    pub keep_empty: bool,

    /// Worksheet to read from a spreadsheet report
    #[arg(long, value_name = "NAME")]
    pub sheet: Option<String>,

    /// Worksheet to read from a spreadsheet roster
    #[arg(long, value_name = "NAME")]
    pub roster_sheet: Option<String>,

    /// TOML config file (see `rollcall config`)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Treat reconciliation warnings as errors (exit 7)
    #[arg(long)]
    pub strict: bool,
}

#[derive(Args)]
pub struct ReorderArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Output file, or - for stdout
    #[arg(long, short = 'o', value_name = "PATH", default_value = DEFAULT_OUTPUT_FILE)]
    pub output: PathBuf,

    /// Output format (default: from output extension)
    #[arg(long)]
    pub to: Option<OutFormat>,

    /// Keep every roster column and append the time column
    #[arg(long)]
    pub preserve_columns: bool,

    /// Value for students missing from the report [default: 00:00:00]
    #[arg(long = "default", value_name = "VALUE")]
    pub default_value: Option<String>,

    /// Header of the time column in the output [default: Reordered Total Time]
    #[arg(long, value_name = "NAME")]
    pub output_column: Option<String>,

    /// Print a JSON run summary to stdout
    #[arg(long)]
    pub json: bool,

    /// Suppress the summary line
    #[arg(long, short = 'q')]
    pub quiet: bool,
}

#[derive(Args)]
pub struct CheckArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Print a JSON summary to stdout
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct RunSummary<'a> {
    run_at: String,
    report: String,
    roster: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<String>,
    meta: &'a ReconMeta,
    summary: &'a ReconSummary,
    warnings: &'a [ReconWarning],
}

impl<'a> RunSummary<'a> {
    fn new(input: &InputArgs, output: Option<&Path>, result: &'a ReconResult) -> Self {
        Self {
            run_at: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            report: input.report.display().to_string(),
            roster: input.roster.display().to_string(),
            output: output.map(|p| p.display().to_string()),
            meta: &result.meta,
            summary: &result.summary,
            warnings: &result.warnings,
        }
    }

    fn print(&self) -> Result<(), CliError> {
        let json = serde_json::to_string_pretty(self).map_err(|e| CliError::io(e.to_string()))?;
        println!("{json}");
        Ok(())
    }
}

// ============================================================================
// reorder
// ============================================================================

pub fn cmd_reorder(args: ReorderArgs) -> Result<(), CliError> {
    let mut config = load_config(args.input.config.as_deref())?;
    args.input.apply(&mut config);
    if args.preserve_columns {
        config.preserve_extra_columns = true;
    }
    if let Some(value) = &args.default_value {
        config.default_value = value.clone();
    }
    if let Some(column) = &args.output_column {
        config.output_column = column.clone();
    }
    config.validate()?;

    let to_stdout = args.output.to_str() == Some("-");
    if to_stdout && args.json {
        return Err(CliError::args("--json and `-o -` both write to stdout")
            .with_hint("write the table to a file with -o PATH"));
    }
    let format = output_format(&args.output, args.to, to_stdout)?;

    let result = run(&args.input, &config)?;
    check_strict(&result, args.input.strict)?;

    if to_stdout {
        let bytes = rollcall_io::render(&result.table, format)?;
        io::stdout()
            .lock()
            .write_all(&bytes)
            .map_err(|e| CliError::io(format!("cannot write to stdout: {e}")))?;
    } else {
        rollcall_io::write_output(&result.table, format, &args.output)?;
    }

    if args.json {
        RunSummary::new(&args.input, Some(&args.output), &result).print()?;
    } else if !args.quiet {
        let s = &result.summary;
        let target = if to_stdout { "stdout".to_string() } else { args.output.display().to_string() };
        eprintln!(
            "wrote {} row(s) to {}: {} matched, {} set to '{}'",
            s.canonical_rows, target, s.matched, s.defaulted, result.meta.default_value
        );
    }
    Ok(())
}

fn output_format(path: &Path, explicit: Option<OutFormat>, to_stdout: bool) -> Result<OutputFormat, CliError> {
    if let Some(format) = explicit {
        return Ok(format.into());
    }
    if to_stdout {
        return Err(CliError::args("writing to stdout requires --to")
            .with_hint("add --to csv, --to json or --to xlsx"));
    }
    OutputFormat::from_path(path).ok_or_else(|| {
        CliError::args(format!("cannot infer output format from '{}'", path.display()))
            .with_hint("use a .xlsx, .csv or .json file name, or pass --to")
    })
}

// ============================================================================
// check
// ============================================================================

pub fn cmd_check(args: CheckArgs) -> Result<(), CliError> {
    let mut config = load_config(args.input.config.as_deref())?;
    args.input.apply(&mut config);
    config.validate()?;

    let result = run(&args.input, &config)?;
    check_strict(&result, args.input.strict)?;

    if args.json {
        return RunSummary::new(&args.input, None, &result).print();
    }

    let s = &result.summary;
    println!("report:  {} record(s), {} distinct identifier(s)", s.source_records, s.distinct_identifiers);
    println!("roster:  {} student(s), {} empty row(s) dropped", s.canonical_rows, s.dropped_empty_keys);
    println!("matched: {}", s.matched);
    println!("missing: {} (would be '{}')", s.defaulted, result.meta.default_value);
    println!("unused:  {} report identifier(s) not on the roster", s.unused_identifiers);
    if !result.warnings.is_empty() {
        println!("warnings: {}", result.warnings.len());
    }
    Ok(())
}

// ============================================================================
// config
// ============================================================================

pub fn cmd_config(path: Option<PathBuf>) -> Result<(), CliError> {
    let config = load_config(path.as_deref())?;
    print!("{}", config.to_toml()?);
    Ok(())
}

// ============================================================================
// shared
// ============================================================================

impl InputArgs {
    fn apply(&self, config: &mut ReconConfig) {
        let source = &mut config.source;
        if let Some(n) = self.skip_before_header {
            source.skip_before_header = n;
        }
        if let Some(n) = self.skip_after_header {
            source.skip_after_header = n;
        }
        if let Some(name) = &self.key_column {
            source.key_column = name.clone();
        }
        if let Some(name) = &self.time_column {
            source.value_column = name.clone();
        }
        if self.sheet.is_some() {
            source.sheet = self.sheet.clone();
        }

        let canonical = &mut config.canonical;
        if let Some(column) = &self.roster_column {
            canonical.column = column.clone();
        }
        if let Some(n) = self.roster_skip {
            canonical.skip_rows = n;
        }
        if self.no_roster_header {
            canonical.has_header = false;
        }
        if self.keep_empty {
            canonical.empty_keys = EmptyKeyPolicy::Keep;
        }
        if self.roster_sheet.is_some() {
            canonical.sheet = self.roster_sheet.clone();
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<ReconConfig, CliError> {
    let Some(path) = path else {
        return Ok(ReconConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .map_err(|e| CliError::io(format!("cannot read config {}: {e}", path.display())))?;
    log::debug!("loaded config from {}", path.display());
    Ok(ReconConfig::from_toml(&text)?)
}

fn extension(path: &Path) -> Option<String> {
    path.extension().and_then(|e| e.to_str()).map(|e| e.to_ascii_lowercase())
}

fn report_format(path: &Path, explicit: Option<ReportFormat>) -> Result<SourceFormat, CliError> {
    if let Some(format) = explicit {
        return Ok(format.into());
    }
    match extension(path).as_deref() {
        Some("csv" | "tsv" | "txt") => Ok(SourceFormat::Csv),
        Some(ext) if SPREADSHEET_EXTENSIONS.contains(&ext) => Ok(SourceFormat::Spreadsheet),
        _ => Err(CliError::args(format!("cannot tell the format of report '{}'", path.display()))
            .with_hint("pass --report-format csv or --report-format spreadsheet")),
    }
}

fn roster_format(path: &Path, explicit: Option<RosterFormat>) -> Result<CanonicalFormat, CliError> {
    if let Some(format) = explicit {
        return Ok(format.into());
    }
    match extension(path).as_deref() {
        Some("txt") => Ok(CanonicalFormat::Lines),
        Some("csv" | "tsv") => Ok(CanonicalFormat::Csv),
        Some(ext) if SPREADSHEET_EXTENSIONS.contains(&ext) => Ok(CanonicalFormat::Spreadsheet),
        _ => Err(CliError::args(format!("cannot tell the format of roster '{}'", path.display()))
            .with_hint("pass --roster-format csv, spreadsheet or lines")),
    }
}

fn load_report(path: &Path, format: SourceFormat, config: &ReconConfig) -> Result<SourceTable, CliError> {
    let table = match format {
        SourceFormat::Csv => load_source_csv(&text::read_file_as_utf8(path)?, &config.source)?,
        SourceFormat::Spreadsheet => spreadsheet::load_source(path, &config.source)?,
    };
    Ok(table)
}

fn load_roster(path: &Path, format: CanonicalFormat, config: &ReconConfig) -> Result<CanonicalSequence, CliError> {
    let roster = match format {
        CanonicalFormat::Csv => load_canonical_csv(&text::read_file_as_utf8(path)?, &config.canonical)?,
        CanonicalFormat::Spreadsheet => spreadsheet::load_canonical(path, &config.canonical)?,
        CanonicalFormat::Lines => load_canonical_lines(&text::read_file_as_utf8(path)?, &config.canonical),
    };
    Ok(roster)
}

fn run(input: &InputArgs, config: &ReconConfig) -> Result<ReconResult, CliError> {
    let report_fmt = report_format(&input.report, input.report_format)?;
    let roster_fmt = roster_format(&input.roster, input.roster_format)?;

    let source = load_report(&input.report, report_fmt, config)?;
    let canonical = load_roster(&input.roster, roster_fmt, config)?;
    log::debug!("report: {} record(s); roster: {} entr(ies)", source.len(), canonical.len());

    Ok(reconcile(&source, &canonical, &config.reconcile_options())?)
}

fn check_strict(result: &ReconResult, strict: bool) -> Result<(), CliError> {
    if strict && !result.warnings.is_empty() {
        return Err(CliError {
            code: EXIT_STRICT_WARNINGS,
            message: format!("{} warning(s) with --strict; nothing written", result.warnings.len()),
            hint: Some("fix the report or drop --strict".into()),
        });
    }
    Ok(())
}
