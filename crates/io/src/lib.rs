//! File I/O: spreadsheet and text inputs, XLSX/CSV/JSON outputs.

pub mod csv;
pub mod json;
pub mod spreadsheet;
pub mod text;
pub mod xlsx;

use std::path::Path;

use rollcall_recon::{OutputTable, ReconError};

/// Default download name for the reordered spreadsheet.
pub const DEFAULT_OUTPUT_FILE: &str = "reordered_time_data.xlsx";

pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Xlsx,
    Csv,
    Json,
}

impl OutputFormat {
    /// Infer from a file extension, case-insensitively.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "xlsx" => Some(Self::Xlsx),
            "csv" => Some(Self::Csv),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Xlsx => XLSX_MIME,
            Self::Csv => "text/csv",
            Self::Json => "application/json",
        }
    }
}

/// Serialize the output table into an in-memory file.
pub fn render(table: &OutputTable, format: OutputFormat) -> Result<Vec<u8>, ReconError> {
    match format {
        OutputFormat::Xlsx => xlsx::to_buffer(table),
        OutputFormat::Csv => self::csv::to_bytes(table, b','),
        OutputFormat::Json => json::to_bytes(table),
    }
}

pub fn write_output(table: &OutputTable, format: OutputFormat, path: &Path) -> Result<(), ReconError> {
    log::debug!("writing {} row(s) to {}", table.len(), path.display());
    match format {
        OutputFormat::Xlsx => xlsx::write(table, path),
        OutputFormat::Csv => self::csv::write(table, path, b','),
        OutputFormat::Json => json::write(table, path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_from_extension() {
        assert_eq!(OutputFormat::from_path(Path::new("out.XLSX")), Some(OutputFormat::Xlsx));
        assert_eq!(OutputFormat::from_path(Path::new("dir/out.csv")), Some(OutputFormat::Csv));
        assert_eq!(OutputFormat::from_path(Path::new("out.json")), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::from_path(Path::new("out.ods")), None);
        assert_eq!(OutputFormat::from_path(Path::new("out")), None);
    }

    #[test]
    fn render_csv_is_deterministic() {
        let table = OutputTable {
            headers: vec!["Username".into(), "Reordered Total Time".into()],
            rows: vec![vec!["a".into(), "1".into()]],
        };
        assert_eq!(render(&table, OutputFormat::Csv).unwrap(), render(&table, OutputFormat::Csv).unwrap());
        assert_eq!(OutputFormat::Xlsx.mime_type(), XLSX_MIME);
    }
}
