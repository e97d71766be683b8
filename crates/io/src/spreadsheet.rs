// Spreadsheet import (xlsx, xls, xlsb, ods) via calamine

use std::io::{Cursor, Read, Seek};
use std::path::Path;

use calamine::{open_workbook_auto, open_workbook_auto_from_rs, Data, Reader, Sheets};
use chrono::{Days, NaiveDate};
use rollcall_recon::load::{canonical_from_rows, source_from_rows};
use rollcall_recon::{CanonicalOptions, CanonicalSequence, InputRole, ReconError, SourceOptions, SourceTable};

/// Read one worksheet as rows of display strings.
///
/// Rows start at the first used row; leading empty columns are kept so
/// column B is always index 1.
pub fn read_rows(path: &Path, sheet: Option<&str>, input: InputRole) -> Result<Vec<Vec<String>>, ReconError> {
    let workbook = open_workbook_auto(path).map_err(|e| ReconError::Parse {
        input,
        cause: format!("Failed to open spreadsheet {}: {e}", path.display()),
    })?;
    rows_from_workbook(workbook, sheet, input)
}

/// Same as [`read_rows`] for an in-memory upload.
pub fn read_rows_from_bytes(bytes: &[u8], sheet: Option<&str>, input: InputRole) -> Result<Vec<Vec<String>>, ReconError> {
    let workbook = open_workbook_auto_from_rs(Cursor::new(bytes)).map_err(|e| ReconError::Parse {
        input,
        cause: format!("Failed to open spreadsheet: {e}"),
    })?;
    rows_from_workbook(workbook, sheet, input)
}

fn rows_from_workbook<RS: Read + Seek>(
    mut workbook: Sheets<RS>,
    sheet: Option<&str>,
    input: InputRole,
) -> Result<Vec<Vec<String>>, ReconError> {
    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    let sheet_name = match sheet {
        Some(name) => sheet_names.iter().find(|s| s.as_str() == name).cloned().ok_or_else(|| {
            ReconError::Parse {
                input,
                cause: format!("no sheet named '{name}' (found: {})", sheet_names.join(", ")),
            }
        })?,
        None => sheet_names.first().cloned().ok_or_else(|| ReconError::Parse {
            input,
            cause: "spreadsheet contains no sheets".into(),
        })?,
    };

    let range = workbook.worksheet_range(&sheet_name).map_err(|e| ReconError::Parse {
        input,
        cause: format!("Failed to read sheet '{sheet_name}': {e}"),
    })?;

    // Range start offset (data may not begin at A1)
    let (_, start_col) = range.start().unwrap_or((0, 0));
    log::debug!("{input}: reading sheet '{sheet_name}' ({}x{})", range.height(), range.width());

    let rows = range
        .rows()
        .map(|row| {
            let mut cells: Vec<String> = vec![String::new(); start_col as usize];
            cells.extend(row.iter().map(cell_to_string));
            cells
        })
        .collect();
    Ok(rows)
}

/// Render a cell the way it reads in the sheet: integers without a decimal
/// point, times as `HH:MM:SS`, dates as `YYYY-MM-DD`.
pub fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(n) => {
            // Format nicely: integers without decimals
            if n.fract() == 0.0 && n.abs() < 1e15 {
                format!("{}", *n as i64)
            } else {
                format!("{}", n)
            }
        }
        Data::Int(n) => n.to_string(),
        Data::Bool(b) => (if *b { "TRUE" } else { "FALSE" }).to_string(),
        Data::Error(e) => format!("#{:?}", e),
        Data::DateTime(dt) => {
            if dt.is_duration() {
                format_duration(dt.as_f64())
            } else {
                format_serial(dt.as_f64())
            }
        }
        // ISO strings are already text
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
    }
}

fn split_seconds(fraction_of_day: f64) -> i64 {
    (fraction_of_day * 86_400.0).round() as i64
}

fn hms(secs: i64) -> String {
    format!("{:02}:{:02}:{:02}", secs / 3600, secs % 3600 / 60, secs % 60)
}

/// Elapsed time in days → `H:MM:SS` with unbounded hours (`[h]:mm:ss`).
pub fn format_duration(days: f64) -> String {
    if days < 0.0 {
        return format!("-{}", hms(split_seconds(-days)));
    }
    hms(split_seconds(days))
}

/// Excel serial (1900 system) → `HH:MM:SS`, `YYYY-MM-DD` or both.
pub fn format_serial(serial: f64) -> String {
    if serial < 0.0 {
        return format!("{}", serial);
    }
    let mut days = serial.floor() as u64;
    let mut secs = split_seconds(serial.fract());
    if secs >= 86_400 {
        days += 1;
        secs -= 86_400;
    }

    if days == 0 {
        return hms(secs);
    }

    let date = NaiveDate::from_ymd_opt(1899, 12, 30).and_then(|epoch| epoch.checked_add_days(Days::new(days)));
    match date {
        Some(date) if secs == 0 => date.format("%Y-%m-%d").to_string(),
        Some(date) => format!("{} {}", date.format("%Y-%m-%d"), hms(secs)),
        None => format!("{}", serial),
    }
}

// ---------------------------------------------------------------------------
// Adapters
// ---------------------------------------------------------------------------

pub fn load_source(path: &Path, opts: &SourceOptions) -> Result<SourceTable, ReconError> {
    let rows = read_rows(path, opts.sheet.as_deref(), InputRole::Report)?;
    source_from_rows(rows, opts)
}

pub fn load_source_from_bytes(bytes: &[u8], opts: &SourceOptions) -> Result<SourceTable, ReconError> {
    let rows = read_rows_from_bytes(bytes, opts.sheet.as_deref(), InputRole::Report)?;
    source_from_rows(rows, opts)
}

pub fn load_canonical(path: &Path, opts: &CanonicalOptions) -> Result<CanonicalSequence, ReconError> {
    let rows = read_rows(path, opts.sheet.as_deref(), InputRole::Roster)?;
    canonical_from_rows(rows, opts)
}

pub fn load_canonical_from_bytes(bytes: &[u8], opts: &CanonicalOptions) -> Result<CanonicalSequence, ReconError> {
    let rows = read_rows_from_bytes(bytes, opts.sheet.as_deref(), InputRole::Roster)?;
    canonical_from_rows(rows, opts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rollcall_recon::SchemaError;
    use rust_xlsxwriter::{Format, Workbook};
    use tempfile::tempdir;

    fn roster_workbook() -> Workbook {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name("Roster").unwrap();
        sheet.write_string(0, 0, "No").unwrap();
        sheet.write_string(0, 1, "Email").unwrap();
        sheet.write_number(1, 0, 1.0).unwrap();
        sheet.write_string(1, 1, " alice@school.edu ").unwrap();
        sheet.write_number(2, 0, 2.0).unwrap();
        sheet.write_number(2, 1, 1001.0).unwrap();
        sheet.write_number(3, 0, 3.0).unwrap();
        sheet.write_string(4, 0, "4").unwrap();
        sheet.write_string(4, 1, "bob@school.edu").unwrap();
        workbook
    }

    #[test]
    fn roster_from_second_column() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("roster.xlsx");
        roster_workbook().save(&path).unwrap();

        let seq = load_canonical(&path, &CanonicalOptions::default()).unwrap();
        assert_eq!(seq.headers, vec!["No", "Email"]);
        assert_eq!(seq.keys().collect::<Vec<_>>(), vec!["alice@school.edu", "1001", "bob@school.edu"]);
        assert_eq!(seq.dropped_empty, 1);
        assert_eq!(seq.entries[0].fields[0], "1");
    }

    #[test]
    fn roster_from_bytes_matches_path() {
        let bytes = roster_workbook().save_to_buffer().unwrap();
        let seq = load_canonical_from_bytes(&bytes, &CanonicalOptions::default()).unwrap();
        assert_eq!(seq.len(), 3);
    }

    #[test]
    fn one_column_sheet_is_schema_error() {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "Email").unwrap();
        sheet.write_string(1, 0, "a@x.com").unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        let err = load_canonical_from_bytes(&bytes, &CanonicalOptions::default()).unwrap_err();
        assert!(matches!(err, ReconError::Schema(SchemaError::TooFewColumns { found: 1, .. })));
    }

    #[test]
    fn report_with_time_cells() {
        let time = Format::new().set_num_format("hh:mm:ss");
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "Username").unwrap();
        sheet.write_string(0, 1, "Total time").unwrap();
        sheet.write_string(1, 0, "alice@school.edu").unwrap();
        // 01:02:03
        sheet.write_number_with_format(1, 1, 3723.0 / 86_400.0, &time).unwrap();
        sheet.write_string(2, 0, "bob@school.edu").unwrap();
        sheet.write_string(2, 1, "00:10:00").unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        let table = load_source_from_bytes(&bytes, &SourceOptions::default()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.records[0].time_value, "01:02:03");
        assert_eq!(table.records[1].time_value, "00:10:00");
    }

    #[test]
    fn named_sheet_selection() {
        let mut workbook = Workbook::new();
        workbook.add_worksheet().set_name("Notes").unwrap();
        let sheet = workbook.add_worksheet();
        sheet.set_name("Report").unwrap();
        sheet.write_string(0, 0, "Username").unwrap();
        sheet.write_string(0, 1, "Total time").unwrap();
        sheet.write_string(1, 0, "a").unwrap();
        sheet.write_string(1, 1, "1").unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        let opts = SourceOptions { sheet: Some("Report".into()), ..Default::default() };
        assert_eq!(load_source_from_bytes(&bytes, &opts).unwrap().len(), 1);

        let missing = SourceOptions { sheet: Some("Nope".into()), ..Default::default() };
        let err = load_source_from_bytes(&bytes, &missing).unwrap_err();
        assert!(err.to_string().contains("no sheet named 'Nope'"));
    }

    #[test]
    fn garbage_bytes_are_parse_errors() {
        let err = load_source_from_bytes(b"not a spreadsheet", &SourceOptions::default()).unwrap_err();
        assert!(matches!(err, ReconError::Parse { input: InputRole::Report, .. }));
    }

    #[test]
    fn serial_formatting() {
        assert_eq!(format_serial(0.5), "12:00:00");
        assert_eq!(format_serial(45_000.0), "2023-03-15");
        assert_eq!(format_serial(45_000.25), "2023-03-15 06:00:00");
        assert_eq!(format_duration(25.0 / 24.0), "25:00:00");
        assert_eq!(format_duration(1.0 / 86_400.0), "00:00:01");
    }

    #[test]
    fn numbers_render_without_trailing_zero() {
        assert_eq!(cell_to_string(&Data::Float(42.0)), "42");
        assert_eq!(cell_to_string(&Data::Float(1.5)), "1.5");
        assert_eq!(cell_to_string(&Data::Int(7)), "7");
        assert_eq!(cell_to_string(&Data::Bool(true)), "TRUE");
        assert_eq!(cell_to_string(&Data::Empty), "");
    }
}
