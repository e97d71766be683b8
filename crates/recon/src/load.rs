//! Input adapters. Every adapter produces a [`SourceTable`] or a
//! [`CanonicalSequence`]; the spreadsheet adapters in `rollcall-io` reuse
//! [`source_from_rows`] and [`canonical_from_rows`] after reading cells.

use crate::config::{delimiter_byte, CanonicalOptions, ColumnRef, EmptyKeyPolicy, SourceOptions};
use crate::error::{InputRole, ReconError, SchemaError};
use crate::model::{normalize_key, CanonicalEntry, CanonicalSequence, Record, SourceTable};

/// Which adapter reads the daily report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Spreadsheet,
}

/// Which adapter reads the roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanonicalFormat {
    Csv,
    Spreadsheet,
    /// One identifier per line, no header.
    Lines,
}

// ---------------------------------------------------------------------------
// Delimited text
// ---------------------------------------------------------------------------

fn strip_bom(text: &str) -> &str {
    text.strip_prefix('\u{feff}').unwrap_or(text)
}

/// Detect the most likely field delimiter by checking consistency across the first few lines.
///
/// Sampling starts at the header line, `header_row` non-blank lines into the text. For each
/// candidate (tab, semicolon, comma, pipe), count fields per line. A candidate must split the
/// header; among those, the one whose field count holds across the most lines wins. Comma is the
/// fallback.
pub fn sniff_delimiter(content: &str, header_row: usize) -> u8 {
    let candidates: &[u8] = &[b'\t', b';', b',', b'|'];
    let sample_lines: Vec<&str> = content
        .lines()
        .filter(|l| !l.is_empty())
        .skip(header_row)
        .take(10)
        .collect();

    let mut best = b',';
    let mut best_score = 0u64;

    for &delim in candidates {
        let counts: Vec<usize> = sample_lines
            .iter()
            .map(|line| {
                csv::ReaderBuilder::new()
                    .delimiter(delim)
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(line.as_bytes())
                    .records()
                    .next()
                    .and_then(|r| r.ok())
                    .map(|r| r.len())
                    .unwrap_or(1)
            })
            .collect();

        // The header must split, or the delimiter only occurs inside a free-text column
        let target = counts.first().copied().unwrap_or(0);
        if target <= 1 {
            continue;
        }

        // Score: (lines with the header's field count) * field_count
        let consistent = counts.iter().filter(|&&c| c == target).count() as u64;
        let score = consistent * target as u64;

        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}

/// Parse delimited text into raw rows. Rows may differ in width.
///
/// `header_row` is the number of rows above the header; it only guides
/// delimiter sniffing; every row is returned.
pub fn parse_delimited(
    text: &str,
    delimiter: Option<u8>,
    header_row: usize,
    input: InputRole,
) -> Result<Vec<Vec<String>>, ReconError> {
    let text = strip_bom(text);
    let delimiter = delimiter.unwrap_or_else(|| {
        let sniffed = sniff_delimiter(text, header_row);
        log::debug!("{input}: sniffed delimiter {:?}", sniffed as char);
        sniffed
    });

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| ReconError::Parse { input, cause: e.to_string() })?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Build a [`SourceTable`] from raw rows: skip, locate the header, validate
/// required columns by exact name, then collect (identifier, time) pairs.
pub fn source_from_rows(rows: Vec<Vec<String>>, opts: &SourceOptions) -> Result<SourceTable, ReconError> {
    let mut rows = rows.into_iter().skip(opts.skip_before_header);

    let header = rows.next().unwrap_or_default();
    let position = |name: &str| header.iter().position(|h| h == name);
    let key_idx = position(&opts.key_column);
    let value_idx = position(&opts.value_column);

    let (key_idx, value_idx) = match (key_idx, value_idx) {
        (Some(k), Some(v)) => (k, v),
        _ => {
            let mut columns = Vec::new();
            if key_idx.is_none() {
                columns.push(opts.key_column.clone());
            }
            if value_idx.is_none() {
                columns.push(opts.value_column.clone());
            }
            return Err(SchemaError::MissingColumns { input: InputRole::Report, columns }.into());
        }
    };

    if opts.skip_after_header > 0 {
        log::debug!("report: skipping {} row(s) after the header", opts.skip_after_header);
    }

    let mut table = SourceTable::default();
    for (offset, row) in rows.skip(opts.skip_after_header).enumerate() {
        if row.iter().all(|c| c.trim().is_empty()) {
            continue;
        }
        let key = row.get(key_idx);
        let value = row.get(value_idx);
        if key.is_some() {
            table.identifiers_seen += 1;
        }
        if value.is_some() {
            table.values_seen += 1;
        }
        match (key, value) {
            (Some(key), Some(value)) => table.records.push(Record::new(key, value.clone())),
            _ => log::debug!(
                "report: data row {} has {} field(s); not paired",
                offset + 1,
                row.len()
            ),
        }
    }

    Ok(table)
}

pub fn load_source_csv(text: &str, opts: &SourceOptions) -> Result<SourceTable, ReconError> {
    let delimiter = delimiter_byte(opts.delimiter)?;
    let rows = parse_delimited(text, delimiter, opts.skip_before_header, InputRole::Report)?;
    source_from_rows(rows, opts)
}

// ---------------------------------------------------------------------------
// Roster
// ---------------------------------------------------------------------------

fn resolve_column(column: &ColumnRef, headers: &[String], width: usize) -> Result<usize, SchemaError> {
    match column {
        ColumnRef::Index(idx) => {
            if width <= *idx {
                Err(SchemaError::TooFewColumns { input: InputRole::Roster, found: width, required: idx + 1 })
            } else {
                Ok(*idx)
            }
        }
        ColumnRef::Name(name) => headers.iter().position(|h| h.trim() == name).ok_or_else(|| {
            SchemaError::MissingColumns { input: InputRole::Roster, columns: vec![name.clone()] }
        }),
    }
}

fn push_entry(seq: &mut CanonicalSequence, raw_key: &str, fields: Vec<String>, policy: EmptyKeyPolicy) {
    let key = normalize_key(raw_key);
    if key.is_empty() && policy == EmptyKeyPolicy::Drop {
        seq.dropped_empty += 1;
        return;
    }
    seq.entries.push(CanonicalEntry { key: key.to_string(), fields });
}

/// Build a [`CanonicalSequence`] from raw rows, extracting the configured column.
pub fn canonical_from_rows(rows: Vec<Vec<String>>, opts: &CanonicalOptions) -> Result<CanonicalSequence, ReconError> {
    let mut rows = rows.into_iter().skip(opts.skip_rows);
    let headers = if opts.has_header { rows.next().unwrap_or_default() } else { Vec::new() };
    let body: Vec<Vec<String>> = rows.collect();

    let width = body.iter().map(Vec::len).chain(std::iter::once(headers.len())).max().unwrap_or(0);
    let key_index = resolve_column(&opts.column, &headers, width)?;

    let mut seq = CanonicalSequence { headers, key_index, entries: Vec::with_capacity(body.len()), dropped_empty: 0 };
    for row in body {
        let raw = row.get(key_index).cloned().unwrap_or_default();
        push_entry(&mut seq, &raw, row, opts.empty_keys);
    }

    if seq.dropped_empty > 0 {
        log::debug!("roster: dropped {} row(s) with an empty identifier", seq.dropped_empty);
    }
    Ok(seq)
}

pub fn load_canonical_csv(text: &str, opts: &CanonicalOptions) -> Result<CanonicalSequence, ReconError> {
    let delimiter = delimiter_byte(opts.delimiter)?;
    let rows = parse_delimited(text, delimiter, opts.skip_rows, InputRole::Roster)?;
    canonical_from_rows(rows, opts)
}

/// One identifier per line. Only `skip_rows` and `empty_keys` apply.
pub fn load_canonical_lines(text: &str, opts: &CanonicalOptions) -> CanonicalSequence {
    let mut seq = CanonicalSequence::default();
    for line in strip_bom(text).lines().skip(opts.skip_rows) {
        push_entry(&mut seq, line, vec![normalize_key(line).to_string()], opts.empty_keys);
    }
    seq
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(data: &[&[&str]]) -> Vec<Vec<String>> {
        data.iter().map(|r| r.iter().map(|c| c.to_string()).collect()).collect()
    }

    #[test]
    fn source_skips_row_after_header() {
        let csv = "\
Username,Total time,Sessions
instructor@x.com,09:00:00,1
a@x.com,01:00:00,2
b@x.com,00:30:00,1
";
        let opts = SourceOptions { skip_after_header: 1, ..Default::default() };
        let table = load_source_csv(csv, &opts).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.records[0], Record::new("a@x.com", "01:00:00"));
        assert!(!table.has_length_mismatch());
    }

    #[test]
    fn source_skips_rows_before_header() {
        let csv = "\
Daily report
Generated 2026-10-01
Username,Total time
a@x.com,01:00:00
";
        let opts = SourceOptions { skip_before_header: 2, ..Default::default() };
        let table = load_source_csv(csv, &opts).unwrap();
        assert_eq!(table.records, vec![Record::new("a@x.com", "01:00:00")]);
    }

    #[test]
    fn source_missing_both_columns() {
        let err = load_source_csv("Email,Minutes\na,1\n", &SourceOptions::default()).unwrap_err();
        match err {
            ReconError::Schema(SchemaError::MissingColumns { input, columns }) => {
                assert_eq!(input, InputRole::Report);
                assert_eq!(columns, vec!["Username", "Total time"]);
            }
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn source_column_names_are_case_sensitive() {
        let err = load_source_csv("Username,total time\na,1\n", &SourceOptions::default()).unwrap_err();
        assert!(err.to_string().contains("'Total time'"));
        assert!(!err.to_string().contains("'Username'"));
    }

    #[test]
    fn empty_source_reports_missing_columns() {
        let err = load_source_csv("", &SourceOptions::default()).unwrap_err();
        assert!(matches!(err, ReconError::Schema(SchemaError::MissingColumns { .. })));
    }

    #[test]
    fn short_rows_are_counted_not_paired() {
        let csv = "Total time,Username\n01:00:00,a\n02:00:00\n";
        let table = load_source_csv(csv, &SourceOptions::default()).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.identifiers_seen, 1);
        assert_eq!(table.values_seen, 2);
        assert!(table.has_length_mismatch());
    }

    #[test]
    fn bom_does_not_break_header_match() {
        let csv = "\u{feff}Username,Total time\na,1\n";
        let table = load_source_csv(csv, &SourceOptions::default()).unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn semicolon_report_is_sniffed() {
        let csv = "Username;Total time\na@x.com;01:00:00\nb@x.com;00:10:00\n";
        let table = load_source_csv(csv, &SourceOptions::default()).unwrap();
        assert_eq!(table.records[1], Record::new("b@x.com", "00:10:00"));
    }

    #[test]
    fn canonical_second_column_drops_empty() {
        let data = rows(&[
            &["No", "Email", "Name"],
            &["1", " a@x.com ", "Ann"],
            &["2", "", "Nobody"],
            &["3", "b@x.com", "Ben"],
        ]);
        let seq = canonical_from_rows(data, &CanonicalOptions::default()).unwrap();
        assert_eq!(seq.keys().collect::<Vec<_>>(), vec!["a@x.com", "b@x.com"]);
        assert_eq!(seq.dropped_empty, 1);
        assert_eq!(seq.headers, vec!["No", "Email", "Name"]);
        assert_eq!(seq.entries[0].fields[2], "Ann");
    }

    #[test]
    fn canonical_keep_policy_keeps_empty_rows() {
        let data = rows(&[&["No", "Email"], &["1", "a"], &["2", "  "]]);
        let opts = CanonicalOptions { empty_keys: EmptyKeyPolicy::Keep, ..Default::default() };
        let seq = canonical_from_rows(data, &opts).unwrap();
        assert_eq!(seq.keys().collect::<Vec<_>>(), vec!["a", ""]);
    }

    #[test]
    fn canonical_one_column_is_schema_error() {
        let data = rows(&[&["Email"], &["a"], &["b"]]);
        let err = canonical_from_rows(data, &CanonicalOptions::default()).unwrap_err();
        match err {
            ReconError::Schema(SchemaError::TooFewColumns { found, required, .. }) => {
                assert_eq!(found, 1);
                assert_eq!(required, 2);
            }
            other => panic!("expected too-few-columns, got {other:?}"),
        }
    }

    #[test]
    fn canonical_by_name() {
        let data = rows(&[&["Name", "Group", "Email"], &["Ann", "1", "a@x.com"]]);
        let opts = CanonicalOptions { column: ColumnRef::Name("Email".into()), ..Default::default() };
        let seq = canonical_from_rows(data, &opts).unwrap();
        assert_eq!(seq.key_index, 2);
        assert_eq!(seq.keys().collect::<Vec<_>>(), vec!["a@x.com"]);
    }

    #[test]
    fn canonical_missing_name() {
        let data = rows(&[&["Name", "Group"], &["Ann", "1"]]);
        let opts = CanonicalOptions { column: ColumnRef::Name("Email".into()), ..Default::default() };
        let err = canonical_from_rows(data, &opts).unwrap_err();
        assert!(err.to_string().contains("'Email'"));
    }

    #[test]
    fn canonical_without_header_keeps_first_row() {
        let csv = "1,a@x.com\n2,b@x.com\n";
        let opts = CanonicalOptions { has_header: false, ..Default::default() };
        let seq = load_canonical_csv(csv, &opts).unwrap();
        assert!(seq.headers.is_empty());
        assert_eq!(seq.keys().collect::<Vec<_>>(), vec!["a@x.com", "b@x.com"]);
    }

    #[test]
    fn canonical_numeric_identifiers_stay_text() {
        let csv = "No,Student\n1,007\n2,1e3\n";
        let seq = load_canonical_csv(csv, &CanonicalOptions::default()).unwrap();
        assert_eq!(seq.keys().collect::<Vec<_>>(), vec!["007", "1e3"]);
    }

    #[test]
    fn lines_strip_whitespace_and_blank_lines() {
        let text = "\u{feff}a@x.com\r\n  b@x.com  \n\n c@x.com\n";
        let seq = load_canonical_lines(text, &CanonicalOptions::default());
        assert_eq!(seq.keys().collect::<Vec<_>>(), vec!["a@x.com", "b@x.com", "c@x.com"]);
        assert_eq!(seq.dropped_empty, 1);
        assert_eq!(seq.key_index, 0);
    }

    #[test]
    fn lines_keep_duplicates_in_order() {
        let seq = load_canonical_lines("b\na\nb\n", &CanonicalOptions::default());
        assert_eq!(seq.keys().collect::<Vec<_>>(), vec!["b", "a", "b"]);
    }

    #[test]
    fn sniff_prefers_consistent_delimiter() {
        assert_eq!(sniff_delimiter("a;b;c\n1;2;3\n", 0), b';');
        assert_eq!(sniff_delimiter("a\tb\n1\t2\n", 0), b'\t');
        assert_eq!(sniff_delimiter("a,b\n1,2\n", 0), b',');
        assert_eq!(sniff_delimiter("single\ncolumn\n", 0), b',');
        let quoted = "Name;Address\n\"Doe, Jane\";\"1 Main St, Apt 4\"\nBob;\"2 Elm\"\n";
        assert_eq!(sniff_delimiter(quoted, 0), b';');
    }

    #[test]
    fn sniff_requires_delimiter_in_header() {
        let groups = "Username,Total time,Groups\na@x.com,01:00:00,G1;G2;G3;G4;G5\nb@x.com,00:30:00,G1;G2;G3;G4;G5\n";
        assert_eq!(sniff_delimiter(groups, 0), b',');
        assert_eq!(sniff_delimiter("Report for Monday\nUsername;Total time\na;1\n", 1), b';');
    }

    #[test]
    fn report_with_semicolons_in_free_text() {
        let csv = "Username,Total time,Groups\na@x.com,01:00:00,G1;G2;G3;G4;G5\nb@x.com,00:30:00,G1;G2;G3;G4;G5\n";
        let table = load_source_csv(csv, &SourceOptions::default()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.records[1], Record::new("b@x.com", "00:30:00"));
    }

    #[test]
    fn roster_with_semicolons_in_free_text() {
        let csv = "No,Email,Notes\n1,a@x.com,x;y;z;w;v\n2,b@x.com,x;y;z;w;v\n";
        let seq = load_canonical_csv(csv, &CanonicalOptions::default()).unwrap();
        assert_eq!(seq.keys().collect::<Vec<_>>(), vec!["a@x.com", "b@x.com"]);
    }

    #[test]
    fn sniff_starts_at_header_after_preamble() {
        let csv = "Exported 2026-10-01, all classes\nUsername;Total time\na@x.com;01:00:00\n";
        let opts = SourceOptions { skip_before_header: 1, ..Default::default() };
        let table = load_source_csv(csv, &opts).unwrap();
        assert_eq!(table.records, vec![Record::new("a@x.com", "01:00:00")]);
    }
}
