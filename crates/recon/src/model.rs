use serde::Serialize;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Trim surrounding whitespace from an identifier. Identifiers are opaque
/// strings: no case folding, no numeric reinterpretation.
pub fn normalize_key(raw: &str) -> &str {
    raw.trim()
}

/// A single (identifier, time) pair from the daily report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    pub identifier: String,
    /// Pass-through value; never parsed or validated.
    pub time_value: String,
}

impl Record {
    pub fn new(identifier: impl AsRef<str>, time_value: impl Into<String>) -> Self {
        Self {
            identifier: normalize_key(identifier.as_ref()).to_string(),
            time_value: time_value.into(),
        }
    }
}

/// Report records in file order, plus how many identifier and value cells
/// were seen while loading them.
#[derive(Debug, Clone, Default)]
pub struct SourceTable {
    pub records: Vec<Record>,
    pub identifiers_seen: usize,
    pub values_seen: usize,
}

impl SourceTable {
    pub fn from_records(records: Vec<Record>) -> Self {
        let n = records.len();
        Self { records, identifiers_seen: n, values_seen: n }
    }

    /// Pair two parallel columns. Pairs are formed up to the shorter column;
    /// the original lengths are kept so the mismatch can be reported.
    pub fn from_parallel(identifiers: Vec<String>, values: Vec<String>) -> Self {
        let identifiers_seen = identifiers.len();
        let values_seen = values.len();
        let records = identifiers
            .into_iter()
            .zip(values)
            .map(|(id, value)| Record::new(id, value))
            .collect();
        Self { records, identifiers_seen, values_seen }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_length_mismatch(&self) -> bool {
        self.identifiers_seen != self.values_seen
    }
}

/// One roster row: the trimmed identifier plus every original cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalEntry {
    pub key: String,
    pub fields: Vec<String>,
}

/// The canonical identifier ordering. `headers` is empty when the roster
/// had no header row (plain-text lists, `has_header = false`).
#[derive(Debug, Clone, Default)]
pub struct CanonicalSequence {
    pub headers: Vec<String>,
    pub key_index: usize,
    pub entries: Vec<CanonicalEntry>,
    /// Rows removed by `EmptyKeyPolicy::Drop`.
    pub dropped_empty: usize,
}

impl CanonicalSequence {
    /// Build a single-column sequence from bare identifiers.
    pub fn from_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let entries = keys
            .into_iter()
            .map(|k| {
                let key = normalize_key(k.as_ref()).to_string();
                CanonicalEntry { fields: vec![key.clone()], key }
            })
            .collect();
        Self { headers: Vec::new(), key_index: 0, entries, dropped_empty: 0 }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.key.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Widest row, header included; never narrower than the key column.
    pub fn width(&self) -> usize {
        self.entries
            .iter()
            .map(|e| e.fields.len())
            .chain(std::iter::once(self.headers.len()))
            .max()
            .unwrap_or(0)
            .max(self.key_index + 1)
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl OutputTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Resolved values, i.e. the last column of every row.
    pub fn resolved(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|r| r.last().map(String::as_str).unwrap_or(""))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateIdentifier {
    pub identifier: String,
    pub occurrences: usize,
}

/// Non-fatal findings. Reconciliation always completes when only these occur.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReconWarning {
    /// Identifier and value columns of the report had different lengths.
    LengthMismatch { identifiers: usize, values: usize },
    /// Identifiers that appear more than once in the report; the last value won.
    DuplicateIdentifiers { identifiers: Vec<DuplicateIdentifier> },
}

impl std::fmt::Display for ReconWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LengthMismatch { identifiers, values } => write!(
                f,
                "report has {identifiers} identifier(s) but {values} time value(s); unpaired rows were ignored"
            ),
            Self::DuplicateIdentifiers { identifiers } => {
                write!(f, "{} identifier(s) repeat in the report, last value kept:", identifiers.len())?;
                for dup in identifiers {
                    write!(f, " {} (x{})", dup.identifier, dup.occurrences)?;
                }
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconSummary {
    pub canonical_rows: usize,
    pub matched: usize,
    pub defaulted: usize,
    pub dropped_empty_keys: usize,
    pub source_records: usize,
    pub distinct_identifiers: usize,
    /// Report identifiers that no roster row asked for.
    pub unused_identifiers: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconMeta {
    pub engine_version: String,
    pub default_value: String,
    pub preserve_extra_columns: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconResult {
    pub meta: ReconMeta,
    pub summary: ReconSummary,
    pub warnings: Vec<ReconWarning>,
    pub table: OutputTable,
}
